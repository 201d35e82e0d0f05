// adstar-core/src/error.rs

use crate::domain::error::DomainError;
use crate::domain::pipeline::Phase;
use crate::infrastructure::error::InfrastructureError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdstarError {
    // --- ERREURS DU DOMAINE (Clés, intégrité, bridge) ---
    #[error(transparent)]
    Domain(#[from] DomainError),

    // --- ERREURS D'INFRASTRUCTURE (IO, Parsing, Warehouse) ---
    #[error(transparent)]
    Infrastructure(#[from] InfrastructureError),

    #[error("Phase {phase} aborted: {source}")]
    PhaseFailed {
        phase: Phase,
        #[source]
        source: Box<AdstarError>,
    },

    // --- ERREURS GÉNÉRIQUES / APPLICATIVES ---
    #[error("Internal Error: {0}")]
    InternalError(String),

    #[error("Unsafe path traversal detected: {0}")]
    UnsafePath(String),
}

impl AdstarError {
    /// Wraps the error with the phase it aborted, unless it already carries one.
    pub fn in_phase(self, phase: Phase) -> Self {
        match self {
            already @ AdstarError::PhaseFailed { .. } => already,
            other => AdstarError::PhaseFailed {
                phase,
                source: Box::new(other),
            },
        }
    }
}

// Manual implementation to avoid duplicate enum variant but keep ergonomics
impl From<std::io::Error> for AdstarError {
    fn from(err: std::io::Error) -> Self {
        AdstarError::Infrastructure(InfrastructureError::Io(err))
    }
}

impl From<tokio::task::JoinError> for AdstarError {
    fn from(err: tokio::task::JoinError) -> Self {
        AdstarError::InternalError(format!("Dimension build task failed: {}", err))
    }
}
