// adstar-core/src/infrastructure/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum DatabaseError {
    #[error("DuckDB Engine Error: {0}")]
    #[diagnostic(
        code(adstar::infra::database::duckdb),
        help("An error occurred inside the warehouse engine.")
    )]
    DuckDB(#[from] duckdb::Error),
}

#[derive(Error, Debug, Diagnostic)]
pub enum InfrastructureError {
    // --- DATABASE (Abstracted) ---
    #[error(transparent)]
    #[diagnostic(transparent)]
    Database(#[from] DatabaseError),

    #[error("Warehouse table '{table}' holds {loaded} rows, snapshot has {expected}")]
    #[diagnostic(
        code(adstar::infra::warehouse_row_mismatch),
        help("The warehouse load was rolled back. Check the CSV dialect the engine inferred.")
    )]
    WarehouseRowMismatch {
        table: String,
        expected: u64,
        loaded: u64,
    },

    // --- STAGING INPUT (fatal) ---
    #[error("Staging table '{table}' not found at '{path}'")]
    #[diagnostic(
        code(adstar::infra::staging_missing),
        help("Run the extraction stage first or fix 'staging' paths in adstar.yaml.")
    )]
    MissingStagingTable { table: String, path: String },

    #[error("Staging table '{table}' is unreadable: {reason}")]
    #[diagnostic(
        code(adstar::infra::staging_unreadable),
        help("Check the CSV header and delimiter of the staging export.")
    )]
    UnreadableStagingTable { table: String, reason: String },

    // --- FILESYSTEM (IO) ---
    #[error("File System Error: {0}")]
    #[diagnostic(
        code(adstar::infra::io),
        help("Check file permissions or path validity.")
    )]
    Io(#[from] std::io::Error),

    #[error("CSV Encoding Error: {0}")]
    #[diagnostic(code(adstar::infra::csv))]
    Csv(#[from] csv::Error),

    // --- CONFIG / YAML ---
    #[error("YAML Parsing Error: {0}")]
    #[diagnostic(
        code(adstar::infra::yaml),
        help("Check your YAML syntax (indentation, types).")
    )]
    YamlError(#[from] serde_yaml::Error),

    #[error("Configuration Error: {0}")]
    ConfigError(String),

    #[error("Invalid configuration: {0}")]
    #[diagnostic(
        code(adstar::infra::config_invalid),
        help("Confidence scores must lie in [0, 1] and paths must not be empty.")
    )]
    InvalidConfig(#[from] validator::ValidationErrors),

    #[error("Project configuration not found at '{0}'")]
    #[diagnostic(code(adstar::infra::config_missing))]
    ConfigNotFound(String),
}

// Manual implementation for shortcuts (e.g. `?` operator on duckdb calls)
impl From<duckdb::Error> for InfrastructureError {
    fn from(err: duckdb::Error) -> Self {
        InfrastructureError::Database(DatabaseError::DuckDB(err))
    }
}

impl From<anyhow::Error> for InfrastructureError {
    fn from(err: anyhow::Error) -> Self {
        InfrastructureError::ConfigError(format!("{:#}", err))
    }
}
