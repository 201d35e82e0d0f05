// adstar-core/src/domain/pipeline.rs

use serde::Serialize;
use std::fmt;

/// Phases of one run, in execution order.
/// Each phase consumes the materialized output of the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Extract,
    Validate,
    BuildDimensions,
    BuildFacts,
    AggregateKpis,
    GenerateReport,
}

impl Phase {
    pub const ALL: [Phase; 6] = [
        Phase::Extract,
        Phase::Validate,
        Phase::BuildDimensions,
        Phase::BuildFacts,
        Phase::AggregateKpis,
        Phase::GenerateReport,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Extract => "extract",
            Self::Validate => "validate",
            Self::BuildDimensions => "build_dimensions",
            Self::BuildFacts => "build_facts",
            Self::AggregateKpis => "aggregate_kpis",
            Self::GenerateReport => "generate_report",
        }
    }

    /// The phase that runs after this one, `None` after the last.
    pub fn next(&self) -> Option<Phase> {
        let idx = Self::ALL.iter().position(|p| p == self)?;
        Self::ALL.get(idx + 1).copied()
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
