// adstar-core/src/domain/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum DomainError {
    #[error("Surrogate key {key} assigned twice in '{dimension}'")]
    #[diagnostic(
        code(adstar::domain::duplicate_key),
        help("Natural keys must be deduplicated before key assignment.")
    )]
    DuplicateSurrogateKey { dimension: String, key: u32 },

    #[error("Surrogate keys of '{dimension}' are not contiguous: expected {expected}, found {found}")]
    #[diagnostic(code(adstar::domain::key_gap))]
    NonContiguousKeys {
        dimension: String,
        expected: u32,
        found: u32,
    },

    #[error("Foreign key {fact}.{column} = {key} has no row in '{dimension}'")]
    #[diagnostic(
        code(adstar::domain::referential_integrity),
        help("Facts must be built against the dimensions of the same run.")
    )]
    DanglingForeignKey {
        fact: String,
        column: String,
        dimension: String,
        key: u32,
    },

    #[error("Invalid bridge rule: {0}")]
    #[diagnostic(
        code(adstar::domain::bridge),
        help("Confidence scores must lie in [0, 1].")
    )]
    InvalidBridgeRule(String),

    #[error("Unknown bridge strategy '{0}'")]
    #[diagnostic(
        code(adstar::domain::bridge_strategy),
        help("Expected one of: curated, exact, normalized_token, substring_probe.")
    )]
    UnknownStrategy(String),
}
