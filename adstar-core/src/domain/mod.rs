pub mod bridge;
pub mod dimension;
pub mod error;
pub mod fact;
pub mod kpi;
pub mod pipeline;
pub mod project;
pub mod staging;
pub mod table;
pub mod validation;
pub mod warning;

// Re-exports pratiques pour simplifier les imports ailleurs
pub use error::DomainError;
pub use pipeline::Phase;
pub use table::{SurrogateKey, Table};
pub use warning::{Warning, WarningCollector};
