// adstar-core/src/ports/mod.rs

pub mod connector;
pub mod reporter;
pub mod staging;

pub use connector::Connector;
pub use reporter::{NullSink, WarningSink};
pub use staging::StagingSource;
