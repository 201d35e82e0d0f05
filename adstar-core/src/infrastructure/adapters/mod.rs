pub mod duckdb;
pub mod tracing_sink;

pub use self::duckdb::DuckDBConnector;
pub use tracing_sink::TracingWarningSink;
