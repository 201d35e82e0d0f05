// adstar-core/src/ports/connector.rs

// What the publisher needs from an analytical warehouse, without knowing which one.

use crate::error::AdstarError;
use async_trait::async_trait;

#[async_trait]
pub trait Connector: Send + Sync {
    async fn execute(&self, query: &str) -> Result<(), AdstarError>;

    /// Replaces `table_name` with the content of a CSV snapshot.
    async fn load_table(&self, table_name: &str, csv_path: &str) -> Result<(), AdstarError>;

    /// Number of rows currently visible in `table_name`.
    async fn count_rows(&self, table_name: &str) -> Result<u64, AdstarError>;

    fn engine_name(&self) -> &str;
}
