// adstar-core/src/infrastructure/adapters/duckdb.rs

use async_trait::async_trait;
use duckdb::{Config, Connection};
use std::sync::{Arc, Mutex, MutexGuard};

// Imports Hexagonaux
use crate::error::AdstarError;
use crate::infrastructure::error::{DatabaseError, InfrastructureError};
use crate::ports::connector::Connector;

pub struct DuckDBConnector {
    conn: Arc<Mutex<Connection>>,
}

impl DuckDBConnector {
    pub fn new(db_path: &str) -> Result<Self, InfrastructureError> {
        let config = Config::default();

        let conn = if db_path == ":memory:" {
            Connection::open_in_memory_with_flags(config)?
        } else {
            Connection::open_with_flags(db_path, config)?
        };

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, AdstarError> {
        self.conn.lock().map_err(|_| {
            AdstarError::Infrastructure(InfrastructureError::Io(std::io::Error::other(
                "DuckDB Mutex Poisoned",
            )))
        })
    }
}

fn db_err(e: duckdb::Error) -> AdstarError {
    AdstarError::Infrastructure(InfrastructureError::Database(DatabaseError::DuckDB(e)))
}

fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn quote_ident(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

#[async_trait]
impl Connector for DuckDBConnector {
    async fn execute(&self, query: &str) -> Result<(), AdstarError> {
        let conn = self.lock()?;
        conn.execute_batch(query).map_err(db_err)
    }

    async fn load_table(&self, table_name: &str, csv_path: &str) -> Result<(), AdstarError> {
        let query = format!(
            "CREATE OR REPLACE TABLE {} AS SELECT * FROM read_csv_auto({}, header = true)",
            quote_ident(table_name),
            quote_literal(csv_path)
        );
        self.execute(&query).await
    }

    async fn count_rows(&self, table_name: &str) -> Result<u64, AdstarError> {
        let conn = self.lock()?;
        let query = format!(
            "SELECT CAST(COUNT(*) AS UBIGINT) FROM {}",
            quote_ident(table_name)
        );
        conn.query_row(&query, [], |row| row.get::<_, u64>(0))
            .map_err(db_err)
    }

    fn engine_name(&self) -> &str {
        "duckdb"
    }
}
