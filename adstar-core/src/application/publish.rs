// adstar-core/src/application/publish.rs

//! Output side of a run: complete snapshots only.
//!
//! Tables are encoded into a fresh directory next to their destination. The
//! destination is replaced in one swap once everything is written, so a
//! failed run leaves the previous snapshot untouched.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info, warn};

use crate::domain::table::Table;
use crate::error::AdstarError;
use crate::infrastructure::csv_table::{encode_table, file_name};
use crate::infrastructure::error::InfrastructureError;
use crate::infrastructure::fs::{Swap, atomic_write, staging_dir_for, swap_dir_reversible};
use crate::ports::connector::Connector;

/// A published CSV table and the row count it was encoded with.
#[derive(Debug, Clone, PartialEq)]
pub struct WarehouseTable {
    pub name: String,
    pub path: PathBuf,
    pub rows: u64,
}

/// A directory being filled for `dest`, not yet visible there.
pub struct StagedSnapshot {
    dest: PathBuf,
    dir: TempDir,
    // (table name, file name, rows)
    tables: Vec<(String, String, u64)>,
}

impl StagedSnapshot {
    pub fn new(dest: &Path) -> Result<Self, AdstarError> {
        Ok(Self {
            dest: dest.to_path_buf(),
            dir: staging_dir_for(dest)?,
            tables: Vec::new(),
        })
    }

    pub fn add_table(&mut self, table: &dyn Table) -> Result<(), AdstarError> {
        let file = file_name(table);
        fs::write(self.dir.path().join(&file), encode_table(table)?)?;
        debug!(table = table.name(), rows = table.len(), "Table staged");
        self.tables
            .push((table.name().to_string(), file, table.len() as u64));
        Ok(())
    }

    pub fn add_tables(&mut self, tables: &[&dyn Table]) -> Result<(), AdstarError> {
        for table in tables {
            self.add_table(*table)?;
        }
        Ok(())
    }

    pub fn add_file(&self, name: &str, content: impl AsRef<[u8]>) -> Result<(), AdstarError> {
        atomic_write(self.dir.path().join(name), content)?;
        Ok(())
    }

    /// Every table added so far, at the path it will have once committed.
    pub fn published_tables(&self) -> Vec<WarehouseTable> {
        self.tables
            .iter()
            .map(|(name, file, rows)| WarehouseTable {
                name: name.clone(),
                path: self.dest.join(file),
                rows: *rows,
            })
            .collect()
    }

    /// Makes the snapshot visible at its destination.
    pub fn commit(self) -> Result<(), AdstarError> {
        swap_all(vec![self])?.finish();
        Ok(())
    }
}

/// Snapshots already swapped in, whose predecessors are still kept aside.
pub struct PendingPublish {
    swaps: Vec<(Swap, PathBuf, usize)>,
}

impl PendingPublish {
    /// Discards the previous snapshots.
    pub fn finish(self) {
        for (swap, dest, tables) in self.swaps {
            swap.finish();
            info!(path = ?dest, tables, "Snapshot published");
        }
    }

    /// Restores every previous snapshot, last swapped first.
    pub fn revert(self) -> Result<(), AdstarError> {
        for (swap, dest, _) in self.swaps.into_iter().rev() {
            swap.revert()?;
            warn!(path = ?dest, "Snapshot reverted");
        }
        Ok(())
    }
}

/// Swaps every snapshot into place. If one swap fails, the ones already done
/// are reverted before the error is returned.
pub fn swap_all(snapshots: Vec<StagedSnapshot>) -> Result<PendingPublish, AdstarError> {
    let mut pending = PendingPublish { swaps: Vec::new() };
    for snapshot in snapshots {
        match swap_dir_reversible(snapshot.dir, &snapshot.dest) {
            Ok(swap) => pending
                .swaps
                .push((swap, snapshot.dest, snapshot.tables.len())),
            Err(e) => {
                warn!(path = ?snapshot.dest, error = %e, "Snapshot swap failed, reverting");
                pending.revert()?;
                return Err(e.into());
            }
        }
    }
    Ok(pending)
}

/// Loads published tables into the warehouse inside one transaction and
/// checks each loaded row count against the snapshot.
/// On any failure the transaction is rolled back and the warehouse keeps its
/// previous tables.
pub async fn publish_warehouse(
    connector: &dyn Connector,
    tables: &[WarehouseTable],
) -> Result<(), AdstarError> {
    connector.execute("BEGIN TRANSACTION").await?;

    for table in tables {
        if let Err(e) = load_verified(connector, table).await {
            warn!(table = %table.name, error = %e, "Warehouse load failed, rolling back");
            let _ = connector.execute("ROLLBACK").await;
            return Err(e);
        }
    }

    connector.execute("COMMIT").await?;
    info!(
        engine = connector.engine_name(),
        tables = tables.len(),
        "Warehouse published"
    );
    Ok(())
}

async fn load_verified(connector: &dyn Connector, table: &WarehouseTable) -> Result<(), AdstarError> {
    connector
        .load_table(&table.name, &table.path.to_string_lossy())
        .await?;
    let loaded = connector.count_rows(&table.name).await?;
    if loaded != table.rows {
        return Err(InfrastructureError::WarehouseRowMismatch {
            table: table.name.clone(),
            expected: table.rows,
            loaded,
        }
        .into());
    }
    Ok(())
}
