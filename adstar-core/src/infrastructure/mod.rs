// adstar-core/src/infrastructure/mod.rs

pub mod adapters;
pub mod config;
pub mod csv_table;
pub mod error;
pub mod fs;
pub mod staging_csv;

pub use staging_csv::CsvStagingSource;
