// adstar-core/src/application/mod.rs

pub mod clean;
pub mod pipeline;
pub mod publish;
pub mod report;

// --- RE-EXPORTS (FACADE PATTERN) ---
// Cela permet au CLI de faire :
// `use adstar_core::application::{run_pipeline, clean_project};`
// sans avoir à connaître la structure interne des fichiers.

pub use clean::clean_project;
pub use pipeline::{RunResult, StarSchema, run_pipeline, validate_project};
pub use publish::{StagedSnapshot, WarehouseTable, publish_warehouse, swap_all};
pub use report::render_report;
