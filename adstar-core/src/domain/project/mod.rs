// adstar-core/src/domain/project/mod.rs

pub mod configuration;
pub use configuration::{
    BridgeConfig, OutputConfig, ProjectConfig, StagingConfig, WarehouseConfig,
};
