// adstar-core/src/ports/staging.rs

// Boundary with the extraction stage: whoever produced the cleaned exports
// hands them over through this trait.

use crate::domain::staging::StagingSet;
use crate::error::AdstarError;

pub trait StagingSource: Send + Sync {
    /// Loads both staging tables. A missing or unreadable table is fatal.
    fn load(&self) -> Result<StagingSet, AdstarError>;
}
