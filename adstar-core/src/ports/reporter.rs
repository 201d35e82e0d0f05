// adstar-core/src/ports/reporter.rs

// The warning outlet every component writes into.
// Components receive it explicitly; nothing in the core reaches for a global logger.

use crate::domain::warning::Warning;

pub trait WarningSink: Send + Sync {
    fn record(&self, warning: Warning);
}

/// Discards everything. Useful when a caller only needs the tables.
pub struct NullSink;

impl WarningSink for NullSink {
    fn record(&self, _warning: Warning) {}
}
