// adstar-core/src/infrastructure/adapters/tracing_sink.rs

use crate::domain::warning::Warning;
use crate::ports::reporter::WarningSink;

/// Emits every warning as a `tracing` event, then hands it to the inner sink.
pub struct TracingWarningSink<S> {
    inner: S,
}

impl<S: WarningSink> TracingWarningSink<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: WarningSink> WarningSink for TracingWarningSink<S> {
    fn record(&self, warning: Warning) {
        tracing::warn!(
            category = warning.category(),
            kind = warning.kind(),
            "{}",
            warning
        );
        self.inner.record(warning);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::warning::{DataQualityWarning, WarningCollector};

    #[test]
    fn test_forwards_to_inner_sink() {
        let sink = TracingWarningSink::new(WarningCollector::new());
        sink.record(
            DataQualityWarning::MalformedSizeToken {
                token: "Flex".into(),
            }
            .into(),
        );
        assert_eq!(sink.inner().len(), 1);
    }
}
