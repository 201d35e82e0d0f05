// adstar-core/src/domain/warning.rs

//! Non-fatal findings of a run.
//!
//! Every lossy default (0 for an unparseable measure, null for an orphan key,
//! 0x0 for a malformed size) produces one of these events. They are recorded
//! through a [`WarningSink`] and never abort the pipeline.

use miette::Diagnostic;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Mutex;
use thiserror::Error;

use crate::ports::reporter::WarningSink;

#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataQualityWarning {
    #[error("{table}.{column} row {row}: unparseable value '{raw}' defaulted to 0")]
    #[diagnostic(code(adstar::data_quality::unparseable_measure), severity(Warning))]
    UnparseableMeasure {
        table: &'static str,
        column: &'static str,
        row: usize,
        raw: String,
    },

    #[error("size token '{token}' is not of the form WxH, width/height defaulted to 0")]
    #[diagnostic(code(adstar::data_quality::malformed_size), severity(Warning))]
    MalformedSizeToken { token: String },

    #[error("{fact}.{column} row {row}: no dimension row for '{natural_key}', key left null")]
    #[diagnostic(code(adstar::data_quality::orphan_key), severity(Warning))]
    OrphanForeignKey {
        fact: &'static str,
        column: &'static str,
        row: usize,
        natural_key: String,
    },

    #[error("{table} row {row}: unparseable date '{raw}'")]
    #[diagnostic(
        code(adstar::data_quality::unparseable_date),
        severity(Warning),
        help("Staging dates must be ISO-8601 (YYYY-MM-DD).")
    )]
    UnparseableDate {
        table: &'static str,
        row: usize,
        raw: String,
    },

    #[error("{table}.{column} row {row}: empty natural key")]
    #[diagnostic(code(adstar::data_quality::empty_key), severity(Warning))]
    EmptyNaturalKey {
        table: &'static str,
        column: &'static str,
        row: usize,
    },
}

#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntegrityWarning {
    #[error("{table}.{column} row {row}: negative count {value}")]
    #[diagnostic(code(adstar::integrity::negative_count), severity(Warning))]
    NegativeCount {
        table: &'static str,
        column: &'static str,
        row: usize,
        value: f64,
    },

    #[error("ad staging row {row}: clicks ({clicks}) exceed impressions ({impressions})")]
    #[diagnostic(code(adstar::integrity::clicks_exceed_impressions), severity(Warning))]
    ClicksExceedImpressions {
        row: usize,
        clicks: f64,
        impressions: f64,
    },

    #[error("web staging row {row}: bounce_rate {value} outside [0, 1]")]
    #[diagnostic(code(adstar::integrity::bounce_rate_range), severity(Warning))]
    BounceRateOutOfRange { row: usize, value: f64 },
}

#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Warning {
    #[error(transparent)]
    #[diagnostic(transparent)]
    DataQuality(#[from] DataQualityWarning),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Integrity(#[from] IntegrityWarning),
}

impl Warning {
    pub fn category(&self) -> &'static str {
        match self {
            Self::DataQuality(_) => "data_quality",
            Self::Integrity(_) => "integrity",
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::DataQuality(w) => match w {
                DataQualityWarning::UnparseableMeasure { .. } => "unparseable_measure",
                DataQualityWarning::MalformedSizeToken { .. } => "malformed_size_token",
                DataQualityWarning::OrphanForeignKey { .. } => "orphan_foreign_key",
                DataQualityWarning::UnparseableDate { .. } => "unparseable_date",
                DataQualityWarning::EmptyNaturalKey { .. } => "empty_natural_key",
            },
            Self::Integrity(w) => match w {
                IntegrityWarning::NegativeCount { .. } => "negative_count",
                IntegrityWarning::ClicksExceedImpressions { .. } => "clicks_exceed_impressions",
                IntegrityWarning::BounceRateOutOfRange { .. } => "bounce_rate_out_of_range",
            },
        }
    }
}

/// Counts per category and per kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WarningSummary {
    pub data_quality: usize,
    pub integrity: usize,
    pub by_kind: BTreeMap<&'static str, usize>,
}

impl WarningSummary {
    pub fn total(&self) -> usize {
        self.data_quality + self.integrity
    }
}

/// In-memory sink. Thread-safe so parallel dimension builds can share it.
#[derive(Debug, Default)]
pub struct WarningCollector {
    warnings: Mutex<Vec<Warning>>,
}

impl WarningCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded warnings in a stable order, independent of recording order.
    pub fn snapshot(&self) -> Vec<Warning> {
        let mut warnings = self
            .warnings
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        warnings.sort_by_cached_key(|w| (w.category(), w.kind(), w.to_string()));
        warnings
    }

    pub fn summary(&self) -> WarningSummary {
        let guard = self
            .warnings
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut summary = WarningSummary::default();
        for warning in guard.iter() {
            match warning {
                Warning::DataQuality(_) => summary.data_quality += 1,
                Warning::Integrity(_) => summary.integrity += 1,
            }
            *summary.by_kind.entry(warning.kind()).or_insert(0) += 1;
        }
        summary
    }

    pub fn len(&self) -> usize {
        self.warnings
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl WarningSink for WarningCollector {
    fn record(&self, warning: Warning) {
        self.warnings
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(warning);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collector_summary_counts_by_kind() {
        let collector = WarningCollector::new();
        collector.record(
            DataQualityWarning::MalformedSizeToken {
                token: "Unknown".into(),
            }
            .into(),
        );
        collector.record(IntegrityWarning::BounceRateOutOfRange { row: 3, value: 1.4 }.into());
        collector.record(
            DataQualityWarning::MalformedSizeToken {
                token: "Flex".into(),
            }
            .into(),
        );

        let summary = collector.summary();
        assert_eq!(summary.data_quality, 2);
        assert_eq!(summary.integrity, 1);
        assert_eq!(summary.total(), 3);
        assert_eq!(summary.by_kind.get("malformed_size_token"), Some(&2));
    }

    #[test]
    fn test_snapshot_order_is_stable() {
        let a = WarningCollector::new();
        let b = WarningCollector::new();
        let w1: Warning = DataQualityWarning::MalformedSizeToken { token: "b".into() }.into();
        let w2: Warning = DataQualityWarning::MalformedSizeToken { token: "a".into() }.into();

        a.record(w1.clone());
        a.record(w2.clone());
        b.record(w2);
        b.record(w1);

        assert_eq!(a.snapshot(), b.snapshot());
    }

    #[test]
    fn test_warning_display() {
        let w: Warning = DataQualityWarning::OrphanForeignKey {
            fact: "fact_ad_performance",
            column: "site_key",
            row: 7,
            natural_key: "ghost.com".into(),
        }
        .into();
        assert_eq!(
            w.to_string(),
            "fact_ad_performance.site_key row 7: no dimension row for 'ghost.com', key left null"
        );
        assert_eq!(w.category(), "data_quality");
    }
}
