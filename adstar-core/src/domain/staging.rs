// adstar-core/src/domain/staging.rs

//! Staging contract: the two cleaned exports handed over by the extraction stage.
//!
//! Measures are kept as the raw text the export carried. Coercion to numbers
//! happens where the lossy default can be reported (fact build, validation).

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const AD_STAGING: &str = "ad_staging";
pub const WEB_STAGING: &str = "web_staging";

const STAGING_DATE_FORMAT: &str = "%Y-%m-%d";

/// Years representable as an 8-digit `YYYYMMDD` key.
pub const STAGING_YEARS: std::ops::RangeInclusive<i32> = 1000..=9999;

/// Raw numeric cell of a staging export.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Measure(String);

impl Measure {
    /// Finite numeric value, `None` when the cell is empty or not a number.
    pub fn value(&self) -> Option<f64> {
        self.0
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
    }

    /// Value with the lossy default applied (unparseable → 0).
    pub fn value_or_zero(&self) -> f64 {
        self.value().unwrap_or(0.0)
    }

    pub fn raw(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Measure {
    fn from(raw: &str) -> Self {
        Measure(raw.to_string())
    }
}

impl From<f64> for Measure {
    fn from(value: f64) -> Self {
        Measure(value.to_string())
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One row of the ad-serving export.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AdStagingRow {
    pub date: String,
    pub campaign: String,
    pub site: String,
    pub placement: String,
    pub creative: String,
    pub size: String,
    pub impressions: Measure,
    pub clicks: Measure,
}

/// One row of the web-analytics export.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WebStagingRow {
    pub date: String,
    pub campaign: String,
    pub source: String,
    pub device: String,
    pub ad_content: String,
    pub users: Measure,
    pub new_users: Measure,
    pub sessions: Measure,
    pub pageviews: Measure,
    pub avg_session_duration_sec: Measure,
    pub bounce_rate: Measure,
}

/// Both staging tables of a run. Immutable once loaded.
#[derive(Debug, Clone, Default)]
pub struct StagingSet {
    pub ad: Vec<AdStagingRow>,
    pub web: Vec<WebStagingRow>,
}

impl StagingSet {
    pub fn new(ad: Vec<AdStagingRow>, web: Vec<WebStagingRow>) -> Self {
        Self { ad, web }
    }

    pub fn ad_total(&self, measure: fn(&AdStagingRow) -> &Measure) -> f64 {
        self.ad.iter().map(|r| measure(r).value_or_zero()).sum()
    }

    pub fn web_total(&self, measure: fn(&WebStagingRow) -> &Measure) -> f64 {
        self.web.iter().map(|r| measure(r).value_or_zero()).sum()
    }
}

/// Parses a `YYYY-MM-DD` calendar date as found in staging.
/// Signed or expanded years are rejected, as is any year outside [`STAGING_YEARS`].
pub fn parse_staging_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let shaped = raw.len() == 10
        && raw.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !shaped {
        return None;
    }
    NaiveDate::parse_from_str(raw, STAGING_DATE_FORMAT)
        .ok()
        .filter(|d| STAGING_YEARS.contains(&d.year()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measure_parsing() {
        assert_eq!(Measure::from("1000").value(), Some(1000.0));
        assert_eq!(Measure::from(" 12.5 ").value(), Some(12.5));
        assert_eq!(Measure::from("").value(), None);
        assert_eq!(Measure::from("n/a").value(), None);
        assert_eq!(Measure::from("NaN").value(), None);
        assert_eq!(Measure::from("n/a").value_or_zero(), 0.0);
    }

    #[test]
    fn test_staging_date() {
        assert_eq!(
            parse_staging_date("2024-01-01"),
            NaiveDate::from_ymd_opt(2024, 1, 1)
        );
        assert_eq!(parse_staging_date("01/01/2024"), None);
        assert_eq!(
            parse_staging_date(" 2024-02-29 "),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
    }

    #[test]
    fn test_staging_date_rejects_signed_and_expanded_years() {
        assert_eq!(parse_staging_date("-0001-06-15"), None);
        assert_eq!(parse_staging_date("+12345-01-01"), None);
        assert_eq!(parse_staging_date("+2024-01-01"), None);
        assert_eq!(parse_staging_date("0999-01-01"), None);
        assert_eq!(parse_staging_date("2024-1-01"), None);
        assert_eq!(parse_staging_date("2023-02-29"), None);
    }

    #[test]
    fn test_totals_use_lossy_default() {
        let staging = StagingSet::new(
            vec![
                AdStagingRow {
                    impressions: "100".into(),
                    ..Default::default()
                },
                AdStagingRow {
                    impressions: "oops".into(),
                    ..Default::default()
                },
            ],
            vec![],
        );
        assert_eq!(staging.ad_total(|r| &r.impressions), 100.0);
    }
}
