// adstar-core/src/domain/validation.rs

//! Staging validation: range and completeness checks over both feeds, plus a
//! summary of coverage and totals. Nothing here blocks the run.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;

use crate::domain::bridge::SubstringProbe;
use crate::domain::staging::{
    AD_STAGING, AdStagingRow, Measure, StagingSet, WEB_STAGING, WebStagingRow, parse_staging_date,
};
use crate::domain::warning::{DataQualityWarning, IntegrityWarning};
use crate::ports::reporter::WarningSink;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DateCoverage {
    pub ad_dates: usize,
    pub web_dates: usize,
    pub common_dates: usize,
    pub first: Option<NaiveDate>,
    pub last: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StagingTotals {
    pub impressions: f64,
    pub clicks: f64,
    pub ctr_pct: f64,
    pub sessions: f64,
    pub users: f64,
    pub mean_bounce_rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationSummary {
    pub ad_rows: usize,
    pub web_rows: usize,
    pub coverage: DateCoverage,
    pub totals: StagingTotals,
    /// Creative / ad_content pairs the substring probe would link.
    pub probe_matches: usize,
}

pub fn validate_staging(staging: &StagingSet, warnings: &dyn WarningSink) -> ValidationSummary {
    for (index, row) in staging.ad.iter().enumerate() {
        check_ad_row(index + 1, row, warnings);
    }
    for (index, row) in staging.web.iter().enumerate() {
        check_web_row(index + 1, row, warnings);
    }

    let summary = ValidationSummary {
        ad_rows: staging.ad.len(),
        web_rows: staging.web.len(),
        coverage: date_coverage(staging),
        totals: staging_totals(staging),
        probe_matches: probe_matches(staging),
    };

    tracing::info!(
        ad_rows = summary.ad_rows,
        web_rows = summary.web_rows,
        common_dates = summary.coverage.common_dates,
        probe_matches = summary.probe_matches,
        "Staging validated"
    );
    summary
}

fn check_required(
    table: &'static str,
    row: usize,
    fields: &[(&'static str, &str)],
    warnings: &dyn WarningSink,
) {
    for &(column, value) in fields {
        if value.trim().is_empty() {
            warnings.record(DataQualityWarning::EmptyNaturalKey { table, column, row }.into());
        }
    }
}

fn check_date(table: &'static str, row: usize, raw: &str, warnings: &dyn WarningSink) {
    if !raw.trim().is_empty() && parse_staging_date(raw).is_none() {
        warnings.record(
            DataQualityWarning::UnparseableDate {
                table,
                row,
                raw: raw.to_string(),
            }
            .into(),
        );
    }
}

fn check_non_negative(
    table: &'static str,
    row: usize,
    column: &'static str,
    measure: &Measure,
    warnings: &dyn WarningSink,
) {
    if let Some(value) = measure.value().filter(|v| *v < 0.0) {
        warnings.record(
            IntegrityWarning::NegativeCount {
                table,
                column,
                row,
                value,
            }
            .into(),
        );
    }
}

fn check_ad_row(row: usize, r: &AdStagingRow, warnings: &dyn WarningSink) {
    check_required(
        AD_STAGING,
        row,
        &[
            ("date", r.date.as_str()),
            ("campaign", r.campaign.as_str()),
            ("site", r.site.as_str()),
            ("creative", r.creative.as_str()),
        ],
        warnings,
    );
    check_date(AD_STAGING, row, &r.date, warnings);
    check_non_negative(AD_STAGING, row, "impressions", &r.impressions, warnings);
    check_non_negative(AD_STAGING, row, "clicks", &r.clicks, warnings);

    if let (Some(clicks), Some(impressions)) = (r.clicks.value(), r.impressions.value()) {
        if clicks > impressions {
            warnings.record(
                IntegrityWarning::ClicksExceedImpressions {
                    row,
                    clicks,
                    impressions,
                }
                .into(),
            );
        }
    }
}

fn check_web_row(row: usize, r: &WebStagingRow, warnings: &dyn WarningSink) {
    check_required(
        WEB_STAGING,
        row,
        &[
            ("date", r.date.as_str()),
            ("campaign", r.campaign.as_str()),
            ("source", r.source.as_str()),
            ("device", r.device.as_str()),
        ],
        warnings,
    );
    check_date(WEB_STAGING, row, &r.date, warnings);
    check_non_negative(WEB_STAGING, row, "users", &r.users, warnings);
    check_non_negative(WEB_STAGING, row, "new_users", &r.new_users, warnings);
    check_non_negative(WEB_STAGING, row, "sessions", &r.sessions, warnings);
    check_non_negative(WEB_STAGING, row, "pageviews", &r.pageviews, warnings);

    if let Some(value) = r.bounce_rate.value().filter(|v| !(0.0..=1.0).contains(v)) {
        warnings.record(IntegrityWarning::BounceRateOutOfRange { row, value }.into());
    }
}

fn date_coverage(staging: &StagingSet) -> DateCoverage {
    let ad: BTreeSet<NaiveDate> = staging
        .ad
        .iter()
        .filter_map(|r| parse_staging_date(&r.date))
        .collect();
    let web: BTreeSet<NaiveDate> = staging
        .web
        .iter()
        .filter_map(|r| parse_staging_date(&r.date))
        .collect();

    DateCoverage {
        ad_dates: ad.len(),
        web_dates: web.len(),
        common_dates: ad.intersection(&web).count(),
        first: ad.iter().chain(web.iter()).min().copied(),
        last: ad.iter().chain(web.iter()).max().copied(),
    }
}

fn staging_totals(staging: &StagingSet) -> StagingTotals {
    let impressions = staging.ad_total(|r| &r.impressions);
    let clicks = staging.ad_total(|r| &r.clicks);
    let mean_bounce_rate = if staging.web.is_empty() {
        0.0
    } else {
        staging.web_total(|r| &r.bounce_rate) / staging.web.len() as f64
    };

    StagingTotals {
        impressions,
        clicks,
        ctr_pct: percentage(clicks, impressions),
        sessions: staging.web_total(|r| &r.sessions),
        users: staging.web_total(|r| &r.users),
        mean_bounce_rate,
    }
}

fn probe_matches(staging: &StagingSet) -> usize {
    let creatives: BTreeSet<&str> = staging
        .ad
        .iter()
        .map(|r| r.creative.as_str())
        .filter(|c| !c.trim().is_empty())
        .collect();
    let ad_contents: BTreeSet<&str> = staging
        .web
        .iter()
        .map(|r| r.ad_content.as_str())
        .filter(|c| !c.trim().is_empty())
        .collect();

    let probe = SubstringProbe::default();
    creatives
        .iter()
        .map(|c| {
            ad_contents
                .iter()
                .filter(|a| probe.probe(c, a).is_some())
                .count()
        })
        .sum()
}

/// `part / whole * 100`, 0 when `whole` is 0.
pub fn percentage(part: f64, whole: f64) -> f64 {
    if whole > 0.0 { part / whole * 100.0 } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::warning::WarningCollector;

    fn ad(date: &str, impressions: &str, clicks: &str) -> AdStagingRow {
        AdStagingRow {
            date: date.into(),
            campaign: "Brand".into(),
            site: "news.com".into(),
            placement: "AR_HP_Top".into(),
            creative: "300x250_AR_RFL_FN".into(),
            size: "300x250".into(),
            impressions: impressions.into(),
            clicks: clicks.into(),
        }
    }

    fn web(date: &str, bounce_rate: &str) -> WebStagingRow {
        WebStagingRow {
            date: date.into(),
            campaign: "Brand".into(),
            source: "google".into(),
            device: "desktop".into(),
            ad_content: "300x250_AR_FN".into(),
            users: "10".into(),
            new_users: "4".into(),
            sessions: "12".into(),
            pageviews: "30".into(),
            avg_session_duration_sec: "40".into(),
            bounce_rate: bounce_rate.into(),
        }
    }

    #[test]
    fn test_clean_staging_has_no_warnings() {
        let staging = StagingSet::new(
            vec![ad("2024-01-01", "1000", "5"), ad("2024-01-02", "1000", "3")],
            vec![web("2024-01-02", "0.5"), web("2024-01-03", "0.3")],
        );
        let sink = WarningCollector::new();
        let summary = validate_staging(&staging, &sink);

        assert!(sink.is_empty());
        assert_eq!(summary.coverage.ad_dates, 2);
        assert_eq!(summary.coverage.common_dates, 1);
        assert_eq!(summary.coverage.first, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(summary.coverage.last, NaiveDate::from_ymd_opt(2024, 1, 3));
        assert_eq!(summary.totals.impressions, 2000.0);
        assert!((summary.totals.ctr_pct - 0.4).abs() < 1e-9);
        assert!((summary.totals.mean_bounce_rate - 0.4).abs() < 1e-9);
        assert_eq!(summary.probe_matches, 1);
    }

    #[test]
    fn test_integrity_warnings() {
        let staging = StagingSet::new(
            vec![ad("2024-01-01", "-5", "3"), ad("2024-01-01", "10", "20")],
            vec![web("2024-01-01", "1.7")],
        );
        let sink = WarningCollector::new();
        validate_staging(&staging, &sink);

        let summary = sink.summary();
        // -5 impressions with 3 clicks also trips the clicks check
        assert_eq!(summary.by_kind.get("negative_count"), Some(&1));
        assert_eq!(summary.by_kind.get("clicks_exceed_impressions"), Some(&2));
        assert_eq!(summary.by_kind.get("bounce_rate_out_of_range"), Some(&1));
        assert_eq!(summary.data_quality, 0);
    }

    #[test]
    fn test_completeness_warnings() {
        let mut row = ad("", "1", "0");
        row.site = " ".into();
        let staging = StagingSet::new(vec![row, ad("2024/01/01", "1", "0")], vec![]);
        let sink = WarningCollector::new();
        validate_staging(&staging, &sink);

        let summary = sink.summary();
        assert_eq!(summary.by_kind.get("empty_natural_key"), Some(&2));
        assert_eq!(summary.by_kind.get("unparseable_date"), Some(&1));
    }

    #[test]
    fn test_percentage_of_zero() {
        assert_eq!(percentage(5.0, 0.0), 0.0);
        assert_eq!(percentage(1.0, 4.0), 25.0);
    }
}
