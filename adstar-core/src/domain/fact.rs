// adstar-core/src/domain/fact.rs

//! Fact builder.
//!
//! Each staging row becomes exactly one fact row. Natural keys are replaced by
//! surrogate keys through a left lookup: an unmatched key leaves the foreign
//! key null and the row is kept. Measures are coerced to numbers, anything
//! unparseable becomes 0. Both defaults are reported through the sink.

use serde::Serialize;

use crate::domain::dimension::{Attributes, DateDimension, Dimension, DimensionSet};
use crate::domain::error::DomainError;
use crate::domain::staging::{
    AD_STAGING, AdStagingRow, Measure, WEB_STAGING, WebStagingRow, parse_staging_date,
};
use crate::domain::table::{SurrogateKey, Table, key_cell, number_cell};
use crate::domain::warning::DataQualityWarning;
use crate::ports::reporter::WarningSink;

pub const FACT_AD_PERFORMANCE: &str = "fact_ad_performance";
pub const FACT_WEB_ANALYTICS: &str = "fact_web_analytics";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdPerformanceFact {
    pub date_key: Option<SurrogateKey>,
    pub campaign_key: Option<SurrogateKey>,
    pub site_key: Option<SurrogateKey>,
    pub creative_key: Option<SurrogateKey>,
    pub placement_key: Option<SurrogateKey>,
    pub size_key: Option<SurrogateKey>,
    pub impressions: f64,
    pub clicks: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebAnalyticsFact {
    pub date_key: Option<SurrogateKey>,
    pub campaign_key: Option<SurrogateKey>,
    pub source_key: Option<SurrogateKey>,
    pub device_key: Option<SurrogateKey>,
    pub ad_content_key: Option<SurrogateKey>,
    pub users: f64,
    pub new_users: f64,
    pub sessions: f64,
    pub pageviews: f64,
    pub avg_session_duration_sec: f64,
    pub bounce_rate: f64,
}

#[derive(Debug, Clone, Default)]
pub struct AdPerformanceFacts {
    rows: Vec<AdPerformanceFact>,
}

#[derive(Debug, Clone, Default)]
pub struct WebAnalyticsFacts {
    rows: Vec<WebAnalyticsFact>,
}

/// Per-row lookup context, so warnings can name where the default was applied.
struct RowJoin<'a> {
    fact: &'static str,
    source: &'static str,
    row: usize,
    warnings: &'a dyn WarningSink,
}

impl RowJoin<'_> {
    fn key<A: Attributes>(
        &self,
        dimension: &Dimension<A>,
        column: &'static str,
        natural_key: &str,
    ) -> Option<SurrogateKey> {
        let key = dimension.lookup(natural_key);
        if key.is_none() {
            self.orphan(column, natural_key);
        }
        key
    }

    fn date_key(&self, dimension: &DateDimension, raw: &str) -> Option<SurrogateKey> {
        let key = parse_staging_date(raw).and_then(|d| dimension.lookup(d));
        if key.is_none() {
            self.orphan("date_key", raw);
        }
        key
    }

    fn orphan(&self, column: &'static str, natural_key: &str) {
        self.warnings.record(
            DataQualityWarning::OrphanForeignKey {
                fact: self.fact,
                column,
                row: self.row,
                natural_key: natural_key.to_string(),
            }
            .into(),
        );
    }

    fn measure(&self, column: &'static str, measure: &Measure) -> f64 {
        match measure.value() {
            Some(value) => value,
            None => {
                self.warnings.record(
                    DataQualityWarning::UnparseableMeasure {
                        table: self.source,
                        column,
                        row: self.row,
                        raw: measure.raw().to_string(),
                    }
                    .into(),
                );
                0.0
            }
        }
    }
}

pub fn build_ad_performance_facts(
    staging: &[AdStagingRow],
    dims: &DimensionSet,
    warnings: &dyn WarningSink,
) -> AdPerformanceFacts {
    let rows: Vec<AdPerformanceFact> = staging
        .iter()
        .enumerate()
        .map(|(index, row)| {
            let join = RowJoin {
                fact: FACT_AD_PERFORMANCE,
                source: AD_STAGING,
                row: index + 1,
                warnings,
            };
            AdPerformanceFact {
                date_key: join.date_key(&dims.date, &row.date),
                campaign_key: join.key(&dims.campaign, "campaign_key", &row.campaign),
                site_key: join.key(&dims.site, "site_key", &row.site),
                creative_key: join.key(&dims.creative, "creative_key", &row.creative),
                placement_key: join.key(&dims.placement, "placement_key", &row.placement),
                size_key: join.key(&dims.size, "size_key", &row.size),
                impressions: join.measure("impressions", &row.impressions),
                clicks: join.measure("clicks", &row.clicks),
            }
        })
        .collect();

    tracing::debug!(table = FACT_AD_PERFORMANCE, rows = rows.len(), "Fact built");
    AdPerformanceFacts { rows }
}

pub fn build_web_analytics_facts(
    staging: &[WebStagingRow],
    dims: &DimensionSet,
    warnings: &dyn WarningSink,
) -> WebAnalyticsFacts {
    let rows: Vec<WebAnalyticsFact> = staging
        .iter()
        .enumerate()
        .map(|(index, row)| {
            let join = RowJoin {
                fact: FACT_WEB_ANALYTICS,
                source: WEB_STAGING,
                row: index + 1,
                warnings,
            };
            WebAnalyticsFact {
                date_key: join.date_key(&dims.date, &row.date),
                campaign_key: join.key(&dims.campaign, "campaign_key", &row.campaign),
                source_key: join.key(&dims.source, "source_key", &row.source),
                device_key: join.key(&dims.device, "device_key", &row.device),
                ad_content_key: join.key(&dims.ad_content, "ad_content_key", &row.ad_content),
                users: join.measure("users", &row.users),
                new_users: join.measure("new_users", &row.new_users),
                sessions: join.measure("sessions", &row.sessions),
                pageviews: join.measure("pageviews", &row.pageviews),
                avg_session_duration_sec: join
                    .measure("avg_session_duration_sec", &row.avg_session_duration_sec),
                bounce_rate: join.measure("bounce_rate", &row.bounce_rate),
            }
        })
        .collect();

    tracing::debug!(table = FACT_WEB_ANALYTICS, rows = rows.len(), "Fact built");
    WebAnalyticsFacts { rows }
}

fn check_key(
    fact: &'static str,
    column: &'static str,
    dimension: &str,
    key: Option<SurrogateKey>,
    exists: impl Fn(SurrogateKey) -> bool,
) -> Result<(), DomainError> {
    match key {
        Some(k) if !exists(k) => Err(DomainError::DanglingForeignKey {
            fact: fact.to_string(),
            column: column.to_string(),
            dimension: dimension.to_string(),
            key: k.get(),
        }),
        _ => Ok(()),
    }
}

impl AdPerformanceFacts {
    pub fn rows_slice(&self) -> &[AdPerformanceFact] {
        &self.rows
    }

    pub fn total_impressions(&self) -> f64 {
        self.rows.iter().map(|r| r.impressions).sum()
    }

    pub fn total_clicks(&self) -> f64 {
        self.rows.iter().map(|r| r.clicks).sum()
    }

    /// Every non-null foreign key must resolve in its dimension.
    pub fn verify_referential_integrity(&self, dims: &DimensionSet) -> Result<(), DomainError> {
        let f = FACT_AD_PERFORMANCE;
        for row in &self.rows {
            check_key(f, "date_key", dims.date.name(), row.date_key, |k| {
                dims.date.contains_key(k)
            })?;
            check_key(f, "campaign_key", dims.campaign.name(), row.campaign_key, |k| {
                dims.campaign.contains_key(k)
            })?;
            check_key(f, "site_key", dims.site.name(), row.site_key, |k| {
                dims.site.contains_key(k)
            })?;
            check_key(f, "creative_key", dims.creative.name(), row.creative_key, |k| {
                dims.creative.contains_key(k)
            })?;
            check_key(f, "placement_key", dims.placement.name(), row.placement_key, |k| {
                dims.placement.contains_key(k)
            })?;
            check_key(f, "size_key", dims.size.name(), row.size_key, |k| {
                dims.size.contains_key(k)
            })?;
        }
        Ok(())
    }
}

impl WebAnalyticsFacts {
    pub fn rows_slice(&self) -> &[WebAnalyticsFact] {
        &self.rows
    }

    pub fn total_sessions(&self) -> f64 {
        self.rows.iter().map(|r| r.sessions).sum()
    }

    pub fn verify_referential_integrity(&self, dims: &DimensionSet) -> Result<(), DomainError> {
        let f = FACT_WEB_ANALYTICS;
        for row in &self.rows {
            check_key(f, "date_key", dims.date.name(), row.date_key, |k| {
                dims.date.contains_key(k)
            })?;
            check_key(f, "campaign_key", dims.campaign.name(), row.campaign_key, |k| {
                dims.campaign.contains_key(k)
            })?;
            check_key(f, "source_key", dims.source.name(), row.source_key, |k| {
                dims.source.contains_key(k)
            })?;
            check_key(f, "device_key", dims.device.name(), row.device_key, |k| {
                dims.device.contains_key(k)
            })?;
            check_key(f, "ad_content_key", dims.ad_content.name(), row.ad_content_key, |k| {
                dims.ad_content.contains_key(k)
            })?;
        }
        Ok(())
    }
}

impl Table for AdPerformanceFacts {
    fn name(&self) -> &str {
        FACT_AD_PERFORMANCE
    }

    fn header(&self) -> Vec<&'static str> {
        vec![
            "date_key",
            "campaign_key",
            "site_key",
            "creative_key",
            "placement_key",
            "size_key",
            "impressions",
            "clicks",
        ]
    }

    fn rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|r| {
                vec![
                    key_cell(r.date_key),
                    key_cell(r.campaign_key),
                    key_cell(r.site_key),
                    key_cell(r.creative_key),
                    key_cell(r.placement_key),
                    key_cell(r.size_key),
                    number_cell(r.impressions),
                    number_cell(r.clicks),
                ]
            })
            .collect()
    }

    fn len(&self) -> usize {
        self.rows.len()
    }
}

impl Table for WebAnalyticsFacts {
    fn name(&self) -> &str {
        FACT_WEB_ANALYTICS
    }

    fn header(&self) -> Vec<&'static str> {
        vec![
            "date_key",
            "campaign_key",
            "source_key",
            "device_key",
            "ad_content_key",
            "users",
            "new_users",
            "sessions",
            "pageviews",
            "avg_session_duration_sec",
            "bounce_rate",
        ]
    }

    fn rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|r| {
                vec![
                    key_cell(r.date_key),
                    key_cell(r.campaign_key),
                    key_cell(r.source_key),
                    key_cell(r.device_key),
                    key_cell(r.ad_content_key),
                    number_cell(r.users),
                    number_cell(r.new_users),
                    number_cell(r.sessions),
                    number_cell(r.pageviews),
                    number_cell(r.avg_session_duration_sec),
                    number_cell(r.bounce_rate),
                ]
            })
            .collect()
    }

    fn len(&self) -> usize {
        self.rows.len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::bridge::{BridgeMatcher, CuratedTable, resolve_bridge};
    use crate::domain::staging::StagingSet;
    use crate::domain::warning::WarningCollector;

    fn ad(creative: &str, site: &str, impressions: &str, clicks: &str) -> AdStagingRow {
        AdStagingRow {
            date: "2024-01-01".into(),
            campaign: "Brand".into(),
            site: site.into(),
            placement: "AR_ROS_Top".into(),
            creative: creative.into(),
            size: "300x250".into(),
            impressions: impressions.into(),
            clicks: clicks.into(),
        }
    }

    fn web(ad_content: &str, sessions: &str) -> WebStagingRow {
        WebStagingRow {
            date: "2024-01-01".into(),
            campaign: "Brand".into(),
            source: "google".into(),
            device: "mobile".into(),
            ad_content: ad_content.into(),
            users: "5".into(),
            new_users: "2".into(),
            sessions: sessions.into(),
            pageviews: "20".into(),
            avg_session_duration_sec: "31.5".into(),
            bounce_rate: "0.4".into(),
        }
    }

    #[test]
    fn test_row_count_and_totals_are_conserved() {
        let staging = StagingSet::new(
            vec![
                ad("a", "news.com", "1000", "12"),
                ad("a", "news.com", "1000", "12"),
                ad("b", "sport.fr", "250", "3"),
            ],
            vec![web("x", "7"), web("y", "3")],
        );
        let sink = WarningCollector::new();
        let dims = DimensionSet::build(&staging, &sink);

        let ad_facts = build_ad_performance_facts(&staging.ad, &dims, &sink);
        let web_facts = build_web_analytics_facts(&staging.web, &dims, &sink);

        // duplicate staging rows are kept
        assert_eq!(ad_facts.len(), 3);
        assert_eq!(web_facts.len(), 2);
        assert_eq!(ad_facts.total_impressions(), staging.ad_total(|r| &r.impressions));
        assert_eq!(ad_facts.total_clicks(), staging.ad_total(|r| &r.clicks));
        assert_eq!(web_facts.total_sessions(), 10.0);
        assert!(sink.is_empty());
        assert!(ad_facts.verify_referential_integrity(&dims).is_ok());
        assert!(web_facts.verify_referential_integrity(&dims).is_ok());
    }

    #[test]
    fn test_orphan_key_is_null_and_reported() {
        let staging = StagingSet::new(vec![ad("a", "news.com", "10", "1")], vec![]);
        let dims = DimensionSet::build(&staging, &WarningCollector::new());

        let sink = WarningCollector::new();
        let other = vec![ad("a", "ghost.com", "10", "1")];
        let facts = build_ad_performance_facts(&other, &dims, &sink);

        let row = &facts.rows_slice()[0];
        assert_eq!(row.site_key, None);
        assert!(row.creative_key.is_some());
        assert_eq!(facts.rows()[0][2], "");
        assert_eq!(sink.summary().by_kind.get("orphan_foreign_key"), Some(&1));
    }

    #[test]
    fn test_unparseable_measure_defaults_to_zero() {
        let staging = StagingSet::new(vec![ad("a", "s", "n/a", "")], vec![]);
        let sink = WarningCollector::new();
        let dims = DimensionSet::build(&staging, &sink);
        let facts = build_ad_performance_facts(&staging.ad, &dims, &sink);

        assert_eq!(facts.total_impressions(), 0.0);
        assert_eq!(facts.total_clicks(), 0.0);
        assert_eq!(sink.summary().by_kind.get("unparseable_measure"), Some(&2));
    }

    #[test]
    fn test_unparseable_date_leaves_null_date_key() {
        let mut row = ad("a", "s", "1", "0");
        row.date = "31/01/2024".into();
        let staging = StagingSet::new(vec![row], vec![]);
        let sink = WarningCollector::new();
        let dims = DimensionSet::build(&staging, &sink);
        let facts = build_ad_performance_facts(&staging.ad, &dims, &sink);

        assert_eq!(facts.rows_slice()[0].date_key, None);
        assert!(dims.date.is_empty());
    }

    #[test]
    fn test_dangling_key_is_detected() {
        let staging = StagingSet::new(vec![ad("a", "s", "1", "0")], vec![]);
        let sink = WarningCollector::new();
        let dims = DimensionSet::build(&staging, &sink);
        let mut facts = build_ad_performance_facts(&staging.ad, &dims, &sink);
        facts.rows[0].site_key = Some(SurrogateKey::new(42));

        let err = facts.verify_referential_integrity(&dims).unwrap_err();
        assert!(matches!(err, DomainError::DanglingForeignKey { key: 42, .. }));
    }

    #[test]
    fn test_curated_creative_scenario() {
        let staging = StagingSet::new(
            vec![ad("300x250_AR_RFL_FN", "news.com", "1000", "5")],
            vec![web("300x250_AR_FN", "4")],
        );
        let sink = WarningCollector::new();
        let dims = DimensionSet::build(&staging, &sink);
        let facts = build_ad_performance_facts(&staging.ad, &dims, &sink);

        let creative_key = dims.creative.lookup("300x250_AR_RFL_FN").unwrap();
        assert_eq!(facts.rows_slice()[0].creative_key, Some(creative_key));

        let matchers: Vec<Box<dyn BridgeMatcher>> = vec![Box::new(
            CuratedTable::new(CuratedTable::reference_entries()).unwrap(),
        )];
        let bridge = resolve_bridge(&dims.creative, &dims.ad_content, &matchers).unwrap();
        let links = bridge.ad_contents_for(creative_key);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].0, dims.ad_content.lookup("300x250_AR_FN").unwrap());
        assert_eq!(links[0].1, 1.0);
    }
}
