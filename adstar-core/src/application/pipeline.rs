// adstar-core/src/application/pipeline.rs

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::error::AdstarError;
use crate::ports::connector::Connector;
use crate::ports::reporter::WarningSink;
use crate::ports::staging::StagingSource;

// Application Services
use crate::application::publish::{StagedSnapshot, publish_warehouse, swap_all};
use crate::application::report::{REPORT_FILE, render_report};

// Domain
use crate::domain::bridge::{Bridge, BridgeMatcher, matchers_from_kinds, resolve_bridge};
use crate::domain::dimension::set::{
    build_ad_content_dimension, build_campaign_dimension, build_creative_dimension,
    build_date_dimension, build_device_dimension, build_placement_dimension,
    build_site_dimension, build_size_dimension, build_source_dimension,
};
use crate::domain::dimension::DimensionSet;
use crate::domain::dimension::date::DateDimension;
use crate::domain::fact::{
    AdPerformanceFacts, WebAnalyticsFacts, build_ad_performance_facts, build_web_analytics_facts,
};
use crate::domain::kpi::{KpiSet, aggregate_kpis};
use crate::domain::pipeline::Phase;
use crate::domain::staging::StagingSet;
use crate::domain::table::Table;
use crate::domain::validation::{ValidationSummary, validate_staging};
use crate::domain::warning::{Warning, WarningCollector, WarningSummary};

// Infrastructure
use crate::infrastructure::adapters::TracingWarningSink;
use crate::infrastructure::config::{ProjectConfig, resolve};
use crate::infrastructure::error::InfrastructureError;

pub const RUN_RESULTS_FILE: &str = "run_results.json";

/// Absolute tolerance when checking that facts conserve staging totals.
const CONSERVATION_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Serialize)]
pub struct PhaseTiming {
    pub phase: Phase,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub success: bool,
    pub project: String,
    pub phases: Vec<PhaseTiming>,
    pub row_counts: BTreeMap<String, usize>,
    pub bridged: bool,
    pub validation: ValidationSummary,
    pub warnings: WarningSummary,
    pub warning_details: Vec<Warning>,
}

/// Everything a run publishes under the target path.
#[derive(Debug, Clone)]
pub struct StarSchema {
    pub dimensions: DimensionSet,
    pub bridge: Bridge,
    pub ad_performance: AdPerformanceFacts,
    pub web_analytics: WebAnalyticsFacts,
}

impl StarSchema {
    pub fn tables(&self) -> Vec<&dyn Table> {
        let mut tables = self.dimensions.tables();
        tables.push(&self.bridge);
        tables.push(&self.ad_performance);
        tables.push(&self.web_analytics);
        tables
    }
}

#[derive(Default)]
struct PhaseClock {
    timings: Vec<PhaseTiming>,
}

impl PhaseClock {
    fn run<T>(
        &mut self,
        phase: Phase,
        body: impl FnOnce() -> Result<T, AdstarError>,
    ) -> Result<T, AdstarError> {
        let started = self.start(phase);
        let out = body().map_err(|e| e.in_phase(phase))?;
        self.record(phase, started);
        Ok(out)
    }

    fn start(&self, phase: Phase) -> Instant {
        info!(phase = %phase, "▶️  Phase started");
        Instant::now()
    }

    fn record(&mut self, phase: Phase, started: Instant) {
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        debug!(phase = %phase, duration_ms, "Phase finished");
        self.timings.push(PhaseTiming { phase, duration_ms });
    }
}

// --- PHASES ---

pub fn extract(source: &dyn StagingSource) -> Result<StagingSet, AdstarError> {
    let staging = source.load()?;
    info!(
        ad_rows = staging.ad.len(),
        web_rows = staging.web.len(),
        "📥 Staging loaded"
    );
    Ok(staging)
}

type DimensionBuilder<T> = fn(&StagingSet, &dyn WarningSink) -> T;

fn date_dimension(staging: &StagingSet, _warnings: &dyn WarningSink) -> DateDimension {
    build_date_dimension(staging)
}

async fn spawn_dimension<T: Send + 'static>(
    staging: &Arc<StagingSet>,
    warnings: &Arc<dyn WarningSink>,
    builder: DimensionBuilder<T>,
) -> Result<T, AdstarError> {
    let staging = Arc::clone(staging);
    let warnings = Arc::clone(warnings);
    let built = tokio::task::spawn_blocking(move || builder(&staging, warnings.as_ref())).await?;
    Ok(built)
}

/// Builds the nine dimensions concurrently, then resolves the bridge once
/// creative and ad_content keys are final.
#[instrument(skip_all)]
pub async fn build_dimensions(
    staging: Arc<StagingSet>,
    warnings: Arc<dyn WarningSink>,
    matchers: &[Box<dyn BridgeMatcher>],
) -> Result<(DimensionSet, Bridge), AdstarError> {
    let (date, campaign, site, creative, placement, device, source, ad_content, size) = tokio::try_join!(
        spawn_dimension(&staging, &warnings, date_dimension),
        spawn_dimension(&staging, &warnings, build_campaign_dimension),
        spawn_dimension(&staging, &warnings, build_site_dimension),
        spawn_dimension(&staging, &warnings, build_creative_dimension),
        spawn_dimension(&staging, &warnings, build_placement_dimension),
        spawn_dimension(&staging, &warnings, build_device_dimension),
        spawn_dimension(&staging, &warnings, build_source_dimension),
        spawn_dimension(&staging, &warnings, build_ad_content_dimension),
        spawn_dimension(&staging, &warnings, build_size_dimension),
    )?;

    let dimensions = DimensionSet {
        date,
        campaign,
        site,
        creative,
        placement,
        device,
        source,
        ad_content,
        size,
    };
    dimensions.verify()?;

    let bridge = resolve_bridge(&dimensions.creative, &dimensions.ad_content, matchers)?;
    bridge.verify(&dimensions.creative, &dimensions.ad_content)?;
    info!(
        dimensions = dimensions.tables().len(),
        bridge_rows = bridge.rows_slice().len(),
        "🧱 Dimensions built"
    );

    Ok((dimensions, bridge))
}

pub fn build_facts(
    staging: &StagingSet,
    dimensions: DimensionSet,
    bridge: Bridge,
    warnings: &dyn WarningSink,
) -> Result<StarSchema, AdstarError> {
    let ad_performance = build_ad_performance_facts(&staging.ad, &dimensions, warnings);
    let web_analytics = build_web_analytics_facts(&staging.web, &dimensions, warnings);

    ad_performance.verify_referential_integrity(&dimensions)?;
    web_analytics.verify_referential_integrity(&dimensions)?;
    check_conservation(
        "impressions",
        staging.ad_total(|r| &r.impressions),
        ad_performance.total_impressions(),
    )?;
    check_conservation(
        "clicks",
        staging.ad_total(|r| &r.clicks),
        ad_performance.total_clicks(),
    )?;
    check_conservation(
        "sessions",
        staging.web_total(|r| &r.sessions),
        web_analytics.total_sessions(),
    )?;

    Ok(StarSchema {
        dimensions,
        bridge,
        ad_performance,
        web_analytics,
    })
}

fn check_conservation(measure: &str, staged: f64, loaded: f64) -> Result<(), AdstarError> {
    if (staged - loaded).abs() > CONSERVATION_EPSILON {
        return Err(AdstarError::InternalError(format!(
            "fact {} total {} differs from staging total {}",
            measure, loaded, staged
        )));
    }
    Ok(())
}

pub fn aggregate(star: &StarSchema) -> KpiSet {
    aggregate_kpis(
        &star.dimensions,
        &star.bridge,
        &star.ad_performance,
        &star.web_analytics,
    )
}

// --- USE CASES ---

/// Extract and Validate only.
pub fn validate_project(
    source: &dyn StagingSource,
) -> Result<(ValidationSummary, Vec<Warning>), AdstarError> {
    let collector = TracingWarningSink::new(WarningCollector::new());
    let staging = extract(source).map_err(|e| e.in_phase(Phase::Extract))?;
    let summary = validate_staging(&staging, &collector);
    Ok((summary, collector.inner().snapshot()))
}

/// Runs every phase in memory, then publishes. Nothing is written unless all
/// phases succeed.
pub async fn run_pipeline(
    project_dir: &Path,
    config: &ProjectConfig,
    source: &dyn StagingSource,
    connector: Option<&dyn Connector>,
) -> Result<RunResult, AdstarError> {
    info!(project = %config.name, "🚀 Starting star schema build...");

    let target_dir = resolve(project_dir, &config.output.target_path);
    let kpi_dir = resolve(project_dir, &config.output.kpi_path);
    if target_dir.starts_with(&kpi_dir) || kpi_dir.starts_with(&target_dir) {
        return Err(InfrastructureError::ConfigError(format!(
            "output paths must not contain each other: '{}' and '{}'",
            config.output.target_path, config.output.kpi_path
        ))
        .into());
    }

    let matchers = matchers_from_kinds(
        &config.bridge.strategies,
        config.bridge.curated.clone(),
        config.bridge.min_confidence,
        config.bridge.probe_parts,
    )?;

    let collector = Arc::new(TracingWarningSink::new(WarningCollector::new()));
    let sink: Arc<dyn WarningSink> = collector.clone();
    let mut clock = PhaseClock::default();

    // 1. EXTRACT + VALIDATE
    let staging = Arc::new(clock.run(Phase::Extract, || extract(source))?);
    let validation = clock.run(Phase::Validate, || Ok(validate_staging(&staging, sink.as_ref())))?;

    // 2. DIMENSIONS (fork-join) + BRIDGE
    let started = clock.start(Phase::BuildDimensions);
    let (dimensions, bridge) = build_dimensions(Arc::clone(&staging), Arc::clone(&sink), &matchers)
        .await
        .map_err(|e| e.in_phase(Phase::BuildDimensions))?;
    clock.record(Phase::BuildDimensions, started);

    // 3. FACTS
    let star = clock.run(Phase::BuildFacts, || {
        build_facts(&staging, dimensions, bridge, sink.as_ref())
    })?;

    // 4. KPIs + REPORT
    let kpis = clock.run(Phase::AggregateKpis, || Ok(aggregate(&star)))?;
    let warnings = collector.inner().summary();
    let report = clock.run(Phase::GenerateReport, || {
        Ok(render_report(&config.name, &kpis, &validation, &warnings))
    })?;

    // 5. PUBLISH
    let star_tables = star.tables();
    let kpi_tables = kpis.tables();
    let row_counts = star_tables
        .iter()
        .chain(kpi_tables.iter())
        .map(|t| (t.name().to_string(), t.len()))
        .collect();

    let result = RunResult {
        success: true,
        project: config.name.clone(),
        phases: clock.timings,
        row_counts,
        bridged: !star.bridge.is_empty(),
        validation,
        warnings,
        warning_details: collector.inner().snapshot(),
    };

    let mut star_snapshot = StagedSnapshot::new(&target_dir)?;
    star_snapshot.add_tables(&star_tables)?;
    let mut kpi_snapshot = StagedSnapshot::new(&kpi_dir)?;
    kpi_snapshot.add_tables(&kpi_tables)?;
    kpi_snapshot.add_file(REPORT_FILE, &report)?;
    save_json(&kpi_snapshot, RUN_RESULTS_FILE, &result)?;

    // Both directories swap before the warehouse loads from them. Any later
    // failure reverts both, so they never mix two runs.
    let mut published = star_snapshot.published_tables();
    published.extend(kpi_snapshot.published_tables());
    let pending = swap_all(vec![star_snapshot, kpi_snapshot])?;

    if let Some(connector) = connector {
        if let Err(e) = publish_warehouse(connector, &published).await {
            pending.revert()?;
            return Err(e);
        }
    }
    pending.finish();

    info!(
        warnings = result.warnings.total(),
        bridged = result.bridged,
        "✅ Star schema published"
    );
    Ok(result)
}

fn save_json<T: Serialize>(
    snapshot: &StagedSnapshot,
    name: &str,
    data: &T,
) -> Result<(), AdstarError> {
    let content = serde_json::to_string_pretty(data)
        .map_err(|e| AdstarError::InternalError(format!("Serialization: {}", e)))?;
    snapshot.add_file(name, content)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::staging::{AdStagingRow, WebStagingRow};
    use anyhow::Result;
    use std::fs;
    use tempfile::tempdir;

    struct FixtureSource(Option<StagingSet>);

    impl StagingSource for FixtureSource {
        fn load(&self) -> Result<StagingSet, AdstarError> {
            self.0.clone().ok_or_else(|| {
                InfrastructureError::MissingStagingTable {
                    table: "ad_staging".into(),
                    path: "data/staging/ad_staging.csv".into(),
                }
                .into()
            })
        }
    }

    fn ad(date: &str, site: &str, creative: &str, impressions: &str, clicks: &str) -> AdStagingRow {
        AdStagingRow {
            date: date.into(),
            campaign: "Spring".into(),
            site: site.into(),
            placement: "Homepage_Top".into(),
            creative: creative.into(),
            size: "300x250".into(),
            impressions: impressions.into(),
            clicks: clicks.into(),
        }
    }

    fn web(date: &str, ad_content: &str, sessions: &str) -> WebStagingRow {
        WebStagingRow {
            date: date.into(),
            campaign: "Spring".into(),
            source: "google".into(),
            device: "mobile".into(),
            ad_content: ad_content.into(),
            users: "10".into(),
            new_users: "4".into(),
            sessions: sessions.into(),
            pageviews: "30".into(),
            avg_session_duration_sec: "60".into(),
            bounce_rate: "0.4".into(),
        }
    }

    fn staging() -> StagingSet {
        StagingSet::new(
            vec![
                ad("2024-01-01", "news.com", "300x250_AR_RFL_FN", "1000", "5"),
                ad("2024-01-02", "sport.com", "728x90_AR_FN", "oops", "2"),
            ],
            vec![
                web("2024-01-01", "300x250_AR_FN", "12"),
                web("2024-01-02", "", "3"),
            ],
        )
    }

    fn config(dir: &Path) -> ProjectConfig {
        let yaml = "name: demo\n";
        let mut config: ProjectConfig = serde_yaml::from_str(yaml).unwrap();
        config.output.target_path = dir.join("target/dimensional").display().to_string();
        config.output.kpi_path = dir.join("target/outputs").display().to_string();
        config
    }

    #[tokio::test]
    async fn test_run_publishes_everything() -> Result<()> {
        let dir = tempdir()?;
        let config = config(dir.path());
        let result = run_pipeline(dir.path(), &config, &FixtureSource(Some(staging())), None).await?;

        assert!(result.success);
        assert!(result.bridged);
        assert_eq!(result.phases.len(), Phase::ALL.len());
        assert_eq!(result.row_counts["fact_ad_performance"], 2);
        assert_eq!(result.row_counts["dim_site"], 2);
        assert_eq!(result.warnings.by_kind["unparseable_measure"], 1);
        assert_eq!(result.warnings.by_kind["orphan_foreign_key"], 1);

        let target = dir.path().join("target/dimensional");
        for table in ["dim_date", "dim_creative_size", "bridge_creative_adcontent", "fact_web_analytics"] {
            assert!(target.join(format!("{}.csv", table)).exists(), "{}", table);
        }
        let outputs = dir.path().join("target/outputs");
        assert!(outputs.join(REPORT_FILE).exists());
        assert!(outputs.join("kpi_by_creative.csv").exists());
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(outputs.join(RUN_RESULTS_FILE))?)?;
        assert_eq!(json["success"], true);
        Ok(())
    }

    #[tokio::test]
    async fn test_rebuild_is_byte_identical() -> Result<()> {
        let dir = tempdir()?;
        let config = config(dir.path());
        let source = FixtureSource(Some(staging()));
        let target = dir.path().join("target/dimensional");

        run_pipeline(dir.path(), &config, &source, None).await?;
        let first = fs::read(target.join("fact_ad_performance.csv"))?;
        run_pipeline(dir.path(), &config, &source, None).await?;
        let second = fs::read(target.join("fact_ad_performance.csv"))?;

        assert_eq!(first, second);
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_staging_writes_nothing() -> Result<()> {
        let dir = tempdir()?;
        let config = config(dir.path());

        let err = run_pipeline(dir.path(), &config, &FixtureSource(None), None)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AdstarError::PhaseFailed {
                phase: Phase::Extract,
                ..
            }
        ));
        assert!(!dir.path().join("target").exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_bridge_still_aggregates() -> Result<()> {
        let dir = tempdir()?;
        let mut config = config(dir.path());
        config.bridge.strategies.clear();

        let result = run_pipeline(dir.path(), &config, &FixtureSource(Some(staging())), None).await?;

        assert!(!result.bridged);
        assert_eq!(result.row_counts["bridge_creative_adcontent"], 0);
        assert_eq!(result.row_counts["kpi_by_creative"], 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_nested_output_paths_rejected() -> Result<()> {
        let dir = tempdir()?;
        let mut config = config(dir.path());
        config.output.kpi_path = dir.path().join("target/dimensional/kpi").display().to_string();

        let err = run_pipeline(dir.path(), &config, &FixtureSource(Some(staging())), None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("must not contain each other"));
        Ok(())
    }

    #[tokio::test]
    async fn test_parallel_build_matches_sequential() -> Result<()> {
        let staging = Arc::new(staging());
        let sink: Arc<dyn WarningSink> = Arc::new(WarningCollector::new());

        let (parallel, _) = build_dimensions(Arc::clone(&staging), sink, &[]).await?;
        let sequential = DimensionSet::build(&staging, &WarningCollector::new());

        let parallel = parallel.tables();
        let sequential = sequential.tables();
        assert_eq!(parallel.len(), 9);
        assert_eq!(parallel.len(), sequential.len());
        for (p, s) in parallel.iter().zip(&sequential) {
            assert_eq!(p.name(), s.name());
            assert_eq!(p.header(), s.header(), "{}", p.name());
            assert_eq!(p.rows(), s.rows(), "{}", p.name());
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_out_of_range_dates_become_orphans() -> Result<()> {
        let dir = tempdir()?;
        let config = config(dir.path());
        let mut staging = staging();
        staging.ad.push(ad("-0001-06-15", "news.com", "300x250_AR_RFL_FN", "10", "1"));
        staging.web.push(web("+12345-01-01", "300x250_AR_FN", "7"));

        let result = run_pipeline(dir.path(), &config, &FixtureSource(Some(staging)), None).await?;

        assert_eq!(result.row_counts["dim_date"], 2);
        assert_eq!(result.row_counts["fact_ad_performance"], 3);
        assert_eq!(result.row_counts["fact_web_analytics"], 3);
        assert_eq!(result.warnings.by_kind["unparseable_date"], 2);
        let facts = fs::read_to_string(dir.path().join("target/dimensional/fact_ad_performance.csv"))?;
        assert!(facts.lines().skip(1).any(|line| line.starts_with(',')));
        Ok(())
    }

    struct RejectingWarehouse;

    #[async_trait::async_trait]
    impl Connector for RejectingWarehouse {
        async fn execute(&self, _query: &str) -> Result<(), AdstarError> {
            Ok(())
        }
        async fn load_table(&self, _table_name: &str, csv_path: &str) -> Result<(), AdstarError> {
            assert!(Path::new(csv_path).exists(), "{}", csv_path);
            Err(AdstarError::InternalError("disk full".into()))
        }
        async fn count_rows(&self, _table_name: &str) -> Result<u64, AdstarError> {
            Ok(0)
        }
        fn engine_name(&self) -> &str {
            "rejecting"
        }
    }

    #[tokio::test]
    async fn test_failed_warehouse_keeps_previous_outputs() -> Result<()> {
        let dir = tempdir()?;
        let config = config(dir.path());
        run_pipeline(dir.path(), &config, &FixtureSource(Some(staging())), None).await?;
        let target = dir.path().join("target/dimensional");
        let outputs = dir.path().join("target/outputs");
        let facts = fs::read(target.join("fact_ad_performance.csv"))?;
        let results = fs::read(outputs.join(RUN_RESULTS_FILE))?;

        let mut changed = staging();
        changed.ad[0].impressions = "2000".into();
        let err = run_pipeline(
            dir.path(),
            &config,
            &FixtureSource(Some(changed)),
            Some(&RejectingWarehouse),
        )
        .await;

        assert!(err.is_err());
        assert_eq!(fs::read(target.join("fact_ad_performance.csv"))?, facts);
        assert_eq!(fs::read(outputs.join(RUN_RESULTS_FILE))?, results);
        assert_eq!(fs::read_dir(dir.path().join("target"))?.count(), 2);
        Ok(())
    }

    #[test]
    fn test_validate_project_reports_only() -> Result<()> {
        let mut staging = staging();
        staging.web[1].device = " ".into();

        let (summary, warnings) = validate_project(&FixtureSource(Some(staging)))?;
        assert_eq!(summary.ad_rows, 2);
        assert_eq!(summary.coverage.common_dates, 2);
        assert!(warnings.iter().any(|w| w.kind() == "empty_natural_key"));
        Ok(())
    }
}
