// adstar/src/commands/validate.rs
//
// USE CASE: Extract + Validate only. Nothing is written.

use std::path::PathBuf;

use anyhow::Context;
use adstar_core::application::validate_project;
use adstar_core::infrastructure::CsvStagingSource;
use adstar_core::infrastructure::config::{load_project_config, resolve};

pub fn execute(project_dir: PathBuf, show: usize) -> anyhow::Result<()> {
    let config = load_project_config(&project_dir).with_context(|| {
        format!(
            "Failed to load project configuration from {:?}",
            project_dir
        )
    })?;
    let source = CsvStagingSource::new(
        resolve(&project_dir, &config.staging.ad_path),
        resolve(&project_dir, &config.staging.web_path),
    );

    let (summary, warnings) = match validate_project(&source) {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("❌ Validation failed: {}", e);
            std::process::exit(1);
        }
    };

    println!("🔎 Staging validation: {}", config.name);
    println!("   Ad staging rows:  {}", summary.ad_rows);
    println!("   Web staging rows: {}", summary.web_rows);

    let coverage = &summary.coverage;
    println!(
        "   Dates: {} ad, {} web, {} common",
        coverage.ad_dates, coverage.web_dates, coverage.common_dates
    );
    if let (Some(first), Some(last)) = (coverage.first, coverage.last) {
        println!("   Period: {} to {}", first, last);
    }

    let totals = &summary.totals;
    println!(
        "   Impressions: {:.0}, clicks: {:.0}, CTR: {:.2}%",
        totals.impressions, totals.clicks, totals.ctr_pct
    );
    println!(
        "   Sessions: {:.0}, users: {:.0}, mean bounce rate: {:.1}%",
        totals.sessions,
        totals.users,
        totals.mean_bounce_rate * 100.0
    );
    println!(
        "   Creative/ad_content probe matches: {}",
        summary.probe_matches
    );

    if warnings.is_empty() {
        println!("\n✅ No warnings.");
        return Ok(());
    }

    println!("\n⚠️  {} warning(s)", warnings.len());
    for warning in warnings.iter().take(show) {
        eprintln!("{:?}", miette::Report::new(warning.clone()));
    }
    if warnings.len() > show {
        println!("   ... and {} more", warnings.len() - show);
    }

    Ok(())
}
