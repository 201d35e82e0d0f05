// adstar/src/commands/run.rs
//
// USE CASE: Build the star schema, KPIs and report.

use std::path::PathBuf;

use anyhow::Context;
use adstar_core::application::run_pipeline;
use adstar_core::infrastructure::adapters::DuckDBConnector;
use adstar_core::infrastructure::config::{load_project_config, resolve};
use adstar_core::infrastructure::CsvStagingSource;
use adstar_core::ports::connector::Connector;

pub async fn execute(project_dir: PathBuf) -> anyhow::Result<()> {
    let start = std::time::Instant::now();

    // A. Load the Config (Infra)
    println!("⚙️  Loading configuration...");
    let config = load_project_config(&project_dir).with_context(|| {
        format!(
            "Failed to load project configuration from {:?}",
            project_dir
        )
    })?;
    println!("   Project: {} (v{})", config.name, config.version);

    // B. Staging reader + optional warehouse
    let source = CsvStagingSource::new(
        resolve(&project_dir, &config.staging.ad_path),
        resolve(&project_dir, &config.staging.web_path),
    );
    tracing::debug!(source = ?source, "Staging source resolved");

    let connector: Option<Box<dyn Connector>> = if config.warehouse.enabled {
        let db_path = resolve(&project_dir, &config.warehouse.path);
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        println!("   Warehouse: DuckDB 🦆 ({})", db_path.display());
        let db_path = db_path.to_string_lossy().to_string();
        Some(Box::new(DuckDBConnector::new(&db_path).with_context(
            || format!("Failed to initialize DuckDB at {}", db_path),
        )?))
    } else {
        None
    };

    // C. Run the Pipeline (Application Layer)
    let result = run_pipeline(&project_dir, &config, &source, connector.as_deref()).await;

    match result {
        Ok(run_res) => {
            for (table, rows) in &run_res.row_counts {
                println!("   {:<28} {:>8} rows", table, rows);
            }
            println!(
                "   Warnings: {} data quality, {} integrity",
                run_res.warnings.data_quality, run_res.warnings.integrity
            );
            if !run_res.bridged {
                println!("   ⚠️  Bridge is empty: creative KPIs are ad-only");
            }
            println!("\n✨ SUCCESS! Star schema built in {:.2?}", start.elapsed());
        }
        Err(e) => {
            eprintln!("\n💥 CRITICAL PIPELINE ERROR: {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}
