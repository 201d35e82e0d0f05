// adstar-core/src/infrastructure/staging_csv.rs

use serde::de::DeserializeOwned;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

use crate::domain::staging::{AD_STAGING, AdStagingRow, StagingSet, WEB_STAGING, WebStagingRow};
use crate::error::AdstarError;
use crate::infrastructure::error::InfrastructureError;
use crate::ports::staging::StagingSource;

const AD_COLUMNS: [&str; 8] = [
    "date",
    "campaign",
    "site",
    "placement",
    "creative",
    "size",
    "impressions",
    "clicks",
];

const WEB_COLUMNS: [&str; 11] = [
    "date",
    "campaign",
    "source",
    "device",
    "ad_content",
    "users",
    "new_users",
    "sessions",
    "pageviews",
    "avg_session_duration_sec",
    "bounce_rate",
];

/// Reads the two staging exports from CSV files with a header row.
/// Extra columns are ignored, missing ones make the table unreadable.
#[derive(Debug, Clone)]
pub struct CsvStagingSource {
    ad_path: PathBuf,
    web_path: PathBuf,
}

impl CsvStagingSource {
    pub fn new(ad_path: impl Into<PathBuf>, web_path: impl Into<PathBuf>) -> Self {
        Self {
            ad_path: ad_path.into(),
            web_path: web_path.into(),
        }
    }
}

impl StagingSource for CsvStagingSource {
    #[instrument(skip(self), fields(ad = ?self.ad_path, web = ?self.web_path))]
    fn load(&self) -> Result<StagingSet, AdstarError> {
        let ad: Vec<AdStagingRow> = read_table(AD_STAGING, &self.ad_path, &AD_COLUMNS)?;
        let web: Vec<WebStagingRow> = read_table(WEB_STAGING, &self.web_path, &WEB_COLUMNS)?;
        info!(ad_rows = ad.len(), web_rows = web.len(), "Staging loaded");
        Ok(StagingSet::new(ad, web))
    }
}

fn read_table<T: DeserializeOwned>(
    table: &str,
    path: &Path,
    required: &[&str],
) -> Result<Vec<T>, InfrastructureError> {
    let unreadable = |reason: String| InfrastructureError::UnreadableStagingTable {
        table: table.to_string(),
        reason,
    };

    if !path.is_file() {
        return Err(InfrastructureError::MissingStagingTable {
            table: table.to_string(),
            path: path.display().to_string(),
        });
    }

    let file = File::open(path).map_err(|e| unreadable(e.to_string()))?;
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(file);

    let headers = reader.headers().map_err(|e| unreadable(e.to_string()))?.clone();
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|column| !headers.iter().any(|h| h == *column))
        .collect();
    if !missing.is_empty() {
        return Err(unreadable(format!("missing column(s): {}", missing.join(", "))));
    }

    reader
        .deserialize()
        .enumerate()
        .map(|(index, record)| {
            record.map_err(|e| unreadable(format!("row {}: {}", index + 1, e)))
        })
        .collect()
}
