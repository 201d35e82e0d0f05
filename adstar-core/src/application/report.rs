// adstar-core/src/application/report.rs

//! Plain-text analysis report. Rendered from in-memory KPI values only, so the
//! same star schema always yields the same report.

use comfy_table::{CellAlignment, Table as TextTable, presets};
use std::fmt::Write;

use crate::domain::kpi::KpiSet;
use crate::domain::validation::ValidationSummary;
use crate::domain::warning::WarningSummary;

pub const REPORT_FILE: &str = "analysis_report.txt";

const TOP_SITES: usize = 5;

/// Verdict thresholds on the overall CTR, in percent.
const GOOD_CTR_PCT: f64 = 0.5;
const MODERATE_CTR_PCT: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CtrVerdict {
    Good,
    Moderate,
    Low,
}

impl CtrVerdict {
    pub fn from_ctr(ctr_pct: f64) -> Self {
        if ctr_pct > GOOD_CTR_PCT {
            Self::Good
        } else if ctr_pct > MODERATE_CTR_PCT {
            Self::Moderate
        } else {
            Self::Low
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Self::Good => "Overall CTR is GOOD (>0.5%): ads are relevant to their audience.",
            Self::Moderate => "Overall CTR is MODERATE (0.2-0.5%): there is room for improvement.",
            Self::Low => "Overall CTR is LOW (<0.2%): creatives and targeting need urgent review.",
        }
    }
}

fn text_table(header: Vec<&str>, numeric_from: usize) -> TextTable {
    let mut table = TextTable::new();
    table.load_preset(presets::ASCII_MARKDOWN).set_header(header);
    let columns = table.column_count();
    for index in numeric_from..columns {
        if let Some(column) = table.column_mut(index) {
            column.set_cell_alignment(CellAlignment::Right);
        }
    }
    table
}

fn thousands(value: f64) -> String {
    let rounded = value.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if rounded < 0 {
        out.insert(0, '-');
    }
    out
}

pub fn render_report(
    project: &str,
    kpis: &KpiSet,
    validation: &ValidationSummary,
    warnings: &WarningSummary,
) -> String {
    let mut out = String::new();
    let s = &kpis.summary;

    // `write!` into a String cannot fail
    let _ = writeln!(out, "ANALYSIS REPORT: {}", project);
    let _ = writeln!(out, "{}", "=".repeat(60));

    let _ = writeln!(out, "\n1. EXECUTIVE SUMMARY\n");
    if let (Some(first), Some(last)) = (validation.coverage.first, validation.coverage.last) {
        let _ = writeln!(out, "Period: {} to {}", first, last);
    }
    let _ = writeln!(out, "Total impressions: {}", thousands(s.total_impressions));
    let _ = writeln!(out, "Total clicks: {}", thousands(s.total_clicks));
    let _ = writeln!(out, "Average CTR: {:.2}%", s.ctr_pct);
    let _ = writeln!(out, "Total sessions: {}", thousands(s.total_sessions));
    let _ = writeln!(out, "Click to session rate: {:.1}%", s.click_to_session_pct);

    let _ = writeln!(out, "\n2. SITE PERFORMANCE\n");
    let mut sites = text_table(vec!["Site", "Category", "Impressions", "Clicks", "CTR %"], 2);
    for site in kpis.by_site.0.iter().take(TOP_SITES) {
        sites.add_row(vec![
            site.site_name.clone(),
            site.site_category.as_str().to_string(),
            thousands(site.impressions),
            thousands(site.clicks),
            format!("{:.2}", site.ctr_pct),
        ]);
    }
    let _ = writeln!(out, "{}", sites);
    if let Some(best) = kpis
        .by_site
        .0
        .iter()
        .max_by(|a, b| a.ctr_pct.total_cmp(&b.ctr_pct).then(b.site_name.cmp(&a.site_name)))
    {
        let _ = writeln!(out, "Best CTR: {} ({:.2}%)", best.site_name, best.ctr_pct);
    }

    let _ = writeln!(out, "\n3. CREATIVE PERFORMANCE\n");
    if !kpis.by_creative.bridged {
        let _ = writeln!(
            out,
            "No cross-system creative mapping available: ad performance only."
        );
    }
    if let Some(best) = kpis.by_creative.rows.iter().max_by(|a, b| {
        a.ctr_pct
            .total_cmp(&b.ctr_pct)
            .then(b.creative_name.cmp(&a.creative_name))
    }) {
        let _ = writeln!(
            out,
            "Best creative by CTR: {} ({:.2}%)",
            best.creative_name, best.ctr_pct
        );
        if let Some(web) = &best.web {
            let _ = writeln!(
                out,
                "  linked sessions: {}, click to session rate: {:.2}%",
                thousands(web.sessions),
                best.click_to_session_pct()
            );
        }
    }

    let _ = writeln!(out, "\n4. DEVICE BREAKDOWN\n");
    let mut devices = text_table(
        vec!["Device", "Users", "Sessions", "Pages/Session", "Bounce %"],
        1,
    );
    for device in &kpis.by_device.0 {
        devices.add_row(vec![
            device.device_category.clone(),
            thousands(device.users),
            thousands(device.sessions),
            format!("{:.2}", device.pages_per_session),
            format!("{:.1}", device.mean_bounce_rate * 100.0),
        ]);
    }
    let _ = writeln!(out, "{}", devices);

    let _ = writeln!(out, "\n5. VERDICT\n");
    let _ = writeln!(out, "{}", CtrVerdict::from_ctr(s.ctr_pct).describe());

    let _ = writeln!(out, "\n6. DATA QUALITY\n");
    let _ = writeln!(
        out,
        "Warnings: {} data quality, {} integrity",
        warnings.data_quality, warnings.integrity
    );
    for (kind, count) in &warnings.by_kind {
        let _ = writeln!(out, "  {}: {}", kind, count);
    }

    out
}
