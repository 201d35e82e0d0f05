// adstar-core/src/domain/kpi.rs

//! KPI tables computed from the finished star schema.
//!
//! Grouped KPIs join facts to one dimension: fact rows whose key for that
//! dimension is null are left out of the grouping, but still count in the
//! summary.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::domain::bridge::Bridge;
use crate::domain::dimension::{DimensionSet, SiteCategory};
use crate::domain::fact::{
    AdPerformanceFact, AdPerformanceFacts, WebAnalyticsFact, WebAnalyticsFacts,
};
use crate::domain::table::{SurrogateKey, Table, number_cell, ratio_cell};
use crate::domain::validation::percentage;

pub const KPI_SUMMARY: &str = "kpi_summary";
pub const KPI_BY_SITE: &str = "kpi_by_site";
pub const KPI_BY_CREATIVE: &str = "kpi_by_creative";
pub const KPI_BY_DEVICE: &str = "kpi_by_device";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KpiSummary {
    pub total_impressions: f64,
    pub total_clicks: f64,
    pub ctr_pct: f64,
    pub total_sessions: f64,
    pub total_users: f64,
    pub total_pageviews: f64,
    pub mean_session_duration_sec: f64,
    pub mean_bounce_rate: f64,
    pub click_to_session_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteKpi {
    pub site_name: String,
    pub site_category: SiteCategory,
    pub impressions: f64,
    pub clicks: f64,
    pub ctr_pct: f64,
}

/// Web-side metrics reached through the bridge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreativeWebKpi {
    pub sessions: f64,
    pub users: f64,
    pub mean_bounce_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreativeKpi {
    pub creative_name: String,
    pub impressions: f64,
    pub clicks: f64,
    pub ctr_pct: f64,
    pub web: Option<CreativeWebKpi>,
}

impl CreativeKpi {
    pub fn click_to_session_pct(&self) -> f64 {
        self.web
            .as_ref()
            .map(|w| percentage(w.sessions, self.clicks))
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceKpi {
    pub device_category: String,
    pub users: f64,
    pub sessions: f64,
    pub pageviews: f64,
    pub mean_session_duration_sec: f64,
    pub mean_bounce_rate: f64,
    pub pages_per_session: f64,
}

#[derive(Debug, Clone, Default)]
pub struct SiteKpis(pub Vec<SiteKpi>);

/// `bridged` is false for the simplified, ad-only variant.
#[derive(Debug, Clone, Default)]
pub struct CreativeKpis {
    pub rows: Vec<CreativeKpi>,
    pub bridged: bool,
}

#[derive(Debug, Clone, Default)]
pub struct DeviceKpis(pub Vec<DeviceKpi>);

#[derive(Debug, Clone, Default)]
pub struct KpiSet {
    pub summary: KpiSummary,
    pub by_site: SiteKpis,
    pub by_creative: CreativeKpis,
    pub by_device: DeviceKpis,
}

impl KpiSet {
    pub fn tables(&self) -> Vec<&dyn Table> {
        let tables: [&dyn Table; 4] = [
            &self.summary,
            &self.by_site,
            &self.by_creative,
            &self.by_device,
        ];
        tables.to_vec()
    }
}

#[derive(Debug, Default)]
struct AdTotals {
    impressions: f64,
    clicks: f64,
}

impl AdTotals {
    fn add(&mut self, row: &AdPerformanceFact) {
        self.impressions += row.impressions;
        self.clicks += row.clicks;
    }
}

/// Web activity of one ad content, as seen through the bridge.
#[derive(Debug, Default, Clone, Copy)]
struct AdContentTotals {
    rows: usize,
    sessions: f64,
    users: f64,
    bounce_rate_sum: f64,
}

impl AdContentTotals {
    fn add(&mut self, row: &WebAnalyticsFact) {
        self.rows += 1;
        self.sessions += row.sessions;
        self.users += row.users;
        self.bounce_rate_sum += row.bounce_rate;
    }
}

#[derive(Debug, Default)]
struct DeviceTotals {
    rows: usize,
    users: f64,
    sessions: f64,
    pageviews: f64,
    duration_sum: f64,
    bounce_rate_sum: f64,
}

impl DeviceTotals {
    fn add(&mut self, row: &WebAnalyticsFact) {
        self.rows += 1;
        self.users += row.users;
        self.sessions += row.sessions;
        self.pageviews += row.pageviews;
        self.duration_sum += row.avg_session_duration_sec;
        self.bounce_rate_sum += row.bounce_rate;
    }
}

fn mean(total: f64, count: usize) -> f64 {
    if count == 0 { 0.0 } else { total / count as f64 }
}

pub fn aggregate_kpis(
    dims: &DimensionSet,
    bridge: &Bridge,
    ad_facts: &AdPerformanceFacts,
    web_facts: &WebAnalyticsFacts,
) -> KpiSet {
    let kpis = KpiSet {
        summary: summarize(ad_facts, web_facts),
        by_site: by_site(dims, ad_facts),
        by_creative: by_creative(dims, bridge, ad_facts, web_facts),
        by_device: by_device(dims, web_facts),
    };
    tracing::debug!(
        sites = kpis.by_site.0.len(),
        creatives = kpis.by_creative.rows.len(),
        bridged = kpis.by_creative.bridged,
        devices = kpis.by_device.0.len(),
        "KPIs aggregated"
    );
    kpis
}

fn summarize(ad_facts: &AdPerformanceFacts, web_facts: &WebAnalyticsFacts) -> KpiSummary {
    let web = web_facts.rows_slice();
    let total_impressions = ad_facts.total_impressions();
    let total_clicks = ad_facts.total_clicks();
    let total_sessions = web_facts.total_sessions();

    KpiSummary {
        total_impressions,
        total_clicks,
        ctr_pct: percentage(total_clicks, total_impressions),
        total_sessions,
        total_users: web.iter().map(|r| r.users).sum(),
        total_pageviews: web.iter().map(|r| r.pageviews).sum(),
        mean_session_duration_sec: mean(
            web.iter().map(|r| r.avg_session_duration_sec).sum(),
            web.len(),
        ),
        mean_bounce_rate: mean(web.iter().map(|r| r.bounce_rate).sum(), web.len()),
        click_to_session_pct: percentage(total_sessions, total_clicks),
    }
}

fn ad_sums_by(
    ad_facts: &AdPerformanceFacts,
    key: impl Fn(&AdPerformanceFact) -> Option<SurrogateKey>,
) -> BTreeMap<SurrogateKey, AdTotals> {
    let mut totals: BTreeMap<SurrogateKey, AdTotals> = BTreeMap::new();
    for row in ad_facts.rows_slice() {
        if let Some(k) = key(row) {
            totals.entry(k).or_default().add(row);
        }
    }
    totals
}

fn by_site(dims: &DimensionSet, ad_facts: &AdPerformanceFacts) -> SiteKpis {
    let mut rows: Vec<SiteKpi> = ad_sums_by(ad_facts, |r| r.site_key)
        .into_iter()
        .filter_map(|(key, ad)| {
            let site = dims.site.get(key)?;
            Some(SiteKpi {
                site_name: site.natural_key.clone(),
                site_category: site.attributes.category,
                impressions: ad.impressions,
                clicks: ad.clicks,
                ctr_pct: percentage(ad.clicks, ad.impressions),
            })
        })
        .collect();

    // Sites come out in name order; the stable sort keeps it for ties.
    rows.sort_by(|x, y| y.impressions.total_cmp(&x.impressions));
    SiteKpis(rows)
}

fn by_creative(
    dims: &DimensionSet,
    bridge: &Bridge,
    ad_facts: &AdPerformanceFacts,
    web_facts: &WebAnalyticsFacts,
) -> CreativeKpis {
    let bridged = !bridge.is_empty();

    let mut web_by_ad_content: BTreeMap<SurrogateKey, AdContentTotals> = BTreeMap::new();
    if bridged {
        for row in web_facts.rows_slice() {
            if let Some(k) = row.ad_content_key {
                web_by_ad_content.entry(k).or_default().add(row);
            }
        }
    }

    let rows = ad_sums_by(ad_facts, |r| r.creative_key)
        .into_iter()
        .filter_map(|(key, ad)| {
            let creative = dims.creative.get(key)?;
            let web = bridged.then(|| {
                let linked: Vec<AdContentTotals> = bridge
                    .ad_contents_for(key)
                    .iter()
                    .filter_map(|(ad_content_key, _)| web_by_ad_content.get(ad_content_key))
                    .copied()
                    .collect();
                (!linked.is_empty()).then(|| {
                    let rows = linked.iter().map(|t| t.rows).sum();
                    CreativeWebKpi {
                        sessions: linked.iter().map(|t| t.sessions).sum(),
                        users: linked.iter().map(|t| t.users).sum(),
                        mean_bounce_rate: mean(linked.iter().map(|t| t.bounce_rate_sum).sum(), rows),
                    }
                })
            });
            Some(CreativeKpi {
                creative_name: creative.natural_key.clone(),
                impressions: ad.impressions,
                clicks: ad.clicks,
                ctr_pct: percentage(ad.clicks, ad.impressions),
                web: web.flatten(),
            })
        })
        .collect();

    if !bridged {
        tracing::info!("Bridge is empty, creative KPIs limited to ad performance");
    }
    CreativeKpis { rows, bridged }
}

fn by_device(dims: &DimensionSet, web_facts: &WebAnalyticsFacts) -> DeviceKpis {
    let mut totals: BTreeMap<SurrogateKey, DeviceTotals> = BTreeMap::new();
    for row in web_facts.rows_slice() {
        if let Some(k) = row.device_key {
            totals.entry(k).or_default().add(row);
        }
    }

    let rows = totals
        .into_iter()
        .filter_map(|(key, web)| {
            let device = dims.device.get(key)?;
            Some(DeviceKpi {
                device_category: device.natural_key.clone(),
                users: web.users,
                sessions: web.sessions,
                pageviews: web.pageviews,
                mean_session_duration_sec: mean(web.duration_sum, web.rows),
                mean_bounce_rate: mean(web.bounce_rate_sum, web.rows),
                pages_per_session: if web.sessions > 0.0 { web.pageviews / web.sessions } else { 0.0 },
            })
        })
        .collect();
    DeviceKpis(rows)
}

// --- TABLE RENDERING ---

impl Table for KpiSummary {
    fn name(&self) -> &str {
        KPI_SUMMARY
    }

    fn header(&self) -> Vec<&'static str> {
        vec!["metric", "value", "category"]
    }

    fn rows(&self) -> Vec<Vec<String>> {
        let row = |metric: &str, value: String, category: &str| {
            vec![metric.to_string(), value, category.to_string()]
        };
        vec![
            row("Total Impressions", number_cell(self.total_impressions), "Advertising"),
            row("Total Clicks", number_cell(self.total_clicks), "Advertising"),
            row("CTR (%)", ratio_cell(self.ctr_pct, 2), "Advertising"),
            row("Total Sessions", number_cell(self.total_sessions), "Web Analytics"),
            row("Total Users", number_cell(self.total_users), "Web Analytics"),
            row("Total Pageviews", number_cell(self.total_pageviews), "Web Analytics"),
            row(
                "Avg Session Duration (sec)",
                ratio_cell(self.mean_session_duration_sec, 0),
                "Web Analytics",
            ),
            row(
                "Avg Bounce Rate (%)",
                ratio_cell(self.mean_bounce_rate * 100.0, 1),
                "Web Analytics",
            ),
            row(
                "Click to Session Rate (%)",
                ratio_cell(self.click_to_session_pct, 1),
                "Conversion",
            ),
        ]
    }

    fn len(&self) -> usize {
        9
    }
}

impl Table for SiteKpis {
    fn name(&self) -> &str {
        KPI_BY_SITE
    }

    fn header(&self) -> Vec<&'static str> {
        vec!["site_name", "site_category", "impressions", "clicks", "ctr"]
    }

    fn rows(&self) -> Vec<Vec<String>> {
        self.0
            .iter()
            .map(|r| {
                vec![
                    r.site_name.clone(),
                    r.site_category.as_str().to_string(),
                    number_cell(r.impressions),
                    number_cell(r.clicks),
                    ratio_cell(r.ctr_pct, 2),
                ]
            })
            .collect()
    }

    fn len(&self) -> usize {
        self.0.len()
    }
}

impl Table for CreativeKpis {
    fn name(&self) -> &str {
        KPI_BY_CREATIVE
    }

    fn header(&self) -> Vec<&'static str> {
        let mut header = vec!["creative_name", "impressions", "clicks", "ctr"];
        if self.bridged {
            header.extend(["sessions", "users", "bounce_rate", "click_to_session_rate"]);
        }
        header
    }

    fn rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|r| {
                let mut cells = vec![
                    r.creative_name.clone(),
                    number_cell(r.impressions),
                    number_cell(r.clicks),
                    ratio_cell(r.ctr_pct, 2),
                ];
                if self.bridged {
                    match &r.web {
                        Some(web) => cells.extend([
                            number_cell(web.sessions),
                            number_cell(web.users),
                            ratio_cell(web.mean_bounce_rate, 2),
                        ]),
                        None => cells.extend([String::new(), String::new(), String::new()]),
                    }
                    cells.push(ratio_cell(r.click_to_session_pct(), 2));
                }
                cells
            })
            .collect()
    }

    fn len(&self) -> usize {
        self.rows.len()
    }
}

impl Table for DeviceKpis {
    fn name(&self) -> &str {
        KPI_BY_DEVICE
    }

    fn header(&self) -> Vec<&'static str> {
        vec![
            "device_category",
            "users",
            "sessions",
            "pageviews",
            "avg_session_duration_sec",
            "bounce_rate",
            "pages_per_session",
        ]
    }

    fn rows(&self) -> Vec<Vec<String>> {
        self.0
            .iter()
            .map(|r| {
                vec![
                    r.device_category.clone(),
                    number_cell(r.users),
                    number_cell(r.sessions),
                    number_cell(r.pageviews),
                    ratio_cell(r.mean_session_duration_sec, 0),
                    ratio_cell(r.mean_bounce_rate * 100.0, 1),
                    ratio_cell(r.pages_per_session, 2),
                ]
            })
            .collect()
    }

    fn len(&self) -> usize {
        self.0.len()
    }
}
