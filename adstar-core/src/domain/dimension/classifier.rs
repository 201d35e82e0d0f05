// adstar-core/src/domain/dimension/classifier.rs

//! Rule cascades deriving secondary attributes from a natural key.
//! Rules are checked in a fixed priority order; the first match wins.

use serde::Serialize;

use crate::domain::dimension::Attributes;
use crate::domain::warning::DataQualityWarning;
use crate::ports::reporter::WarningSink;

const DEFAULT_CREATIVE_VERSION: &str = "v1.0";
const VERSION_TOKEN: &str = "_v";
const SIZE_SEPARATOR: char = 'x';

// --- SITE ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SiteCategory {
    News,
    Sports,
    Gaming,
    General,
}

impl SiteCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::News => "News",
            Self::Sports => "Sports",
            Self::Gaming => "Gaming",
            Self::General => "General",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SiteAttributes {
    pub category: SiteCategory,
}

impl Attributes for SiteAttributes {
    const COLUMNS: &'static [&'static str] = &["site_category"];
    fn cells(&self) -> Vec<String> {
        vec![self.category.as_str().to_string()]
    }
}

pub fn classify_site(site: &str, _warnings: &dyn WarningSink) -> SiteAttributes {
    let lower = site.to_lowercase();
    let category = if lower.contains("news") || lower.contains("akhbar") {
        SiteCategory::News
    } else if lower.contains("sport") {
        SiteCategory::Sports
    } else if lower.contains("game") {
        SiteCategory::Gaming
    } else {
        SiteCategory::General
    };
    SiteAttributes { category }
}

// --- CREATIVE ---

#[derive(Debug, Clone, PartialEq)]
pub struct CreativeAttributes {
    pub version: String,
}

impl Attributes for CreativeAttributes {
    const COLUMNS: &'static [&'static str] = &["creative_version"];
    fn cells(&self) -> Vec<String> {
        vec![self.version.clone()]
    }
}

pub fn classify_creative(creative: &str, _warnings: &dyn WarningSink) -> CreativeAttributes {
    let version = match creative.rsplit_once(VERSION_TOKEN) {
        Some((_, suffix)) => format!("v{}", suffix),
        None => DEFAULT_CREATIVE_VERSION.to_string(),
    };
    CreativeAttributes { version }
}

// --- PLACEMENT ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlacementType {
    Homepage,
    RunOfSite,
    Other,
}

impl PlacementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Homepage => "Homepage",
            Self::RunOfSite => "Run of Site",
            Self::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacementAttributes {
    pub placement_type: PlacementType,
}

impl Attributes for PlacementAttributes {
    const COLUMNS: &'static [&'static str] = &["placement_type"];
    fn cells(&self) -> Vec<String> {
        vec![self.placement_type.as_str().to_string()]
    }
}

pub fn classify_placement(placement: &str, _warnings: &dyn WarningSink) -> PlacementAttributes {
    let placement_type =
        if placement.contains("_HP_") || placement.to_lowercase().contains("homepage") {
            PlacementType::Homepage
        } else if placement.contains("_ROS_") {
            PlacementType::RunOfSite
        } else {
            PlacementType::Other
        };
    PlacementAttributes { placement_type }
}

// --- SIZE ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SizeAttributes {
    pub width: u32,
    pub height: u32,
}

impl Attributes for SizeAttributes {
    const COLUMNS: &'static [&'static str] = &["width", "height"];
    fn cells(&self) -> Vec<String> {
        vec![self.width.to_string(), self.height.to_string()]
    }
}

/// `WxH` token. Anything else degrades to 0x0 with a data-quality warning.
pub fn classify_size(token: &str, warnings: &dyn WarningSink) -> SizeAttributes {
    match parse_size_token(token) {
        Some((width, height)) => SizeAttributes { width, height },
        None => {
            warnings.record(
                DataQualityWarning::MalformedSizeToken {
                    token: token.to_string(),
                }
                .into(),
            );
            SizeAttributes::default()
        }
    }
}

fn parse_size_token(token: &str) -> Option<(u32, u32)> {
    let (width, height) = token.trim().split_once(SIZE_SEPARATOR)?;
    Some((width.trim().parse().ok()?, height.trim().parse().ok()?))
}

// --- SOURCE ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SourceType {
    Search,
    Social,
    Direct,
    Other,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Search => "Search",
            Self::Social => "Social",
            Self::Direct => "Direct",
            Self::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceAttributes {
    pub source_type: SourceType,
}

impl Attributes for SourceAttributes {
    const COLUMNS: &'static [&'static str] = &["source_type"];
    fn cells(&self) -> Vec<String> {
        vec![self.source_type.as_str().to_string()]
    }
}

pub fn classify_source(source: &str, _warnings: &dyn WarningSink) -> SourceAttributes {
    let source_type = match source.trim().to_lowercase().as_str() {
        "google" | "bing" | "yahoo" => SourceType::Search,
        "facebook" | "twitter" | "linkedin" => SourceType::Social,
        "(direct)" => SourceType::Direct,
        _ => SourceType::Other,
    };
    SourceAttributes { source_type }
}

/// Dimensions without derived columns (campaign, device, ad_content).
pub fn no_attributes(_natural_key: &str, _warnings: &dyn WarningSink) {}
