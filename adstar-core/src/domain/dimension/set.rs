// adstar-core/src/domain/dimension/set.rs

//! The nine conformed dimensions of the star schema and where each one
//! draws its natural keys from.

use crate::domain::dimension::classifier::{
    classify_creative, classify_placement, classify_site, classify_size, classify_source,
    no_attributes,
};
use crate::domain::dimension::date::DateDimension;
use crate::domain::dimension::{
    CreativeAttributes, Dimension, DimensionSpec, PlacementAttributes, SiteAttributes,
    SizeAttributes, SourceAttributes, build_dimension,
};
use crate::domain::error::DomainError;
use crate::domain::staging::{StagingSet, parse_staging_date};
use crate::domain::table::Table;
use crate::ports::reporter::WarningSink;

pub const DIM_CAMPAIGN: DimensionSpec = DimensionSpec {
    table: "dim_campaign",
    key_column: "campaign_key",
    natural_column: "campaign_name",
};
pub const DIM_SITE: DimensionSpec = DimensionSpec {
    table: "dim_site",
    key_column: "site_key",
    natural_column: "site_name",
};
pub const DIM_CREATIVE: DimensionSpec = DimensionSpec {
    table: "dim_creative",
    key_column: "creative_key",
    natural_column: "creative_name",
};
pub const DIM_PLACEMENT: DimensionSpec = DimensionSpec {
    table: "dim_placement",
    key_column: "placement_key",
    natural_column: "placement_name",
};
pub const DIM_DEVICE: DimensionSpec = DimensionSpec {
    table: "dim_device",
    key_column: "device_key",
    natural_column: "device_category",
};
pub const DIM_SOURCE: DimensionSpec = DimensionSpec {
    table: "dim_source",
    key_column: "source_key",
    natural_column: "source_name",
};
pub const DIM_AD_CONTENT: DimensionSpec = DimensionSpec {
    table: "dim_ad_content",
    key_column: "ad_content_key",
    natural_column: "ad_content_name",
};
pub const DIM_CREATIVE_SIZE: DimensionSpec = DimensionSpec {
    table: "dim_creative_size",
    key_column: "size_key",
    natural_column: "dimensions",
};

#[derive(Debug, Clone)]
pub struct DimensionSet {
    pub date: DateDimension,
    pub campaign: Dimension<()>,
    pub site: Dimension<SiteAttributes>,
    pub creative: Dimension<CreativeAttributes>,
    pub placement: Dimension<PlacementAttributes>,
    pub device: Dimension<()>,
    pub source: Dimension<SourceAttributes>,
    pub ad_content: Dimension<()>,
    pub size: Dimension<SizeAttributes>,
}

// --- PER-DIMENSION BUILDERS ---
// Each reads only the immutable staging set, so they can run concurrently.

/// Dates from both feeds. Unparseable dates are left out (validation reports them).
pub fn build_date_dimension(staging: &StagingSet) -> DateDimension {
    let ad_dates = staging.ad.iter().map(|r| r.date.as_str());
    let web_dates = staging.web.iter().map(|r| r.date.as_str());
    DateDimension::build(ad_dates.chain(web_dates).filter_map(parse_staging_date))
}

pub fn build_campaign_dimension(staging: &StagingSet, warnings: &dyn WarningSink) -> Dimension<()> {
    let ad = staging.ad.iter().map(|r| r.campaign.as_str());
    let web = staging.web.iter().map(|r| r.campaign.as_str());
    build_dimension(DIM_CAMPAIGN, ad.chain(web), no_attributes, warnings)
}

pub fn build_site_dimension(
    staging: &StagingSet,
    warnings: &dyn WarningSink,
) -> Dimension<SiteAttributes> {
    let keys = staging.ad.iter().map(|r| r.site.as_str());
    build_dimension(DIM_SITE, keys, classify_site, warnings)
}

pub fn build_creative_dimension(
    staging: &StagingSet,
    warnings: &dyn WarningSink,
) -> Dimension<CreativeAttributes> {
    let keys = staging.ad.iter().map(|r| r.creative.as_str());
    build_dimension(DIM_CREATIVE, keys, classify_creative, warnings)
}

pub fn build_placement_dimension(
    staging: &StagingSet,
    warnings: &dyn WarningSink,
) -> Dimension<PlacementAttributes> {
    let keys = staging.ad.iter().map(|r| r.placement.as_str());
    build_dimension(DIM_PLACEMENT, keys, classify_placement, warnings)
}

pub fn build_size_dimension(
    staging: &StagingSet,
    warnings: &dyn WarningSink,
) -> Dimension<SizeAttributes> {
    let keys = staging.ad.iter().map(|r| r.size.as_str());
    build_dimension(DIM_CREATIVE_SIZE, keys, classify_size, warnings)
}

pub fn build_device_dimension(staging: &StagingSet, warnings: &dyn WarningSink) -> Dimension<()> {
    let keys = staging.web.iter().map(|r| r.device.as_str());
    build_dimension(DIM_DEVICE, keys, no_attributes, warnings)
}

pub fn build_source_dimension(
    staging: &StagingSet,
    warnings: &dyn WarningSink,
) -> Dimension<SourceAttributes> {
    let keys = staging.web.iter().map(|r| r.source.as_str());
    build_dimension(DIM_SOURCE, keys, classify_source, warnings)
}

pub fn build_ad_content_dimension(
    staging: &StagingSet,
    warnings: &dyn WarningSink,
) -> Dimension<()> {
    let keys = staging.web.iter().map(|r| r.ad_content.as_str());
    build_dimension(DIM_AD_CONTENT, keys, no_attributes, warnings)
}

impl DimensionSet {
    /// Sequential build of every dimension.
    pub fn build(staging: &StagingSet, warnings: &dyn WarningSink) -> Self {
        Self {
            date: build_date_dimension(staging),
            campaign: build_campaign_dimension(staging, warnings),
            site: build_site_dimension(staging, warnings),
            creative: build_creative_dimension(staging, warnings),
            placement: build_placement_dimension(staging, warnings),
            device: build_device_dimension(staging, warnings),
            source: build_source_dimension(staging, warnings),
            ad_content: build_ad_content_dimension(staging, warnings),
            size: build_size_dimension(staging, warnings),
        }
    }

    /// Checks key uniqueness and contiguity of every dimension.
    pub fn verify(&self) -> Result<(), DomainError> {
        self.date.verify_keys()?;
        self.campaign.verify_keys()?;
        self.site.verify_keys()?;
        self.creative.verify_keys()?;
        self.placement.verify_keys()?;
        self.device.verify_keys()?;
        self.source.verify_keys()?;
        self.ad_content.verify_keys()?;
        self.size.verify_keys()?;
        Ok(())
    }

    pub fn tables(&self) -> Vec<&dyn Table> {
        let tables: [&dyn Table; 9] = [
            &self.date,
            &self.campaign,
            &self.site,
            &self.creative,
            &self.placement,
            &self.device,
            &self.source,
            &self.ad_content,
            &self.size,
        ];
        tables.to_vec()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::staging::{AdStagingRow, WebStagingRow};
    use crate::domain::table::SurrogateKey;
    use crate::domain::warning::WarningCollector;

    fn ad(date: &str, campaign: &str, site: &str, size: &str) -> AdStagingRow {
        AdStagingRow {
            date: date.into(),
            campaign: campaign.into(),
            site: site.into(),
            placement: "AR_ROS_Top".into(),
            creative: "300x250_AR_RFL_FN".into(),
            size: size.into(),
            impressions: "10".into(),
            clicks: "1".into(),
        }
    }

    fn web(date: &str, campaign: &str) -> WebStagingRow {
        WebStagingRow {
            date: date.into(),
            campaign: campaign.into(),
            source: "google".into(),
            device: "mobile".into(),
            ad_content: "300x250_AR_FN".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_conformed_dimensions_pull_from_both_feeds() {
        let staging = StagingSet::new(
            vec![ad("2024-02-01", "Brand", "news.com", "300x250")],
            vec![web("2024-01-01", "GA_Campaign_google")],
        );
        let dims = DimensionSet::build(&staging, &WarningCollector::new());

        assert_eq!(dims.date.len(), 2);
        assert_eq!(
            dims.campaign.natural_keys().collect::<Vec<_>>(),
            vec!["Brand", "GA_Campaign_google"]
        );
        // site/size pull from ad staging only, device from web staging only
        assert_eq!(dims.site.len(), 1);
        assert_eq!(dims.device.len(), 1);
        assert!(dims.verify().is_ok());
    }

    #[test]
    fn test_size_dimension_tolerates_unknown() {
        let staging = StagingSet::new(
            vec![
                ad("2024-01-01", "c", "s", "Unknown"),
                ad("2024-01-01", "c", "s", "300x250"),
            ],
            vec![],
        );
        let sink = WarningCollector::new();
        let dims = DimensionSet::build(&staging, &sink);

        let unknown_key = dims.size.lookup("Unknown").unwrap();
        assert_eq!(unknown_key, SurrogateKey::new(2));
        let row = dims.size.get(unknown_key).unwrap();
        assert_eq!((row.attributes.width, row.attributes.height), (0, 0));
        assert_eq!(sink.summary().by_kind.get("malformed_size_token"), Some(&1));
    }

    #[test]
    fn test_table_order_and_names() {
        let dims = DimensionSet::build(&StagingSet::default(), &WarningCollector::new());
        let names: Vec<&str> = dims.tables().iter().map(|t| t.name()).collect();
        assert_eq!(
            names,
            vec![
                "dim_date",
                "dim_campaign",
                "dim_site",
                "dim_creative",
                "dim_placement",
                "dim_device",
                "dim_source",
                "dim_ad_content",
                "dim_creative_size",
            ]
        );
    }
}
