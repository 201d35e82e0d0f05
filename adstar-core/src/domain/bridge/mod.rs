// adstar-core/src/domain/bridge/mod.rs

//! Bridge between the two creative identifier spaces: ad-server creative names
//! and web-analytics ad_content tags. Many-to-many, every link scored.

pub mod strategies;

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

use crate::domain::dimension::{CreativeAttributes, Dimension};
use crate::domain::error::DomainError;
use crate::domain::table::{SurrogateKey, Table, number_cell};

pub use strategies::{
    BridgeMatcher, CuratedMapping, CuratedTable, ExactMatch, MatchCandidate,
    NormalizedTokenMatch, StrategyKind, SubstringProbe,
};

pub const BRIDGE_TABLE: &str = "bridge_creative_adcontent";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BridgeRow {
    pub creative_key: SurrogateKey,
    pub ad_content_key: SurrogateKey,
    pub confidence_score: f64,
    /// Which matcher produced the link. Not part of the published table.
    #[serde(skip)]
    pub strategy: &'static str,
}

#[derive(Debug, Clone, Default)]
pub struct Bridge {
    rows: Vec<BridgeRow>,
}

/// Runs every matcher and resolves candidates to surrogate keys.
///
/// Candidates naming a creative or ad_content absent from this run are
/// dropped. When several matchers link the same pair, the highest confidence
/// wins, ties going to the matcher listed first.
pub fn resolve_bridge(
    creatives: &Dimension<CreativeAttributes>,
    ad_contents: &Dimension<()>,
    matchers: &[Box<dyn BridgeMatcher>],
) -> Result<Bridge, DomainError> {
    let creative_names: Vec<&str> = creatives.natural_keys().collect();
    let ad_content_names: Vec<&str> = ad_contents.natural_keys().collect();

    let mut best: BTreeMap<(SurrogateKey, SurrogateKey), BridgeRow> = BTreeMap::new();

    for matcher in matchers {
        let candidates = matcher.propose(&creative_names, &ad_content_names);
        let mut kept = 0usize;

        for candidate in candidates {
            if !(0.0..=1.0).contains(&candidate.confidence) {
                return Err(DomainError::InvalidBridgeRule(format!(
                    "{} proposed {} -> {} with confidence {}",
                    matcher.name(),
                    candidate.creative,
                    candidate.ad_content,
                    candidate.confidence
                )));
            }

            let (Some(creative_key), Some(ad_content_key)) = (
                creatives.lookup(&candidate.creative),
                ad_contents.lookup(&candidate.ad_content),
            ) else {
                debug!(
                    strategy = matcher.name(),
                    creative = %candidate.creative,
                    ad_content = %candidate.ad_content,
                    "Bridge candidate dropped, natural key absent from this run"
                );
                continue;
            };

            kept += 1;
            let row = BridgeRow {
                creative_key,
                ad_content_key,
                confidence_score: candidate.confidence,
                strategy: candidate.strategy,
            };
            best.entry((creative_key, ad_content_key))
                .and_modify(|existing| {
                    if row.confidence_score > existing.confidence_score {
                        *existing = row.clone();
                    }
                })
                .or_insert(row);
        }

        debug!(strategy = matcher.name(), links = kept, "Bridge matcher applied");
    }

    let bridge = Bridge {
        rows: best.into_values().collect(),
    };
    if bridge.is_empty() {
        debug!("No cross-system creative mapping available");
    }
    Ok(bridge)
}

impl Bridge {
    pub fn rows_slice(&self) -> &[BridgeRow] {
        &self.rows
    }

    /// (ad_content_key, confidence) pairs linked to a creative.
    pub fn ad_contents_for(&self, creative_key: SurrogateKey) -> Vec<(SurrogateKey, f64)> {
        self.rows
            .iter()
            .filter(|r| r.creative_key == creative_key)
            .map(|r| (r.ad_content_key, r.confidence_score))
            .collect()
    }

    pub fn creatives_for(&self, ad_content_key: SurrogateKey) -> Vec<(SurrogateKey, f64)> {
        self.rows
            .iter()
            .filter(|r| r.ad_content_key == ad_content_key)
            .map(|r| (r.creative_key, r.confidence_score))
            .collect()
    }

    /// Every bridge key must exist on its side.
    pub fn verify(
        &self,
        creatives: &Dimension<CreativeAttributes>,
        ad_contents: &Dimension<()>,
    ) -> Result<(), DomainError> {
        for row in &self.rows {
            if !creatives.contains_key(row.creative_key) {
                return Err(DomainError::DanglingForeignKey {
                    fact: BRIDGE_TABLE.to_string(),
                    column: "creative_key".to_string(),
                    dimension: creatives.spec().table.to_string(),
                    key: row.creative_key.get(),
                });
            }
            if !ad_contents.contains_key(row.ad_content_key) {
                return Err(DomainError::DanglingForeignKey {
                    fact: BRIDGE_TABLE.to_string(),
                    column: "ad_content_key".to_string(),
                    dimension: ad_contents.spec().table.to_string(),
                    key: row.ad_content_key.get(),
                });
            }
        }
        Ok(())
    }
}

impl Table for Bridge {
    fn name(&self) -> &str {
        BRIDGE_TABLE
    }

    fn header(&self) -> Vec<&'static str> {
        vec!["creative_key", "ad_content_key", "confidence_score"]
    }

    fn rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|r| {
                vec![
                    r.creative_key.to_string(),
                    r.ad_content_key.to_string(),
                    number_cell(r.confidence_score),
                ]
            })
            .collect()
    }

    fn len(&self) -> usize {
        self.rows.len()
    }
}

/// Builds the matcher chain in the configured order.
pub fn matchers_from_kinds(
    kinds: &[StrategyKind],
    curated: Vec<CuratedMapping>,
    min_confidence: f64,
    probe_parts: usize,
) -> Result<Vec<Box<dyn BridgeMatcher>>, DomainError> {
    let mut curated = Some(curated);
    let mut matchers: Vec<Box<dyn BridgeMatcher>> = Vec::with_capacity(kinds.len());
    for kind in kinds {
        let matcher: Box<dyn BridgeMatcher> = match kind {
            StrategyKind::Curated => {
                Box::new(CuratedTable::new(curated.take().unwrap_or_default())?)
            }
            StrategyKind::Exact => Box::new(ExactMatch),
            StrategyKind::NormalizedToken => Box::new(NormalizedTokenMatch::new(min_confidence)?),
            StrategyKind::SubstringProbe => Box::new(SubstringProbe::new(probe_parts)),
        };
        matchers.push(matcher);
    }
    Ok(matchers)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::dimension::build_dimension;
    use crate::domain::dimension::classifier::{classify_creative, no_attributes};
    use crate::domain::dimension::set::{DIM_AD_CONTENT, DIM_CREATIVE};
    use crate::domain::warning::WarningCollector;

    fn dims(
        creatives: &[&str],
        ad_contents: &[&str],
    ) -> (Dimension<CreativeAttributes>, Dimension<()>) {
        let sink = WarningCollector::new();
        (
            build_dimension(DIM_CREATIVE, creatives.iter().copied(), classify_creative, &sink),
            build_dimension(DIM_AD_CONTENT, ad_contents.iter().copied(), no_attributes, &sink),
        )
    }

    fn curated() -> Vec<Box<dyn BridgeMatcher>> {
        vec![Box::new(
            CuratedTable::new(CuratedTable::reference_entries()).unwrap(),
        )]
    }

    #[test]
    fn test_curated_resolves_to_keys() {
        let (creative_dim, ad_dim) = dims(
            &["160x600_AR_RFL_FN", "300x250_AR_RFL_FN"],
            &["300x250_AR_FN", "Other"],
        );
        let bridge = resolve_bridge(&creative_dim, &ad_dim, &curated()).unwrap();

        // 160x600 has no ad_content counterpart in this run
        assert_eq!(bridge.len(), 1);
        let creative_key = creative_dim.lookup("300x250_AR_RFL_FN").unwrap();
        let links = bridge.ad_contents_for(creative_key);
        assert_eq!(links, vec![(ad_dim.lookup("300x250_AR_FN").unwrap(), 1.0)]);
        assert!(bridge.verify(&creative_dim, &ad_dim).is_ok());
    }

    #[test]
    fn test_empty_bridge_is_valid() {
        let (creative_dim, ad_dim) = dims(&["a"], &["b"]);
        let bridge = resolve_bridge(&creative_dim, &ad_dim, &curated()).unwrap();
        assert!(bridge.is_empty());
        assert_eq!(bridge.header(), vec!["creative_key", "ad_content_key", "confidence_score"]);
    }

    #[test]
    fn test_highest_confidence_wins_per_pair() {
        let (creative_dim, ad_dim) = dims(&["300x250_AR_RFL_FN"], &["300x250_AR_FN"]);
        let matchers: Vec<Box<dyn BridgeMatcher>> = vec![
            Box::new(SubstringProbe::default()),
            Box::new(NormalizedTokenMatch::new(0.5).unwrap()),
            Box::new(CuratedTable::new(CuratedTable::reference_entries()).unwrap()),
        ];
        let bridge = resolve_bridge(&creative_dim, &ad_dim, &matchers).unwrap();

        assert_eq!(bridge.len(), 1);
        assert_eq!(bridge.rows_slice()[0].confidence_score, 1.0);
        assert_eq!(bridge.rows_slice()[0].strategy, "curated");
    }

    #[test]
    fn test_curated_and_probe_stay_distinct() {
        let (creative_dim, ad_dim) = dims(
            &["160x600_AR_RFL_FN", "300x250_AR_RFL_FN"],
            &["300x250_AR_FN"],
        );
        let matchers = matchers_from_kinds(
            &[StrategyKind::Curated, StrategyKind::SubstringProbe],
            CuratedTable::reference_entries(),
            0.6,
            3,
        )
        .unwrap();
        let bridge = resolve_bridge(&creative_dim, &ad_dim, &matchers).unwrap();

        let strategies: Vec<(&str, f64)> = bridge
            .rows_slice()
            .iter()
            .map(|r| (r.strategy, r.confidence_score))
            .collect();
        // 160x600 only shares "AR" with the tag: a weak probe link
        assert_eq!(strategies, vec![("substring_probe", 0.1667), ("curated", 1.0)]);
    }

    #[test]
    fn test_rows_are_sorted_by_key_pair() {
        let (creative_dim, ad_dim) = dims(&["a", "b"], &["a", "b"]);
        let matchers: Vec<Box<dyn BridgeMatcher>> = vec![Box::new(ExactMatch)];
        let bridge = resolve_bridge(&creative_dim, &ad_dim, &matchers).unwrap();
        assert_eq!(bridge.rows(), vec![vec!["1", "1", "1"], vec!["2", "2", "1"]]);
        assert_eq!(bridge.creatives_for(SurrogateKey::new(2)), vec![(SurrogateKey::new(2), 1.0)]);
    }
}
