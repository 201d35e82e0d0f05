// adstar-core/src/domain/bridge/strategies.rs

//! Matching strategies between creative names (ad server) and ad_content tags
//! (web analytics). Each strategy proposes candidates with its own confidence;
//! resolution to surrogate keys happens in [`super::resolve_bridge`].

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::str::FromStr;
use validator::Validate;

use crate::domain::error::DomainError;

/// Heuristic strategies never claim the certainty of a curated or exact link.
pub const HEURISTIC_CEILING: f64 = 0.99;
/// The substring probe is the weakest signal, its scores stay at or below this.
pub const SUBSTRING_CEILING: f64 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub struct MatchCandidate {
    pub creative: String,
    pub ad_content: String,
    pub confidence: f64,
    pub strategy: &'static str,
}

pub trait BridgeMatcher: Send + Sync {
    fn name(&self) -> &'static str;

    fn propose(&self, creatives: &[&str], ad_contents: &[&str]) -> Vec<MatchCandidate>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Curated,
    Exact,
    NormalizedToken,
    SubstringProbe,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Curated => "curated",
            Self::Exact => "exact",
            Self::NormalizedToken => "normalized_token",
            Self::SubstringProbe => "substring_probe",
        }
    }
}

impl FromStr for StrategyKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "curated" => Ok(Self::Curated),
            "exact" => Ok(Self::Exact),
            "normalized_token" => Ok(Self::NormalizedToken),
            "substring_probe" => Ok(Self::SubstringProbe),
            other => Err(DomainError::UnknownStrategy(other.to_string())),
        }
    }
}

// --- CURATED TABLE ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct CuratedMapping {
    #[validate(length(min = 1))]
    pub creative: String,
    #[validate(length(min = 1))]
    pub ad_content: String,
    #[validate(range(min = 0.0, max = 1.0))]
    #[serde(default = "default_curated_confidence")]
    pub confidence: f64,
}

fn default_curated_confidence() -> f64 {
    1.0
}

impl CuratedMapping {
    pub fn new(creative: &str, ad_content: &str, confidence: f64) -> Self {
        Self {
            creative: creative.to_string(),
            ad_content: ad_content.to_string(),
            confidence,
        }
    }
}

/// Hand-maintained (creative, ad_content, confidence) triples.
#[derive(Debug, Clone, Default)]
pub struct CuratedTable {
    entries: Vec<CuratedMapping>,
}

impl CuratedTable {
    pub fn new(entries: Vec<CuratedMapping>) -> Result<Self, DomainError> {
        for entry in &entries {
            if !(0.0..=1.0).contains(&entry.confidence) {
                return Err(DomainError::InvalidBridgeRule(format!(
                    "curated mapping {} -> {} has confidence {}",
                    entry.creative, entry.ad_content, entry.confidence
                )));
            }
        }
        Ok(Self { entries })
    }

    /// The mappings the marketing team maintains for the AR/FN flight.
    pub fn reference_entries() -> Vec<CuratedMapping> {
        vec![
            CuratedMapping::new("160x600_AR_RFL_FN", "160x600_AR_FN", 1.0),
            CuratedMapping::new("728x90_AR_RFL_FN", "728x90_AR_FN", 1.0),
            CuratedMapping::new("300x250_AR_RFL_FN", "300x250_AR_FN", 1.0),
        ]
    }

    pub fn entries(&self) -> &[CuratedMapping] {
        &self.entries
    }
}

impl BridgeMatcher for CuratedTable {
    fn name(&self) -> &'static str {
        StrategyKind::Curated.as_str()
    }

    // Entries are proposed as-is; the resolver drops the ones whose names
    // are absent from the dimensions of this run.
    fn propose(&self, _creatives: &[&str], _ad_contents: &[&str]) -> Vec<MatchCandidate> {
        self.entries
            .iter()
            .map(|e| MatchCandidate {
                creative: e.creative.clone(),
                ad_content: e.ad_content.clone(),
                confidence: e.confidence,
                strategy: self.name(),
            })
            .collect()
    }
}

// --- EXACT ---

/// Same identifier on both sides.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactMatch;

impl BridgeMatcher for ExactMatch {
    fn name(&self) -> &'static str {
        StrategyKind::Exact.as_str()
    }

    fn propose(&self, creatives: &[&str], ad_contents: &[&str]) -> Vec<MatchCandidate> {
        let ad_set: HashSet<&str> = ad_contents.iter().copied().collect();
        creatives
            .iter()
            .filter(|c| ad_set.contains(*c))
            .map(|c| MatchCandidate {
                creative: c.to_string(),
                ad_content: c.to_string(),
                confidence: 1.0,
                strategy: self.name(),
            })
            .collect()
    }
}

// --- NORMALIZED TOKEN ---

/// Jaccard similarity of the lowercase alphanumeric token sets.
#[derive(Debug, Clone)]
pub struct NormalizedTokenMatch {
    min_confidence: f64,
    separator: Regex,
}

impl NormalizedTokenMatch {
    pub fn new(min_confidence: f64) -> Result<Self, DomainError> {
        if !(0.0..=1.0).contains(&min_confidence) {
            return Err(DomainError::InvalidBridgeRule(format!(
                "normalized_token min confidence {} outside [0, 1]",
                min_confidence
            )));
        }
        let separator = Regex::new(r"[^A-Za-z0-9]+")
            .map_err(|e| DomainError::InvalidBridgeRule(e.to_string()))?;
        Ok(Self {
            min_confidence,
            separator,
        })
    }

    fn tokens(&self, value: &str) -> BTreeSet<String> {
        self.separator
            .split(value)
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase)
            .collect()
    }

    pub fn similarity(&self, left: &str, right: &str) -> f64 {
        let a = self.tokens(left);
        let b = self.tokens(right);
        let union = a.union(&b).count();
        if union == 0 {
            return 0.0;
        }
        a.intersection(&b).count() as f64 / union as f64
    }
}

impl BridgeMatcher for NormalizedTokenMatch {
    fn name(&self) -> &'static str {
        StrategyKind::NormalizedToken.as_str()
    }

    fn propose(&self, creatives: &[&str], ad_contents: &[&str]) -> Vec<MatchCandidate> {
        let mut candidates = Vec::new();
        for creative in creatives {
            for ad_content in ad_contents {
                let score = self.similarity(creative, ad_content);
                if score > 0.0 && score >= self.min_confidence {
                    candidates.push(MatchCandidate {
                        creative: creative.to_string(),
                        ad_content: ad_content.to_string(),
                        confidence: round_score(score.min(HEURISTIC_CEILING)),
                        strategy: self.name(),
                    });
                }
            }
        }
        candidates
    }
}

// --- SUBSTRING PROBE ---

/// The probe used by the staging validation report: any of the first
/// `probe_parts` underscore-separated parts of the creative name found
/// verbatim inside the ad_content tag.
#[derive(Debug, Clone, Copy)]
pub struct SubstringProbe {
    probe_parts: usize,
}

impl SubstringProbe {
    pub fn new(probe_parts: usize) -> Self {
        Self {
            probe_parts: probe_parts.max(1),
        }
    }

    /// Fraction of probed parts found in `ad_content`, `None` when none match.
    pub fn probe(&self, creative: &str, ad_content: &str) -> Option<f64> {
        let parts: Vec<&str> = creative
            .split('_')
            .take(self.probe_parts)
            .filter(|p| !p.is_empty())
            .collect();
        if parts.is_empty() {
            return None;
        }
        let found = parts.iter().filter(|p| ad_content.contains(**p)).count();
        (found > 0).then(|| found as f64 / parts.len() as f64)
    }
}

impl Default for SubstringProbe {
    fn default() -> Self {
        Self::new(3)
    }
}

impl BridgeMatcher for SubstringProbe {
    fn name(&self) -> &'static str {
        StrategyKind::SubstringProbe.as_str()
    }

    fn propose(&self, creatives: &[&str], ad_contents: &[&str]) -> Vec<MatchCandidate> {
        let mut candidates = Vec::new();
        for creative in creatives {
            for ad_content in ad_contents {
                if let Some(ratio) = self.probe(creative, ad_content) {
                    candidates.push(MatchCandidate {
                        creative: creative.to_string(),
                        ad_content: ad_content.to_string(),
                        confidence: round_score(ratio * SUBSTRING_CEILING),
                        strategy: self.name(),
                    });
                }
            }
        }
        candidates
    }
}

fn round_score(score: f64) -> f64 {
    (score * 10_000.0).round() / 10_000.0
}
