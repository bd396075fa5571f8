//! Common Types
//!
//! Shared data structures used across the lure pipeline. Everything here is
//! request-scoped: built fresh per call and dropped once the caller has the
//! result.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ==================== Pool Types ====================

/// Taxon attached to an observation
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Taxon {
    pub id: String,
    /// Ancestor chain, root to parent
    #[serde(default)]
    pub ancestor_ids: Vec<String>,
    /// Top-level grouping (birds, insects, ...)
    #[serde(default)]
    pub iconic_taxon_id: Option<String>,
}

/// A single observation record from the upstream pool
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub id: String,
    pub taxon: Taxon,
}

impl Observation {
    /// Taxon id of this observation, `None` when blank
    pub fn taxon_id(&self) -> Option<&str> {
        let id = self.taxon.id.trim();
        (!id.is_empty()).then_some(id)
    }
}

/// Raw confusion-map entry as produced upstream.
///
/// Identifiers arrive loosely typed (numbers or strings) and scores may be
/// missing or garbage; `candidates` normalizes them.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfusionEntry {
    #[serde(alias = "taxon_id")]
    pub taxon_id: serde_json::Value,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub closeness: Option<f64>,
    #[serde(default)]
    pub observation: Option<Observation>,
}

/// Read-only observation pool, owned by the caller
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationPool {
    pub by_taxon: HashMap<String, Vec<Observation>>,
    pub taxon_list: Vec<String>,
    #[serde(default)]
    pub confusion_map: Option<HashMap<String, Vec<ConfusionEntry>>>,
}

impl ObservationPool {
    /// Observations filed under a taxon. Keys padded with whitespace still
    /// match; an exact key wins over a padded one.
    pub fn observations_for(&self, taxon_id: &str) -> Option<&[Observation]> {
        let taxon_id = taxon_id.trim();
        if taxon_id.is_empty() {
            return None;
        }
        self.by_taxon
            .get(taxon_id)
            .or_else(|| {
                self.by_taxon
                    .iter()
                    .find(|(key, _)| key.trim() == taxon_id)
                    .map(|(_, list)| list)
            })
            .map(Vec::as_slice)
    }

    /// First observation of a taxon, used as its representative
    pub fn representative(&self, taxon_id: &str) -> Option<&Observation> {
        self.observations_for(taxon_id).and_then(|list| list.first())
    }

    /// Confusion entries for a target, `None` when absent or empty
    pub fn confusion_for(&self, taxon_id: &str) -> Option<&[ConfusionEntry]> {
        self.confusion_map
            .as_ref()
            .and_then(|map| map.get(taxon_id))
            .filter(|entries| !entries.is_empty())
            .map(Vec::as_slice)
    }
}

// ==================== Candidate Types ====================

/// Provenance of a candidate
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CandidateSource {
    #[serde(rename = "confusion-map")]
    ConfusionMap,
    #[serde(rename = "lca-fallback")]
    LcaFallback,
    #[serde(rename = "lca+cross-iconic")]
    LcaCrossIconic,
}

impl CandidateSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateSource::ConfusionMap => "confusion-map",
            CandidateSource::LcaFallback => "lca-fallback",
            CandidateSource::LcaCrossIconic => "lca+cross-iconic",
        }
    }

    pub fn is_cross_iconic(&self) -> bool {
        matches!(self, CandidateSource::LcaCrossIconic)
    }
}

/// Which path built the candidate index
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexSource {
    #[serde(rename = "confusion-map")]
    ConfusionMap,
    #[serde(rename = "lca-fallback")]
    LcaFallback,
}

impl IndexSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexSource::ConfusionMap => "confusion-map",
            IndexSource::LcaFallback => "lca-fallback",
        }
    }
}

/// Scored decoy candidate
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub taxon_id: String,
    /// Ranking weight, closeness adjusted by heuristics
    pub score: f64,
    /// Similarity to the target in [0, 1]
    pub closeness: f64,
    pub source: CandidateSource,
    #[serde(default)]
    pub observation: Option<Observation>,
}

/// Closeness tier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    Close,
    Mid,
    Far,
}

impl Bucket {
    /// Draw order when this bucket is the primary one: itself first, then
    /// its neighbours with closer buckets preferred as filler
    pub fn fill_order(&self) -> [Bucket; 3] {
        match self {
            Bucket::Close => [Bucket::Close, Bucket::Mid, Bucket::Far],
            Bucket::Mid => [Bucket::Mid, Bucket::Close, Bucket::Far],
            Bucket::Far => [Bucket::Far, Bucket::Mid, Bucket::Close],
        }
    }
}

/// Quiz game mode
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    Easy,
    Riddle,
}

impl GameMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Some(GameMode::Easy),
            "riddle" => Some(GameMode::Riddle),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Easy => "easy",
            GameMode::Riddle => "riddle",
        }
    }
}

// ==================== Result Types ====================

/// Resolved decoy, ready for the question builder
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LureResult {
    pub taxon_id: String,
    pub observation: Observation,
    pub score: f64,
    pub closeness: f64,
    pub source: CandidateSource,
}

/// Caller-owned usage counter biasing sampling away from recent decoys.
///
/// The engine only reads it; `record` is for the caller once a question has
/// actually been served.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LureUsageCounter(HashMap<String, u32>);

impl LureUsageCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, taxon_id: &str) -> u32 {
        self.0.get(taxon_id).copied().unwrap_or(0)
    }

    pub fn set(&mut self, taxon_id: impl Into<String>, count: u32) {
        self.0.insert(taxon_id.into(), count);
    }

    pub fn record(&mut self, lures: &[LureResult]) {
        for lure in lures {
            let slot = self.0.entry(lure.taxon_id.clone()).or_insert(0);
            *slot = slot.saturating_add(1);
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, u32)> for LureUsageCounter {
    fn from_iter<I: IntoIterator<Item = (String, u32)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
