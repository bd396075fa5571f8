//! Candidate index
//!
//! Ranks every plausible decoy for a target. Precomputed confusion data wins
//! when the pool has any for the target; otherwise closeness is estimated
//! from the depth of the lowest common ancestor.
//!
//! Output is fully deterministic for a given pool and target.

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::LureEngineConfig;
use crate::sanitize::{coerce_taxon_id, non_negative, unit_interval};
use crate::types::{
    Candidate, CandidateSource, ConfusionEntry, IndexSource, Observation, ObservationPool,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateIndex {
    pub source: IndexSource,
    pub candidates: Vec<Candidate>,
}

impl CandidateIndex {
    pub fn build(
        pool: &ObservationPool,
        target_taxon_id: &str,
        target: &Observation,
        config: &LureEngineConfig,
    ) -> Self {
        if let Some(entries) = pool.confusion_for(target_taxon_id) {
            let candidates = from_confusion_map(entries, target_taxon_id, config.max_candidates);
            if !candidates.is_empty() {
                debug!(
                    target = %target_taxon_id,
                    count = candidates.len(),
                    "Candidate index built from confusion map"
                );
                return Self {
                    source: IndexSource::ConfusionMap,
                    candidates,
                };
            }
            warn!(
                target = %target_taxon_id,
                "Confusion map entry held no usable candidates, using LCA fallback"
            );
        }

        let candidates = from_lca(pool, target_taxon_id, target, config);
        debug!(
            target = %target_taxon_id,
            count = candidates.len(),
            "Candidate index built from LCA fallback"
        );
        Self {
            source: IndexSource::LcaFallback,
            candidates,
        }
    }
}

fn from_confusion_map(
    entries: &[ConfusionEntry],
    target_taxon_id: &str,
    max_candidates: usize,
) -> Vec<Candidate> {
    let mut seen = HashSet::new();
    let mut candidates = Vec::with_capacity(entries.len());

    for entry in entries {
        let Some(taxon_id) = coerce_taxon_id(&entry.taxon_id) else {
            continue;
        };
        if taxon_id == target_taxon_id || !seen.insert(taxon_id.clone()) {
            continue;
        }

        let score = entry.score.map(non_negative);
        let closeness = entry.closeness.map(unit_interval);
        let (score, closeness) = match (score, closeness) {
            (Some(s), Some(c)) => (s, c),
            (Some(s), None) => (s, unit_interval(s)),
            (None, Some(c)) => (c, c),
            (None, None) => (0.0, 0.0),
        };

        candidates.push(Candidate {
            taxon_id,
            score,
            closeness,
            source: CandidateSource::ConfusionMap,
            observation: entry.observation.clone(),
        });
    }

    rank(&mut candidates, max_candidates);
    candidates
}

fn from_lca(
    pool: &ObservationPool,
    target_taxon_id: &str,
    target: &Observation,
    config: &LureEngineConfig,
) -> Vec<Candidate> {
    let target_chain = &target.taxon.ancestor_ids;
    let target_iconic = target.taxon.iconic_taxon_id.as_deref();
    let depth = target_chain.len();
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    let target_taxon_id = target_taxon_id.trim();
    for taxon_id in pool.taxon_list.iter().map(|id| id.trim()) {
        if taxon_id.is_empty() || taxon_id == target_taxon_id || !seen.insert(taxon_id) {
            continue;
        }
        let Some(representative) = pool.representative(taxon_id) else {
            warn!(taxon = %taxon_id, "Taxon listed in pool without observations, skipping");
            continue;
        };

        let shared = shared_ancestor_depth(target_chain, &representative.taxon.ancestor_ids);
        let closeness = if depth == 0 {
            0.0
        } else {
            unit_interval(shared as f64 / depth as f64)
        };

        let cross_iconic = match (target_iconic, representative.taxon.iconic_taxon_id.as_deref()) {
            (Some(a), Some(b)) => a != b,
            _ => false,
        };
        let (score, source) = if cross_iconic {
            (
                non_negative(closeness - config.cross_iconic_penalty),
                CandidateSource::LcaCrossIconic,
            )
        } else {
            (closeness, CandidateSource::LcaFallback)
        };

        candidates.push(Candidate {
            taxon_id: taxon_id.to_string(),
            score,
            closeness,
            source,
            observation: None,
        });
    }

    rank(&mut candidates, config.max_candidates);
    candidates
}

/// Length of the common prefix of two root-to-parent ancestor chains
pub fn shared_ancestor_depth(a: &[String], b: &[String]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

/// Score descending, taxon id ascending on ties, then cap
fn rank(candidates: &mut Vec<Candidate>, max_candidates: usize) {
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.taxon_id.cmp(&b.taxon_id))
    });
    candidates.truncate(max_candidates);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Taxon;
    use serde_json::json;
    use std::collections::HashMap;

    fn obs(taxon_id: &str, ancestors: &[&str], iconic: &str) -> Observation {
        Observation {
            id: format!("obs-{taxon_id}"),
            taxon: Taxon {
                id: taxon_id.to_string(),
                ancestor_ids: ancestors.iter().map(|s| s.to_string()).collect(),
                iconic_taxon_id: Some(iconic.to_string()),
            },
        }
    }

    fn pool_of(observations: Vec<Observation>) -> ObservationPool {
        let mut by_taxon = HashMap::new();
        let mut taxon_list = Vec::new();
        for o in observations {
            taxon_list.push(o.taxon.id.clone());
            by_taxon.insert(o.taxon.id.clone(), vec![o]);
        }
        ObservationPool {
            by_taxon,
            taxon_list,
            confusion_map: None,
        }
    }

    #[test]
    fn test_lca_closeness_by_shared_depth() {
        let target = obs("t", &["a", "b", "c", "d"], "birds");
        let pool = pool_of(vec![
            target.clone(),
            obs("near", &["a", "b", "c", "x"], "birds"),
            obs("far", &["a", "y"], "birds"),
        ]);
        let index = CandidateIndex::build(&pool, "t", &target, &LureEngineConfig::default());

        assert_eq!(index.source, IndexSource::LcaFallback);
        assert_eq!(index.candidates.len(), 2);
        assert_eq!(index.candidates[0].taxon_id, "near");
        assert!((index.candidates[0].closeness - 0.75).abs() < 1e-9);
        assert!((index.candidates[1].closeness - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_cross_iconic_penalizes_score_only() {
        let target = obs("t", &["a", "b"], "birds");
        let pool = pool_of(vec![obs("bug", &["a", "b"], "insects")]);
        let config = LureEngineConfig::default();
        let index = CandidateIndex::build(&pool, "t", &target, &config);

        let bug = &index.candidates[0];
        assert_eq!(bug.source, CandidateSource::LcaCrossIconic);
        assert!((bug.closeness - 1.0).abs() < 1e-9);
        assert!((bug.score - (1.0 - config.cross_iconic_penalty)).abs() < 1e-9);
    }

    #[test]
    fn test_confusion_map_normalizes_entries() {
        let target = obs("100", &["a"], "birds");
        let mut map = HashMap::new();
        map.insert(
            "100".to_string(),
            vec![
                ConfusionEntry { taxon_id: json!(200), score: Some(0.4), closeness: Some(0.5), observation: None },
                ConfusionEntry { taxon_id: json!("300"), score: Some(0.9), closeness: Some(1.4), observation: None },
                ConfusionEntry { taxon_id: json!(100), score: Some(1.0), closeness: Some(1.0), observation: None },
                ConfusionEntry { taxon_id: json!(null), score: Some(1.0), closeness: None, observation: None },
                ConfusionEntry { taxon_id: json!("400"), score: Some(-2.0), closeness: Some(f64::NAN), observation: None },
            ],
        );
        let pool = ObservationPool {
            confusion_map: Some(map),
            ..Default::default()
        };
        let index = CandidateIndex::build(&pool, "100", &target, &LureEngineConfig::default());

        assert_eq!(index.source, IndexSource::ConfusionMap);
        let ids: Vec<_> = index.candidates.iter().map(|c| c.taxon_id.as_str()).collect();
        assert_eq!(ids, vec!["300", "200", "400"]);
        assert_eq!(index.candidates[0].closeness, 1.0);
        assert_eq!(index.candidates[2].score, 0.0);
        assert_eq!(index.candidates[2].closeness, 0.0);
    }

    #[test]
    fn test_capped_at_max_candidates() {
        let target = obs("t", &["a", "b"], "birds");
        let others: Vec<_> = (0..60).map(|i| obs(&format!("s{i:02}"), &["a"], "birds")).collect();
        let pool = pool_of(others);
        let index = CandidateIndex::build(&pool, "t", &target, &LureEngineConfig::default());
        assert_eq!(index.candidates.len(), 36);
    }

    #[test]
    fn test_missing_observations_are_skipped() {
        let target = obs("t", &["a"], "birds");
        let mut pool = pool_of(vec![obs("ok", &["a"], "birds")]);
        pool.taxon_list.push("ghost".to_string());
        let index = CandidateIndex::build(&pool, "t", &target, &LureEngineConfig::default());
        assert_eq!(index.candidates.len(), 1);
        assert_eq!(index.candidates[0].taxon_id, "ok");
    }

    #[test]
    fn test_lca_ids_are_trimmed() {
        let target = obs("t", &["a", "b"], "birds");
        let pool = pool_of(vec![
            obs("near ", &["a", "b"], "birds"),
            obs(" far", &["a"], "birds"),
            obs(" t ", &["a", "b"], "birds"),
            obs("   ", &["a", "b"], "birds"),
        ]);
        let index = CandidateIndex::build(&pool, "t", &target, &LureEngineConfig::default());

        let ids: Vec<_> = index.candidates.iter().map(|c| c.taxon_id.as_str()).collect();
        assert_eq!(ids, vec!["near", "far"]);
    }

    #[test]
    fn test_shared_ancestor_depth() {
        let a: Vec<String> = ["1", "2", "3"].iter().map(|s| s.to_string()).collect();
        let b: Vec<String> = ["1", "2", "9", "3"].iter().map(|s| s.to_string()).collect();
        assert_eq!(shared_ancestor_depth(&a, &b), 2);
        assert_eq!(shared_ancestor_depth(&a, &[]), 0);
    }
}
