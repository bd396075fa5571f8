//! Lure selector
//!
//! Picks `lure_count` decoys from a ranked candidate list:
//!
//! 1. Walk the relaxation ladder until some level admits enough candidates
//!    (only level 0 when the caller demands strict minimum closeness).
//! 2. At that level, fill the policy composition bucket by bucket, falling
//!    back to neighbouring buckets when one runs dry, then top up from the
//!    whole eligible set.
//! 3. If no level admits enough, return the top candidates by raw score.
//!
//! Every draw is weighted by `max(score, ε) / (usage + 1)` so recently used
//! decoys fade without ever becoming unselectable. Never panics and never
//! errors: a short `selected` list is how insufficiency is reported.

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{LureEngineConfig, RelaxStep};
use crate::policy::DifficultyPolicy;
use crate::rng::RandomSource;
use crate::sanitize::non_negative;
use crate::types::{Bucket, Candidate, LureUsageCounter};

#[derive(Debug, Clone, Copy, Default)]
pub struct SelectOptions<'a> {
    pub exclude_taxon_ids: Option<&'a HashSet<String>>,
    pub lure_usage: Option<&'a LureUsageCounter>,
    pub strict_min_closeness: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionOutcome {
    pub selected: Vec<Candidate>,
    /// Ladder index that produced the selection. The top-score fallback
    /// reports `ladder.len()`, or 0 in strict mode where only level 0 runs
    pub relax_level: usize,
    pub used_fallback: bool,
}

/// Constraints in force at one ladder level
#[derive(Debug, Clone, Copy, PartialEq)]
struct LevelView {
    min_closeness: f64,
    close_threshold: f64,
    mid_threshold: f64,
    allow_cross_iconic: bool,
}

impl LevelView {
    fn new(policy: &DifficultyPolicy, step: &RelaxStep) -> Self {
        let close_threshold = (policy.close_threshold - step.threshold_delta).max(0.0);
        Self {
            min_closeness: (policy.min_closeness - step.min_closeness_delta).max(0.0),
            close_threshold,
            mid_threshold: (policy.mid_threshold - step.threshold_delta)
                .max(0.0)
                .min(close_threshold),
            allow_cross_iconic: step.allow_cross_iconic,
        }
    }

    fn admits(&self, candidate: &Candidate) -> bool {
        candidate.closeness >= self.min_closeness
            && (self.allow_cross_iconic || !candidate.source.is_cross_iconic())
    }

    fn classify(&self, closeness: f64) -> Bucket {
        if closeness >= self.close_threshold {
            Bucket::Close
        } else if closeness >= self.mid_threshold {
            Bucket::Mid
        } else {
            Bucket::Far
        }
    }
}

pub struct Selector<'c> {
    config: &'c LureEngineConfig,
}

impl<'c> Selector<'c> {
    pub fn new(config: &'c LureEngineConfig) -> Self {
        Self { config }
    }

    pub fn select<R: RandomSource + ?Sized>(
        &self,
        candidates: &[Candidate],
        lure_count: usize,
        policy: &DifficultyPolicy,
        options: &SelectOptions<'_>,
        rng: &mut R,
    ) -> SelectionOutcome {
        if lure_count == 0 {
            return SelectionOutcome {
                selected: Vec::new(),
                relax_level: 0,
                used_fallback: false,
            };
        }

        let mut seen = HashSet::new();
        let base: Vec<&Candidate> = candidates
            .iter()
            .filter(|c| !c.taxon_id.is_empty())
            .filter(|c| {
                options
                    .exclude_taxon_ids
                    .map_or(true, |excluded| !excluded.contains(&c.taxon_id))
            })
            .filter(|c| seen.insert(c.taxon_id.as_str()))
            .collect();

        let ladder = if options.strict_min_closeness {
            &self.config.relaxation[..self.config.relaxation.len().min(1)]
        } else {
            &self.config.relaxation[..]
        };

        for (level, step) in ladder.iter().enumerate() {
            let view = LevelView::new(policy, step);
            let eligible: Vec<&Candidate> =
                base.iter().copied().filter(|c| view.admits(c)).collect();

            if eligible.len() < lure_count {
                debug!(
                    level,
                    eligible = eligible.len(),
                    needed = lure_count,
                    min_closeness = view.min_closeness,
                    "Not enough candidates at relaxation level"
                );
                continue;
            }

            let selected =
                self.pick(&eligible, lure_count, policy, &view, options.lure_usage, rng);
            if level > 0 {
                info!(level, min_closeness = view.min_closeness, "Lure selection relaxed");
            }
            return SelectionOutcome {
                selected,
                relax_level: level,
                used_fallback: false,
            };
        }

        let strict_min = options
            .strict_min_closeness
            .then_some(policy.min_closeness);
        let selected = top_by_score(&base, lure_count, strict_min);
        // strict mode never leaves level 0
        let relax_level = if options.strict_min_closeness {
            0
        } else {
            self.config.relaxation.len()
        };
        info!(
            selected = selected.len(),
            needed = lure_count,
            strict = options.strict_min_closeness,
            relax_level,
            "Relaxation ladder exhausted, using top-score fallback"
        );
        SelectionOutcome {
            selected,
            relax_level,
            used_fallback: true,
        }
    }

    fn pick<R: RandomSource + ?Sized>(
        &self,
        eligible: &[&Candidate],
        lure_count: usize,
        policy: &DifficultyPolicy,
        view: &LevelView,
        usage: Option<&LureUsageCounter>,
        rng: &mut R,
    ) -> Vec<Candidate> {
        let mut picked: Vec<Candidate> = Vec::with_capacity(lure_count);
        let mut picked_ids: HashSet<&str> = HashSet::new();

        'composition: for slot in &policy.composition {
            for _ in 0..slot.count {
                if picked.len() >= lure_count {
                    break 'composition;
                }
                let choice = slot.bucket.fill_order().into_iter().find_map(|bucket| {
                    let pool: Vec<&Candidate> = eligible
                        .iter()
                        .copied()
                        .filter(|c| !picked_ids.contains(c.taxon_id.as_str()))
                        .filter(|c| view.classify(c.closeness) == bucket)
                        .collect();
                    self.draw(&pool, usage, &mut *rng)
                });
                match choice {
                    Some(candidate) => {
                        picked_ids.insert(candidate.taxon_id.as_str());
                        picked.push(candidate.clone());
                    }
                    None => break 'composition,
                }
            }
        }

        while picked.len() < lure_count {
            let pool: Vec<&Candidate> = eligible
                .iter()
                .copied()
                .filter(|c| !picked_ids.contains(c.taxon_id.as_str()))
                .collect();
            let Some(candidate) = self.draw(&pool, usage, &mut *rng) else {
                break;
            };
            picked_ids.insert(candidate.taxon_id.as_str());
            picked.push(candidate.clone());
        }

        picked
    }

    /// One cumulative-weight draw
    fn draw<'a, R: RandomSource + ?Sized>(
        &self,
        pool: &[&'a Candidate],
        usage: Option<&LureUsageCounter>,
        rng: &mut R,
    ) -> Option<&'a Candidate> {
        if pool.is_empty() {
            return None;
        }

        let weights: Vec<f64> = pool.iter().map(|c| self.weight(c, usage)).collect();
        let total: f64 = weights.iter().sum();
        let target = rng.next_unit() * total;

        let mut cumulative = 0.0;
        for (candidate, weight) in pool.iter().zip(&weights) {
            cumulative += weight;
            if target < cumulative {
                return Some(*candidate);
            }
        }
        pool.last().copied()
    }

    pub fn weight(&self, candidate: &Candidate, usage: Option<&LureUsageCounter>) -> f64 {
        let used = usage.map_or(0, |u| u.count(&candidate.taxon_id));
        non_negative(candidate.score).max(self.config.weight_floor) / (f64::from(used) + 1.0)
    }
}

fn top_by_score(base: &[&Candidate], lure_count: usize, min_closeness: Option<f64>) -> Vec<Candidate> {
    let mut ranked: Vec<&Candidate> = base
        .iter()
        .copied()
        .filter(|c| min_closeness.map_or(true, |min| c.closeness >= min))
        .collect();
    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.taxon_id.cmp(&b.taxon_id))
    });
    ranked.into_iter().take(lure_count).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{get_policy, PolicyOptions};
    use crate::rng::{seeded, FnRandom};
    use crate::types::{CandidateSource, GameMode};

    fn cand(id: &str, closeness: f64) -> Candidate {
        Candidate {
            taxon_id: id.to_string(),
            score: closeness,
            closeness,
            source: CandidateSource::LcaFallback,
            observation: None,
        }
    }

    fn easy() -> DifficultyPolicy {
        get_policy(GameMode::Easy, PolicyOptions::default())
    }

    fn ids(outcome: &SelectionOutcome) -> Vec<&str> {
        outcome.selected.iter().map(|c| c.taxon_id.as_str()).collect()
    }

    #[test]
    fn test_composition_shape() {
        let config = LureEngineConfig::default();
        let candidates = vec![
            cand("c1", 0.9),
            cand("c2", 0.8),
            cand("c3", 0.7),
            cand("m1", 0.5),
            cand("m2", 0.4),
            cand("f1", 0.3),
        ];
        let mut rng = seeded(1);
        let outcome = Selector::new(&config).select(&candidates, 3, &easy(), &SelectOptions::default(), &mut rng);

        assert_eq!(outcome.relax_level, 0);
        assert_eq!(outcome.selected.len(), 3);
        let policy = easy();
        let close = outcome.selected.iter().filter(|c| policy.classify(c.closeness) == Bucket::Close).count();
        let mid = outcome.selected.iter().filter(|c| policy.classify(c.closeness) == Bucket::Mid).count();
        assert_eq!((close, mid), (2, 1));
    }

    #[test]
    fn test_bucket_filler_prefers_closer() {
        let config = LureEngineConfig::default();
        // no mid candidates: the mid slot must be filled from close before far
        let candidates = vec![cand("c1", 0.9), cand("c2", 0.8), cand("c3", 0.7), cand("f1", 0.3)];
        let mut rng = seeded(5);
        let outcome = Selector::new(&config).select(&candidates, 3, &easy(), &SelectOptions::default(), &mut rng);
        let mut got = ids(&outcome);
        got.sort_unstable();
        assert_eq!(got, vec!["c1", "c2", "c3"]);
    }

    #[test]
    fn test_top_up_beyond_composition() {
        let config = LureEngineConfig::default();
        let candidates: Vec<_> = (0..8).map(|i| cand(&format!("t{i}"), 0.9 - i as f64 * 0.05)).collect();
        let mut rng = seeded(3);
        let outcome = Selector::new(&config).select(&candidates, 5, &easy(), &SelectOptions::default(), &mut rng);
        assert_eq!(outcome.selected.len(), 5);
        let unique: HashSet<_> = ids(&outcome).into_iter().collect();
        assert_eq!(unique.len(), 5);
    }

    #[test]
    fn test_exclusions_respected() {
        let config = LureEngineConfig::default();
        let candidates = vec![cand("a", 0.9), cand("b", 0.9), cand("c", 0.9), cand("d", 0.9)];
        let excluded: HashSet<String> = ["a".to_string()].into_iter().collect();
        let options = SelectOptions {
            exclude_taxon_ids: Some(&excluded),
            ..Default::default()
        };
        let mut rng = seeded(11);
        let outcome = Selector::new(&config).select(&candidates, 3, &easy(), &options, &mut rng);
        assert!(!ids(&outcome).contains(&"a"));
        assert_eq!(outcome.selected.len(), 3);
    }

    #[test]
    fn test_relaxation_ladder_advances() {
        let config = LureEngineConfig::default();
        // easy min 0.25; level 1 drops it to 0.15, level 2 to 0.05
        let candidates = vec![cand("a", 0.5), cand("b", 0.2), cand("c", 0.1)];
        let mut rng = seeded(2);
        let outcome = Selector::new(&config).select(&candidates, 3, &easy(), &SelectOptions::default(), &mut rng);
        assert_eq!(outcome.relax_level, 2);
        assert!(!outcome.used_fallback);
        assert_eq!(outcome.selected.len(), 3);
    }

    #[test]
    fn test_cross_iconic_admitted_from_third_step() {
        let config = LureEngineConfig::default();
        let mut bug = cand("bug", 0.9);
        bug.source = CandidateSource::LcaCrossIconic;
        let candidates = vec![cand("a", 0.9), cand("b", 0.9), bug];
        let mut rng = seeded(8);
        let outcome = Selector::new(&config).select(&candidates, 3, &easy(), &SelectOptions::default(), &mut rng);
        assert_eq!(outcome.relax_level, 3);
        assert!(ids(&outcome).contains(&"bug"));
    }

    #[test]
    fn test_strict_skips_ladder() {
        let config = LureEngineConfig::default();
        let policy = get_policy(
            GameMode::Easy,
            PolicyOptions {
                min_closeness_override: Some(0.6),
                ..Default::default()
            },
        );
        let candidates = vec![cand("a", 0.9), cand("b", 0.7), cand("c", 0.5), cand("d", 0.4)];
        let options = SelectOptions {
            strict_min_closeness: true,
            ..Default::default()
        };
        let mut rng = seeded(4);
        let outcome = Selector::new(&config).select(&candidates, 3, &policy, &options, &mut rng);

        assert!(outcome.used_fallback);
        assert_eq!(outcome.relax_level, 0);
        assert_eq!(ids(&outcome), vec!["a", "b"]);
        assert!(outcome.selected.iter().all(|c| c.closeness >= 0.6));
    }

    #[test]
    fn test_absolute_fallback_ignores_composition() {
        let config = LureEngineConfig::default();
        let candidates = vec![cand("a", 0.0), cand("b", 0.0)];
        let mut rng = seeded(4);
        let outcome = Selector::new(&config).select(&candidates, 3, &easy(), &SelectOptions::default(), &mut rng);
        assert!(outcome.used_fallback);
        assert_eq!(outcome.relax_level, config.relaxation.len());
        assert_eq!(ids(&outcome), vec!["a", "b"]);
    }

    #[test]
    fn test_zero_lures() {
        let config = LureEngineConfig::default();
        let mut rng = seeded(0);
        let outcome = Selector::new(&config).select(&[cand("a", 0.9)], 0, &easy(), &SelectOptions::default(), &mut rng);
        assert!(outcome.selected.is_empty());
        assert_eq!(outcome.relax_level, 0);
    }

    #[test]
    fn test_weight_floor_and_usage() {
        let config = LureEngineConfig::default();
        let selector = Selector::new(&config);
        let mut usage = LureUsageCounter::new();
        usage.set("a", 3);
        let a = cand("a", 0.8);
        assert!((selector.weight(&a, Some(&usage)) - 0.2).abs() < 1e-12);
        assert_eq!(selector.weight(&cand("z", 0.0), None), config.weight_floor);
    }

    #[test]
    fn test_draw_follows_cumulative_weights() {
        let config = LureEngineConfig::default();
        let candidates = vec![cand("a", 0.9), cand("b", 0.9), cand("c", 0.9)];
        // total weight 2.7; 0.5 * 2.7 lands in the second slot
        let mut rng = FnRandom(|| 0.5);
        let outcome = Selector::new(&config).select(&candidates, 1, &easy(), &SelectOptions::default(), &mut rng);
        assert_eq!(ids(&outcome), vec!["b"]);
    }

    #[test]
    fn test_usage_biases_away_from_repeats() {
        let config = LureEngineConfig::default();
        let selector = Selector::new(&config);
        let candidates = vec![cand("fresh", 0.8), cand("stale", 0.8)];
        let mut usage = LureUsageCounter::new();
        usage.set("stale", 5);
        let options = SelectOptions {
            lure_usage: Some(&usage),
            ..Default::default()
        };
        let mut rng = seeded(2024);
        let mut fresh = 0;
        let mut stale = 0;
        for _ in 0..2000 {
            let outcome = selector.select(&candidates, 1, &easy(), &options, &mut rng);
            match outcome.selected[0].taxon_id.as_str() {
                "fresh" => fresh += 1,
                _ => stale += 1,
            }
        }
        assert!(fresh > stale * 3, "fresh={fresh} stale={stale}");
    }
}
