//! Lure engine
//!
//! Composes the pipeline for one quiz question:
//! policy -> candidate index -> selector -> observation resolution -> quality gate.
//!
//! The engine owns nothing but its configuration. Pool, selection state,
//! usage counter and randomness all come from the caller, so concurrent
//! calls are independent as long as the caller does not share mutable state
//! between them.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::candidates::CandidateIndex;
use crate::config::LureEngineConfig;
use crate::error::LureError;
use crate::picker::ObservationPicker;
use crate::policy::{get_policy, PolicyOptions};
use crate::quality::{validate_lure_set, QualityReport};
use crate::rng::RandomSource;
use crate::selector::{SelectOptions, Selector};
use crate::types::{
    Candidate, GameMode, IndexSource, LureResult, LureUsageCounter, Observation, ObservationPool,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct LureOptions<'a> {
    pub global_difficulty_boost: Option<f64>,
    /// Exact minimum closeness; also makes selection strict (no relaxation)
    pub min_closeness: Option<f64>,
    pub exclude_taxon_ids: Option<&'a HashSet<String>>,
    pub lure_usage: Option<&'a LureUsageCounter>,
}

pub struct LureRequest<'a> {
    pub pool: &'a ObservationPool,
    pub selection_state: &'a dyn ObservationPicker,
    pub target_taxon_id: &'a str,
    pub target_observation: &'a Observation,
    pub lure_count: usize,
    pub game_mode: GameMode,
    pub options: LureOptions<'a>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LureBuildOutcome {
    pub lures: Vec<LureResult>,
    pub source: IndexSource,
    pub relax_level: usize,
    pub quality: QualityReport,
    #[serde(default)]
    pub used_fallback: bool,
}

impl LureBuildOutcome {
    pub fn lure_taxon_ids(&self) -> Vec<&str> {
        self.lures.iter().map(|l| l.taxon_id.as_str()).collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct LureEngine {
    config: LureEngineConfig,
}

impl LureEngine {
    pub fn new(config: LureEngineConfig) -> Self {
        Self {
            config: config.sanitized(),
        }
    }

    pub fn from_env() -> Self {
        Self::new(LureEngineConfig::from_env())
    }

    pub fn config(&self) -> &LureEngineConfig {
        &self.config
    }

    pub fn build_lures(
        &self,
        request: &LureRequest<'_>,
        rng: &mut dyn RandomSource,
    ) -> Result<LureBuildOutcome, LureError> {
        let target_taxon_id = request.target_taxon_id.trim();
        if target_taxon_id.is_empty() {
            return Err(LureError::MissingTargetTaxon);
        }
        if let Some(found) = request.target_observation.taxon_id() {
            if found != target_taxon_id {
                return Err(LureError::TargetMismatch {
                    expected: target_taxon_id.to_string(),
                    found: found.to_string(),
                });
            }
        }

        let options = &request.options;
        let policy = get_policy(
            request.game_mode,
            PolicyOptions {
                global_difficulty_boost: options.global_difficulty_boost,
                min_closeness_override: options.min_closeness,
            },
        );

        let index = CandidateIndex::build(
            request.pool,
            target_taxon_id,
            request.target_observation,
            &self.config,
        );

        let mut excluded: HashSet<String> = options.exclude_taxon_ids.cloned().unwrap_or_default();
        excluded.insert(target_taxon_id.to_string());

        let selection = Selector::new(&self.config).select(
            &index.candidates,
            request.lure_count,
            &policy,
            &SelectOptions {
                exclude_taxon_ids: Some(&excluded),
                lure_usage: options.lure_usage,
                strict_min_closeness: options.min_closeness.is_some(),
            },
            &mut *rng,
        );
        debug!(
            target = %target_taxon_id,
            mode = request.game_mode.as_str(),
            source = index.source.as_str(),
            candidates = index.candidates.len(),
            selected = selection.selected.len(),
            relax_level = selection.relax_level,
            "Lure selection finished"
        );

        let mut lures = Vec::with_capacity(selection.selected.len());
        for candidate in selection.selected {
            match resolve_observation(request.pool, request.selection_state, &candidate, rng) {
                Some(observation) => lures.push(LureResult {
                    taxon_id: candidate.taxon_id,
                    observation,
                    score: candidate.score,
                    closeness: candidate.closeness,
                    source: candidate.source,
                }),
                None => debug!(taxon = %candidate.taxon_id, "No observation for lure, dropping"),
            }
        }

        let quality = validate_lure_set(target_taxon_id, &lures, request.lure_count);
        if let Some(reason) = quality.reason {
            warn!(
                target = %target_taxon_id,
                reason = %reason,
                lures = lures.len(),
                expected = request.lure_count,
                "Lure set failed quality check"
            );
        } else if selection.used_fallback || selection.relax_level > 0 {
            info!(
                target = %target_taxon_id,
                relax_level = selection.relax_level,
                fallback = selection.used_fallback,
                "Lure set built under relaxed constraints"
            );
        }

        Ok(LureBuildOutcome {
            lures,
            source: index.source,
            relax_level: selection.relax_level,
            quality,
            used_fallback: selection.used_fallback,
        })
    }
}

/// Build lures with the default configuration
pub fn build_lures(
    request: &LureRequest<'_>,
    rng: &mut dyn RandomSource,
) -> Result<LureBuildOutcome, LureError> {
    LureEngine::default().build_lures(request, rng)
}

/// Attached observation first, then an unseen one, then any one, then the
/// pool's first record for the taxon
fn resolve_observation(
    pool: &ObservationPool,
    picker: &dyn ObservationPicker,
    candidate: &Candidate,
    rng: &mut dyn RandomSource,
) -> Option<Observation> {
    let taxon_id = candidate.taxon_id.as_str();
    if let Some(attached) = candidate
        .observation
        .as_ref()
        .filter(|o| o.taxon_id() == Some(taxon_id))
    {
        return Some(attached.clone());
    }

    picker
        .pick_observation(pool, taxon_id, false, rng)
        .or_else(|| picker.pick_observation(pool, taxon_id, true, rng))
        .or_else(|| pool.representative(taxon_id).cloned())
}
