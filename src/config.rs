use serde::{Deserialize, Serialize};

use crate::sanitize::{non_negative, unit_interval};

pub const DEFAULT_MAX_CANDIDATES: usize = 36;
pub const DEFAULT_CROSS_ICONIC_PENALTY: f64 = 0.25;
pub const DEFAULT_WEIGHT_FLOOR: f64 = 1e-3;

const MAX_CANDIDATES_CEILING: usize = 500;

/// One rung of the relaxation ladder.
///
/// Deltas are cumulative from the un-relaxed policy, not from the previous
/// rung.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RelaxStep {
    pub min_closeness_delta: f64,
    pub threshold_delta: f64,
    pub allow_cross_iconic: bool,
}

impl RelaxStep {
    pub const fn new(min_closeness_delta: f64, threshold_delta: f64, allow_cross_iconic: bool) -> Self {
        Self {
            min_closeness_delta,
            threshold_delta,
            allow_cross_iconic,
        }
    }
}

pub fn default_relaxation_ladder() -> Vec<RelaxStep> {
    vec![
        RelaxStep::new(0.00, 0.00, false),
        RelaxStep::new(0.10, 0.10, false),
        RelaxStep::new(0.20, 0.20, false),
        RelaxStep::new(0.30, 0.30, true),
        RelaxStep::new(0.45, 0.45, true),
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LureEngineConfig {
    pub max_candidates: usize,
    /// Subtracted from the score of candidates outside the target's iconic group
    pub cross_iconic_penalty: f64,
    /// Smallest sampling weight any candidate can have
    pub weight_floor: f64,
    /// Level 0 is the un-relaxed policy
    pub relaxation: Vec<RelaxStep>,
}

impl Default for LureEngineConfig {
    fn default() -> Self {
        Self {
            max_candidates: DEFAULT_MAX_CANDIDATES,
            cross_iconic_penalty: DEFAULT_CROSS_ICONIC_PENALTY,
            weight_floor: DEFAULT_WEIGHT_FLOOR,
            relaxation: default_relaxation_ladder(),
        }
    }
}

impl LureEngineConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let max_candidates = std::env::var("LURE_MAX_CANDIDATES")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(defaults.max_candidates);

        let cross_iconic_penalty = std::env::var("LURE_CROSS_ICONIC_PENALTY")
            .ok()
            .and_then(|v| v.parse::<f64>().ok())
            .unwrap_or(defaults.cross_iconic_penalty);

        let weight_floor = std::env::var("LURE_WEIGHT_FLOOR")
            .ok()
            .and_then(|v| v.parse::<f64>().ok())
            .unwrap_or(defaults.weight_floor);

        Self {
            max_candidates,
            cross_iconic_penalty,
            weight_floor,
            ..defaults
        }
        .sanitized()
    }

    /// Pull every field back into a usable range
    pub fn sanitized(mut self) -> Self {
        self.max_candidates = self.max_candidates.clamp(1, MAX_CANDIDATES_CEILING);
        self.cross_iconic_penalty = unit_interval(self.cross_iconic_penalty);
        self.weight_floor = if non_negative(self.weight_floor) > 0.0 {
            self.weight_floor.min(1.0)
        } else {
            DEFAULT_WEIGHT_FLOOR
        };
        for step in &mut self.relaxation {
            step.min_closeness_delta = unit_interval(step.min_closeness_delta);
            step.threshold_delta = non_negative(step.threshold_delta).min(1.0);
        }
        if self.relaxation.is_empty() {
            self.relaxation.push(RelaxStep::new(0.0, 0.0, false));
        }
        self
    }
}
