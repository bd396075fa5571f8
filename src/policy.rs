//! Difficulty policy
//!
//! Maps a game mode (plus an optional global difficulty boost) to the
//! closeness constraints and bucket composition the selector works with.
//!
//! Presets:
//! - easy: min closeness 0.25, 2 close + 1 mid
//! - riddle: at least easy + 0.20 and never below 0.45, all close
//!
//! Pure and infallible: bad inputs are clamped, never rejected.

use serde::{Deserialize, Serialize};

use crate::sanitize::{clamp_finite, unit_interval};
use crate::types::{Bucket, GameMode};

pub const EASY_MIN_CLOSENESS: f64 = 0.25;
pub const EASY_FLOOR: f64 = 0.05;
pub const EASY_CLOSE_THRESHOLD: f64 = 0.60;
pub const EASY_MID_THRESHOLD: f64 = 0.35;

pub const RIDDLE_MARGIN: f64 = 0.20;
pub const RIDDLE_HARD_FLOOR: f64 = 0.45;
pub const RIDDLE_CLOSE_THRESHOLD: f64 = 0.70;
pub const RIDDLE_MID_THRESHOLD: f64 = 0.50;

/// Shared cap on every minimum closeness, easy and riddle alike.
///
/// Riddle keeps its `RIDDLE_MARGIN` over easy only while easy sits at or
/// below `MIN_CLOSENESS_CEILING - RIDDLE_MARGIN` (boost up to about 0.71).
/// Past that both presets saturate here and riddle equals easy; it is never
/// easier.
pub const MIN_CLOSENESS_CEILING: f64 = 0.95;
pub const MAX_DIFFICULTY_BOOST: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositionSlot {
    pub bucket: Bucket,
    pub count: usize,
}

impl CompositionSlot {
    pub const fn new(bucket: Bucket, count: usize) -> Self {
        Self { bucket, count }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultyPolicy {
    pub mode: GameMode,
    pub min_closeness: f64,
    pub close_threshold: f64,
    pub mid_threshold: f64,
    pub composition: Vec<CompositionSlot>,
}

impl DifficultyPolicy {
    pub fn classify(&self, closeness: f64) -> Bucket {
        if closeness >= self.close_threshold {
            Bucket::Close
        } else if closeness >= self.mid_threshold {
            Bucket::Mid
        } else {
            Bucket::Far
        }
    }

    /// Total quota across the composition
    pub fn composition_total(&self) -> usize {
        self.composition.iter().map(|slot| slot.count).sum()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyOptions {
    /// Signed adjustment in [-1, 1]; positive is harder
    pub global_difficulty_boost: Option<f64>,
    /// Replaces the computed minimum closeness outright
    pub min_closeness_override: Option<f64>,
}

/// Band every minimum closeness is forced into
pub fn clamp_min_closeness(value: f64) -> f64 {
    clamp_finite(value, 0.0, MIN_CLOSENESS_CEILING)
}

pub fn get_policy(mode: GameMode, options: PolicyOptions) -> DifficultyPolicy {
    let boost = sanitize_boost(options.global_difficulty_boost.unwrap_or(0.0));
    let easy_min = apply_boost(EASY_MIN_CLOSENESS, EASY_FLOOR, boost);

    let (computed_min, close_threshold, mid_threshold, composition) = match mode {
        GameMode::Easy => (
            easy_min,
            EASY_CLOSE_THRESHOLD,
            EASY_MID_THRESHOLD,
            vec![
                CompositionSlot::new(Bucket::Close, 2),
                CompositionSlot::new(Bucket::Mid, 1),
            ],
        ),
        GameMode::Riddle => {
            let base = (EASY_MIN_CLOSENESS + RIDDLE_MARGIN).max(RIDDLE_HARD_FLOOR);
            let riddle_min = apply_boost(base, RIDDLE_HARD_FLOOR, boost)
                .max(easy_min + RIDDLE_MARGIN)
                .min(MIN_CLOSENESS_CEILING);
            (
                riddle_min,
                RIDDLE_CLOSE_THRESHOLD,
                RIDDLE_MID_THRESHOLD,
                vec![CompositionSlot::new(Bucket::Close, 3)],
            )
        }
    };

    let min_closeness = match options.min_closeness_override {
        Some(value) => clamp_min_closeness(value),
        None => clamp_min_closeness(computed_min),
    };

    let close_threshold = unit_interval(close_threshold);
    let mid_threshold = unit_interval(mid_threshold).min(close_threshold);

    DifficultyPolicy {
        mode,
        min_closeness,
        close_threshold,
        mid_threshold,
        composition,
    }
}

fn sanitize_boost(boost: f64) -> f64 {
    if boost.is_finite() {
        boost.clamp(-MAX_DIFFICULTY_BOOST, MAX_DIFFICULTY_BOOST)
    } else {
        0.0
    }
}

/// Move `base` toward the ceiling (positive boost) or toward `floor`
/// (negative boost), proportionally to the headroom on that side.
fn apply_boost(base: f64, floor: f64, boost: f64) -> f64 {
    let adjusted = if boost >= 0.0 {
        base + boost * (MIN_CLOSENESS_CEILING - base)
    } else {
        base + boost * (base - floor)
    };
    clamp_finite(adjusted, floor, MIN_CLOSENESS_CEILING)
}
