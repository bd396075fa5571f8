//! Observation lookup for chosen lure taxa.
//!
//! The question builder tracks which observations a player has already been
//! shown. [`ObservationPicker`] is that collaborator's seam; [`SeenObservations`]
//! is a plain in-memory implementation.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::rng::RandomSource;
use crate::types::{Observation, ObservationPool};

pub trait ObservationPicker {
    /// Pick an observation of `taxon_id`. With `allow_seen == false` only
    /// observations the player has not seen qualify.
    fn pick_observation(
        &self,
        pool: &ObservationPool,
        taxon_id: &str,
        allow_seen: bool,
        rng: &mut dyn RandomSource,
    ) -> Option<Observation>;
}

/// Observation ids already shown in this session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeenObservations {
    seen: HashSet<String>,
}

impl SeenObservations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_seen(&mut self, observation_id: impl Into<String>) {
        self.seen.insert(observation_id.into());
    }

    pub fn is_seen(&self, observation_id: &str) -> bool {
        self.seen.contains(observation_id)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

impl ObservationPicker for SeenObservations {
    fn pick_observation(
        &self,
        pool: &ObservationPool,
        taxon_id: &str,
        allow_seen: bool,
        rng: &mut dyn RandomSource,
    ) -> Option<Observation> {
        let eligible: Vec<&Observation> = pool
            .observations_for(taxon_id)?
            .iter()
            .filter(|o| o.taxon_id().is_some())
            .filter(|o| allow_seen || !self.is_seen(&o.id))
            .collect();

        if eligible.is_empty() {
            return None;
        }
        let idx = ((rng.next_unit() * eligible.len() as f64) as usize).min(eligible.len() - 1);
        Some(eligible[idx].clone())
    }
}
