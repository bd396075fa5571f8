//! Final gate over a resolved lure set.
//!
//! Checks run in a fixed order and stop at the first failure.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::types::LureResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityFailure {
    NotEnoughLures,
    InvalidTaxonIds,
    DuplicateLures,
    MissingObservation,
}

impl QualityFailure {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityFailure::NotEnoughLures => "not_enough_lures",
            QualityFailure::InvalidTaxonIds => "invalid_taxon_ids",
            QualityFailure::DuplicateLures => "duplicate_lures",
            QualityFailure::MissingObservation => "missing_observation",
        }
    }
}

impl std::fmt::Display for QualityFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityReport {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<QualityFailure>,
}

impl QualityReport {
    pub fn passed() -> Self {
        Self { ok: true, reason: None }
    }

    pub fn failed(reason: QualityFailure) -> Self {
        Self {
            ok: false,
            reason: Some(reason),
        }
    }
}

pub fn validate_lure_set(
    target_taxon_id: &str,
    lures: &[LureResult],
    expected_count: usize,
) -> QualityReport {
    if lures.len() < expected_count {
        return QualityReport::failed(QualityFailure::NotEnoughLures);
    }

    if lures
        .iter()
        .any(|l| l.taxon_id.trim().is_empty() || l.taxon_id.trim() == target_taxon_id.trim())
    {
        return QualityReport::failed(QualityFailure::InvalidTaxonIds);
    }

    let mut seen = HashSet::with_capacity(lures.len());
    if !lures.iter().all(|l| seen.insert(l.taxon_id.trim())) {
        return QualityReport::failed(QualityFailure::DuplicateLures);
    }

    if lures
        .iter()
        .any(|l| l.observation.taxon_id() != Some(l.taxon_id.trim()))
    {
        return QualityReport::failed(QualityFailure::MissingObservation);
    }

    QualityReport::passed()
}
