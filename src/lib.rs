//! # species-lures - lure selection for species-identification quizzes
//!
//! Picks plausible wrong answers ("lures") for a species-identification quiz
//! question:
//!
//! - **Difficulty policy** - game mode to closeness constraints and bucket composition
//! - **Candidate index** - confusion map first, lowest-common-ancestor depth as fallback
//! - **Selector** - weighted sampling with usage penalty and a relaxation ladder
//! - **Quality validator** - structural gate on the final lure set
//! - **Engine** - composes the above and resolves observations
//!
//! ## Modules
//!
//! - [`policy`] - difficulty presets and boost handling
//! - [`candidates`] - scored candidate index
//! - [`selector`] - composition-first weighted selection
//! - [`quality`] - lure set validation
//! - [`picker`] - observation lookup seam and in-memory selection state
//! - [`engine`] - end-to-end orchestration
//! - [`config`] - tunables and relaxation ladder
//! - [`rng`] - injected randomness
//! - [`sanitize`] - numeric and identifier hygiene
//! - [`types`] - shared data types
//!
//! ## Usage
//!
//! ```rust
//! use species_lures::{build_lures, GameMode, LureOptions, LureRequest, ObservationPool,
//!     Observation, SeenObservations};
//!
//! let pool = ObservationPool::default();
//! let target = Observation::default();
//! let state = SeenObservations::new();
//! let request = LureRequest {
//!     pool: &pool,
//!     selection_state: &state,
//!     target_taxon_id: "12345",
//!     target_observation: &target,
//!     lure_count: 3,
//!     game_mode: GameMode::Easy,
//!     options: LureOptions::default(),
//! };
//! let mut rng = species_lures::rng::seeded(42);
//! let outcome = build_lures(&request, &mut rng).unwrap();
//! assert!(!outcome.quality.ok);
//! ```

// ============================================================================
// Module declarations
// ============================================================================

pub mod candidates;
pub mod config;
pub mod engine;
pub mod error;
pub mod picker;
pub mod policy;
pub mod quality;
pub mod rng;
pub mod sanitize;
pub mod selector;
pub mod types;

// ============================================================================
// Re-exports
// ============================================================================

/// Shared data types
pub use types::*;

pub use candidates::CandidateIndex;
pub use config::{LureEngineConfig, RelaxStep};
pub use engine::{build_lures, LureBuildOutcome, LureEngine, LureOptions, LureRequest};
pub use error::LureError;
pub use picker::{ObservationPicker, SeenObservations};
pub use policy::{get_policy, CompositionSlot, DifficultyPolicy, PolicyOptions};
pub use quality::{validate_lure_set, QualityFailure, QualityReport};
pub use rng::{FnRandom, RandomSource};
pub use selector::{SelectOptions, SelectionOutcome, Selector};
