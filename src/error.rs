use thiserror::Error;

/// Call-site misuse. Data problems never surface here; they degrade the
/// result and show up in the quality report instead.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LureError {
    #[error("target taxon id is required")]
    MissingTargetTaxon,
    #[error("target observation belongs to taxon {found}, expected {expected}")]
    TargetMismatch { expected: String, found: String },
}
