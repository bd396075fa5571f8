//! Numeric and identifier hygiene
//!
//! Upstream data is trusted for shape only. Scores, closeness values and
//! identifiers pass through here before any ranking logic sees them.

/// Replace NaN/Inf with 0 and clamp negatives to 0
pub fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Clamp into [0, 1], mapping NaN/Inf to 0
pub fn unit_interval(value: f64) -> f64 {
    non_negative(value).min(1.0)
}

/// Clamp into [lo, hi], mapping NaN to `lo`
pub fn clamp_finite(value: f64, lo: f64, hi: f64) -> f64 {
    if value.is_nan() {
        lo
    } else {
        value.clamp(lo, hi)
    }
}

/// Coerce a loosely typed identifier into a string.
///
/// Strings are trimmed, integral numbers are printed without a fraction.
/// Anything else (null, bool, object, blank) is malformed.
pub fn coerce_taxon_id(raw: &serde_json::Value) -> Option<String> {
    match raw {
        serde_json::Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i.to_string())
            } else if let Some(u) = n.as_u64() {
                Some(u.to_string())
            } else {
                n.as_f64().filter(|f| f.is_finite()).map(|f| f.to_string())
            }
        }
        _ => None,
    }
}
