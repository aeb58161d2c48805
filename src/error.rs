use thiserror::Error;

/// Fatal derivation failures.
///
/// Data anomalies (missing counts, non-finite numbers, empty lists) are never
/// errors; every engine degrades to a safe fallback instead. Only a broken
/// caller configuration or an assembled report that violates the output
/// contract aborts a derivation.
#[derive(Debug, Error)]
pub enum DeriveError {
    /// Caller-supplied configuration is invalid (role weights, axis ranges,
    /// unknown registry codes).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The assembled report failed required-field validation.
    #[error("output contract violation: {0}")]
    Contract(String),
}
