use thiserror::Error;

/// Failure modes of a metrics refresh. The first two abort the refresh with no
/// partial tree; `TreeInvariantViolation` means a bug upstream of publication
/// and is never silently corrected.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("endpoint {name} unavailable after {attempts} attempts: {reason}")]
    EndpointUnavailable {
        name: &'static str,
        attempts: u32,
        reason: String,
    },

    #[error("malformed payload from {name}: {reason}")]
    MalformedPayload {
        name: &'static str,
        reason: String,
    },

    #[error("tree invariant violated: {0}")]
    TreeInvariantViolation(String),

    #[error("bucket record with invalid dissolve delay: {months} months")]
    UnknownBucketKey { months: i64 },
}
