//! Error type for a single generation candidate that cannot be repaired.

/// Why one candidate's text produced no riddles.
///
/// These never fail a whole request: the extractor logs them and moves on to
/// the next candidate.
#[derive(Debug, thiserror::Error)]
pub enum RepairError {
    #[error("candidate output is empty")]
    Empty,

    #[error("candidate output does not match the riddles schema after repair (steps applied: {applied}): {source}")]
    Schema {
        applied: String,
        #[source]
        source: serde_json::Error,
    },
}
