//! Engine-level errors (§7).
//!
//! Mismatches are never an error — a missed match is a return value
//! (`MatchOutcome::matches` empty plus a `diff_target`). `EngineError` is
//! reserved for the programming-error taxonomy §7 describes: an invalid
//! regex pattern reaching the matcher, or a `DomBridge` implementation
//! violating its contract.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid regex pattern {pattern:?}: {source}")]
    InvalidRegexPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("DomBridge contract violation: {0}")]
    DomBridgeContractViolation(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
