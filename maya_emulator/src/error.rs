use std::time::Duration;

use crate::scenario::ScenarioState;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Cannot start the {model} emulator: {reason}")]
    Connection { model: &'static str, reason: String },

    #[error(transparent)]
    Ledger(#[from] maya_ledger::Error),

    #[error(transparent)]
    HttpReqwest(#[from] reqwest::Error),

    #[error("Http request to {0} returned {1} instead of 200")]
    HttpStatus(String, u16),

    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error("Timeout after {after:?} waiting for {what}")]
    Timeout { what: String, after: Duration },

    #[error("Snapshot #{index} of '{name}' does not match the golden image")]
    SnapshotMismatch { name: String, index: usize },

    #[error("Missing golden snapshots for '{0}', set SNAPSHOTS_RECORD=1 to record them")]
    MissingGoldenSnapshots(String),

    #[error("'{0}' not found on screen after {1} steps")]
    KeywordNotFound(String, usize),

    #[error("Pending command did not complete: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("Invalid scenario transition from {from:?} to {to:?}")]
    InvalidState {
        from: ScenarioState,
        to: ScenarioState,
    },

    #[error("Emulator session is closed")]
    Closed,
}
