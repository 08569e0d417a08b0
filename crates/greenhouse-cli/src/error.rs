use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] greenhouse_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Refusing to clear synced observations without --yes")]
    ClearNotConfirmed,
    #[error("Sync stopped after {uploaded} of {attempted} observations: {reason}")]
    SyncIncomplete {
        uploaded: usize,
        attempted: usize,
        reason: String,
    },
    #[error(
        "Sync is not configured. Set GREENHOUSE_API_BASE_URL (and GREENHOUSE_API_TOKEN), pass --api-url, or use --mark-only."
    )]
    SyncNotConfigured,
}
