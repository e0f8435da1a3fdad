use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to open store at {path}: {reason}")]
    Open { path: String, reason: String },
    #[error("database schema version mismatch (found {found}, expected {expected}); please run with --reset option")]
    Schema { found: i64, expected: i64 },
    #[error("write failed: {0}")]
    Write(String),
    #[error("read failed: {0}")]
    Read(String),
    #[error("store connection lock poisoned")]
    Poisoned,
}
