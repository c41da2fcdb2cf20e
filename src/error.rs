use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReconError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Mapping with bank_id {bank_id}, bank_name {bank_name}, and these headers already exists.")]
    DuplicateMapping { bank_id: String, bank_name: String },

    #[error("Unknown transaction type: {0} (expected SALE, REFUND or NET SETTLED)")]
    InvalidTransactionType(String),

    #[error("Invalid headers: {0}")]
    InvalidHeaders(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Settings error: {0}")]
    Settings(String),
}

impl ReconError {
    /// True when the store rejected the write on a UNIQUE/CHECK/NOT NULL constraint.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            ReconError::Db(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation
        )
    }
}

pub type Result<T> = std::result::Result<T, ReconError>;
