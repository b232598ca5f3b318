use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("database error: {0}")]
    Db(String),
    #[error("corrupt {kind} document {id}: {reason}")]
    Corrupt { kind: &'static str, id: i64, reason: String },
}
