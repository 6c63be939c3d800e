use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: String, status: u16 },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("'{subcategory}' is not a subcategory of {category}")]
    InvalidSubcategory { category: String, subcategory: String },

    #[error("Transaction {0} has no usable suggested category")]
    NoSuggestion(u64),

    #[error("No transactions to submit. Categorize some transactions first.")]
    NothingToSubmit,

    #[error("No uncategorized transaction with row number {0}")]
    UnknownTransaction(u64),

    #[error("No rule with ID {0}")]
    UnknownRule(u64),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
