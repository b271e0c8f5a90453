//! Domain error types.

/// Top-level error type for tradejournal.
#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    #[error("storage error: {reason}")]
    Storage { reason: String },

    #[error("storage query error: {reason}")]
    StorageQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("invalid trade: {reason}")]
    InvalidTrade { reason: String },

    #[error("invalid account: {reason}")]
    InvalidAccount { reason: String },

    #[error("unknown account: {name}")]
    UnknownAccount { name: String },

    #[error("account already exists: {name}")]
    DuplicateAccount { name: String },

    #[error("no trade with id {id} in account {account}")]
    UnknownTrade { account: String, id: u64 },

    #[error("mirror error: {reason}")]
    Mirror { reason: String },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl JournalError {
    pub fn invalid_trade(reason: impl Into<String>) -> Self {
        JournalError::InvalidTrade {
            reason: reason.into(),
        }
    }

    pub fn storage(reason: impl Into<String>) -> Self {
        JournalError::Storage {
            reason: reason.into(),
        }
    }
}

impl From<csv::Error> for JournalError {
    fn from(err: csv::Error) -> Self {
        JournalError::Storage {
            reason: format!("CSV error: {err}"),
        }
    }
}

impl From<&JournalError> for std::process::ExitCode {
    fn from(err: &JournalError) -> Self {
        let code: u8 = match err {
            JournalError::Io(_) | JournalError::Report { .. } => 1,
            JournalError::ConfigParse { .. }
            | JournalError::ConfigMissing { .. }
            | JournalError::ConfigInvalid { .. } => 2,
            JournalError::Storage { .. } | JournalError::StorageQuery { .. } => 3,
            JournalError::InvalidTrade { .. }
            | JournalError::InvalidAccount { .. }
            | JournalError::DuplicateAccount { .. } => 4,
            JournalError::UnknownAccount { .. } | JournalError::UnknownTrade { .. } => 5,
            JournalError::Mirror { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
