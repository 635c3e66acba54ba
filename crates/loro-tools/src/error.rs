use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolError {
    /// The store rejected the write; previously saved data is unchanged
    #[error("could not save '{key}'")]
    NotSaved { key: &'static str },

    /// The stored document exists but could not be read, so it is left as is
    #[error("stored '{key}' could not be read; refusing to overwrite it")]
    Unreadable { key: &'static str },

    #[error("assessment incomplete: {missing} item(s) unanswered")]
    Incomplete { missing: usize },

    #[error("invalid date '{0}' (expected YYYY-MM-DD)")]
    InvalidDate(String),
}

impl From<ToolError> for loro_core::LoroError {
    fn from(e: ToolError) -> Self {
        loro_core::LoroError::Storage(e.to_string())
    }
}
