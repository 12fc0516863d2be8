use thiserror::Error;

#[derive(Debug, Error)]
pub enum DraftError {
    #[error("Cursor offset {offset} is past the end of the document ({len} characters)")]
    InvalidCursor { offset: usize, len: usize },

    #[error("Invalid config: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
