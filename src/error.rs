use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("session is not ordered by start time (track at index {index} starts too early)")]
    UnsortedSession { index: usize },

    #[error("track {id} has not been ended")]
    OpenTrack { id: u32 },

    #[error("gesture '{name}' has no steps")]
    EmptyGesture { name: String },

    #[error("no open track for touch {id}")]
    UnknownTouch { id: u32 },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExprError {
    #[error("unexpected character '{ch}' at offset {offset}")]
    UnexpectedChar { ch: char, offset: usize },

    #[error("unexpected token {found} at offset {offset}")]
    UnexpectedToken { found: String, offset: usize },

    #[error("expression ended early")]
    UnexpectedEnd,

    #[error("unbalanced parenthesis at offset {offset}")]
    Unbalanced { offset: usize },

    #[error("malformed rule call '{text}'")]
    MalformedRule { text: String },
}
