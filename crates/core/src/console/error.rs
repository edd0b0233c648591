//! Console error types.

use thiserror::Error;

/// Reasons a console statement is refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsoleError {
    /// Nothing to run.
    #[error("Query is empty")]
    Empty,

    /// More than one statement was submitted.
    #[error("Only a single statement is allowed")]
    MultipleStatements,

    /// The statement does not start with a read-only keyword.
    #[error("Statement must start with SELECT, WITH, SHOW or EXPLAIN, found {0}")]
    NotReadOnly(String),

    /// A mutating keyword appears outside a string literal.
    #[error("Keyword {0} is not allowed in console queries")]
    ForbiddenKeyword(String),

    /// A string literal, quoted identifier or comment is never closed.
    #[error("Unterminated {0}")]
    Unterminated(&'static str),
}

impl ConsoleError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        400
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Empty => "EMPTY_QUERY",
            Self::MultipleStatements => "MULTIPLE_STATEMENTS",
            Self::NotReadOnly(_) => "NOT_READ_ONLY",
            Self::ForbiddenKeyword(_) => "FORBIDDEN_KEYWORD",
            Self::Unterminated(_) => "UNTERMINATED_TOKEN",
        }
    }
}
