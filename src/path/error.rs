//! Path expression errors
//!
//! Every parse failure is reported as `PathError::InvalidExpression` carrying
//! the character offset where parsing stopped and the reason. Parsing never
//! produces a partial result.

use crate::key::KeyError;
use thiserror::Error;

/// Why an expression was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseFailure {
    #[error("Unexpected character '{0}'")]
    UnexpectedCharacter(char),

    #[error("Unterminated string")]
    UnterminatedString,

    #[error("Expected an element after the separator")]
    MissingElement,

    #[error("Encountered bucket after value")]
    BucketAfterValue,

    #[error("{0}")]
    MalformedHex(#[from] KeyError),
}

/// Path expression errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("Invalid expression at position {position}: {reason}")]
    InvalidExpression {
        /// Character offset into the expression
        position: usize,
        reason: ParseFailure,
    },
}

impl PathError {
    pub(crate) const fn at(position: usize, reason: ParseFailure) -> Self {
        Self::InvalidExpression { position, reason }
    }

    /// Reason the expression was rejected
    #[must_use]
    pub const fn reason(&self) -> &ParseFailure {
        match self {
            Self::InvalidExpression { reason, .. } => reason,
        }
    }
}
