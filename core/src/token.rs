//! The contract between the resolution engine and a tokenizer.
//!
//! The engine asks a [`Tokenize`] implementation to split an argument
//! vector against a [`FlagTable`]. The tokenizer decides token boundaries
//! only; it never converts values or checks requirements.

use thiserror::Error;

use crate::{FlagName, FlagTable};

/// One recognized unit of the argument vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A declared flag with its value, if it took one.
    Flag { name: FlagName, value: Option<String> },
    /// A bare argument; `index` is its position in the argument vector.
    Positional { index: usize, text: String },
}

/// Tokenizer-level failures. The engine maps them onto [`Error`](crate::Error).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    /// A dash-prefixed token the table does not declare; `text` is the flag
    /// as written, without any attached value.
    #[error("unrecognized flag {text}")]
    Unrecognized { text: String },
    /// A flag requiring a value reached the end of the argument vector.
    #[error("missing value for {flag}")]
    MissingValue { flag: FlagName },
}

/// Splits an argument vector into [`Token`]s.
///
/// Implementations report every failure in place and keep going, so a
/// caller can scan past errors (subcommand dispatch does).
pub trait Tokenize {
    fn tokenize(&self, table: &FlagTable, args: &[String]) -> Vec<Result<Token, LexError>>;
}
