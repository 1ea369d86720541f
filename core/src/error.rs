//! Error types for schema extraction and argument resolution.
//!
//! Every failure the binder can produce is a variant of [`Error`]. Errors
//! are plain data (`Clone + Eq`), so resolving the same invalid input twice
//! yields two equal errors.

use thiserror::Error;

use crate::convert::ConvertFailure;

/// Errors raised while building a schema or resolving an argument vector.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The destination record does not match its own field declarations.
    #[error("invalid destination {record}: {reason}")]
    InvalidDestination { record: String, reason: String },

    /// Malformed `arg` tag on a field.
    #[error("field {field}: invalid tag {tag:?}: {reason}")]
    InvalidFieldTag {
        field: String,
        tag: String,
        reason: String,
    },

    /// The converter has no rule for the field's type.
    #[error("field {field}: unsupported type {type_name}")]
    UnsupportedType { field: String, type_name: String },

    /// Two fields of one command level register the same flag name.
    #[error("{name} is declared more than once in {command}")]
    DuplicateFlag { command: String, name: String },

    /// Two subcommands of one command level share a name or alias.
    #[error("subcommand {name} is declared more than once in {command}")]
    DuplicateSubcommand { command: String, name: String },

    /// A flag no level of the active command chain declares.
    #[error("unknown argument {token}")]
    UnknownFlag { token: String },

    /// A flag that requires a value appeared last.
    #[error("missing value for {flag}")]
    MissingArgument { flag: String },

    /// A value was present but could not be converted.
    #[error("error processing {field} value {raw:?}: {cause}")]
    Conversion {
        field: String,
        raw: String,
        #[source]
        cause: ConvertFailure,
    },

    /// A required positional argument had no token left.
    #[error("{field} is required")]
    MissingPositional { field: String },

    /// A required field was set by neither the command line, the
    /// environment, nor a default.
    #[error("{field} is required{}", env_hint(.env))]
    RequiredFieldMissing { field: String, env: Option<String> },

    /// A bare argument in subcommand position matched no subcommand.
    #[error("invalid subcommand: {name}")]
    UnknownSubcommand { name: String },

    /// `-h`/`--help` was given; `path` names the command it was given to.
    #[error("help requested")]
    HelpRequested { path: Vec<String> },

    /// `--version` was given.
    #[error("version requested")]
    VersionRequested,
}

fn env_hint(env: &Option<String>) -> String {
    env.as_ref()
        .map(|var| format!(" (or set environment variable {var})"))
        .unwrap_or_default()
}

/// Fieldless discriminant of [`Error`], handy for matching and reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidDestination,
    InvalidFieldTag,
    UnsupportedType,
    DuplicateFlag,
    DuplicateSubcommand,
    UnknownFlag,
    MissingArgument,
    ConversionError,
    MissingPositional,
    RequiredFieldMissing,
    UnknownSubcommand,
    HelpRequested,
    VersionRequested,
}

impl Error {
    /// Returns the fieldless kind of this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use argbind_core::{Error, ErrorKind};
    ///
    /// let err = Error::UnknownFlag { token: "--port".into() };
    /// assert_eq!(err.kind(), ErrorKind::UnknownFlag);
    /// assert_eq!(err.to_string(), "unknown argument --port");
    /// ```
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidDestination { .. } => ErrorKind::InvalidDestination,
            Self::InvalidFieldTag { .. } => ErrorKind::InvalidFieldTag,
            Self::UnsupportedType { .. } => ErrorKind::UnsupportedType,
            Self::DuplicateFlag { .. } => ErrorKind::DuplicateFlag,
            Self::DuplicateSubcommand { .. } => ErrorKind::DuplicateSubcommand,
            Self::UnknownFlag { .. } => ErrorKind::UnknownFlag,
            Self::MissingArgument { .. } => ErrorKind::MissingArgument,
            Self::Conversion { .. } => ErrorKind::ConversionError,
            Self::MissingPositional { .. } => ErrorKind::MissingPositional,
            Self::RequiredFieldMissing { .. } => ErrorKind::RequiredFieldMissing,
            Self::UnknownSubcommand { .. } => ErrorKind::UnknownSubcommand,
            Self::HelpRequested { .. } => ErrorKind::HelpRequested,
            Self::VersionRequested => ErrorKind::VersionRequested,
        }
    }

    /// Returns `true` for errors raised while building a schema, which point
    /// at the program's declarations rather than at the user's input.
    pub fn is_declaration_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::InvalidDestination
                | ErrorKind::InvalidFieldTag
                | ErrorKind::UnsupportedType
                | ErrorKind::DuplicateFlag
                | ErrorKind::DuplicateSubcommand
        )
    }
}

/// Convenience alias for results with [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
