//! Failure rendering and exit codes.
//!
//! [`report`] turns a parse [`Error`] into what a command-line program
//! prints: help and version text on stdout, everything else as an error
//! line plus usage on stderr.

use std::io::{self, Write};

use argbind_core::{Error, ErrorKind, Schema, Tokenize};

use crate::help::usage;
use crate::parser::Parser;

/// Exit code after printing help or version.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code for invalid command lines and invalid declarations.
pub const EXIT_USAGE: i32 = 2;

/// Exit code a command-line program should use for `err`.
///
/// # Examples
///
/// ```
/// use argbind::report::{EXIT_SUCCESS, EXIT_USAGE, exit_code};
/// use argbind::Error;
///
/// assert_eq!(exit_code(&Error::VersionRequested), EXIT_SUCCESS);
/// assert_eq!(exit_code(&Error::UnknownFlag { token: "-x".into() }), EXIT_USAGE);
/// ```
pub fn exit_code(err: &Error) -> i32 {
    match err.kind() {
        ErrorKind::HelpRequested | ErrorKind::VersionRequested => EXIT_SUCCESS,
        _ => EXIT_USAGE,
    }
}

/// Text printed to stderr for a failed parse.
pub fn failure_text(root: &Schema, err: &Error) -> String {
    if err.is_declaration_error() {
        return format!("error: {err}\n");
    }
    format!(
        "error: {err}\n\n{}\n\nFor more information, try '--help'.\n",
        usage(root, &[])
    )
}

/// Prints the outcome of a failed parse and returns the exit code.
pub fn report<T: Tokenize>(
    parser: &Parser<T>,
    err: &Error,
    out: &mut dyn Write,
    err_out: &mut dyn Write,
) -> io::Result<i32> {
    match err {
        Error::HelpRequested { path } => parser.write_help(out, path)?,
        Error::VersionRequested => {
            let version = parser.config().version.as_deref().unwrap_or_default();
            writeln!(out, "{} {version}", parser.schema().command)?;
        }
        other => err_out.write_all(failure_text(parser.schema(), other).as_bytes())?,
    }
    Ok(exit_code(err))
}
