//! Core types for declarative command-line argument binding.
//!
//! This crate defines everything the resolution engine and a tokenizer
//! share:
//!
//! - [`Record`], [`Bind`], [`Value`]: how a destination struct exposes its
//!   fields, usually generated by [`record!`].
//! - [`Schema`], [`FieldSpec`], [`SubcommandEntry`]: the command tree
//!   produced by [`extract`].
//! - [`FlagTable`]: per-level flag lookup with duplicate detection and the
//!   innermost-wins merge over a command chain.
//! - [`convert`]: text to typed value conversion.
//! - [`Tokenize`]: the contract a tokenizer implements.
//! - [`Error`]: every failure the binder can report.
//!
//! # Example
//!
//! ```
//! use argbind_core::*;
//!
//! record! {
//!     #[derive(Debug, Default)]
//!     pub struct Serve {
//!         #[arg(tag = "-p,--port", default = "8080")]
//!         pub port: u16,
//!     }
//! }
//!
//! record! {
//!     #[derive(Debug, Default)]
//!     pub struct Cli {
//!         /// Enable verbose output
//!         #[arg(tag = "-v,--verbose")]
//!         pub verbose: bool,
//!         #[arg(tag = "subcommand")]
//!         pub serve: Subcommand<Serve>,
//!     }
//! }
//!
//! let schema = extract::<Cli>("mycli").unwrap();
//! assert_eq!(schema.find_subcommand("SERVE").unwrap().name, "serve");
//! assert!(schema.find_flag(&FlagName::Long("verbose".into())).is_some());
//!
//! let chain = schema.chain(&["serve".to_string()]).unwrap();
//! let table = FlagTable::merged(&chain, false, false).unwrap();
//! assert_eq!(table.short_arity('p'), Some(Arity::Required));
//! assert_eq!(table.short_arity('v'), Some(Arity::None));
//! ```

mod convert;
mod error;
mod extract;
mod record;
mod table;
mod token;
mod types;

pub use convert::{ConvertFailure, convert, split_list};
pub use error::{Error, ErrorKind, Result};
pub use extract::{MAX_DEPTH, check_destination, extract};
pub use record::{Bind, Element, FieldDecl, Record, Shape, Slot, Subcommand, SubcommandSlot, Value};
pub use table::{FlagEntry, FlagTable, FlagTarget};
pub use token::{LexError, Token, Tokenize};
pub use types::*;
