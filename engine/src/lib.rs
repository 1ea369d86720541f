//! Declarative command-line argument binding.
//!
//! Declare a record with [`record!`], build a [`Parser`] for it, and parse
//! an argument vector into an instance. Subcommands are [`Subcommand`]
//! fields holding their own records; they can be nested and matched
//! without regard to case.
//!
//! A flag may appear anywhere on the command line. It belongs to the
//! innermost active command declaring it, so a subcommand inherits its
//! ancestors' flags and shadows the ones it redeclares. Values come from
//! the command line, then the environment, then declared defaults.
//!
//! # Example
//!
//! ```
//! use argbind::{Parser, ParserConfig, Subcommand, record};
//!
//! record! {
//!     #[derive(Debug, Default)]
//!     pub struct Child {
//!         #[arg(tag = "-c", default = "1")]
//!         pub count: i64,
//!     }
//! }
//!
//! record! {
//!     #[derive(Debug, Default)]
//!     pub struct Root {
//!         #[arg(tag = "-v")]
//!         pub verbose: bool,
//!         #[arg(tag = "-p")]
//!         pub prefix: Option<String>,
//!         #[arg(tag = "subcommand")]
//!         pub child: Subcommand<Child>,
//!     }
//! }
//!
//! let parser = Parser::new::<Root>(ParserConfig::default()).unwrap();
//! let mut root = Root::default();
//! let args: Vec<String> = ["child", "-vpc", "9000"].iter().map(|s| s.to_string()).collect();
//! let invocation = parser.parse(&mut root, &args).unwrap();
//!
//! // `-p` takes an optional value, so it swallows the rest of the group.
//! assert!(root.verbose);
//! assert_eq!(root.prefix.as_deref(), Some("c"));
//! assert_eq!(root.child.get().unwrap().count, 1);
//! assert_eq!(invocation.unconsumed, vec!["9000"]);
//! ```

pub mod config;
pub mod env;
pub mod help;
pub mod output;
pub mod parser;
mod populate;
pub mod report;
mod resolve;

pub use argbind_core::{
    Bind, Element, Error, ErrorKind, FieldDecl, Record, Result, Schema, Slot, Subcommand, Value,
    custom_value, record,
};
pub use argbind_lexer::Lexer;
pub use config::ParserConfig;
pub use env::{EnvSource, ProcessEnv};
pub use parser::{Parser, must_parse, parse};
pub use resolve::Invocation;
