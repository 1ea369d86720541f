//! The parser: a schema plus configuration, built once and reused.

use std::io::{self, Write};

use argbind_core::{FlagTable, Record, Result, Schema, Tokenize, extract};
use argbind_lexer::Lexer;
use tracing::debug;

use crate::config::ParserConfig;
use crate::env::{EnvSource, ProcessEnv};
use crate::help;
use crate::report::{EXIT_USAGE, failure_text, report};
use crate::resolve::{Invocation, Resolver};

/// Binds argument vectors to records of one type.
///
/// Building a parser extracts the record's schema and checks every level's
/// declarations, so a parser that exists can only fail on bad input. It is
/// immutable and can be shared across threads.
///
/// # Examples
///
/// ```
/// use argbind::{Parser, ParserConfig, Subcommand, record};
///
/// record! {
///     #[derive(Debug, Default)]
///     struct Server {
///         #[arg(tag = "-p,--port", default = "8080")]
///         port: u16,
///     }
/// }
///
/// record! {
///     #[derive(Debug, Default)]
///     struct App {
///         #[arg(tag = "-v,--verbose")]
///         verbose: bool,
///         #[arg(tag = "subcommand")]
///         server: Subcommand<Server>,
///     }
/// }
///
/// let parser = Parser::new::<App>(ParserConfig::default()).unwrap();
/// let mut app = App::default();
/// let args: Vec<String> = ["SERVER", "-v", "--port", "9000"].iter().map(|s| s.to_string()).collect();
/// let invocation = parser.parse(&mut app, &args).unwrap();
///
/// assert_eq!(invocation.path, vec!["server"]);
/// assert!(app.verbose);
/// assert_eq!(app.server.get().unwrap().port, 9000);
/// ```
#[derive(Debug, Clone)]
pub struct Parser<T = Lexer> {
    schema: Schema,
    config: ParserConfig,
    tokenizer: T,
}

impl Parser<Lexer> {
    /// Builds a parser for record type `R` with the default tokenizer.
    pub fn new<R: Record>(config: ParserConfig) -> Result<Self> {
        Self::with_tokenizer::<R>(config, Lexer)
    }
}

impl<T: Tokenize> Parser<T> {
    /// Builds a parser for record type `R` using `tokenizer`.
    pub fn with_tokenizer<R: Record>(config: ParserConfig, tokenizer: T) -> Result<Self> {
        let command = config
            .program
            .clone()
            .unwrap_or_else(|| program_name(std::any::type_name::<R>()));
        let mut schema = extract::<R>(&command)?;
        schema.description = config.description.clone();
        FlagTable::check_tree(&schema, config.version.is_some())?;

        debug!(
            command = %schema.command,
            fields = schema.fields.len(),
            subcommands = schema.subcommands.len(),
            "parser ready"
        );
        Ok(Self {
            schema,
            config,
            tokenizer,
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parses `args` (without the program name) into `dest`, reading the
    /// process environment for `env` fallbacks.
    ///
    /// `dest` must be a record of the type the parser was built for. On
    /// error, fields written before the failure keep their values.
    pub fn parse(&self, dest: &mut dyn Record, args: &[String]) -> Result<Invocation> {
        self.parse_with_env(dest, args, &ProcessEnv)
    }

    /// Like [`parse`](Self::parse), reading fallbacks from `env`.
    pub fn parse_with_env(
        &self,
        dest: &mut dyn Record,
        args: &[String],
        env: &dyn EnvSource,
    ) -> Result<Invocation> {
        let resolver = Resolver {
            root: &self.schema,
            config: &self.config,
            tokenizer: &self.tokenizer,
            env,
        };
        resolver.resolve(dest, args)
    }

    /// Writes the usage line of the command at `path`.
    pub fn write_usage(&self, out: &mut dyn Write, path: &[String]) -> io::Result<()> {
        writeln!(out, "{}", help::usage(&self.schema, path))
    }

    /// Writes the full help text of the command at `path`.
    pub fn write_help(&self, out: &mut dyn Write, path: &[String]) -> io::Result<()> {
        out.write_all(help::help(&self.schema, &self.config, path).as_bytes())
    }

    /// Parses the process arguments into `dest`, exiting the process on
    /// help, version, or any error.
    ///
    /// Non-UTF-8 arguments are converted lossily.
    pub fn must_parse(&self, dest: &mut dyn Record) -> Invocation {
        let args: Vec<String> = std::env::args_os()
            .skip(1)
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect();

        match self.parse(dest, &args) {
            Ok(invocation) => invocation,
            Err(err) => {
                let code = report(self, &err, &mut io::stdout(), &mut io::stderr())
                    .unwrap_or(EXIT_USAGE);
                std::process::exit(code)
            }
        }
    }
}

/// Builds a parser with the default configuration and parses `args` into `dest`.
///
/// # Examples
///
/// ```
/// use argbind::record;
///
/// record! {
///     #[derive(Default)]
///     struct Opts {
///         #[arg(tag = "-n")]
///         count: u32,
///         #[arg(tag = "positional")]
///         files: Vec<String>,
///     }
/// }
///
/// let mut opts = Opts::default();
/// argbind::parse(&mut opts, ["-n", "3", "a.txt", "b.txt"]).unwrap();
/// assert_eq!(opts.count, 3);
/// assert_eq!(opts.files, vec!["a.txt", "b.txt"]);
/// ```
pub fn parse<R, I, S>(dest: &mut R, args: I) -> Result<Invocation>
where
    R: Record,
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let parser = Parser::new::<R>(ParserConfig::default())?;
    let args: Vec<String> = args.into_iter().map(Into::into).collect();
    parser.parse(dest, &args)
}

/// Parses the process arguments into `dest` with the default configuration,
/// exiting the process on help, version, or any error.
pub fn must_parse<R: Record>(dest: &mut R) -> Invocation {
    match Parser::new::<R>(ParserConfig::default()) {
        Ok(parser) => parser.must_parse(dest),
        Err(err) => {
            let _ = io::stderr().write_all(failure_text(&Schema::default(), &err).as_bytes());
            std::process::exit(EXIT_USAGE)
        }
    }
}

/// Lower-cased last path segment of a type name, generics stripped.
fn program_name(type_name: &str) -> String {
    let base = type_name.split('<').next().unwrap_or(type_name);
    base.rsplit("::").next().unwrap_or(base).to_lowercase()
}
