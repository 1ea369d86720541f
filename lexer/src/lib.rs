//! getopt-style tokenizer for argbind.
//!
//! [`Lexer`] implements [`Tokenize`]: it walks an argument vector once,
//! consulting a [`FlagTable`] for each flag's arity, and yields one
//! [`Token`] per flag or bare argument.
//!
//! Recognized forms:
//!
//! - `-v`, `-vd` (grouped switches), `-pVALUE`, `-p=VALUE`, `-p VALUE`
//! - `--name`, `--name=VALUE`, `--name VALUE`
//! - `--` ends flag parsing; everything after it is positional
//! - a lone `-`, and `-5` when no `-5` flag is declared, are positional
//!
//! A flag with an optional value only takes it when attached (`-pVAL`,
//! `--prefix=VAL`). In a group, such a flag consumes whatever follows it,
//! so with `-v` a switch and `-p` optional, `-vpc` is `-v` then `-p c`.
//!
//! # Examples
//!
//! ```
//! use argbind_core::{FieldSpec, FlagName, FlagTable, Schema, Token, Tokenize, ValueType};
//! use argbind_lexer::Lexer;
//!
//! let mut schema = Schema::new("app");
//! let mut verbose = FieldSpec::new("verbose", ValueType::Bool);
//! verbose.short = Some('v');
//! let mut prefix = FieldSpec::new("prefix", ValueType::Optional(Box::new(ValueType::String)));
//! prefix.short = Some('p');
//! schema.fields.extend([verbose, prefix]);
//!
//! let table = FlagTable::build(&schema, 0, false).unwrap();
//! let args: Vec<String> = ["-vpc", "9000"].iter().map(|s| s.to_string()).collect();
//! let tokens: Vec<Token> = Lexer.tokenize(&table, &args).into_iter().map(Result::unwrap).collect();
//!
//! assert_eq!(tokens, vec![
//!     Token::Flag { name: FlagName::Short('v'), value: None },
//!     Token::Flag { name: FlagName::Short('p'), value: Some("c".into()) },
//!     Token::Positional { index: 1, text: "9000".into() },
//! ]);
//! ```

use argbind_core::{Arity, FlagName, FlagTable, LexError, Token, Tokenize};
use tracing::trace;

/// The default tokenizer.
#[derive(Debug, Clone, Copy, Default)]
pub struct Lexer;

impl Tokenize for Lexer {
    fn tokenize(&self, table: &FlagTable, args: &[String]) -> Vec<Result<Token, LexError>> {
        Tokens::new(table, args).collect()
    }
}

/// Streaming token iterator over one argument vector.
///
/// Errors are yielded in place; iteration continues with the next argument
/// (an unknown character drops the rest of its group).
#[derive(Debug, Clone)]
pub struct Tokens<'a> {
    table: &'a FlagTable,
    args: &'a [String],
    /// Index of the next argument to read.
    pos: usize,
    /// Unprocessed tail of the current short flag group.
    group: Option<&'a str>,
    /// Seen `--`.
    ended: bool,
}

impl<'a> Tokens<'a> {
    pub fn new(table: &'a FlagTable, args: &'a [String]) -> Self {
        Self {
            table,
            args,
            pos: 0,
            group: None,
            ended: false,
        }
    }

    /// Takes the next whole argument as a value.
    fn take_next(&mut self) -> Option<String> {
        let value = self.args.get(self.pos)?.clone();
        self.pos += 1;
        Some(value)
    }

    fn long(&mut self, body: &'a str) -> Result<Token, LexError> {
        let (name, attached) = match body.split_once('=') {
            Some((name, value)) => (name, Some(value.to_string())),
            None => (body, None),
        };
        let flag = FlagName::Long(name.to_string());

        let value = match self.table.long_arity(name) {
            None => {
                trace!(flag = %flag, "unrecognized long flag");
                return Err(LexError::Unrecognized {
                    text: flag.to_string(),
                });
            }
            Some(Arity::None | Arity::Optional) => attached,
            Some(Arity::Required) => match attached {
                Some(value) => Some(value),
                None => Some(self.take_next().ok_or(LexError::MissingValue { flag: flag.clone() })?),
            },
        };

        Ok(Token::Flag { name: flag, value })
    }

    fn short(&mut self, group: &'a str) -> Option<Result<Token, LexError>> {
        let mut chars = group.chars();
        let c = chars.next()?;
        let tail = chars.as_str();
        let attached = || tail.strip_prefix('=').unwrap_or(tail).to_string();

        let value = match self.table.short_arity(c) {
            None => {
                trace!(flag = %c, rest = tail, "unrecognized short flag");
                return Some(Err(LexError::Unrecognized {
                    text: format!("-{c}"),
                }));
            }
            Some(Arity::None) => {
                if !tail.is_empty() {
                    self.group = Some(tail);
                }
                None
            }
            Some(Arity::Optional) => (!tail.is_empty()).then(attached),
            Some(Arity::Required) if !tail.is_empty() => Some(attached()),
            Some(Arity::Required) => match self.take_next() {
                Some(value) => Some(value),
                None => {
                    return Some(Err(LexError::MissingValue {
                        flag: FlagName::Short(c),
                    }));
                }
            },
        };

        Some(Ok(Token::Flag {
            name: FlagName::Short(c),
            value,
        }))
    }

    /// `-` alone and `-<digit>` with no matching short flag are values.
    fn is_bare_dash(&self, shorts: &str) -> bool {
        match shorts.chars().next() {
            None => true,
            Some(c) => c.is_ascii_digit() && self.table.short_arity(c).is_none(),
        }
    }
}

impl Iterator for Tokens<'_> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(group) = self.group.take() {
                match self.short(group) {
                    Some(item) => return Some(item),
                    None => continue,
                }
            }

            let args = self.args;
            let index = self.pos;
            let arg = args.get(index)?;
            self.pos += 1;

            if self.ended {
                return Some(Ok(positional(index, arg)));
            }
            if arg == "--" {
                self.ended = true;
                continue;
            }
            if let Some(body) = arg.strip_prefix("--") {
                return Some(self.long(body));
            }
            match arg.strip_prefix('-') {
                Some(shorts) if !self.is_bare_dash(shorts) => self.group = Some(shorts),
                _ => return Some(Ok(positional(index, arg))),
            }
        }
    }
}

fn positional(index: usize, text: &str) -> Token {
    Token::Positional {
        index,
        text: text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argbind_core::{FieldSpec, Schema, ValueType};

    fn table() -> FlagTable {
        let mut schema = Schema::new("app");
        let fields = [
            ("verbose", 'v', "verbose", ValueType::Bool),
            ("debug", 'd', "debug", ValueType::Bool),
            (
                "prefix",
                'p',
                "prefix",
                ValueType::Optional(Box::new(ValueType::String)),
            ),
            ("count", 'c', "count", ValueType::Int { bits: 64 }),
            ("one", '1', "one", ValueType::Bool),
        ];
        for (name, short, long, vt) in fields {
            let mut field = FieldSpec::new(name, vt);
            field.short = Some(short);
            field.long = Some(long.to_string());
            schema.fields.push(field);
        }
        FlagTable::build(&schema, 0, false).unwrap()
    }

    fn lex(args: &[&str]) -> Vec<Result<Token, LexError>> {
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        Lexer.tokenize(&table(), &args)
    }

    fn flag(name: FlagName, value: Option<&str>) -> Result<Token, LexError> {
        Ok(Token::Flag {
            name,
            value: value.map(str::to_string),
        })
    }

    fn short(c: char, value: Option<&str>) -> Result<Token, LexError> {
        flag(FlagName::Short(c), value)
    }

    fn long(name: &str, value: Option<&str>) -> Result<Token, LexError> {
        flag(FlagName::Long(name.to_string()), value)
    }

    fn pos(index: usize, text: &str) -> Result<Token, LexError> {
        Ok(positional(index, text))
    }

    #[test]
    fn test_grouped_switches() {
        assert_eq!(lex(&["-vd"]), vec![short('v', None), short('d', None)]);
    }

    #[test]
    fn test_optional_short_consumes_rest_of_group() {
        assert_eq!(
            lex(&["-vpc", "9000"]),
            vec![short('v', None), short('p', Some("c")), pos(1, "9000")]
        );
        assert_eq!(lex(&["-p=x"]), vec![short('p', Some("x"))]);
        assert_eq!(lex(&["-p", "x"]), vec![short('p', None), pos(1, "x")]);
    }

    #[test]
    fn test_required_short_takes_rest_or_next() {
        assert_eq!(lex(&["-c5"]), vec![short('c', Some("5"))]);
        assert_eq!(lex(&["-vc=5"]), vec![short('v', None), short('c', Some("5"))]);
        assert_eq!(lex(&["-c", "-v"]), vec![short('c', Some("-v"))]);
        assert_eq!(
            lex(&["-vc"]),
            vec![
                short('v', None),
                Err(LexError::MissingValue {
                    flag: FlagName::Short('c')
                })
            ]
        );
    }

    #[test]
    fn test_long_forms() {
        assert_eq!(lex(&["--count=3"]), vec![long("count", Some("3"))]);
        assert_eq!(lex(&["--count", "3"]), vec![long("count", Some("3"))]);
        assert_eq!(lex(&["--verbose=false"]), vec![long("verbose", Some("false"))]);
        assert_eq!(lex(&["--prefix", "x"]), vec![long("prefix", None), pos(1, "x")]);
        assert_eq!(lex(&["--prefix="]), vec![long("prefix", Some(""))]);
        assert_eq!(
            lex(&["--count"]),
            vec![Err(LexError::MissingValue {
                flag: FlagName::Long("count".into())
            })]
        );
    }

    #[test]
    fn test_unknown_flags_reported_and_skipped() {
        assert_eq!(
            lex(&["--port=9000", "-vxd", "rest"]),
            vec![
                Err(LexError::Unrecognized {
                    text: "--port".into()
                }),
                short('v', None),
                Err(LexError::Unrecognized { text: "-x".into() }),
                pos(2, "rest"),
            ]
        );
    }

    #[test]
    fn test_separator_and_bare_dashes() {
        assert_eq!(
            lex(&["-", "--", "-v", "--count"]),
            vec![pos(0, "-"), pos(2, "-v"), pos(3, "--count")]
        );
    }

    #[test]
    fn test_negative_numbers_are_positional_unless_declared() {
        assert_eq!(lex(&["-5"]), vec![pos(0, "-5")]);
        assert_eq!(lex(&["-1"]), vec![short('1', None)]);
        assert_eq!(lex(&["-c", "-5"]), vec![short('c', Some("-5"))]);
    }

    #[test]
    fn test_positional_indices_track_argv() {
        assert_eq!(
            lex(&["a", "-c", "1", "b"]),
            vec![pos(0, "a"), short('c', Some("1")), pos(3, "b")]
        );
    }
}
