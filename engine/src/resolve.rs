//! Flag ownership resolution across a subcommand chain.
//!
//! Resolution runs in three steps over the whole argument vector:
//!
//! 1. **Dispatch.** Tokenize with the flag table of the current chain and
//!    take the first bare word (after the previous subcommand word) naming
//!    a subcommand of the innermost level, ignoring case. Repeat one level
//!    deeper until no word matches.
//! 2. **Ownership.** Tokenize once more with the merged table of the final
//!    chain. A subcommand word that this pass reads as a flag value fails
//!    the parse. Every flag belongs to the innermost level declaring it; the
//!    tokenizer already decided how much of a compacted group each flag
//!    consumed, so `-vpc` with a parent's optional `-p` gives `p = "c"`.
//! 3. **Filling.** Bare words (minus subcommand words) fill the innermost
//!    level's positionals; then environment values, defaults and required
//!    checks run innermost level first, ancestors after.

use argbind_core::{
    Error, FlagTable, FlagTarget, LexError, Record, Result, Schema, Slot, Token, Tokenize,
    check_destination,
};
use serde::Serialize;
use tracing::{debug, trace};

use crate::config::ParserConfig;
use crate::env::EnvSource;
use crate::populate::{Touched, apply_defaults, apply_env, store_raw, validate_required};

/// Outcome of a successful parse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Invocation {
    /// Canonical names of the dispatched subcommands, outermost first.
    pub path: Vec<String>,
    /// Bare arguments no positional field took, in order.
    pub unconsumed: Vec<String>,
}

/// One dispatched subcommand.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Hop {
    /// Field of the parent record holding the subcommand slot.
    field: String,
    /// Canonical subcommand name.
    name: String,
    /// Index of the subcommand word in the argument vector.
    index: usize,
}

/// Everything one resolution needs besides the destination and arguments.
pub(crate) struct Resolver<'a> {
    pub(crate) root: &'a Schema,
    pub(crate) config: &'a ParserConfig,
    pub(crate) tokenizer: &'a dyn Tokenize,
    pub(crate) env: &'a dyn EnvSource,
}

impl<'a> Resolver<'a> {
    pub(crate) fn resolve(&self, dest: &mut dyn Record, args: &[String]) -> Result<Invocation> {
        let (chain, hops) = self.dispatch(args)?;
        prepare(&chain, &hops, dest)?;

        let table = self.table(&chain)?;
        let innermost = chain.len() - 1;
        let mut touched = Touched::default();
        let mut words = Vec::new();

        let tokens = self.tokenizer.tokenize(&table, args);
        self.check_hops(&table, &tokens, &hops, args)?;

        for item in tokens {
            match item.map_err(lex_error)? {
                Token::Positional { index, text } => {
                    if !hops.iter().any(|hop| hop.index == index) {
                        words.push(text);
                    }
                }
                Token::Flag { name, value } => {
                    let Some(entry) = table.entry(&name) else {
                        return Err(Error::UnknownFlag {
                            token: name.to_string(),
                        });
                    };
                    match entry.target {
                        FlagTarget::Help => {
                            return Err(Error::HelpRequested {
                                path: hops.iter().map(|hop| hop.name.clone()).collect(),
                            });
                        }
                        FlagTarget::Version => return Err(Error::VersionRequested),
                        FlagTarget::Field(index) => {
                            let level = chain[entry.depth];
                            let field = &level.fields[index];
                            trace!(
                                flag = %name,
                                owner = %level.command,
                                depth = entry.depth,
                                field = %field.name,
                                "resolved flag owner"
                            );
                            let record = locate(dest, &hops[..entry.depth])
                                .ok_or_else(|| missing_level(level))?;
                            store_raw(level, record, field, value.as_deref())?;
                            touched.mark(entry.depth, index);
                        }
                    }
                }
            }
        }

        let unconsumed = {
            let level = chain[innermost];
            let record = locate(dest, &hops).ok_or_else(|| missing_level(level))?;
            fill_positionals(level, innermost, record, &table, words, &mut touched)?
        };

        for depth in (0..chain.len()).rev() {
            let level = chain[depth];
            let record = locate(dest, &hops[..depth]).ok_or_else(|| missing_level(level))?;
            apply_env(level, depth, record, &mut touched, self.config, self.env)?;
            apply_defaults(level, depth, record, &mut touched, self.config)?;
        }
        for depth in (0..chain.len()).rev() {
            let level = chain[depth];
            let record = locate(dest, &hops[..depth]).ok_or_else(|| missing_level(level))?;
            validate_required(level, depth, record, &touched, self.config)?;
        }

        let path: Vec<String> = hops.into_iter().map(|hop| hop.name).collect();
        debug!(path = ?path, unconsumed = unconsumed.len(), "resolution finished");
        Ok(Invocation { path, unconsumed })
    }

    fn table(&self, chain: &[&Schema]) -> Result<FlagTable> {
        FlagTable::merged(
            chain,
            self.config.strict_subcommands,
            self.config.version.is_some(),
        )
    }

    /// Every subcommand word must still be a bare word under the final
    /// table. A deeper level can give a flag a value where dispatch saw
    /// none, and that flag would otherwise swallow the subcommand word.
    fn check_hops(
        &self,
        table: &FlagTable,
        tokens: &[std::result::Result<Token, LexError>],
        hops: &[Hop],
        args: &[String],
    ) -> Result<()> {
        for hop in hops {
            let bare = tokens
                .iter()
                .any(|item| matches!(item, Ok(Token::Positional { index, .. }) if *index == hop.index));
            if bare {
                continue;
            }
            debug!(subcommand = %hop.name, index = hop.index, "subcommand word taken as a flag value");
            let before = self.tokenizer.tokenize(table, &args[..hop.index]);
            return Err(match before.into_iter().find_map(|item| item.err()) {
                Some(err) => lex_error(err),
                None => Error::UnknownSubcommand {
                    name: args[hop.index].clone(),
                },
            });
        }
        Ok(())
    }

    /// Walks subcommand words down the tree. Unknown input is skipped here;
    /// the ownership pass reports it.
    fn dispatch(&self, args: &[String]) -> Result<(Vec<&'a Schema>, Vec<Hop>)> {
        let mut chain = vec![self.root];
        let mut hops: Vec<Hop> = Vec::new();

        loop {
            let level = chain[chain.len() - 1];
            if level.subcommands.is_empty() {
                break;
            }
            let table = self.table(&chain)?;
            let after = hops.last().map(|hop| hop.index);

            let found = self
                .tokenizer
                .tokenize(&table, args)
                .into_iter()
                .filter_map(|item| match item {
                    Ok(Token::Positional { index, text }) if after.is_none_or(|a| index > a) => {
                        Some((index, text))
                    }
                    _ => None,
                })
                .find_map(|(index, text)| {
                    level
                        .find_subcommand(&text)
                        .map(|entry| (index, text, entry))
                });

            let Some((index, word, entry)) = found else {
                break;
            };
            debug!(
                command = %level.command,
                word = %word,
                subcommand = %entry.name,
                index,
                "dispatching subcommand"
            );
            hops.push(Hop {
                field: entry.field.clone(),
                name: entry.name.clone(),
                index,
            });
            chain.push(&entry.schema);
        }

        Ok((chain, hops))
    }
}

/// Allocates the subcommand records along the dispatched path and checks
/// each level's destination against its schema.
fn prepare(chain: &[&Schema], hops: &[Hop], dest: &mut dyn Record) -> Result<()> {
    check_destination(chain[0], dest)?;
    let Some((hop, rest)) = hops.split_first() else {
        return Ok(());
    };
    match dest.slot(&hop.field) {
        Some(Slot::Subcommand(slot)) => prepare(&chain[1..], rest, slot.invoke()),
        _ => Err(missing_level(chain[0])),
    }
}

/// Follows invoked subcommand slots from `dest` along `hops`.
fn locate<'d>(dest: &'d mut dyn Record, hops: &[Hop]) -> Option<&'d mut dyn Record> {
    let Some((hop, rest)) = hops.split_first() else {
        return Some(dest);
    };
    match dest.slot(&hop.field)? {
        Slot::Subcommand(slot) => locate(slot.record_mut()?, rest),
        Slot::Value(_) => None,
    }
}

fn missing_level(level: &Schema) -> Error {
    Error::InvalidDestination {
        record: level.command.clone(),
        reason: "subcommand record is not reachable".to_string(),
    }
}

fn lex_error(err: LexError) -> Error {
    match err {
        LexError::Unrecognized { text } => Error::UnknownFlag { token: text },
        LexError::MissingValue { flag } => Error::MissingArgument {
            flag: flag.to_string(),
        },
    }
}

/// Assigns bare words to the level's positional fields and returns the rest.
fn fill_positionals(
    level: &Schema,
    depth: usize,
    record: &mut dyn Record,
    table: &FlagTable,
    words: Vec<String>,
    touched: &mut Touched,
) -> Result<Vec<String>> {
    let mut words = words.into_iter();

    for &index in table.positionals() {
        let field = &level.fields[index];
        if field.value_type.is_sequence() {
            let mut taken = 0;
            for word in words.by_ref() {
                store_raw(level, record, field, Some(&word))?;
                touched.mark(depth, index);
                taken += 1;
            }
            if taken == 0 && field.required {
                return Err(Error::MissingPositional {
                    field: field.placeholder.clone(),
                });
            }
        } else if let Some(word) = words.next() {
            store_raw(level, record, field, Some(&word))?;
            touched.mark(depth, index);
        } else if field.required {
            return Err(Error::MissingPositional {
                field: field.placeholder.clone(),
            });
        }
    }

    let unconsumed: Vec<String> = words.collect();
    if let Some(first) = unconsumed.first() {
        if !level.subcommands.is_empty() && table.positionals().is_empty() {
            return Err(Error::UnknownSubcommand {
                name: first.clone(),
            });
        }
        trace!(command = %level.command, count = unconsumed.len(), "unconsumed arguments");
    }
    Ok(unconsumed)
}
