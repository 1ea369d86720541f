//! Flag lookup tables.
//!
//! A [`FlagTable`] maps every short and long flag name visible at a point of
//! the command chain to the level and field that owns it. Building a table
//! also checks one level's declarations: duplicate flag names and
//! positional ordering.
//!
//! # Examples
//!
//! ```
//! use argbind_core::*;
//!
//! let mut schema = Schema::new("app");
//! let mut verbose = FieldSpec::new("verbose", ValueType::Bool);
//! verbose.short = Some('v');
//! schema.fields.push(verbose);
//!
//! let table = FlagTable::build(&schema, 0, false).unwrap();
//! assert_eq!(table.short_arity('v'), Some(Arity::None));
//! assert_eq!(table.long_arity("help"), Some(Arity::None));
//! assert!(table.long_arity("version").is_none());
//! ```

use std::collections::HashMap;

use crate::{Arity, Error, FlagName, Result, Schema};

/// What a flag name resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagTarget {
    /// Index into the owning level's `fields`.
    Field(usize),
    /// Built-in `-h`/`--help`.
    Help,
    /// Built-in `--version` (root only, when a version is configured).
    Version,
}

/// One registered flag name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagEntry {
    /// Chain depth of the owning level; the root is 0.
    pub depth: usize,
    pub target: FlagTarget,
    pub arity: Arity,
}

/// Flag names visible at one point of the command chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagTable {
    short: HashMap<char, FlagEntry>,
    long: HashMap<String, FlagEntry>,
    positionals: Vec<usize>,
}

impl FlagTable {
    /// Builds the table of a single level.
    ///
    /// Built-in flags are registered after the fields and only under names
    /// the fields left free, so a field may take over `-h` or `--help`.
    pub fn build(schema: &Schema, depth: usize, version: bool) -> Result<Self> {
        let mut table = Self::declared(schema, depth)?;
        table.add_builtins(depth, version.then_some(depth));
        Ok(table)
    }

    /// Declared fields of one level, without built-ins.
    fn declared(schema: &Schema, depth: usize) -> Result<Self> {
        let mut table = Self::default();

        for (index, field) in schema.fields.iter().enumerate() {
            if field.positional {
                table.positionals.push(index);
                continue;
            }
            let entry = FlagEntry {
                depth,
                target: FlagTarget::Field(index),
                arity: field.arity(),
            };
            if let Some(c) = field.short {
                if table.short.insert(c, entry).is_some() {
                    return Err(duplicate(schema, FlagName::Short(c)));
                }
            }
            if let Some(long) = &field.long {
                if table.long.insert(long.clone(), entry).is_some() {
                    return Err(duplicate(schema, FlagName::Long(long.clone())));
                }
            }
        }

        check_positionals(schema)?;
        Ok(table)
    }

    /// Registers `-h`/`--help` at `help_depth` and `--version` at
    /// `version_depth` under the names still free.
    fn add_builtins(&mut self, help_depth: usize, version_depth: Option<usize>) {
        let builtin = |depth, target| FlagEntry {
            depth,
            target,
            arity: Arity::None,
        };
        self.short
            .entry('h')
            .or_insert(builtin(help_depth, FlagTarget::Help));
        self.long
            .entry("help".to_string())
            .or_insert(builtin(help_depth, FlagTarget::Help));
        if let Some(depth) = version_depth {
            self.long
                .entry("version".to_string())
                .or_insert(builtin(depth, FlagTarget::Version));
        }
    }

    /// Builds the table seen by the innermost level of `chain`.
    ///
    /// Every name goes to the innermost level declaring it; ancestors only
    /// fill names no deeper level registered. Built-in help belongs to the
    /// innermost level and `--version` to the root, and both only take names
    /// no level of the chain declares. With `strict` set only the innermost
    /// level's own flags are visible.
    ///
    /// # Examples
    ///
    /// ```
    /// use argbind_core::*;
    ///
    /// let flag = |name: &str, c: char| {
    ///     let mut f = FieldSpec::new(name, ValueType::Bool);
    ///     f.short = Some(c);
    ///     f
    /// };
    /// let mut root = Schema::new("app");
    /// root.fields.push(flag("verbose", 'v'));
    /// root.fields.push(flag("quiet", 'q'));
    /// let mut child = Schema::new("child");
    /// child.fields.push(flag("vacuum", 'v'));
    ///
    /// let table = FlagTable::merged(&[&root, &child], false, false).unwrap();
    /// assert_eq!(table.entry(&FlagName::Short('v')).unwrap().depth, 1);
    /// assert_eq!(table.entry(&FlagName::Short('q')).unwrap().depth, 0);
    ///
    /// let strict = FlagTable::merged(&[&root, &child], true, false).unwrap();
    /// assert!(strict.entry(&FlagName::Short('q')).is_none());
    /// ```
    pub fn merged(chain: &[&Schema], strict: bool, version: bool) -> Result<Self> {
        let Some(innermost) = chain.len().checked_sub(1) else {
            return Ok(Self::default());
        };
        let mut table = Self::declared(chain[innermost], innermost)?;
        if strict {
            table.add_builtins(innermost, (version && innermost == 0).then_some(0));
            return Ok(table);
        }

        for depth in (0..innermost).rev() {
            let outer = Self::declared(chain[depth], depth)?;
            for (c, entry) in outer.short {
                table.short.entry(c).or_insert(entry);
            }
            for (name, entry) in outer.long {
                table.long.entry(name).or_insert(entry);
            }
        }
        table.add_builtins(innermost, version.then_some(0));

        Ok(table)
    }

    /// Builds every level of a command tree once, surfacing declaration
    /// errors before any argument is parsed.
    pub fn check_tree(schema: &Schema, version: bool) -> Result<()> {
        Self::build(schema, 0, version)?;
        let mut pending: Vec<&Schema> = schema.subcommands.iter().map(|s| &s.schema).collect();
        while let Some(level) = pending.pop() {
            Self::build(level, 1, false)?;
            pending.extend(level.subcommands.iter().map(|s| &s.schema));
        }
        Ok(())
    }

    pub fn entry(&self, name: &FlagName) -> Option<&FlagEntry> {
        match name {
            FlagName::Short(c) => self.short.get(c),
            FlagName::Long(long) => self.long.get(long),
        }
    }

    /// Field indices of the positional fields of the level the table was
    /// built for (the innermost one for merged tables), in declaration order.
    pub fn positionals(&self) -> &[usize] {
        &self.positionals
    }

    pub fn short_arity(&self, c: char) -> Option<Arity> {
        self.short.get(&c).map(|e| e.arity)
    }

    pub fn long_arity(&self, name: &str) -> Option<Arity> {
        self.long.get(name).map(|e| e.arity)
    }

    pub fn len(&self) -> usize {
        self.short.len() + self.long.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn duplicate(schema: &Schema, name: FlagName) -> Error {
    Error::DuplicateFlag {
        command: schema.command.clone(),
        name: name.to_string(),
    }
}

fn check_positionals(schema: &Schema) -> Result<()> {
    let positionals: Vec<_> = schema.positionals().collect();
    let mut seen_optional = false;
    for (i, field) in positionals.iter().enumerate() {
        if field.value_type.is_sequence() && i + 1 != positionals.len() {
            return Err(Error::InvalidFieldTag {
                field: field.name.clone(),
                tag: "positional".to_string(),
                reason: "only the last positional field may repeat".to_string(),
            });
        }
        if field.required && seen_optional {
            return Err(Error::InvalidFieldTag {
                field: field.name.clone(),
                tag: "positional,required".to_string(),
                reason: "required positional follows an optional one".to_string(),
            });
        }
        seen_optional |= !field.required;
    }
    Ok(())
}
