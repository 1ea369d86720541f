//! Schema extraction from record declarations.
//!
//! [`extract`] walks a record type's [`FieldDecl`]s, parses each field's
//! `arg` tag and produces the [`Schema`] tree the engine resolves against.
//! Extraction only looks at types, never at a destination instance.
//!
//! # Examples
//!
//! ```
//! use argbind_core::{extract, record, Subcommand};
//!
//! record! {
//!     #[derive(Default)]
//!     struct Remove {
//!         #[arg(tag = "positional,required")]
//!         path: String,
//!     }
//! }
//!
//! record! {
//!     #[derive(Default)]
//!     struct App {
//!         #[arg(tag = "-v,--verbose")]
//!         verbose: bool,
//!         #[arg(tag = "env:APP_TOKEN")]
//!         api_token: String,
//!         #[arg(tag = "subcommand:remove|rm")]
//!         remove: Subcommand<Remove>,
//!     }
//! }
//!
//! let schema = extract::<App>("app").unwrap();
//! assert_eq!(schema.fields.len(), 2);
//! assert_eq!(schema.fields[1].long.as_deref(), Some("api-token"));
//! assert_eq!(schema.subcommands[0].aliases, vec!["rm"]);
//! assert!(schema.find_subcommand("RM").unwrap().schema.fields[0].positional);
//! ```

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, trace};

use crate::convert::{convert, split_list};
use crate::{
    DefaultValue, Error, FieldDecl, FieldSpec, Record, Result, Schema, Shape, Slot, SubcommandEntry,
    ValueType,
};

/// Subcommand nesting deeper than this is treated as a recursive record.
pub const MAX_DEPTH: usize = 32;

static LONG_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]*$").expect("static regex must compile")
});

static ENV_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("static regex must compile")
});

/// Builds the schema tree of record type `R`, naming the root level `command`.
pub fn extract<R: Record>(command: &str) -> Result<Schema> {
    extract_level(command, R::fields(), 0)
}

/// Checks that a destination hands out a slot of the declared kind for
/// every visible field of its level.
///
/// Only the level `dest` stands for is checked; the engine checks each
/// subcommand record as it allocates it.
pub fn check_destination(schema: &Schema, dest: &mut dyn Record) -> Result<()> {
    let invalid = |reason: String| Error::InvalidDestination {
        record: schema.command.clone(),
        reason,
    };

    for field in &schema.fields {
        match dest.slot(&field.name) {
            Some(Slot::Value(_)) => {}
            Some(Slot::Subcommand(_)) => {
                return Err(invalid(format!(
                    "field {} is a subcommand slot but declared as a value",
                    field.name
                )));
            }
            None => return Err(invalid(format!("no slot for field {}", field.name))),
        }
    }
    for sub in &schema.subcommands {
        match dest.slot(&sub.field) {
            Some(Slot::Subcommand(_)) => {}
            Some(Slot::Value(_)) => {
                return Err(invalid(format!(
                    "field {} is a value but declared as a subcommand slot",
                    sub.field
                )));
            }
            None => return Err(invalid(format!("no slot for field {}", sub.field))),
        }
    }
    Ok(())
}

fn extract_level(command: &str, decls: Vec<FieldDecl>, depth: usize) -> Result<Schema> {
    if depth > MAX_DEPTH {
        return Err(Error::InvalidDestination {
            record: command.to_string(),
            reason: format!("subcommands nest deeper than {MAX_DEPTH} levels"),
        });
    }

    let mut schema = Schema::new(command);
    let mut names: HashSet<String> = HashSet::new();

    for decl in decls {
        let raw_tag = decl.tag.unwrap_or("").trim();
        if raw_tag == "-" {
            trace!(command, field = decl.name, "skipping hidden field");
            continue;
        }
        trace!(command, field = decl.name, tag = raw_tag, "parsing field tag");
        let tag = Tag::parse(decl.name, raw_tag)?;

        match &decl.shape {
            Shape::Subcommand(fields) => {
                let entry = subcommand_entry(&decl, &tag, raw_tag, *fields, depth)?;
                for name in std::iter::once(&entry.name).chain(&entry.aliases) {
                    if !names.insert(name.to_lowercase()) {
                        return Err(Error::DuplicateSubcommand {
                            command: command.to_string(),
                            name: name.clone(),
                        });
                    }
                }
                schema.subcommands.push(entry);
            }
            Shape::Value(value_type) => {
                schema
                    .fields
                    .push(field_spec(&decl, tag, raw_tag, value_type.clone())?);
            }
        }
    }

    debug!(
        command,
        depth,
        fields = schema.fields.len(),
        subcommands = schema.subcommands.len(),
        "extracted command level"
    );
    Ok(schema)
}

fn subcommand_entry(
    decl: &FieldDecl,
    tag: &Tag,
    raw_tag: &str,
    fields: fn() -> Vec<FieldDecl>,
    depth: usize,
) -> Result<SubcommandEntry> {
    let invalid = |reason: &str| invalid_tag(decl.name, raw_tag, reason);

    let Some(declared) = &tag.subcommand else {
        return Err(invalid("subcommand slots need a subcommand tag"));
    };
    if tag.short.is_some() || tag.long.is_some() || tag.positional || tag.env.is_some() {
        return Err(invalid("subcommand slots take no flag, positional or env markers"));
    }
    if decl.default.is_some() {
        return Err(invalid("subcommand slots take no default"));
    }

    let mut names = declared.clone();
    if names.is_empty() {
        names.push(decl.name.to_lowercase());
    }
    let name = names.remove(0);
    let mut schema = extract_level(&name, fields(), depth + 1)?;
    schema.description = decl.help_text();

    Ok(SubcommandEntry {
        name,
        aliases: names,
        field: decl.name.to_string(),
        required: tag.required,
        help: decl.help_text(),
        schema,
    })
}

fn field_spec(decl: &FieldDecl, tag: Tag, raw_tag: &str, value_type: ValueType) -> Result<FieldSpec> {
    let invalid = |reason: &str| invalid_tag(decl.name, raw_tag, reason);

    if tag.subcommand.is_some() {
        return Err(invalid("only Subcommand fields take a subcommand tag"));
    }
    if let ValueType::Sequence(inner) | ValueType::Optional(inner) = &value_type {
        if matches!(**inner, ValueType::Sequence(_) | ValueType::Optional(_)) {
            return Err(Error::UnsupportedType {
                field: decl.name.to_string(),
                type_name: value_type.describe(),
            });
        }
    }
    if tag.positional && (tag.short.is_some() || tag.long.is_some()) {
        return Err(invalid("positional fields take no flag names"));
    }
    if tag.required && decl.default.is_some() {
        return Err(invalid("a required field cannot have a default"));
    }

    let mut spec = FieldSpec::new(decl.name, value_type);
    spec.positional = tag.positional;
    spec.required = tag.required;
    spec.short = tag.short;
    spec.long = tag.long;
    if !spec.positional && spec.short.is_none() && spec.long.is_none() {
        spec.long = Some(decl.name.to_lowercase().replace('_', "-"));
    }
    spec.env = tag.env.map(|env| match env {
        EnvTag::Derived => decl.name.to_uppercase(),
        EnvTag::Named(var) => var,
    });
    spec.help = decl.help_text();
    if let Some(placeholder) = decl.placeholder {
        spec.placeholder = placeholder.to_string();
    }
    if let Some(raw) = decl.default {
        spec.default = Some(convert_default(&spec, raw)?);
    }

    Ok(spec)
}

fn convert_default(spec: &FieldSpec, raw: &str) -> Result<DefaultValue> {
    let parts = if spec.value_type.is_sequence() {
        split_list(raw)
    } else {
        vec![raw]
    };
    let values = parts
        .into_iter()
        .map(|part| {
            convert(part, &spec.value_type).map_err(|cause| Error::Conversion {
                field: spec.label(),
                raw: part.to_string(),
                cause,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(DefaultValue {
        raw: raw.to_string(),
        values,
    })
}

fn invalid_tag(field: &str, tag: &str, reason: &str) -> Error {
    Error::InvalidFieldTag {
        field: field.to_string(),
        tag: tag.to_string(),
        reason: reason.to_string(),
    }
}

#[derive(Debug, Default, PartialEq)]
enum EnvTag {
    #[default]
    Derived,
    Named(String),
}

/// Parsed `arg` tag of one field.
#[derive(Debug, Default, PartialEq)]
struct Tag {
    positional: bool,
    required: bool,
    short: Option<char>,
    long: Option<String>,
    /// Declared names; empty means "derive from the field name".
    subcommand: Option<Vec<String>>,
    env: Option<EnvTag>,
}

impl Tag {
    fn parse(field: &str, raw: &str) -> Result<Self> {
        let mut tag = Self::default();
        let invalid = |reason: String| invalid_tag(field, raw, &reason);

        for token in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            if token == "positional" {
                tag.positional = true;
            } else if token == "required" {
                tag.required = true;
            } else if token == "subcommand" {
                tag.subcommand = Some(Vec::new());
            } else if let Some(names) = token.strip_prefix("subcommand:") {
                let names: Vec<String> = names.split('|').map(|n| n.trim().to_string()).collect();
                if names.iter().any(|n| n.is_empty() || n.starts_with('-')) {
                    return Err(invalid(format!("bad subcommand name list {names:?}")));
                }
                tag.subcommand = Some(names);
            } else if token == "env" {
                tag.env = Some(EnvTag::Derived);
            } else if let Some(var) = token.strip_prefix("env:") {
                if !ENV_NAME.is_match(var) {
                    return Err(invalid(format!("bad environment variable name {var:?}")));
                }
                tag.env = Some(EnvTag::Named(var.to_string()));
            } else if let Some(long) = token.strip_prefix("--") {
                if !LONG_NAME.is_match(long) {
                    return Err(invalid(format!("bad long flag {token}")));
                }
                if tag.long.replace(long.to_string()).is_some() {
                    return Err(invalid("more than one long flag".to_string()));
                }
            } else if let Some(short) = token.strip_prefix('-') {
                let mut chars = short.chars();
                let c = match (chars.next(), chars.next()) {
                    (Some(c), None) if !c.is_whitespace() && c != '-' && c != '=' => c,
                    _ => {
                        return Err(invalid(format!(
                            "short flag {token} must be exactly one character"
                        )));
                    }
                };
                if tag.short.replace(c).is_some() {
                    return Err(invalid("more than one short flag".to_string()));
                }
            } else {
                return Err(invalid(format!("unknown token {token:?}")));
            }
        }

        Ok(tag)
    }
}
