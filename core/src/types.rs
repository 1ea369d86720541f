//! Schema type definitions for declared command trees.
//!
//! This module defines the data model the extractor produces and the
//! resolution engine walks. The types are designed for serialization with
//! [`serde`] so a schema can be exported as JSON or YAML for tooling.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Semantic type of a bound field.
///
/// Derived from the Rust type of the field through
/// [`Element::value_type`](crate::Element::value_type); drives both the
/// converter and the flag's [`Arity`].
///
/// # Examples
///
/// ```
/// use argbind_core::{Arity, ValueType};
///
/// assert_eq!(ValueType::Bool.arity(), Arity::None);
/// assert_eq!(ValueType::Int { bits: 32 }.arity(), Arity::Required);
/// assert_eq!(ValueType::Optional(Box::new(ValueType::String)).arity(), Arity::Optional);
/// assert_eq!(ValueType::Optional(Box::new(ValueType::Bool)).arity(), Arity::None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueType {
    /// Boolean switch.
    Bool,
    /// Text, taken as-is.
    String,
    /// Signed integer of the given bit width.
    Int { bits: u8 },
    /// Unsigned integer of the given bit width.
    Uint { bits: u8 },
    /// Floating point number of the given bit width.
    Float { bits: u8 },
    /// A type that parses itself (see [`custom_value!`](crate::custom_value)).
    Custom(String),
    /// Repeatable value; every occurrence appends one element.
    Sequence(Box<ValueType>),
    /// Value whose absence is distinguishable from its zero value.
    Optional(Box<ValueType>),
}

impl ValueType {
    /// Returns how many argument tokens a flag of this type consumes.
    pub fn arity(&self) -> Arity {
        match self {
            Self::Bool => Arity::None,
            Self::Optional(inner) if **inner == Self::Bool => Arity::None,
            Self::Optional(_) => Arity::Optional,
            _ => Arity::Required,
        }
    }

    /// Returns the element type: the inner type of sequences and optionals.
    pub fn element(&self) -> &ValueType {
        match self {
            Self::Sequence(inner) | Self::Optional(inner) => inner,
            other => other,
        }
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self, Self::Sequence(_))
    }

    /// Short human-readable name used in help output.
    ///
    /// # Examples
    ///
    /// ```
    /// use argbind_core::ValueType;
    ///
    /// assert_eq!(ValueType::Uint { bits: 16 }.describe(), "u16");
    /// assert_eq!(ValueType::Sequence(Box::new(ValueType::String)).describe(), "[string]");
    /// ```
    pub fn describe(&self) -> String {
        match self {
            Self::Bool => "bool".to_string(),
            Self::String => "string".to_string(),
            Self::Int { bits } => format!("i{bits}"),
            Self::Uint { bits } => format!("u{bits}"),
            Self::Float { bits } => format!("f{bits}"),
            Self::Custom(name) => name.rsplit("::").next().unwrap_or(name).to_string(),
            Self::Sequence(inner) => format!("[{}]", inner.describe()),
            Self::Optional(inner) => format!("{}?", inner.describe()),
        }
    }
}

/// How many argument tokens a flag consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Arity {
    /// Switch; never takes a separate value.
    None,
    /// Takes a value only when attached (`-pVAL`, `--prefix=VAL`).
    Optional,
    /// Always takes a value, attached or from the next argument.
    Required,
}

/// Converted value box.
///
/// Only used at the conversion boundary: the converter produces a `Scalar`
/// and the field's [`Value`](crate::Value) implementation stores it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Text(String),
}

/// A declared default, converted when the schema is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultValue {
    /// Default text exactly as declared.
    pub raw: String,
    /// Converted values (one per comma-separated element for sequences).
    pub values: Vec<Scalar>,
}

/// Flag name as it appears on the command line, without dashes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlagName {
    Short(char),
    Long(String),
}

impl fmt::Display for FlagName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Short(c) => write!(f, "-{c}"),
            Self::Long(name) => write!(f, "--{name}"),
        }
    }
}

/// CLI-facing metadata for one field of a command level.
///
/// # Examples
///
/// ```
/// use argbind_core::{FieldSpec, FlagName, ValueType};
///
/// let mut port = FieldSpec::new("port", ValueType::Uint { bits: 16 });
/// port.short = Some('p');
/// port.long = Some("port".into());
///
/// assert!(port.matches(&FlagName::Short('p')));
/// assert!(port.matches(&FlagName::Long("port".into())));
/// assert_eq!(port.label(), "--port");
/// assert_eq!(port.flag_label(), "-p, --port");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Field name in the destination record.
    pub name: String,
    /// Semantic type of the field.
    pub value_type: ValueType,
    /// One-character short name (`-p`).
    pub short: Option<char>,
    /// Long name without dashes (`port` for `--port`).
    pub long: Option<String>,
    /// Filled from bare arguments instead of flags.
    pub positional: bool,
    /// Must end up set by the command line, the environment, or a default.
    pub required: bool,
    /// Environment variable consulted when the command line leaves the field unset.
    pub env: Option<String>,
    /// Help text.
    pub help: Option<String>,
    /// Declared default.
    pub default: Option<DefaultValue>,
    /// Value name shown in usage text (`PORT`).
    pub placeholder: String,
}

impl FieldSpec {
    /// Creates a flag-less, optional field with the upper-cased name as placeholder.
    pub fn new(name: &str, value_type: ValueType) -> Self {
        Self {
            name: name.to_string(),
            value_type,
            short: None,
            long: None,
            positional: false,
            required: false,
            env: None,
            help: None,
            default: None,
            placeholder: name.to_uppercase(),
        }
    }

    pub fn arity(&self) -> Arity {
        self.value_type.arity()
    }

    /// Checks whether this field registers `name` as its short or long form.
    pub fn matches(&self, name: &FlagName) -> bool {
        match name {
            FlagName::Short(c) => self.short == Some(*c),
            FlagName::Long(l) => self.long.as_deref() == Some(l.as_str()),
        }
    }

    /// Name used in error messages: long form, else short form, else placeholder.
    pub fn label(&self) -> String {
        match (&self.long, self.short) {
            (Some(long), _) => format!("--{long}"),
            (None, Some(short)) => format!("-{short}"),
            (None, None) => self.placeholder.clone(),
        }
    }

    /// Both flag forms joined the way help output lists them.
    pub fn flag_label(&self) -> String {
        match (self.short, &self.long) {
            (Some(s), Some(l)) => format!("-{s}, --{l}"),
            (Some(s), None) => format!("-{s}"),
            (None, Some(l)) => format!("--{l}"),
            (None, None) => self.placeholder.clone(),
        }
    }
}

/// A subcommand registered on a command level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubcommandEntry {
    /// Canonical name as declared.
    pub name: String,
    /// Alternative names accepted on the command line.
    pub aliases: Vec<String>,
    /// Field of the parent record holding the subcommand slot.
    pub field: String,
    /// The slot must be invoked.
    pub required: bool,
    /// Help text from the slot field.
    pub help: Option<String>,
    /// Schema of the subcommand's own record.
    pub schema: Schema,
}

impl SubcommandEntry {
    /// Case-insensitive match against the canonical name and every alias.
    ///
    /// # Examples
    ///
    /// ```
    /// use argbind_core::{Schema, SubcommandEntry};
    ///
    /// let entry = SubcommandEntry {
    ///     name: "remove".into(),
    ///     aliases: vec!["rm".into()],
    ///     field: "remove".into(),
    ///     required: false,
    ///     help: None,
    ///     schema: Schema::new("remove"),
    /// };
    /// assert!(entry.matches("REMOVE"));
    /// assert!(entry.matches("Rm"));
    /// assert!(!entry.matches("rmdir"));
    /// ```
    pub fn matches(&self, word: &str) -> bool {
        eq_ignore_case(&self.name, word) || self.aliases.iter().any(|a| eq_ignore_case(a, word))
    }
}

/// Descriptor for one command level.
///
/// # Examples
///
/// ```
/// use argbind_core::{FieldSpec, FlagName, Schema, ValueType};
///
/// let mut schema = Schema::new("mycli");
/// let mut verbose = FieldSpec::new("verbose", ValueType::Bool);
/// verbose.long = Some("verbose".into());
/// schema.fields.push(verbose);
///
/// let (index, field) = schema.find_flag(&FlagName::Long("verbose".into())).unwrap();
/// assert_eq!(index, 0);
/// assert_eq!(field.name, "verbose");
/// assert!(schema.find_subcommand("serve").is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Command name (program name at the root, canonical subcommand name below).
    pub command: String,
    /// Short description.
    pub description: Option<String>,
    /// Fields in declaration order.
    pub fields: Vec<FieldSpec>,
    /// Subcommands in declaration order.
    pub subcommands: Vec<SubcommandEntry>,
}

impl Schema {
    pub fn new(command: &str) -> Self {
        Self {
            command: command.to_string(),
            ..Default::default()
        }
    }

    /// Finds the field registering a flag name at this level.
    pub fn find_flag(&self, name: &FlagName) -> Option<(usize, &FieldSpec)> {
        self.fields
            .iter()
            .enumerate()
            .find(|(_, f)| !f.positional && f.matches(name))
    }

    /// Finds a subcommand by name or alias, ignoring case.
    pub fn find_subcommand(&self, word: &str) -> Option<&SubcommandEntry> {
        self.subcommands.iter().find(|s| s.matches(word))
    }

    /// Positional fields in declaration order.
    pub fn positionals(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.positional)
    }

    /// Flag (non-positional) fields in declaration order.
    pub fn flags(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| !f.positional)
    }

    /// Follows canonical subcommand names down from this level.
    ///
    /// Returns every schema on the way, this one first.
    pub fn chain(&self, path: &[String]) -> Option<Vec<&Schema>> {
        let mut chain = vec![self];
        let mut current = self;
        for name in path {
            current = &current.find_subcommand(name)?.schema;
            chain.push(current);
        }
        Some(chain)
    }
}

pub(crate) fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}
