//! Destination records and their field descriptors.
//!
//! A destination record is any type implementing [`Record`]: it lists its
//! fields as [`FieldDecl`]s and hands out a [`Slot`] per field name. The
//! [`record!`](crate::record) macro writes both halves from an ordinary
//! struct definition; hand-written implementations work the same way.
//!
//! Field types implement [`Bind`]. Scalars (`bool`, strings, integers,
//! floats, paths, chars) are built in, `Vec<T>` and `Option<T>` wrap them,
//! [`Subcommand<T>`] holds a nested record, and [`custom_value!`](crate::custom_value)
//! adds any `FromStr` type.

use std::fmt;
use std::path::PathBuf;

use serde::{Serialize, Serializer};

use crate::{Scalar, ValueType};

/// A destination record.
///
/// # Examples
///
/// ```
/// use argbind_core::{Bind, FieldDecl, Record, Slot};
///
/// #[derive(Default)]
/// struct Opts {
///     verbose: bool,
///     port: u16,
/// }
///
/// impl Record for Opts {
///     fn fields() -> Vec<FieldDecl> {
///         vec![
///             FieldDecl::of::<bool>("verbose").tag("-v,--verbose"),
///             FieldDecl::of::<u16>("port").tag("-p").default("8080"),
///         ]
///     }
///
///     fn slot(&mut self, field: &str) -> Option<Slot<'_>> {
///         match field {
///             "verbose" => Some(self.verbose.slot()),
///             "port" => Some(self.port.slot()),
///             _ => None,
///         }
///     }
/// }
///
/// let mut opts = Opts::default();
/// assert!(opts.slot("port").is_some());
/// assert!(opts.slot("missing").is_none());
/// ```
pub trait Record {
    /// Field declarations in declaration order.
    fn fields() -> Vec<FieldDecl>
    where
        Self: Sized;

    /// Mutable access to one field by name.
    fn slot(&mut self, field: &str) -> Option<Slot<'_>>;
}

/// Mutable view of one field of a destination record.
pub enum Slot<'a> {
    Value(&'a mut dyn Value),
    Subcommand(&'a mut dyn SubcommandSlot),
}

impl fmt::Debug for Slot<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => f.debug_tuple("Value").field(&v.is_zero()).finish(),
            Self::Subcommand(s) => f.debug_tuple("Subcommand").field(&s.is_invoked()).finish(),
        }
    }
}

/// What a field type looks like to the schema extractor.
#[derive(Debug, Clone)]
pub enum Shape {
    /// A value-holding field of the given type.
    Value(ValueType),
    /// A subcommand slot; the function lists the nested record's fields.
    Subcommand(fn() -> Vec<FieldDecl>),
}

/// Field types usable in a destination record.
pub trait Bind {
    fn shape() -> Shape
    where
        Self: Sized;

    fn slot(&mut self) -> Slot<'_>;
}

/// A value-holding field, as seen by the converter.
pub trait Value {
    /// Returns `true` while the field holds its type's zero value.
    fn is_zero(&self) -> bool;

    /// Stores one converted value. Sequences append.
    fn store(&mut self, value: Scalar) -> Result<(), String>;

    /// Records that the flag appeared without a value.
    fn store_present(&mut self) -> Result<(), String>;
}

/// Single values that can stand alone, in a `Vec`, or in an `Option`.
pub trait Element: Sized + Default {
    fn value_type() -> ValueType;

    fn from_scalar(value: Scalar) -> Result<Self, String>;

    fn is_zero(&self) -> bool;

    /// Value stored when the flag appears without one, if the type has it.
    fn present() -> Option<Self> {
        None
    }
}

/// A subcommand field: either not invoked, or holding the subcommand's record.
///
/// The record is allocated only when the subcommand is dispatched.
///
/// # Examples
///
/// ```
/// use argbind_core::Subcommand;
///
/// let slot: Subcommand<String> = Subcommand::default();
/// assert!(!slot.is_invoked());
/// assert_eq!(slot.get(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subcommand<T>(Option<Box<T>>);

impl<T> Default for Subcommand<T> {
    fn default() -> Self {
        Self(None)
    }
}

impl<T> Subcommand<T> {
    pub fn invoked(record: T) -> Self {
        Self(Some(Box::new(record)))
    }

    pub fn is_invoked(&self) -> bool {
        self.0.is_some()
    }

    pub fn get(&self) -> Option<&T> {
        self.0.as_deref()
    }

    pub fn get_mut(&mut self) -> Option<&mut T> {
        self.0.as_deref_mut()
    }

    pub fn into_inner(self) -> Option<T> {
        self.0.map(|record| *record)
    }
}

impl<T: Serialize> Serialize for Subcommand<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.get().serialize(serializer)
    }
}

/// Type-erased access to a [`Subcommand`] slot.
pub trait SubcommandSlot {
    fn is_invoked(&self) -> bool;

    /// Allocates the nested record if needed and returns it.
    fn invoke(&mut self) -> &mut dyn Record;

    fn record_mut(&mut self) -> Option<&mut dyn Record>;
}

impl<T: Record + Default> SubcommandSlot for Subcommand<T> {
    fn is_invoked(&self) -> bool {
        self.0.is_some()
    }

    fn invoke(&mut self) -> &mut dyn Record {
        self.0.get_or_insert_with(Box::default).as_mut()
    }

    fn record_mut(&mut self) -> Option<&mut dyn Record> {
        match &mut self.0 {
            Some(record) => Some(record.as_mut()),
            None => None,
        }
    }
}

impl<T: Record + Default> Bind for Subcommand<T> {
    fn shape() -> Shape {
        Shape::Subcommand(T::fields)
    }

    fn slot(&mut self) -> Slot<'_> {
        Slot::Subcommand(self)
    }
}

/// Declaration of one field: its name, shape, and metadata strings.
///
/// `tag` carries the `arg` mini-language (`-v,--verbose`, `positional`,
/// `required`, `env:VAR`, `subcommand:name|alias`, or `-` to hide the
/// field). `help`, `default` and `placeholder` are independent strings.
#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub name: &'static str,
    pub shape: Shape,
    pub tag: Option<&'static str>,
    pub help: Option<&'static str>,
    pub doc: Vec<&'static str>,
    pub default: Option<&'static str>,
    pub placeholder: Option<&'static str>,
}

impl FieldDecl {
    /// Declares a field of type `B`.
    pub fn of<B: Bind>(name: &'static str) -> Self {
        Self {
            name,
            shape: B::shape(),
            tag: None,
            help: None,
            doc: Vec::new(),
            default: None,
            placeholder: None,
        }
    }

    pub fn tag(mut self, tag: &'static str) -> Self {
        self.tag = Some(tag);
        self
    }

    pub fn help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }

    /// Adds a doc-comment line; joined lines serve as help when no explicit
    /// help is given.
    pub fn doc(mut self, line: &'static str) -> Self {
        self.doc.push(line);
        self
    }

    pub fn default(mut self, default: &'static str) -> Self {
        self.default = Some(default);
        self
    }

    pub fn placeholder(mut self, placeholder: &'static str) -> Self {
        self.placeholder = Some(placeholder);
        self
    }

    /// Explicit help, else the trimmed doc lines joined by spaces.
    pub fn help_text(&self) -> Option<String> {
        if let Some(help) = self.help {
            return Some(help.to_string());
        }
        let joined = self
            .doc
            .iter()
            .map(|line| line.trim())
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        (!joined.is_empty()).then_some(joined)
    }
}

impl<T: Element> Value for Vec<T> {
    fn is_zero(&self) -> bool {
        self.is_empty()
    }

    fn store(&mut self, value: Scalar) -> Result<(), String> {
        self.push(T::from_scalar(value)?);
        Ok(())
    }

    fn store_present(&mut self) -> Result<(), String> {
        Err("a value is required".to_string())
    }
}

impl<T: Element> Bind for Vec<T> {
    fn shape() -> Shape {
        Shape::Value(ValueType::Sequence(Box::new(T::value_type())))
    }

    fn slot(&mut self) -> Slot<'_> {
        Slot::Value(self)
    }
}

impl<T: Element> Value for Option<T> {
    fn is_zero(&self) -> bool {
        self.is_none()
    }

    fn store(&mut self, value: Scalar) -> Result<(), String> {
        *self = Some(T::from_scalar(value)?);
        Ok(())
    }

    fn store_present(&mut self) -> Result<(), String> {
        *self = Some(T::present().unwrap_or_default());
        Ok(())
    }
}

impl<T: Element> Bind for Option<T> {
    fn shape() -> Shape {
        Shape::Value(ValueType::Optional(Box::new(T::value_type())))
    }

    fn slot(&mut self) -> Slot<'_> {
        Slot::Value(self)
    }
}

/// Implements [`Value`] and [`Bind`] for a type that already implements
/// [`Element`].
#[doc(hidden)]
#[macro_export]
macro_rules! __bind_element {
    ($($ty:ty),* $(,)?) => {$(
        impl $crate::Value for $ty {
            fn is_zero(&self) -> bool {
                <$ty as $crate::Element>::is_zero(self)
            }

            fn store(&mut self, value: $crate::Scalar) -> ::std::result::Result<(), ::std::string::String> {
                *self = <$ty as $crate::Element>::from_scalar(value)?;
                Ok(())
            }

            fn store_present(&mut self) -> ::std::result::Result<(), ::std::string::String> {
                match <$ty as $crate::Element>::present() {
                    Some(value) => {
                        *self = value;
                        Ok(())
                    }
                    None => Err(::std::string::String::from("a value is required")),
                }
            }
        }

        impl $crate::Bind for $ty {
            fn shape() -> $crate::Shape {
                $crate::Shape::Value(<$ty as $crate::Element>::value_type())
            }

            fn slot(&mut self) -> $crate::Slot<'_> {
                $crate::Slot::Value(self)
            }
        }
    )*};
}

/// Makes a `FromStr` type usable as a field, alone or inside `Vec`/`Option`.
///
/// The type must also implement `Default` and `PartialEq` (its default is
/// its zero value) and its parse error must implement `Display`.
///
/// # Examples
///
/// ```
/// use std::str::FromStr;
///
/// #[derive(Debug, Default, PartialEq)]
/// enum Level { #[default] Info, Debug }
///
/// impl FromStr for Level {
///     type Err = String;
///     fn from_str(s: &str) -> Result<Self, String> {
///         match s {
///             "info" => Ok(Level::Info),
///             "debug" => Ok(Level::Debug),
///             other => Err(format!("unknown level {other}")),
///         }
///     }
/// }
///
/// argbind_core::custom_value!(Level);
///
/// use argbind_core::{Scalar, Value};
/// let mut level = Level::default();
/// level.store(Scalar::Text("debug".into())).unwrap();
/// assert_eq!(level, Level::Debug);
/// assert!(level.store(Scalar::Text("loud".into())).is_err());
/// ```
#[macro_export]
macro_rules! custom_value {
    ($($ty:ty),* $(,)?) => {$(
        impl $crate::Element for $ty {
            fn value_type() -> $crate::ValueType {
                $crate::ValueType::Custom(::std::string::String::from(::std::any::type_name::<$ty>()))
            }

            fn from_scalar(value: $crate::Scalar) -> ::std::result::Result<Self, ::std::string::String> {
                match value {
                    $crate::Scalar::Text(text) => text
                        .parse::<$ty>()
                        .map_err(|e| ::std::string::ToString::to_string(&e)),
                    other => Err(::std::format!("expected text, got {other:?}")),
                }
            }

            fn is_zero(&self) -> bool {
                *self == <$ty as ::std::default::Default>::default()
            }
        }

        $crate::__bind_element!($ty);
    )*};
}

impl Element for bool {
    fn value_type() -> ValueType {
        ValueType::Bool
    }

    fn from_scalar(value: Scalar) -> Result<Self, String> {
        match value {
            Scalar::Bool(b) => Ok(b),
            other => Err(format!("expected a boolean, got {other:?}")),
        }
    }

    fn is_zero(&self) -> bool {
        !*self
    }

    fn present() -> Option<Self> {
        Some(true)
    }
}

impl Element for String {
    fn value_type() -> ValueType {
        ValueType::String
    }

    fn from_scalar(value: Scalar) -> Result<Self, String> {
        match value {
            Scalar::Text(text) => Ok(text),
            other => Err(format!("expected text, got {other:?}")),
        }
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

macro_rules! int_element {
    ($variant:ident, $scalar:ident, $($ty:ty),*) => {$(
        impl Element for $ty {
            fn value_type() -> ValueType {
                ValueType::$variant { bits: <$ty>::BITS as u8 }
            }

            fn from_scalar(value: Scalar) -> Result<Self, String> {
                match value {
                    Scalar::$scalar(n) => <$ty>::try_from(n).map_err(|e| e.to_string()),
                    other => Err(format!("expected an integer, got {other:?}")),
                }
            }

            fn is_zero(&self) -> bool {
                *self == 0
            }
        }
    )*};
}

int_element!(Int, Int, i8, i16, i32, i64, isize);
int_element!(Uint, Uint, u8, u16, u32, u64, usize);

impl Element for f64 {
    fn value_type() -> ValueType {
        ValueType::Float { bits: 64 }
    }

    fn from_scalar(value: Scalar) -> Result<Self, String> {
        match value {
            Scalar::Float(n) => Ok(n),
            other => Err(format!("expected a number, got {other:?}")),
        }
    }

    fn is_zero(&self) -> bool {
        *self == 0.0
    }
}

impl Element for f32 {
    fn value_type() -> ValueType {
        ValueType::Float { bits: 32 }
    }

    fn from_scalar(value: Scalar) -> Result<Self, String> {
        match value {
            Scalar::Float(n) => Ok(n as f32),
            other => Err(format!("expected a number, got {other:?}")),
        }
    }

    fn is_zero(&self) -> bool {
        *self == 0.0
    }
}

crate::__bind_element!(
    bool, String, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64
);
crate::custom_value!(PathBuf, char);

/// Declares a struct and implements [`Record`](crate::Record) for it.
///
/// Each field may carry doc comments (used as help text) followed by one
/// `#[arg(...)]` attribute whose keys are [`FieldDecl`](crate::FieldDecl)
/// builder methods: `tag`, `help`, `default`, `placeholder`.
///
/// # Examples
///
/// ```
/// use argbind_core::{record, Record, Subcommand};
///
/// record! {
///     #[derive(Debug, Default)]
///     pub struct Server {
///         /// Port to listen on.
///         #[arg(tag = "-p,--port", default = "8080")]
///         pub port: u16,
///     }
/// }
///
/// record! {
///     #[derive(Debug, Default)]
///     pub struct App {
///         #[arg(tag = "-v,--verbose")]
///         pub verbose: bool,
///         #[arg(tag = "subcommand")]
///         pub server: Subcommand<Server>,
///     }
/// }
///
/// let fields = App::fields();
/// assert_eq!(fields.len(), 2);
/// assert_eq!(Server::fields()[0].help_text().as_deref(), Some("Port to listen on."));
/// ```
#[macro_export]
macro_rules! record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[doc = $doc:expr])*
                $(#[arg($($key:ident = $val:expr),* $(,)?)])?
                $fvis:vis $field:ident : $ty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[doc = $doc])*
                $fvis $field: $ty,
            )*
        }

        impl $crate::Record for $name {
            fn fields() -> ::std::vec::Vec<$crate::FieldDecl> {
                ::std::vec![
                    $(
                        $crate::FieldDecl::of::<$ty>(::std::stringify!($field))
                            $( .doc($doc) )*
                            $( $( .$key($val) )* )?
                    ),*
                ]
            }

            fn slot(&mut self, field: &str) -> ::std::option::Option<$crate::Slot<'_>> {
                match field {
                    $(
                        ::std::stringify!($field) => ::std::option::Option::Some(
                            $crate::Bind::slot(&mut self.$field),
                        ),
                    )*
                    _ => ::std::option::Option::None,
                }
            }
        }
    };
}
