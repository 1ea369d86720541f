//! Text to typed value conversion.
//!
//! [`convert`] dispatches on a [`ValueType`] and produces a [`Scalar`]. All
//! numeric parsing is base-10 and locale-independent, and integers are
//! range-checked against the bit width of the target type.

use std::num::IntErrorKind;

use thiserror::Error;

use crate::{Scalar, ValueType};

/// Why a raw value could not be converted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConvertFailure {
    /// Text is not one of the accepted boolean spellings.
    #[error("{0:?} is not a boolean")]
    InvalidBool(String),
    /// Text is not a base-10 integer.
    #[error("{0:?} is not a valid integer")]
    InvalidInt(String),
    /// Text is not a number.
    #[error("{0:?} is not a valid number")]
    InvalidFloat(String),
    /// Number does not fit the target type.
    #[error("{raw} is out of range for {target}")]
    OutOfRange { raw: String, target: String },
    /// No conversion rule exists for the target type.
    #[error("no conversion for type {0}")]
    Unsupported(String),
    /// The field type rejected the value (custom parse errors and the like).
    #[error("{0}")]
    Rejected(String),
}

/// Converts raw command-line text into a value of `target`.
///
/// Sequences and optionals convert their element type; composites nested
/// inside them have no rule. Custom types pass through as text and parse
/// themselves when stored.
///
/// # Examples
///
/// ```
/// use argbind_core::{convert, ConvertFailure, Scalar, ValueType};
///
/// assert_eq!(convert("YES", &ValueType::Bool), Ok(Scalar::Bool(true)));
/// assert_eq!(convert("", &ValueType::Bool), Ok(Scalar::Bool(false)));
/// assert_eq!(convert("-12", &ValueType::Int { bits: 8 }), Ok(Scalar::Int(-12)));
/// assert!(matches!(
///     convert("300", &ValueType::Uint { bits: 8 }),
///     Err(ConvertFailure::OutOfRange { .. })
/// ));
/// ```
pub fn convert(raw: &str, target: &ValueType) -> Result<Scalar, ConvertFailure> {
    match target {
        ValueType::Bool => parse_bool(raw).map(Scalar::Bool),
        ValueType::String | ValueType::Custom(_) => Ok(Scalar::Text(raw.to_string())),
        ValueType::Int { bits } | ValueType::Uint { bits } | ValueType::Float { bits }
            if *bits == 0 || *bits > 64 =>
        {
            Err(ConvertFailure::Unsupported(target.describe()))
        }
        ValueType::Int { bits } => parse_int(raw, *bits).map(Scalar::Int),
        ValueType::Uint { bits } => parse_uint(raw, *bits).map(Scalar::Uint),
        ValueType::Float { bits } => parse_float(raw, *bits).map(Scalar::Float),
        ValueType::Sequence(inner) | ValueType::Optional(inner) => match **inner {
            ValueType::Sequence(_) | ValueType::Optional(_) => {
                Err(ConvertFailure::Unsupported(target.describe()))
            }
            ref element => convert(raw, element),
        },
    }
}

/// Splits a comma-separated list (defaults and environment values of
/// sequence fields). Empty input yields no elements.
///
/// # Examples
///
/// ```
/// use argbind_core::split_list;
///
/// assert_eq!(split_list("a, b,c"), vec!["a", "b", "c"]);
/// assert!(split_list("").is_empty());
/// ```
pub fn split_list(raw: &str) -> Vec<&str> {
    if raw.trim().is_empty() {
        return Vec::new();
    }
    raw.split(',').map(str::trim).collect()
}

fn parse_bool(raw: &str) -> Result<bool, ConvertFailure> {
    match raw.to_ascii_lowercase().as_str() {
        "" | "false" | "f" | "0" | "no" | "n" | "off" => Ok(false),
        "true" | "t" | "1" | "yes" | "y" | "on" => Ok(true),
        _ => Err(ConvertFailure::InvalidBool(raw.to_string())),
    }
}

fn parse_int(raw: &str, bits: u8) -> Result<i64, ConvertFailure> {
    let out_of_range = || ConvertFailure::OutOfRange {
        raw: raw.to_string(),
        target: format!("i{bits}"),
    };
    let value = raw.parse::<i64>().map_err(|e| match e.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => out_of_range(),
        _ => ConvertFailure::InvalidInt(raw.to_string()),
    })?;
    if bits < 64 {
        let max = (1i64 << (bits - 1)) - 1;
        let min = -(1i64 << (bits - 1));
        if value < min || value > max {
            return Err(out_of_range());
        }
    }
    Ok(value)
}

fn parse_uint(raw: &str, bits: u8) -> Result<u64, ConvertFailure> {
    let out_of_range = || ConvertFailure::OutOfRange {
        raw: raw.to_string(),
        target: format!("u{bits}"),
    };
    let value = raw.parse::<u64>().map_err(|e| match e.kind() {
        IntErrorKind::PosOverflow => out_of_range(),
        _ => ConvertFailure::InvalidInt(raw.to_string()),
    })?;
    if bits < 64 && value > (1u64 << bits) - 1 {
        return Err(out_of_range());
    }
    Ok(value)
}

fn parse_float(raw: &str, bits: u8) -> Result<f64, ConvertFailure> {
    let value = raw
        .parse::<f64>()
        .map_err(|_| ConvertFailure::InvalidFloat(raw.to_string()))?;
    if bits == 32 && value.is_finite() && value.abs() > f64::from(f32::MAX) {
        return Err(ConvertFailure::OutOfRange {
            raw: raw.to_string(),
            target: "f32".to_string(),
        });
    }
    Ok(value)
}
