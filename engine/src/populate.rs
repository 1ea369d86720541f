//! Value writes, environment fallback, defaults and required checks.
//!
//! Everything here works on one command level at a time: a [`Schema`] and
//! the destination record standing for it. [`Touched`] remembers which
//! fields already received a value during the current call, so later
//! sources never overwrite an earlier one even when the earlier value was
//! the type's zero (`--verbose=false` beats `VERBOSE=1`).

use std::collections::HashSet;

use argbind_core::{
    ConvertFailure, Error, FieldSpec, Record, Result, Scalar, Schema, Slot, convert, split_list,
};
use tracing::{debug, trace};

use crate::config::ParserConfig;
use crate::env::EnvSource;

/// Fields written during one resolution, keyed by (chain depth, field index).
#[derive(Debug, Default)]
pub(crate) struct Touched(HashSet<(usize, usize)>);

impl Touched {
    pub(crate) fn mark(&mut self, depth: usize, index: usize) {
        self.0.insert((depth, index));
    }

    pub(crate) fn contains(&self, depth: usize, index: usize) -> bool {
        self.0.contains(&(depth, index))
    }
}

fn value_slot<'r>(
    level: &Schema,
    record: &'r mut dyn Record,
    field: &FieldSpec,
) -> Result<&'r mut dyn argbind_core::Value> {
    match record.slot(&field.name) {
        Some(Slot::Value(slot)) => Ok(slot),
        _ => Err(Error::InvalidDestination {
            record: level.command.clone(),
            reason: format!("no value slot for field {}", field.name),
        }),
    }
}

fn rejected(field: &FieldSpec, raw: &str, reason: String) -> Error {
    Error::Conversion {
        field: field.label(),
        raw: raw.to_string(),
        cause: ConvertFailure::Rejected(reason),
    }
}

/// Converts `raw` and stores it; with no value, records the flag's presence.
pub(crate) fn store_raw(
    level: &Schema,
    record: &mut dyn Record,
    field: &FieldSpec,
    raw: Option<&str>,
) -> Result<()> {
    let slot = value_slot(level, record, field)?;
    match raw {
        Some(raw) => {
            let scalar = convert(raw, &field.value_type).map_err(|cause| Error::Conversion {
                field: field.label(),
                raw: raw.to_string(),
                cause,
            })?;
            slot.store(scalar).map_err(|reason| rejected(field, raw, reason))
        }
        None => slot.store_present().map_err(|_| Error::MissingArgument {
            flag: field.label(),
        }),
    }
}

fn is_unset(
    level: &Schema,
    record: &mut dyn Record,
    depth: usize,
    index: usize,
    touched: &Touched,
) -> Result<bool> {
    if touched.contains(depth, index) {
        return Ok(false);
    }
    Ok(value_slot(level, record, &level.fields[index])?.is_zero())
}

/// Fills still-unset fields of one level from the environment.
pub(crate) fn apply_env(
    level: &Schema,
    depth: usize,
    record: &mut dyn Record,
    touched: &mut Touched,
    config: &ParserConfig,
    env: &dyn EnvSource,
) -> Result<()> {
    if config.ignore_env {
        return Ok(());
    }

    for (index, field) in level.fields.iter().enumerate() {
        let Some(declared) = &field.env else {
            continue;
        };
        let var = config.env_var(declared);
        let Some(raw) = env.var(&var) else {
            continue;
        };
        if !is_unset(level, record, depth, index, touched)? {
            trace!(field = %field.name, var = %var, "field already set, ignoring environment");
            continue;
        }

        debug!(command = %level.command, field = %field.name, var = %var, "applying environment value");
        if field.value_type.is_sequence() {
            for part in split_list(&raw) {
                store_raw(level, record, field, Some(part))?;
            }
        } else {
            store_raw(level, record, field, Some(&raw))?;
        }
        touched.mark(depth, index);
    }
    Ok(())
}

/// Stores declared defaults into still-unset fields of one level.
pub(crate) fn apply_defaults(
    level: &Schema,
    depth: usize,
    record: &mut dyn Record,
    touched: &mut Touched,
    config: &ParserConfig,
) -> Result<()> {
    if config.ignore_default {
        return Ok(());
    }

    for (index, field) in level.fields.iter().enumerate() {
        let Some(default) = &field.default else {
            continue;
        };
        if !is_unset(level, record, depth, index, touched)? {
            continue;
        }

        debug!(command = %level.command, field = %field.name, default = %default.raw, "applying default");
        let slot = value_slot(level, record, field)?;
        for value in &default.values {
            slot.store(value.clone())
                .map_err(|reason| rejected(field, &default.raw, reason))?;
        }
        touched.mark(depth, index);
    }
    Ok(())
}

/// Fails on the first required field or required subcommand left unset.
pub(crate) fn validate_required(
    level: &Schema,
    depth: usize,
    record: &mut dyn Record,
    touched: &Touched,
    config: &ParserConfig,
) -> Result<()> {
    for (index, field) in level.fields.iter().enumerate() {
        if field.required && is_unset(level, record, depth, index, touched)? {
            let env = if config.ignore_env {
                None
            } else {
                field.env.as_deref().map(|declared| config.env_var(declared))
            };
            return Err(Error::RequiredFieldMissing {
                field: field.label(),
                env,
            });
        }
    }

    for sub in level.subcommands.iter().filter(|s| s.required) {
        let invoked = match record.slot(&sub.field) {
            Some(Slot::Subcommand(slot)) => slot.is_invoked(),
            _ => false,
        };
        if !invoked {
            return Err(Error::RequiredFieldMissing {
                field: sub.name.clone(),
                env: None,
            });
        }
    }
    Ok(())
}

/// Converted default values as text, for help output.
pub(crate) fn describe_scalar(value: &Scalar) -> String {
    match value {
        Scalar::Bool(b) => b.to_string(),
        Scalar::Int(n) => n.to_string(),
        Scalar::Uint(n) => n.to_string(),
        Scalar::Float(n) => n.to_string(),
        Scalar::Text(text) => text.clone(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use argbind_core::{extract, record};

    record! {
        #[derive(Debug, Default)]
        struct Opts {
            #[arg(tag = "--port,env", default = "8080")]
            port: u16,
            #[arg(tag = "--tags,env:TAGS", default = "a,b")]
            tags: Vec<String>,
            #[arg(tag = "--token,required,env:TOKEN")]
            token: String,
        }
    }

    fn level() -> Schema {
        extract::<Opts>("opts").unwrap()
    }

    #[test]
    fn test_store_raw_conversion_error_names_flag() {
        let schema = level();
        let mut opts = Opts::default();
        let err = store_raw(&schema, &mut opts, &schema.fields[0], Some("70000")).unwrap_err();
        assert!(matches!(
            err,
            Error::Conversion { ref field, ref raw, cause: ConvertFailure::OutOfRange { .. } }
                if field == "--port" && raw == "70000"
        ));
    }

    #[test]
    fn test_env_then_defaults() {
        let schema = level();
        let mut opts = Opts::default();
        let mut touched = Touched::default();
        let env = HashMap::from([
            ("APP_TAGS".to_string(), "x, y,z".to_string()),
            ("APP_TOKEN".to_string(), "secret".to_string()),
        ]);
        let config = ParserConfig {
            env_prefix: Some("APP_".into()),
            ..Default::default()
        };

        apply_env(&schema, 0, &mut opts, &mut touched, &config, &env).unwrap();
        apply_defaults(&schema, 0, &mut opts, &mut touched, &config).unwrap();
        validate_required(&schema, 0, &mut opts, &touched, &config).unwrap();

        assert_eq!(opts.port, 8080);
        assert_eq!(opts.tags, vec!["x", "y", "z"]);
        assert_eq!(opts.token, "secret");
    }

    #[test]
    fn test_touched_fields_keep_their_value() {
        let schema = level();
        let mut opts = Opts::default();
        let mut touched = Touched::default();
        touched.mark(0, 0);
        let env = HashMap::from([("PORT".to_string(), "1".to_string())]);
        let config = ParserConfig::default();

        apply_env(&schema, 0, &mut opts, &mut touched, &config, &env).unwrap();
        apply_defaults(&schema, 0, &mut opts, &mut touched, &config).unwrap();
        assert_eq!(opts.port, 0);
    }

    #[test]
    fn test_required_names_env_var() {
        let schema = level();
        let mut opts = Opts::default();
        let config = ParserConfig {
            env_prefix: Some("APP_".into()),
            ..Default::default()
        };

        let err = validate_required(&schema, 0, &mut opts, &Touched::default(), &config).unwrap_err();
        assert_eq!(
            err,
            Error::RequiredFieldMissing {
                field: "--token".into(),
                env: Some("APP_TOKEN".into())
            }
        );
    }

    #[test]
    fn test_ignore_switches() {
        let schema = level();
        let mut opts = Opts::default();
        let mut touched = Touched::default();
        let env = HashMap::from([("PORT".to_string(), "1".to_string())]);
        let config = ParserConfig {
            ignore_env: true,
            ignore_default: true,
            ..Default::default()
        };

        apply_env(&schema, 0, &mut opts, &mut touched, &config, &env).unwrap();
        apply_defaults(&schema, 0, &mut opts, &mut touched, &config).unwrap();
        assert_eq!(opts.port, 0);
        assert!(opts.tags.is_empty());
    }
}
