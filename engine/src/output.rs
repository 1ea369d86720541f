//! Schema export.
//!
//! A parser's [`Schema`] tree can be written out as JSON or YAML (for
//! tooling) or as Markdown (for documentation).

use std::fmt;
use std::str::FromStr;

use argbind_core::{Schema, custom_value};
use serde::{Deserialize, Serialize};

use crate::populate::describe_scalar;

/// Supported output formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
    Markdown,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            "markdown" | "md" => Ok(Self::Markdown),
            other => Err(format!("unknown format {other:?} (expected json, yaml or markdown)")),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Markdown => "markdown",
        })
    }
}

custom_value!(OutputFormat);

/// Formats a schema tree in the requested output format.
///
/// # Examples
///
/// ```
/// use argbind::output::{OutputFormat, format_schema};
/// use argbind_core::Schema;
///
/// let schema = Schema::new("mycli");
/// let json = format_schema(&schema, OutputFormat::Json).unwrap();
/// assert!(json.contains("\"command\": \"mycli\""));
/// assert!(format_schema(&schema, OutputFormat::Markdown).unwrap().starts_with("# mycli"));
/// ```
pub fn format_schema(schema: &Schema, format: OutputFormat) -> Result<String, String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(schema)
            .map_err(|e| format!("JSON serialization failed: {e}")),
        OutputFormat::Yaml => {
            serde_yaml::to_string(schema).map_err(|e| format!("YAML serialization failed: {e}"))
        }
        OutputFormat::Markdown => {
            let mut out = String::new();
            schema_to_markdown(schema, &schema.command, 1, &mut out);
            Ok(out)
        }
    }
}

fn schema_to_markdown(schema: &Schema, path: &str, depth: usize, out: &mut String) {
    out.push_str(&format!("{} {path}\n\n", "#".repeat(depth.min(6))));

    if let Some(ref desc) = schema.description {
        out.push_str(&format!("{desc}\n\n"));
    }

    let flags: Vec<_> = schema.flags().collect();
    if !flags.is_empty() {
        out.push_str("| Flag | Type | Default | Env | Description |\n");
        out.push_str("|------|------|---------|-----|-------------|\n");
        for field in flags {
            let default = field
                .default
                .as_ref()
                .map(|d| {
                    d.values
                        .iter()
                        .map(describe_scalar)
                        .collect::<Vec<_>>()
                        .join(",")
                })
                .unwrap_or_default();
            let env = field.env.as_deref().unwrap_or("");
            let mut desc = field.help.clone().unwrap_or_default();
            if field.required {
                desc.push_str(" (required)");
            }
            out.push_str(&format!(
                "| `{}` | {} | {default} | {env} | {} |\n",
                field.flag_label(),
                field.value_type.describe(),
                desc.trim()
            ));
        }
        out.push('\n');
    }

    let positionals: Vec<_> = schema.positionals().collect();
    if !positionals.is_empty() {
        out.push_str("| Argument | Required | Description |\n");
        out.push_str("|----------|----------|-------------|\n");
        for field in positionals {
            let required = if field.required { "yes" } else { "no" };
            let desc = field.help.as_deref().unwrap_or("");
            out.push_str(&format!("| `{}` | {required} | {desc} |\n", field.placeholder));
        }
        out.push('\n');
    }

    for sub in &schema.subcommands {
        let child_path = format!("{path} {}", sub.name);
        schema_to_markdown(&sub.schema, &child_path, depth + 1, out);
        if !sub.aliases.is_empty() {
            out.push_str(&format!("Aliases: {}\n\n", sub.aliases.join(", ")));
        }
    }
}
