//! Usage and help text.
//!
//! Rendering follows the same ownership rules as parsing: a subcommand's
//! help lists its own options first, then each ancestor's options that the
//! subcommand can still reach (not shadowed, and not hidden by
//! `strict_subcommands`).

use argbind_core::{Arity, FieldSpec, FlagName, FlagTable, FlagTarget, Schema};

use crate::config::ParserConfig;
use crate::populate::describe_scalar;

/// One-line usage for the command at `path` (canonical subcommand names).
/// Unknown paths fall back to the root.
pub fn usage(root: &Schema, path: &[String]) -> String {
    let chain = root.chain(path).unwrap_or_else(|| vec![root]);
    let level = chain[chain.len() - 1];

    let mut out = String::from("Usage:");
    for schema in &chain {
        out.push(' ');
        out.push_str(&schema.command);
    }
    out.push_str(" [OPTIONS]");

    for field in level.positionals() {
        let repeat = if field.value_type.is_sequence() { "..." } else { "" };
        if field.required {
            out.push_str(&format!(" <{}>{repeat}", field.placeholder));
        } else {
            out.push_str(&format!(" [{}]{repeat}", field.placeholder));
        }
    }

    if !level.subcommands.is_empty() {
        if level.subcommands.iter().any(|s| s.required) {
            out.push_str(" <COMMAND>");
        } else {
            out.push_str(" [COMMAND]");
        }
    }

    out
}

/// Full help text for the command at `path`.
///
/// # Examples
///
/// ```
/// use argbind::{Parser, ParserConfig, record};
///
/// record! {
///     #[derive(Default)]
///     struct CopyFiles {
///         /// Overwrite existing files
///         #[arg(tag = "-f,--force")]
///         force: bool,
///         #[arg(tag = "positional,required", placeholder = "SRC")]
///         source: String,
///     }
/// }
///
/// let config = ParserConfig {
///     program: Some("cp".into()),
///     ..Default::default()
/// };
/// let parser = Parser::new::<CopyFiles>(config).unwrap();
/// let text = argbind::help::help(parser.schema(), parser.config(), &[]);
/// assert!(text.starts_with("Usage: cp [OPTIONS] <SRC>\n"));
/// assert!(text.contains("-f, --force"));
/// assert!(text.contains("Overwrite existing files"));
/// ```
pub fn help(root: &Schema, config: &ParserConfig, path: &[String]) -> String {
    let chain = root.chain(path).unwrap_or_else(|| vec![root]);
    let innermost = chain.len() - 1;
    let level = chain[innermost];
    let table = FlagTable::merged(&chain, config.strict_subcommands, config.version.is_some())
        .unwrap_or_default();

    let mut out = String::new();
    if let Some(desc) = &level.description {
        out.push_str(&format!("{desc}\n\n"));
    }
    out.push_str(&usage(root, path));
    out.push('\n');

    let arguments: Vec<(String, String)> = level
        .positionals()
        .map(|f| (format!("<{}>", f.placeholder), describe(f, config)))
        .collect();
    push_section(&mut out, "Arguments:", &arguments);

    let mut own = option_rows(level, innermost, &table, config);
    own.extend(builtin_rows(&table, innermost));
    push_section(&mut out, "Options:", &own);

    for depth in (0..innermost).rev() {
        let mut rows = option_rows(chain[depth], depth, &table, config);
        rows.extend(builtin_rows(&table, depth));
        push_section(&mut out, &format!("Options from {}:", chain[depth].command), &rows);
    }

    let commands: Vec<(String, String)> = level
        .subcommands
        .iter()
        .map(|s| {
            let mut names = vec![s.name.clone()];
            names.extend(s.aliases.iter().cloned());
            (names.join(", "), s.help.clone().unwrap_or_default())
        })
        .collect();
    push_section(&mut out, "Commands:", &commands);

    out
}

fn push_section(out: &mut String, title: &str, rows: &[(String, String)]) {
    if rows.is_empty() {
        return;
    }
    out.push_str(&format!("\n{title}\n"));
    let width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(4);
    for (label, desc) in rows {
        if desc.is_empty() {
            out.push_str(&format!("  {label}\n"));
        } else {
            out.push_str(&format!("  {label:<width$}  {desc}\n"));
        }
    }
}

/// Flags of `level` that still resolve to it through `table`.
fn option_rows(
    level: &Schema,
    depth: usize,
    table: &FlagTable,
    config: &ParserConfig,
) -> Vec<(String, String)> {
    level
        .fields
        .iter()
        .enumerate()
        .filter(|(_, f)| !f.positional)
        .filter_map(|(index, field)| {
            let owns = |name: FlagName| {
                table
                    .entry(&name)
                    .is_some_and(|e| e.depth == depth && e.target == FlagTarget::Field(index))
            };
            let short = field.short.filter(|c| owns(FlagName::Short(*c)));
            let long = field.long.clone().filter(|l| owns(FlagName::Long(l.clone())));
            let names = match (short, long) {
                (None, None) => return None,
                (Some(s), Some(l)) => format!("-{s}, --{l}"),
                (Some(s), None) => format!("-{s}"),
                (None, Some(l)) => format!("    --{l}"),
            };
            Some((format!("{names}{}", value_hint(field)), describe(field, config)))
        })
        .collect()
}

fn builtin_rows(table: &FlagTable, depth: usize) -> Vec<(String, String)> {
    let is = |name: FlagName, target: FlagTarget| {
        table
            .entry(&name)
            .is_some_and(|e| e.depth == depth && e.target == target)
    };

    let mut rows = Vec::new();
    let help_short = is(FlagName::Short('h'), FlagTarget::Help);
    let help_long = is(FlagName::Long("help".into()), FlagTarget::Help);
    let label = match (help_short, help_long) {
        (true, true) => Some("-h, --help"),
        (true, false) => Some("-h"),
        (false, true) => Some("    --help"),
        (false, false) => None,
    };
    if let Some(label) = label {
        rows.push((label.to_string(), "Print help".to_string()));
    }
    if is(FlagName::Long("version".into()), FlagTarget::Version) {
        rows.push(("    --version".to_string(), "Print version".to_string()));
    }
    rows
}

fn value_hint(field: &FieldSpec) -> String {
    let repeat = if field.value_type.is_sequence() { "..." } else { "" };
    match field.arity() {
        Arity::None => String::new(),
        Arity::Optional => format!("[=<{}>]", field.placeholder),
        Arity::Required => format!(" <{}>{repeat}", field.placeholder),
    }
}

fn describe(field: &FieldSpec, config: &ParserConfig) -> String {
    let mut desc = field.help.clone().unwrap_or_default();
    let mut note = |text: String| {
        if !desc.is_empty() {
            desc.push(' ');
        }
        desc.push_str(&text);
    };
    if field.required {
        note("[required]".to_string());
    }
    if let Some(default) = &field.default {
        let shown: Vec<String> = default.values.iter().map(describe_scalar).collect();
        note(format!("[default: {}]", shown.join(",")));
    }
    if let (Some(env), false) = (&field.env, config.ignore_env) {
        note(format!("[env: {}]", config.env_var(env)));
    }
    desc
}
