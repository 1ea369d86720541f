use std::path::PathBuf;

use argbind::output::{OutputFormat, format_schema};
use argbind::report::EXIT_USAGE;
use argbind::{Invocation, Parser, ParserConfig, Subcommand, record};
use serde::Serialize;

const PACKAGE_VERSION: &str = env!("CARGO_PKG_VERSION");

record! {
    #[derive(Debug, Default, Serialize)]
    struct Serve {
        /// Port to listen on
        #[arg(tag = "-p,--port,env", default = "8080")]
        port: u16,
        /// Address to bind
        #[arg(tag = "--host", default = "127.0.0.1", placeholder = "ADDR")]
        host: String,
        /// Extra directories to serve (repeatable)
        #[arg(tag = "-i,--include", placeholder = "DIR")]
        include: Vec<PathBuf>,
        /// Document root
        #[arg(tag = "positional", placeholder = "ROOT")]
        root: Option<PathBuf>,
    }
}

record! {
    #[derive(Debug, Default, Serialize)]
    struct SchemaCmd {
        /// Subcommand path to print instead of the whole tree
        #[arg(tag = "positional", placeholder = "COMMAND")]
        path: Vec<String>,
    }
}

record! {
    #[derive(Debug, Default, Serialize)]
    struct Demo {
        /// Include the dispatched path in the output
        #[arg(tag = "-v,--verbose")]
        verbose: bool,
        /// Output format: json, yaml or markdown
        #[arg(tag = "-f,--format,env:FORMAT", default = "json")]
        format: OutputFormat,
        #[arg(tag = "subcommand:serve|server", help = "Bind server options and print them")]
        serve: Subcommand<Serve>,
        #[arg(tag = "subcommand", help = "Print the declared command tree")]
        schema: Subcommand<SchemaCmd>,
    }
}

/// What a plain run prints.
#[derive(Debug, Serialize)]
struct Bound<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    invocation: Option<&'a Invocation>,
    options: &'a Demo,
}

fn main() {
    let config = ParserConfig {
        program: Some("argbind-demo".to_string()),
        description: Some("Binds its arguments to a small command tree and prints the result".to_string()),
        version: Some(PACKAGE_VERSION.to_string()),
        env_prefix: Some("ARGBIND_DEMO_".to_string()),
        ..Default::default()
    };
    let parser = match Parser::new::<Demo>(config) {
        Ok(parser) => parser,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(EXIT_USAGE);
        }
    };

    let mut demo = Demo::default();
    let invocation = parser.must_parse(&mut demo);

    match run(&parser, &demo, &invocation) {
        Ok(text) => {
            print!("{text}");
            if !text.ends_with('\n') {
                println!();
            }
        }
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}

fn run(parser: &Parser, demo: &Demo, invocation: &Invocation) -> Result<String, String> {
    if let Some(cmd) = demo.schema.get() {
        let chain = parser
            .schema()
            .chain(&cmd.path)
            .ok_or_else(|| format!("no command named '{}'", cmd.path.join(" ")))?;
        return format_schema(chain[chain.len() - 1], demo.format);
    }

    let bound = Bound {
        invocation: demo.verbose.then_some(invocation),
        options: demo,
    };
    match demo.format {
        OutputFormat::Json => serde_json::to_string_pretty(&bound)
            .map_err(|err| format!("Failed to serialize JSON: {err}")),
        OutputFormat::Yaml => {
            serde_yaml::to_string(&bound).map_err(|err| format!("Failed to serialize YAML: {err}"))
        }
        OutputFormat::Markdown => Err("markdown output is only available for 'schema'".to_string()),
    }
}
