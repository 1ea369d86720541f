use std::collections::HashMap;

use argbind::{Error, ErrorKind, Invocation, Parser, ParserConfig, Subcommand, record};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn no_env() -> HashMap<String, String> {
    HashMap::new()
}

fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

// ---------------------------------------------------------------------------
// Record trees
// ---------------------------------------------------------------------------

record! {
    #[derive(Debug, Default)]
    struct Server {
        #[arg(tag = "-p,--port", default = "8080")]
        port: i64,
    }
}

record! {
    #[derive(Debug, Default)]
    struct App {
        #[arg(tag = "-v,--verbose")]
        verbose: bool,
        #[arg(tag = "subcommand")]
        server: Subcommand<Server>,
    }
}

record! {
    #[derive(Debug, Default)]
    struct PlainServer {
        #[arg(tag = "-p,--port")]
        port: i64,
    }
}

record! {
    #[derive(Debug, Default)]
    struct Flags {
        #[arg(tag = "-v")]
        verbose: bool,
        #[arg(tag = "-d")]
        debug: bool,
        #[arg(tag = "subcommand:server")]
        server: Subcommand<PlainServer>,
    }
}

record! {
    #[derive(Debug, Default)]
    struct Child {
        #[arg(tag = "-c", default = "1")]
        count: i64,
    }
}

record! {
    #[derive(Debug, Default)]
    struct Compact {
        #[arg(tag = "-v")]
        verbose: bool,
        #[arg(tag = "-p")]
        prefix: Option<String>,
        #[arg(tag = "subcommand")]
        child: Subcommand<Child>,
    }
}

record! {
    #[derive(Debug, Default)]
    struct Shadow {
        #[arg(tag = "-n,--name")]
        name: String,
    }
}

record! {
    #[derive(Debug, Default)]
    struct Shadowed {
        #[arg(tag = "-n,--name")]
        name: String,
        #[arg(tag = "subcommand")]
        sub: Subcommand<Shadow>,
    }
}

record! {
    #[derive(Debug, Default)]
    struct Add {
        #[arg(tag = "-f,--force")]
        force: bool,
        #[arg(tag = "positional,required", placeholder = "NAME")]
        name: String,
        #[arg(tag = "positional")]
        urls: Vec<String>,
    }
}

record! {
    #[derive(Debug, Default)]
    struct Remote {
        #[arg(tag = "-v,--verbose")]
        verbose: bool,
        #[arg(tag = "subcommand")]
        add: Subcommand<Add>,
    }
}

record! {
    #[derive(Debug, Default)]
    struct Git {
        #[arg(tag = "-C", placeholder = "DIR")]
        dir: String,
        #[arg(tag = "-q,--quiet")]
        quiet: bool,
        #[arg(tag = "-f")]
        fetch: bool,
        #[arg(tag = "subcommand:remote|rem")]
        remote: Subcommand<Remote>,
    }
}

record! {
    #[derive(Debug, Default)]
    struct Settings {
        #[arg(tag = "--port,env:PORT", default = "8080")]
        port: u16,
        #[arg(tag = "--verbose,env:VERBOSE")]
        verbose: bool,
        #[arg(tag = "-I,--include")]
        include: Vec<String>,
        #[arg(tag = "--token,required,env:TOKEN")]
        token: String,
        #[arg(tag = "--color")]
        color: Option<bool>,
    }
}

record! {
    #[derive(Debug, Default)]
    struct Run {
        #[arg(tag = "positional,required", placeholder = "SCRIPT")]
        script: String,
        #[arg(tag = "positional")]
        rest: Vec<String>,
    }
}

record! {
    #[derive(Debug, Default)]
    struct Tool {
        #[arg(tag = "-x")]
        x: bool,
        #[arg(tag = "subcommand")]
        run: Subcommand<Run>,
        #[arg(tag = "subcommand:build|b")]
        build: Subcommand<Child>,
    }
}

record! {
    #[derive(Debug, Default)]
    struct NeedsCommand {
        #[arg(tag = "subcommand,required")]
        run: Subcommand<Run>,
    }
}

record! {
    #[derive(Debug, Default)]
    struct Hosted {
        #[arg(tag = "-h,--host")]
        host: String,
        #[arg(tag = "subcommand")]
        server: Subcommand<PlainServer>,
    }
}

record! {
    #[derive(Debug, Default)]
    struct Files {
        #[arg(tag = "positional,required")]
        files: Vec<String>,
    }
}

record! {
    #[derive(Debug, Default)]
    struct Named {
        #[arg(tag = "-x")]
        x: String,
    }
}

record! {
    #[derive(Debug, Default)]
    struct Switch {
        #[arg(tag = "-x")]
        x: bool,
        #[arg(tag = "subcommand")]
        kid: Subcommand<Named>,
    }
}

fn parse_app(list: &[&str]) -> (App, Result<Invocation, Error>) {
    let parser = Parser::new::<App>(ParserConfig::default()).unwrap();
    let mut app = App::default();
    let result = parser.parse_with_env(&mut app, &args(list), &no_env());
    (app, result)
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn test_scenario_subcommand_flag() {
    let (app, result) = parse_app(&["server", "--port", "9000"]);
    let invocation = result.unwrap();
    assert_eq!(invocation.path, vec!["server"]);
    assert!(invocation.unconsumed.is_empty());
    assert_eq!(app.server.get().unwrap().port, 9000);
    assert!(!app.verbose);
}

#[test]
fn test_scenario_subcommand_is_case_insensitive() {
    let (app, result) = parse_app(&["SERVER", "--port", "9000"]);
    assert_eq!(result.unwrap().path, vec!["server"]);
    assert_eq!(app.server.get().unwrap().port, 9000);
    assert!(!app.verbose);
}

#[test]
fn test_scenario_unknown_subcommand_reports_flag() {
    let (app, result) = parse_app(&["invalid", "--port", "9000"]);
    assert_eq!(
        result.unwrap_err(),
        Error::UnknownFlag {
            token: "--port".into()
        }
    );
    assert!(!app.server.is_invoked());
}

#[test]
fn test_scenario_grouped_parent_flags_after_subcommand() {
    let parser = Parser::new::<Flags>(ParserConfig::default()).unwrap();
    let mut flags = Flags::default();
    let invocation = parser
        .parse_with_env(&mut flags, &args(&["server", "-vd", "--port", "9000"]), &no_env())
        .unwrap();

    assert_eq!(invocation.path, vec!["server"]);
    assert!(flags.verbose);
    assert!(flags.debug);
    assert_eq!(flags.server.get().unwrap().port, 9000);
}

#[test]
fn test_declared_short_name_only() {
    let parser = Parser::new::<Child>(ParserConfig::default()).unwrap();
    let mut child = Child::default();
    let err = parser
        .parse_with_env(&mut child, &args(&["--count", "2"]), &no_env())
        .unwrap_err();
    assert_eq!(
        err,
        Error::UnknownFlag {
            token: "--count".into()
        }
    );
}

#[test]
fn test_scenario_optional_flag_consumes_group() {
    let parser = Parser::new::<Compact>(ParserConfig::default()).unwrap();
    let mut compact = Compact::default();
    let invocation = parser
        .parse_with_env(&mut compact, &args(&["child", "-vpc", "9000"]), &no_env())
        .unwrap();

    assert!(compact.verbose);
    assert_eq!(compact.prefix.as_deref(), Some("c"));
    assert_eq!(compact.child.get().unwrap().count, 1);
    assert_eq!(invocation.unconsumed, vec!["9000"]);
}

// ---------------------------------------------------------------------------
// Ownership
// ---------------------------------------------------------------------------

#[test]
fn test_innermost_wins_regardless_of_order() {
    let parser = Parser::new::<Shadowed>(ParserConfig::default()).unwrap();

    for list in [
        &["sub", "--name", "inner"][..],
        &["--name", "inner", "sub"][..],
        &["-n", "inner", "SUB"][..],
    ] {
        let mut dest = Shadowed::default();
        parser.parse_with_env(&mut dest, &args(list), &no_env()).unwrap();
        assert_eq!(dest.sub.get().unwrap().name, "inner", "{list:?}");
        assert!(dest.name.is_empty(), "{list:?}");
    }

    let mut dest = Shadowed::default();
    parser
        .parse_with_env(&mut dest, &args(&["--name", "outer"]), &no_env())
        .unwrap();
    assert_eq!(dest.name, "outer");
    assert!(!dest.sub.is_invoked());
}

#[test]
fn test_case_insensitive_dispatch_populates_same_destination() {
    for word in ["SERVER", "server", "SeRvEr"] {
        let (app, result) = parse_app(&[word, "-p", "1"]);
        assert_eq!(result.unwrap().path, vec!["server"]);
        assert_eq!(app.server.get().unwrap().port, 1);
    }
}

#[test]
fn test_grandchild_inherits_from_every_ancestor() {
    let parser = Parser::new::<Git>(ParserConfig::default()).unwrap();
    let mut git = Git::default();
    let invocation = parser
        .parse_with_env(
            &mut git,
            &args(&["rem", "-q", "add", "-vf", "-C", "/src", "origin", "a", "b"]),
            &no_env(),
        )
        .unwrap();

    assert_eq!(invocation.path, vec!["remote", "add"]);
    assert!(git.quiet);
    assert_eq!(git.dir, "/src");
    // `-f` belongs to Add, the innermost level declaring it.
    assert!(!git.fetch);

    let remote = git.remote.get().unwrap();
    assert!(remote.verbose);
    let add = remote.add.get().unwrap();
    assert!(add.force);
    assert_eq!(add.name, "origin");
    assert_eq!(add.urls, vec!["a", "b"]);
}

#[test]
fn test_subcommand_word_after_parent_flags() {
    let parser = Parser::new::<Git>(ParserConfig::default()).unwrap();
    let mut git = Git::default();
    parser
        .parse_with_env(&mut git, &args(&["-C", "remote", "remote", "-v"]), &no_env())
        .unwrap();

    // The first "remote" is the value of -C; dispatch skips it.
    assert_eq!(git.dir, "remote");
    assert!(git.remote.get().unwrap().verbose);
}

#[test]
fn test_strict_subcommands_hide_parent_flags() {
    let config = ParserConfig {
        strict_subcommands: true,
        ..Default::default()
    };
    let parser = Parser::new::<App>(config).unwrap();
    let mut app = App::default();
    let err = parser
        .parse_with_env(&mut app, &args(&["server", "-v"]), &no_env())
        .unwrap_err();
    assert_eq!(err, Error::UnknownFlag { token: "-v".into() });

    let mut app = App::default();
    parser
        .parse_with_env(&mut app, &args(&["-v", "server"]), &no_env())
        .unwrap_err();
}

#[test]
fn test_parent_flag_named_h_beats_builtin_help() {
    let parser = Parser::new::<Hosted>(ParserConfig::default()).unwrap();

    for list in [&["server", "-h", "localhost"][..], &["-h", "localhost", "server"]] {
        let mut hosted = Hosted::default();
        let invocation = parser
            .parse_with_env(&mut hosted, &args(list), &no_env())
            .unwrap();
        assert_eq!(invocation.path, vec!["server"]);
        assert_eq!(hosted.host, "localhost");
        assert!(hosted.server.is_invoked());
    }

    let mut hosted = Hosted::default();
    let err = parser
        .parse_with_env(&mut hosted, &args(&["server", "--help"]), &no_env())
        .unwrap_err();
    assert_eq!(
        err,
        Error::HelpRequested {
            path: vec!["server".into()]
        }
    );
}

#[test]
fn test_subcommand_word_never_becomes_a_flag_value() {
    let parser = Parser::new::<Switch>(ParserConfig::default()).unwrap();

    // Dispatch reads the parent's boolean -x; under the child -x takes a value.
    let mut switch = Switch::default();
    let err = parser
        .parse_with_env(&mut switch, &args(&["-x", "kid"]), &no_env())
        .unwrap_err();
    assert_eq!(err, Error::MissingArgument { flag: "-x".into() });

    let mut switch = Switch::default();
    parser
        .parse_with_env(&mut switch, &args(&["kid", "-x", "v"]), &no_env())
        .unwrap();
    assert!(!switch.x);
    assert_eq!(switch.kid.get().unwrap().x, "v");
}

#[test]
fn test_no_subcommand_leaves_slot_untouched() {
    let (app, result) = parse_app(&["-v"]);
    assert!(result.unwrap().path.is_empty());
    assert!(app.verbose);
    assert!(!app.server.is_invoked());
}

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

fn parse_settings(
    list: &[&str],
    env: &HashMap<String, String>,
) -> (Settings, Result<Invocation, Error>) {
    let parser = Parser::new::<Settings>(ParserConfig::default()).unwrap();
    let mut settings = Settings::default();
    let result = parser.parse_with_env(&mut settings, &args(list), env);
    (settings, result)
}

#[test]
fn test_precedence_cli_env_default() {
    let full = env(&[("PORT", "7000"), ("TOKEN", "t")]);

    let (settings, result) = parse_settings(&["--port", "9000"], &full);
    result.unwrap();
    assert_eq!(settings.port, 9000);

    let (settings, result) = parse_settings(&[], &full);
    result.unwrap();
    assert_eq!(settings.port, 7000);

    let (settings, result) = parse_settings(&[], &env(&[("TOKEN", "t")]));
    result.unwrap();
    assert_eq!(settings.port, 8080);
}

#[test]
fn test_explicit_false_beats_environment() {
    let (settings, result) = parse_settings(
        &["--verbose=false"],
        &env(&[("VERBOSE", "true"), ("TOKEN", "t")]),
    );
    result.unwrap();
    assert!(!settings.verbose);

    let (settings, result) = parse_settings(&[], &env(&[("VERBOSE", "yes"), ("TOKEN", "t")]));
    result.unwrap();
    assert!(settings.verbose);
}

#[test]
fn test_env_prefix() {
    let config = ParserConfig {
        env_prefix: Some("APP_".into()),
        ..Default::default()
    };
    let parser = Parser::new::<Settings>(config).unwrap();
    let mut settings = Settings::default();
    parser
        .parse_with_env(
            &mut settings,
            &[],
            &env(&[("APP_TOKEN", "secret"), ("PORT", "1")]),
        )
        .unwrap();
    assert_eq!(settings.token, "secret");
    assert_eq!(settings.port, 8080);
}

#[test]
fn test_sequence_flag_keeps_every_occurrence_in_order() {
    let token = env(&[("TOKEN", "t")]);
    for n in [0usize, 1, 3, 7] {
        let mut list = Vec::new();
        let values: Vec<String> = (0..n).map(|i| format!("dir{i}")).collect();
        for (i, value) in values.iter().enumerate() {
            if i % 2 == 0 {
                list.push("-I".to_string());
                list.push(value.clone());
            } else {
                list.push(format!("--include={value}"));
            }
        }
        let refs: Vec<&str> = list.iter().map(String::as_str).collect();
        let (settings, result) = parse_settings(&refs, &token);
        result.unwrap();
        assert_eq!(settings.include, values);
    }
}

#[test]
fn test_optional_bool_flag() {
    let token = env(&[("TOKEN", "t")]);

    let (settings, _) = parse_settings(&[], &token);
    assert_eq!(settings.color, None);

    let (settings, _) = parse_settings(&["--color"], &token);
    assert_eq!(settings.color, Some(true));

    let (settings, _) = parse_settings(&["--color=off"], &token);
    assert_eq!(settings.color, Some(false));
}

#[test]
fn test_optional_value_flag_without_value() {
    let parser = Parser::new::<Compact>(ParserConfig::default()).unwrap();
    let mut compact = Compact::default();
    parser
        .parse_with_env(&mut compact, &args(&["-p"]), &no_env())
        .unwrap();
    assert_eq!(compact.prefix.as_deref(), Some(""));
}

// ---------------------------------------------------------------------------
// Positionals
// ---------------------------------------------------------------------------

fn parse_tool(list: &[&str]) -> (Tool, Result<Invocation, Error>) {
    let parser = Parser::new::<Tool>(ParserConfig::default()).unwrap();
    let mut tool = Tool::default();
    let result = parser.parse_with_env(&mut tool, &args(list), &no_env());
    (tool, result)
}

#[test]
fn test_positionals_fill_innermost_level() {
    let (tool, result) = parse_tool(&["run", "build.sh", "-x", "--", "-a", "b"]);
    assert_eq!(result.unwrap().path, vec!["run"]);
    assert!(tool.x);
    let run = tool.run.get().unwrap();
    assert_eq!(run.script, "build.sh");
    assert_eq!(run.rest, vec!["-a", "b"]);
    assert!(!tool.build.is_invoked());
}

#[test]
fn test_missing_positional() {
    let (_, result) = parse_tool(&["run"]);
    assert_eq!(
        result.unwrap_err(),
        Error::MissingPositional {
            field: "SCRIPT".into()
        }
    );
}

#[test]
fn test_required_sequence_positional_needs_one_word() {
    let parser = Parser::new::<Files>(ParserConfig::default()).unwrap();

    let mut files = Files::default();
    let err = parser
        .parse_with_env(&mut files, &args(&[]), &no_env())
        .unwrap_err();
    assert_eq!(
        err,
        Error::MissingPositional {
            field: "FILES".into()
        }
    );

    let mut files = Files::default();
    parser
        .parse_with_env(&mut files, &args(&["a", "b"]), &no_env())
        .unwrap();
    assert_eq!(files.files, vec!["a", "b"]);
}

#[test]
fn test_leftover_word_without_positionals_is_unknown_subcommand() {
    let (_, result) = parse_tool(&["deploy"]);
    assert_eq!(
        result.unwrap_err(),
        Error::UnknownSubcommand {
            name: "deploy".into()
        }
    );
}

#[test]
fn test_alias_dispatches_to_canonical_name() {
    let (tool, result) = parse_tool(&["B", "-c", "5"]);
    assert_eq!(result.unwrap().path, vec!["build"]);
    assert_eq!(tool.build.get().unwrap().count, 5);
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[test]
fn test_missing_argument() {
    let (_, result) = parse_app(&["server", "--port"]);
    assert_eq!(
        result.unwrap_err(),
        Error::MissingArgument {
            flag: "--port".into()
        }
    );
}

#[test]
fn test_conversion_error() {
    let (_, result) = parse_app(&["server", "-p", "ninety"]);
    let err = result.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConversionError);
    assert_eq!(
        err.to_string(),
        "error processing --port value \"ninety\": \"ninety\" is not a valid integer"
    );
}

#[test]
fn test_required_field_missing() {
    let (_, result) = parse_settings(&[], &no_env());
    assert_eq!(
        result.unwrap_err(),
        Error::RequiredFieldMissing {
            field: "--token".into(),
            env: Some("TOKEN".into())
        }
    );
}

#[test]
fn test_required_subcommand() {
    let parser = Parser::new::<NeedsCommand>(ParserConfig::default()).unwrap();
    let mut dest = NeedsCommand::default();
    let err = parser
        .parse_with_env(&mut dest, &[], &no_env())
        .unwrap_err();
    assert_eq!(
        err,
        Error::RequiredFieldMissing {
            field: "run".into(),
            env: None
        }
    );
}

#[test]
fn test_errors_are_deterministic() {
    for list in [
        &["invalid", "--port", "9000"][..],
        &["server", "-p"][..],
        &["server", "-p", "x"][..],
        &["-vz"][..],
    ] {
        let errors: Vec<Error> = (0..3).map(|_| parse_app(list).1.unwrap_err()).collect();
        assert_eq!(errors[0], errors[1], "{list:?}");
        assert_eq!(errors[1], errors[2], "{list:?}");
    }
}

#[test]
fn test_help_and_version_requests() {
    let config = ParserConfig {
        version: Some("1.2.3".into()),
        ..Default::default()
    };
    let parser = Parser::new::<App>(config).unwrap();

    let mut app = App::default();
    let err = parser
        .parse_with_env(&mut app, &args(&["server", "--help"]), &no_env())
        .unwrap_err();
    assert_eq!(
        err,
        Error::HelpRequested {
            path: vec!["server".into()]
        }
    );

    let mut app = App::default();
    let err = parser
        .parse_with_env(&mut app, &args(&["-h"]), &no_env())
        .unwrap_err();
    assert_eq!(err, Error::HelpRequested { path: Vec::new() });

    let mut app = App::default();
    let err = parser
        .parse_with_env(&mut app, &args(&["server", "--version"]), &no_env())
        .unwrap_err();
    assert_eq!(err, Error::VersionRequested);
}

#[test]
fn test_wrong_destination_type() {
    let parser = Parser::new::<App>(ParserConfig::default()).unwrap();
    let mut wrong = Child::default();
    let err = parser
        .parse_with_env(&mut wrong, &args(&["-v"]), &no_env())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidDestination);
}

#[test]
fn test_parser_shared_across_threads() {
    let parser = Parser::new::<App>(ParserConfig::default()).unwrap();
    std::thread::scope(|scope| {
        for port in 1..=4 {
            let parser = &parser;
            scope.spawn(move || {
                let mut app = App::default();
                let list = args(&["server", "-p", &port.to_string()]);
                parser.parse_with_env(&mut app, &list, &no_env()).unwrap();
                assert_eq!(app.server.get().unwrap().port, port);
            });
        }
    });
}
