use clap::{CommandFactory, FromArgMatches, Parser};
use gearforge::config::{Config, MaximizerPrefs, DEFAULT_TIEBREAKER};
use gearforge::GearForgeError;
use std::fs;

// Mirrors how the binary flattens the preferences into a subcommand.
#[derive(Parser, Debug)]
struct Harness {
    #[command(flatten)]
    config: Config,
}

fn parse_cli(args: &[&str]) -> (MaximizerPrefs, clap::ArgMatches) {
    let mut argv = vec!["gearforge"];
    argv.extend_from_slice(args);
    let matches = Harness::command().get_matches_from(argv);
    let harness = Harness::from_arg_matches(&matches).unwrap();
    (harness.config.prefs, matches)
}

fn file_prefs() -> MaximizerPrefs {
    MaximizerPrefs {
        always_current: false,
        allow_foldables: false,
        tiebreaker: "1 meat".to_string(),
        verbose_dump: 1,
    }
}

#[test]
fn test_defaults() {
    let prefs = MaximizerPrefs::default();
    assert!(!prefs.always_current);
    assert!(prefs.allow_foldables);
    assert_eq!(prefs.tiebreaker, DEFAULT_TIEBREAKER);
    assert_eq!(prefs.verbose_dump, 0);
    assert!(prefs.validate().is_ok());
}

#[test]
fn test_cli_defaults_match_serde_defaults() {
    let (cli, _) = parse_cli(&[]);
    assert_eq!(cli, MaximizerPrefs::default());
}

#[test]
fn test_partial_json_fills_defaults() {
    let prefs: MaximizerPrefs = serde_json::from_str(r#"{ "always_current": true }"#).unwrap();
    assert!(prefs.always_current);
    assert!(prefs.allow_foldables);
    assert_eq!(prefs.tiebreaker, DEFAULT_TIEBREAKER);
}

#[test]
fn test_json_round_trip_through_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("prefs.json");
    let config = Config { prefs: file_prefs() };
    fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

    let loaded = Config::load_from_file(&path).unwrap();
    assert_eq!(loaded.prefs, file_prefs());
}

#[test]
fn test_prefs_file_rejects_empty_tiebreaker() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("prefs.json");
    fs::write(&path, r#"{ "tiebreaker": "" }"#).unwrap();

    let err = MaximizerPrefs::load_from_file(&path).unwrap_err();
    assert!(matches!(err, GearForgeError::Config(_)));
}

#[test]
fn test_missing_file_is_io_error() {
    let err = Config::load_from_file("/definitely/not/here.json").unwrap_err();
    assert!(matches!(err, GearForgeError::Io(_)));
}

#[test]
fn test_merge_only_takes_explicit_flags() {
    let (cli, matches) = parse_cli(&["--always-current", "--verbose-dump", "2"]);
    let mut prefs = file_prefs();
    prefs.merge_from_cli(&cli, &matches);

    assert!(prefs.always_current);
    assert_eq!(prefs.verbose_dump, 2);
    // Untouched on the command line, so the file's values survive.
    assert!(!prefs.allow_foldables);
    assert_eq!(prefs.tiebreaker, "1 meat");
}

#[test]
fn test_merge_boolean_set_action() {
    let (cli, matches) = parse_cli(&["--allow-foldables", "true", "--tiebreaker", "1 item"]);
    let mut prefs = file_prefs();
    prefs.merge_from_cli(&cli, &matches);

    assert!(prefs.allow_foldables);
    assert_eq!(prefs.tiebreaker, "1 item");
    assert_eq!(prefs.verbose_dump, 1);
}
