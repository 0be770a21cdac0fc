use regex::Regex;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

struct TestContext {
    _dir: TempDir,
    inventory_path: PathBuf,
    prefs_path: PathBuf,
}

impl TestContext {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let inventory_path = dir.path().join("inventory.tsv");
        let prefs_path = dir.path().join("prefs.json");

        let mut inventory = File::create(&inventory_path).unwrap();
        writeln!(inventory, "# only one hat to choose from").unwrap();
        writeln!(inventory, "lucky hat").unwrap();

        let mut prefs = File::create(&prefs_path).unwrap();
        writeln!(prefs, r#"{{ "prefs": {{ "tiebreaker": "" }} }}"#).unwrap();

        Self {
            _dir: dir,
            inventory_path,
            prefs_path,
        }
    }
}

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_gearforge"))
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .args(args)
        .output()
        .expect("Failed to execute binary")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn test_maximize_prints_loadout_and_score() {
    let output = run(&["maximize", "item"]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let out = stdout(&output);
    assert!(out.contains("Jekyllin hide belt"), "stdout: {}", out);
    let score = Regex::new(r"Score (\d+\.\d{2})").unwrap();
    let caps = score.captures(&out).expect("score line missing");
    let value: f64 = caps[1].parse().unwrap();
    assert!(value > 100.0);
}

#[test]
fn test_parse_lists_weights() {
    let output = run(&["parse", "10 item, min 50 hp"]);
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("Item Drop"));
    assert!(out.contains("Maximum HP"));
}

#[test]
fn test_bad_keyword_exits_nonzero() {
    let output = run(&["parse", "10 charisma"]);
    assert!(!output.status.success());
    let output = run(&["maximize", "10 charisma"]);
    assert!(!output.status.success());
}

#[test]
fn test_unsatisfiable_exits_nonzero() {
    // One clown wig is nowhere near the four pieces required.
    let output = run(&["maximize", "clownosity"]);
    assert!(!output.status.success());
}

#[test]
fn test_json_output() {
    let output = run(&["maximize", "item", "--json"]);
    assert!(output.status.success());

    let out = stdout(&output);
    let start = out.find('{').expect("no JSON in output");
    let json: serde_json::Value = serde_json::from_str(out[start..].trim()).unwrap();
    assert!(json["score"].as_f64().unwrap() > 100.0);
    assert!(json["changes"].as_u64().is_some());
}

#[test]
fn test_prefs_file_is_validated() {
    let ctx = TestContext::new();
    let output = run(&["maximize", "item", "-p", ctx.prefs_path.to_str().unwrap()]);
    assert!(!output.status.success());
}

#[test]
fn test_inventory_override() {
    let ctx = TestContext::new();
    let output = run(&["maximize", "item", "-i", ctx.inventory_path.to_str().unwrap()]);
    assert!(output.status.success());

    let out = stdout(&output);
    assert!(out.contains("lucky hat"));
    assert!(!out.contains("Jekyllin"));
}

#[test]
fn test_missing_data_file() {
    let output = run(&["-d", "/no/such/game.json", "maximize", "item"]);
    assert!(!output.status.success());
}
