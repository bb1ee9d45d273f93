use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::Value;
use uuid::Uuid;

fn unique_workspace(prefix: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("{prefix}-{}", Uuid::now_v7()));
    std::fs::create_dir_all(&path).expect("workspace should be creatable");
    path
}

fn run_tally(root: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tally"))
        .arg("--db")
        .arg(root.join("data/tally.sqlite"))
        .arg("--config")
        .arg(root.join("config.toml"))
        .args(args)
        .env("NO_COLOR", "1")
        .env_remove("TALLY_LOG")
        .output()
        .expect("tally command should run")
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "expected success but failed.\nstdout:\n{}\nstderr:\n{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

fn assert_failure(output: &Output) {
    assert!(
        !output.status.success(),
        "expected failure but command succeeded.\nstdout:\n{}\nstderr:\n{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn parse_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be valid json")
}

#[test]
fn counter_and_tick_lifecycle() {
    let root = unique_workspace("tally-cli-counter");

    let created = run_tally(&root, &["counter", "new", "push-ups", "--json"]);
    assert_success(&created);
    let counter = parse_json(&created);
    assert_eq!(counter["name"], "push-ups");
    let id = counter["id"].as_i64().expect("id should be numeric");
    assert!(id > 0);
    assert!(root.join("data/tally.sqlite").exists());

    assert_success(&run_tally(&root, &["tick", "add", "push-ups", "20"]));
    assert_success(&run_tally(
        &root,
        &["tick", "add", "push-ups", "15", "--at", "2026-03-01T07:30:00Z"],
    ));

    let ticks = run_tally(&root, &["tick", "ls", "push-ups", "--json"]);
    assert_success(&ticks);
    let ticks = parse_json(&ticks);
    assert_eq!(ticks.as_array().expect("array").len(), 2);

    let dated = run_tally(
        &root,
        &["tick", "ls", "--until", "2026-03-01", "--json"],
    );
    assert_success(&dated);
    let dated = parse_json(&dated);
    assert_eq!(dated.as_array().expect("array").len(), 1);
    assert_eq!(dated[0]["time_for_data"], "2026-03-01T07:30:00Z");

    let stats = run_tally(&root, &["stats", &id.to_string(), "--json"]);
    assert_success(&stats);
    let stats = parse_json(&stats);
    assert_eq!(stats["count"], 2);
    assert_eq!(stats["total"], 35.0);

    let shown = run_tally(&root, &["counter", "show", "push-ups"]);
    assert_success(&shown);
    assert!(stdout(&shown).contains("total:    35"));

    assert_success(&run_tally(&root, &["counter", "rename", "push-ups", "pushups"]));
    assert_success(&run_tally(&root, &["counter", "rm", "pushups"]));
    let listed = run_tally(&root, &["counter", "ls", "--json"]);
    assert_success(&listed);
    assert_eq!(parse_json(&listed), Value::Array(Vec::new()));

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn totals_and_board_cover_all_counters() {
    let root = unique_workspace("tally-cli-totals");
    assert_success(&run_tally(&root, &["counter", "new", "water"]));
    assert_success(&run_tally(&root, &["counter", "new", "coffee"]));
    assert_success(&run_tally(&root, &["tick", "add", "water", "2"]));
    assert_success(&run_tally(&root, &["tick", "add", "water", "-1"]));

    let totals = run_tally(&root, &["stats", "--json"]);
    assert_success(&totals);
    let totals = parse_json(&totals);
    assert_eq!(totals["sum"], 1.0);
    assert_eq!(totals["counters"].as_array().expect("array").len(), 2);

    let board = run_tally(&root, &["board", "--json"]);
    assert_success(&board);
    let board = parse_json(&board);
    assert_eq!(board.as_array().expect("array").len(), 2);

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn notes_and_items_roll_up_state() {
    let root = unique_workspace("tally-cli-notes");
    let created = run_tally(&root, &["note", "new", "Groceries", "-s", "weekend", "--json"]);
    assert_success(&created);
    let note_id = parse_json(&created)["id"]
        .as_i64()
        .expect("id should be numeric")
        .to_string();

    let milk = run_tally(
        &root,
        &["item", "add", &note_id, "milk", "--state", "unchecked", "--json"],
    );
    assert_success(&milk);
    let milk_id = parse_json(&milk)["id"]
        .as_i64()
        .expect("id should be numeric")
        .to_string();
    assert_success(&run_tally(
        &root,
        &["item", "add", &note_id, "bread", "--state", "unchecked"],
    ));

    let toggled = run_tally(&root, &["item", "check", &milk_id]);
    assert_success(&toggled);
    assert!(stdout(&toggled).contains("is now checked"));

    let shown = run_tally(&root, &["note", "show", &note_id, "--json"]);
    assert_success(&shown);
    let shown = parse_json(&shown);
    assert_eq!(shown["state"], "partial");
    assert_eq!(shown["items"].as_array().expect("array").len(), 2);

    let text = run_tally(&root, &["note", "show", &note_id]);
    assert_success(&text);
    assert!(stdout(&text).contains("[x]"));

    assert_success(&run_tally(&root, &["note", "rm", &note_id]));
    assert_failure(&run_tally(&root, &["item", "check", &milk_id]));

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn errors_exit_non_zero_with_prefix() {
    let root = unique_workspace("tally-cli-errors");

    let missing = run_tally(&root, &["tick", "add", "ghost"]);
    assert_failure(&missing);
    assert!(String::from_utf8_lossy(&missing.stderr).starts_with("error: counter 'ghost' not found"));

    let bad_field = run_tally(&root, &["counter", "ls", "--field", "sometime"]);
    assert_failure(&bad_field);

    let inverted = run_tally(
        &root,
        &["tick", "ls", "--since", "2026-03-02", "--until", "2026-03-01"],
    );
    assert_failure(&inverted);

    let bad_state = run_tally(&root, &["item", "state", "1", "maybe"]);
    assert_failure(&bad_state);
    assert!(String::from_utf8_lossy(&bad_state.stderr).contains("invalid check state"));

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn config_file_changes_display_and_bad_config_fails() {
    let root = unique_workspace("tally-cli-config");
    std::fs::write(
        root.join("config.toml"),
        "[display]\nomit_time = true\n",
    )
    .expect("config should be writable");
    assert_success(&run_tally(&root, &["counter", "new", "steps"]));
    assert_success(&run_tally(
        &root,
        &["tick", "add", "steps", "100", "--at", "2026-03-01T10:15:00Z"],
    ));
    let listed = run_tally(&root, &["tick", "ls", "steps"]);
    assert_success(&listed);
    let text = stdout(&listed);
    assert!(text.contains("2026-03-01"), "{text}");
    assert!(!text.contains("10:15"), "{text}");

    std::fs::write(root.join("config.toml"), "[display\n").expect("config should be writable");
    let broken = run_tally(&root, &["counter", "ls"]);
    assert_failure(&broken);
    assert!(String::from_utf8_lossy(&broken.stderr).contains("invalid config"));

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn status_reports_schema_version() {
    let root = unique_workspace("tally-cli-status");
    let status = run_tally(&root, &["status", "--json"]);
    assert_success(&status);
    let status = parse_json(&status);
    assert_eq!(status["schema_version"], "2");
    assert_eq!(status["counters"], 0);
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn completions_print_without_touching_the_store() {
    let root = unique_workspace("tally-cli-completions");
    let output = run_tally(&root, &["completions", "bash"]);
    assert_success(&output);
    assert!(stdout(&output).contains("tally"));
    assert!(!root.join("data").exists());
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn calendar_edge_dates_report_instead_of_crashing() {
    let root = unique_workspace("tally-cli-edges");
    std::fs::write(root.join("config.toml"), "[display]\nutc_offset = \"+02:00\"\n")
        .expect("config should be writable");
    assert_success(&run_tally(&root, &["counter", "new", "far"]));
    assert_success(&run_tally(
        &root,
        &["tick", "add", "far", "1", "--at", "9999-12-31T23:00:00Z"],
    ));

    let listed = run_tally(&root, &["tick", "ls", "far", "--until", "9999-12-31"]);
    assert_success(&listed);
    assert!(stdout(&listed).contains("9999-12-31 23:00"), "{}", stdout(&listed));
    assert_success(&run_tally(&root, &["counter", "show", "far"]));

    let beyond = run_tally(
        &root,
        &["tick", "add", "far", "1", "--at", "9999-12-31T23:00:00-05:00"],
    );
    assert_failure(&beyond);
    assert!(String::from_utf8_lossy(&beyond.stderr).starts_with("error: invalid time"));

    let _ = std::fs::remove_dir_all(root);
}
