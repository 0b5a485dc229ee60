use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

fn write_snapshot(dir: &Path, name: &str, files: &[(&str, &str)]) {
    let file = fs::File::create(dir.join(name)).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    for (path, content) in files {
        writer
            .start_file(*path, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap();
}

fn strata() -> Command {
    Command::cargo_bin("strata").unwrap()
}

fn seed_timeline(dir: &Path) {
    write_snapshot(
        dir,
        "Demo_0001.zip",
        &[("main.py", "print('hello')\n"), ("README.md", "# Demo\n")],
    );
    write_snapshot(
        dir,
        "Demo_0002.zip",
        &[
            ("main.py", "print('hello')\nprint('world')\n"),
            ("README.md", "# Demo\n"),
        ],
    );
    write_snapshot(
        dir,
        "Demo_0003.zip",
        &[
            ("src/main.py", "print('hello')\nprint('world')\n"),
            ("src/util.py", "def helper():\n    return 1\n"),
            ("README.md", "# Demo\n\nNow with a src layout.\n"),
        ],
    );
}

#[test]
fn projects_lists_discovered_timelines() {
    let dir = TempDir::new().unwrap();
    seed_timeline(dir.path());

    strata()
        .args(["projects", "--dir"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("demo"))
        .stdout(predicate::str::contains("3 snapshots"));
}

#[test]
fn snapshots_lists_ordered_labels() {
    let dir = TempDir::new().unwrap();
    seed_timeline(dir.path());

    strata()
        .args(["snapshots", "Demo", "--dir"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 3 snapshots for 'Demo'"))
        .stdout(predicate::str::contains("0001"));
}

#[test]
fn diff_prints_a_change_summary() {
    let dir = TempDir::new().unwrap();
    seed_timeline(dir.path());

    strata()
        .arg("diff")
        .arg(dir.path().join("Demo_0002.zip"))
        .arg(dir.path().join("Demo_0003.zip"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Added:"))
        .stdout(predicate::str::contains("Moved:     1 files"))
        .stdout(predicate::str::contains("main.py -> src/main.py"))
        .stdout(predicate::str::contains("Status docs found: README.md"));
}

#[test]
fn plan_prints_the_analysis_summary() {
    let dir = TempDir::new().unwrap();
    seed_timeline(dir.path());
    let state_dir = dir.path().join("state");

    strata()
        .args(["plan", "Demo", "--dir"])
        .arg(dir.path())
        .arg("--state-dir")
        .arg(&state_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Analysis Plan Summary"))
        .stdout(predicate::str::contains("Change Distribution (2 transitions):"))
        .stdout(predicate::str::contains("Planned Units:"));
}

#[test]
fn plan_exports_the_json_contract() {
    let dir = TempDir::new().unwrap();
    seed_timeline(dir.path());
    let export = dir.path().join("contract.json");

    strata()
        .args(["plan", "Demo", "--json", "--dir"])
        .arg(dir.path())
        .arg("--export")
        .arg(&export)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"units\""));

    let contract: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&export).unwrap()).unwrap();
    assert_eq!(contract["diffs"].as_array().unwrap().len(), 2);
    assert_eq!(contract["magnitudes"].as_array().unwrap().len(), 2);
    assert!(contract["breakpoints"]["minor_threshold"].is_number());
}

#[test]
fn status_reports_missing_progress() {
    let dir = TempDir::new().unwrap();
    seed_timeline(dir.path());

    strata()
        .args(["status", "Demo", "--dir"])
        .arg(dir.path())
        .arg("--state-dir")
        .arg(dir.path().join("state"))
        .assert()
        .success()
        .stdout(predicate::str::contains("No stored progress for 'Demo'"));
}

#[test]
fn report_renders_markdown() {
    let dir = TempDir::new().unwrap();
    seed_timeline(dir.path());
    let output = dir.path().join("history.md");

    strata()
        .args(["report", "Demo", "--dir"])
        .arg(dir.path())
        .arg("--state-dir")
        .arg(dir.path().join("state"))
        .arg("--output")
        .arg(&output)
        .assert()
        .success();

    let markdown = fs::read_to_string(&output).unwrap();
    assert!(markdown.contains("# Project History: Demo"));
    assert!(markdown.contains("- **Total snapshots:** 3"));
    assert!(markdown.contains("_Not yet narrated._"));
}

#[test]
fn unparseable_snapshot_names_fail_loudly() {
    let dir = TempDir::new().unwrap();
    seed_timeline(dir.path());
    fs::write(dir.path().join("Demo_final-copy.zip"), b"junk").unwrap();

    strata()
        .args(["plan", "Demo", "--dir"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("unparseable suffixes"));
}
