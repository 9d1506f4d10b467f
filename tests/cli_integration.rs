//! Integration tests for the CLI
//!
//! Tests the check, fix, verify and rules commands against a temp project

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const NEEDS_THEORY: &str = r#"class Tests {
    [InlineData(1)]
    public void Check(int value) { }
}
"#;

const FIXED: &str = r#"class Tests {
    [Theory]
    [InlineData(1)]
    public void Check(int value) { }
}
"#;

/// Helper to create a project with one flagged and one clean source file
fn setup_project() -> TempDir {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("src");
    fs::create_dir(&src).unwrap();
    fs::write(src.join("Tests.cs"), NEEDS_THEORY).unwrap();
    fs::write(
        src.join("Clean.cs"),
        "class Clean {\n    [Fact]\n    public void Ok() { }\n}\n",
    )
    .unwrap();
    fs::write(src.join("notes.txt"), "[InlineData(1)] not C#").unwrap();
    dir
}

fn fixwright(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_fixwright"))
        .args(args)
        .current_dir(dir)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

#[test]
fn test_fix_help() {
    let dir = TempDir::new().unwrap();
    let output = fixwright(dir.path(), &["fix", "--help"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Apply fixes until no fixable diagnostic remains"));
}

#[test]
fn test_check_reports_and_fails() {
    let project = setup_project();
    let output = fixwright(project.path(), &["check", "src"]);

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Tests.cs:3:17: warning[X1008]"));
    assert!(stdout.contains("(fixable)"));
    assert!(stdout.contains("1 diagnostic(s) in 2 file(s)"));
}

#[test]
fn test_check_json() {
    let project = setup_project();
    let output = fixwright(project.path(), &["check", "src/Tests.cs", "--json"]);

    let stdout = String::from_utf8_lossy(&output.stdout);
    let reports: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let diagnostics = &reports[0]["diagnostics"];
    assert_eq!(diagnostics[0]["rule_id"], "X1008");
    assert_eq!(diagnostics[0]["severity"], "warning");
}

#[test]
fn test_check_clean_succeeds() {
    let project = setup_project();
    let output = fixwright(project.path(), &["check", "src/Clean.cs"]);
    assert!(output.status.success());
}

#[test]
fn test_fix_rewrites_files() {
    let project = setup_project();
    let output = fixwright(project.path(), &["fix", "src"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Fixed"));
    assert!(stdout.contains("Summary:"));
    assert_eq!(
        fs::read_to_string(project.path().join("src/Tests.cs")).unwrap(),
        FIXED
    );

    // Second run has nothing left to do
    let again = fixwright(project.path(), &["check", "src"]);
    assert!(again.status.success());
}

#[test]
fn test_fix_dry_run_with_diff() {
    let project = setup_project();
    let output = fixwright(project.path(), &["fix", "src", "--dry-run", "--diff"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("DRY RUN"));
    assert!(stdout.contains("+    [Theory]"));
    assert_eq!(
        fs::read_to_string(project.path().join("src/Tests.cs")).unwrap(),
        NEEDS_THEORY
    );
}

#[test]
fn test_fix_with_key() {
    let project = setup_project();
    let output = fixwright(
        project.path(),
        &["fix", "src", "--key", "remove-conflicting-markers"],
    );

    assert!(output.status.success());
    assert_eq!(
        fs::read_to_string(project.path().join("src/Tests.cs")).unwrap(),
        "class Tests {\n    public void Check(int value) { }\n}\n"
    );
}

#[test]
fn test_config_renames_attributes() {
    let project = setup_project();
    fs::write(
        project.path().join("fixwright.toml"),
        "[attributes]\ntheory = \"TestCase\"\n",
    )
    .unwrap();

    let output = fixwright(project.path(), &["fix", "src/Tests.cs"]);
    assert!(output.status.success());
    let fixed = fs::read_to_string(project.path().join("src/Tests.cs")).unwrap();
    assert!(fixed.contains("[TestCase]"));
}

#[test]
fn test_invalid_config_is_reported() {
    let project = setup_project();
    let config = project.path().join("bad.toml");
    fs::write(&config, "[engine]\nmax_iterations = 0\n").unwrap();

    let output = fixwright(
        project.path(),
        &["--config", config.to_str().unwrap(), "check", "src"],
    );
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid engine config"));
}

#[test]
fn test_verify_fixtures() {
    let project = setup_project();
    let fixtures = project.path().join("cases.toml");
    fs::write(
        &fixtures,
        r#"
[[cases]]
name = "passes"
before = '''
class Tests {
    [Fact]
    public void {|X1001:Check|}(int value) { }
}
'''
after = '''
class Tests {
    [Fact]
    public void Check() { }
}
'''

[[cases]]
name = "fails"
before = "class Tests { [Fact] public void Check(int value) { } }"
"#,
    )
    .unwrap();

    let output = fixwright(project.path(), &["verify", "cases.toml"]);
    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stdout.contains("✓ passes"));
    assert!(stderr.contains("✗ fails: FAILED"));
    assert!(stderr.contains("unexpected"));
    assert!(stdout.contains("1 passed"));
}

#[test]
fn test_rules_lists_providers() {
    let dir = TempDir::new().unwrap();
    let output = fixwright(dir.path(), &["rules"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("X1008  mark-as-valid-target, remove-conflicting-markers"));
    assert!(stdout.contains("X2018  use-assignable-from"));
}
