//! End-to-end tests for the jarshade CLI
//!
//! These tests verify:
//! - Dry-run mode leaves no output behind
//! - CLI produces the expected JSON report schema
//! - Exit codes are correct for the failure categories
//! - The configuration file is picked up from the working directory

mod common;

use assert_cmd::Command;
use common::{class_bytes, jar_names, write_classes_dir, write_test_jar};
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

/// The CLI binary, run from `dir` so no stray configuration is picked up
fn jarshade(dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_jarshade"));
    cmd.current_dir(dir).env_remove("RUST_LOG");
    cmd
}

/// A project with compiled classes and one dependency jar
fn create_test_project() -> TempDir {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    write_classes_dir(
        &temp_dir.path().join("build/classes"),
        &[(
            "org/leavesmc/leavesclip/Leavesclip.class",
            &class_bytes("org/leavesmc/leavesclip/Leavesclip", &["org/apache/Util"]),
        )],
    );
    write_test_jar(
        &temp_dir.path().join("libs/commons.jar"),
        &[
            ("META-INF/LICENSE.txt", b"Apache License 2.0"),
            ("org/apache/Util.class", &class_bytes("org/apache/Util", &[])),
        ],
    );
    temp_dir
}

/// Arguments equivalent to the project's configuration file
const PROJECT_ARGS: &[&str] = &[
    "--input",
    "build/classes",
    "-o",
    "build/libs/app-all.jar",
    "--jar",
    "libs/commons.jar",
    "--prefix",
    "leavesclip.libs",
    "--relocate",
    "org.apache",
    "--exclude",
    "META-INF/LICENSE.txt",
    "--offline",
];

const PROJECT_CONFIG: &str = r#"input = "build/classes"
output = "build/libs/app-all.jar"
offline = true
exclude = ["META-INF/LICENSE.txt", "META-INF/NOTICE.txt"]

[relocation]
prefix = "leavesclip.libs"
packages = ["org.apache", "org.tukaani", "io.sigpipe"]

[[dependencies]]
path = "libs/commons.jar"
"#;

mod dry_run_tests {
    use super::*;

    /// Test that dry-run mode does not write the output jar
    #[test]
    fn test_dry_run_writes_nothing() {
        let temp_dir = create_test_project();

        jarshade(temp_dir.path())
            .args(PROJECT_ARGS)
            .arg("--dry-run")
            .assert()
            .success()
            .stdout(predicate::str::starts_with("(dry-run)"));

        assert!(!temp_dir.path().join("build/libs/app-all.jar").exists());
    }

    /// Test dry-run with quiet mode prints a single line
    #[test]
    fn test_dry_run_with_quiet_mode() {
        let temp_dir = create_test_project();

        let assert = jarshade(temp_dir.path())
            .args(PROJECT_ARGS)
            .args(["-n", "-q"])
            .assert()
            .success();

        let stdout = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
        assert_eq!(stdout.lines().count(), 1);
        assert!(stdout.contains("3 entries would be written to build/libs/app-all.jar"));
    }
}

mod json_output_tests {
    use super::*;

    /// Test the JSON report schema
    #[test]
    fn test_json_output_schema() {
        let temp_dir = create_test_project();

        let assert = jarshade(temp_dir.path())
            .args(PROJECT_ARGS)
            .args(["--dry-run", "--json"])
            .assert()
            .success();

        let json: serde_json::Value = serde_json::from_slice(&assert.get_output().stdout)
            .expect("stdout should be valid JSON");

        assert_eq!(json["dry_run"], true);
        assert_eq!(json["output"], "build/libs/app-all.jar");
        assert_eq!(json["summary"]["entries"], 3);
        assert_eq!(json["summary"]["dependencies"], 1);
        assert_eq!(json["summary"]["relocated"], 1);
        assert_eq!(json["summary"]["excluded"], 1);
        assert!(json["finished_at"].is_string());

        let artifacts = json["artifacts"].as_array().unwrap();
        assert_eq!(artifacts.len(), 2);
        assert_eq!(artifacts[0]["primary"], true);
        assert_eq!(artifacts[1]["relocated"], 1);
    }
}

mod exit_code_tests {
    use super::*;

    #[test]
    fn test_exit_code_success_writes_jar() {
        let temp_dir = create_test_project();

        jarshade(temp_dir.path())
            .args(PROJECT_ARGS)
            .assert()
            .success()
            .stdout(predicate::str::contains("Summary:"));

        let names = jar_names(&temp_dir.path().join("build/libs/app-all.jar"));
        assert_eq!(
            names,
            vec![
                "META-INF/MANIFEST.MF",
                "leavesclip/libs/org/apache/Util.class",
                "org/leavesmc/leavesclip/Leavesclip.class",
            ]
        );
    }

    #[test]
    fn test_exit_code_help() {
        let temp_dir = TempDir::new().unwrap();
        jarshade(temp_dir.path())
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("--relocate"));
    }

    #[test]
    fn test_exit_code_version() {
        let temp_dir = TempDir::new().unwrap();
        jarshade(temp_dir.path())
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn test_exit_code_missing_input() {
        let temp_dir = TempDir::new().unwrap();
        jarshade(temp_dir.path())
            .args(["--input", "does-not-exist", "-o", "out.jar"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("Error:"));
    }

    #[test]
    fn test_exit_code_missing_output_option() {
        let temp_dir = create_test_project();
        jarshade(temp_dir.path())
            .args(["--input", "build/classes"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("output"));
    }

    #[test]
    fn test_exit_code_unresolvable_dependency() {
        let temp_dir = create_test_project();
        std::fs::create_dir_all(temp_dir.path().join("m2")).unwrap();

        jarshade(temp_dir.path())
            .args(PROJECT_ARGS)
            .args([
                "--repository",
                "m2",
                "--dependency",
                "org.tukaani:xz:1.9",
            ])
            .assert()
            .code(3)
            .stderr(predicate::str::contains("org.tukaani:xz:1.9"));
    }

    #[test]
    fn test_exit_code_conflict() {
        let temp_dir = create_test_project();
        write_test_jar(
            &temp_dir.path().join("libs/other.jar"),
            &[("org/apache/Util.class", &class_bytes("org/apache/Util", &["x"]))],
        );

        jarshade(temp_dir.path())
            .args(PROJECT_ARGS)
            .args(["--jar", "libs/other.jar"])
            .assert()
            .code(4)
            .stderr(predicate::str::contains("conflicting entry"));

        assert!(!temp_dir.path().join("build/libs/app-all.jar").exists());
    }
}

mod config_file_tests {
    use super::*;

    /// Test that ./jarshade.toml is used when no configuration is given
    #[test]
    fn test_default_config_file() {
        let temp_dir = create_test_project();
        std::fs::write(temp_dir.path().join("jarshade.toml"), PROJECT_CONFIG).unwrap();

        jarshade(temp_dir.path()).assert().success();

        let names = jar_names(&temp_dir.path().join("build/libs/app-all.jar"));
        assert!(names.contains(&"leavesclip/libs/org/apache/Util.class".to_string()));
        assert!(!names.contains(&"META-INF/LICENSE.txt".to_string()));
    }

    /// Test that CLI values override the configuration file
    #[test]
    fn test_cli_overrides_config() {
        let temp_dir = create_test_project();
        std::fs::write(temp_dir.path().join("shade.toml"), PROJECT_CONFIG).unwrap();

        jarshade(temp_dir.path())
            .args(["shade.toml", "-o", "custom.jar"])
            .assert()
            .success();

        assert!(temp_dir.path().join("custom.jar").exists());
        assert!(!temp_dir.path().join("build/libs/app-all.jar").exists());
    }

    #[test]
    fn test_invalid_config_file() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("jarshade.toml"), "unknown_key = 1\n").unwrap();

        jarshade(temp_dir.path())
            .assert()
            .code(2)
            .stderr(predicate::str::contains("Error:"));
    }
}
