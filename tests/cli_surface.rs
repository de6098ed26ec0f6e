//! Smoke tests for the topsub binary surface.
//!
//! These validate the documented exit codes end-to-end: 0 for a committed
//! submission and for help, 1 for argument errors and failed attempts.

use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

fn topsub_bin() -> &'static str {
    env!("CARGO_BIN_EXE_topsub")
}

fn write_sandbox(home: &Path) {
    let conf = home.join("conf");
    std::fs::create_dir_all(&conf).unwrap();
    std::fs::write(conf.join("devel.toml"), "[topsub]\npacking.containers = 2\n").unwrap();
    std::fs::write(home.join("word-count.tar.gz"), b"fake tarball bytes").unwrap();
    std::fs::write(
        home.join("word-count.json"),
        r#"{
            "id": "word-count-a1b2",
            "name": "word-count",
            "components": [{"name": "reader", "parallelism": 2}]
        }"#,
    )
    .unwrap();
}

fn submit_command_for_cluster(home: &Path, cluster: &str) -> Command {
    let mut cmd = Command::new(topsub_bin());
    cmd.arg("--cluster")
        .arg(cluster)
        .arg("--role")
        .arg("ads")
        .arg("--environment")
        .arg("staging")
        .arg("--home")
        .arg(home)
        .arg("--config-path")
        .arg(home.join("conf"))
        .arg("--topology-package")
        .arg(home.join("word-count.tar.gz"))
        .arg("--topology-defn")
        .arg(home.join("word-count.json"))
        .arg("--topology-artifact")
        .arg(home.join("word-count.jar"));
    cmd
}

fn submit_command(home: &Path) -> Command {
    submit_command_for_cluster(home, "devel")
}

#[test]
fn help_prints_usage_and_exits_zero() {
    let output = Command::new(topsub_bin()).arg("--help").output().unwrap();
    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--cluster"));
    assert!(stdout.contains("--topology-package"));
    assert!(stdout.contains("--config-override"));
}

#[test]
fn missing_arguments_exit_one() {
    let output = Command::new(topsub_bin()).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn committed_submission_exits_zero_and_rerun_exits_one() {
    let home = TempDir::new().unwrap();
    write_sandbox(home.path());

    let first = submit_command(home.path()).output().unwrap();
    assert_eq!(
        first.status.code(),
        Some(0),
        "stderr: {}",
        String::from_utf8_lossy(&first.stderr)
    );
    assert!(home.path().join("state").join("word-count.running").exists());

    // The topology is now registered as running; the validation check
    // refuses a duplicate submission.
    let second = submit_command(home.path()).output().unwrap();
    assert_eq!(second.status.code(), Some(1));
}

#[test]
fn unknown_collaborator_type_exits_one() {
    let home = TempDir::new().unwrap();
    write_sandbox(home.path());

    let output = submit_command(home.path())
        .arg("-o")
        .arg("topsub.class.uploader=s3")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let combined = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(combined.contains("s3"), "output: {combined}");
}

#[test]
fn missing_cluster_file_exits_one() {
    let home = TempDir::new().unwrap();
    write_sandbox(home.path());

    let output = submit_command_for_cluster(home.path(), "nowhere")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let combined = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(combined.contains("nowhere"), "output: {combined}");
}
