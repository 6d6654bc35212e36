use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::{tempdir, TempDir};

/// A fabricated home directory with cleanable content and a config that keeps
/// the run away from system-wide locations (/tmp, /var/log).
fn setup_home() -> TempDir {
    let home = tempdir().unwrap();

    fs::create_dir_all(home.path().join(".macsweep")).unwrap();
    fs::write(
        home.path().join(".macsweep/config.json"),
        r#"{"categories":{"temp_files":false,"logs":false},"large_file_min_mb":0}"#,
    )
    .unwrap();

    let crash = home.path().join("Library/Application Support/CrashReporter");
    fs::create_dir_all(&crash).unwrap();
    fs::write(crash.join("report.crash"), vec![0u8; 128]).unwrap();

    let caches = home.path().join("Library/Caches");
    fs::create_dir_all(&caches).unwrap();
    fs::write(caches.join("fresh.db"), vec![0u8; 32]).unwrap();

    home
}

fn sweep(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("macsweep").unwrap();
    cmd.env("HOME", home.path()).current_dir(home.path());
    cmd
}

#[test]
fn dry_run_previews_without_deleting() {
    let home = setup_home();

    sweep(&home)
        .args(["--dry-run", "--skip-trash", "--skip-maintenance"])
        .assert()
        .success()
        .stdout(predicate::str::contains("DRY RUN MODE"))
        .stdout(predicate::str::contains("Dry-run summary"));

    assert!(home
        .path()
        .join("Library/Application Support/CrashReporter/report.crash")
        .exists());
}

#[test]
fn clean_removes_crash_reports_but_keeps_fresh_caches() {
    let home = setup_home();

    sweep(&home)
        .args(["--skip-trash", "--skip-maintenance"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Summary: removed"))
        .stdout(predicate::str::contains("Total space freed"));

    let crash = home.path().join("Library/Application Support/CrashReporter");
    assert!(crash.exists());
    assert!(!crash.join("report.crash").exists());
    // Fresh files in age-ruled directories are untouched.
    assert!(home.path().join("Library/Caches/fresh.db").exists());
}

#[test]
fn find_large_files_reports_candidates() {
    let home = setup_home();
    let downloads = home.path().join("Downloads");
    fs::create_dir_all(&downloads).unwrap();
    fs::write(downloads.join("big.bin"), vec![0u8; 2048]).unwrap();

    sweep(&home)
        .args([
            "--dry-run",
            "--skip-trash",
            "--skip-maintenance",
            "--find-large-files",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Scanning for files larger than"))
        .stdout(predicate::str::contains("big.bin"));
}

#[test]
fn verbose_notes_missing_directories() {
    let home = setup_home();

    sweep(&home)
        .args(["--dry-run", "-v", "--skip-trash", "--skip-maintenance"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Directory doesn't exist"));
}

#[test]
fn quiet_prints_only_the_summary() {
    let home = setup_home();

    sweep(&home)
        .args(["--dry-run", "--quiet", "--skip-trash", "--skip-maintenance"])
        .assert()
        .success()
        .stdout(predicate::str::contains("DRY RUN MODE").not())
        .stdout(predicate::str::contains("Dry-run summary"));
}
