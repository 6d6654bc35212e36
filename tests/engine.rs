use std::fs;
use std::thread;
use std::time::Duration;

use macsweep::{
    clean_directory, is_protected, run_clean, Categories, Config, ProgressSink, RunOverrides,
};
use tempfile::tempdir;

#[test]
fn temp_like_dir_is_emptied_regardless_of_age() {
    let root = tempdir().unwrap();
    let dir = root.path().join("tmp");
    fs::create_dir(&dir).unwrap();
    fs::write(dir.join("a.log"), b"aaaa").unwrap();
    fs::create_dir(dir.join("work")).unwrap();
    fs::write(dir.join("work/b.bin"), b"bbbbbbbb").unwrap();

    let cfg = Config::default();
    let out = clean_directory(&dir, &cfg, &ProgressSink::discard());

    assert_eq!(out.bytes_freed, 12);
    assert_eq!(out.files_removed, 1);
    assert_eq!(out.dirs_removed, 1);
    // The directory itself survives; its contents do not.
    assert!(dir.exists());
    assert!(!dir.join("a.log").exists());
    assert!(!dir.join("work").exists());
}

#[test]
fn age_rule_keeps_recent_files() {
    let root = tempdir().unwrap();
    let dir = root.path().join("Caches");
    fs::create_dir(&dir).unwrap();
    fs::write(dir.join("fresh.db"), b"keep me").unwrap();

    let cfg = Config::default(); // 7-day cutoff
    let out = clean_directory(&dir, &cfg, &ProgressSink::discard());

    assert_eq!(out.bytes_freed, 0);
    assert_eq!(out.files_removed, 0);
    assert!(dir.join("fresh.db").exists());
}

#[test]
fn age_rule_deletes_files_past_cutoff() {
    let root = tempdir().unwrap();
    let dir = root.path().join("Caches");
    fs::create_dir(&dir).unwrap();
    fs::write(dir.join("stale.db"), b"12345678").unwrap();

    // A zero-day cutoff makes anything written before the clean eligible.
    let cfg = Config {
        max_age_days: 0,
        ..Config::default()
    };
    thread::sleep(Duration::from_millis(1100));
    let out = clean_directory(&dir, &cfg, &ProgressSink::discard());

    assert_eq!(out.bytes_freed, 8);
    assert_eq!(out.files_removed, 1);
    assert!(!dir.join("stale.db").exists());
}

#[test]
fn dry_run_counts_but_does_not_delete() {
    let root = tempdir().unwrap();
    let dir = root.path().join("tmp");
    fs::create_dir(&dir).unwrap();
    fs::write(dir.join("a.tmp"), b"aaaa").unwrap();
    fs::create_dir(dir.join("junk")).unwrap();
    fs::write(dir.join("junk/b.tmp"), b"bb").unwrap();

    let cfg = Config {
        dry_run: true,
        ..Config::default()
    };
    let out = clean_directory(&dir, &cfg, &ProgressSink::discard());

    assert_eq!(out.bytes_freed, 6);
    assert!(dir.join("a.tmp").exists());
    assert!(dir.join("junk/b.tmp").exists());
}

#[test]
fn protected_directory_is_never_cleaned() {
    let root = tempdir().unwrap();
    let dir = root.path().join("com.apple.LaunchServices");
    fs::create_dir(&dir).unwrap();
    fs::write(dir.join("store.db"), b"precious").unwrap();

    assert!(is_protected(&dir));
    let out = clean_directory(&dir, &Config::default(), &ProgressSink::discard());

    assert_eq!(out.bytes_freed, 0);
    assert!(dir.join("store.db").exists());
}

#[test]
fn protected_subdirs_survive_temp_like_clean() {
    let root = tempdir().unwrap();
    let dir = root.path().join("tmp");
    fs::create_dir(&dir).unwrap();
    fs::write(dir.join("junk.tmp"), b"xx").unwrap();
    let spotlight = dir.join("com.apple.Spotlight");
    fs::create_dir(&spotlight).unwrap();
    fs::write(spotlight.join("index.db"), b"keep").unwrap();

    let out = clean_directory(&dir, &Config::default(), &ProgressSink::discard());

    assert_eq!(out.bytes_freed, 2);
    assert!(!dir.join("junk.tmp").exists());
    assert!(spotlight.join("index.db").exists());
}

#[test]
fn missing_directory_frees_nothing() {
    let root = tempdir().unwrap();
    let out = clean_directory(
        &root.path().join("nope"),
        &Config::default(),
        &ProgressSink::discard(),
    );
    assert_eq!(out, Default::default());
}

// Exercises the whole run against a fabricated home directory. The only test
// in this binary that touches $HOME.
#[test]
fn run_clean_totals_match_step_sums() {
    let home = tempdir().unwrap();
    std::env::set_var("HOME", home.path());

    let crash = home.path().join("Library/Application Support/CrashReporter");
    fs::create_dir_all(&crash).unwrap();
    fs::write(crash.join("report1.crash"), vec![0u8; 100]).unwrap();
    fs::write(crash.join("report2.crash"), vec![0u8; 50]).unwrap();

    let caches = home.path().join("Library/Caches");
    fs::create_dir_all(&caches).unwrap();
    fs::write(caches.join("fresh.db"), vec![0u8; 64]).unwrap();

    let trash = home.path().join(".Trash");
    fs::create_dir_all(&trash).unwrap();
    fs::write(trash.join("old.bin"), vec![0u8; 10]).unwrap();

    // System-wide locations stay out of the fixture.
    let cats = Categories {
        temp_files: false,
        logs: false,
        ..Categories::default()
    };
    let cfg = Config {
        dry_run: true,
        categories: Some(cats.clone()),
        ..Config::default()
    };

    // Dry run: crash reports (150) plus trash (10) are reported, nothing moves.
    let summary = run_clean(
        &cfg,
        &RunOverrides {
            skip_trash: false,
            skip_maintenance: true,
            find_large_files: false,
        },
        &ProgressSink::discard(),
    );
    assert!(summary.dry_run);
    assert_eq!(summary.bytes_freed, 160);
    let step_sum: u64 = summary.step_bytes.iter().map(|(_, b)| *b).sum();
    assert_eq!(step_sum, summary.bytes_freed);
    assert!(crash.join("report1.crash").exists());
    assert!(trash.join("old.bin").exists());

    // Real run with trash skipped: the crash reports go, the fresh cache stays.
    let cfg = Config {
        dry_run: false,
        categories: Some(cats),
        ..Config::default()
    };
    let summary = run_clean(
        &cfg,
        &RunOverrides {
            skip_trash: true,
            skip_maintenance: true,
            find_large_files: false,
        },
        &ProgressSink::discard(),
    );
    assert_eq!(summary.bytes_freed, 150);
    assert_eq!(summary.files_deleted, 2);
    let step_sum: u64 = summary.step_bytes.iter().map(|(_, b)| *b).sum();
    assert_eq!(step_sum, summary.bytes_freed);
    assert!(!crash.join("report1.crash").exists());
    assert!(!crash.join("report2.crash").exists());
    assert!(crash.exists());
    assert!(caches.join("fresh.db").exists());
    assert!(trash.join("old.bin").exists());
}
