use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{channel, Sender};
use std::time::{Duration, Instant, SystemTime};

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

// Public API types

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Categories {
    #[serde(default = "true_bool")]
    pub user_caches: bool,
    #[serde(default = "true_bool")]
    pub media_caches: bool,
    #[serde(default = "true_bool")]
    pub browser_caches: bool,
    #[serde(default = "true_bool")]
    pub temp_files: bool,
    #[serde(default = "true_bool")]
    pub developer_caches: bool,
    #[serde(default = "true_bool")]
    pub logs: bool,
    #[serde(default = "true_bool")]
    pub crash_reports: bool,
}

impl Default for Categories {
    fn default() -> Self {
        Self {
            user_caches: true,
            media_caches: true,
            browser_caches: true,
            temp_files: true,
            developer_caches: true,
            logs: true,
            crash_reports: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    pub verbose: bool,
    #[serde(default)]
    pub quiet: bool,
    /// Files in non-temp cache directories are kept unless older than this.
    #[serde(default = "default_max_age_days")]
    pub max_age_days: u64,
    /// Threshold for the large-file scan, in megabytes.
    #[serde(default = "default_large_file_min_mb")]
    pub large_file_min_mb: u64,
    #[serde(default)]
    pub categories: Option<Categories>,
}

fn default_max_age_days() -> u64 {
    7
}

fn default_large_file_min_mb() -> u64 {
    100
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dry_run: false,
            verbose: false,
            quiet: false,
            max_age_days: default_max_age_days(),
            large_file_min_mb: default_large_file_min_mb(),
            categories: None,
        }
    }
}

impl Config {
    pub fn effective_categories(&self) -> Categories {
        self.categories.clone().unwrap_or_default()
    }
}

/// Search order: CWD/.macsweep/config.json, ~/Library/Application Support/Macsweep/config.json,
/// ~/.config/macsweep/config.json. First readable file wins; invalid files are skipped.
pub fn load_config() -> Config {
    let mut paths: Vec<PathBuf> = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join(".macsweep/config.json"));
    }
    let home = home_dir();
    paths.push(home.join("Library/Application Support/Macsweep/config.json"));
    paths.push(home.join(".config/macsweep/config.json"));

    for p in paths {
        if !p.is_file() {
            continue;
        }
        if let Ok(s) = fs::read_to_string(&p) {
            match serde_json::from_str::<Config>(&s) {
                Ok(mut c) => {
                    if c.categories.is_none() {
                        c.categories = Some(Categories::default());
                    }
                    debug!("Loaded config from {}", p.display());
                    return c;
                }
                Err(err) => warn!("Ignoring invalid config {}: {}", p.display(), err),
            }
        }
    }
    Config::default()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOverrides {
    pub skip_trash: bool,
    pub skip_maintenance: bool,
    pub find_large_files: bool,
}

// ---------- Progress channel ----------

/// Progress text produced by the cleaning worker. The foreground (CLI loop or
/// web job poller) drains these from an mpsc receiver and renders them.
#[derive(Debug, Clone)]
pub enum Message {
    /// Coarse step headline, suitable for a status bar.
    Status(String),
    /// A line of output text.
    Line(String),
    /// Running total of freed bytes.
    SpaceFreed(u64),
}

#[derive(Clone)]
pub struct ProgressSink {
    tx: Sender<Message>,
}

impl ProgressSink {
    pub fn new(tx: Sender<Message>) -> Self {
        Self { tx }
    }

    /// A sink with no receiver; every send is dropped.
    pub fn discard() -> Self {
        let (tx, _rx) = channel();
        Self { tx }
    }

    pub fn status(&self, msg: impl Into<String>) {
        let _ = self.tx.send(Message::Status(msg.into()));
    }

    pub fn line(&self, msg: impl Into<String>) {
        let _ = self.tx.send(Message::Line(msg.into()));
    }

    fn freed(&self, total: u64) {
        let _ = self.tx.send(Message::SpaceFreed(total));
    }
}

// ---------- Stats & results ----------

#[derive(Default)]
struct Stats {
    files_deleted: AtomicU64,
    dirs_deleted: AtomicU64,
    bytes_freed: AtomicU64,
}

impl Stats {
    fn add(&self, out: &DirOutcome) {
        self.files_deleted
            .fetch_add(out.files_removed, Ordering::Relaxed);
        self.dirs_deleted
            .fetch_add(out.dirs_removed, Ordering::Relaxed);
        self.bytes_freed
            .fetch_add(out.bytes_freed, Ordering::Relaxed);
    }

    fn add_bytes(&self, n: u64) {
        self.bytes_freed.fetch_add(n, Ordering::Relaxed);
    }

    fn bytes(&self) -> u64 {
        self.bytes_freed.load(Ordering::Relaxed)
    }

    fn snapshot(&self) -> (u64, u64, u64) {
        (
            self.files_deleted.load(Ordering::Relaxed),
            self.dirs_deleted.load(Ordering::Relaxed),
            self.bytes_freed.load(Ordering::Relaxed),
        )
    }
}

/// What a single `clean_directory` pass removed (or would remove, in dry run).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirOutcome {
    pub bytes_freed: u64,
    pub files_removed: u64,
    pub dirs_removed: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LargeFile {
    pub path: PathBuf,
    pub size: u64,
}

#[derive(Debug, Clone)]
pub struct Summary {
    pub files_deleted: u64,
    pub dirs_deleted: u64,
    pub bytes_freed: u64,
    /// Freed bytes per cleaning step, in run order. Sums to `bytes_freed`.
    pub step_bytes: Vec<(String, u64)>,
    pub large_files: Vec<LargeFile>,
    pub elapsed: Duration,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct StepPreview {
    pub title: String,
    pub dirs: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TargetsPreview {
    pub steps: Vec<StepPreview>,
}

// ---------- Target catalog ----------

/// Directory names cleaned wholesale, ignoring file age.
const TEMP_LIKE_NAMES: &[&str] = &["tmp", "Logs", "CrashReporter"];

/// Paths under these prefixes are never deleted.
const CRITICAL_PREFIXES: &[&str] = &[
    "/system",
    "/usr",
    "/bin",
    "/sbin",
    "/etc",
    "/applications",
    "/library/frameworks",
    "/library/extensions",
    "/library/preferences",
];

/// Paths containing any of these substrings are never deleted.
const EXCLUDED_SUBSTRINGS: &[&str] = &[
    "com.apple.akd",
    "com.apple.launchservices",
    "com.apple.spotlight",
];

const LARGE_FILE_REPORT_LIMIT: usize = 10;

fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("/"))
}

pub struct CleanStep {
    pub title: &'static str,
    pub dirs: Vec<PathBuf>,
}

/// The fixed catalog of cleaning targets, grouped into ordered steps. Missing
/// directories stay in the list; `clean_directory` skips them with a note.
fn clean_steps(cats: &Categories) -> Vec<CleanStep> {
    let home = home_dir();
    let caches = home.join("Library/Caches");
    let mut steps = Vec::new();

    let mut system = Vec::new();
    if cats.user_caches {
        system.push(caches.clone());
        system.push(home.join("Library/Containers"));
    }
    if cats.media_caches {
        for name in [
            "com.apple.akd",
            "com.apple.bird",
            "CloudKit",
            "com.apple.iTunes",
            "com.apple.Music",
        ] {
            system.push(caches.join(name));
        }
    }
    if !system.is_empty() {
        steps.push(CleanStep {
            title: "System Caches",
            dirs: system,
        });
    }

    if cats.browser_caches {
        steps.push(CleanStep {
            title: "Browser Data",
            dirs: [
                "com.apple.Safari",
                "com.google.Chrome",
                "org.mozilla.firefox",
                "com.microsoft.edgemac",
            ]
            .iter()
            .map(|name| caches.join(name))
            .collect(),
        });
    }

    if cats.temp_files {
        steps.push(CleanStep {
            title: "Temporary Files",
            dirs: vec![
                PathBuf::from("/tmp"),
                PathBuf::from("/var/tmp"),
                PathBuf::from("/var/folders"),
            ],
        });
    }

    if cats.developer_caches {
        steps.push(CleanStep {
            title: "Development Caches",
            dirs: vec![
                home.join(".npm/_cacache"),
                home.join(".yarn/cache"),
                caches.join("pip"),
                home.join(".cache"),
                caches.join("com.docker.docker"),
                home.join("Library/Developer/Xcode/DerivedData"),
            ],
        });
    }

    if cats.logs {
        steps.push(CleanStep {
            title: "Log Files",
            dirs: vec![home.join("Library/Logs"), PathBuf::from("/var/log")],
        });
    }

    if cats.crash_reports {
        steps.push(CleanStep {
            title: "Crash Reports",
            dirs: vec![home.join("Library/Application Support/CrashReporter")],
        });
    }

    steps
}

/// Catalog after the protection filter, for display. Only existing
/// directories are listed.
pub fn preview_targets(cfg: &Config) -> TargetsPreview {
    let cats = cfg.effective_categories();
    let steps = clean_steps(&cats)
        .into_iter()
        .map(|s| StepPreview {
            title: s.title.to_string(),
            dirs: s
                .dirs
                .iter()
                .filter(|d| d.is_dir() && !is_protected(d.as_path()))
                .map(|d| d.to_string_lossy().into_owned())
                .collect(),
        })
        .collect();
    TargetsPreview { steps }
}

// ---------- Eligibility rules ----------

/// A protected path is never deleted: either it sits under an OS-critical
/// prefix, or it contains an excluded substring. Comparison is lowercased.
pub fn is_protected(path: &Path) -> bool {
    let lower = path.to_string_lossy().to_ascii_lowercase();
    if CRITICAL_PREFIXES.iter().any(|p| lower.starts_with(p)) {
        return true;
    }
    EXCLUDED_SUBSTRINGS.iter().any(|s| lower.contains(s))
}

/// Temp-like directories (`tmp`, `Logs`, `CrashReporter`) are emptied without
/// regard to file age; everything else is cleaned on the age rule.
pub fn is_temp_like(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| TEMP_LIKE_NAMES.contains(&n))
        .unwrap_or(false)
}

// ---------- Cleaning ----------

/// Clean one catalog directory. Missing and protected directories are skipped.
/// Sizes are read before removal; a failed removal contributes nothing.
pub fn clean_directory(dir: &Path, cfg: &Config, sink: &ProgressSink) -> DirOutcome {
    let mut out = DirOutcome::default();

    if !dir.exists() {
        if cfg.verbose {
            sink.line(format!("  Directory doesn't exist: {}", dir.display()));
        }
        return out;
    }
    if is_protected(dir) {
        if cfg.verbose {
            sink.line(format!("  Skipping protected directory: {}", dir.display()));
        }
        return out;
    }

    sink.line(format!("  Cleaning: {}", dir.display()));

    if is_temp_like(dir) {
        clean_temp_like(dir, cfg, sink, &mut out);
    } else {
        clean_aged_files(dir, cfg, sink, &mut out);
    }

    if out.bytes_freed > 0 {
        sink.line(format!("    Freed: {}", format_bytes(out.bytes_freed)));
    } else if cfg.verbose {
        sink.line("    Nothing to clean");
    }
    out
}

/// Remove everything directly inside a temp-like directory, keeping the
/// directory itself. Symlinks are removed as links, never followed.
fn clean_temp_like(dir: &Path, cfg: &Config, sink: &ProgressSink, out: &mut DirOutcome) {
    let entries = match fs::read_dir(dir) {
        Ok(e) => e,
        Err(err) => {
            if cfg.verbose {
                sink.line(format!("  Error accessing {}: {}", dir.display(), err));
            }
            warn!("read_dir {}: {}", dir.display(), err);
            return;
        }
    };

    for entry in entries.flatten() {
        let p = entry.path();
        let meta = match fs::symlink_metadata(&p) {
            Ok(m) => m,
            Err(err) => {
                if cfg.verbose {
                    sink.line(format!("    Warning: could not stat {}: {}", p.display(), err));
                }
                continue;
            }
        };

        if meta.is_dir() {
            if is_protected(&p) {
                continue;
            }
            let size = dir_size(&p);
            if cfg.dry_run {
                out.bytes_freed += size;
                out.dirs_removed += 1;
            } else {
                match fs::remove_dir_all(&p) {
                    Ok(()) => {
                        out.bytes_freed += size;
                        out.dirs_removed += 1;
                    }
                    Err(err) => {
                        if cfg.verbose {
                            sink.line(format!(
                                "    Warning: could not delete {}: {}",
                                p.display(),
                                err
                            ));
                        }
                    }
                }
            }
        } else {
            // Regular file or symlink; either way the entry itself is removed.
            let size = meta.len();
            if cfg.dry_run {
                out.bytes_freed += size;
                out.files_removed += 1;
            } else {
                match fs::remove_file(&p) {
                    Ok(()) => {
                        out.bytes_freed += size;
                        out.files_removed += 1;
                    }
                    Err(err) => {
                        if cfg.verbose {
                            sink.line(format!(
                                "    Warning: could not delete {}: {}",
                                p.display(),
                                err
                            ));
                        }
                    }
                }
            }
        }
    }
}

/// Remove files older than the configured cutoff, recursively. Files at or
/// newer than the cutoff are never touched.
fn clean_aged_files(dir: &Path, cfg: &Config, sink: &ProgressSink, out: &mut DirOutcome) {
    let cutoff = SystemTime::now() - Duration::from_secs(cfg.max_age_days * 24 * 3600);

    for entry in WalkDir::new(dir) {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                if cfg.verbose {
                    sink.line(format!("    Warning: {}", err));
                }
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        if is_protected(entry.path()) {
            continue;
        }
        let meta = match entry.metadata() {
            Ok(m) => m,
            Err(_) => continue,
        };
        // Unreadable mtimes make a file ineligible.
        let modified = match meta.modified() {
            Ok(t) => t,
            Err(_) => continue,
        };
        if modified >= cutoff {
            continue;
        }

        let size = meta.len();
        if cfg.dry_run {
            out.bytes_freed += size;
            out.files_removed += 1;
        } else {
            match fs::remove_file(entry.path()) {
                Ok(()) => {
                    out.bytes_freed += size;
                    out.files_removed += 1;
                }
                Err(err) => {
                    if cfg.verbose {
                        sink.line(format!(
                            "    Warning: could not delete {}: {}",
                            entry.path().display(),
                            err
                        ));
                    }
                }
            }
        }
    }
}

fn dir_size(path: &Path) -> u64 {
    WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.metadata().ok())
        .map(|m| m.len())
        .sum()
}

// ---------- Run ----------

/// The complete cleaning pass. Runs every enabled catalog step, then trash and
/// maintenance unless skipped, then the optional large-file scan. All progress
/// text goes through the sink; the returned summary carries the totals.
pub fn run_clean(cfg: &Config, overrides: &RunOverrides, sink: &ProgressSink) -> Summary {
    let start = Instant::now();
    let stats = Stats::default();
    let mut step_bytes: Vec<(String, u64)> = Vec::new();

    sink.line("macsweep - macOS cache & temp file cleaner");
    sink.line("=".repeat(50));
    if cfg.dry_run {
        sink.line("DRY RUN MODE - No files will be deleted");
        sink.line("");
    }

    if let Some(line) = disk_usage_line() {
        sink.line("Current disk usage:");
        sink.line(format!("  {}", line));
        sink.line("");
    }

    let cats = cfg.effective_categories();
    for step in clean_steps(&cats) {
        sink.status(format!("Cleaning {}...", step.title));
        sink.line("");
        sink.line(format!("Cleaning {}...", step.title));
        let mut freed = 0u64;
        for dir in &step.dirs {
            let out = clean_directory(dir, cfg, sink);
            freed += out.bytes_freed;
            stats.add(&out);
            sink.freed(stats.bytes());
        }
        step_bytes.push((step.title.to_string(), freed));
    }

    if !overrides.skip_trash {
        sink.status("Emptying Trash...");
        sink.line("");
        sink.line("Emptying Trash...");
        let freed = empty_trash(cfg, sink);
        stats.add_bytes(freed);
        sink.freed(stats.bytes());
        step_bytes.push(("Trash".to_string(), freed));
    }

    if !overrides.skip_maintenance {
        sink.status("Running macOS maintenance...");
        sink.line("");
        sink.line("Running macOS maintenance...");
        run_maintenance(cfg, sink);
    }

    let large_files = if overrides.find_large_files {
        sink.status("Scanning for large files...");
        scan_large_files(cfg, sink)
    } else {
        Vec::new()
    };

    let (files, dirs, bytes) = stats.snapshot();
    sink.line("");
    sink.line("=".repeat(50));
    sink.line("Cleaning complete!");
    sink.line(format!("Total space freed: {}", format_bytes(bytes)));
    if cfg.dry_run {
        sink.line("(This was a dry run - no files were actually deleted)");
    }

    Summary {
        files_deleted: files,
        dirs_deleted: dirs,
        bytes_freed: bytes,
        step_bytes,
        large_files,
        elapsed: start.elapsed(),
        dry_run: cfg.dry_run,
    }
}

// ---------- Trash, maintenance, disk usage ----------

/// Size up ~/.Trash and ask the Finder to empty it. The size counts toward the
/// freed total whether or not the Finder obliges.
pub fn empty_trash(cfg: &Config, sink: &ProgressSink) -> u64 {
    let trash = home_dir().join(".Trash");
    if !trash.exists() {
        if cfg.verbose {
            sink.line("  No trash directory");
        }
        return 0;
    }

    let size = dir_size(&trash);
    if !cfg.dry_run {
        match Command::new("osascript")
            .args(["-e", "tell application \"Finder\" to empty trash"])
            .output()
        {
            Ok(out) if out.status.success() => {}
            Ok(out) => sink.line(format!(
                "  Error emptying trash: osascript exited with {}",
                out.status
            )),
            Err(err) => sink.line(format!("  Error emptying trash: {}", err)),
        }
    }
    sink.line(format!("  Freed: {}", format_bytes(size)));
    size
}

/// Best-effort OS maintenance. Never aborts the run; frees no counted bytes.
pub fn run_maintenance(cfg: &Config, sink: &ProgressSink) {
    if cfg.dry_run {
        sink.line("  (Dry run - maintenance scripts not executed)");
        return;
    }
    if !is_elevated() {
        sink.line("  Note: maintenance commands require administrator privileges");
    }
    match Command::new("sudo").args(["periodic", "daily"]).output() {
        Ok(out) if out.status.success() => sink.line("  Daily maintenance completed"),
        Ok(out) => sink.line(format!("  periodic daily exited with {}", out.status)),
        Err(err) => sink.line(format!("  Error running maintenance: {}", err)),
    }
    match Command::new("sudo")
        .args(["update_dyld_shared_cache", "-force"])
        .output()
    {
        Ok(out) if out.status.success() => sink.line("  Dynamic linker cache rebuilt"),
        Ok(out) => sink.line(format!(
            "  update_dyld_shared_cache exited with {}",
            out.status
        )),
        Err(err) => sink.line(format!("  Error rebuilding linker cache: {}", err)),
    }
}

/// Second line of `df -h /`, verbatim.
pub fn disk_usage_line() -> Option<String> {
    let out = Command::new("df").args(["-h", "/"]).output().ok()?;
    if !out.status.success() {
        return None;
    }
    let text = String::from_utf8_lossy(&out.stdout);
    text.lines().nth(1).map(|s| s.to_string())
}

// ---------- Large-file scan ----------

/// Walk the common user content folders for files above the configured
/// threshold. Reports the top entries, returns the whole sorted list.
pub fn scan_large_files(cfg: &Config, sink: &ProgressSink) -> Vec<LargeFile> {
    let min_bytes = cfg.large_file_min_mb * 1024 * 1024;
    sink.line("");
    sink.line(format!(
        "Scanning for files larger than {} MB...",
        cfg.large_file_min_mb
    ));

    let home = home_dir();
    let mut found = Vec::new();
    for sub in ["Downloads", "Desktop", "Documents", "Movies"] {
        let dir = home.join(sub);
        if !dir.is_dir() {
            continue;
        }
        for entry in WalkDir::new(&dir).into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            let meta = match entry.metadata() {
                Ok(m) => m,
                Err(_) => continue,
            };
            if meta.len() > min_bytes {
                found.push(LargeFile {
                    path: entry.into_path(),
                    size: meta.len(),
                });
            }
        }
    }

    found.sort_by(|a, b| b.size.cmp(&a.size));
    if found.is_empty() {
        sink.line("  No large files found");
    } else {
        sink.line(format!("  Found {} large files:", found.len()));
        for f in found.iter().take(LARGE_FILE_REPORT_LIMIT) {
            sink.line(format!("    {} - {}", format_bytes(f.size), f.path.display()));
        }
    }
    found
}

// ---------- Helpers ----------

pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[unit])
    } else {
        format!("{:.2} {}", size, UNITS[unit])
    }
}

pub fn env_truthy(name: &str) -> bool {
    match std::env::var(name) {
        Ok(v) => {
            let v = v.trim();
            matches!(v, "1" | "true" | "TRUE" | "yes" | "YES" | "on" | "ON")
        }
        Err(_) => false,
    }
}

#[cfg(unix)]
pub fn is_elevated() -> bool {
    unsafe { libc::geteuid() == 0 }
}

#[cfg(not(unix))]
pub fn is_elevated() -> bool {
    false
}

fn true_bool() -> bool {
    true
}

// ---------- Tests ----------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn critical_prefixes_are_protected() {
        assert!(is_protected(Path::new("/System/Library/Caches")));
        assert!(is_protected(Path::new("/usr/lib/dyld")));
        assert!(is_protected(Path::new("/bin")));
        assert!(is_protected(Path::new("/Applications/Safari.app")));
        assert!(is_protected(Path::new("/Library/Frameworks/Foo.framework")));
    }

    #[test]
    fn excluded_substrings_are_protected_case_insensitive() {
        assert!(is_protected(Path::new(
            "/Users/me/Library/Caches/com.apple.akd"
        )));
        assert!(is_protected(Path::new(
            "/Users/me/Library/Caches/com.apple.LaunchServices"
        )));
        assert!(is_protected(Path::new(
            "/Users/me/Library/Caches/com.apple.Spotlight/data"
        )));
    }

    #[test]
    fn ordinary_cache_paths_are_not_protected() {
        assert!(!is_protected(Path::new("/Users/me/Library/Caches")));
        assert!(!is_protected(Path::new("/tmp")));
        assert!(!is_protected(Path::new("/var/folders")));
        assert!(!is_protected(Path::new(
            "/Users/me/Library/Caches/com.google.Chrome"
        )));
    }

    #[test]
    fn temp_like_matches_exact_names_only() {
        assert!(is_temp_like(Path::new("/tmp")));
        assert!(is_temp_like(Path::new("/var/tmp")));
        assert!(is_temp_like(Path::new("/Users/me/Library/Logs")));
        assert!(is_temp_like(Path::new(
            "/Users/me/Library/Application Support/CrashReporter"
        )));
        // Name match is exact: /var/log gets the age rule.
        assert!(!is_temp_like(Path::new("/var/log")));
        assert!(!is_temp_like(Path::new("/var/folders")));
        assert!(!is_temp_like(Path::new("/Users/me/Library/Caches")));
    }

    #[test]
    fn format_bytes_units() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(999), "999 B");
        assert_eq!(format_bytes(1024), "1.00 KB");
        assert_eq!(format_bytes(1024 * 1024), "1.00 MB");
        assert_eq!(format_bytes(5 * 1024 * 1024 * 1024), "5.00 GB");
    }

    #[test]
    fn category_toggles_prune_steps() {
        let cats = Categories {
            temp_files: false,
            logs: false,
            ..Categories::default()
        };
        let steps = clean_steps(&cats);
        assert!(steps.iter().all(|s| s.title != "Temporary Files"));
        assert!(steps.iter().all(|s| s.title != "Log Files"));
        assert!(steps.iter().any(|s| s.title == "System Caches"));
    }
}
