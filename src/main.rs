use std::sync::mpsc::channel;
use std::thread;

use clap::Parser;
use log::{debug, info, warn};
use macsweep::{
    env_truthy, format_bytes, load_config, run_clean, Config, Message, ProgressSink, RunOverrides,
};

#[derive(Debug, Parser)]
#[command(
    name = "macsweep",
    version,
    author,
    about = "macOS cache & temp file cleaner"
)]
struct Cli {
    /// Show what would be deleted without actually deleting
    #[arg(long)]
    dry_run: bool,

    /// Show detailed output
    #[arg(long, short = 'v')]
    verbose: bool,

    /// Silence progress output, print only the final summary
    #[arg(long)]
    quiet: bool,

    /// Skip emptying the trash
    #[arg(long)]
    skip_trash: bool,

    /// Skip running macOS maintenance scripts
    #[arg(long)]
    skip_maintenance: bool,

    /// Scan for large files that could be deleted
    #[arg(long)]
    find_large_files: bool,
}

fn init_logging(quiet: bool, verbose: bool) {
    let default_level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    };
    let env = env_logger::Env::default().default_filter_or(default_level);
    let _ = env_logger::Builder::from_env(env).is_test(false).try_init();
    debug!("Logger initialized with level: {}", default_level);
}

/// CLI flags win over the loaded config; verbose and quiet are exclusive,
/// a flag clears its opposite.
fn apply_cli(mut cfg: Config, cli: &Cli) -> Config {
    if cli.dry_run {
        cfg.dry_run = true;
    }
    if cli.verbose {
        cfg.verbose = true;
        cfg.quiet = false;
    }
    if cli.quiet {
        cfg.quiet = true;
        cfg.verbose = false;
    }
    cfg
}

fn main() {
    let cli = Cli::parse();
    let cfg = apply_cli(load_config(), &cli);
    init_logging(cfg.quiet, cfg.verbose);
    info!("Starting macsweep");

    // CLI > env > config: the env toggles can only force a skip on.
    let overrides = RunOverrides {
        skip_trash: cli.skip_trash || env_truthy("MACSWEEP_SKIP_TRASH"),
        skip_maintenance: cli.skip_maintenance || env_truthy("MACSWEEP_SKIP_MAINTENANCE"),
        find_large_files: cli.find_large_files,
    };

    if let Err(err) = ctrlc::set_handler(|| {
        eprintln!("\nCleaning cancelled by user");
        std::process::exit(1);
    }) {
        warn!("Could not install interrupt handler: {}", err);
    }

    // Single background worker does all filesystem and shell work; the main
    // thread drains its message queue until the sender side closes.
    let (tx, rx) = channel();
    let sink = ProgressSink::new(tx);
    let worker_cfg = cfg.clone();
    let worker = thread::spawn(move || run_clean(&worker_cfg, &overrides, &sink));

    let quiet = cfg.quiet;
    for msg in rx {
        match msg {
            Message::Line(text) => {
                if !quiet {
                    println!("{}", text);
                }
            }
            Message::Status(text) => debug!("{}", text),
            Message::SpaceFreed(total) => debug!("Space freed so far: {}", format_bytes(total)),
        }
    }

    let summary = match worker.join() {
        Ok(s) => s,
        Err(_) => {
            eprintln!("Error during cleaning: worker thread panicked");
            std::process::exit(1);
        }
    };

    if !quiet {
        println!();
    }
    if summary.dry_run {
        println!(
            "Dry-run summary: would remove {} files, {} dirs; free approx {} ({} bytes) in {:?}.",
            summary.files_deleted,
            summary.dirs_deleted,
            format_bytes(summary.bytes_freed),
            summary.bytes_freed,
            summary.elapsed
        );
    } else {
        println!(
            "Summary: removed {} files, {} dirs; freed {} ({} bytes) in {:?}.",
            summary.files_deleted,
            summary.dirs_deleted,
            format_bytes(summary.bytes_freed),
            summary.bytes_freed,
            summary.elapsed
        );
    }
    if cfg.verbose {
        for (title, bytes) in &summary.step_bytes {
            println!("  {}: {}", title, format_bytes(*bytes));
        }
    }
}

// ---------- Tests ----------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_truthy_variants() {
        std::env::set_var("MS_TEST_TRUTHY", "1");
        assert!(env_truthy("MS_TEST_TRUTHY"));
        std::env::set_var("MS_TEST_TRUTHY", "true");
        assert!(env_truthy("MS_TEST_TRUTHY"));
        std::env::set_var("MS_TEST_TRUTHY", "on");
        assert!(env_truthy("MS_TEST_TRUTHY"));
        std::env::set_var("MS_TEST_TRUTHY", "0");
        assert!(!env_truthy("MS_TEST_TRUTHY"));
        std::env::remove_var("MS_TEST_TRUTHY");
        assert!(!env_truthy("MS_TEST_TRUTHY"));
    }

    #[test]
    fn test_cli_flags_override_config() {
        let cli = Cli::try_parse_from(["macsweep", "--dry-run", "-v"]).unwrap();
        let cfg = apply_cli(Config::default(), &cli);
        assert!(cfg.dry_run);
        assert!(cfg.verbose);
        assert!(!cfg.quiet);

        let cli = Cli::try_parse_from(["macsweep", "--quiet"]).unwrap();
        let base = Config {
            verbose: true,
            ..Config::default()
        };
        let cfg = apply_cli(base, &cli);
        assert!(cfg.quiet);
        assert!(!cfg.verbose);
    }
}
