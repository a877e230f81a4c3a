//! Rehash - Command-line interface for the rehash engine.
//!
//! Adds files and folders to a record store, writes a mutated copy of each
//! into a target directory, and reports the original and new fingerprints.

use clap::{Args, Parser, Subcommand};
use engine::{
    compute_file_checksum, resolve_target_dir, BatchSummary, ChecksumAlgorithm, EngineConfig,
    EngineError, FileRecord, ProgressCallback, RecordStatus, RecordStore, Rehasher, TargetChoice,
};
use std::path::PathBuf;
use std::time::Instant;

/// Rehash - change file fingerprints by appending random bytes to copies
#[derive(Parser, Debug)]
#[command(name = "rehash")]
#[command(version)]
#[command(about = "Copy files and append random bytes so their fingerprints change")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Copy files into a target directory and mutate the copies
    Process(ProcessArgs),
    /// Print the fingerprint of each file
    Hash(HashArgs),
}

#[derive(Args, Debug)]
struct ProcessArgs {
    /// Files to process
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Add the files directly inside this folder (not recursive); repeatable
    #[arg(long, value_name = "DIR")]
    folder: Vec<PathBuf>,

    /// Write copies here instead of the default dated folder beside the sources
    #[arg(long, value_name = "DIR")]
    target: Option<PathBuf>,

    /// JSON config file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Fingerprint algorithm: md5, sha256, or blake3
    #[arg(long, value_name = "ALGORITHM")]
    algorithm: Option<String>,

    /// Suffix of the default `<YYYY-MM-DD>-<suffix>` target folder
    #[arg(long, value_name = "SUFFIX")]
    suffix: Option<String>,

    /// Print the resulting records as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Enable verbose output
    #[arg(long)]
    verbose: bool,
}

#[derive(Args, Debug)]
struct HashArgs {
    /// Files to fingerprint
    #[arg(value_name = "FILE", required = true)]
    files: Vec<PathBuf>,

    /// Fingerprint algorithm: md5, sha256, or blake3
    #[arg(long, value_name = "ALGORITHM", default_value = "md5")]
    algorithm: String,
}

/// Outcome of a command that ran to completion.
#[derive(Debug, PartialEq, Eq)]
enum Outcome {
    Clean,
    HadFailures,
}

/// CLI implementation of ProgressCallback, reporting to stderr
struct CliProgress {
    verbose: bool,
    start_time: Instant,
}

impl CliProgress {
    fn new(verbose: bool) -> Self {
        CliProgress {
            verbose,
            start_time: Instant::now(),
        }
    }

    fn file_name(record: &FileRecord) -> &str {
        record
            .source_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("(unknown)")
    }

    fn format_duration(elapsed: std::time::Duration) -> String {
        let millis = elapsed.as_millis();
        if millis < 1000 {
            format!("{}ms", millis)
        } else {
            format!("{:.1}s", elapsed.as_secs_f64())
        }
    }
}

impl ProgressCallback for CliProgress {
    fn on_batch_started(&self, total_pending: usize) {
        eprintln!("Processing {} file(s)...", total_pending);
    }

    fn on_record_started(&self, index: usize, record: &FileRecord) {
        if self.verbose {
            eprintln!("[{:3}] Starting: {}", index, Self::file_name(record));
        }
    }

    fn on_record_completed(&self, index: usize, record: &FileRecord) {
        if self.verbose {
            let new = record
                .output_fingerprint
                .as_ref()
                .map(|c| c.hex())
                .unwrap_or("-");
            eprintln!(
                "[{:3}] Done: {} {} -> {}",
                index,
                Self::file_name(record),
                record.original_fingerprint,
                new
            );
        }
    }

    fn on_record_failed(&self, index: usize, record: &FileRecord, error: &EngineError) {
        eprintln!(
            "[{:3}] Failed: {}: {}",
            index,
            record.source_path.display(),
            error.detailed()
        );
    }

    fn on_batch_completed(&self, summary: &BatchSummary) {
        eprintln!();
        eprintln!(
            "Summary: {} done, {} failed{}",
            summary.succeeded,
            summary.failed.len(),
            if summary.cancelled { " (cancelled)" } else { "" }
        );
        eprintln!("Target: {}", summary.target_dir.display());
        eprintln!("Elapsed: {}", Self::format_duration(self.start_time.elapsed()));
    }
}

fn main() {
    let cli = Cli::parse();

    let verbose = matches!(&cli.command, Command::Process(args) if args.verbose);
    init_logging(verbose);

    let result = match &cli.command {
        Command::Process(args) => run_cli(args),
        Command::Hash(args) => run_hash(args),
    };

    let exit_code = match result {
        Ok(Outcome::Clean) => 0,
        Ok(Outcome::HadFailures) => 1,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            2
        }
    };

    std::process::exit(exit_code);
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "engine=debug,rehash=debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

/// Build the effective config: file, then command-line overrides.
fn load_config(args: &ProcessArgs) -> Result<EngineConfig, String> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::from_json_file(path).map_err(|e| e.to_string())?,
        None => EngineConfig::default(),
    };

    if let Some(algorithm) = &args.algorithm {
        config.algorithm = algorithm.parse().map_err(|e: EngineError| e.to_string())?;
    }
    if let Some(suffix) = &args.suffix {
        config.target_suffix = suffix.clone();
    }

    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

/// Main processing logic - separated for testability
fn run_cli(args: &ProcessArgs) -> Result<Outcome, String> {
    if args.files.is_empty() && args.folder.is_empty() {
        return Err("Nothing to process: give files or --folder".to_string());
    }

    let config = load_config(args)?;
    let mut store = RecordStore::with_config(&config);

    let mut add_failures = 0;
    let mut report = store.add_many(&args.files);
    for folder in &args.folder {
        let folder_report = store
            .add_folder(folder)
            .map_err(|e| format!("Cannot read folder: {}", e))?;
        report.added.extend(folder_report.added);
        report.duplicates.extend(folder_report.duplicates);
        report.failed.extend(folder_report.failed);
    }

    for (path, reason) in &report.failed {
        eprintln!("Skipped {}: {}", path.display(), reason);
        add_failures += 1;
    }
    if report.is_empty() {
        eprintln!("No new files");
        return Ok(if add_failures > 0 {
            Outcome::HadFailures
        } else {
            Outcome::Clean
        });
    }
    eprintln!("Added {} file(s)", report.added_count());

    let choice = match &args.target {
        Some(dir) => TargetChoice::Custom(dir.clone()),
        None => TargetChoice::Default,
    };
    let source_dir = store.source_directory().map_err(|e| e.to_string())?;
    let target_dir = resolve_target_dir(&source_dir, &choice, &config.target_suffix)
        .map_err(|e| format!("Cannot use target directory: {}", e))?;

    let processor = Rehasher::from_config(&config);
    let progress = CliProgress::new(args.verbose);
    let summary = store
        .process_pending(&processor, &target_dir, Some(&progress))
        .map_err(|e| format!("Processing failed: {}", e))?;

    if args.json {
        let json = serde_json::to_string_pretty(&store.views())
            .map_err(|e| format!("Cannot serialize records: {}", e))?;
        println!("{}", json);
    } else {
        print_table(&store);
    }

    if summary.has_failures() || add_failures > 0 {
        Ok(Outcome::HadFailures)
    } else {
        Ok(Outcome::Clean)
    }
}

fn print_table(store: &RecordStore) {
    for record in store.records() {
        let status = match record.status {
            RecordStatus::Done => "done",
            RecordStatus::Pending => "pending",
        };
        println!(
            "{:<7} {:>10}  {}  {}  {}",
            status,
            record.size_display(),
            record.original_fingerprint,
            record
                .output_fingerprint
                .as_ref()
                .map(|c| c.hex())
                .unwrap_or("-"),
            record.current_path().display()
        );
    }
}

/// Fingerprint each file and print `<digest>  <path>`, like md5sum.
fn run_hash(args: &HashArgs) -> Result<Outcome, String> {
    let algorithm: ChecksumAlgorithm = args
        .algorithm
        .parse()
        .map_err(|e: EngineError| e.to_string())?;

    let mut outcome = Outcome::Clean;
    for path in &args.files {
        match compute_file_checksum(path, algorithm, engine::checksums::DEFAULT_CHUNK_SIZE) {
            Ok(checksum) => println!("{}  {}", checksum, path.display()),
            Err(e) => {
                eprintln!("{}: {}", path.display(), e.detailed());
                outcome = Outcome::HadFailures;
            }
        }
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn process_args(files: Vec<PathBuf>) -> ProcessArgs {
        ProcessArgs {
            files,
            folder: Vec::new(),
            target: None,
            config: None,
            algorithm: None,
            suffix: None,
            json: false,
            verbose: false,
        }
    }

    #[test]
    fn test_cli_processes_into_custom_target() {
        let src_dir = TempDir::new().expect("Failed to create temp dir");
        let dst_dir = TempDir::new().expect("Failed to create temp dir");
        let file = src_dir.path().join("test.txt");
        fs::write(&file, "hello").expect("Failed to write file");

        let mut args = process_args(vec![file.clone()]);
        args.target = Some(dst_dir.path().to_path_buf());

        let result = run_cli(&args);
        assert_eq!(result, Ok(Outcome::Clean));

        let out = fs::read(dst_dir.path().join("test.txt")).expect("Failed to read output");
        assert_eq!(out.len(), 9);
        assert_eq!(fs::read(&file).expect("Failed to read source"), b"hello");
    }

    #[test]
    fn test_cli_uses_default_dated_target() {
        let src_dir = TempDir::new().expect("Failed to create temp dir");
        fs::write(src_dir.path().join("a.bin"), "abc").expect("Failed to write file");

        let mut args = process_args(Vec::new());
        args.folder = vec![src_dir.path().to_path_buf()];
        args.suffix = Some("rehashed".to_string());

        assert_eq!(run_cli(&args), Ok(Outcome::Clean));

        let created: Vec<_> = fs::read_dir(src_dir.path())
            .expect("Failed to list")
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_dir())
            .collect();
        assert_eq!(created.len(), 1);
        let name = created[0].file_name().to_string_lossy().to_string();
        assert!(name.ends_with("-rehashed"), "unexpected target {}", name);
        assert!(created[0].path().join("a.bin").is_file());
    }

    #[test]
    fn test_cli_rejects_empty_input() {
        assert!(run_cli(&process_args(Vec::new())).is_err());
    }

    #[test]
    fn test_cli_missing_file_reports_failure() {
        let src_dir = TempDir::new().expect("Failed to create temp dir");
        let args = process_args(vec![src_dir.path().join("missing.bin")]);
        assert_eq!(run_cli(&args), Ok(Outcome::HadFailures));
    }

    #[test]
    fn test_cli_rejects_missing_target() {
        let src_dir = TempDir::new().expect("Failed to create temp dir");
        let file = src_dir.path().join("a.bin");
        fs::write(&file, "abc").expect("Failed to write file");

        let mut args = process_args(vec![file]);
        args.target = Some(src_dir.path().join("nope"));
        assert!(run_cli(&args).is_err());
    }

    #[test]
    fn test_cli_rejects_invalid_algorithm() {
        let src_dir = TempDir::new().expect("Failed to create temp dir");
        let file = src_dir.path().join("a.bin");
        fs::write(&file, "abc").expect("Failed to write file");

        let mut args = process_args(vec![file]);
        args.algorithm = Some("crc32".to_string());
        assert!(run_cli(&args).is_err());
    }

    #[test]
    fn test_hash_command() {
        let src_dir = TempDir::new().expect("Failed to create temp dir");
        let file = src_dir.path().join("a.txt");
        fs::write(&file, "hello").expect("Failed to write file");

        let args = HashArgs {
            files: vec![file],
            algorithm: "md5".to_string(),
        };
        assert_eq!(run_hash(&args), Ok(Outcome::Clean));

        let args = HashArgs {
            files: vec![src_dir.path().join("missing")],
            algorithm: "md5".to_string(),
        };
        assert_eq!(run_hash(&args), Ok(Outcome::HadFailures));
    }

    #[test]
    fn test_cli_args_parse() {
        let cli = Cli::try_parse_from(["rehash", "process", "a.bin", "--folder", "dir", "--json"])
            .expect("Failed to parse");
        match cli.command {
            Command::Process(args) => {
                assert_eq!(args.files, vec![PathBuf::from("a.bin")]);
                assert_eq!(args.folder, vec![PathBuf::from("dir")]);
                assert!(args.json);
            }
            Command::Hash(_) => panic!("expected process subcommand"),
        }
    }
}
