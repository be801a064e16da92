//! spoolctl - operator CLI for a telemetry spool directory.
//!
//! Commands:
//! - `status`: what is on disk and how full the spool is
//! - `push`: enqueue a payload file
//! - `drain`: dequeue records, optionally writing payloads out
//! - `sweep-temp`: delete abandoned staging and in-flight files
//!
//! Results go to stdout as JSON; logs and errors go to stderr.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use spool_config::{resolve_config, ConfigError, Overrides};
use spool_core::exit_codes::ExitCode;
use spool_core::logging::{init_logging, LogConfig, LogFormat, LogLevel};
use spool_core::{DirectoryStore, Error, FailureStats, ProcessToken, StoreConfig, Transmission};
use tracing::{debug, warn};

/// Version of the JSON documents printed on stdout.
const OUTPUT_SCHEMA_VERSION: u32 = 1;

/// Inspect and operate a telemetry spool directory
#[derive(Parser)]
#[command(name = "spoolctl")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Spool directory (overrides SPOOL_DIR and the config file)
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Capacity in megabytes (clamped to 1..=1000)
    #[arg(long, global = true, allow_negative_numbers = true)]
    capacity_mb: Option<i64>,

    /// Config file (overrides SPOOL_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log format on stderr (human, jsonl)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show spool directory status
    Status,

    /// Enqueue the contents of a file
    Push(PushArgs),

    /// Dequeue records
    Drain(DrainArgs),

    /// Delete old temporary files
    SweepTemp(SweepArgs),
}

#[derive(Args, Debug)]
struct PushArgs {
    /// Payload file
    file: PathBuf,

    /// Content type sent with the payload
    #[arg(long, default_value = "application/x-json-stream")]
    content_type: String,

    /// Content encoding sent with the payload (e.g. gzip)
    #[arg(long, default_value = "")]
    content_encoding: String,

    /// Store as a bare byte record without content metadata
    #[arg(long, conflicts_with_all = ["content_type", "content_encoding"])]
    raw: bool,
}

#[derive(Args, Debug)]
struct DrainArgs {
    /// Write each payload to this directory; payloads are discarded otherwise
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Maximum records to dequeue
    #[arg(long, default_value_t = 100)]
    limit: usize,
}

#[derive(Args, Debug)]
struct SweepArgs {
    /// Only delete files at least this old
    #[arg(long, default_value_t = 3600)]
    older_than_secs: u64,
}

fn main() {
    let cli = Cli::parse();

    let cli_level = if cli.global.quiet {
        Some(LogLevel::Error)
    } else {
        match cli.global.verbose {
            0 => None,
            1 => Some(LogLevel::Debug),
            _ => Some(LogLevel::Trace),
        }
    };
    init_logging(&LogConfig::from_env(cli_level, cli.global.log_format));

    let exit_code = match open_store(&cli.global) {
        Ok(store) => match &cli.command {
            Commands::Status => run_status(&store),
            Commands::Push(args) => run_push(&store, args),
            Commands::Drain(args) => run_drain(&store, args),
            Commands::SweepTemp(args) => run_sweep(&store, args),
        },
        Err(code) => code,
    };

    std::process::exit(exit_code.as_i32());
}

fn open_store(global: &GlobalOpts) -> Result<DirectoryStore, ExitCode> {
    let overrides = Overrides {
        config_path: global.config.clone(),
        directory: global.dir.clone(),
        capacity_mb: global.capacity_mb,
    };
    let resolved = resolve_config(&overrides).map_err(|e| output_config_error(&e))?;
    debug!(source = %resolved.source, "resolved spool configuration");

    let config = StoreConfig::from_spool_config(&resolved.config).with_directory(resolved.directory());
    let stats = Arc::new(FailureStats::new(Duration::ZERO));
    DirectoryStore::open(config, ProcessToken::generate(), stats).map_err(|e| output_error("open", &e))
}

fn run_status(store: &DirectoryStore) -> ExitCode {
    match store.status() {
        Ok(status) => {
            print_json(&serde_json::json!({
                "schema_version": OUTPUT_SCHEMA_VERSION,
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "command": "status",
                "status": status,
            }));
            ExitCode::Clean
        }
        Err(e) => output_error("status", &e),
    }
}

fn run_push(store: &DirectoryStore, args: &PushArgs) -> ExitCode {
    let content = match fs::read(&args.file) {
        Ok(content) => content,
        Err(source) => {
            return output_error(
                "push",
                &Error::Read {
                    path: args.file.clone(),
                    source,
                },
            )
        }
    };
    let bytes = content.len();

    let result = if args.raw {
        store.try_enqueue_raw(&content)
    } else {
        store.try_enqueue(&Transmission::new(
            content,
            args.content_type.as_str(),
            args.content_encoding.as_str(),
        ))
    };

    match result {
        Ok(committed) => {
            print_json(&serde_json::json!({
                "schema_version": OUTPUT_SCHEMA_VERSION,
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "command": "push",
                "committed": committed.display().to_string(),
                "payload_bytes": bytes,
                "tracked_bytes": store.size_bytes(),
            }));
            ExitCode::Clean
        }
        Err(e) => output_error("push", &e),
    }
}

#[derive(Serialize)]
struct DrainedRecord {
    payload_bytes: usize,
    content_type: String,
    content_encoding: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    written_to: Option<String>,
}

fn run_drain(store: &DirectoryStore, args: &DrainArgs) -> ExitCode {
    if let Some(out_dir) = &args.out_dir {
        if let Err(e) = fs::create_dir_all(out_dir) {
            return output_error(
                "drain",
                &Error::Config(format!(
                    "cannot create output directory {}: {}",
                    out_dir.display(),
                    e
                )),
            );
        }
    }

    let mut drained = Vec::new();
    let mut failed = 0usize;

    for index in 0..args.limit {
        let transmission = match store.try_dequeue() {
            Ok(Some(t)) => t,
            Ok(None) => break,
            Err(e) => {
                warn!(code = e.code(), error = %e, "record not recovered");
                failed += 1;
                continue;
            }
        };

        let written_to = match &args.out_dir {
            Some(out_dir) => match write_payload(out_dir, index, &transmission) {
                Ok(path) => Some(path.display().to_string()),
                Err(e) => {
                    warn!(error = %e, "unable to write drained payload");
                    failed += 1;
                    None
                }
            },
            None => None,
        };

        drained.push(DrainedRecord {
            payload_bytes: transmission.len(),
            content_type: transmission.content_type().to_string(),
            content_encoding: transmission.content_encoding().to_string(),
            written_to,
        });
    }

    print_json(&serde_json::json!({
        "schema_version": OUTPUT_SCHEMA_VERSION,
        "generated_at": chrono::Utc::now().to_rfc3339(),
        "command": "drain",
        "drained": drained.len(),
        "failed": failed,
        "records": drained,
        "tracked_bytes": store.size_bytes(),
    }));

    if failed > 0 {
        ExitCode::PartialFail
    } else if drained.is_empty() {
        ExitCode::NothingToDo
    } else {
        ExitCode::Clean
    }
}

fn write_payload(out_dir: &Path, index: usize, transmission: &Transmission) -> std::io::Result<PathBuf> {
    let path = out_dir.join(format!("payload-{:06}.bin", index));
    fs::write(&path, transmission.content())?;
    Ok(path)
}

fn run_sweep(store: &DirectoryStore, args: &SweepArgs) -> ExitCode {
    match store.sweep_temporary_files(Duration::from_secs(args.older_than_secs)) {
        Ok(swept) => {
            let code = if swept.is_empty() {
                ExitCode::NothingToDo
            } else {
                ExitCode::Clean
            };
            print_json(&serde_json::json!({
                "schema_version": OUTPUT_SCHEMA_VERSION,
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "command": "sweep-temp",
                "swept": swept.len(),
                "freed_bytes": swept.iter().map(|f| f.size_bytes).sum::<u64>(),
                "files": swept,
            }));
            code
        }
        Err(e) => output_error("sweep-temp", &e),
    }
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("spoolctl: unable to render output: {}", e),
    }
}

fn output_error(command: &str, error: &Error) -> ExitCode {
    let exit_code = ExitCode::for_error(error);
    let response = serde_json::json!({
        "schema_version": OUTPUT_SCHEMA_VERSION,
        "generated_at": chrono::Utc::now().to_rfc3339(),
        "command": command,
        "status": "error",
        "error": {
            "code": error.code(),
            "category": error.category(),
            "message": error.to_string(),
            "exit_code": exit_code.code_name(),
        }
    });
    match serde_json::to_string_pretty(&response) {
        Ok(text) => eprintln!("{}", text),
        Err(_) => eprintln!("spoolctl {}: {}", command, error),
    }
    exit_code
}

fn output_config_error(error: &ConfigError) -> ExitCode {
    let exit_code = match error {
        ConfigError::Io { .. } | ConfigError::Parse(_) | ConfigError::InvalidValue { .. } => {
            ExitCode::ConfigError
        }
        ConfigError::InvalidLimits { .. } => ExitCode::InternalError,
    };
    let response = serde_json::json!({
        "schema_version": OUTPUT_SCHEMA_VERSION,
        "generated_at": chrono::Utc::now().to_rfc3339(),
        "status": "error",
        "error": {
            "code": error.code(),
            "category": "config",
            "message": error.to_string(),
            "exit_code": exit_code.code_name(),
        }
    });
    match serde_json::to_string_pretty(&response) {
        Ok(text) => eprintln!("{}", text),
        Err(_) => eprintln!("spoolctl: {}", error),
    }
    exit_code
}
