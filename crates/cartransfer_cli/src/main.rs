//! One-shot ledger invocation CLI.
//!
//! # Responsibility
//! - Open the ledger database, run exactly one invocation, print the result.
//! - Exit 0 on success and 1 on any failure.

use cartransfer_core::db::open_db;
use cartransfer_core::{core_version, default_log_level, init_logging, Response};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

const DEFAULT_DB_FILE_NAME: &str = "cartransfer_ledger.sqlite3";

/// Invoke one car-transfer ledger operation.
#[derive(Parser, Debug)]
#[command(name = "cartransfer_cli", version = core_version())]
struct Cli {
    /// Path to the ledger database file.
    #[arg(long, env = "CARTRANSFER_DB_PATH")]
    db: Option<PathBuf>,

    /// Absolute directory for rolling log files. Logging is off when unset.
    #[arg(long, env = "CARTRANSFER_LOG_DIR")]
    log_dir: Option<String>,

    /// trace|debug|info|warn|error. Defaults by build mode.
    #[arg(long, env = "CARTRANSFER_LOG_LEVEL")]
    log_level: Option<String>,

    /// Run the instantiate entry point instead of an operation.
    #[arg(long, conflicts_with = "function")]
    init: bool,

    /// Operation name, e.g. AddOwner, TransferCar.
    #[arg(required_unless_present = "init")]
    function: Option<String>,

    /// JSON-encoded operation arguments, e.g. '"c1"' or '{"Id":"o1"}'.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        if let Err(err) = init_logging(level, log_dir) {
            eprintln!("logging_init_failed: {err}");
            return ExitCode::FAILURE;
        }
    }

    if cli.init {
        return report(&cartransfer_core::init());
    }

    let db_path = cli
        .db
        .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME));
    let mut conn = match open_db(&db_path) {
        Ok(conn) => conn,
        Err(err) => {
            eprintln!("{}: {err}", err.error_code());
            return ExitCode::FAILURE;
        }
    };

    let function = cli.function.unwrap_or_default();
    report(&cartransfer_core::invoke(&mut conn, &function, &cli.args))
}

fn report(response: &Response) -> ExitCode {
    if response.is_ok() {
        if !response.payload.is_empty() {
            println!("{}", response.payload_text());
        }
        ExitCode::SUCCESS
    } else {
        eprintln!(
            "{}: {}",
            response.error_code.unwrap_or("error"),
            response.message
        );
        ExitCode::FAILURE
    }
}
