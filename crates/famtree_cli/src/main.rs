//! Command-line front end for `famtree_core`.
//!
//! # Responsibility
//! - Resolve store configuration from environment and flags.
//! - Load the stores and the persisted session once, run one command, exit.

mod commands;

use clap::{Parser, ValueEnum};
use commands::{App, Command};
use famtree_core::{default_log_level, init_logging, BackendKind, StoreConfig};
use log::info;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "famtree", version, about = "Maintain a family tree from the command line.")]
struct Cli {
    /// Directory holding the tree and credential snapshots.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    /// Snapshot backend.
    #[arg(long, global = true, value_enum)]
    backend: Option<BackendArg>,
    /// trace|debug|info|warn|error
    #[arg(long, global = true)]
    log_level: Option<String>,
    /// Keep the tree when signing in.
    #[arg(long, global = true)]
    keep_tree_on_sign_in: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BackendArg {
    Json,
    Sqlite,
}

impl From<BackendArg> for BackendKind {
    fn from(value: BackendArg) -> Self {
        match value {
            BackendArg::Json => BackendKind::JsonFile,
            BackendArg::Sqlite => BackendKind::Sqlite,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match StoreConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(backend) = cli.backend {
        config.backend = backend.into();
    }
    if cli.keep_tree_on_sign_in {
        config.session.reset_tree_on_sign_in = false;
    }

    let level = cli.log_level.as_deref().unwrap_or(default_log_level());
    match std::path::absolute(config.data_dir.join("logs")) {
        Ok(log_dir) => {
            if let Err(err) = init_logging(level, &log_dir) {
                eprintln!("warning: logging disabled: {err}");
            }
        }
        Err(err) => eprintln!("warning: logging disabled: {err}"),
    }
    info!(
        "event=cli_start module=cli status=ok backend={}",
        config.backend.as_str()
    );

    let credentials = config.open_credentials();
    let mut app = App {
        tree: config.open_family_tree(),
        session: config.open_session(&credentials),
        credentials,
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match app.execute(cli.command, &mut out, prompt_yes_no) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn prompt_yes_no(name: &str) -> bool {
    let mut stderr = io::stderr();
    let _ = write!(stderr, "Are you sure you want to delete {name}? [y/N] ");
    let _ = stderr.flush();

    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
