//! Developer CLI for ConfirmKit.
//!
//! Creates and confirms deferred actions against an on-disk store, using the
//! built-in handlers from [`handlers`].
//!
//! # Usage
//!
//! ```bash
//! confirmkit create --module echo --method reply --argument hello
//! confirmkit confirm --path /confirmation/process/<key>/<hash>
//! confirmkit show <key>
//! ```

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use confirmkit_core::config::DEFAULT_PATH_PREFIX;
use confirmkit_core::{
    current_timestamp, status_for, ConfirmationEngine, ConfirmationKey, EngineConfig, FileStore,
    HandlerSelector, StorePaths,
};
use eyre::{eyre, Result, WrapErr};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod handlers;
mod view;

/// Create and confirm deferred actions.
#[derive(Parser)]
#[command(name = "confirmkit", version)]
#[command(about = "Create and confirm deferred actions", long_about = None)]
struct Cli {
    /// Root directory of the confirmation store [default: platform data dir]
    #[arg(long, env = "CONFIRMKIT_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Path prefix of confirmation links
    #[arg(long, env = "CONFIRMKIT_PREFIX", default_value = DEFAULT_PATH_PREFIX, global = true)]
    prefix: String,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Register a deferred action and print its confirmation path.
    ///
    /// Without `--module`, `--method` reads `<group>.<method>`.
    Create {
        /// Method selector
        #[arg(long)]
        method: String,

        /// Module exporting the method
        #[arg(long)]
        module: Option<String>,

        /// Argument handed to the handler
        #[arg(long, default_value = "")]
        argument: String,

        /// Seconds until the confirmation expires
        #[arg(long, value_name = "SECS")]
        expires_in: Option<u64>,
    },

    /// Validate a confirmation and run its handler.
    Confirm {
        /// Confirmation key
        #[arg(required_unless_present = "path", conflicts_with = "path")]
        key: Option<String>,

        /// Token hash from the confirmation link
        #[arg(required_unless_present = "path", conflicts_with = "path")]
        token_hash: Option<String>,

        /// Full confirmation path instead of key and hash
        #[arg(long)]
        path: Option<String>,
    },

    /// Print a stored record as JSON with the token redacted.
    Show {
        /// Confirmation key
        key: String,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let mut stdout = io::stdout().lock();
    run(cli, &mut stdout)
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn open_engine(data_dir: Option<PathBuf>, prefix: String) -> Result<ConfirmationEngine> {
    let root = data_dir
        .or_else(dirs::data_dir)
        .ok_or_else(|| eyre!("no data directory available; pass --data-dir"))?;
    let store = FileStore::open(StorePaths::new(&root))
        .wrap_err_with(|| format!("opening store under {}", root.display()))?;
    let engine = ConfirmationEngine::new(
        Arc::new(store),
        Arc::new(handlers::builtin_registry()),
        EngineConfig::default().with_path_prefix(prefix),
    )?;
    Ok(engine)
}

fn run(cli: Cli, out: &mut impl Write) -> Result<()> {
    let engine = open_engine(cli.data_dir, cli.prefix)?;

    match cli.command {
        Commands::Create {
            method,
            module,
            argument,
            expires_in,
        } => {
            let selector = HandlerSelector { module, method };
            let expires = expires_in.map(|secs| current_timestamp().saturating_add(secs));
            let path = engine
                .create_process(&selector, argument, expires)
                .wrap_err("creating confirmation process")?;
            writeln!(out, "{path}")?;
        }
        Commands::Confirm {
            key,
            token_hash,
            path,
        } => {
            let result = path.as_deref().map_or_else(
                || {
                    engine.confirm(
                        key.as_deref().unwrap_or_default(),
                        token_hash.as_deref().unwrap_or_default(),
                    )
                },
                |path| engine.confirm_path(path),
            );
            let status = status_for(&result);
            match result {
                Ok(confirmation) => {
                    writeln!(out, "outcome: {}", confirmation.outcome)?;
                    writeln!(out, "status: {status}")?;
                    writeln!(out, "{}", confirmation.reply.body)?;
                }
                Err(err) => {
                    writeln!(out, "status: {status}")?;
                    return Err(err).wrap_err("confirmation failed");
                }
            }
        }
        Commands::Show { key } => {
            let key = ConfirmationKey::parse(key.trim())?;
            let record = engine
                .store()
                .find_by_key(&key)?
                .ok_or_else(|| eyre!("confirmation not found: {key}"))?;
            serde_json::to_writer_pretty(
                &mut *out,
                &view::RecordView::new(&record, current_timestamp()),
            )?;
            writeln!(out)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    fn run_args(dir: &tempfile::TempDir, args: &[&str]) -> Result<String> {
        let root = dir.path().to_str().expect("utf-8 path");
        let mut argv = vec!["confirmkit", "--data-dir", root, "--prefix", "confirmation"];
        argv.extend_from_slice(args);
        let cli = Cli::try_parse_from(argv)?;
        let mut out = Vec::new();
        run(cli, &mut out)?;
        Ok(String::from_utf8(out)?)
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_create_confirm_show() {
        let dir = tempfile::tempdir().expect("tempdir");
        let created = run_args(
            &dir,
            &["create", "--module", "echo", "--method", "reply", "--argument", "hello"],
        )
        .expect("create");
        let path = created.trim();
        assert!(path.starts_with("/confirmation/process/"));
        let key = path.split('/').nth(3).expect("key segment");

        let shown = run_args(&dir, &["show", key]).expect("show");
        let json: serde_json::Value = serde_json::from_str(&shown).expect("json");
        assert_eq!(json["state"], "pending");
        assert_eq!(json["token"], "[REDACTED]");

        let confirmed = run_args(&dir, &["confirm", "--path", path]).expect("confirm");
        assert_eq!(confirmed, "outcome: success\nstatus: 200\nhello\n");

        let again = run_args(&dir, &["confirm", "--path", path]).expect("confirm");
        assert!(again.starts_with("outcome: again\nstatus: 200\n"));
    }

    #[test]
    fn test_confirm_with_key_and_hash() {
        let dir = tempfile::tempdir().expect("tempdir");
        let created = run_args(
            &dir,
            &["create", "--method", "audit.log", "--argument", "bob"],
        )
        .expect("create");
        let segments: Vec<&str> = created.trim().split('/').collect();

        let zeros = "0".repeat(64);
        let forged = run_args(&dir, &["confirm", segments[3], zeros.as_str()]).expect("confirm");
        assert_eq!(forged, "outcome: invalidHash\nstatus: 403\ninvalidHash: bob\n");

        let confirmed = run_args(&dir, &["confirm", segments[3], segments[4]]).expect("confirm");
        assert!(confirmed.starts_with("outcome: success\nstatus: 200\n"));
    }

    #[test]
    fn test_errors_fail_the_command() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(run_args(&dir, &["create", "--method", "nope"]).is_err());
        assert!(run_args(&dir, &["confirm", "0123456789abcdef", "abcd"]).is_err());
        assert!(run_args(&dir, &["show", "0123456789abcdef"]).is_err());
        assert!(run_args(&dir, &["confirm"]).is_err());
    }
}
