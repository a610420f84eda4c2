// crates/inksync-cli/src/main.rs
// ============================================================================
// Module: InkSync CLI Entry Point
// Description: Command dispatcher for the signature webhook service.
// Purpose: Assemble the store, notifier, and audit sink and run the server.
// Dependencies: clap, inksync-config, inksync-core, inksync-webhook, tokio
// ============================================================================

//! ## Overview
//! The InkSync CLI wires environment configuration into a running webhook
//! server. `serve` assembles the signature-request store, the email notifier,
//! and the audit sink, then serves until the listener fails; `check-config`
//! validates the environment and prints a redacted summary.

// ============================================================================
// SECTION: Modules
// ============================================================================

#[cfg(test)]
mod main_tests;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;

use clap::ArgAction;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use inksync_config::AuditConfig;
use inksync_config::AuditSinkKind;
use inksync_config::DEFAULT_BUSY_TIMEOUT_MS;
use inksync_config::EmailConfig;
use inksync_config::InkSyncConfig;
use inksync_config::JournalMode;
use inksync_config::StoreBackend;
use inksync_config::StoreConfig;
use inksync_config::SyncMode;
use inksync_core::InMemoryRequestStore;
use inksync_core::NoopNotifier;
use inksync_core::Notifier;
use inksync_core::SharedRequestStore;
use inksync_notify::EmailNotifier;
use inksync_notify::EmailNotifierConfig;
use inksync_store_sqlite::SqliteJournalMode;
use inksync_store_sqlite::SqliteRequestStore;
use inksync_store_sqlite::SqliteStoreConfig;
use inksync_store_sqlite::SqliteSyncMode;
use inksync_webhook::FileAuditSink;
use inksync_webhook::StderrAuditSink;
use inksync_webhook::WebhookAuditSink;
use inksync_webhook::WebhookServer;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "inksync", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the signature webhook server.
    Serve,
    /// Validate environment configuration and print a redacted summary.
    CheckConfig,
}

/// CLI error with a user-facing message.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// User-facing error message.
    message: String,
}

impl CliError {
    /// Creates a new CLI error.
    fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();

    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&format!("inksync {version}"))
            .map_err(|err| CliError::new(format!("stdout write failed: {err}")))?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    match command {
        Commands::Serve => command_serve().await,
        Commands::CheckConfig => command_check_config(),
    }
}

// ============================================================================
// SECTION: Serve Command
// ============================================================================

/// Executes the `serve` command.
async fn command_serve() -> CliResult<ExitCode> {
    let config = InkSyncConfig::from_env()
        .map_err(|err| CliError::new(format!("config load failed: {err}")))?;
    // The email notifier builds a blocking HTTP client, which must not happen
    // on an async worker thread.
    let server = tokio::task::spawn_blocking(move || build_server(config))
        .await
        .map_err(|err| CliError::new(format!("server init join failed: {err}")))??;
    server.serve().await.map_err(|err| CliError::new(format!("server failed: {err}")))?;
    Ok(ExitCode::SUCCESS)
}

/// Assembles the webhook server from validated configuration.
fn build_server(config: InkSyncConfig) -> CliResult<WebhookServer> {
    let store = build_store(&config.store)?;
    let notifier = build_notifier(&config.email)?;
    let audit = build_audit_sink(&config.audit)?;
    Ok(WebhookServer::new(config.server, store, notifier, audit))
}

/// Builds the signature-request store from configuration.
fn build_store(config: &StoreConfig) -> CliResult<SharedRequestStore> {
    match config.backend {
        StoreBackend::Memory => Ok(SharedRequestStore::from_store(InMemoryRequestStore::new())),
        StoreBackend::Sqlite => {
            let path = config.path.clone().ok_or_else(|| {
                CliError::new("sqlite store requires INKSYNC_STORE_PATH".to_string())
            })?;
            let store = SqliteRequestStore::new(SqliteStoreConfig {
                path,
                busy_timeout_ms: config.busy_timeout_ms.unwrap_or(DEFAULT_BUSY_TIMEOUT_MS),
                journal_mode: map_journal_mode(config.journal_mode),
                sync_mode: map_sync_mode(config.sync_mode),
            })
            .map_err(|err| CliError::new(format!("store init failed: {err}")))?;
            Ok(SharedRequestStore::from_store(store))
        }
    }
}

/// Builds the notifier from email configuration.
fn build_notifier(config: &EmailConfig) -> CliResult<Arc<dyn Notifier>> {
    if !config.enabled {
        return Ok(Arc::new(NoopNotifier));
    }
    let api_url = config.api_url.clone().ok_or_else(|| {
        CliError::new("email enabled without INKSYNC_EMAIL_API_URL".to_string())
    })?;
    let api_key = config.api_key.clone().ok_or_else(|| {
        CliError::new("email enabled without INKSYNC_EMAIL_API_KEY".to_string())
    })?;
    let from_address = config.from_address.clone().ok_or_else(|| {
        CliError::new("email enabled without INKSYNC_EMAIL_FROM".to_string())
    })?;
    let notifier = EmailNotifier::new(EmailNotifierConfig {
        api_url,
        api_key,
        from_address,
        timeout_ms: config.timeout_ms,
    })
    .map_err(|err| CliError::new(format!("notifier init failed: {err}")))?;
    Ok(Arc::new(notifier))
}

/// Builds the audit sink from configuration.
fn build_audit_sink(config: &AuditConfig) -> CliResult<Arc<dyn WebhookAuditSink>> {
    match config.sink {
        AuditSinkKind::Stderr => Ok(Arc::new(StderrAuditSink)),
        AuditSinkKind::File => {
            let path = config.path.clone().ok_or_else(|| {
                CliError::new("file audit sink requires INKSYNC_AUDIT_PATH".to_string())
            })?;
            let sink = FileAuditSink::new(&path)
                .map_err(|err| CliError::new(format!("audit sink init failed: {err}")))?;
            Ok(Arc::new(sink))
        }
    }
}

/// Maps the configured journal mode onto the store type.
const fn map_journal_mode(mode: JournalMode) -> SqliteJournalMode {
    match mode {
        JournalMode::Wal => SqliteJournalMode::Wal,
        JournalMode::Delete => SqliteJournalMode::Delete,
    }
}

/// Maps the configured sync mode onto the store type.
const fn map_sync_mode(mode: SyncMode) -> SqliteSyncMode {
    match mode {
        SyncMode::Full => SqliteSyncMode::Full,
        SyncMode::Normal => SqliteSyncMode::Normal,
    }
}

// ============================================================================
// SECTION: Check-Config Command
// ============================================================================

/// Executes the `check-config` command.
fn command_check_config() -> CliResult<ExitCode> {
    let config = InkSyncConfig::from_env()
        .map_err(|err| CliError::new(format!("config load failed: {err}")))?;
    write_stdout_line(&config.redacted_summary())
        .map_err(|err| CliError::new(format!("stdout write failed: {err}")))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Prints top-level help.
fn show_help() -> CliResult<()> {
    let mut command = Cli::command();
    command
        .print_help()
        .map_err(|err| CliError::new(format!("stdout write failed: {err}")))?;
    write_stdout_line("").map_err(|err| CliError::new(format!("stdout write failed: {err}")))?;
    Ok(())
}

/// Writes a line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Reports an error and maps it to a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
