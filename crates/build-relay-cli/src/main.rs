// crates/build-relay-cli/src/main.rs
// ============================================================================
// Module: Build Relay CLI Entry Point
// Description: Command dispatcher for the relay's console, one-shot, and HTTP modes.
// Purpose: Load configuration, assemble the router, and run the chosen front end.
// Dependencies: build-relay-cli, build-relay-config, build-relay-core, clap, thiserror
// ============================================================================

//! ## Overview
//! `build-relay` loads the relay configuration and drives the dispatch engine
//! from stdin (`console`), from arguments (`dispatch`, `event`), or from HTTP
//! (`serve`). Engine log records go to stderr through `tracing`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use build_relay_cli::app::build_router;
use build_relay_cli::console::ConsoleReply;
use build_relay_cli::console::ConsoleTransport;
use build_relay_cli::console::ConsoleWriter;
use build_relay_cli::console::run_console;
use build_relay_cli::logging::init_tracing;
use build_relay_cli::server::RelayServer;
use build_relay_config::RelayConfig;
use build_relay_core::CommandRouter;
use build_relay_core::InvocationReport;
use build_relay_core::Origin;
use build_relay_core::ReplyTarget;
use build_relay_core::TracingLogSink;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "build-relay", version, disable_help_subcommand = true)]
struct Cli {
    /// Config file path (defaults to `BUILD_RELAY_CONFIG` or build-relay.toml).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Requesting user recorded on console and one-shot invocations.
    #[arg(long, value_name = "USER", global = true)]
    user: Option<String>,
    /// Log at debug level when `RUST_LOG` is unset.
    #[arg(long, short, global = true)]
    verbose: bool,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Read commands from stdin and print replies and broadcasts.
    Console,
    /// Dispatch a single command.
    Dispatch(DispatchCommand),
    /// Deliver a single event.
    Event(EventCommand),
    /// Serve commands and events over HTTP.
    Serve(ServeCommand),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Arguments for `dispatch`.
#[derive(Args, Debug)]
struct DispatchCommand {
    /// Command text, e.g. `build webapp main`.
    #[arg(required = true, num_args = 1..)]
    text: Vec<String>,
}

/// Arguments for `event`.
#[derive(Args, Debug)]
struct EventCommand {
    /// Event title.
    title: String,
    /// Event body.
    body: String,
}

/// Arguments for `serve`.
#[derive(Args, Debug)]
struct ServeCommand {
    /// Listen address.
    #[arg(long, value_name = "ADDR", default_value = "127.0.0.1:8080")]
    bind: String,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate the config file and exit.
    Validate,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = load_config(&cli)?;
    match cli.command {
        Commands::Config {
            command: ConfigCommand::Validate,
        } => {
            write_stdout_line(&format!("config ok: {} project(s)", config.projects.len()))?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Console => command_console(&config, cli.user.as_deref()),
        Commands::Dispatch(command) => command_dispatch(&config, &command, cli.user.as_deref()),
        Commands::Event(command) => command_event(&config, &command),
        Commands::Serve(command) => command_serve(&config, &command),
    }
}

/// Loads and validates the configuration.
fn load_config(cli: &Cli) -> CliResult<Arc<RelayConfig>> {
    RelayConfig::load(cli.config.as_deref())
        .map(Arc::new)
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Builds a router whose sinks print to stdout.
fn console_router(config: &Arc<RelayConfig>, writer: &ConsoleWriter) -> CliResult<CommandRouter> {
    let transport = Arc::new(ConsoleTransport::from_config(config, writer.clone()));
    build_router(config, transport, Arc::new(TracingLogSink))
        .map_err(|err| CliError::new(format!("failed to start relay: {err}")))
}

/// Executes `console`.
fn command_console(config: &Arc<RelayConfig>, user: Option<&str>) -> CliResult<ExitCode> {
    let writer = ConsoleWriter::stdout();
    let router = console_router(config, &writer)?;
    let reply: Arc<dyn ReplyTarget> = Arc::new(ConsoleReply::new(writer));
    let summary = run_console(&router, std::io::stdin().lock(), &reply, user)
        .map_err(|err| CliError::new(format!("failed to read stdin: {err}")))?;
    tracing::info!(
        dispatched = summary.dispatched,
        unhandled = summary.unhandled,
        unmatched = summary.unmatched,
        "console session ended"
    );
    Ok(exit_code(summary.unhandled == 0))
}

/// Executes `dispatch`.
fn command_dispatch(
    config: &Arc<RelayConfig>,
    command: &DispatchCommand,
    user: Option<&str>,
) -> CliResult<ExitCode> {
    let writer = ConsoleWriter::stdout();
    let router = console_router(config, &writer)?;
    let text = command.text.join(" ");
    let mut origin = Origin::reply(Arc::new(ConsoleReply::new(writer)));
    if let Some(user) = user {
        origin = origin.with_initiator(user);
    }
    let Some(report) = router.dispatch(&text, origin) else {
        return Err(CliError::new(format!(
            "'{text}' is not a known command\nUsage:\n{}",
            router.usage()
        )));
    };
    Ok(report_exit_code(&report))
}

/// Executes `event`.
fn command_event(config: &Arc<RelayConfig>, command: &EventCommand) -> CliResult<ExitCode> {
    let writer = ConsoleWriter::stdout();
    let router = console_router(config, &writer)?;
    let report = router.handle_event(&command.title, &command.body, Origin::detached());
    Ok(report_exit_code(&report))
}

/// Executes `serve`.
fn command_serve(config: &Arc<RelayConfig>, command: &ServeCommand) -> CliResult<ExitCode> {
    let writer = ConsoleWriter::stdout();
    let router = Arc::new(console_router(config, &writer)?);
    let server = RelayServer::bind(&command.bind, router)
        .map_err(|err| CliError::new(err.to_string()))?;
    if let Some(addr) = server.local_addr() {
        tracing::info!(%addr, "serving http");
    }
    server.run();
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Maps an invocation outcome to the process exit code.
fn report_exit_code(report: &InvocationReport) -> ExitCode {
    exit_code(!report.outcome.is_unhandled())
}

/// Returns success or failure.
const fn exit_code(success: bool) -> ExitCode {
    if success { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}

/// Writes a line to stdout.
fn write_stdout_line(message: &str) -> CliResult<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
        .map_err(|err| CliError::new(format!("failed to write stdout: {err}")))
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let mut stderr = std::io::stderr();
    let _ = writeln!(&mut stderr, "{message}");
    ExitCode::FAILURE
}
