//! Toolshed - expose a directory of executables as MCP tools over stdio.
//!
//! The server discovers tool providers at startup, then answers JSON-RPC
//! requests line by line on stdin/stdout until EOF.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use toolshed::{Dispatcher, FileLogger, RegistryBuilder, DEFAULT_LOG_PATH};

/// MCP server backed by a directory of executable tools
#[derive(Parser)]
#[command(name = "toolshed")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    command: Option<Commands>,

    /// Directory containing tool executables (default: `tools` next to the
    /// server binary). Supports `~` and environment variable expansion.
    #[arg(short, long, global = true)]
    tools_dir: Option<String>,

    /// Log file path
    #[arg(long, global = true, default_value = DEFAULT_LOG_PATH)]
    log_file: String,

    /// Enable verbose logging (written to stderr)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve MCP requests on stdin/stdout (default)
    Serve,

    /// Print the discovered toolbox as JSON and exit
    List,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging; stdout belongs to the RPC transport, so diagnostics go
    // to stderr.
    let filter = if cli.verbose { EnvFilter::new("debug") } else { EnvFilter::new("warn") };
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(io::stderr))
        .with(filter)
        .init();

    let tools_dir = resolve_tools_dir(cli.tools_dir.as_deref())?;
    let logger = FileLogger::new(expand_path(&cli.log_file)?);

    match cli.command {
        None | Some(Commands::Serve) => cmd_serve(&tools_dir, logger),
        Some(Commands::List) => cmd_list(&tools_dir, logger),
    }
}

/// Run the stdio server until stdin EOF.
fn cmd_serve(tools_dir: &Path, logger: FileLogger) -> Result<()> {
    logger.info(&format!("server starting, tool directory: {}", tools_dir.display()));

    let registry = RegistryBuilder::new(tools_dir, logger.clone()).build();
    let dispatcher = Dispatcher::new(registry, logger);

    let stdin = io::stdin();
    let stdout = io::stdout();
    dispatcher.run(stdin.lock(), stdout.lock()).context("request loop failed")?;

    Ok(())
}

/// Build the registry and print what was discovered.
fn cmd_list(tools_dir: &Path, logger: FileLogger) -> Result<()> {
    let registry = RegistryBuilder::new(tools_dir, logger).build();

    let mut report = serde_json::json!({ "tools": registry.definitions() });
    if registry.has_duplicates() {
        report["duplicates"] = registry
            .duplicates()
            .iter()
            .map(|(name, claimants)| {
                serde_json::json!({
                    "name": name,
                    "providers": claimants
                        .iter()
                        .map(|p| p.display().to_string())
                        .collect::<Vec<_>>(),
                })
            })
            .collect::<Vec<_>>()
            .into();
    }
    if !registry.errors().is_empty() {
        report["listingErrors"] =
            registry.errors().iter().map(ToString::to_string).collect::<Vec<_>>().into();
    }
    if !registry.instructions().is_empty() {
        report["instructions"] = registry.instructions().into();
    }

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Resolve the tool directory: explicit flag, or `tools` beside the binary.
fn resolve_tools_dir(arg: Option<&str>) -> Result<PathBuf> {
    match arg {
        Some(raw) => expand_path(raw),
        None => {
            let exe = std::env::current_exe().context("cannot locate server executable")?;
            let dir = exe.parent().context("server executable has no parent directory")?;
            Ok(dir.join("tools"))
        }
    }
}

/// Expand `~` and `$VAR` in a user-supplied path.
fn expand_path(raw: &str) -> Result<PathBuf> {
    let expanded =
        shellexpand::full(raw).with_context(|| format!("cannot expand path `{raw}`"))?;
    Ok(PathBuf::from(expanded.as_ref()))
}
