//! cs-e2e - operator commands for the Content Sources end-to-end harness.
//!
//! Inspect and refresh persona tokens, build identity headers, and clear
//! leftovers of earlier runs from a live environment.

mod commands;

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cs_e2e_core::Persona;

// ============================================================================
// Constants
// ============================================================================

/// Application name used for the default log directory
const APP_NAME: &str = "cs-e2e";

/// Log file prefix; the appender adds the date
const LOG_FILE_PREFIX: &str = "cs-e2e.log";

#[derive(Parser, Debug)]
#[command(name = "cs-e2e", version, about = "Content Sources end-to-end harness tools")]
struct Cli {
    /// Also write logs to this directory
    #[arg(long, global = true, env = "CS_E2E_LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// Write logs to the default cache directory
    #[arg(long, global = true)]
    log: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Inspect or refresh persona JWTs
    #[command(subcommand)]
    Token(TokenCommand),

    /// Print an x-rh-identity header for an org and user
    Identity(IdentityArgs),

    /// Delete leftovers of earlier runs
    #[command(subcommand)]
    Cleanup(CleanupCommand),
}

#[derive(Subcommand, Debug)]
enum TokenCommand {
    /// Show expiry of stored persona tokens
    Status {
        /// Only this persona (name or auth file)
        #[arg(long)]
        persona: Option<Persona>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Refresh a persona's token through its stored session
    Refresh {
        #[arg(long)]
        persona: Persona,

        /// Skip the refresh when the token is still valid
        #[arg(long)]
        if_needed: bool,
    },
}

#[derive(Args, Debug)]
struct IdentityArgs {
    #[arg(long)]
    org: String,

    #[arg(long)]
    user: String,

    #[arg(long, default_value = "11111")]
    account: String,

    /// Prefix the value with the header name
    #[arg(long)]
    with_name: bool,
}

#[derive(Subcommand, Debug)]
enum CleanupCommand {
    /// Delete custom repositories matching names or URLs
    Repos {
        #[arg(required = true)]
        terms: Vec<String>,

        /// Act as this persona instead of the identity header
        #[arg(long)]
        persona: Option<Persona>,
    },

    /// Delete templates whose names start with a prefix
    Templates {
        #[arg(required = true)]
        prefixes: Vec<String>,

        #[arg(long)]
        persona: Option<Persona>,
    },
}

/// Initialize the tracing subscriber for logging.
///
/// The returned guard flushes the file writer and must live until exit.
fn init_tracing(log_dir: Option<PathBuf>) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

fn default_log_dir() -> Option<PathBuf> {
    dirs::cache_dir().map(|dir| dir.join(APP_NAME).join("logs"))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let log_dir = if cli.log { default_log_dir() } else { cli.log_dir };
    let _guard = init_tracing(log_dir);
    info!(command = ?cli.command, "cs-e2e starting");

    match cli.command {
        Command::Token(TokenCommand::Status { persona, json }) => {
            commands::token_status(persona, json)
        }
        Command::Token(TokenCommand::Refresh { persona, if_needed }) => {
            commands::token_refresh(persona, if_needed).await
        }
        Command::Identity(args) => {
            commands::identity(&args.org, &args.user, &args.account, args.with_name);
            Ok(())
        }
        Command::Cleanup(CleanupCommand::Repos { terms, persona }) => {
            commands::cleanup_repos(&terms, persona).await
        }
        Command::Cleanup(CleanupCommand::Templates { prefixes, persona }) => {
            commands::cleanup_templates(&prefixes, persona).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_token_refresh() {
        let args = ["cs-e2e", "token", "refresh", "--persona", "stable_sam.json"];
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Command::Token(TokenCommand::Refresh { persona, if_needed }) => {
                assert_eq!(persona, Persona::StableSam);
                assert!(!if_needed);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_persona_is_rejected() {
        assert!(Cli::try_parse_from(["cs-e2e", "token", "status", "--persona", "nobody"]).is_err());
    }

    #[test]
    fn test_cleanup_requires_terms() {
        assert!(Cli::try_parse_from(["cs-e2e", "cleanup", "repos"]).is_err());
        let args = ["cs-e2e", "cleanup", "templates", "e2e-", "smoke-"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(matches!(
            cli.command,
            Command::Cleanup(CleanupCommand::Templates { ref prefixes, .. }) if prefixes.len() == 2
        ));
    }
}
