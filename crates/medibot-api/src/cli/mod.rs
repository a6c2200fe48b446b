//! CLI command definitions for the `medibot` binary.
//!
//! Uses clap derive macros for argument parsing. `serve` runs the web app;
//! the other commands inspect and administer the local database.

pub mod session;
pub mod status;
pub mod user;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Medical question-answering chatbot with Google sign-in.
#[derive(Parser)]
#[command(name = "medibot", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server.
    Serve {
        /// Port to listen on (default: server.port from config.toml, 5000).
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (default: server.host from config.toml, 127.0.0.1).
        #[arg(long)]
        host: Option<String>,
    },

    /// Show user/session/turn counts and the active configuration.
    Status,

    /// List a user's chat sessions.
    Sessions {
        /// Email address of the user.
        email: String,
    },

    /// Delete a user with all of their sessions and turns.
    #[command(name = "delete-user")]
    DeleteUser {
        /// Email address of the user.
        email: String,

        /// Skip the confirmation prompt.
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

/// Default log directives for the chosen verbosity.
pub fn log_directives(verbose: u8, quiet: bool, serving: bool) -> &'static str {
    match verbose {
        0 if quiet => "error",
        0 if serving => "info",
        0 => "warn",
        1 => "info,medibot_api=debug,medibot_core=debug,medibot_infra=debug",
        _ => "trace",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_serve_overrides() {
        let cli = Cli::try_parse_from(["medibot", "serve", "--port", "8080", "--host", "0.0.0.0"]).unwrap();
        match cli.command {
            Commands::Serve { port, host } => {
                assert_eq!(port, Some(8080));
                assert_eq!(host.as_deref(), Some("0.0.0.0"));
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn parses_delete_user() {
        let cli = Cli::try_parse_from(["medibot", "--json", "delete-user", "a@b.c", "--force"]).unwrap();
        assert!(cli.json);
        assert!(matches!(cli.command, Commands::DeleteUser { force: true, .. }));
    }

    #[test]
    fn verbosity_directives() {
        assert_eq!(log_directives(0, true, true), "error");
        assert_eq!(log_directives(0, false, true), "info");
        assert_eq!(log_directives(0, false, false), "warn");
        assert_eq!(log_directives(3, false, false), "trace");
    }
}
