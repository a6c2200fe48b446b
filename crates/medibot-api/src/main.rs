//! Medibot CLI and web server entry point.
//!
//! Binary name: `medibot`
//!
//! Parses CLI arguments, loads configuration, initializes tracing, database
//! and services, then dispatches to a command handler or starts the server.

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;

use medibot_infra::config::{load_app_config, resolve_data_dir};
use medibot_observe::tracing_setup::{init_tracing, shutdown_tracing};

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Shell completions don't need config or app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "medibot", &mut std::io::stdout());
        return Ok(());
    }

    let data_dir = resolve_data_dir();
    tokio::fs::create_dir_all(&data_dir).await?;
    let mut config = load_app_config(&data_dir).await;

    let serving = matches!(cli.command, Commands::Serve { .. });
    init_tracing(
        cli::log_directives(cli.verbose, cli.quiet, serving),
        config.logging.format,
        config.logging.otel,
    )
    .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    if let Commands::Serve { port, host } = &cli.command {
        if let Some(port) = port {
            config.server.port = *port;
        }
        if let Some(host) = host {
            config.server.host = host.clone();
        }
    }

    let state = AppState::from_config(config, data_dir).await?;

    let result = run(cli, state).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli, state: AppState) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve { .. } => serve(state, cli.quiet).await?,

        Commands::Status => {
            cli::status::status(&state, cli.json).await?;
        }

        Commands::Sessions { email } => {
            cli::session::list_sessions(&state, &email, cli.json).await?;
        }

        Commands::DeleteUser { email, force } => {
            cli::user::delete_user(&state, &email, force, cli.json).await?;
        }

        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}

async fn serve(state: AppState, quiet: bool) -> anyhow::Result<()> {
    let addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    // Load the embedding model in the background so the first question doesn't pay for it.
    let embedder = state.embedder.clone();
    tokio::spawn(async move {
        if let Err(e) = embedder.load().await {
            tracing::warn!(error = %e, "Embedding model warm-up failed; retrying on first question");
        }
    });

    if !quiet {
        println!(
            "  {} Medibot listening on {}",
            console::style("⚕").bold(),
            console::style(format!("http://{addr}")).cyan()
        );
        println!("  {}", console::style("Press Ctrl+C to stop").dim());
    }
    tracing::info!(%addr, public_url = %state.config.server.public_url, "Server started");

    let router = http::router::build_router(state);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if !quiet {
        println!("\n  Server stopped.");
    }
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
