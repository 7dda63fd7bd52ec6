//! webpost CLI and REST API entry point.
//!
//! Binary name: `webpost`
//!
//! Parses CLI arguments, loads configuration and wires services, then
//! dispatches to the appropriate command handler or starts the REST API
//! server.

mod cli;
mod http;
mod state;

use clap::Parser;

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = webpost_observe::tracing_setup::default_filter(cli.verbose, cli.quiet);
    if let Err(e) = webpost_observe::tracing_setup::init_tracing(cli.json, filter) {
        eprintln!("failed to initialize tracing: {e}");
    }

    let state = AppState::init(cli.scenarios_dir.clone()).await;

    match cli.command {
        Commands::Serve { port, host } => {
            let host = host.unwrap_or_else(|| state.config.server.host.clone());
            let port = port.unwrap_or(state.config.server.port);
            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            if !cli.quiet {
                println!(
                    "  {} webpost API listening on {}",
                    console::style("⚡").bold(),
                    console::style(format!("http://{addr}")).cyan()
                );
                println!("  {}", console::style("Press Ctrl+C to stop").dim());
            }
            tracing::info!(
                %addr,
                data_dir = %state.data_dir.display(),
                scenarios_dir = %state.config.scenarios_dir.display(),
                "server started"
            );

            let router = http::router::build_router(state);

            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            if !cli.quiet {
                println!("\n  Server stopped.");
            }
        }

        Commands::Run {
            scenario_id,
            vars,
            secrets,
            secret_ref,
        } => {
            let request = cli::run::build_request(vars, secrets, secret_ref);
            let ok = cli::run::run_scenario(&state, &scenario_id, request, cli.json).await?;
            if !ok {
                std::process::exit(1);
            }
        }

        Commands::Check { scenario_id } => {
            let ok = cli::check::check_scenario(&state, &scenario_id, cli.json).await?;
            if !ok {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
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
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
