mod cli;
mod http;
mod state;

use std::sync::Arc;

use clap::Parser;
use supportify_observe::tracing_setup::{TracingOptions, init_tracing, shutdown_tracing};
use supportify_observe::{LineSink, LogSettings, LogSink, ScopedLogger, TracingSink};
use supportify_types::chat::HistoryFilter;

use cli::{Cli, Commands, LogSinkKind};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,supportify=debug",
        _ => "trace",
    };

    let tracing_options = TracingOptions::new(filter).json(cli.json).otel(cli.otel);
    init_tracing(&tracing_options).map_err(|e| anyhow::anyhow!(e))?;

    let settings = Arc::new(LogSettings::from_env());
    let sink: Arc<dyn LogSink> = match cli.log_sink.unwrap_or(cli.command.default_log_sink()) {
        LogSinkKind::Line => Arc::new(LineSink::stdout(settings.color())),
        LogSinkKind::Tracing => Arc::new(TracingSink),
    };
    let log = ScopedLogger::root(settings, sink);

    let memory = matches!(cli.command, Commands::Serve { memory: true, .. });
    let state = AppState::init(log, memory).await?;

    let outcome = run(cli, &state).await;

    state.shutdown().await;
    shutdown_tracing();
    outcome
}

async fn run(cli: Cli, state: &AppState) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve { host, port, .. } => {
            let host = host.unwrap_or_else(|| state.config.server.host.clone());
            let port = port.unwrap_or(state.config.server.port);
            serve(state.clone(), &host, port).await?;
        }

        Commands::Chat {
            user,
            agent,
            org,
            content,
        } => {
            let mut stdout = std::io::stdout();
            cli::chat::send_turn(state, user, agent, org, content, cli.json, &mut stdout)
                .await?;
        }

        Commands::History {
            user,
            agent,
            org,
            clear,
        } => {
            let filter = HistoryFilter {
                user_id: user,
                agent_id: agent,
                org_id: org,
            };
            if clear {
                cli::history::clear_history(state, filter, cli.json).await?;
            } else {
                cli::history::show_history(state, filter, cli.json).await?;
            }
        }
    }

    Ok(())
}

async fn serve(state: AppState, host: &str, port: u16) -> anyhow::Result<()> {
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    println!(
        "  {} Supportify API listening on {} ({} store)",
        console::style("⚡").bold(),
        console::style(format!("http://{addr}")).cyan(),
        state.store.kind(),
    );
    println!(
        "  {} {}",
        console::style("data:").dim(),
        state.data_dir.display()
    );
    println!("  {}", console::style("Press Ctrl+C to stop").dim());

    let router = http::router::build_router(state);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    println!("\n  Server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("failed to listen for Ctrl+C: {e}");
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
                tracing::warn!("failed to install SIGTERM handler: {e}");
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

    tracing::info!("shutdown signal received");
}
