//! HRDesk CLI and REST API entry point.
//!
//! Binary name: `hrdesk`
//!
//! Parses CLI arguments, initializes the engine, then dispatches to the
//! appropriate command handler or starts the REST API server.

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "hrdesk", &mut std::io::stdout());
        return Ok(());
    }

    hrdesk_observe::tracing_setup::init_tracing(cli.otel)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    // Initialize application state (config, embedder, corpus, engine)
    let state = AppState::init().await?;

    match cli.command {
        Commands::Serve { host, port } => {
            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            println!(
                "  {} HRDesk API listening on {}",
                console::style("⚡").bold(),
                console::style(format!("http://{addr}")).cyan()
            );
            println!("  {}", console::style("Press Ctrl+C to stop").dim());

            let router = http::router::build_router(state);

            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            hrdesk_observe::tracing_setup::shutdown_tracing();
            println!("\n  Server stopped.");
        }

        Commands::Ask { question, session } => {
            let token = session.unwrap_or_else(|| "cli".to_string());
            let answer = state.engine.handle(&token, &question).await;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&answer)?);
            } else {
                println!();
                println!("{}", answer.text);
                println!();
                println!(
                    "  {} confidence: {}",
                    console::style("·").dim(),
                    console::style(answer.confidence.to_string()).cyan()
                );
                if !answer.sources.is_empty() {
                    println!(
                        "  {} sources: {}",
                        console::style("·").dim(),
                        answer.sources.join(", ")
                    );
                }
            }
        }

        Commands::Status => {
            state.engine.sessions().sweep_expired();
            let corpus_fragments = state.corpus.count().await.unwrap_or(0);
            let config = state.engine.config();

            if cli.json {
                let status = serde_json::json!({
                    "data_dir": state.data_dir.display().to_string(),
                    "model": config.model,
                    "base_url": config.base_url,
                    "active_sessions": state.engine.sessions().len(),
                    "corpus_fragments": corpus_fragments,
                });
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                println!();
                println!(
                    "  {} HRDesk engine status",
                    console::style("🔍").bold()
                );
                println!();
                println!("  data dir:         {}", state.data_dir.display());
                println!("  model:            {} @ {}", config.model, config.base_url);
                println!(
                    "  active sessions:  {}",
                    state.engine.sessions().len()
                );
                println!("  corpus fragments: {corpus_fragments}");
                println!();
            }
        }

        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
