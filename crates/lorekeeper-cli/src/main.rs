//! lorekeeper - interactive lorebook shell.

mod commands;

use anyhow::Context;
use lorekeeper_core::{LoreConfig, LoreRuntime};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::signal;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{Command, Flow, Identity};

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
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

fn load_config() -> anyhow::Result<LoreConfig> {
    match std::env::var("LORE_CONFIG") {
        Ok(path) => {
            let base = LoreConfig::from_file(&path)
                .with_context(|| format!("loading config from {}", path))?;
            Ok(base.merge_env(|key| std::env::var(key).ok()))
        }
        Err(_) => Ok(LoreConfig::from_env()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so replies stay readable on stdout
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::from_default_env()
                .add_directive(Level::INFO.into())
                .add_directive("lorekeeper=debug".parse()?)
                .add_directive("lorekeeper_core=debug".parse()?),
        )
        .init();

    let config = load_config()?;
    let runtime = LoreRuntime::new(config).await?;
    runtime.start().await?;
    info!(entries = runtime.lorebook().len(), "lorekeeper ready, /help for commands");

    let mut identity = Identity::from_env();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = &mut shutdown => {
                info!("Shutdown signal received");
                break;
            }
        };
        let Some(line) = line else { break };
        if line.trim().is_empty() {
            continue;
        }

        let reply = match Command::parse(&line) {
            Ok(command) => match commands::execute(&runtime, &mut identity, command).await {
                Flow::Continue(reply) => reply,
                Flow::Quit => break,
            },
            Err(usage) => usage,
        };
        if !reply.is_empty() {
            stdout.write_all(reply.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await?;
        }
    }

    runtime.shutdown().await?;
    info!("lorekeeper stopped cleanly");
    Ok(())
}
