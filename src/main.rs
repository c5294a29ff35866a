//! coralkv server binary.
//!
//! Parses the command line, builds the shared state and serves clients until
//! Ctrl+C.

use anyhow::Context;
use coralkv::commands::CommandHandler;
use coralkv::config::{help_text, Action, Config};
use coralkv::connection::{handle_connection, ConnectionStats};
use coralkv::pubsub::PubSubRegistry;
use coralkv::replication::ReplicationInfo;
use coralkv::storage::StorageEngine;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn print_banner(config: &Config, replication: &ReplicationInfo) {
    println!(
        r#"
   ___              _ _  __
  / __|___ _ _ __ _| | |/ /_ __
 | (__/ _ \ '_/ _` | | ' <\ V /
  \___\___/_| \__,_|_|_|\_\\_/

coralkv v{} ({})
──────────────────────────────────────────────
Server started on {}
Ready to accept connections.

Use Ctrl+C to shutdown gracefully.
"#,
        coralkv::VERSION,
        replication.role(),
        config.bind_address()
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match Config::from_args(std::env::args().skip(1))? {
        Action::Serve(config) => config,
        Action::Help => {
            println!("{}", help_text());
            return Ok(());
        }
        Action::Version => {
            println!("coralkv version {}", coralkv::VERSION);
            return Ok(());
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let storage = Arc::new(StorageEngine::new());
    let pubsub = Arc::new(PubSubRegistry::with_capacity(config.pubsub_capacity));
    let replication = Arc::new(ReplicationInfo::new(config.role()));
    let handler = CommandHandler::new(storage, pubsub, Arc::clone(&replication));
    let stats = Arc::new(ConnectionStats::new());

    print_banner(&config, &replication);

    if let Some((host, port)) = &config.replicaof {
        // Only the role is tracked; no link to the master is opened.
        warn!(master = %format!("{}:{}", host, port), "Running as replica without a replication link");
    }

    let listener = TcpListener::bind(config.bind_address())
        .await
        .with_context(|| format!("failed to bind {}", config.bind_address()))?;
    info!(
        address = %config.bind_address(),
        role = %replication.role(),
        pubsub_capacity = config.pubsub_capacity,
        "Listening"
    );

    let shutdown = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received, stopping server..."),
            Err(e) => {
                error!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending::<()>().await
            }
        }
    };

    tokio::select! {
        _ = accept_loop(listener, handler, Arc::clone(&stats)) => {}
        _ = shutdown => {}
    }

    info!(
        connections = stats
            .connections_accepted
            .load(std::sync::atomic::Ordering::Relaxed),
        "Server shutdown complete"
    );
    Ok(())
}

async fn accept_loop(listener: TcpListener, handler: CommandHandler, stats: Arc<ConnectionStats>) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                tokio::spawn(handle_connection(
                    stream,
                    addr,
                    handler.clone(),
                    Arc::clone(&stats),
                ));
            }
            Err(e) => {
                error!(error = %e, "Failed to accept connection");
            }
        }
    }
}
