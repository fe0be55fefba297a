mod config;
mod connection;
mod persistence;
mod tick;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use tokio::io::AsyncBufReadExt;
use tracing::info;

use config::{Args, ServerConfig};
use connection::ConnectionHandler;
use tick::TickTimer;

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let mut config = match ServerConfig::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load {}: {e}", args.config);
            std::process::exit(1);
        }
    };
    args.apply(&mut config);
    let config = Arc::new(config);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!(
        "anvil-server v{} starting on {}:{}",
        env!("CARGO_PKG_VERSION"),
        config.server.address,
        config.server.port
    );
    info!("MOTD: {}", config.server.motd);
    info!("Max players: {}", config.server.max_players);
    info!(
        "World: {} (generator: {}, seed: {})",
        config.world.name, config.world.generator, config.world.seed
    );

    let addr: SocketAddr = match format!("{}:{}", config.server.address, config.server.port).parse()
    {
        Ok(addr) => addr,
        Err(e) => {
            eprintln!("Invalid bind address: {e}");
            std::process::exit(1);
        }
    };

    let (mut server, mut events, server_handle) = match anvil_net::NetServer::bind(addr).await {
        Ok(bound) => bound,
        Err(e) => {
            eprintln!("Failed to bind {addr}: {e}");
            std::process::exit(1);
        }
    };

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let shutdown_tx = Arc::new(shutdown_tx);

    // SIGINT. (SIGPIPE is ignored by the runtime; broken sockets surface as
    // write errors.)
    let shutdown_tx_ctrlc = shutdown_tx.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Shutdown signal received");
        let _ = shutdown_tx_ctrlc.send(true);
    });

    // SIGTERM.
    #[cfg(unix)]
    {
        let shutdown_tx_term = shutdown_tx.clone();
        tokio::spawn(async move {
            use tokio::signal::unix::{signal, SignalKind};
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                info!("SIGTERM received");
                let _ = shutdown_tx_term.send(true);
            }
        });
    }

    // Console: one line per command.
    let (console_tx, mut console_rx) = tokio::sync::mpsc::channel::<String>(32);
    tokio::spawn(async move {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        let mut lines = stdin.lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let line = line.trim().to_string();
            if !line.is_empty() && console_tx.send(line).await.is_err() {
                break;
            }
        }
    });

    let mut handler = match ConnectionHandler::new(server_handle, config, shutdown_tx.clone()) {
        Ok(handler) => handler,
        Err(e) => {
            eprintln!("Failed to initialize the server: {e}");
            std::process::exit(1);
        }
    };

    // Network runs on its own task; this task is the sole simulation
    // mutator, alternating between events and the tick clock.
    let net_shutdown = shutdown_rx.clone();
    tokio::spawn(async move { server.run(net_shutdown).await });

    let mut shutdown_rx = shutdown_rx;
    let mut timer = TickTimer::new(Instant::now());
    info!("Done. Listening for connections");

    loop {
        let deadline = tokio::time::Instant::from_std(timer.next_deadline());
        tokio::select! {
            Some(event) = events.recv() => {
                handler.handle_event(event).await;
            }
            Some(line) = console_rx.recv() => {
                let reply = handler.handle_console_command(&line).await;
                if !reply.is_empty() {
                    info!("{reply}");
                }
            }
            _ = tokio::time::sleep_until(deadline) => {
                for _ in 0..timer.due_ticks(Instant::now()) {
                    handler.game_tick().await;
                }
            }
            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    info!("Saving world before shutdown...");
                    handler.save_all();
                    break;
                }
            }
        }
    }

    info!("Server shut down.");
}
