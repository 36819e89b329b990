//! Peril Server - game coordinator.
//!
//! This binary:
//! 1. Declares the Peril exchanges and the dead-letter queue
//! 2. Consumes game logs from the durable game_logs queue into a log file
//! 3. Runs the command loop, broadcasting pause/resume to every client

use anyhow::{Context, Result};
use tokio::io::{stdin, AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use peril::gamelogic::{parse_words, print_prompt, server_help};
use peril::handlers::handler_game_log;
use peril::pubsub::{self, declare_topology, publish_json, subscribe_bincode};
use peril::routing::{
    wildcard_key, PlayingState, EXCHANGE_PERIL_DIRECT, EXCHANGE_PERIL_TOPIC, GAME_LOG_SLUG,
    PAUSE_KEY,
};
use peril::{shutdown_signal, Config, QueueType, Subscription};

#[tokio::main]
async fn main() -> Result<()> {
    // Structured JSON logs on stderr; stdout belongs to the command loop.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true).with_writer(std::io::stderr))
        .init();

    println!("Starting Peril server...");

    let config = Config::from_env();
    info!(
        prefetch_count = config.prefetch_count,
        game_log_path = %config.game_log_path.display(),
        "config_loaded"
    );

    let conn = pubsub::connect(&config.amqp_url)
        .await
        .context("Failed to connect to RabbitMQ")?;
    println!("Connected to AMQP server");

    let channel = conn
        .create_channel()
        .await
        .context("Failed to create publish channel")?;
    declare_topology(&channel)
        .await
        .context("Failed to declare exchanges")?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let game_log_key = wildcard_key(GAME_LOG_SLUG);
    let listener = subscribe_bincode(
        &conn,
        Subscription {
            exchange: EXCHANGE_PERIL_TOPIC,
            queue_name: GAME_LOG_SLUG,
            key: &game_log_key,
            queue_type: QueueType::Durable,
            prefetch_count: config.prefetch_count,
        },
        shutdown_rx,
        handler_game_log(config.game_log_path.clone()),
    )
    .await
    .context("Failed to subscribe to game logs")?;

    println!("{}", server_help());
    info!("server_ready");

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    let mut lines = BufReader::new(stdin()).lines();

    loop {
        print_prompt();

        let line = tokio::select! {
            _ = &mut shutdown => break,
            line = lines.next_line() => line.context("Failed to read input")?,
        };

        let Some(line) = line else { break };

        let words = parse_words(&line);
        let Some(command) = words.first() else { continue };

        let is_paused = match command.as_str() {
            "pause" => {
                println!("Sending pause message");
                true
            }
            "resume" => {
                println!("Sending resume message");
                false
            }
            "help" => {
                println!("{}", server_help());
                continue;
            }
            "quit" => {
                println!("Exiting");
                break;
            }
            other => {
                println!("unknown command: {other}");
                continue;
            }
        };

        if let Err(e) = publish_json(
            &channel,
            EXCHANGE_PERIL_DIRECT,
            PAUSE_KEY,
            &PlayingState { is_paused },
        )
        .await
        {
            println!("error publishing pause state: {e}");
        }
    }

    println!("Shutting down Peril server...");
    let _ = shutdown_tx.send(true);
    if let Err(e) = listener.await {
        warn!(error = %e, "listener_join_failed");
    }

    if let Err(e) = conn.close(200, "Normal shutdown").await {
        warn!(error = %e, "rabbitmq_connection_close_error");
    }

    info!("server_shutdown_complete");
    Ok(())
}
