//! Peril Client - one player in the game.
//!
//! This binary:
//! 1. Prompts for a username and starts the game state actor
//! 2. Subscribes to pause notifications, army moves and war recognitions
//! 3. Runs the command loop, publishing moves and spam logs
//!
//! Every subscription runs on its own task and stops when the player quits
//! or the process receives SIGINT/SIGTERM.

use anyhow::{bail, Context, Result};
use tokio::io::{stdin, AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use peril::gamelogic::{client_help, parse_words, print_prompt};
use peril::handlers::{handler_move, handler_pause, handler_war, publish_spam};
use peril::pubsub::{self, declare_topology, subscribe_json};
use peril::routing::{
    user_key, wildcard_key, ARMY_MOVES_PREFIX, EXCHANGE_PERIL_DIRECT,
    EXCHANGE_PERIL_TOPIC, PAUSE_KEY, WAR_RECOGNITIONS_PREFIX,
};
use peril::{shutdown_signal, Config, GameHandle, GamePublisher, GameState, QueueType, Subscription};

#[tokio::main]
async fn main() -> Result<()> {
    // Structured JSON logs on stderr; stdout belongs to the game.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true).with_writer(std::io::stderr))
        .init();

    println!("Starting Peril client...");

    let config = Config::from_env();
    info!(prefetch_count = config.prefetch_count, "config_loaded");

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

    let mut lines = BufReader::new(stdin()).lines();
    let username = client_welcome(&mut lines).await?;

    let game = GameHandle::spawn(GameState::new(username.clone()));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let pause_queue = user_key(PAUSE_KEY, &username);
    let moves_queue = user_key(ARMY_MOVES_PREFIX, &username);
    let moves_key = wildcard_key(ARMY_MOVES_PREFIX);
    let war_key = wildcard_key(WAR_RECOGNITIONS_PREFIX);

    let listeners = vec![
        subscribe_json(
            &conn,
            Subscription {
                exchange: EXCHANGE_PERIL_DIRECT,
                queue_name: &pause_queue,
                key: PAUSE_KEY,
                queue_type: QueueType::Transient,
                prefetch_count: config.prefetch_count,
            },
            shutdown_rx.clone(),
            handler_pause(game.clone()),
        )
        .await
        .context("Failed to subscribe to pause notifications")?,
        subscribe_json(
            &conn,
            Subscription {
                exchange: EXCHANGE_PERIL_TOPIC,
                queue_name: &moves_queue,
                key: &moves_key,
                queue_type: QueueType::Transient,
                prefetch_count: config.prefetch_count,
            },
            shutdown_rx.clone(),
            handler_move(game.clone(), channel.clone()),
        )
        .await
        .context("Failed to subscribe to army moves")?,
        subscribe_json(
            &conn,
            Subscription {
                exchange: EXCHANGE_PERIL_TOPIC,
                queue_name: WAR_RECOGNITIONS_PREFIX,
                key: &war_key,
                queue_type: QueueType::Durable,
                prefetch_count: config.prefetch_count,
            },
            shutdown_rx,
            handler_war(game.clone(), channel.clone()),
        )
        .await
        .context("Failed to subscribe to war recognitions")?,
    ];

    info!(username = %username, "client_ready");

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        print_prompt();

        let line = tokio::select! {
            _ = &mut shutdown => break,
            line = lines.next_line() => line.context("Failed to read input")?,
        };

        // EOF on stdin
        let Some(line) = line else { break };

        let words = parse_words(&line);
        let Some(command) = words.first().cloned() else { continue };

        match command.as_str() {
            "spawn" => match game.spawn_unit(words).await? {
                Ok(unit) => println!("Spawned a(n) {} in {} with id {}", unit.rank, unit.location, unit.id),
                Err(e) => println!("error: {e}"),
            },
            "move" => match game.move_units(words).await? {
                Ok(mv) => match channel.publish_move(&username, &mv).await {
                    Ok(()) => println!("Moved {} unit(s) to {}", mv.units.len(), mv.to_location),
                    Err(e) => println!("error publishing move: {e}"),
                },
                Err(e) => println!("error: {e}"),
            },
            "status" => print!("{}", game.status().await?),
            "help" => println!("{}", client_help()),
            "spam" => {
                let count = match words.get(1).map(|n| n.parse::<usize>()) {
                    Some(Ok(count)) => count,
                    _ => {
                        println!("usage: spam <n>");
                        continue;
                    }
                };
                let (sent, result) = publish_spam(&channel, &username, count).await;
                if let Err(e) = result {
                    println!("error publishing spam: {e}");
                }
                println!("Published {sent} malicious log(s)");
            }
            "quit" => {
                println!("goodbye");
                break;
            }
            other => println!("unknown command: {other}"),
        }
    }

    println!("Shutting down Peril client...");
    let _ = shutdown_tx.send(true);
    for listener in listeners {
        if let Err(e) = listener.await {
            warn!(error = %e, "listener_join_failed");
        }
    }

    if let Err(e) = conn.close(200, "Normal shutdown").await {
        warn!(error = %e, "rabbitmq_connection_close_error");
    }

    info!("client_shutdown_complete");
    Ok(())
}

/// Print the welcome banner and read a non-empty username.
async fn client_welcome(lines: &mut Lines<BufReader<Stdin>>) -> Result<String> {
    println!("Welcome to the Peril client!");
    println!("Please enter your username:");

    loop {
        print_prompt();
        let Some(line) = lines.next_line().await.context("Failed to read username")? else {
            bail!("stdin closed before a username was entered");
        };

        if let Some(name) = parse_words(&line).into_iter().next() {
            println!("Welcome, {name}!");
            println!("{}", client_help());
            return Ok(name);
        }
        println!("You must enter a username.");
    }
}
