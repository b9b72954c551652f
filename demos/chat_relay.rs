//! # Example: chat_relay
//!
//! A chat room on top of the relay: every connected client is a subscriber,
//! every line a client sends is published to the room.
//!
//! Shows how to:
//! - Implement [`Sink`] for a connection-like type backed by a channel.
//! - Attach the built-in [`LogWriter`] observer.
//! - Unregister a client when it disconnects and shut the relay down.
//!
//! ## Run
//! ```bash
//! RUST_LOG=debug cargo run --example chat_relay
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pubrelay::{LogWriter, Message, Relay, RelayConfig, Sink, SinkError};
use tokio::sync::mpsc;
use tracing_subscriber::{EnvFilter, fmt as tracing_format};

/// Outbound side of a client connection.
struct Connection {
    user: &'static str,
    outbox: mpsc::Sender<String>,
}

#[async_trait]
impl Sink for Connection {
    async fn deliver(&self, message: &Message) -> Result<(), SinkError> {
        let from = message.get("from").and_then(|v| v.as_str()).unwrap_or("?");
        if from == self.user {
            return Ok(());
        }
        let text = message.get("text").and_then(|v| v.as_str()).unwrap_or("");
        self.outbox
            .send(format!("<{from}> {text}"))
            .await
            .map_err(|_| SinkError::Closed)
    }

    fn name(&self) -> &str {
        self.user
    }
}

fn connect(user: &'static str) -> (Arc<Connection>, tokio::task::JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel::<String>(64);
    let screen = tokio::spawn(async move {
        while let Some(line) = rx.recv().await {
            println!("[{user}'s screen] {line}");
        }
    });
    (Arc::new(Connection { user, outbox: tx }), screen)
}

fn say(from: &str, text: &str) -> Message {
    Message::new().with("from", from).with("text", text)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_format()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let cfg = RelayConfig {
        delivery_timeout: Duration::from_secs(1),
        ..RelayConfig::default()
    };
    let relay = Relay::builder(cfg)
        .with_observer(Arc::new(LogWriter::new()))
        .build()?;

    relay.publish(say("system", "room opened"));

    let (alice, alice_screen) = connect("alice");
    let (bob, bob_screen) = connect("bob");
    let alice_sub = relay.register(alice);
    let _bob_sub = relay.register(bob);

    relay.publish(say("alice", "hi bob"));
    relay.publish(say("bob", "hey alice"));

    tokio::time::sleep(Duration::from_millis(100)).await;
    relay.unregister(&alice_sub);
    relay.publish(say("bob", "alice left?"));

    relay.shutdown().await?;
    drop(relay);

    alice_screen.await?;
    bob_screen.await?;
    Ok(())
}
