use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
// external packages
use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use welcome_txc::{
    config::{conf_from_file, BotConf, DEFAULT_CONFIG},
    platform::{BridgeClient, EventSource, ImageSize},
    Bot,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("WELCOME_CONFIG").ok())
        .unwrap_or_else(|| DEFAULT_CONFIG.to_string());
    let conf: BotConf = conf_from_file(&path).context("loading config")?;
    tracing::info!("booting with {path}");

    let bridge = BridgeClient::new(&conf.platform).context("building platform client")?;
    let bot = Bot::from_conf(Arc::new(bridge.clone()), &conf).context("building classifier")?;

    let poller = bot.poller(
        Duration::from_secs(conf.poll.interval_secs),
        ImageSize {
            width: conf.avatar.width,
            height: conf.avatar.height,
        },
    );
    poller.seed().await;

    let cancel = CancellationToken::new();
    let poll_task = tokio::spawn(poller.run(cancel.clone()));

    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown signal received");
        }
        shutdown.cancel();
    });

    tracing::info!("listening for messages");

    bridge
        .events()
        .take_until(cancel.cancelled())
        .for_each(|message| {
            let bot = bot.clone();
            async move {
                bot.on_message(&message).await;
            }
        })
        .await;

    cancel.cancel();
    poll_task.await.context("poll task panicked")?;
    Ok(())
}
