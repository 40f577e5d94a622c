mod broker;
mod config;
mod listener;
mod output;
mod persistence;
mod session;
mod store;
mod synthetic;
mod verify;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tokio::io::BufReader;
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chatrelay_core::broker::Broker;
use chatrelay_core::chat::{ParticipantId, SYNTHETIC_SENDER};
use chatrelay_core::store::KeyValueStore;

use crate::broker::{MemoryBroker, RedisBroker};
use crate::config::Config;
use crate::listener::ListenerExit;
use crate::output::{Output, Stdout};
use crate::persistence::PersistenceDemo;
use crate::session::{run_chat, Session};
use crate::store::{MemcachedStore, RedisStore};
use crate::synthetic::{publisher_banner, SyntheticPublisher};
use crate::verify::{run_verify, verify_namespace, VerifyOptions};

/// Chatrelay - Redis Pub/Sub chat relay and Redis vs Memcached demo
#[derive(Parser, Debug)]
#[command(name = "chatrelay")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Redis connection URL
    #[arg(
        long,
        global = true,
        default_value = "redis://localhost:6379",
        env = "REDIS_URL"
    )]
    redis_url: String,

    /// Memcached address (host:port)
    #[arg(
        long,
        global = true,
        default_value = "localhost:11211",
        env = "MEMCACHED_ADDR"
    )]
    memcached_addr: String,

    /// Prefix applied to every channel name
    #[arg(long, global = true, default_value = "", env = "CHATRELAY_NAMESPACE")]
    namespace: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Join the chat interactively (default)
    Chat,
    /// Publish synthetic test traffic until interrupted
    Publisher {
        /// Sender id stamped on every message
        #[arg(long, default_value = SYNTHETIC_SENDER)]
        sender: String,

        /// Stop after this many messages
        #[arg(long)]
        count: Option<u64>,
    },
    /// Run a listener and the synthetic publisher together and check the result
    Verify {
        /// Number of synthetic messages to publish
        #[arg(long, default_value_t = 9)]
        cycles: u64,

        /// Broker to verify against
        #[arg(long, value_enum, default_value_t = BrokerKind::Redis)]
        broker: BrokerKind,
    },
    /// Compare what Redis and Memcached keep across a restart
    Persistence {
        /// Only read the demo key, skip writing and the restart prompt
        #[arg(long)]
        check_only: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum BrokerKind {
    Redis,
    Memory,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so they never interleave with chat output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chatrelay=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let runtime = tokio::runtime::Runtime::new()?;
    let result = runtime.block_on(run(cli, Config::from_env()));

    // A pending stdin read holds a blocking thread until the next line.
    runtime.shutdown_timeout(Duration::from_millis(100));
    result
}

async fn run(cli: Cli, config: Config) -> Result<()> {
    match &cli.command {
        None | Some(Commands::Chat) => chat(&cli, &config).await,
        Some(Commands::Publisher { sender, count }) => {
            publisher(&cli, &config, sender, *count).await
        }
        Some(Commands::Verify { cycles, broker }) => {
            verify(&cli, &config, *cycles, *broker).await
        }
        Some(Commands::Persistence { check_only }) => persistence(&cli, *check_only).await,
    }
}

async fn chat(cli: &Cli, config: &Config) -> Result<()> {
    Stdout.line("🚀 REDIS vs MEMCACHED + PUB/SUB DEMO");
    Stdout.line(&"=".repeat(60));

    let broker = connect_redis(&cli.redis_url, &cli.namespace).await?;
    let memcached = connect_memcached(&cli.memcached_addr).await?;
    Stdout.line("");

    let stores: Vec<Arc<dyn KeyValueStore>> = vec![
        Arc::new(RedisStore::new(broker.connection())),
        Arc::new(memcached),
    ];
    let participant = ParticipantId::from_process();

    let seeded = PersistenceDemo::new(stores.clone(), participant.clone(), Stdout)
        .seed()
        .await;
    if let Err(err) = seeded {
        tracing::warn!(error = %err, "Persistence test failed");
        Stdout.line(&format!("❌ Persistence test failed: {}", err));
    }

    let session = Session::new(Arc::new(broker), participant, Stdout).with_stores(stores);

    let input = BufReader::new(tokio::io::stdin());
    let report = run_chat(
        session,
        &cli.namespace,
        input,
        ctrl_c(),
        config.shutdown_grace(),
    )
    .await?;

    if let Some(report) = report {
        if let ListenerExit::Failed(err) = &report.exit {
            tracing::warn!(error = %err, "Listener ended with an error");
        }
        tracing::debug!(
            rendered = report.rendered,
            malformed = report.malformed,
            "Chat session finished"
        );
    }
    Ok(())
}

async fn publisher(cli: &Cli, config: &Config, sender: &str, count: Option<u64>) -> Result<()> {
    let broker = connect_redis(&cli.redis_url, &cli.namespace).await?;
    Stdout.line(&publisher_banner(config.synthetic_interval()));

    let mut publisher =
        SyntheticPublisher::new(Arc::new(broker), sender, config.synthetic_interval(), Stdout);
    if let Some(count) = count {
        publisher = publisher.with_limit(count);
    }

    let (stop_tx, stop_rx) = broadcast::channel(1);
    tokio::spawn(async move {
        ctrl_c().await;
        let _ = stop_tx.send(());
    });

    let published = publisher.run(stop_rx).await;
    tracing::info!(published, "Publisher finished");
    Stdout.line("\n👋 Publisher stopped.");
    Ok(())
}

async fn verify(cli: &Cli, config: &Config, cycles: u64, kind: BrokerKind) -> Result<()> {
    let namespace = verify_namespace(&cli.namespace, std::process::id());
    let broker: Arc<dyn Broker> = match kind {
        BrokerKind::Redis => Arc::new(connect_redis(&cli.redis_url, &namespace).await?),
        BrokerKind::Memory => Arc::new(MemoryBroker::with_namespace(namespace.as_str())),
    };

    let options = VerifyOptions {
        namespace,
        cycles,
        interval: config.synthetic_interval(),
        timeout: config.verify_timeout(),
    };
    let outcome = run_verify(broker, &options, Stdout).await?;
    tracing::debug!(
        rendered = outcome.report.rendered,
        exit = ?outcome.report.exit,
        "Verify finished"
    );

    if !outcome.passed() {
        bail!("verification failed: {}", outcome.tally.summary());
    }
    Ok(())
}

async fn persistence(cli: &Cli, check_only: bool) -> Result<()> {
    let redis = match RedisStore::connect(&cli.redis_url).await {
        Ok(store) => store,
        Err(err) => {
            Stdout.line(&format!("❌ Redis connection failed: {}", err));
            Stdout.line("💡 Make sure Redis is running: sudo service redis-server start");
            return Err(err.into());
        }
    };
    let memcached = connect_memcached(&cli.memcached_addr).await?;

    let stores: Vec<Arc<dyn KeyValueStore>> = vec![Arc::new(redis), Arc::new(memcached)];
    let demo = PersistenceDemo::new(stores, ParticipantId::from_process(), Stdout);

    let checks = demo
        .run(BufReader::new(tokio::io::stdin()), check_only)
        .await?;
    for check in &checks {
        tracing::debug!(
            backend = %check.backend,
            found = ?check.found,
            outcome = check.outcome.as_str(),
            "Persistence check"
        );
    }
    Ok(())
}

async fn connect_redis(url: &str, namespace: &str) -> Result<RedisBroker> {
    match RedisBroker::connect(url, namespace).await {
        Ok(broker) => {
            Stdout.line("✅ Redis connection successful");
            Ok(broker)
        }
        Err(err) => {
            Stdout.line(&format!("❌ Redis connection failed: {}", err));
            Stdout.line("💡 Make sure Redis is running: sudo service redis-server start");
            Err(err.into())
        }
    }
}

async fn connect_memcached(addr: &str) -> Result<MemcachedStore> {
    match MemcachedStore::connect(addr).await {
        Ok(store) => {
            Stdout.line("✅ Memcached connection successful");
            Ok(store)
        }
        Err(err) => {
            Stdout.line(&format!("❌ Memcached connection failed: {}", err));
            Stdout.line("💡 Make sure Memcached is running: sudo service memcached start");
            Err(err.into())
        }
    }
}

/// Completes on Ctrl+C. Never completes if the handler cannot be installed.
async fn ctrl_c() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
}
