//! `ekk0` — play with the creature from a terminal.
//!
//! Usage: `ekk0 [config.toml]`, then type `feed`, `play`, `sleep`, `learn`,
//! `reset`, `status` or `quit`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use ekk0_core::persistence::{JsonFileStore, SqliteSnapshotStore};
use ekk0_core::session::Session;
use ekk0_host::{Driver, HostClock, HostCommand, HostConfig, identity};
use ekk0_llm::LlmCommentator;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

const HELP: &str = "commands: feed (f), play (p), sleep (z), learn (l), reset, status, quit";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = HostConfig::load(config_path.as_deref()).context("loading configuration")?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.core.general.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let visitor = identity::load_or_create(Path::new(&config.host.identity_path))
        .context("loading visitor identity")?;
    let clock = HostClock::system();
    let rng = match config.host.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let session = Session::new(visitor, config.core.clone(), clock.now(), rng);

    let persistence = &config.core.persistence;
    let local = JsonFileStore::open(&persistence.local_dir).context("opening local snapshot dir")?;
    let commentator = Arc::new(LlmCommentator::from_config(&config.core.llm));

    let (mut driver, events) = Driver::new(session, clock, commentator);
    driver = driver.with_local(local);
    if config.host.remote_enabled {
        let remote = SqliteSnapshotStore::open(&persistence.database_path, persistence)
            .context("opening snapshot database")?;
        driver = driver.with_remote(Arc::new(remote));
    }
    let mut handle = driver.spawn(events);

    println!("ekk0 is floating in the void. {HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => match line.parse::<HostCommand>() {
                    Ok(HostCommand::Shutdown) => break,
                    Ok(command) => {
                        if !handle.send(command) {
                            break;
                        }
                    }
                    Err(e) => println!("  {e}. {HELP}"),
                },
                None => break,
            },
            Some(event) = handle.events.recv() => println!("{event}"),
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    let session = handle.shutdown().await.context("driver task failed")?;
    println!("{}", session.creature().summary());
    Ok(())
}
