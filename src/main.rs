use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};

use daylog::config::LoggingConfig;
use daylog::logging::Logger;

#[tokio::main]
async fn main() -> Result<()> {
    // Diagnostics about the logger itself go to stderr, never the log files
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "daylog=info".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => LoggingConfig::load_from(&PathBuf::from(path))?,
        None => LoggingConfig::load()?,
    };
    config.validate()?;

    let logger = Arc::new(Logger::from_config(&config));
    let log = logger.scoped("GEN");

    log.info(format!("Logging to: {}", config.log_directory.display()));

    // Every line read from stdin becomes a log record
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => log.info(line),
                Ok(None) => break,
                Err(e) => {
                    log.error(format!("Failed to read stdin: {}", e));
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                log.warning("Interrupted, shutting down");
                break;
            }
        }
    }

    // Joining the file worker blocks, keep it off the runtime threads
    let shutdown = Arc::clone(&logger);
    tokio::task::spawn_blocking(move || shutdown.shutdown()).await?;

    Ok(())
}
