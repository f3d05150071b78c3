//! Interactive door-lock simulator.
//!
//! Reads keypad keys and operator commands from stdin, feeds them to a
//! running lock service and redraws the 16x4 LCD after every line. Logs go to
//! stderr so the display on stdout stays readable.

mod commands;
mod render;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use doorlock_core::constants::TICK_PERIOD_MS;
use doorlock_core::{LockConfig, Password};
use doorlock_runtime::{LockService, ServiceConfig, ServiceHandle};

use crate::commands::{HELP, Operator, parse_line};
use crate::render::{render_display, render_logs};

#[derive(Parser, Debug)]
#[command(name = "doorlock")]
#[command(about = "Smart door-lock controller simulator", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the admin password (six digits)
    #[arg(long)]
    admin_password: Option<String>,

    /// Override the credential store capacity
    #[arg(long)]
    max_users: Option<usize>,

    /// Override the unlock hold time in seconds
    #[arg(long)]
    unlock_hold: Option<u32>,

    /// Override the lockout time in seconds
    #[arg(long)]
    lock_time: Option<u32>,

    /// Override the fingerprint settle delay in seconds
    #[arg(long)]
    settle: Option<u32>,

    /// Pre-load the test users at startup
    #[arg(long)]
    seed: bool,

    /// Clock period in milliseconds
    #[arg(long, default_value_t = TICK_PERIOD_MS)]
    tick_ms: u64,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = load_config(&cli)?;
    info!(
        "Starting doorlock v{} (max users {}, lockout {}s)",
        env!("CARGO_PKG_VERSION"),
        config.max_users,
        config.lock_time_secs
    );

    let service = ServiceConfig::default().tick_period(Duration::from_millis(cli.tick_ms));
    let handle = LockService::spawn(config, service).context("failed to start lock service")?;

    if cli.seed {
        handle.seed().await?;
    }

    println!("{HELP}\n");
    redraw(&handle).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("failed to read stdin")?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            break;
        };

        match parse_line(&line) {
            Ok(Operator::Quit) => break,
            Ok(operator) => run(&handle, operator).await?,
            Err(err) => eprintln!("error: {err:#}"),
        }
    }

    handle.shutdown().await?;
    Ok(())
}

async fn run(handle: &ServiceHandle, operator: Operator) -> Result<()> {
    match operator {
        Operator::Keys(keys) => {
            for key in keys {
                let dispatch = handle.press(key).await?;
                debug!("{} -> {:?}", key, dispatch);
            }
            redraw(handle).await?;
        }
        Operator::Seed => {
            let stored = handle.seed().await?;
            println!("seeded {stored} users");
            redraw(handle).await?;
        }
        Operator::Reset => {
            handle.reset().await?;
            redraw(handle).await?;
        }
        Operator::Fingerprint(reading) => {
            handle.inject_fingerprint(reading).await?;
            println!(
                "next capture: {} (id {})",
                reading.outcome, reading.template_id
            );
        }
        Operator::Logs(count) => {
            let snapshot = handle.snapshot().await?;
            println!("{}", render_logs(&snapshot.logs, count));
        }
        Operator::Wait(secs) => {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            redraw(handle).await?;
        }
        Operator::Show => redraw(handle).await?,
        Operator::Json => {
            let snapshot = handle.snapshot().await?;
            let json = serde_json::to_string_pretty(&snapshot).context("failed to encode snapshot")?;
            println!("{json}");
        }
        Operator::Help => println!("{HELP}"),
        Operator::Quit => {}
    }
    Ok(())
}

async fn redraw(handle: &ServiceHandle) -> Result<()> {
    let snapshot = handle.snapshot().await?;
    println!("{}", render_display(&snapshot));
    Ok(())
}

/// Build the lock configuration from the optional file and flag overrides.
fn load_config(cli: &Cli) -> Result<LockConfig> {
    let mut config = match &cli.config {
        Some(path) => read_config(path)?,
        None => LockConfig::default(),
    };

    if let Some(password) = &cli.admin_password {
        let password = Password::new(password).context("invalid --admin-password")?;
        config = config.admin_password(password);
    }
    if let Some(max) = cli.max_users {
        config = config.max_users(max);
    }
    if let Some(secs) = cli.unlock_hold {
        config = config.unlock_hold_secs(secs);
    }
    if let Some(secs) = cli.lock_time {
        config = config.lock_time_secs(secs);
    }
    if let Some(secs) = cli.settle {
        config = config.fingerprint_settle_secs(secs);
    }

    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn read_config(path: &Path) -> Result<LockConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("failed to parse config file {}", path.display()))
}
