//! shaded - shade pool operator
//!
//! runs a pool in-process against ledger custody and the digest verifier:
//! inspect the effective config, replay a scripted simulation, or drive
//! the epoch loop with optional synthetic order flow.

mod workload;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use shade_pool::{
    Clock, Collaborators, DigestVerifier, EntropyBeacon, EventLog, FixedBeacon, LedgerCustody,
    ManualClock, Pool, PoolConfig, PoolEvent, SystemClock,
};
use tokio::sync::broadcast;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use workload::Workload;

#[derive(Parser)]
#[command(name = "shaded")]
#[command(about = "shade pool operator - shielded deposits, withdrawals and batched trades")]
struct Cli {
    /// pool config (toml); built-in defaults when omitted
    #[arg(short, long, env = "SHADE_CONFIG")]
    config: Option<PathBuf>,

    /// emit logs as json lines
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the effective configuration
    Info,

    /// Replay deposits, withdrawals and one batch of private orders
    Simulate {
        /// Number of deposits
        #[arg(short, long, default_value = "8")]
        deposits: usize,

        /// Number of direct withdrawals
        #[arg(short, long, default_value = "2")]
        withdrawals: usize,

        /// Number of private orders in the batch (at most batch.max_orders)
        #[arg(short, long, default_value = "4")]
        orders: usize,

        /// Seed for notes and the batch beacon
        #[arg(short, long, default_value = "0")]
        seed: u64,
    },

    /// Drive the epoch loop on the wall clock
    Run {
        /// Number of epochs to close (0 = until ctrl-c)
        #[arg(short, long, default_value = "0")]
        epochs: u64,

        /// Synthetic orders submitted per epoch
        #[arg(short, long, default_value = "0")]
        orders: usize,

        /// Seed for synthetic notes
        #[arg(short, long, default_value = "0")]
        seed: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.json_logs);

    let config = match &cli.config {
        Some(path) => PoolConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => PoolConfig::default(),
    };

    match cli.command {
        Command::Info => show_info(&config),
        Command::Simulate {
            deposits,
            withdrawals,
            orders,
            seed,
        } => simulate(&config, deposits, withdrawals, orders, seed),
        Command::Run {
            epochs,
            orders,
            seed,
        } => run(&config, epochs, orders, seed).await,
    }
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("shaded=info,shade_pool=info"));
    let registry = tracing_subscriber::registry().with(filter);

    // stdout is reserved for command output
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).init();
    }
}

fn show_info(config: &PoolConfig) -> Result<()> {
    println!("shade pool");
    println!();
    println!("Commitment tree:");
    println!("  Depth:               {}", config.tree_depth);
    println!("  Capacity:            {}", 1u64 << config.tree_depth);
    println!("  Accepted roots:      current + {} previous", config.root_history);
    println!();
    println!("Batching:");
    println!("  Max orders/epoch:    {}", config.batch.max_orders);
    println!("  Epoch length:        {}ms", config.batch.epoch_ms);
    println!("  Max order age:       {}ms", config.batch.max_order_age_ms);
    println!();
    println!("Assets:");
    for (symbol, id) in config.assets.iter().zip(config.asset_ids()) {
        println!("  {:<20} {}", symbol, id);
    }
    println!();
    println!("Pairs:");
    for (pair, ids) in config.pairs.iter().zip(config.trading_pairs()) {
        println!("  {:<20} {}", format!("{}/{}", pair.base, pair.quote), ids.id());
    }
    println!();
    println!("Effective config:");
    print!("{}", config.to_toml_string()?);
    Ok(())
}

/// seed-only beacon value, so the same seed replays the same batch order
fn seeded_beacon(seed: u64) -> FixedBeacon {
    let mut value = [0u8; 32];
    value[..8].copy_from_slice(&seed.to_le_bytes());
    FixedBeacon(value)
}

fn simulate(
    config: &PoolConfig,
    deposits: usize,
    withdrawals: usize,
    orders: usize,
    seed: u64,
) -> Result<()> {
    let pair = *config
        .trading_pairs()
        .first()
        .context("simulation needs at least one trading pair")?;
    let keys = config.keys.verifying_keys()?;
    let custody = Arc::new(LedgerCustody::new());
    let events = Arc::new(EventLog::new());
    let clock = Arc::new(ManualClock::new(SystemClock.now()));

    let pool = Pool::from_config(
        config,
        Collaborators {
            verifier: Arc::new(DigestVerifier),
            custody: custody.clone(),
            events: events.clone(),
            clock: clock.clone(),
            beacon: Arc::new(seeded_beacon(seed)),
        },
    )?;
    let mut workload = Workload::new(keys, custody, pair, seed);

    let mut receipts = Vec::new();
    for i in 0..deposits {
        let amount = 100 * (i as u128 + 1);
        receipts.push(workload.deposit(&pool, &format!("depositor-{i}"), amount)?);
    }
    for i in 0..withdrawals {
        receipts.push(workload.withdraw(&pool, &format!("recipient-{i}"))?);
    }

    let mut submitted = Vec::new();
    for i in 0..orders {
        submitted.push(workload.submit_order(&pool, &format!("trader-{i}"))?);
    }
    tracing::info!(orders = submitted.len(), "epoch open");

    clock.advance(config.batch.epoch_ms);
    let report = pool.close_batch();
    workload.settle(&report);

    let output = serde_json::json!({
        "receipts": receipts,
        "batch": report,
        "events": events.len(),
        "unspent_notes": workload.unspent(),
        "status": pool.status(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn run(config: &PoolConfig, epochs: u64, orders: usize, seed: u64) -> Result<()> {
    let pair = *config
        .trading_pairs()
        .first()
        .context("pool needs at least one trading pair")?;
    let keys = config.keys.verifying_keys()?;
    let custody = Arc::new(LedgerCustody::new());
    let (events, mut rx) = broadcast::channel::<PoolEvent>(1024);
    let beacon = Arc::new(EntropyBeacon::new(seeded_beacon(seed).0));

    let pool = Pool::from_config(
        config,
        Collaborators {
            verifier: Arc::new(DigestVerifier),
            custody: custody.clone(),
            events: Arc::new(events),
            clock: Arc::new(SystemClock),
            beacon: beacon.clone(),
        },
    )?;
    let mut workload = Workload::new(keys, custody, pair, seed);

    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => tracing::info!(
                    kind = %event.kind,
                    leaf_index = ?event.leaf_index,
                    new_root = %event.new_root,
                    "pool event"
                ),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "event stream lagged")
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    tracing::info!(
        epoch_ms = config.batch.epoch_ms,
        max_orders = config.batch.max_orders,
        synthetic_orders = orders,
        "starting epoch loop"
    );

    // a full epoch refuses further orders
    let orders = orders.min(config.batch.max_orders);
    let poll = Duration::from_millis((config.batch.epoch_ms / 4).max(50));
    let mut ticker = tokio::time::interval(poll);
    let mut closed = 0u64;
    feed_epoch(&pool, &mut workload, &beacon, orders)?;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let Some(report) = pool.close_if_due() else {
                    continue;
                };
                tracing::info!(
                    epoch = report.epoch,
                    included = report.included(),
                    rejected = report.rejected(),
                    expired = report.expired.len(),
                    seed = %hex::encode(report.seed),
                    accumulator = %hex::encode(beacon.epoch_entropy(1)),
                    "epoch closed"
                );
                workload.settle(&report);
                closed += 1;
                if epochs != 0 && closed >= epochs {
                    break;
                }
                feed_epoch(&pool, &mut workload, &beacon, orders)?;
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted");
                break;
            }
        }
    }

    let status = pool.status();
    println!("\n=== Epoch Loop Summary ===");
    println!("Epochs closed:        {}", closed);
    println!("Leaves:               {}/{}", status.leaves, status.capacity);
    println!("Spent nullifiers:     {}", status.spent_nullifiers);
    println!("Current root:         {}", status.root);
    for (asset, reserve) in &status.reserves {
        println!("Reserve {}: {}", asset, reserve);
    }
    Ok(())
}

/// top up notes and submit this epoch's synthetic orders
fn feed_epoch(
    pool: &Pool,
    workload: &mut Workload,
    beacon: &EntropyBeacon,
    orders: usize,
) -> Result<()> {
    let mut i = 0;
    while workload.unspent() < orders {
        let receipt = workload.deposit(pool, &format!("synthetic-{i}"), 1_000)?;
        beacon.accumulate(&receipt.new_root.0);
        i += 1;
    }
    for i in 0..orders {
        workload.submit_order(pool, &format!("trader-{i}"))?;
    }
    Ok(())
}
