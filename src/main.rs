use anyhow::Result;
use clap::Parser;
use rand::Rng;
use rent_scout::config::{Config, LineCredentials};
use rent_scout::notify::{Dispatcher, LineNotifier, Notifier};
use rent_scout::pipeline::{run_once, RunOutcome};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Rent Scout - new rental listings from 591, pushed to LINE")]
struct Args {
    /// Path to a TOML config file (defaults are used when omitted)
    #[clap(short, long, env = "RENT_SCOUT_CONFIG")]
    config: Option<PathBuf>,

    /// Path to the delivered-ids ledger
    #[clap(short, long, env = "RENT_SCOUT_LEDGER")]
    ledger: Option<PathBuf>,

    /// Log messages instead of sending them
    #[clap(long, env = "RENT_SCOUT_DRY_RUN")]
    dry_run: bool,

    /// Keep running, one crawl every `interval_hours`
    #[clap(short, long)]
    watch: bool,

    /// Hours between crawls in watch mode
    #[clap(long)]
    interval_hours: Option<u64>,

    /// Skip the random pause before each watched run
    #[clap(long)]
    no_random_delay: bool,

    /// Default log level when RUST_LOG is not set
    #[clap(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("🏠 Rent Scout - 591 listing watcher");

    let mut config = Config::load(args.config.as_deref())?;
    apply_overrides(&mut config, &args);

    let notifier = LineNotifier::from_credentials(&LineCredentials::from_env())
        .map(|n| Box::new(n) as Box<dyn Notifier>);
    let dispatcher = Dispatcher::new(notifier, config.runtime.dry_run, config.runtime.max_chunk_chars);

    if !args.watch {
        report(run_once(&config, &dispatcher).await?);
        return Ok(());
    }

    let interval = config.runtime.interval();
    info!("Watching every {} hours", config.runtime.interval_hours);
    loop {
        if config.runtime.random_delay {
            let jitter = rand::thread_rng().gen_range(0..=config.runtime.max_jitter_secs);
            info!("Waiting {} seconds before crawling...", jitter);
            tokio::time::sleep(Duration::from_secs(jitter)).await;
        }

        match run_once(&config, &dispatcher).await {
            Ok(outcome) => report(outcome),
            Err(e) => error!("Run failed: {:#}", e),
        }

        info!("Next run in {} hours", config.runtime.interval_hours);
        tokio::time::sleep(interval).await;
    }
}

fn apply_overrides(config: &mut Config, args: &Args) {
    if let Some(ledger) = &args.ledger {
        config.runtime.ledger_path = ledger.clone();
    }
    if args.dry_run {
        config.runtime.dry_run = true;
    }
    if let Some(hours) = args.interval_hours.filter(|h| *h > 0) {
        config.runtime.interval_hours = hours;
    }
    if args.no_random_delay {
        config.runtime.random_delay = false;
    }
}

fn report(outcome: RunOutcome) {
    match outcome {
        RunOutcome::Delivered { new, chunks, dry_run } => {
            let mode = if dry_run { "logged" } else { "sent" };
            info!("✅ Run finished: {} new listings, {} message(s) {}", new, chunks, mode);
        }
        RunOutcome::DeliveryFailed { new } => {
            warn!("Run finished but {} new listings could not be delivered", new);
        }
        RunOutcome::Unavailable => {
            warn!("Run finished without checking any listings");
        }
    }
}
