//! Sidekiq Dead Queue Check Binary

use clap::Parser;
use clap::error::ErrorKind;
use sidekiq_dead_check::{
    argument_error_message, CheckOutcome, Cli, Config, DeadQueueCheck, HttpStatsFetcher, SystemClock,
};
use tracing::{debug, error};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    initialize_tracing();

    let outcome = match Cli::try_parse() {
        Ok(cli) => run(cli).await,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            std::process::exit(0);
        }
        Err(e) => CheckOutcome::unknown(argument_error_message(&e)),
    };

    println!("{}", outcome);
    std::process::exit(outcome.exit_code());
}

async fn run(cli: Cli) -> CheckOutcome {
    let config = match Config::try_from(cli) {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration validation failed: {}", e);
            return CheckOutcome::unknown(e.to_string());
        }
    };

    debug!(
        "Check configuration - Url: {}, Auth: {}, Silence: {:?}, Silence weekends: {}",
        config.url,
        config.auth.is_some(),
        config.silence.map(|s| s.to_string()),
        config.silence_weekends
    );

    let fetcher = match HttpStatsFetcher::new(&config) {
        Ok(fetcher) => fetcher,
        Err(e) => {
            error!("Failed to build HTTP client: {}", e);
            return CheckOutcome::unknown(e.to_string());
        }
    };

    DeadQueueCheck::new(config, Box::new(fetcher), Box::new(SystemClock))
        .run()
        .await
}

/// Initialize structured logging on stderr, leaving stdout for the result line
fn initialize_tracing() {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .json();

    let filter_layer = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
