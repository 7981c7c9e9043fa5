//! # Replyfetch
//!
//! Searches through tweets collected earlier to find their replies and prints
//! them as newline-delimited JSON.
//!
//! ## Usage
//!
//! ```bash
//! replyfetch --keyfile cred.txt --initial-tweets congress_df_YYYY-MM-DD_tweets.txt \
//!     > congress_df_YYYY-MM-DD_reply_tweets.txt
//! ```
//!
//! ## Credential file
//!
//! One `KEY VALUE` pair per line. Required keys: `api_key`, `api_secret`,
//! `token`, `token_secret`, `bearer_token`.

use clap::Parser;
use log::{error, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;

use replyfetch::twitter::RetrievalOptions;
use replyfetch::{
    sample_file, ApiSearchSource, Error, Interrupt, RunSummary, SamplerConfig, TwitterCredentials,
};

/// Fetch reply threads for a sample of collected tweets from the Twitter/X API.
#[derive(Debug, Parser)]
#[command(name = "replyfetch", version, about)]
struct Args {
    /// File with user credentials (e.g. cred.txt)
    #[arg(long)]
    keyfile: PathBuf,

    /// Newline-delimited JSON of previously collected tweets
    #[arg(long = "initial-tweets", alias = "initial_tweets")]
    initial_tweets: PathBuf,

    /// Seed for the sampling RNG, for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Stop paginating a conversation after this many pages
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    max_pages: Option<u64>,
}

async fn run(args: Args) -> replyfetch::Result<RunSummary> {
    // Fail on a bad key file before touching the input
    let credentials = TwitterCredentials::from_file(&args.keyfile)?;

    let mut source = ApiSearchSource::new(&credentials);
    let mut rng = match args.seed {
        Some(seed) => {
            info!("Sampling with seed {}", seed);
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_entropy(),
    };
    let mut interrupt = Interrupt::listen();
    let config = SamplerConfig {
        retrieval: RetrievalOptions {
            max_pages: args.max_pages.map(|n| n as usize),
        },
        ..SamplerConfig::default()
    };

    let mut out = BufWriter::new(io::stdout());
    sample_file(
        &args.initial_tweets,
        &mut source,
        &mut rng,
        &mut out,
        &mut interrupt,
        &config,
    )
    .await
}

/// Entry point for the reply collector.
///
/// Logging goes through `env_logger`; set `RUST_LOG=info` (or `debug`) for
/// request-level detail. The default level is `warn` so standard error stays
/// close to the progress output.
///
/// Exit codes: 0 on completion, 130 when interrupted between conversations,
/// 1 on any other error.
#[tokio::main]
async fn main() -> ExitCode {
    // Initialize the logging system
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();

    match run(args).await {
        Ok(summary) => {
            info!("Run finished: {:?}", summary);
            ExitCode::SUCCESS
        }
        Err(Error::Interrupted) => {
            eprintln!("Interrupted");
            ExitCode::from(130)
        }
        Err(e) => {
            error!("Run failed: {}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
