//! Sampling driver.
//!
//! Walks the file of previously collected tweets and, for each line, flips an
//! independent biased coin: with probability `probability` the line's reply
//! thread is retrieved, otherwise the line is skipped without a trace.
//! The random source is passed in so runs can be replayed with a seed.

use chrono::Local;
use log::{info, warn};
use rand::Rng;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::time::{Duration, Instant};

use crate::error::{Error, Result};
use crate::interrupt::Interrupt;
use crate::twitter::{retrieve_reply_tweets, RetrievalOptions, RetrievalStatus, SearchSource};

/// Fraction of input lines whose conversations are fetched.
pub const DEFAULT_SAMPLE_PROBABILITY: f64 = 0.3;

/// Parameters of a sampling run.
#[derive(Debug, Clone)]
pub struct SamplerConfig {
    /// Inclusion probability per line, in `[0, 1]`
    pub probability: f64,
    pub retrieval: RetrievalOptions,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            probability: DEFAULT_SAMPLE_PROBABILITY,
            retrieval: RetrievalOptions::default(),
        }
    }
}

/// Counters for a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub lines_read: usize,
    /// Lines handed to the retriever
    pub lines_sampled: usize,
    /// Sampled lines that were not usable records
    pub invalid_lines: usize,
    pub interrupted_lines: usize,
    pub malformed_responses: usize,
    pub replies_emitted: usize,
}

/// One Bernoulli trial: a uniform draw in `[0, 1)` strictly below `probability`.
pub fn should_sample<R: Rng + ?Sized>(rng: &mut R, probability: f64) -> bool {
    rng.gen::<f64>() < probability
}

/// Runs the sampler over already-opened input.
///
/// After each sampled line the 1-based count of sampled lines is printed to
/// standard error. Sampled lines that are not valid records (including lines
/// that are not UTF-8) are skipped with a warning; they still count as sampled.
/// Unsampled lines are skipped without being decoded.
///
/// # Errors
///
/// - [`Error::Interrupted`] if Ctrl-C arrived while no retrieval was running
/// - read errors on `input` and any error the retriever does not suppress
pub async fn run_sampler<I, S, R, W>(
    mut input: I,
    source: &mut S,
    rng: &mut R,
    out: &mut W,
    interrupt: &mut Interrupt,
    config: &SamplerConfig,
) -> Result<RunSummary>
where
    I: BufRead,
    S: SearchSource + ?Sized,
    R: Rng + ?Sized,
    W: Write,
{
    let mut summary = RunSummary::default();

    let mut buf = Vec::new();
    let mut line_number: usize = 0;

    loop {
        if interrupt.take_pending() {
            warn!("Interrupted between lines, stopping at line {}", line_number + 1);
            return Err(Error::Interrupted);
        }

        buf.clear();
        if input.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        line_number += 1;
        summary.lines_read += 1;

        // Unsampled lines are never decoded
        if !should_sample(rng, config.probability) {
            continue;
        }

        let result = match std::str::from_utf8(trim_line_ending(&buf)) {
            Ok(line) => {
                retrieve_reply_tweets(source, line, out, interrupt, &config.retrieval).await
            }
            Err(e) => Err(Error::InvalidRecord(format!("not valid UTF-8: {}", e))),
        };

        match result {
            Ok(outcome) => {
                summary.replies_emitted += outcome.emitted;
                match outcome.status {
                    RetrievalStatus::Completed => {}
                    RetrievalStatus::Interrupted => summary.interrupted_lines += 1,
                    RetrievalStatus::MalformedResponse => summary.malformed_responses += 1,
                }
            }
            Err(Error::InvalidRecord(reason)) => {
                warn!("Skipping input line {}: {}", line_number, reason);
                eprintln!("Skipping input line {}: {}", line_number, reason);
                summary.invalid_lines += 1;
            }
            Err(e) => return Err(e),
        }

        summary.lines_sampled += 1;
        eprintln!("{}", summary.lines_sampled);
    }

    Ok(summary)
}

/// Strips a trailing `\n` or `\r\n`.
fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Opens `path` and runs the sampler over it, bracketed by the start
/// timestamp and total run time on standard error.
pub async fn sample_file<S, R, W>(
    path: &Path,
    source: &mut S,
    rng: &mut R,
    out: &mut W,
    interrupt: &mut Interrupt,
    config: &SamplerConfig,
) -> Result<RunSummary>
where
    S: SearchSource + ?Sized,
    R: Rng + ?Sized,
    W: Write,
{
    let started = Instant::now();
    eprintln!(
        "Started running at {}",
        Local::now().format("%Y-%m-%d %H:%M:%S%.6f")
    );

    info!("Reading initial tweets from {}", path.display());
    let input = BufReader::new(File::open(path)?);
    let summary = run_sampler(input, source, rng, out, interrupt, config).await?;
    out.flush()?;

    eprintln!("total run time {}", format_elapsed(started.elapsed()));
    info!(
        "Sampled {} of {} lines, emitted {} replies",
        summary.lines_sampled, summary.lines_read, summary.replies_emitted
    );
    Ok(summary)
}

/// Renders a duration as `H:MM:SS[.ffffff]`, prefixed with `N day(s), ` past 24h.
pub fn format_elapsed(elapsed: Duration) -> String {
    let total_secs = elapsed.as_secs();
    let days = total_secs / 86_400;
    let hours = (total_secs % 86_400) / 3_600;
    let minutes = (total_secs % 3_600) / 60;
    let seconds = total_secs % 60;
    let micros = elapsed.subsec_micros();

    let mut rendered = match days {
        0 => String::new(),
        1 => "1 day, ".to_string(),
        n => format!("{} days, ", n),
    };
    rendered.push_str(&format!("{}:{:02}:{:02}", hours, minutes, seconds));
    if micros != 0 {
        rendered.push_str(&format!(".{:06}", micros));
    }
    rendered
}
