//! # Replyfetch Library
//!
//! Collects reply threads for a sample of previously downloaded tweets via the
//! Twitter/X API v2 recent-search endpoint, using OAuth 2.0 Bearer Token
//! authentication.
//!
//! ## Features
//!
//! - Plain-text credential file loading (`KEY VALUE` per line)
//! - Per-line Bernoulli sampling with a caller-supplied (seedable) RNG
//! - Unbounded `next_token` pagination with an optional page cap
//! - Rate-limit aware requests (waits for `x-rate-limit-reset`, then retries)
//! - Newline-delimited JSON output, one flattened record per reply
//! - Structured logging
//!
//! ## Output
//!
//! Standard output only ever carries reply records:
//!
//! ```text
//! {"user_info":{...},"tweet_info":{...}}
//! ```
//!
//! Progress lines and diagnostics go to standard error.

pub mod config;
pub mod error;
pub mod interrupt;
pub mod oauth;
pub mod sampler;
pub mod twitter;

// Re-export commonly used types and functions
pub use config::{load_credentials, parse_credentials, CredentialSet, TwitterCredentials};
pub use error::{Error, Result};
pub use interrupt::Interrupt;
pub use oauth::build_bearer_auth_header;
pub use sampler::{run_sampler, sample_file, RunSummary, SamplerConfig};
pub use twitter::{retrieve_reply_tweets, ApiSearchSource, SearchPage, SearchSource};
