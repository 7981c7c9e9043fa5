//! Configuration module for replyfetch.
//!
//! This module parses the plain-text credential file (`KEY VALUE` per line)
//! and turns it into the Twitter/X API credentials the collector needs.

use log::{debug, error, info, warn};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// Credential names that must be present in the key file.
pub const REQUIRED_KEYS: [&str; 5] = [
    "api_key",
    "api_secret",
    "token",
    "token_secret",
    "bearer_token",
];

/// Mapping from credential name to secret value.
pub type CredentialSet = HashMap<String, String>;

/// Parses credential file contents into a [`CredentialSet`].
///
/// Blank and whitespace-only lines are skipped. Every other line must split on
/// whitespace into exactly a key and a value; a repeated key keeps the last value.
///
/// # Errors
///
/// Returns [`Error::CredentialParse`] with the 1-based line number of the first
/// line that does not hold exactly two tokens.
pub fn parse_credentials(contents: &str) -> Result<CredentialSet> {
    let mut creds = CredentialSet::new();

    for (index, line) in contents.lines().enumerate() {
        let row = line.trim();
        if row.is_empty() {
            continue;
        }

        let tokens: Vec<&str> = row.split_whitespace().collect();
        match tokens.as_slice() {
            [key, value] => {
                if creds.insert(key.to_string(), value.to_string()).is_some() {
                    warn!("Credential '{}' appears more than once, keeping the last value", key);
                }
            }
            _ => {
                error!(
                    "Credential line {} has {} token(s), expected 2",
                    index + 1,
                    tokens.len()
                );
                return Err(Error::CredentialParse {
                    line: index + 1,
                    tokens: tokens.len(),
                });
            }
        }
    }

    Ok(creds)
}

/// Reads and parses a credential file.
///
/// # Errors
///
/// - [`Error::Io`] if the file cannot be read
/// - [`Error::CredentialParse`] if a non-blank line is malformed
pub fn load_credentials(path: &Path) -> Result<CredentialSet> {
    info!("Loading credentials from {}", path.display());
    let contents = fs::read_to_string(path)?;
    let creds = parse_credentials(&contents)?;
    debug!("Loaded {} credential entries", creds.len());
    Ok(creds)
}

/// Masks a secret for logging, keeping at most the first and last 8 characters.
pub(crate) fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    let len = chars.len();
    let prefix: String = chars.iter().take(8.min(len)).collect();

    if len > 16 {
        let suffix: String = chars[len - 8..].iter().collect();
        format!("{}...{}", prefix, suffix)
    } else {
        format!("{}...", prefix)
    }
}

/// Twitter/X API credentials read from the key file.
///
/// Only `bearer_token` is sent with search requests; the user-context keys are
/// still required so that a key file missing any of them is rejected up front.
#[derive(Clone)]
pub struct TwitterCredentials {
    pub api_key: String,
    pub api_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
    /// App-only bearer token used for the recent-search endpoint
    pub bearer_token: String,
}

impl std::fmt::Debug for TwitterCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwitterCredentials")
            .field("api_key", &mask_token(&self.api_key))
            .field("api_secret", &"[REDACTED]")
            .field("access_token", &mask_token(&self.access_token))
            .field("access_token_secret", &"[REDACTED]")
            .field("bearer_token", &mask_token(&self.bearer_token))
            .finish()
    }
}

impl TwitterCredentials {
    /// Builds credentials from a parsed key file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingCredential`] naming the first absent key in
    /// [`REQUIRED_KEYS`] order.
    pub fn from_credentials(creds: &CredentialSet) -> Result<Self> {
        let get = |key: &'static str| -> Result<String> {
            match creds.get(key) {
                Some(value) => Ok(value.clone()),
                None => {
                    error!("Credential file is missing required key '{}'", key);
                    Err(Error::MissingCredential(key))
                }
            }
        };

        let config = TwitterCredentials {
            api_key: get(REQUIRED_KEYS[0])?,
            api_secret: get(REQUIRED_KEYS[1])?,
            access_token: get(REQUIRED_KEYS[2])?,
            access_token_secret: get(REQUIRED_KEYS[3])?,
            bearer_token: get(REQUIRED_KEYS[4])?,
        };

        if config.bearer_token.len() < 10 {
            warn!(
                "Bearer token seems unusually short ({} characters)",
                config.bearer_token.len()
            );
        }
        debug!("Bearer token (masked): {}", mask_token(&config.bearer_token));
        info!("Twitter credentials loaded successfully");

        Ok(config)
    }

    /// Loads and validates credentials from a key file in one step.
    pub fn from_file(path: &Path) -> Result<Self> {
        Self::from_credentials(&load_credentials(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_key_value_pairs() {
        let creds = parse_credentials("API_KEY abc\nAPI_SECRET def\n").unwrap();
        let expected: CredentialSet = [("API_KEY", "abc"), ("API_SECRET", "def")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert_eq!(creds, expected);
    }

    #[test]
    fn skips_blank_lines_and_trims() {
        let creds = parse_credentials("\n   \nkey1\tvalue1  \n\n  key2   value2\n").unwrap();
        assert_eq!(creds.len(), 2);
        assert_eq!(creds["key1"], "value1");
        assert_eq!(creds["key2"], "value2");
    }

    #[test]
    fn rejects_lines_without_exactly_two_tokens() {
        match parse_credentials("a 1\nlonely\n") {
            Err(Error::CredentialParse { line, tokens }) => {
                assert_eq!(line, 2);
                assert_eq!(tokens, 1);
            }
            other => panic!("expected parse error, got {:?}", other),
        }

        assert!(matches!(
            parse_credentials("a b c"),
            Err(Error::CredentialParse { line: 1, tokens: 3 })
        ));
    }

    #[test]
    fn last_value_wins_for_repeated_key() {
        let creds = parse_credentials("k first\nk second\n").unwrap();
        assert_eq!(creds["k"], "second");
    }

    #[test]
    fn empty_file_yields_empty_set() {
        assert!(parse_credentials("").unwrap().is_empty());
    }

    #[test]
    fn load_credentials_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "bearer_token AAAA").unwrap();
        let creds = load_credentials(file.path()).unwrap();
        assert_eq!(creds["bearer_token"], "AAAA");
    }

    #[test]
    fn load_credentials_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_credentials(&dir.path().join("nope.txt"));
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn twitter_credentials_require_every_key() {
        let mut creds = parse_credentials(
            "api_key k\napi_secret s\ntoken t\ntoken_secret ts\nbearer_token bearer-token-value\n",
        )
        .unwrap();
        let config = TwitterCredentials::from_credentials(&creds).unwrap();
        assert_eq!(config.bearer_token, "bearer-token-value");
        assert_eq!(config.access_token, "t");

        creds.remove("token_secret");
        assert!(matches!(
            TwitterCredentials::from_credentials(&creds),
            Err(Error::MissingCredential("token_secret"))
        ));
    }

    #[test]
    fn debug_output_masks_secrets() {
        let config = TwitterCredentials {
            api_key: "key".into(),
            api_secret: "supersecret".into(),
            access_token: "token".into(),
            access_token_secret: "tokensecret".into(),
            bearer_token: "AAAAAAAAAAAAAAAAAAAAAAAAbearerTAIL".into(),
        };
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("supersecret"));
        assert!(!rendered.contains("tokensecret"));
        assert!(rendered.contains("AAAAAAAA...arerTAIL"));
    }

    #[test]
    fn mask_token_keeps_edges() {
        assert_eq!(mask_token("short"), "short...");
        assert_eq!(mask_token("0123456789ab"), "01234567...");
        assert_eq!(mask_token("0123456789abcdefXYZ"), "01234567...bcdefXYZ");
    }
}
