//! Reply-thread retrieval.
//!
//! Given one previously collected tweet, this module searches for every tweet
//! in its conversation and writes each one out as a flattened record:
//!
//! ```text
//! {"user_info": {...}, "tweet_info": {...}}
//! ```
//!
//! `user_info` is the first author object included with the *first* page of
//! results and is attached to every record of the conversation, whichever
//! tweet it belongs to.

use log::{debug, info, warn};
use serde::Serialize;
use serde_json::{Map, Value};
use std::io::Write;

use crate::error::{Error, Result};
use crate::interrupt::Interrupt;

use super::search::SearchSource;

/// The fields of an input record the retriever needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginalPost {
    /// `tweet_info.conversation_id`, rendered as text
    pub conversation_id: String,
    /// `tweet_info.public_metrics.reply_count`, rendered as text
    pub reply_count: String,
}

impl OriginalPost {
    /// Parses one input line.
    ///
    /// `conversation_id` may be a JSON string or number. So may `reply_count`;
    /// strings are used verbatim.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidRecord`] when the line is not JSON or a field is missing.
    pub fn parse(line: &str) -> Result<Self> {
        let record: Value = serde_json::from_str(line)
            .map_err(|e| Error::InvalidRecord(format!("not valid JSON: {}", e)))?;

        let tweet_info = record
            .get("tweet_info")
            .ok_or_else(|| Error::InvalidRecord("missing `tweet_info`".to_string()))?;

        let conversation_id = match tweet_info.get("conversation_id") {
            Some(Value::String(id)) => id.clone(),
            Some(Value::Number(id)) => id.to_string(),
            _ => {
                return Err(Error::InvalidRecord(
                    "missing `tweet_info.conversation_id`".to_string(),
                ))
            }
        };

        let reply_count = match tweet_info
            .get("public_metrics")
            .and_then(|pm| pm.get("reply_count"))
        {
            Some(Value::String(count)) => count.clone(),
            Some(count @ Value::Number(_)) => count.to_string(),
            _ => {
                return Err(Error::InvalidRecord(
                    "missing `tweet_info.public_metrics.reply_count`".to_string(),
                ))
            }
        };

        Ok(OriginalPost {
            conversation_id,
            reply_count,
        })
    }

    /// Search query restricting results to this post's conversation.
    pub fn conversation_query(&self) -> String {
        format!("conversation_id:{}", self.conversation_id)
    }
}

/// One output line.
#[derive(Debug, Serialize)]
pub struct FlattenedReply<'a> {
    pub user_info: &'a Value,
    pub tweet_info: &'a Value,
}

/// Knobs for a single retrieval.
#[derive(Debug, Clone, Default)]
pub struct RetrievalOptions {
    /// Stop after this many pages even if the API offers more. `None` means no cap.
    pub max_pages: Option<usize>,
}

/// How a retrieval ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalStatus {
    /// The API reported no further pages (or the page cap was reached).
    Completed,
    /// Ctrl-C arrived while pages were being fetched.
    Interrupted,
    /// The API returned a page that could not be read.
    MalformedResponse,
}

/// Result of retrieving one conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrievalOutcome {
    pub status: RetrievalStatus,
    /// Records written to the output
    pub emitted: usize,
    /// Pages successfully fetched
    pub pages: usize,
}

/// Counters shared with the caller so they survive an interrupted retrieval.
#[derive(Default)]
struct Progress {
    emitted: usize,
    pages: usize,
}

/// Writes one flattened record followed by a newline.
///
/// # Parameters
///
/// - `out`: Destination for newline-delimited JSON
/// - `user_info`: Representative author object for the conversation
/// - `tweet_info`: Raw tweet object as returned by the API
///
/// # Returns
///
/// - `Ok(())`: The record was written
/// - `Err(Error)`: Serialization or write failure
fn write_reply<W: Write>(out: &mut W, user_info: &Value, tweet_info: &Value) -> Result<()> {
    serde_json::to_writer(
        &mut *out,
        &FlattenedReply {
            user_info,
            tweet_info,
        },
    )?;
    out.write_all(b"\n")?;
    Ok(())
}

/// Walks every page of a conversation search and writes its records.
///
/// The first page decides `user_info` for the whole conversation: its first
/// included user, or `{}` when it has none. Each page is written and flushed
/// before the next one is requested, and pagination stops when a page carries
/// no `next_token` or `options.max_pages` pages have been fetched.
///
/// # Parameters
///
/// - `source`: Paginated search endpoint
/// - `query`: Conversation query (`conversation_id:<id>`)
/// - `out`: Destination for newline-delimited JSON
/// - `options`: Optional page cap
/// - `progress`: Updated after every page and record, so the caller still sees
///   the counts when this future is dropped mid-way
///
/// # Returns
///
/// - `Ok(())`: The last page was reached (or the page cap hit)
/// - `Err(Error)`: Any fetch or write error, recoverable ones included; the
///   caller decides which to suppress
async fn paginate<S, W>(
    source: &mut S,
    query: &str,
    out: &mut W,
    options: &RetrievalOptions,
    progress: &mut Progress,
) -> Result<()>
where
    S: SearchSource + ?Sized,
    W: Write,
{
    let mut user_info: Option<Value> = None;
    let mut next_token: Option<String> = None;

    loop {
        let page = source.fetch_page(query, next_token.as_deref()).await?;
        progress.pages += 1;
        debug!(
            "Page {} for '{}': {} tweets",
            progress.pages,
            query,
            page.data.len()
        );

        let representative = user_info.get_or_insert_with(|| {
            page.users
                .first()
                .cloned()
                .unwrap_or_else(|| Value::Object(Map::new()))
        });

        for tweet in &page.data {
            write_reply(out, representative, tweet)?;
            progress.emitted += 1;
        }
        out.flush()?;

        next_token = page.next_token;
        if next_token.is_none() {
            debug!("No more pages to fetch for '{}'", query);
            return Ok(());
        }

        if let Some(max_pages) = options.max_pages {
            if progress.pages >= max_pages {
                warn!(
                    "Reached maximum page limit ({}) for '{}', stopping pagination",
                    max_pages, query
                );
                return Ok(());
            }
        }
    }
}

/// Fetches the reply thread of the tweet on `line` and writes one flattened
/// record per reply to `out`.
///
/// Prints `Getting reply tweets for conversation_id:<id> estimated replies: <n>`
/// to standard error before the first request. Records are written as each page
/// arrives, so an interrupted or failed retrieval keeps what it already wrote.
///
/// # Errors
///
/// - [`Error::InvalidRecord`] if `line` is not a usable record (nothing is fetched)
/// - any non-recoverable fetch or write error
///
/// An interrupt or a malformed API response is not an error: it ends this
/// retrieval and is reported through [`RetrievalOutcome::status`].
pub async fn retrieve_reply_tweets<S, W>(
    source: &mut S,
    line: &str,
    out: &mut W,
    interrupt: &mut Interrupt,
    options: &RetrievalOptions,
) -> Result<RetrievalOutcome>
where
    S: SearchSource + ?Sized,
    W: Write,
{
    let post = OriginalPost::parse(line)?;
    let query = post.conversation_query();
    eprintln!(
        "Getting reply tweets for {} estimated replies: {}",
        query, post.reply_count
    );

    let mut progress = Progress::default();
    let result = tokio::select! {
        result = paginate(source, &query, out, options, &mut progress) => result,
        _ = interrupt.triggered() => Err(Error::Interrupted),
    };

    let status = match result {
        Ok(()) => RetrievalStatus::Completed,
        Err(Error::Interrupted) => {
            eprintln!();
            info!("Retrieval for '{}' interrupted", query);
            RetrievalStatus::Interrupted
        }
        Err(Error::MalformedResponse(reason)) => {
            warn!("Skipping rest of '{}': {}", query, reason);
            RetrievalStatus::MalformedResponse
        }
        Err(e) => return Err(e),
    };

    info!(
        "Retrieved {} replies across {} page(s) for '{}'",
        progress.emitted, progress.pages, query
    );
    Ok(RetrievalOutcome {
        status,
        emitted: progress.emitted,
        pages: progress.pages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_string_and_numeric_ids() {
        let post = OriginalPost::parse(
            r#"{"tweet_info":{"conversation_id":"123","public_metrics":{"reply_count":2}}}"#,
        )
        .unwrap();
        assert_eq!(post.conversation_id, "123");
        assert_eq!(post.reply_count, "2");
        assert_eq!(post.conversation_query(), "conversation_id:123");

        let post = OriginalPost::parse(
            r#"{"user_info":{},"tweet_info":{"conversation_id":1500000000000000001,"public_metrics":{"reply_count":"7"}}}"#,
        )
        .unwrap();
        assert_eq!(post.conversation_id, "1500000000000000001");
        assert_eq!(post.reply_count, "7");
    }

    #[test]
    fn rejects_unusable_records() {
        for line in [
            "",
            "not json",
            r#"{"conversation_id":"1"}"#,
            r#"{"tweet_info":{"public_metrics":{"reply_count":1}}}"#,
            r#"{"tweet_info":{"conversation_id":null,"public_metrics":{"reply_count":1}}}"#,
            r#"{"tweet_info":{"conversation_id":"1"}}"#,
            r#"{"tweet_info":{"conversation_id":"1","public_metrics":{}}}"#,
        ] {
            assert!(
                matches!(OriginalPost::parse(line), Err(Error::InvalidRecord(_))),
                "expected invalid record for {:?}",
                line
            );
        }
    }

    #[test]
    fn flattened_reply_field_order() {
        let user = serde_json::json!({"id": "u1"});
        let tweet = serde_json::json!({"id": "t1", "text": "hello"});
        let mut out = Vec::new();
        write_reply(&mut out, &user, &tweet).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "{\"user_info\":{\"id\":\"u1\"},\"tweet_info\":{\"id\":\"t1\",\"text\":\"hello\"}}\n"
        );
    }
}
