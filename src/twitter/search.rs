//! Recent-search pagination for the Twitter API.
//!
//! A [`SearchSource`] hands out one [`SearchPage`] at a time; the reply
//! retriever drives it with the `next_token` of the previous page until the
//! API stops returning one. [`ApiSearchSource`] is the implementation backed
//! by the Twitter/X API v2 `tweets/search/recent` endpoint.

use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::Client;
use serde_json::Value;

use crate::config::TwitterCredentials;
use crate::error::{Error, Result};
use crate::oauth::build_bearer_auth_header;

use super::api::get_with_rate_limit;

/// Default Twitter/X API v2 base URL.
pub const DEFAULT_API_BASE: &str = "https://api.x.com/2";

/// Items requested per page (the endpoint maximum).
pub const PAGE_SIZE: u32 = 100;

/// Expansions requested with every search page.
pub const EXPANSIONS: &[&str] = &["author_id", "entities.mentions.username", "in_reply_to_user_id"];

/// Tweet fields requested with every search page.
pub const TWEET_FIELDS: &[&str] = &[
    "conversation_id",
    "created_at",
    "public_metrics",
    "in_reply_to_user_id",
];

/// User fields requested with every search page.
pub const USER_FIELDS: &[&str] = &["public_metrics", "verified"];

/// One page of search results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchPage {
    /// Raw tweet objects, in the order the API returned them
    pub data: Vec<Value>,
    /// Author objects from `includes.users`
    pub users: Vec<Value>,
    /// Continuation cursor for the next page, if any
    pub next_token: Option<String>,
}

impl SearchPage {
    /// Builds a page from a decoded search response.
    ///
    /// A missing `data`, `includes`, `includes.users` or `meta.next_token` is
    /// treated as empty. Present but wrongly typed members are rejected.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedResponse`] if the response is not a JSON object
    /// or one of the members above has the wrong type.
    pub fn from_response(json_response: Value) -> Result<Self> {
        let Value::Object(mut body) = json_response else {
            return Err(Error::MalformedResponse(
                "response is not a JSON object".to_string(),
            ));
        };

        if let Some(errors) = body.get("errors").and_then(|e| e.as_array()) {
            warn!("Search response carried {} partial error(s)", errors.len());
        }

        let data = match body.remove("data") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items,
            Some(_) => {
                return Err(Error::MalformedResponse(
                    "`data` is not an array".to_string(),
                ))
            }
        };

        let users = match body.remove("includes") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Object(mut includes)) => match includes.remove("users") {
                None | Some(Value::Null) => Vec::new(),
                Some(Value::Array(users)) => users,
                Some(_) => {
                    return Err(Error::MalformedResponse(
                        "`includes.users` is not an array".to_string(),
                    ))
                }
            },
            Some(_) => {
                return Err(Error::MalformedResponse(
                    "`includes` is not an object".to_string(),
                ))
            }
        };

        let next_token = match body.get("meta") {
            None | Some(Value::Null) => None,
            Some(Value::Object(meta)) => match meta.get("next_token") {
                None | Some(Value::Null) => None,
                Some(Value::String(token)) => Some(token.clone()),
                Some(_) => {
                    return Err(Error::MalformedResponse(
                        "`meta.next_token` is not a string".to_string(),
                    ))
                }
            },
            Some(_) => {
                return Err(Error::MalformedResponse(
                    "`meta` is not an object".to_string(),
                ))
            }
        };

        Ok(SearchPage {
            data,
            users,
            next_token,
        })
    }

    /// Parses a raw response body. Undecodable JSON counts as a malformed response.
    pub fn from_body(body: &str) -> Result<Self> {
        let json_response: Value = serde_json::from_str(body)
            .map_err(|e| Error::MalformedResponse(format!("response is not valid JSON: {}", e)))?;
        Self::from_response(json_response)
    }
}

/// A paginated search endpoint.
#[async_trait]
pub trait SearchSource: Send {
    /// Fetches the page of results for `query` that follows `next_token`
    /// (the first page when `None`).
    async fn fetch_page(&mut self, query: &str, next_token: Option<&str>) -> Result<SearchPage>;
}

/// Builds the recent-search URL for one page.
pub fn build_search_url(base_url: &str, query: &str, next_token: Option<&str>) -> String {
    let mut url = format!(
        "{}/tweets/search/recent?query={}&max_results={}&expansions={}&tweet.fields={}&user.fields={}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(query),
        PAGE_SIZE,
        EXPANSIONS.join(","),
        TWEET_FIELDS.join(","),
        USER_FIELDS.join(","),
    );
    if let Some(token) = next_token {
        url.push_str("&next_token=");
        url.push_str(&urlencoding::encode(token));
    }
    url
}

/// [`SearchSource`] backed by the Twitter/X API v2 recent-search endpoint.
pub struct ApiSearchSource {
    client: Client,
    base_url: String,
    auth_header: String,
    requests: usize,
}

impl ApiSearchSource {
    /// Creates a source that authenticates with the credentials' bearer token.
    pub fn new(credentials: &TwitterCredentials) -> Self {
        debug!("Building OAuth 2.0 Bearer Token authorization header for search");
        Self {
            client: Client::new(),
            base_url: DEFAULT_API_BASE.to_string(),
            auth_header: build_bearer_auth_header(&credentials.bearer_token),
            requests: 0,
        }
    }

    /// Points the source at a different API base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl SearchSource for ApiSearchSource {
    async fn fetch_page(&mut self, query: &str, next_token: Option<&str>) -> Result<SearchPage> {
        self.requests += 1;
        let url = build_search_url(&self.base_url, query, next_token);
        info!("Fetching search page for query '{}'", query);
        debug!("Search URL: {}", url);

        let response_text = get_with_rate_limit(
            &self.client,
            &url,
            &self.auth_header,
            &format!("search_replies_request_{}", self.requests),
        )
        .await?;

        let page = SearchPage::from_body(&response_text)?;
        debug!(
            "Search page: {} tweets, {} users, more pages: {}",
            page.data.len(),
            page.users.len(),
            page.next_token.is_some()
        );
        Ok(page)
    }
}
