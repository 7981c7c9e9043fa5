//! Twitter/X API integration module.
//!
//! This module contains the paginated recent-search source and the reply
//! retriever built on top of it, using OAuth 2.0 Bearer Token authentication.

mod api;
mod replies;
mod search;

// Re-export public API
pub use replies::{
    retrieve_reply_tweets, FlattenedReply, OriginalPost, RetrievalOptions, RetrievalOutcome,
    RetrievalStatus,
};
pub use search::{
    build_search_url, ApiSearchSource, SearchPage, SearchSource, DEFAULT_API_BASE, EXPANSIONS,
    PAGE_SIZE, TWEET_FIELDS, USER_FIELDS,
};
