//! OAuth authentication helpers for Twitter/X API integration.
//!
//! The recent-search endpoint accepts OAuth 2.0 app-only (Bearer Token)
//! authentication, which is all the collector needs.

/// Builds the Authorization header for OAuth 2.0 Bearer Token authentication.
///
/// # Parameters
///
/// - `bearer_token`: The Bearer Token from the Twitter Developer Portal
///
/// # Format
///
/// ```text
/// Bearer YOUR_BEARER_TOKEN_HERE
/// ```
///
/// # Example
///
/// ```rust
/// use replyfetch::build_bearer_auth_header;
///
/// let header = build_bearer_auth_header("your_bearer_token");
/// assert_eq!(header, "Bearer your_bearer_token");
/// ```
pub fn build_bearer_auth_header(bearer_token: &str) -> String {
    format!("Bearer {}", bearer_token)
}
