//! URL handling for discovered links
//!
//! Normalization keeps the frontier's dedup honest; wildcard matching lets a
//! site parser claim a domain and its subdomains.

mod matcher;
mod normalize;

pub use matcher::matches_wildcard;
pub use normalize::normalize_url;

use url::Url;

/// Extracts the lowercase host from a URL
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}
