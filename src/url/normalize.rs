use crate::UrlError;
use url::Url;

/// Query parameters that only carry campaign attribution
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "mc_eid", "ref", "source"];

/// Canonicalises a discovered URL so trivially different links dedup
///
/// # Normalization Steps
///
/// 1. Parse; reject anything that is not HTTP(S) or has no host
/// 2. Lowercase the host and strip a leading `www.`
/// 3. Collapse empty and dot segments, drop the trailing slash (root stays `/`)
/// 4. Drop the fragment
/// 5. Drop tracking parameters (`utm_*` and friends), sort the rest by key
///
/// The scheme is preserved: job boards are fetched over HTTPS in practice,
/// while local mock servers only speak HTTP.
///
/// # Examples
///
/// ```
/// use job_crawler::url::normalize_url;
///
/// let url = normalize_url("https://WWW.Example.com/listings/acme/?utm_source=rss#apply").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/listings/acme");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    let host = url.host_str().ok_or(UrlError::MissingDomain)?.to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host).to_string();
    url.set_host(Some(&host))
        .map_err(|e| UrlError::Parse(format!("Failed to set host: {}", e)))?;

    let path = normalize_path(url.path());
    url.set_path(&path);
    url.set_fragment(None);

    if url.query().is_some() {
        let mut params: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| !is_tracking_param(key))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        params.sort_by(|a, b| a.0.cmp(&b.0));

        if params.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(params);
        }
    }

    Ok(url)
}

fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    format!("/{}", segments.join("/"))
}

fn is_tracking_param(key: &str) -> bool {
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key)
}
