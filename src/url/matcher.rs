/// Checks if a host matches a domain pattern
///
/// `"example.com"` matches only itself; `"*.example.com"` matches the bare
/// domain and any subdomain depth below it.
///
/// ```
/// use job_crawler::url::matches_wildcard;
///
/// assert!(matches_wildcard("*.weworkremotely.com", "weworkremotely.com"));
/// assert!(matches_wildcard("*.weworkremotely.com", "www.weworkremotely.com"));
/// assert!(!matches_wildcard("*.weworkremotely.com", "notweworkremotely.com"));
/// ```
pub fn matches_wildcard(pattern: &str, candidate: &str) -> bool {
    let candidate = candidate.to_ascii_lowercase();
    match pattern.strip_prefix("*.") {
        Some(base) => {
            let base = base.to_ascii_lowercase();
            candidate == base || candidate.ends_with(&format!(".{}", base))
        }
        None => candidate.eq_ignore_ascii_case(pattern),
    }
}
