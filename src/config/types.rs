use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Job-Crawler
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub roles: RolesConfig,
    #[serde(default)]
    pub sites: SitesConfig,
}

/// Crawl loop limits
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Stop after this many postings have been stored
    #[serde(rename = "max-jobs")]
    pub max_jobs: usize,

    /// Advisory wall-clock budget for a whole crawl (seconds)
    #[serde(rename = "crawl-timeout-secs")]
    pub crawl_timeout_secs: u64,

    /// Hard limit for a single fetch-and-parse task (seconds)
    #[serde(rename = "task-timeout-secs")]
    pub task_timeout_secs: u64,

    /// Number of pending tasks the frontier holds before `add` waits
    #[serde(rename = "frontier-capacity")]
    pub frontier_capacity: usize,

    /// Minimum spacing of progress log lines (seconds)
    #[serde(rename = "progress-interval-secs")]
    pub progress_interval_secs: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_jobs: 50,
            crawl_timeout_secs: 60,
            task_timeout_secs: 15,
            frontier_capacity: 100,
            progress_interval_secs: 5,
        }
    }
}

impl CrawlerConfig {
    pub fn crawl_timeout(&self) -> Duration {
        Duration::from_secs(self.crawl_timeout_secs)
    }

    pub fn task_timeout(&self) -> Duration {
        Duration::from_secs(self.task_timeout_secs)
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_secs(self.progress_interval_secs)
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the header value: `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// Role allow-list consulted before a crawl is started
#[derive(Debug, Clone, Deserialize)]
pub struct RolesConfig {
    pub allowed: Vec<String>,
}

const DEFAULT_ROLES: &[&str] = &[
    "devops",
    "sre",
    "backend",
    "frontend",
    "full stack",
    "data engineer",
    "machine learning",
    "cloud",
    "security",
    "mobile",
    "qa",
];

impl Default for RolesConfig {
    fn default() -> Self {
        Self {
            allowed: DEFAULT_ROLES.iter().map(|r| r.to_string()).collect(),
        }
    }
}

impl RolesConfig {
    /// Returns the canonical (trimmed, lowercase) role if it is allowed
    pub fn canonicalize(&self, role: &str) -> Option<String> {
        let candidate = role.trim().to_lowercase();
        if candidate.is_empty() {
            return None;
        }
        self.allowed
            .iter()
            .any(|allowed| allowed.trim().eq_ignore_ascii_case(&candidate))
            .then_some(candidate)
    }

    pub fn is_allowed(&self, role: &str) -> bool {
        self.canonicalize(role).is_some()
    }

    /// Splits requested roles into (accepted, rejected), dropping duplicates
    pub fn partition<S: AsRef<str>>(&self, roles: &[S]) -> (Vec<String>, Vec<String>) {
        let mut accepted: Vec<String> = Vec::new();
        let mut rejected = Vec::new();

        for role in roles {
            match self.canonicalize(role.as_ref()) {
                Some(canonical) => {
                    if !accepted.contains(&canonical) {
                        accepted.push(canonical);
                    }
                }
                None => rejected.push(role.as_ref().to_string()),
            }
        }

        (accepted, rejected)
    }
}

/// Per-site parser settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SitesConfig {
    #[serde(default)]
    pub weworkremotely: SiteEntry,
}

/// Settings shared by every site parser
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteEntry {
    pub enabled: bool,

    /// Scheme and host the parser claims, e.g. "https://weworkremotely.com"
    #[serde(rename = "base-url")]
    pub base_url: String,
}

impl Default for SiteEntry {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://weworkremotely.com".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_matching_is_case_insensitive() {
        let roles = RolesConfig::default();
        assert_eq!(roles.canonicalize("  DevOps "), Some("devops".to_string()));
        assert!(roles.is_allowed("Full Stack"));
        assert!(!roles.is_allowed("astronaut"));
        assert!(!roles.is_allowed("   "));
    }

    #[test]
    fn test_partition_roles() {
        let roles = RolesConfig {
            allowed: vec!["devops".to_string(), "backend".to_string()],
        };
        let (accepted, rejected) = roles.partition(&["devops", "chef", "DEVOPS", "backend"]);
        assert_eq!(accepted, vec!["devops".to_string(), "backend".to_string()]);
        assert_eq!(rejected, vec!["chef".to_string()]);
    }

    #[test]
    fn test_user_agent_header_value() {
        let ua = UserAgentConfig {
            crawler_name: "JobCrawler".to_string(),
            crawler_version: "0.1".to_string(),
            contact_url: "https://example.com/bot".to_string(),
            contact_email: "bot@example.com".to_string(),
        };
        assert_eq!(
            ua.header_value(),
            "JobCrawler/0.1 (+https://example.com/bot; bot@example.com)"
        );
    }
}
