use crate::config::types::{
    Config, CrawlerConfig, OutputConfig, RolesConfig, SiteEntry, UserAgentConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_roles(&config.roles)?;
    validate_site("weworkremotely", &config.sites.weworkremotely)?;
    Ok(())
}

/// Validates crawl loop limits
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_jobs < 1 {
        return Err(ConfigError::Validation(format!(
            "max_jobs must be >= 1, got {}",
            config.max_jobs
        )));
    }

    if config.frontier_capacity < 1 || config.frontier_capacity > 100_000 {
        return Err(ConfigError::Validation(format!(
            "frontier_capacity must be between 1 and 100000, got {}",
            config.frontier_capacity
        )));
    }

    if config.task_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "task_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.crawl_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "crawl_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.progress_interval_secs < 1 {
        return Err(ConfigError::Validation(
            "progress_interval_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validates the role allow-list
fn validate_roles(roles: &RolesConfig) -> Result<(), ConfigError> {
    if roles.allowed.is_empty() {
        return Err(ConfigError::Validation(
            "roles.allowed must list at least one role".to_string(),
        ));
    }

    if let Some(blank) = roles.allowed.iter().find(|r| r.trim().is_empty()) {
        return Err(ConfigError::Validation(format!(
            "roles.allowed contains a blank entry: '{}'",
            blank
        )));
    }

    Ok(())
}

/// Validates a site entry's base URL
fn validate_site(name: &str, site: &SiteEntry) -> Result<(), ConfigError> {
    let url = Url::parse(&site.base_url).map_err(|e| {
        ConfigError::InvalidUrl(format!("Invalid base-url for site '{}': {}", name, e))
    })?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::Validation(format!(
            "base-url for site '{}' must use HTTP(S), got '{}'",
            name,
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url for site '{}' has no host",
            name
        )));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    let Some((local, domain)) = email.split_once('@') else {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    };

    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
