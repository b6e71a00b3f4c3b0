//! Free-text extraction shared by site parsers

use crate::sites::ParseError;
use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Technology terms picked out of posting descriptions
pub const KNOWN_TECHNOLOGIES: &[&str] = &[
    "kafka", "kubernetes", "docker", "terraform", "ansible", "jenkins", "github actions",
    "ci/cd", "prometheus", "grafana", "datadog", "aws", "gcp", "azure", "python", "go", "java",
    "javascript", "react", "vue", "node.js", "typescript", "postgresql", "mysql", "mongodb",
    "redis", "elasticsearch", "linux", "bash", "shell", "git", "nginx", "apache", "sql", "nosql",
    "rest", "grpc", "graphql", "selenium", "puppet", "chef", "circleci", "travisci", "bitbucket",
    "openshift", "helm", "istio", "argocd", "flux", "zabbix", "new relic", "splunk", "pagerduty",
    "opsgenie", "cloudflare", "s3", "ec2", "iam", "cloudformation", "load balancer", "ecs", "eks",
    "fargate", "cloudwatch", "vpc", "lambda", "serverless", "tdd", "bdd", "junit", "pytest",
    "rspec", "mocha", "chai", "kafka streams", "kafka connect", "kinesis", "rabbitmq", "activemq",
    "celery", "airflow", "snowflake", "bigquery", "redshift", "zipkin", "jaeger",
];

#[allow(clippy::expect_used)]
static RELATIVE_TIME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)\s+(minute|hour|day|week|month|year)s?\s+ago")
        .expect("relative time pattern is valid")
});

#[allow(clippy::expect_used)]
static EXPERIENCE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,2})\+?\s*(?:years?|yrs?)\b").expect("experience pattern is valid")
});

/// Merges explicit skill tags with vocabulary hits from the description
///
/// Tags and terms are lowercased; the set keeps them deduplicated and sorted.
pub fn extract_skills<I, S>(tags: I, description: &str) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut skills: BTreeSet<String> = tags
        .into_iter()
        .map(|tag| tag.as_ref().trim().to_lowercase())
        .filter(|tag| !tag.is_empty())
        .collect();

    let haystack = description.to_lowercase();
    for term in KNOWN_TECHNOLOGIES {
        if contains_term(&haystack, term) {
            skills.insert(term.to_string());
        }
    }

    skills
}

/// Matches `term` only where it is not embedded in a longer word
fn contains_term(haystack: &str, term: &str) -> bool {
    haystack.match_indices(term).any(|(start, _)| {
        let end = start + term.len();
        let before = haystack[..start].chars().next_back();
        let after = haystack[end..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

/// Pulls the first "N years" requirement out of a description
pub fn extract_experience(description: &str) -> String {
    EXPERIENCE_PATTERN
        .captures(&description.to_lowercase())
        .and_then(|caps| caps.get(1))
        .map(|years| format!("{} years", years.as_str()))
        .unwrap_or_default()
}

/// Converts "3 days ago" style strings into an absolute timestamp
///
/// Minutes, hours, days and weeks are exact; a month counts as 30 days and a
/// year as 365 days.
pub fn parse_relative_time(input: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, ParseError> {
    let normalized = input.trim().to_lowercase();
    let invalid = || ParseError::RelativeTime(input.trim().to_string());

    let caps = RELATIVE_TIME_PATTERN
        .captures(&normalized)
        .ok_or_else(invalid)?;
    let value: i64 = caps[1].parse().map_err(|_| invalid())?;

    let minutes_per_unit: i64 = match &caps[2] {
        "minute" => 1,
        "hour" => 60,
        "day" => 24 * 60,
        "week" => 7 * 24 * 60,
        "month" => 30 * 24 * 60,
        "year" => 365 * 24 * 60,
        _ => return Err(invalid()),
    };

    let delta = value
        .checked_mul(minutes_per_unit)
        .and_then(Duration::try_minutes)
        .ok_or_else(invalid)?;

    now.checked_sub_signed(delta).ok_or_else(invalid)
}
