//! Trend reports over stored postings
//!
//! A report holds the most frequent skills, locations, companies and
//! experience levels, optionally restricted to postings whose title
//! contains a search term.

use crate::storage::{CountResult, Storage, StorageResult, TrendField};

/// Number of entries per group when the caller does not choose
pub const DEFAULT_TOP_N: usize = 20;

/// Top-N counts per posting attribute
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrendReport {
    pub title_filter: Option<String>,
    pub total_postings: u64,
    pub top_skills: Vec<CountResult>,
    pub top_locations: Vec<CountResult>,
    pub top_companies: Vec<CountResult>,
    pub experience_distribution: Vec<CountResult>,
}

/// Loads a trend report from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
/// * `title_filter` - Case-insensitive partial match on posting titles
/// * `limit` - Maximum entries per group
pub fn load_trend_report(
    storage: &dyn Storage,
    title_filter: Option<&str>,
    limit: usize,
) -> StorageResult<TrendReport> {
    let title_filter = title_filter.map(str::trim).filter(|t| !t.is_empty());

    Ok(TrendReport {
        title_filter: title_filter.map(str::to_string),
        total_postings: storage.count_postings()?,
        top_skills: storage.top_values(TrendField::Skills, title_filter, limit)?,
        top_locations: storage.top_values(TrendField::Location, title_filter, limit)?,
        top_companies: storage.top_values(TrendField::Company, title_filter, limit)?,
        experience_distribution: storage.top_values(
            TrendField::Experience,
            title_filter,
            limit,
        )?,
    })
}

/// Prints a trend report to stdout
pub fn print_trend_report(report: &TrendReport) {
    println!("=== Job Trends ===\n");

    match &report.title_filter {
        Some(title) => println!("Titles matching: '{}'", title),
        None => println!("All titles"),
    }
    println!("Postings stored: {}", report.total_postings);
    println!();

    print_section("Top Skills", &report.top_skills);
    print_section("Top Locations", &report.top_locations);
    print_section("Top Companies", &report.top_companies);
    print_section("Experience", &report.experience_distribution);
}

fn print_section(heading: &str, counts: &[CountResult]) {
    println!("{}:", heading);
    if counts.is_empty() {
        println!("  (none)");
    }
    for (rank, entry) in counts.iter().enumerate() {
        println!("  {:>2}. {} ({})", rank + 1, entry.value, entry.count);
    }
    println!();
}
