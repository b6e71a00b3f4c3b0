//! Site parsers: one pluggable extractor per job board
//!
//! The dispatcher never knows which board it is crawling. It asks the
//! [`ParserRegistry`] for the first parser whose [`SiteParser::matches`]
//! accepts a URL and hands it the fetched document. A new source is added
//! by registering another implementation.

mod extract;
mod registry;
mod weworkremotely;

pub use extract::{extract_experience, extract_skills, parse_relative_time, KNOWN_TECHNOLOGIES};
pub use registry::ParserRegistry;
pub use weworkremotely::WeWorkRemotelyParser;

use crate::posting::JobPosting;
use scraper::Html;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Errors a site parser can report for a document
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("missing required field `{field}`")]
    MissingField { field: &'static str },

    #[error("could not parse relative time `{0}`")]
    RelativeTime(String),
}

/// A posting as seen on a listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostingSummary {
    pub title: String,
    pub company: String,
    pub location: String,
    /// Absolute URL of the posting's detail page
    pub detail_url: Url,
}

/// Extraction capabilities of one job board
pub trait SiteParser: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Returns true if this parser handles pages at `url`
    fn matches(&self, url: &str) -> bool;

    /// Role-specific search page to seed a crawl with, if the site has one
    fn search_url(&self, _role: &str) -> Option<Url> {
        None
    }

    /// Extracts the postings listed on a listing page
    ///
    /// Implementations check `cancel` between items and return what they
    /// collected so far once it fires.
    fn parse_listing(
        &self,
        document: &Html,
        cancel: &CancellationToken,
    ) -> Result<Vec<PostingSummary>, ParseError>;

    /// Extracts one full posting from its detail page
    fn parse_job_description(
        &self,
        document: &Html,
        page_url: &str,
    ) -> Result<JobPosting, ParseError>;
}
