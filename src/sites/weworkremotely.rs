//! We Work Remotely parser
//!
//! Listing pages carry one `li.new-listing-container` per posting with an
//! anchor to `/listings/...`. Detail pages put title and company in the hero
//! header, the body in the content description, and everything else in a
//! sidebar of labelled `li` items ("Posted on", "Salary", "Region",
//! "Skills").

use crate::config::SiteEntry;
use crate::posting::JobPosting;
use crate::sites::extract::{extract_experience, extract_skills, parse_relative_time};
use crate::sites::{ParseError, PostingSummary, SiteParser};
use crate::url::{extract_domain, matches_wildcard, normalize_url};
use crate::ConfigError;
use chrono::Utc;
use scraper::{ElementRef, Html, Selector};
use tokio_util::sync::CancellationToken;
use url::Url;

const LISTING_ITEM: &str = "li.new-listing-container > a[href^='/listings/']";
const LISTING_TITLE: &str = "h4.new-listing__header__title";
const LISTING_COMPANY: &str = "p.new-listing__company-name";
const LISTING_LOCATION: &str = "p.new-listing__company-headquarters";

const JOB_TITLE: &str = "h2.lis-container__header__hero__company-info__title";
const JOB_COMPANY: &str = "div.lis-container__header__hero__company-info__description strong";
const JOB_DESCRIPTION: &str = "div.lis-container__job__content__description";
const JOB_APPLY_LINK: &str = "a#job-cta-alt";
const SIDEBAR_ITEM: &str = "li.lis-container__job__sidebar__job-about__list__item, \
                            li.lis-container__job__sidebar__job-about__list__item--full";

const SEARCH_PATH: &str = "/remote-jobs/search";

pub struct WeWorkRemotelyParser {
    base_url: Url,
    host_pattern: String,
    source: String,
}

impl WeWorkRemotelyParser {
    /// Creates a parser claiming `base_url`'s host (and its subdomains)
    pub fn new(base_url: Url) -> Result<Self, ConfigError> {
        let host = extract_domain(&base_url).ok_or_else(|| {
            ConfigError::InvalidUrl(format!("base-url has no host: {}", base_url))
        })?;
        let host = host.strip_prefix("www.").unwrap_or(&host).to_string();

        Ok(Self {
            base_url,
            host_pattern: format!("*.{}", host),
            source: host,
        })
    }

    pub fn from_entry(entry: &SiteEntry) -> Result<Self, ConfigError> {
        let base_url = Url::parse(&entry.base_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", entry.base_url, e)))?;
        Self::new(base_url)
    }

    /// Builds one summary from a listing anchor, or None if a field is missing
    fn summary_from_anchor(&self, anchor: ElementRef<'_>) -> Option<PostingSummary> {
        let title = child_text(anchor, LISTING_TITLE);
        let company = child_text(anchor, LISTING_COMPANY);
        let href = anchor.value().attr("href")?;

        if title.is_empty() || company.is_empty() {
            tracing::debug!("Skipping listing entry {} without title or company", href);
            return None;
        }

        let detail_url = match self.base_url.join(href) {
            Ok(joined) => normalize_url(joined.as_str()).unwrap_or(joined),
            Err(e) => {
                tracing::debug!("Skipping listing entry with bad href {}: {}", href, e);
                return None;
            }
        };

        Some(PostingSummary {
            title,
            company,
            location: child_text(anchor, LISTING_LOCATION),
            detail_url,
        })
    }
}

impl SiteParser for WeWorkRemotelyParser {
    fn name(&self) -> &str {
        "weworkremotely"
    }

    fn matches(&self, url: &str) -> bool {
        let Ok(candidate) = Url::parse(url) else {
            return false;
        };

        candidate
            .host_str()
            .is_some_and(|host| matches_wildcard(&self.host_pattern, host))
            && candidate.port_or_known_default() == self.base_url.port_or_known_default()
    }

    fn search_url(&self, role: &str) -> Option<Url> {
        let mut url = self.base_url.join(SEARCH_PATH).ok()?;
        url.query_pairs_mut().append_pair("term", role);
        Some(url)
    }

    fn parse_listing(
        &self,
        document: &Html,
        cancel: &CancellationToken,
    ) -> Result<Vec<PostingSummary>, ParseError> {
        let mut summaries = Vec::new();
        let Ok(selector) = Selector::parse(LISTING_ITEM) else {
            return Ok(summaries);
        };

        for anchor in document.select(&selector) {
            if cancel.is_cancelled() {
                tracing::warn!(
                    "Listing parse cancelled after {} postings",
                    summaries.len()
                );
                break;
            }

            if let Some(summary) = self.summary_from_anchor(anchor) {
                tracing::debug!(
                    "[{}] Found job: {} at {}",
                    self.name(),
                    summary.title,
                    summary.company
                );
                summaries.push(summary);
            }
        }

        Ok(summaries)
    }

    fn parse_job_description(
        &self,
        document: &Html,
        page_url: &str,
    ) -> Result<JobPosting, ParseError> {
        let root = document.root_element();

        let title = child_text(root, JOB_TITLE).to_lowercase();
        if title.is_empty() {
            return Err(ParseError::MissingField { field: "title" });
        }

        let company = child_text(root, JOB_COMPANY).to_lowercase();
        if company.is_empty() {
            return Err(ParseError::MissingField { field: "company" });
        }

        let description = child_text(root, JOB_DESCRIPTION);
        let apply_url = Selector::parse(JOB_APPLY_LINK)
            .ok()
            .and_then(|selector| root.select(&selector).next())
            .and_then(|link| link.value().attr("href"))
            .map(|href| href.trim().to_string())
            .unwrap_or_default();

        let sidebar = Sidebar::read(root);
        let now = Utc::now();
        let posted_on = match parse_relative_time(&sidebar.posted_on, now) {
            Ok(posted_on) => posted_on,
            Err(e) => {
                tracing::debug!("{}; using fetch time for {}", e, page_url);
                now
            }
        };

        let posting = JobPosting {
            skills: extract_skills(&sidebar.skills, &description),
            experience: extract_experience(&description),
            title,
            company,
            location: sidebar.regions.join(", "),
            salary: sidebar.salary,
            posted_on,
            description,
            url: page_url.to_string(),
            source: self.source.clone(),
            apply_url,
            ..Default::default()
        };

        tracing::debug!(
            "[{}] Parsed job: {} at {}",
            self.name(),
            posting.title,
            posting.company
        );
        Ok(posting)
    }
}

/// Labelled facts from the detail page sidebar
#[derive(Debug, Default)]
struct Sidebar {
    posted_on: String,
    salary: String,
    regions: Vec<String>,
    skills: Vec<String>,
}

impl Sidebar {
    fn read(root: ElementRef<'_>) -> Self {
        let mut sidebar = Self::default();
        let Ok(items) = Selector::parse(SIDEBAR_ITEM) else {
            return sidebar;
        };

        for item in root.select(&items) {
            let label = item.text().collect::<String>();

            if label.contains("Posted on") {
                sidebar.posted_on = child_text(item, "span");
            } else if label.contains("Salary") {
                sidebar.salary = child_text(item, "span");
            } else if label.contains("Region") {
                sidebar.regions.extend(box_texts(item));
            } else if label.contains("Skills") {
                sidebar.skills.extend(box_texts(item));
            }
        }

        sidebar
    }
}

/// Trimmed text of the first descendant matching `css`, or ""
fn child_text(element: ElementRef<'_>, css: &str) -> String {
    Selector::parse(css)
        .ok()
        .and_then(|selector| element.select(&selector).next())
        .map(|child| child.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

/// Non-empty texts of the `span.box` tags inside a sidebar item
fn box_texts(item: ElementRef<'_>) -> Vec<String> {
    let Ok(selector) = Selector::parse("span.box") else {
        return Vec::new();
    };

    item.select(&selector)
        .map(|tag| tag.text().collect::<String>().trim().to_string())
        .filter(|text| !text.is_empty())
        .collect()
}
