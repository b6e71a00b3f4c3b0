use std::collections::HashMap;
use std::fmt;

/// What kind of page a crawl task points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// A page enumerating many postings (search results, category pages)
    Listing,
    /// A single posting's detail page
    Job,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Listing => "listing",
            Self::Job => "job",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit of crawl work
///
/// Built with [`CrawlTask::listing`] / [`CrawlTask::job`] plus
/// [`CrawlTask::with_meta`], then handed to the frontier. Once admitted it is
/// only ever read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTask {
    url: String,
    kind: TaskKind,
    meta: HashMap<String, String>,
}

impl CrawlTask {
    pub fn new(url: impl Into<String>, kind: TaskKind) -> Self {
        Self {
            url: url.into(),
            kind,
            meta: HashMap::new(),
        }
    }

    pub fn listing(url: impl Into<String>) -> Self {
        Self::new(url, TaskKind::Listing)
    }

    pub fn job(url: impl Into<String>) -> Self {
        Self::new(url, TaskKind::Job)
    }

    /// Attaches a metadata hint (e.g. the title seen on the listing page)
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    pub fn meta(&self, key: &str) -> Option<&str> {
        self.meta.get(key).map(String::as_str)
    }
}
