//! Crawl loop
//!
//! The dispatcher seeds a fresh [`Frontier`] with one listing task per role,
//! then drains it one task at a time. Listing pages feed job tasks back
//! into the frontier; job pages produce postings that go through the
//! upsert. The loop ends when the frontier is empty, the job cap is
//! reached, or the crawl token is cancelled. No single task failure ends it.

use crate::config::{Config, RolesConfig};
use crate::crawler::downloader::Downloader;
use crate::crawler::scope::TaskScope;
use crate::frontier::{CrawlTask, Frontier, TaskKind};
use crate::posting::JobPosting;
use crate::sites::{ParserRegistry, SiteParser};
use crate::storage::{
    upsert_posting, RunStatus, SharedStorage, Storage, StorageError, UpsertOutcome,
};
use crate::CrawlError;
use chrono::Utc;
use std::fmt;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Limits and identity of one crawl invocation
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    pub max_jobs: usize,
    /// Advisory only: exceeding it logs a warning
    pub crawl_budget: Duration,
    pub task_timeout: Duration,
    pub frontier_capacity: usize,
    pub progress_interval: Duration,
    pub roles: RolesConfig,
    pub config_hash: String,
}

impl CrawlSettings {
    pub fn from_config(config: &Config, config_hash: impl Into<String>) -> Self {
        Self {
            max_jobs: config.crawler.max_jobs,
            crawl_budget: config.crawler.crawl_timeout(),
            task_timeout: config.crawler.task_timeout(),
            frontier_capacity: config.crawler.frontier_capacity,
            progress_interval: config.crawler.progress_interval(),
            roles: config.roles.clone(),
            config_hash: config_hash.into(),
        }
    }
}

/// Why the crawl loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    FrontierExhausted,
    JobCapReached,
    Cancelled,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::FrontierExhausted => "frontier exhausted",
            Self::JobCapReached => "job cap reached",
            Self::Cancelled => "cancelled",
        };
        f.write_str(text)
    }
}

/// Totals reported when a crawl ends
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlSummary {
    /// Postings successfully upserted
    pub stored: usize,
    /// Tasks taken off the frontier
    pub processed: usize,
    /// Tasks no parser claimed
    pub skipped: usize,
    /// Tasks whose fetch, parse or persist failed
    pub failed: usize,
    pub elapsed: Duration,
    pub stop_reason: StopReason,
}

/// What a successfully handled task produced
enum TaskOutcome {
    Discovered(usize),
    Stored(UpsertOutcome),
}

pub struct Dispatcher {
    registry: ParserRegistry,
    downloader: Downloader,
    storage: SharedStorage,
    settings: CrawlSettings,
}

impl Dispatcher {
    pub fn new(
        registry: ParserRegistry,
        downloader: Downloader,
        storage: SharedStorage,
        settings: CrawlSettings,
    ) -> Self {
        Self {
            registry,
            downloader,
            storage,
            settings,
        }
    }

    /// Builds the registry, HTTP client and settings from a loaded config
    pub fn from_config(
        config: &Config,
        config_hash: impl Into<String>,
        storage: SharedStorage,
    ) -> Result<Self, CrawlError> {
        let registry = ParserRegistry::from_config(&config.sites)?;
        let downloader = Downloader::from_config(&config.user_agent)?;
        let settings = CrawlSettings::from_config(config, config_hash);
        Ok(Self::new(registry, downloader, storage, settings))
    }

    pub fn settings(&self) -> &CrawlSettings {
        &self.settings
    }

    pub fn registry(&self) -> &ParserRegistry {
        &self.registry
    }

    /// One listing task per allowed role and searchable site
    ///
    /// Roles outside the allow-list are reported and skipped.
    pub fn seed_tasks<S: AsRef<str>>(&self, roles: &[S]) -> Vec<CrawlTask> {
        let mut tasks = Vec::new();

        for role in roles {
            let Some(role) = self.settings.roles.canonicalize(role.as_ref()) else {
                tracing::error!("Role not allowed, skipping: '{}'", role.as_ref());
                continue;
            };

            for parser in self.registry.iter() {
                if let Some(url) = parser.search_url(&role) {
                    tasks.push(CrawlTask::listing(url.as_str()).with_meta("role", role.clone()));
                }
            }
        }

        if tasks.is_empty() {
            tracing::warn!("No seed tasks: no valid roles or no searchable sites");
        }
        tasks
    }

    /// Runs one complete crawl for `roles` on a fresh frontier
    pub async fn run<S: AsRef<str>>(&self, roles: &[S], cancel: &CancellationToken) -> CrawlSummary {
        let frontier = Frontier::new(self.settings.frontier_capacity);
        let seeds = self.seed_tasks(roles);
        let role_names: Vec<String> = seeds
            .iter()
            .filter_map(|task| task.meta("role").map(str::to_string))
            .collect();

        for task in seeds {
            if frontier.queue_size() >= frontier.capacity() {
                tracing::warn!(
                    "Frontier full while seeding, dropping {}",
                    task.url()
                );
                continue;
            }
            frontier.add(task).await;
        }

        let run_id = match self.with_storage(|storage| {
            storage.create_run(&role_names, &self.settings.config_hash)
        }) {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::error!("Failed to record crawl run: {}", e);
                None
            }
        };

        tracing::info!(
            "Starting crawl for [{}] with {} seed tasks",
            role_names.join(", "),
            frontier.queue_size()
        );

        let summary = self.drain(&frontier, cancel).await;

        if let Some(run_id) = run_id {
            let status = match summary.stop_reason {
                StopReason::Cancelled => RunStatus::Cancelled,
                _ => RunStatus::Completed,
            };
            if let Err(e) =
                self.with_storage(|storage| storage.complete_run(run_id, summary.stored, status))
            {
                tracing::error!("Failed to complete crawl run {}: {}", run_id, e);
            }
        }

        summary
    }

    /// Processes tasks from `frontier` until it empties, the cap is hit, or
    /// `cancel` fires
    pub async fn drain(&self, frontier: &Frontier, cancel: &CancellationToken) -> CrawlSummary {
        let started = Instant::now();
        let mut last_progress = Instant::now();
        let mut budget_warned = false;

        let mut stored = 0;
        let mut processed = 0;
        let mut skipped = 0;
        let mut failed = 0;

        let stop_reason = loop {
            if stored >= self.settings.max_jobs {
                tracing::info!("Reached job cap of {}", self.settings.max_jobs);
                break StopReason::JobCapReached;
            }
            if frontier.queue_size() == 0 {
                break StopReason::FrontierExhausted;
            }
            if cancel.is_cancelled() {
                tracing::warn!("Crawl cancelled with {} tasks pending", frontier.queue_size());
                break StopReason::Cancelled;
            }

            if last_progress.elapsed() >= self.settings.progress_interval {
                tracing::info!(
                    "Progress: {} stored, {} processed, {} in frontier",
                    stored,
                    processed,
                    frontier.queue_size()
                );
                last_progress = Instant::now();
            }

            if !budget_warned && started.elapsed() > self.settings.crawl_budget {
                tracing::warn!(
                    "Crawl exceeded its {:?} budget, continuing",
                    self.settings.crawl_budget
                );
                budget_warned = true;
            }

            let Some(task) = frontier.get_next().await else {
                break StopReason::FrontierExhausted;
            };
            processed += 1;

            let Some(parser) = self.registry.resolve(task.url()) else {
                tracing::warn!("No parser matches {}, skipping", task.url());
                skipped += 1;
                continue;
            };

            let scope = TaskScope::new(cancel, self.settings.task_timeout);
            let outcome = match task.kind() {
                TaskKind::Listing => {
                    self.process_listing(frontier, parser, &task, scope.token())
                        .await
                }
                TaskKind::Job => self.process_job(parser, &task, scope.token()).await,
            };
            drop(scope);

            match outcome {
                Ok(TaskOutcome::Stored(_)) => stored += 1,
                Ok(TaskOutcome::Discovered(count)) => {
                    tracing::debug!("{} new job tasks from {}", count, task.url());
                }
                Err(e) => {
                    tracing::warn!("{} task {} failed: {}", task.kind(), task.url(), e);
                    failed += 1;
                }
            }
        };

        let summary = CrawlSummary {
            stored,
            processed,
            skipped,
            failed,
            elapsed: started.elapsed(),
            stop_reason,
        };

        tracing::info!(
            "Crawl finished ({}): {} jobs stored in {:?}",
            summary.stop_reason,
            summary.stored,
            summary.elapsed
        );
        summary
    }

    async fn process_listing(
        &self,
        frontier: &Frontier,
        parser: &dyn SiteParser,
        task: &CrawlTask,
        token: &CancellationToken,
    ) -> Result<TaskOutcome, CrawlError> {
        tracing::debug!("[{}] Fetching listing {}", parser.name(), task.url());

        let summaries = self
            .downloader
            .fetch(task.url(), |document| parser.parse_listing(document, token), token)
            .await??;

        let found = summaries.len();
        let mut admitted = 0;

        for summary in summaries {
            let job = CrawlTask::job(summary.detail_url.as_str())
                .with_meta("title", summary.title)
                .with_meta("company", summary.company);

            tokio::select! {
                biased;
                added = frontier.add(job) => {
                    if added {
                        admitted += 1;
                    }
                }
                _ = token.cancelled() => {
                    tracing::warn!(
                        "Task scope ended while enqueueing from {}, dropping {} discoveries",
                        task.url(),
                        found - admitted
                    );
                    break;
                }
            }
        }

        Ok(TaskOutcome::Discovered(admitted))
    }

    async fn process_job(
        &self,
        parser: &dyn SiteParser,
        task: &CrawlTask,
        token: &CancellationToken,
    ) -> Result<TaskOutcome, CrawlError> {
        tracing::debug!(
            "[{}] Fetching job {} at {} ({})",
            parser.name(),
            task.meta("title").unwrap_or("?"),
            task.meta("company").unwrap_or("?"),
            task.url()
        );

        let posting = self
            .downloader
            .fetch(
                task.url(),
                |document| parser.parse_job_description(document, task.url()),
                token,
            )
            .await??;

        let outcome = self.persist(posting)?;
        Ok(TaskOutcome::Stored(outcome))
    }

    fn persist(&self, posting: JobPosting) -> Result<UpsertOutcome, CrawlError> {
        let title = posting.title.clone();
        let company = posting.company.clone();

        let outcome = self
            .with_storage(|storage| upsert_posting(storage, posting, Utc::now()))
            .inspect_err(|e| tracing::error!("Failed to save {} at {}: {}", title, company, e))?;

        tracing::info!("Saved job ({:?}): {} at {}", outcome, title, company);
        Ok(outcome)
    }

    fn with_storage<T>(
        &self,
        f: impl FnOnce(&mut (dyn Storage + Send)) -> Result<T, StorageError>,
    ) -> Result<T, StorageError> {
        let mut guard = self
            .storage
            .lock()
            .map_err(|_| StorageError::LockPoisoned)?;
        f(&mut *guard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UserAgentConfig;
    use crate::sites::{ParseError, PostingSummary};
    use crate::storage::{shared, SqliteStorage};
    use scraper::Html;
    use url::Url;

    struct SearchOnly;

    impl SiteParser for SearchOnly {
        fn name(&self) -> &str {
            "search-only"
        }

        fn matches(&self, url: &str) -> bool {
            url.starts_with("https://jobs.example.com/")
        }

        fn search_url(&self, role: &str) -> Option<Url> {
            let mut url = Url::parse("https://jobs.example.com/search").ok()?;
            url.query_pairs_mut().append_pair("q", role);
            Some(url)
        }

        fn parse_listing(
            &self,
            _document: &Html,
            _cancel: &CancellationToken,
        ) -> Result<Vec<PostingSummary>, ParseError> {
            Ok(Vec::new())
        }

        fn parse_job_description(
            &self,
            _document: &Html,
            _page_url: &str,
        ) -> Result<JobPosting, ParseError> {
            Err(ParseError::MissingField { field: "title" })
        }
    }

    fn dispatcher(registry: ParserRegistry) -> Dispatcher {
        let user_agent = UserAgentConfig {
            crawler_name: "TestCrawler".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: "https://example.com/about".to_string(),
            contact_email: "admin@example.com".to_string(),
        };
        let settings = CrawlSettings {
            max_jobs: 5,
            crawl_budget: Duration::from_secs(60),
            task_timeout: Duration::from_secs(5),
            frontier_capacity: 10,
            progress_interval: Duration::from_secs(5),
            roles: RolesConfig {
                allowed: vec!["devops".to_string(), "data engineer".to_string()],
            },
            config_hash: "test".to_string(),
        };
        Dispatcher::new(
            registry,
            Downloader::from_config(&user_agent).unwrap(),
            shared(SqliteStorage::open_in_memory().unwrap()),
            settings,
        )
    }

    #[test]
    fn test_seed_tasks_skip_unknown_roles() {
        let mut registry = ParserRegistry::new();
        registry.register(SearchOnly);
        let dispatcher = dispatcher(registry);

        let seeds = dispatcher.seed_tasks(&["DevOps", "astronaut", "data engineer"]);

        assert_eq!(seeds.len(), 2);
        assert_eq!(seeds[0].kind(), TaskKind::Listing);
        assert_eq!(seeds[0].url(), "https://jobs.example.com/search?q=devops");
        assert_eq!(seeds[0].meta("role"), Some("devops"));
        assert_eq!(
            seeds[1].url(),
            "https://jobs.example.com/search?q=data+engineer"
        );
    }

    #[tokio::test]
    async fn test_drain_empty_frontier() {
        let dispatcher = dispatcher(ParserRegistry::new());
        let frontier = Frontier::new(4);

        let summary = dispatcher.drain(&frontier, &CancellationToken::new()).await;

        assert_eq!(summary.stop_reason, StopReason::FrontierExhausted);
        assert_eq!(summary.processed, 0);
    }

    #[tokio::test]
    async fn test_drain_skips_unroutable_tasks() {
        let dispatcher = dispatcher(ParserRegistry::new());
        let frontier = Frontier::new(4);
        frontier.add(CrawlTask::job("https://nowhere.example/1")).await;
        frontier.add(CrawlTask::job("https://nowhere.example/2")).await;

        let summary = dispatcher.drain(&frontier, &CancellationToken::new()).await;

        assert_eq!(summary.processed, 2);
        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.stored, 0);
        assert_eq!(frontier.queue_size(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_crawl_stops_before_next_task() {
        let dispatcher = dispatcher(ParserRegistry::new());
        let frontier = Frontier::new(4);
        frontier.add(CrawlTask::job("https://nowhere.example/1")).await;

        let cancel = CancellationToken::new();
        cancel.cancel();
        let summary = dispatcher.drain(&frontier, &cancel).await;

        assert_eq!(summary.stop_reason, StopReason::Cancelled);
        assert_eq!(summary.processed, 0);
        assert_eq!(frontier.queue_size(), 1);
    }

    #[tokio::test]
    async fn test_run_records_crawl_run() {
        let mut registry = ParserRegistry::new();
        registry.register(SearchOnly);
        let dispatcher = dispatcher(registry);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let summary = dispatcher.run(&["devops"], &cancel).await;
        assert_eq!(summary.stop_reason, StopReason::Cancelled);

        let run = dispatcher
            .with_storage(|storage| storage.get_latest_run())
            .unwrap()
            .unwrap();
        assert_eq!(run.roles, vec!["devops".to_string()]);
        assert_eq!(run.status, RunStatus::Cancelled);
        assert_eq!(run.config_hash, "test");
    }
}
