//! Crawler module: fetching, dispatch and submission
//!
//! This module contains the core crawling logic, including:
//! - A cancellable downloader that fetches on a separate task
//! - Per-task cancellation scopes with a deadline
//! - The dispatch loop that drains a frontier into storage
//! - The trigger that starts crawls in the background

mod completion;
mod dispatcher;
mod downloader;
mod scope;
mod trigger;

pub use completion::Completion;
pub use dispatcher::{CrawlSettings, CrawlSummary, Dispatcher, StopReason};
pub use downloader::{build_http_client, Downloader, FetchError};
pub use scope::TaskScope;
pub use trigger::{CrawlHandle, CrawlTrigger};
