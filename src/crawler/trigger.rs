//! Crawl submission boundary
//!
//! [`CrawlTrigger::submit`] validates the requested roles, starts one
//! dispatcher run as a background tokio task and returns immediately with a
//! [`CrawlHandle`]. Dropping the handle detaches the crawl.

use crate::crawler::dispatcher::{CrawlSummary, Dispatcher};
use crate::CrawlError;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub struct CrawlTrigger {
    dispatcher: Arc<Dispatcher>,
}

impl CrawlTrigger {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
        }
    }

    /// Starts a crawl for the allowed subset of `roles`
    ///
    /// Rejected roles are logged. If none are allowed the crawl is not
    /// started and [`CrawlError::NoValidRoles`] is returned.
    pub fn submit<S: AsRef<str>>(&self, roles: &[S]) -> Result<CrawlHandle, CrawlError> {
        let (accepted, rejected) = self.dispatcher.settings().roles.partition(roles);

        for role in &rejected {
            tracing::error!("{}", CrawlError::RoleNotAllowed(role.clone()));
        }

        if accepted.is_empty() {
            return Err(CrawlError::NoValidRoles);
        }

        let cancel = CancellationToken::new();
        let dispatcher = Arc::clone(&self.dispatcher);
        let roles = accepted.clone();
        let token = cancel.clone();
        let join = tokio::spawn(async move { dispatcher.run(&roles, &token).await });

        tracing::info!("Crawl submitted for roles: {}", accepted.join(", "));

        Ok(CrawlHandle {
            roles: accepted,
            join,
            cancel,
        })
    }
}

/// Handle to one submitted crawl
pub struct CrawlHandle {
    roles: Vec<String>,
    join: JoinHandle<CrawlSummary>,
    cancel: CancellationToken,
}

impl CrawlHandle {
    /// Roles the crawl was started with, canonicalized
    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    /// Asks the crawl to stop before its next task
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Waits for the crawl to end
    pub async fn wait(self) -> Result<CrawlSummary, CrawlError> {
        Ok(self.join.await?)
    }
}
