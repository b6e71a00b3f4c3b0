//! Cancellable page downloader
//!
//! The network fetch runs on its own tokio task and settles a
//! [`Completion`]. The caller waits for that completion or for its
//! cancellation token, whichever comes first. A cancelled fetch is
//! abandoned: the spawned task may still finish, but nobody reads its result.

use crate::config::UserAgentConfig;
use crate::crawler::completion::Completion;
use reqwest::Client;
use scraper::Html;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Ways a single fetch can fail
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("timed out fetching {url}")]
    Timeout { url: String },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("network error fetching {url}: {message}")]
    Network { url: String, message: String },

    #[error("fetch of {url} ended without a result")]
    Abandoned { url: String },
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

#[derive(Debug, Clone)]
pub struct Downloader {
    client: Client,
}

impl Downloader {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_config(config: &UserAgentConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(config)?))
    }

    /// Fetches `url` and hands the parsed document to `on_document`
    ///
    /// `on_document` runs at most once, synchronously, after the body has
    /// arrived. If `cancel` fires first the fetch is abandoned and
    /// [`FetchError::Timeout`] is returned.
    pub async fn fetch<F, T>(
        &self,
        url: &str,
        on_document: F,
        cancel: &CancellationToken,
    ) -> Result<T, FetchError>
    where
        F: FnOnce(&Html) -> T,
    {
        let (completion, receiver) = Completion::channel();
        let client = self.client.clone();
        let target = url.to_string();

        tokio::spawn(async move {
            let result = fetch_body(&client, &target).await;
            completion.complete(result);
        });

        let body = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!("Abandoning fetch of {}", url);
                return Err(FetchError::Timeout { url: url.to_string() });
            }
            settled = receiver => match settled {
                Ok(result) => result?,
                Err(_) => return Err(FetchError::Abandoned { url: url.to_string() }),
            },
        };

        let document = Html::parse_document(&body);
        Ok(on_document(&document))
    }
}

async fn fetch_body(client: &Client, url: &str) -> Result<String, FetchError> {
    let network = |e: reqwest::Error| FetchError::Network {
        url: url.to_string(),
        message: e.to_string(),
    };

    let response = client.get(url).send().await.map_err(network)?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    response.text().await.map_err(network)
}
