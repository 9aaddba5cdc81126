use std::{ops::Deref, time::Duration};

use bytes::Bytes;
use reqwest::{Client, ClientBuilder, IntoUrl};

use crate::error::{SegGenError, SegGenResult};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new(builder: ClientBuilder) -> SegGenResult<Self> {
        let client = builder.build()?;
        Ok(Self { client })
    }

    /// Client with a per-request timeout and a browser-like user agent.
    pub fn with_timeout(timeout: Duration) -> SegGenResult<Self> {
        Self::new(
            Client::builder()
                .timeout(timeout)
                .user_agent(fake_user_agent::get_chrome_rua()),
        )
    }

    /// Fetches `url`, trying at most `attempts` times.
    ///
    /// Non-success statuses are reported as [SegGenError::HttpError], transport failures and
    /// timeouts as [SegGenError::RequestError]. The error of the last attempt is returned.
    pub async fn fetch(&self, url: impl IntoUrl, attempts: u32) -> SegGenResult<Bytes> {
        let url = url.into_url()?;
        let attempts = attempts.max(1);

        let mut attempt = 1;
        loop {
            match self.fetch_once(url.clone()).await {
                Ok(bytes) => return Ok(bytes),
                Err(error) if attempt < attempts => {
                    tracing::warn!("Failed to fetch {url} (attempt {attempt}/{attempts}): {error}");
                    tokio::time::sleep(Duration::from_millis(200 * attempt as u64)).await;
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }

    async fn fetch_once(&self, url: reqwest::Url) -> SegGenResult<Bytes> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(SegGenError::HttpError(response.status()));
        }
        Ok(response.bytes().await?)
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT).unwrap_or_else(|error| {
            tracing::warn!("Failed to build http client, using defaults: {error}");
            Self {
                client: Client::new(),
            }
        })
    }
}

impl Deref for HttpClient {
    type Target = Client;

    fn deref(&self) -> &Self::Target {
        &self.client
    }
}
