use log::{debug, info};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use url::Url;

use crate::config::FetchSettings;
use crate::dataset::{Dataset, Row};
use crate::error::{AnalysisError, FetchError, Result};

/// Client for the repository listing endpoint of a GitHub-style API.
pub struct GitHubClient {
    /// HTTP client
    client: reqwest::Client,
    /// Where the listing lives
    settings: FetchSettings,
}

impl GitHubClient {
    /// Create a new client for the configured listing.
    ///
    /// The client sends a user agent (GitHub rejects requests without one)
    /// and applies the configured request timeout.
    pub fn new(settings: FetchSettings) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("repolens/", env!("CARGO_PKG_VERSION"))),
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(settings.timeout)
            .build()
            .map_err(|e| AnalysisError::DataLoad {
                url: settings.request_url(),
                source: e.into(),
            })?;

        Ok(Self { client, settings })
    }

    /// Fetch the repository listing with a single GET.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::DataLoad`] if the URL is invalid, the request
    /// fails, the status is not a success, or the body is not a JSON array of
    /// objects.
    pub async fn fetch_repositories(&self) -> Result<Dataset> {
        let url = self.settings.request_url();
        info!("Fetching repositories from {url}");

        match self.fetch_rows(&url).await {
            Ok(rows) => {
                info!("Fetched {} repositories", rows.len());
                Ok(Dataset::new(rows, url))
            }
            Err(source) => Err(AnalysisError::DataLoad { url, source }),
        }
    }

    async fn fetch_rows(&self, url: &str) -> std::result::Result<Vec<Row>, FetchError> {
        let url = Url::parse(url)?;

        let response = self.client.get(url).send().await?;

        let status = response.status();
        debug!("Repository listing responded with status {status}");
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}
