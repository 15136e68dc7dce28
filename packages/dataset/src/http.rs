//! [`ScoreSource`] backed by the EcoPulse HTTP API.

use std::time::Duration;

use async_trait::async_trait;
use ecopulse_score_models::{Dataset, YearlyScores};
use ecopulse_server_models::DatasetPayload;

use crate::{FetchError, ScoreSource, retry};

/// Per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches scores from a running EcoPulse server.
pub struct HttpScoreSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpScoreSource {
    /// Creates a source for the server at `base_url`
    /// (e.g. `http://127.0.0.1:8080`).
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the HTTP client cannot be built.
    pub fn new(base_url: &str) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Returns the server base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

#[async_trait]
impl ScoreSource for HttpScoreSource {
    fn name(&self) -> &str {
        &self.base_url
    }

    async fn fetch_year(&self, year: i32) -> Result<Dataset, FetchError> {
        let url = self.url(&format!("/api/scores/{year}"));
        let body = retry::send_json(|| self.client.get(&url)).await?;
        let payload: DatasetPayload = serde_json::from_value(body)?;
        let dataset = payload.into_dataset();
        // The server answers unknown years with an empty payload.
        if dataset.city_count() == 0 {
            return Err(FetchError::NotFound { year });
        }
        Ok(dataset)
    }

    async fn fetch_yearly(&self) -> Result<YearlyScores, FetchError> {
        let url = self.url("/api/scores/yearly");
        let body = retry::send_json(|| self.client.get(&url)).await?;
        Ok(serde_json::from_value(body)?)
    }
}
