//! Client for the universal lookup API.

use std::time::Duration;

use reqwest::StatusCode;
use tracing::{error, info, warn};

use crate::config::ApiSettings;
use crate::error::LookupError;
use crate::format::format_response;
use crate::models::{SearchRequest, SearchResponse};

/// Issues one search per call against the configured endpoint.
#[derive(Debug, Clone)]
pub struct LookupClient {
    http_client: reqwest::Client,
    settings: ApiSettings,
    timeout: Duration,
}

impl LookupClient {
    /// Create a new lookup client.
    pub fn new(http_client: reqwest::Client, settings: ApiSettings, timeout: Duration) -> Self {
        Self {
            http_client,
            settings,
            timeout,
        }
    }

    /// Settings this client reads on every call.
    pub fn settings(&self) -> &ApiSettings {
        &self.settings
    }

    /// Run a search and return the parsed body.
    pub async fn search(&self, query: &str) -> Result<SearchResponse, LookupError> {
        let creds = self.settings.snapshot().await;
        if !creds.is_configured() {
            return Err(LookupError::NotConfigured);
        }

        let response = self
            .http_client
            .post(&creds.api_url)
            .bearer_auth(creds.api_key.trim())
            .json(&SearchRequest::new(query))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| LookupError::from_transport(&e))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(LookupError::from_status(status.as_u16()));
        }

        response
            .json::<SearchResponse>()
            .await
            .map_err(|e| LookupError::from_transport(&e))
    }

    /// Run a search and render the outcome as chat text.
    pub async fn lookup(&self, query: &str) -> String {
        match self.search(query).await {
            Ok(response) => {
                info!("Lookup returned {} results", response.entries().len());
                format_response(&response, query)
            }
            Err(e) => {
                match &e {
                    LookupError::Unexpected(detail) => error!("API call error: {}", detail),
                    LookupError::NotConfigured => info!("Lookup skipped: API key not configured"),
                    other => warn!("Lookup failed: {}", other),
                }
                e.user_message()
            }
        }
    }
}
