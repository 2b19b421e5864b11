use super::EventSource;
use crate::config::ApiSettings;
use crate::error::RoyaltyError;
use crate::model::RawEventSet;
use crate::period::ReportingPeriod;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;

/// Events from the content-management API, authenticated with a bearer JWT.
///
/// The API takes its parameters as a JSON object in the query string:
/// `GET /3/{command}?{"connector":"…","month":"YYMM"}`.
#[derive(Debug, Clone)]
pub struct ApiEventSource {
    base_url: String,
    command: String,
    connector: String,
    jwt: String,
    client: reqwest::Client,
}

impl ApiEventSource {
    pub fn new(settings: &ApiSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            base_url: format!("https://{}:{}", settings.host, settings.port),
            command: settings.command.clone(),
            connector: settings.connector.clone(),
            jwt: settings.jwt.clone(),
            client,
        })
    }

    /// Point the source at a different origin, e.g. a plain-HTTP test server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn request_url(&self, period: &ReportingPeriod) -> String {
        let params = serde_json::json!({
            "connector": self.connector,
            "month": period.code(),
        });
        format!("{}/3/{}?{}", self.base_url, self.command, params)
    }
}

#[async_trait]
impl EventSource for ApiEventSource {
    fn describe(&self) -> String {
        format!("api {}/3/{}", self.base_url, self.command)
    }

    async fn fetch(&self, period: &ReportingPeriod) -> Result<RawEventSet> {
        let url = self.request_url(period);
        tracing::debug!(command = %self.command, period = %period, "requesting events");
        let resp = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.jwt))
            .send()
            .await
            .context("events request failed")?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(RoyaltyError::Source(format!("events API returned {status}: {body}")).into());
        }
        let body = resp.text().await.context("read events response")?;
        if body.trim().is_empty() {
            return Ok(RawEventSet::new());
        }
        serde_json::from_str(&body).context("parse events response")
    }
}
