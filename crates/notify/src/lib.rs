use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use thiserror::Error;
use url::Url;

/// Client for the history microservice that records weekday lookups.
#[derive(Clone)]
pub struct HistoryClient {
    http: Client,
    base_url: Url,
    timeout: Duration,
}

impl HistoryClient {
    /// Creates a new history client with the provided configuration.
    pub fn new(base_url: Url, timeout: Duration, http: Client) -> Self {
        Self {
            http,
            base_url,
            timeout,
        }
    }

    /// Posts a lookup record to `/historique/save`.
    ///
    /// Callers decide what to do with a failure; the client itself neither
    /// retries nor swallows errors.
    pub async fn save_lookup(&self, record: &LookupRecord<'_>) -> Result<(), HistoryError> {
        let url = self.base_url.join("historique/save")?;

        let body = LookupHistoryBody {
            search_date: to_rfc3339(record.searched_at),
            request: format!("Search date: {}", record.date),
            response: format!("Day of week: {}", record.day_of_week),
        };

        let response = self
            .http
            .post(url)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await?;

        ensure_success(response).await
    }
}

/// Details of one lookup to record.
pub struct LookupRecord<'a> {
    pub date: &'a str,
    pub day_of_week: &'a str,
    pub searched_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LookupHistoryBody {
    search_date: String,
    request: String,
    response: String,
}

/// Errors produced by the history client.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("failed to build url: {0}")]
    Url(#[from] url::ParseError),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {status}: {body}")]
    Status { status: StatusCode, body: String },
}

async fn ensure_success(response: Response) -> Result<(), HistoryError> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<unavailable>"));
        return Err(HistoryError::Status { status, body });
    }
    Ok(())
}

fn to_rfc3339(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}
