//! HTTP job source
//!
//! Polls a URL for the next program body. The server replies with the body,
//! or with an empty body / `NOJOB` / `NONE` when there is nothing to do.

use std::time::Duration;

use plotkit_core::{is_no_job, Job, JobSource, JobSourceError};

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Blocking HTTP poller.
#[derive(Debug, Clone)]
pub struct HttpJobSource {
    client: reqwest::blocking::Client,
    url: String,
}

impl HttpJobSource {
    pub fn new(url: impl Into<String>) -> Result<Self, JobSourceError> {
        Self::with_timeout(url, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self, JobSourceError> {
        let url = url.into();
        reqwest::Url::parse(&url).map_err(|e| JobSourceError::Malformed {
            reason: format!("invalid job URL '{}': {}", url, e),
        })?;
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| JobSourceError::Unreachable {
                reason: e.to_string(),
            })?;
        Ok(Self { client, url })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Interpret a poll reply body.
pub fn parse_poll_reply(body: &str) -> Option<Job> {
    if is_no_job(body) {
        None
    } else {
        Some(Job::new(body.trim()))
    }
}

impl JobSource for HttpJobSource {
    fn next_job(&mut self) -> Result<Option<Job>, JobSourceError> {
        let unreachable = |e: reqwest::Error| JobSourceError::Unreachable {
            reason: e.to_string(),
        };
        let response = self
            .client
            .get(&self.url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(unreachable)?;
        let body = response.text().map_err(unreachable)?;
        let job = parse_poll_reply(&body);
        if job.is_some() {
            tracing::info!("Fetched job from {} ({} bytes)", self.url, body.len());
        }
        Ok(job)
    }
}
