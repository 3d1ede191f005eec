//! Read retries for idempotent Azure DevOps GETs.
//!
//! Azure DevOps throttles heavy callers with `429 Too Many Requests` and
//! answers `503 Service Unavailable` during deployments, both usually with a
//! `Retry-After` header. A read is retried on those statuses and on transport
//! failures. Any other response goes back to the caller untouched. Writes
//! (repository creation, pushes) never go through here: a repeated push
//! after a lost response would be rejected as a conflict.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::RETRY_AFTER;
use reqwest::{Response, StatusCode};
use url::Url;

/// Retry schedule for reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ReadRetry {
    /// Retries after the initial request.
    pub(crate) max_retries: u32,
    /// First backoff step; doubles per retry when the server gives no hint.
    pub(crate) base_delay: Duration,
    /// Upper bound on any single wait, including server-requested ones.
    pub(crate) max_delay: Duration,
}

impl Default for ReadRetry {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(10),
        }
    }
}

/// Statuses Azure DevOps uses for "slow down, then try again".
fn is_throttled(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::SERVICE_UNAVAILABLE
}

/// Wait requested by a `Retry-After` header: delta-seconds or an HTTP date.
fn retry_after(resp: &Response, now: DateTime<Utc>) -> Option<Duration> {
    let raw = resp.headers().get(RETRY_AFTER)?.to_str().ok()?.trim();
    parse_retry_after(raw, now)
}

fn parse_retry_after(raw: &str, now: DateTime<Utc>) -> Option<Duration> {
    if let Ok(secs) = raw.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    let at = DateTime::parse_from_rfc2822(raw).ok()?.with_timezone(&Utc);
    Some((at - now).to_std().unwrap_or(Duration::ZERO))
}

impl ReadRetry {
    fn backoff(&self, retry: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(retry))
    }

    /// `GET url`, retrying throttling responses and transport errors.
    ///
    /// Returns the last response or error once retries are exhausted.
    pub(crate) async fn get(
        &self,
        http: &reqwest::Client,
        url: &Url,
        endpoint: &str,
    ) -> Result<Response, reqwest::Error> {
        let mut retry = 0;
        loop {
            let outcome = http.get(url.clone()).send().await;
            let wait = match &outcome {
                Ok(resp) if is_throttled(resp.status()) => Some((
                    retry_after(resp, Utc::now()).unwrap_or_else(|| self.backoff(retry)),
                    resp.status().to_string(),
                )),
                Ok(_) => None,
                Err(e) => Some((self.backoff(retry), e.to_string())),
            };
            let Some((delay, reason)) = wait else {
                return outcome;
            };
            if retry >= self.max_retries {
                return outcome;
            }
            let delay = delay.min(self.max_delay);
            retry += 1;
            tracing::warn!(
                endpoint,
                retry,
                max_retries = self.max_retries,
                "Azure DevOps read not served ({reason}), retrying in {delay:?}"
            );
            tokio::time::sleep(delay).await;
        }
    }
}
