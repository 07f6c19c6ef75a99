use crate::error::{AppError, AppResult};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub timeout: Duration,
    /// Delay before attempt `n + 1` is `backoff_step * n`.
    pub backoff_step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            timeout: Duration::from_secs(10),
            backoff_step: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff_step * attempt
    }
}

/// GET-style fetch with a per-attempt timeout and linear backoff.
///
/// `build` is called once per attempt since a `RequestBuilder` is consumed on send.
/// Non-2xx responses count as failures; the last error is returned.
/// `upstream` names the remote side in error messages.
pub async fn fetch_json_with_retry<T, F>(
    client: &Client,
    upstream: &str,
    policy: RetryPolicy,
    build: F,
) -> AppResult<T>
where
    T: DeserializeOwned,
    F: Fn(&Client) -> RequestBuilder,
{
    let attempts = policy.attempts.max(1);
    let mut last_error = AppError::ExternalApiError("no attempt made".to_string());

    for attempt in 1..=attempts {
        let result: AppResult<T> = async {
            let response = build(client).timeout(policy.timeout).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(AppError::ExternalApiError(format!(
                    "{upstream} returned status {}",
                    status.as_u16()
                )));
            }
            Ok(response.json::<T>().await?)
        }
        .await;

        match result {
            Ok(value) => return Ok(value),
            Err(e) => {
                log::warn!("{upstream} attempt {attempt}/{attempts} failed: {e}");
                last_error = e;
                if attempt < attempts {
                    tokio::time::sleep(policy.delay_after(attempt)).await;
                }
            }
        }
    }

    Err(last_error)
}
