//! Helpers shared by the HTTP-backed LLM providers.

use std::time::Duration;

use serde_json::Value;

use crate::llms::base_llm::LLMError;

/// Initial delay before the first retry; doubled on every attempt.
const INITIAL_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Maximum number of response-body bytes quoted in error messages.
const ERROR_BODY_PREVIEW: usize = 500;

/// POST `body` as JSON to `endpoint` and return the parsed JSON response.
///
/// Transport failures, 429 and 5xx responses are retried up to
/// `max_retries` times with exponential backoff. Other 4xx responses fail
/// immediately.
pub async fn post_json_with_retry(
    client: &reqwest::Client,
    endpoint: &str,
    bearer_token: Option<&str>,
    body: &Value,
    max_retries: u32,
    provider: &str,
) -> Result<Value, LLMError> {
    let mut last_error: Option<LLMError> = None;
    let mut retry_delay = INITIAL_RETRY_DELAY;

    for attempt in 0..=max_retries {
        if attempt > 0 {
            log::warn!(
                "{} API retry attempt {} after {:?}",
                provider,
                attempt,
                retry_delay
            );
            tokio::time::sleep(retry_delay).await;
            retry_delay *= 2;
        }

        let mut request = client.post(endpoint).json(body);
        if let Some(token) = bearer_token {
            request = request.bearer_auth(token);
        }

        let response = match request.send().await {
            Ok(resp) => resp,
            Err(e) => {
                last_error = Some(LLMError::Http(e));
                continue;
            }
        };

        let status = response.status();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                last_error = Some(LLMError::Http(e));
                continue;
            }
        };

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            last_error = Some(LLMError::Api {
                status: status.as_u16(),
                message: preview(&text),
            });
            continue;
        }

        if !status.is_success() {
            return Err(LLMError::Api {
                status: status.as_u16(),
                message: preview(&text),
            });
        }

        return Ok(serde_json::from_str(&text)?);
    }

    Err(last_error.unwrap_or_else(|| {
        LLMError::Other(format!("{} API call failed after all retries", provider))
    }))
}

fn preview(text: &str) -> String {
    if text.len() <= ERROR_BODY_PREVIEW {
        return text.to_string();
    }
    let mut end = ERROR_BODY_PREVIEW;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}
