use std::time::Duration;

use log::warn;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use super::error::CompletionError;
use super::secrets::ApiKey;

pub const OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1";

const REFERER: &str = env!("CARGO_PKG_HOMEPAGE");
const APP_TITLE: &str = env!("CARGO_PKG_NAME");
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Bounded retry schedule for rate-limited requests: the nth retry waits
/// `base_delay * 2^n`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.pow(attempt)
    }
}

/// Client for the OpenRouter chat-completions endpoint.
///
/// Holds the session credential and owns the rate-limit retry policy. Each
/// retry is a fresh request; the upstream service may bill retried attempts
/// independently.
pub struct CompletionClient {
    http: reqwest::Client,
    base_url: String,
    api_key: ApiKey,
    retry: RetryPolicy,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

impl CompletionClient {
    pub fn new(api_key: ApiKey) -> Result<Self, CompletionError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: OPENROUTER_API_URL.to_string(),
            api_key,
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Request one completion for a system instruction and a user prompt,
    /// returning the first choice's text.
    ///
    /// 429 responses are retried up to `RetryPolicy::max_retries` times with
    /// exponential backoff; 401 and every other non-2xx status fail without
    /// a retry.
    pub async fn complete(
        &self,
        model: &str,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, CompletionError> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let body = ChatRequest {
            model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
        };

        let mut attempt = 0u32;
        loop {
            let response = self
                .http
                .post(&url)
                .bearer_auth(self.api_key.reveal())
                .header("HTTP-Referer", REFERER)
                .header("X-Title", APP_TITLE)
                .json(&body)
                .send()
                .await?;

            match response.status() {
                StatusCode::TOO_MANY_REQUESTS => {
                    if attempt >= self.retry.max_retries {
                        return Err(CompletionError::RateLimitExceeded);
                    }
                    let delay = self.retry.delay(attempt);
                    warn!(
                        "rate limited, waiting {:.1}s before retry {} of {}",
                        delay.as_secs_f64(),
                        attempt + 1,
                        self.retry.max_retries
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                StatusCode::UNAUTHORIZED => return Err(CompletionError::InvalidCredentials),
                status if !status.is_success() => {
                    return Err(CompletionError::UpstreamError(status.as_u16()));
                }
                _ => return extract_completion_text(response).await,
            }
        }
    }
}

async fn extract_completion_text(
    response: reqwest::Response,
) -> Result<String, CompletionError> {
    let raw = response.text().await?;
    let parsed: ChatResponse =
        serde_json::from_str(&raw).map_err(|_| CompletionError::MalformedResponse)?;
    let content = parsed
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or(CompletionError::MalformedResponse)?;

    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(CompletionError::MalformedResponse);
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Instant;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(server: &MockServer) -> CompletionClient {
        CompletionClient::new(ApiKey::new("test-key"))
            .unwrap()
            .with_base_url(server.uri())
            .with_retry_policy(RetryPolicy {
                max_retries: 3,
                base_delay: Duration::from_millis(25),
            })
    }

    fn completion_body(text: &str) -> serde_json::Value {
        json!({
            "choices": [
                { "message": { "role": "assistant", "content": text } }
            ]
        })
    }

    #[test]
    fn default_policy_backs_off_one_two_four_seconds() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.delay(0), Duration::from_secs(1));
        assert_eq!(policy.delay(1), Duration::from_secs(2));
        assert_eq!(policy.delay(2), Duration::from_secs(4));
    }

    #[tokio::test]
    async fn success_extracts_the_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer test-key"))
            .and(header("X-Title", APP_TITLE))
            .and(body_partial_json(json!({
                "model": "test-model",
                "messages": [
                    { "role": "system", "content": "be brief" },
                    { "role": "user", "content": "hello" }
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [
                    { "message": { "role": "assistant", "content": "  第一個回應  " } },
                    { "message": { "role": "assistant", "content": "第二個回應" } }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let text = client.complete("test-model", "be brief", "hello").await.unwrap();
        assert_eq!(text, "第一個回應");
    }

    #[tokio::test]
    async fn three_rate_limits_then_success_backs_off_and_returns() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(3)
            .expect(3)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("成功")))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let started = Instant::now();
        let text = client.complete("test-model", "sys", "user").await.unwrap();
        let elapsed = started.elapsed();

        assert_eq!(text, "成功");
        // 25ms + 50ms + 100ms of backoff, with scheduling jitter on top.
        assert!(elapsed >= Duration::from_millis(175), "elapsed {elapsed:?}");
        assert!(elapsed < Duration::from_secs(3), "elapsed {elapsed:?}");
    }

    #[tokio::test]
    async fn a_fourth_rate_limit_exhausts_the_retries() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429))
            .expect(4)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let err = client.complete("test-model", "sys", "user").await.unwrap_err();
        assert!(matches!(err, CompletionError::RateLimitExceeded));
    }

    #[tokio::test]
    async fn unauthorized_fails_immediately_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let started = Instant::now();
        let err = client.complete("test-model", "sys", "user").await.unwrap_err();

        assert!(matches!(err, CompletionError::InvalidCredentials));
        assert!(started.elapsed() < Duration::from_millis(500));
    }

    #[tokio::test]
    async fn other_statuses_are_upstream_errors_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let err = client.complete("test-model", "sys", "user").await.unwrap_err();
        assert!(matches!(err, CompletionError::UpstreamError(503)));
    }

    #[tokio::test]
    async fn empty_choices_are_a_malformed_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let err = client.complete("test-model", "sys", "user").await.unwrap_err();
        assert!(matches!(err, CompletionError::MalformedResponse));
    }

    #[tokio::test]
    async fn unexpected_body_shape_is_a_malformed_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "cmpl-1" })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let err = client.complete("test-model", "sys", "user").await.unwrap_err();
        assert!(matches!(err, CompletionError::MalformedResponse));
    }

    #[tokio::test]
    async fn blank_completion_text_is_a_malformed_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("   ")))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let err = client.complete("test-model", "sys", "user").await.unwrap_err();
        assert!(matches!(err, CompletionError::MalformedResponse));
    }
}
