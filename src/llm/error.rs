use thiserror::Error;

/// Failure taxonomy for one completion request.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("the completion endpoint rejected the API key (HTTP 401)")]
    InvalidCredentials,

    #[error("the completion endpoint rate limit was still hit after all retries")]
    RateLimitExceeded,

    #[error("the completion endpoint returned HTTP {0}")]
    UpstreamError(u16),

    #[error("the completion response did not contain any generated text")]
    MalformedResponse,

    #[error("failed to reach the completion endpoint")]
    Network(#[from] reqwest::Error),
}
