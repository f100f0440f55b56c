use thiserror::Error;

/// Failures talking to a chat-completion provider.
///
/// None of these are retried; the orchestration loop surfaces them to the
/// caller as a failed run.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ModelError {
    /// The request never produced an HTTP response.
    #[error("network: {0}")]
    Network(String),

    /// The provider answered 429.
    #[error("rate limited by {provider}")]
    RateLimited { provider: &'static str },

    /// The provider answered with a non-success status.
    #[error("provider api: {0}")]
    Api(String),

    /// The response body did not match the provider's documented shape.
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}
