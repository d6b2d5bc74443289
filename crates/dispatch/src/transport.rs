use super::Target;
use std::time::Duration;

/// Errors reported by the platform transport.
#[derive(Debug, Clone)]
pub enum TransportError {
    /// Platform rate limit with a retry-after hint.
    RetryAfter(Duration),
    /// Anything unrecoverable: the job will be dropped, not retried.
    Failed(String),
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RetryAfter(d) => write!(f, "rate limited, retry after {:?}", d),
            Self::Failed(s) => write!(f, "transport failure: {}", s),
        }
    }
}

impl std::error::Error for TransportError {}

/// Trait for the platform's edit-surface primitive.
/// Implementations can be an HTTP bot API client, a websocket bridge, or a
/// test double recording sends.
///
/// The dispatcher is the only component allowed to call this: every other
/// piece of the system renders by enqueueing, never by editing directly.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Replace the content of one editable surface.
    async fn edit(&self, target: &Target, payload: &str) -> Result<(), TransportError>;
}
