use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExploreError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP error {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Failed to parse response: {0}")]
    JsonParse(String),

    #[error("Rate limited by {provider}, retry after {retry_after_seconds}s")]
    RateLimited {
        provider: String,
        retry_after_seconds: u64,
    },

    #[error("Remote API error: {0}")]
    RemoteApi(String),

    #[error("Request queue closed: {0}")]
    QueueClosed(String),

    #[error("Queued operation panicked on {0}")]
    OperationPanicked(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bridge error: {0}")]
    Bridge(#[from] bridge_traits::BridgeError),

    #[error("Runtime error: {0}")]
    Runtime(#[from] core_runtime::Error),
}

pub type Result<T> = std::result::Result<T, ExploreError>;
