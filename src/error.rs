use thiserror::Error;

/// Errors that can occur when fetching or parsing podcast feeds
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Empty XML feed. Please provide valid XML content.")]
    EmptyInput,

    #[error("Failed to fetch the feed. Please check the URL and try again.")]
    FetchFailed,

    /// Network-level failure, passed through as reqwest reported it
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    #[error("Malformed XML: {0}")]
    MalformedXml(String),
}

impl FeedError {
    /// Whether the error came from the network rather than from the feed content
    pub fn is_network(&self) -> bool {
        matches!(self, FeedError::FetchFailed | FeedError::Transport(_))
    }
}
