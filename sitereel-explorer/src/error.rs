use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExploreError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Browser evaluation failed: {0}")]
    Evaluation(String),

    #[error("Not supported by this browser: {0}")]
    Unsupported(&'static str),

    #[error("No page loaded")]
    NoPage,

    #[error("Timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Start URL unreachable: {url}: {reason}")]
    StartUnreachable { url: String, reason: String },

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Graph error: {0}")]
    Graph(#[from] sitereel_core::GraphError),

    #[error("Other error: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, ExploreError>;
