use serde::{Deserialize, Serialize};
use std::path::PathBuf;
// Boundary types shared with the agent and fetch adapters
pub use interfaces::defs::{AgentError, Paper, PaperSource, Summarizer, SummaryReport};

pub const ARXIV_API_URL: &str = "http://export.arxiv.org/api/query";

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub api_url: String,
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub retry_delay_seconds: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            api_url: ARXIV_API_URL.to_string(),
            user_agent: "Paper-Digest/0.1".to_string(),
            timeout_seconds: 30,
            max_retries: 2,
            retry_delay_seconds: 3,
        }
    }
}

/// One entry to record in the seen ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeenMark {
    pub id: String,
    pub title: String,
}

impl From<&Paper> for SeenMark {
    fn from(paper: &Paper) -> Self {
        Self {
            id: paper.id.clone(),
            title: paper.title.clone(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DigestError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feed parse error: {0}")]
    Parse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Failed to save history to {}: {message}", path.display())]
    LedgerWrite { path: PathBuf, message: String },

    #[error("Summarization failed: {0}")]
    Agent(#[from] AgentError),

    #[error("Render error: {0}")]
    Render(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("General error: {0}")]
    General(String),
}

pub type Result<T> = std::result::Result<T, DigestError>;
