use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A catalog paper as handed between the fetcher, the selection pipeline and
/// the summarization agent.
///
/// `id` carries no revision suffix: every revision of a paper shares it.
/// Serialized field names are the ones the agent prompt refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paper {
    #[serde(rename = "arxiv_id")]
    pub id: String,
    pub title: String,
    pub authors: Vec<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub categories: Vec<String>,
    pub published: String,
    pub updated: String,
    #[serde(rename = "arxiv_url")]
    pub source_url: String,
    #[serde(rename = "pdf_url")]
    pub artifact_url: String,
}

/// Anything that can answer a catalog query with papers.
///
/// Implementations swallow their own failures: a transport or parse error is
/// logged by the implementation and reported as an empty result.
#[async_trait]
pub trait PaperSource: Send + Sync {
    fn source_name(&self) -> String;

    async fn fetch(&self, query: &str, max_results: usize) -> Vec<Paper>;
}

/// What a successful agent run leaves behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryReport {
    /// Markdown report written by the agent.
    pub report_path: PathBuf,
    /// Identifiers the agent says it summarized. Empty when the report has no
    /// selection marker.
    pub selected_ids: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("failed to launch agent `{command}`: {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("agent timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("agent exited with {code:?}: {stderr}")]
    NonZeroExit { code: Option<i32>, stderr: String },

    #[error("agent produced no report at {}", path.display())]
    MissingOutput { path: PathBuf },

    #[error("agent I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The external summarization agent: picks papers from the candidates, writes
/// a report and says which ones it picked.
#[async_trait]
pub trait Summarizer: Send + Sync {
    fn summarizer_name(&self) -> String;

    async fn summarize(&self, candidates: &[Paper]) -> Result<SummaryReport, AgentError>;
}
