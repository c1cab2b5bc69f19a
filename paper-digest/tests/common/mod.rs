// Shared fixtures for the integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use paper_digest::ledger::format_timestamp;
use paper_digest::llm_adapter::extract_selected_ids;
use paper_digest::types::{AgentError, Paper, PaperSource, Summarizer, SummaryReport};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init();
    });
}

/// Fixed "now" so date arithmetic in tests is reproducible.
pub fn test_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0)
        .single()
        .expect("valid test timestamp")
}

pub fn days_ago(days: i64) -> String {
    format_timestamp(test_now() - Duration::days(days))
}

pub fn paper(id: &str, published: &str) -> Paper {
    Paper {
        id: id.to_string(),
        title: format!("Paper {}", id),
        authors: vec!["Ada Lovelace".to_string()],
        abstract_text: format!("Abstract of {}", id),
        categories: vec!["cs.CL".to_string()],
        published: published.to_string(),
        updated: published.to_string(),
        source_url: format!("http://arxiv.org/abs/{}v1", id),
        artifact_url: format!("http://arxiv.org/pdf/{}v1.pdf", id),
    }
}

pub fn ids(papers: &[Paper]) -> Vec<&str> {
    papers.iter().map(|p| p.id.as_str()).collect()
}

/// Returns a canned result and remembers every query it was asked.
pub struct FakeSource {
    papers: Vec<Paper>,
    pub queries: Arc<Mutex<Vec<(String, usize)>>>,
}

impl FakeSource {
    pub fn new(papers: Vec<Paper>) -> Self {
        Self {
            papers,
            queries: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl PaperSource for FakeSource {
    fn source_name(&self) -> String {
        "fake".to_string()
    }

    async fn fetch(&self, query: &str, max_results: usize) -> Vec<Paper> {
        self.queries
            .lock()
            .unwrap()
            .push((query.to_string(), max_results));
        self.papers.iter().take(max_results).cloned().collect()
    }
}

/// Writes a report naming `selected` in its marker, or fails like a crashed
/// agent when `fail` is set.
pub struct FakeSummarizer {
    pub report_path: PathBuf,
    pub selected: Vec<String>,
    pub fail: bool,
    pub calls: Arc<AtomicUsize>,
}

impl FakeSummarizer {
    pub fn selecting(report_path: PathBuf, selected: &[&str]) -> Self {
        Self {
            report_path,
            selected: selected.iter().map(|s| s.to_string()).collect(),
            fail: false,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing(report_path: PathBuf) -> Self {
        Self {
            fail: true,
            ..Self::selecting(report_path, &[])
        }
    }
}

#[async_trait]
impl Summarizer for FakeSummarizer {
    fn summarizer_name(&self) -> String {
        "fake-agent".to_string()
    }

    async fn summarize(&self, candidates: &[Paper]) -> Result<SummaryReport, AgentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(AgentError::NonZeroExit {
                code: Some(1),
                stderr: "boom".to_string(),
            });
        }

        let mut report = format!("# Digest\n\n{} candidates reviewed.\n\n", candidates.len());
        for id in &self.selected {
            report.push_str(&format!("## {}\n\nSummary.\n\n", id));
        }
        let marker = serde_json::to_string(&self.selected).unwrap();
        report.push_str(&format!("<!-- SELECTED_PAPERS: {} -->\n", marker));
        std::fs::write(&self.report_path, &report)?;

        Ok(SummaryReport {
            report_path: self.report_path.clone(),
            selected_ids: extract_selected_ids(&report),
        })
    }
}
