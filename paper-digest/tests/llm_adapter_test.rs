mod common;

use chrono::{Local, TimeZone};
use common::*;
use paper_digest::config::{parse_config, AppConfig};
use paper_digest::types::{AgentError, Summarizer};
use paper_digest::ClaudeCliSummarizer;
use std::path::Path;
use tempfile::TempDir;

fn config_in(dir: &Path, command: &str) -> AppConfig {
    let yaml = format!(
        "interests:\n  categories: [cs.CL]\n  keywords: [retrieval, large language model]\n\
         authors: [Ada Lovelace]\n\
         selection:\n  num_papers: 3\n\
         summary:\n  command: {}\n  timeout_secs: 20\n",
        command
    );
    parse_config(&yaml, dir.to_path_buf()).unwrap()
}

fn local_day() -> chrono::DateTime<Local> {
    Local.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap()
}

#[test]
fn prompt_carries_paths_and_interests() {
    let dir = TempDir::new().unwrap();
    let config = config_in(dir.path(), "claude");
    let summarizer = ClaudeCliSummarizer::from_config(&config, local_day()).unwrap();
    let prompt = summarizer.build_prompt();

    assert!(prompt.contains("January 15, 2024"));
    assert!(prompt.contains("Pick the 3 papers"));
    assert!(prompt.contains("- **Fields (arXiv categories)**: cs.CL"));
    assert!(prompt.contains("- **Authors of interest**: Ada Lovelace"));
    assert!(prompt.contains("retrieval, large language model"));
    assert!(prompt.contains(&summarizer.candidates_path().display().to_string()));
    assert!(prompt.contains(&summarizer.report_path().display().to_string()));
    assert!(!prompt.contains("{num_papers}"));
}

#[test]
fn custom_template_is_used_and_missing_one_is_an_error() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("mine.md"), "Only {num_papers} for {date}").unwrap();

    let mut config = config_in(dir.path(), "claude");
    config.summary.prompt_template = Some("mine.md".to_string());
    let summarizer = ClaudeCliSummarizer::from_config(&config, local_day()).unwrap();
    assert_eq!(summarizer.build_prompt(), "Only 3 for January 15, 2024");

    config.summary.prompt_template = Some("absent.md".to_string());
    assert!(ClaudeCliSummarizer::from_config(&config, local_day()).is_err());
}

#[tokio::test]
async fn unknown_command_is_a_launch_error() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let config = config_in(dir.path(), "definitely-not-an-agent-binary");
    let summarizer = ClaudeCliSummarizer::from_config(&config, local_day()).unwrap();

    let err = summarizer
        .summarize(&[paper("2401.00001", &days_ago(1))])
        .await
        .unwrap_err();
    assert!(matches!(err, AgentError::Launch { .. }));
}

#[cfg(unix)]
#[tokio::test]
async fn failing_command_is_a_non_zero_exit() {
    let dir = TempDir::new().unwrap();
    let config = config_in(dir.path(), "false");
    let summarizer = ClaudeCliSummarizer::from_config(&config, local_day()).unwrap();

    let err = summarizer
        .summarize(&[paper("2401.00001", &days_ago(1))])
        .await
        .unwrap_err();
    assert!(matches!(err, AgentError::NonZeroExit { code: Some(1), .. }));
}

#[cfg(unix)]
#[tokio::test]
async fn silent_agent_is_missing_output() {
    let dir = TempDir::new().unwrap();
    let config = config_in(dir.path(), "true");
    let summarizer = ClaudeCliSummarizer::from_config(&config, local_day()).unwrap();

    let err = summarizer
        .summarize(&[paper("2401.00001", &days_ago(1)), paper("2401.00002", &days_ago(2))])
        .await
        .unwrap_err();
    assert!(matches!(err, AgentError::MissingOutput { .. }));

    let handoff: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(summarizer.candidates_path()).unwrap()).unwrap();
    assert_eq!(handoff.as_array().unwrap().len(), 2);
    assert_eq!(handoff[0]["arxiv_id"], "2401.00001");
    assert!(config.work_dir().join("prompt.md").exists());
}
