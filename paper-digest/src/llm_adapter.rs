//! Adapter for the external summarization agent.
//!
//! The agent is a CLI run in print mode. It reads the candidate list from a
//! JSON file, writes a Markdown report and names the papers it picked in a
//! selection marker inside that report.
//!
//! # Selection marker, version 1
//!
//! ```text
//! marker     := "<!--" ws "SELECTED_PAPERS" [ "@v" digits ] ws ":" ws json-array ws "-->"
//! json-array := a JSON array of strings
//! ```
//!
//! A marker without a version is version 1. Only the first marker counts. A
//! missing marker, an unknown version or a payload that is not an array of
//! strings all mean "nothing selected".

use crate::config::AppConfig;
use crate::parser::normalize_id;
use crate::types::{AgentError, DigestError, Paper, Result, Summarizer, SummaryReport};
use async_trait::async_trait;
use chrono::{DateTime, Local};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::OnceLock;
use std::time::{Duration, SystemTime};
use tokio::process::Command;
use tracing::{debug, info, warn};

pub const MARKER_VERSION: u32 = 1;

const DEFAULT_PROMPT_TEMPLATE: &str = include_str!("../prompts/select_and_summarize.md");
const CANDIDATES_FILE: &str = "candidates.json";
const PROMPT_FILE: &str = "prompt.md";

fn marker_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?s)<!--\s*SELECTED_PAPERS(.*?)-->").expect("selection marker pattern is valid")
    })
}

fn marker_body_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?s)\A(?:@v(\d+))?\s*:\s*(.*?)\s*\z").expect("marker body pattern is valid")
    })
}

/// Identifiers named by the report's selection marker, normalized and
/// de-duplicated in marker order.
///
/// Only the first `SELECTED_PAPERS` comment is considered. If that one is
/// malformed, nothing is selected even when a later marker would parse.
pub fn extract_selected_ids(report: &str) -> Vec<String> {
    let Some(marker) = marker_pattern().captures(report) else {
        debug!("No selection marker in report");
        return Vec::new();
    };
    let body = marker.get(1).map(|m| m.as_str()).unwrap_or_default();

    let Some(captures) = marker_body_pattern().captures(body) else {
        warn!("Malformed selection marker: {:?}", body.trim());
        return Vec::new();
    };

    if let Some(version) = captures.get(1) {
        match version.as_str().parse::<u32>() {
            Ok(MARKER_VERSION) => {}
            _ => {
                warn!("Unsupported selection marker version: v{}", version.as_str());
                return Vec::new();
            }
        }
    }

    let payload = captures.get(2).map(|m| m.as_str()).unwrap_or_default();
    let raw_ids: Vec<String> = match serde_json::from_str(payload) {
        Ok(ids) => ids,
        Err(e) => {
            warn!("Malformed selection marker payload: {}", e);
            return Vec::new();
        }
    };

    let mut ids: Vec<String> = Vec::with_capacity(raw_ids.len());
    for raw in raw_ids {
        let id = normalize_id(&raw);
        if !id.is_empty() && !ids.contains(&id) {
            ids.push(id);
        }
    }
    ids
}

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{([a-z_]+)\}").expect("placeholder pattern is valid"))
}

/// Replaces `{name}` placeholders in one pass. Unknown names are left as is.
pub fn render_template(template: &str, values: &[(&str, String)]) -> String {
    placeholder_pattern()
        .replace_all(template, |caps: &regex::Captures| {
            let name = &caps[1];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.clone())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Prompt inputs taken from the configuration.
#[derive(Debug, Clone)]
pub struct PromptContext {
    pub interests_section: String,
    pub interests_keywords: String,
    pub num_papers: usize,
    pub style: String,
    pub date: String,
}

impl PromptContext {
    pub fn from_config(config: &AppConfig, now: DateTime<Local>) -> Self {
        let interests = config.interests.clone().unwrap_or_default();
        let mut lines = Vec::new();

        if !interests.categories.is_empty() {
            lines.push(format!(
                "- **Fields (arXiv categories)**: {}",
                interests.categories.join(", ")
            ));
        }
        if !interests.keywords.is_empty() {
            lines.push(format!("- **Keywords**: {}", interests.keywords.join(", ")));
        }
        if !config.venues.conferences.is_empty() {
            lines.push(format!(
                "- **Conferences of interest**: {}",
                config.venues.conferences.join(", ")
            ));
        }
        if !config.venues.journals.is_empty() {
            lines.push(format!(
                "- **Journals of interest**: {}",
                config.venues.journals.join(", ")
            ));
        }
        if !config.authors.is_empty() {
            lines.push(format!("- **Authors of interest**: {}", config.authors.join(", ")));
        }

        let interests_section = if lines.is_empty() {
            "- No particular constraints".to_string()
        } else {
            lines.join("\n")
        };

        let interests_keywords = if interests.keywords.is_empty() {
            "the reader's research interests".to_string()
        } else {
            interests
                .keywords
                .iter()
                .take(5)
                .cloned()
                .collect::<Vec<_>>()
                .join(", ")
        };

        Self {
            interests_section,
            interests_keywords,
            num_papers: config.selection.num_papers,
            style: config.summary.style.clone(),
            date: now.format("%B %d, %Y").to_string(),
        }
    }
}

/// Runs the `claude` CLI (or a compatible command) as the summarizer.
pub struct ClaudeCliSummarizer {
    command: String,
    model: String,
    max_turns: u32,
    timeout_secs: u64,
    base_dir: PathBuf,
    work_dir: PathBuf,
    report_path: PathBuf,
    template: String,
    context: PromptContext,
}

impl ClaudeCliSummarizer {
    pub fn from_config(config: &AppConfig, now: DateTime<Local>) -> Result<Self> {
        let template = match config.prompt_template_path() {
            Some(path) => std::fs::read_to_string(&path).map_err(|e| {
                DigestError::Config(format!(
                    "Cannot read prompt template {}: {}",
                    path.display(),
                    e
                ))
            })?,
            None => DEFAULT_PROMPT_TEMPLATE.to_string(),
        };

        Ok(Self {
            command: config.summary.command.clone(),
            model: config.summary.model.clone(),
            max_turns: config.summary.max_turns,
            timeout_secs: config.summary.timeout_secs,
            base_dir: config.base_dir.clone(),
            work_dir: config.work_dir(),
            report_path: config.report_path(now),
            template,
            context: PromptContext::from_config(config, now),
        })
    }

    pub fn report_path(&self) -> &Path {
        &self.report_path
    }

    pub fn candidates_path(&self) -> PathBuf {
        self.work_dir.join(CANDIDATES_FILE)
    }

    pub fn build_prompt(&self) -> String {
        render_template(
            &self.template,
            &[
                ("interests_section", self.context.interests_section.clone()),
                ("interests_keywords", self.context.interests_keywords.clone()),
                ("num_papers", self.context.num_papers.to_string()),
                ("style", self.context.style.clone()),
                ("date", self.context.date.clone()),
                ("output_path", self.report_path.display().to_string()),
                ("candidates_path", self.candidates_path().display().to_string()),
            ],
        )
    }

    async fn save_candidates(&self, candidates: &[Paper]) -> std::result::Result<(), AgentError> {
        tokio::fs::create_dir_all(&self.work_dir).await?;
        let payload = serde_json::to_string_pretty(candidates).map_err(std::io::Error::from)?;
        tokio::fs::write(self.candidates_path(), payload).await?;
        debug!(
            "Saved {} candidates to {}",
            candidates.len(),
            self.candidates_path().display()
        );
        Ok(())
    }

    async fn run_agent(&self, prompt: &str) -> std::result::Result<(), AgentError> {
        let mut cmd = Command::new(&self.command);
        cmd.arg("-p")
            .arg("--model")
            .arg(&self.model)
            .arg("--allowedTools")
            .arg("Read,Write")
            .arg("--max-turns")
            .arg(self.max_turns.to_string())
            .arg(prompt)
            .current_dir(&self.base_dir)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        debug!("Running {} -p --model {} ...", self.command, self.model);

        let output = tokio::time::timeout(Duration::from_secs(self.timeout_secs), cmd.output())
            .await
            .map_err(|_| AgentError::Timeout {
                seconds: self.timeout_secs,
            })?
            .map_err(|source| AgentError::Launch {
                command: self.command.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(AgentError::NonZeroExit {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        debug!("Agent output length: {}", output.stdout.len());
        Ok(())
    }
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

#[async_trait]
impl Summarizer for ClaudeCliSummarizer {
    fn summarizer_name(&self) -> String {
        format!("{} ({})", self.command, self.model)
    }

    async fn summarize(&self, candidates: &[Paper]) -> std::result::Result<SummaryReport, AgentError> {
        self.save_candidates(candidates).await?;

        let prompt = self.build_prompt();
        tokio::fs::write(self.work_dir.join(PROMPT_FILE), &prompt).await?;

        if let Some(parent) = self.report_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let previous_report = modified_time(&self.report_path);
        self.run_agent(&prompt).await?;

        let current_report = modified_time(&self.report_path);
        if current_report.is_none() || current_report == previous_report {
            return Err(AgentError::MissingOutput {
                path: self.report_path.clone(),
            });
        }

        let report = tokio::fs::read_to_string(&self.report_path).await?;
        let selected_ids = extract_selected_ids(&report);
        info!("Agent selected {} papers", selected_ids.len());

        Ok(SummaryReport {
            report_path: self.report_path.clone(),
            selected_ids,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_unversioned_marker() {
        let report = "# Digest\n\n<!-- SELECTED_PAPERS: [\"2401.12345\", \"2401.67890v2\"] -->\n";
        assert_eq!(extract_selected_ids(report), vec!["2401.12345", "2401.67890"]);
    }

    #[test]
    fn reads_versioned_marker_spanning_lines() {
        let report = "text\n<!--\n  SELECTED_PAPERS@v1:\n  [\n    \"2401.00001\"\n  ]\n-->";
        assert_eq!(extract_selected_ids(report), vec!["2401.00001"]);
    }

    #[test]
    fn missing_or_malformed_marker_selects_nothing() {
        assert!(extract_selected_ids("# Digest without marker").is_empty());
        assert!(extract_selected_ids("<!-- SELECTED_PAPERS: [2401.1, ] -->").is_empty());
        assert!(extract_selected_ids("<!-- SELECTED_PAPERS: [1, 2] -->").is_empty());
        assert!(extract_selected_ids("<!-- SELECTED_PAPERS@v2: [\"2401.1\"] -->").is_empty());
    }

    #[test]
    fn malformed_first_marker_hides_later_ones() {
        let report = "<!-- SELECTED_PAPERS: none -->\n<!-- SELECTED_PAPERS: [\"2401.1\"] -->";
        assert!(extract_selected_ids(report).is_empty());

        let report = "<!-- SELECTED_PAPERS@vX: [\"2401.1\"] -->\n<!-- SELECTED_PAPERS: [\"2401.2\"] -->";
        assert!(extract_selected_ids(report).is_empty());

        let report = "<!-- SELECTED_PAPERS@v2: [\"2401.1\"] -->\n<!-- SELECTED_PAPERS@v1: [\"2401.2\"] -->";
        assert!(extract_selected_ids(report).is_empty());
    }

    #[test]
    fn empty_marker_array_selects_nothing() {
        assert!(extract_selected_ids("<!-- SELECTED_PAPERS@v1: [] -->").is_empty());
    }

    #[test]
    fn first_marker_wins_and_duplicates_collapse() {
        let report = "<!-- SELECTED_PAPERS: [\"a1\", \"a1v2\"] -->\n<!-- SELECTED_PAPERS: [\"b2\"] -->";
        assert_eq!(extract_selected_ids(report), vec!["a1"]);
    }

    #[test]
    fn renders_known_placeholders_only() {
        let rendered = render_template(
            "Pick {num_papers} for {date}; keep {unknown}",
            &[("num_papers", "2".to_string()), ("date", "today".to_string())],
        );
        assert_eq!(rendered, "Pick 2 for today; keep {unknown}");
    }
}
