//! YAML configuration loading, defaults and validation.
//!
//! Relative paths in the file resolve against the directory that contains the
//! config file, so a scheduled run behaves the same from any working directory.

use crate::types::{DigestError, FetchConfig, Result};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// What the user wants to read about. At least one list is non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterestSpec {
    categories: Vec<String>,
    keywords: Vec<String>,
}

impl InterestSpec {
    /// Trims entries, drops blanks and duplicates (first occurrence kept) and
    /// rejects a spec with nothing left in it.
    pub fn new<C, K>(categories: C, keywords: K) -> Result<Self>
    where
        C: IntoIterator,
        C::Item: AsRef<str>,
        K: IntoIterator,
        K::Item: AsRef<str>,
    {
        let categories = dedup_trimmed(categories);
        let keywords = dedup_trimmed(keywords);

        if categories.is_empty() && keywords.is_empty() {
            return Err(DigestError::Config(
                "At least one of 'categories' or 'keywords' must be specified in 'interests'"
                    .to_string(),
            ));
        }

        Ok(Self {
            categories,
            keywords,
        })
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }
}

fn dedup_trimmed<I>(values: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for value in values {
        let value = value.as_ref().trim();
        if !value.is_empty() && !out.iter().any(|existing| existing == value) {
            out.push(value.to_string());
        }
    }
    out
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InterestsSection {
    pub categories: Vec<String>,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VenuesSection {
    pub conferences: Vec<String>,
    pub journals: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelectionSection {
    pub num_papers: usize,
    pub max_candidates: usize,
    pub days_recent: i64,
}

impl Default for SelectionSection {
    fn default() -> Self {
        Self {
            num_papers: 2,
            max_candidates: 50,
            days_recent: 7,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SummarySection {
    pub style: String,
    pub model: String,
    pub command: String,
    pub max_turns: u32,
    pub timeout_secs: u64,
    pub prompt_template: Option<String>,
}

impl Default for SummarySection {
    fn default() -> Self {
        Self {
            style: "casual".to_string(),
            model: "sonnet".to_string(),
            command: "claude".to_string(),
            max_turns: 10,
            timeout_secs: 600,
            prompt_template: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    pub directory: String,
    pub filename_format: String,
    pub html_enabled: bool,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            directory: "./output/digests".to_string(),
            filename_format: "%Y-%m-%d".to_string(),
            html_enabled: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotificationSection {
    pub enabled: bool,
    pub sound: String,
}

impl Default for NotificationSection {
    fn default() -> Self {
        Self {
            enabled: true,
            sound: "Glass".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AdvancedSection {
    pub api_timeout: u64,
    pub max_retries: u32,
    pub history_file: String,
    pub history_retention_days: i64,
    pub work_dir: String,
    pub debug: bool,
}

impl Default for AdvancedSection {
    fn default() -> Self {
        Self {
            api_timeout: 30,
            max_retries: 2,
            history_file: "./data/history.json".to_string(),
            history_retention_days: 90,
            work_dir: "./.tmp".to_string(),
            debug: false,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub interests: Option<InterestsSection>,
    pub venues: VenuesSection,
    pub authors: Vec<String>,
    pub selection: SelectionSection,
    pub summary: SummarySection,
    pub output: OutputSection,
    pub notification: NotificationSection,
    pub advanced: AdvancedSection,
    #[serde(skip)]
    pub base_dir: PathBuf,
}

/// Reads, parses and validates the config file at `path`.
pub fn load_config(path: impl AsRef<Path>) -> Result<AppConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(DigestError::Config(format!(
            "Config file not found: {}\nPlease copy config.example.yaml to config.yaml and edit it.",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(path)?;
    let base_dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();

    let config = parse_config(&content, base_dir)?;
    debug!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Parses and validates YAML config text. `base_dir` anchors relative paths.
pub fn parse_config(content: &str, base_dir: PathBuf) -> Result<AppConfig> {
    if content.trim().is_empty() {
        return Err(DigestError::Config("Config file is empty".to_string()));
    }

    let mut config: AppConfig = serde_yaml::from_str(content)
        .map_err(|e| DigestError::Config(format!("Invalid configuration: {}", e)))?;
    config.base_dir = base_dir;
    config.validate()?;
    Ok(config)
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        self.interest_spec()?;

        if self.selection.max_candidates == 0 {
            return Err(DigestError::Config(
                "'selection.max_candidates' must be at least 1".to_string(),
            ));
        }

        if StrftimeItems::new(&self.output.filename_format).any(|item| matches!(item, Item::Error)) {
            return Err(DigestError::Config(format!(
                "'output.filename_format' is not a valid date format: {}",
                self.output.filename_format
            )));
        }

        Ok(())
    }

    pub fn interest_spec(&self) -> Result<InterestSpec> {
        let interests = self.interests.as_ref().ok_or_else(|| {
            DigestError::Config("'interests' section is required in config".to_string())
        })?;
        InterestSpec::new(&interests.categories, &interests.keywords)
    }

    pub fn is_debug(&self) -> bool {
        self.advanced.debug
    }

    pub fn resolve(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    pub fn history_path(&self) -> PathBuf {
        self.resolve(&self.advanced.history_file)
    }

    pub fn work_dir(&self) -> PathBuf {
        self.resolve(&self.advanced.work_dir)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.resolve(&self.output.directory)
    }

    /// Where today's Markdown digest is expected.
    pub fn report_path(&self, now: DateTime<Local>) -> PathBuf {
        let file_name = format!("{}.md", now.format(&self.output.filename_format));
        self.output_dir().join(file_name)
    }

    pub fn prompt_template_path(&self) -> Option<PathBuf> {
        self.summary
            .prompt_template
            .as_deref()
            .map(|path| self.resolve(path))
    }

    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            timeout_seconds: self.advanced.api_timeout,
            max_retries: self.advanced.max_retries,
            ..FetchConfig::default()
        }
    }
}
