use crate::config::{AppConfig, InterestSpec};
use crate::html;
use crate::ledger::{LedgerStore, SeenLedger};
use crate::notifier::DesktopNotifier;
use crate::pipeline::SelectionPipeline;
use crate::types::{DigestError, Paper, Result, SeenMark, Summarizer};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

/// Knobs for one digest run, taken from the config.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub interests: InterestSpec,
    pub window_days: i64,
    pub max_candidates: usize,
    pub retention_days: i64,
    pub html_enabled: bool,
}

impl RunSettings {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            interests: config.interest_spec()?,
            window_days: config.selection.days_recent,
            max_candidates: config.selection.max_candidates,
            retention_days: config.advanced.history_retention_days,
            html_enabled: config.output.html_enabled,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Nothing new to summarize. The ledger is left as it was.
    NoCandidates {
        fetched: usize,
        /// Fetched papers that passed the recency check, all already seen.
        recent: usize,
    },
    /// Candidates that a real run would hand to the summarizer.
    DryRun(Vec<Paper>),
    Completed {
        report: PathBuf,
        html: Option<PathBuf>,
        /// Identifiers recorded in the ledger, in candidate order.
        marked: Vec<String>,
    },
}

/// One end-to-end digest: select, summarize, record, render, notify.
pub struct DigestRun<S: LedgerStore, M: Summarizer> {
    pipeline: SelectionPipeline,
    ledger: SeenLedger<S>,
    summarizer: M,
    notifier: DesktopNotifier,
    settings: RunSettings,
}

impl<S: LedgerStore, M: Summarizer> DigestRun<S, M> {
    pub fn new(
        pipeline: SelectionPipeline,
        ledger: SeenLedger<S>,
        summarizer: M,
        notifier: DesktopNotifier,
        settings: RunSettings,
    ) -> Self {
        info!(
            "Digest run: summarizer {}, ledger {}",
            summarizer.summarizer_name(),
            ledger.store().location()
        );
        Self {
            pipeline,
            ledger,
            summarizer,
            notifier,
            settings,
        }
    }

    pub fn ledger(&self) -> &SeenLedger<S> {
        &self.ledger
    }

    pub async fn execute(&mut self, now: DateTime<Utc>, dry_run: bool) -> Result<RunOutcome> {
        let removed = self
            .ledger
            .cleanup_old_entries(now, self.settings.retention_days)?;
        if removed > 0 {
            debug!("Cleaned up {} old history entries", removed);
        }
        let stats = self.ledger.stats();
        debug!(
            "History: {} papers, last updated {}",
            stats.total_papers,
            stats.last_updated.as_deref().unwrap_or("never")
        );

        let selection = self
            .pipeline
            .select(
                &self.settings.interests,
                self.settings.window_days,
                self.settings.max_candidates,
                self.ledger.ledger(),
                now,
            )
            .await;

        if selection.is_empty() {
            info!(
                "No new papers to summarize ({} fetched, {} recent)",
                selection.fetched, selection.recent
            );
            self.notifier.notify_no_papers().await;
            return Ok(RunOutcome::NoCandidates {
                fetched: selection.fetched,
                recent: selection.recent,
            });
        }

        if dry_run {
            info!("Dry run: skipping summarization of {} candidates", selection.candidates.len());
            return Ok(RunOutcome::DryRun(selection.candidates));
        }

        let candidates = selection.candidates;
        let report = match self.summarizer.summarize(&candidates).await {
            Ok(report) => report,
            Err(e) => {
                error!("Summarization failed: {}", e);
                self.notifier.notify_error("Summary generation failed").await;
                return Err(DigestError::Agent(e));
            }
        };

        let selected: HashSet<&str> = report.selected_ids.iter().map(String::as_str).collect();
        let to_mark: Vec<SeenMark> = candidates
            .iter()
            .filter(|paper| selected.contains(paper.id.as_str()))
            .map(SeenMark::from)
            .collect();

        let unknown = report.selected_ids.len().saturating_sub(to_mark.len());
        if unknown > 0 {
            warn!("Ignoring {} selected ids that were not candidates", unknown);
        }

        let marked: Vec<String> = to_mark.iter().map(|mark| mark.id.clone()).collect();
        self.ledger.mark_multiple(to_mark, now)?;
        info!("Marked {} papers as seen", marked.len());

        let html = if self.settings.html_enabled {
            match html::convert_file(&report.report_path) {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!("HTML generation failed: {}", e);
                    None
                }
            }
        } else {
            None
        };

        self.notifier
            .notify_digest_ready(marked.len(), &report.report_path)
            .await;

        Ok(RunOutcome::Completed {
            report: report.report_path,
            html,
            marked,
        })
    }
}
