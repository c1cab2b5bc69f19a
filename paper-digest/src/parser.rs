use crate::types::{DigestError, Paper, Result};
use chrono::SecondsFormat;
use feed_rs::model::Entry;
use feed_rs::parser;
use std::collections::HashSet;
use tracing::{debug, info};

/// Turns catalog Atom responses into [`Paper`] values.
///
/// Entries that cannot yield an identifier or a title are skipped one by one;
/// the rest of the response is still returned. Revisions of a paper that
/// appear more than once collapse to the first occurrence.
pub struct FeedParser {
    seen_ids: HashSet<String>,
}

impl FeedParser {
    pub fn new() -> Self {
        Self {
            seen_ids: HashSet::new(),
        }
    }

    pub fn parse_feed(&mut self, content: &str) -> Result<Vec<Paper>> {
        debug!("Parsing feed content ({} bytes)", content.len());

        let feed = parser::parse(content.as_bytes())
            .map_err(|e| DigestError::Parse(format!("Failed to parse feed: {}", e)))?;

        let total = feed.entries.len();
        let mut papers = Vec::with_capacity(total);

        for entry in feed.entries {
            if let Some(paper) = self.parse_entry(entry) {
                papers.push(paper);
            }
        }

        info!("Parsed {} papers from {} feed entries", papers.len(), total);
        Ok(papers)
    }

    fn parse_entry(&mut self, entry: Entry) -> Option<Paper> {
        let Some(source_url) = source_url(&entry) else {
            debug!("Skipping entry without an abstract URL: {}", entry.id);
            return None;
        };
        let Some(id) = extract_id(&source_url) else {
            debug!("Skipping entry with no identifier: {}", source_url);
            return None;
        };

        let title = entry
            .title
            .map(|t| normalize_text(&t.content))
            .filter(|t| !t.is_empty());
        let Some(title) = title else {
            debug!("Skipping entry {} without a title", id);
            return None;
        };

        if !self.seen_ids.insert(id.clone()) {
            debug!("Skipping duplicate entry: {}", id);
            return None;
        }

        let abstract_text = entry
            .summary
            .map(|s| normalize_text(&s.content))
            .unwrap_or_default();

        let authors = entry
            .authors
            .iter()
            .map(|a| normalize_text(&a.name))
            .filter(|name| !name.is_empty())
            .collect();

        let mut categories: Vec<String> = Vec::new();
        for category in entry.categories {
            let term = category.term.trim().to_string();
            if !term.is_empty() && !categories.contains(&term) {
                categories.push(term);
            }
        }

        let published = entry
            .published
            .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
            .unwrap_or_default();
        let updated = entry
            .updated
            .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
            .unwrap_or_default();

        Some(Paper {
            id,
            title,
            authors,
            abstract_text,
            categories,
            published,
            updated,
            artifact_url: artifact_url(&source_url),
            source_url,
        })
    }

    pub fn clear_deduplication_cache(&mut self) {
        self.seen_ids.clear();
        debug!("Cleared deduplication cache");
    }
}

impl Default for FeedParser {
    fn default() -> Self {
        Self::new()
    }
}

/// The entry's abstract page: its `<id>` when that is an `/abs/` URL,
/// otherwise the first such link.
fn source_url(entry: &Entry) -> Option<String> {
    std::iter::once(entry.id.as_str())
        .chain(entry.links.iter().map(|link| link.href.as_str()))
        .map(str::trim)
        .find(|candidate| candidate.contains("/abs/"))
        .map(str::to_string)
}

/// Identifier from an abstract URL, revision suffix removed.
pub fn extract_id(source_url: &str) -> Option<String> {
    let (_, raw) = source_url.split_once("/abs/")?;
    let raw = raw.trim().trim_end_matches('/');
    if raw.is_empty() {
        return None;
    }
    Some(normalize_id(raw))
}

/// Strips a trailing `v<digits>` revision marker: `2401.12345v2` and
/// `hep-th/9901001v1` become `2401.12345` and `hep-th/9901001`.
pub fn normalize_id(raw: &str) -> String {
    let raw = raw.trim();
    if let Some(pos) = raw.rfind('v') {
        let (base, revision) = (&raw[..pos], &raw[pos + 1..]);
        if !base.is_empty() && !revision.is_empty() && revision.bytes().all(|b| b.is_ascii_digit()) {
            return base.to_string();
        }
    }
    raw.to_string()
}

/// PDF location for an abstract page.
pub fn artifact_url(source_url: &str) -> String {
    format!("{}.pdf", source_url.replace("/abs/", "/pdf/"))
}

/// Collapses every whitespace run (embedded newlines included) to one space.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
