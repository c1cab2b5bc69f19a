use crate::config::InterestSpec;
use crate::ledger::Ledger;
use crate::query::QueryBuilder;
use crate::recency::RecencyFilter;
use crate::types::{Paper, PaperSource};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

/// Result of one selection pass.
#[derive(Debug, Clone)]
pub struct Selection {
    /// Query as dispatched to the source, window term included.
    pub query: String,
    pub fetched: usize,
    /// Papers left after the local recency check.
    pub recent: usize,
    /// Recent papers not yet in the ledger, in source order.
    pub candidates: Vec<Paper>,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Query → fetch → recency check → ledger check.
///
/// Holds no state between runs; everything it knows about earlier runs comes
/// from the ledger passed to [`SelectionPipeline::select`].
pub struct SelectionPipeline {
    source: Box<dyn PaperSource>,
}

impl SelectionPipeline {
    pub fn new(source: Box<dyn PaperSource>) -> Self {
        info!("Selection pipeline using source: {}", source.source_name());
        Self { source }
    }

    pub async fn select(
        &self,
        interests: &InterestSpec,
        window_days: i64,
        max_candidates: usize,
        ledger: &Ledger,
        now: DateTime<Utc>,
    ) -> Selection {
        let base_query = QueryBuilder::build(interests);
        let query = RecencyFilter::scope(&base_query, window_days, now);
        debug!("Query: {}", query);

        let papers = self.source.fetch(&query, max_candidates).await;
        let fetched = papers.len();

        let recent_papers = RecencyFilter::filter(papers, window_days, now);
        let recent = recent_papers.len();

        let candidates = ledger.filter_unseen(recent_papers);

        info!(
            "Selection: {} fetched, {} within {} days, {} unseen",
            fetched,
            recent,
            window_days,
            candidates.len()
        );

        Selection {
            query,
            fetched,
            recent,
            candidates,
        }
    }
}
