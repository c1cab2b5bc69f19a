pub mod types;
pub mod config;
pub mod query;
pub mod recency;
pub mod ledger;
pub mod parser;
pub mod fetcher;
pub mod pipeline;
pub mod llm_adapter;
pub mod html;
pub mod notifier;
pub mod digest;
pub mod utils;

pub use types::*;
pub use config::{load_config, parse_config, AppConfig, InterestSpec};
pub use query::QueryBuilder;
pub use recency::RecencyFilter;
pub use ledger::{JsonFileStore, Ledger, LedgerStore, MemoryStore, SeenLedger};
pub use parser::FeedParser;
pub use fetcher::ArxivFetcher;
pub use pipeline::{Selection, SelectionPipeline};
pub use llm_adapter::{extract_selected_ids, ClaudeCliSummarizer};
pub use notifier::DesktopNotifier;
pub use digest::{DigestRun, RunOutcome, RunSettings};
