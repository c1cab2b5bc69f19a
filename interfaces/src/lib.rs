pub mod defs;

pub use defs::{AgentError, Paper, PaperSource, Summarizer, SummaryReport};
