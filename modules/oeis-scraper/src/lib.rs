pub mod parser;
pub mod pipeline;
pub mod queue;
pub mod seqfile;
pub mod source;
pub mod stats;

pub use pipeline::{Pipeline, ScrapeOutcome};
pub use source::{FileRecordSource, HttpRecordSource, RecordSource};
pub use stats::RunStats;
