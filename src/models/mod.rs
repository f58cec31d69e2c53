// Data models for the outbound request format and run results

pub mod openai;
pub mod run;

pub use run::{RequestRecord, RunId, RunMode, RunSummary};
