//! Submission: handing finalized sessions to whoever processes them.

pub mod sink;
pub mod webhook;

pub use crate::session::SubmissionRecord;
pub use sink::{FanoutSink, LogSink, MemorySink, SubmissionSink};
pub use webhook::WebhookSink;
