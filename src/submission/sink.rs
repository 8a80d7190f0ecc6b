//! Submission sinks: where finished sessions are handed over.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::error::SubmissionError;
use crate::session::SubmissionRecord;

/// Receives the answers and transcript of a finalized session.
///
/// Sinks see every `finalize`; repeated calls hand over the record again.
#[async_trait]
pub trait SubmissionSink: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &str;

    async fn submit(&self, record: &SubmissionRecord) -> Result<(), SubmissionError>;
}

/// Logs each submission.
pub struct LogSink;

#[async_trait]
impl SubmissionSink for LogSink {
    fn name(&self) -> &str {
        "log"
    }

    async fn submit(&self, record: &SubmissionRecord) -> Result<(), SubmissionError> {
        let answers = serde_json::to_string(&record.answers)?;
        info!(
            session_id = %record.session_id,
            messages = record.transcript.len(),
            answers = %answers,
            "Collected intake data"
        );
        Ok(())
    }
}

/// Keeps every submission in memory.
#[derive(Default)]
pub struct MemorySink {
    records: RwLock<Vec<SubmissionRecord>>,
}

impl MemorySink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn records(&self) -> Vec<SubmissionRecord> {
        self.records.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl SubmissionSink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    async fn submit(&self, record: &SubmissionRecord) -> Result<(), SubmissionError> {
        self.records.write().await.push(record.clone());
        Ok(())
    }
}

/// Hands each submission to several sinks in order.
///
/// Every sink is tried; the first failure is returned after the rest have
/// run.
pub struct FanoutSink {
    sinks: Vec<Arc<dyn SubmissionSink>>,
}

impl FanoutSink {
    pub fn new(sinks: Vec<Arc<dyn SubmissionSink>>) -> Self {
        Self { sinks }
    }
}

#[async_trait]
impl SubmissionSink for FanoutSink {
    fn name(&self) -> &str {
        "fanout"
    }

    async fn submit(&self, record: &SubmissionRecord) -> Result<(), SubmissionError> {
        let mut first_error = None;
        for sink in &self.sinks {
            if let Err(e) = sink.submit(record).await {
                warn!(sink = sink.name(), error = %e, "Submission sink failed");
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
