//! Transcript and submission data models.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::flow::QuestionNode;

use super::state::SessionPhase;

/// Who wrote a transcript message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    Visitor,
    Assistant,
}

impl std::fmt::Display for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Visitor => write!(f, "visitor"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

/// One entry in a session transcript.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub id: Uuid,
    pub text: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            sender,
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Sender::Assistant, text)
    }

    pub fn visitor(text: impl Into<String>) -> Self {
        Self::new(Sender::Visitor, text)
    }
}

/// Field key → latest answer.
pub type AnswerRecord = BTreeMap<String, String>;

/// Everything a finished session hands to the submission sink.
///
/// Owned copy: later changes to the session never reach a record that has
/// already been handed over.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubmissionRecord {
    pub session_id: Uuid,
    pub answers: AnswerRecord,
    pub transcript: Vec<Message>,
    pub submitted_at: DateTime<Utc>,
}

/// Read-only view of a session for rendering.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub phase: SessionPhase,
    pub active: bool,
    pub complete: bool,
    /// Set while the assistant's next message is still being paced.
    pub reply_pending: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_node: Option<QuestionNode>,
    pub transcript: Vec<Message>,
    pub answers: AnswerRecord,
}
