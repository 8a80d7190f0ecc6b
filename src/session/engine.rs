//! Session engine: walks a visitor through the flow one answer at a time.

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use crate::config::DEFAULT_CLOSING_MESSAGE;
use crate::error::SessionError;
use crate::flow::{FlowTable, QuestionNode};

use super::model::{AnswerRecord, Message, SessionSnapshot, SubmissionRecord};
use super::state::SessionPhase;

/// Engine behaviour knobs.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Reject answers to fixed-choice nodes that are not a listed option.
    pub strict_options: bool,
    /// Assistant message appended after the terminal node is answered.
    pub closing_message: String,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            strict_options: false,
            closing_message: DEFAULT_CLOSING_MESSAGE.to_string(),
        }
    }
}

/// An assistant message produced by `advance_deferred` that has not been
/// appended yet.
///
/// Tied to the session epoch it was produced in: once the session is reset
/// or restarted, `Session::deliver` drops it. Not `Clone`: a reply is
/// delivered at most once.
#[derive(Debug)]
pub struct PendingReply {
    epoch: u64,
    message: Message,
    closes_session: bool,
}

impl PendingReply {
    pub fn message(&self) -> &Message {
        &self.message
    }

    /// True when this is the closing message rather than a next question.
    pub fn closes_session(&self) -> bool {
        self.closes_session
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

/// One visitor's walk through a flow.
#[derive(Debug, Clone)]
pub struct Session {
    flow: Arc<FlowTable>,
    options: SessionOptions,
    id: Uuid,
    transcript: Vec<Message>,
    answers: AnswerRecord,
    /// Chain position of the node awaiting an answer.
    current: Option<usize>,
    active: bool,
    complete: bool,
    epoch: u64,
    reply_pending: bool,
}

impl Session {
    /// Create an inactive session over `flow`.
    pub fn new(flow: Arc<FlowTable>, options: SessionOptions) -> Self {
        Self {
            flow,
            options,
            id: Uuid::new_v4(),
            transcript: Vec::new(),
            answers: AnswerRecord::new(),
            current: None,
            active: false,
            complete: false,
            epoch: 0,
            reply_pending: false,
        }
    }

    /// Start (or restart) the session at the entry node.
    ///
    /// Discards any prior transcript, answers, and pending reply. The
    /// transcript afterwards holds exactly the entry prompt.
    pub fn begin(&mut self) -> &QuestionNode {
        self.epoch += 1;
        self.id = Uuid::new_v4();
        self.active = true;
        self.complete = false;
        self.reply_pending = false;
        self.answers.clear();
        self.current = Some(0);

        let entry = self.flow.entry();
        self.transcript = vec![Message::assistant(entry.prompt.clone())];

        debug!(session_id = %self.id, node = %entry.id, "Session started");
        entry
    }

    /// Record an answer to the current node and move on.
    ///
    /// Returns the next node, or `None` once the terminal node has been
    /// answered and the closing message appended. On error nothing changes.
    pub fn advance(&mut self, answer: &str) -> Result<Option<&QuestionNode>, SessionError> {
        let reply = self.advance_deferred(answer)?;
        self.deliver(reply);
        Ok(self.current_node())
    }

    /// Like `advance`, but hands back the assistant's message instead of
    /// appending it, so the caller can pace it.
    ///
    /// The answer is stored and the visitor message appended immediately;
    /// the pointer moves (or the session completes) immediately. Until the
    /// returned reply is delivered, further answers fail with `ReplyPending`.
    pub fn advance_deferred(&mut self, answer: &str) -> Result<PendingReply, SessionError> {
        let position = self.check_answer(answer)?;
        let flow = Arc::clone(&self.flow);
        let node = flow.at(position).ok_or(SessionError::AlreadyComplete)?;

        self.answers
            .insert(node.answer_field_key.clone(), answer.to_string());
        self.transcript.push(Message::visitor(answer));

        let successor = flow
            .successor(position)
            .and_then(|next| flow.at(next).map(|n| (next, n)));
        let reply = match successor {
            Some((next, next_node)) => {
                debug!(
                    session_id = %self.id,
                    from = %node.id,
                    to = %next_node.id,
                    "Session advanced"
                );
                self.current = Some(next);
                PendingReply {
                    epoch: self.epoch,
                    message: Message::assistant(next_node.prompt.clone()),
                    closes_session: false,
                }
            }
            None => {
                debug!(session_id = %self.id, node = %node.id, "Final question answered");
                self.current = None;
                self.complete = true;
                PendingReply {
                    epoch: self.epoch,
                    message: Message::assistant(self.options.closing_message.clone()),
                    closes_session: true,
                }
            }
        };

        self.reply_pending = true;
        Ok(reply)
    }

    /// Append a reply produced by `advance_deferred`.
    ///
    /// Returns false (and appends nothing) if the session has been reset or
    /// restarted since the reply was produced, if no reply is outstanding,
    /// or if the session was finalized before the next question arrived.
    pub fn deliver(&mut self, reply: PendingReply) -> bool {
        if reply.epoch != self.epoch || !self.reply_pending {
            debug!(
                session_id = %self.id,
                reply_epoch = reply.epoch,
                epoch = self.epoch,
                "Dropping stale reply"
            );
            return false;
        }
        if self.complete && !reply.closes_session {
            debug!(session_id = %self.id, "Dropping question reply after finalize");
            self.reply_pending = false;
            return false;
        }
        self.transcript.push(reply.message);
        self.reply_pending = false;
        true
    }

    /// Mark the session complete and return the record for submission.
    ///
    /// Callable in any state and any number of times; each call returns a
    /// fresh copy of the current answers and transcript.
    pub fn finalize(&mut self) -> SubmissionRecord {
        self.complete = true;
        debug!(session_id = %self.id, answers = self.answers.len(), "Session finalized");
        SubmissionRecord {
            session_id: self.id,
            answers: self.answers.clone(),
            transcript: self.transcript.clone(),
            submitted_at: Utc::now(),
        }
    }

    /// Drop all state and return to the inactive session.
    pub fn reset(&mut self) {
        self.epoch += 1;
        self.id = Uuid::new_v4();
        self.transcript.clear();
        self.answers.clear();
        self.current = None;
        self.active = false;
        self.complete = false;
        self.reply_pending = false;
    }

    /// Validate an answer against the session state and current node.
    /// Returns the current chain position.
    fn check_answer(&self, answer: &str) -> Result<usize, SessionError> {
        if !self.active {
            return Err(SessionError::NotActive);
        }
        if self.complete {
            return Err(SessionError::AlreadyComplete);
        }
        let position = self.current.ok_or(SessionError::AlreadyComplete)?;
        if self.reply_pending {
            return Err(SessionError::ReplyPending);
        }
        if answer.trim().is_empty() {
            return Err(SessionError::InvalidAnswer {
                reason: "answer is empty".to_string(),
            });
        }
        if self.options.strict_options {
            if let Some(node) = self.flow.at(position) {
                if node.is_fixed_choice() && !node.is_option(answer) {
                    return Err(SessionError::InvalidAnswer {
                        reason: format!("'{}' is not one of the offered options", answer.trim()),
                    });
                }
            }
        }
        Ok(position)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn flow(&self) -> &Arc<FlowTable> {
        &self.flow
    }

    /// The node awaiting an answer.
    pub fn current_node(&self) -> Option<&QuestionNode> {
        self.current.and_then(|i| self.flow.at(i))
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    pub fn answers(&self) -> &AnswerRecord {
        &self.answers
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn is_reply_pending(&self) -> bool {
        self.reply_pending
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn phase(&self) -> SessionPhase {
        SessionPhase::from_flags(self.active, self.complete)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id,
            phase: self.phase(),
            active: self.active,
            complete: self.complete,
            reply_pending: self.reply_pending,
            current_node: self.current_node().cloned(),
            transcript: self.transcript.clone(),
            answers: self.answers.clone(),
        }
    }
}
