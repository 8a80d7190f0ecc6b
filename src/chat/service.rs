//! Chat service: owns the visitor's session and fans out every change
//! to connected shells.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{SessionError, SubmissionError};
use crate::flow::FlowTable;
use crate::session::{
    Message, Pacer, PendingReply, ScheduledReply, Session, SessionSnapshot, SubmissionRecord,
};
use crate::submission::SubmissionSink;

/// Default broadcast channel capacity.
const DEFAULT_BROADCAST_CAPACITY: usize = 256;

/// Events pushed to shells (server → client).
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    /// Full session state (sent on connect and after start).
    SessionSync { session: SessionSnapshot },
    /// A message was appended to the transcript.
    MessageAppended { message: Message },
    /// The session was discarded.
    SessionReset,
    /// The closing message has been appended.
    SessionComplete { session_id: Uuid },
    /// The answers were handed to the submission sink.
    Submitted { session_id: Uuid },
    /// A request from this client failed. Never broadcast.
    Error { message: String },
}

/// Single-visitor chat service.
pub struct ChatService {
    session: RwLock<Session>,
    flow: Arc<FlowTable>,
    pacer: Pacer,
    scheduled: Mutex<Option<ScheduledReply>>,
    sink: Arc<dyn SubmissionSink>,
    tx: broadcast::Sender<ChatEvent>,
}

impl ChatService {
    pub fn new(session: Session, pacer: Pacer, sink: Arc<dyn SubmissionSink>) -> Arc<Self> {
        let (tx, _rx) = broadcast::channel(DEFAULT_BROADCAST_CAPACITY);
        let flow = Arc::clone(session.flow());
        Arc::new(Self {
            session: RwLock::new(session),
            flow,
            pacer,
            scheduled: Mutex::new(None),
            sink,
            tx,
        })
    }

    /// Subscribe to chat events. Each shell calls this.
    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.tx.subscribe()
    }

    pub fn flow(&self) -> &Arc<FlowTable> {
        &self.flow
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.session.read().await.snapshot()
    }

    /// Start (or restart) the conversation.
    pub async fn start(&self) -> SessionSnapshot {
        self.cancel_scheduled().await;

        let snapshot = {
            let mut session = self.session.write().await;
            session.begin();
            session.snapshot()
        };

        info!(session_id = %snapshot.session_id, "Chat started");

        // No receivers is fine
        let _ = self.tx.send(ChatEvent::SessionSync {
            session: snapshot.clone(),
        });
        snapshot
    }

    /// Record the visitor's answer and schedule the assistant's reply.
    pub async fn answer(self: &Arc<Self>, text: &str) -> Result<SessionSnapshot, SessionError> {
        let (reply, visitor_message, snapshot) = {
            let mut session = self.session.write().await;
            let reply = session.advance_deferred(text)?;
            let visitor_message = session.transcript().last().cloned();
            (reply, visitor_message, session.snapshot())
        };

        debug!(
            session_id = %snapshot.session_id,
            closes = reply.closes_session(),
            "Answer recorded"
        );

        if let Some(message) = visitor_message {
            let _ = self.tx.send(ChatEvent::MessageAppended { message });
        }

        let service = Arc::clone(self);
        let scheduled = self.pacer.schedule(async move {
            service.deliver(reply).await;
        });
        *self.scheduled.lock().await = Some(scheduled);

        Ok(snapshot)
    }

    /// Discard the session and return to the inactive state.
    pub async fn reset(&self) -> SessionSnapshot {
        self.cancel_scheduled().await;

        let snapshot = {
            let mut session = self.session.write().await;
            session.reset();
            session.snapshot()
        };

        info!("Chat reset");
        let _ = self.tx.send(ChatEvent::SessionReset);
        snapshot
    }

    /// Finalize the session and hand the answers to the sink.
    ///
    /// The session is marked complete even if the sink fails.
    pub async fn complete(&self) -> Result<SubmissionRecord, SubmissionError> {
        let record = self.session.write().await.finalize();

        if let Err(e) = self.sink.submit(&record).await {
            warn!(
                session_id = %record.session_id,
                sink = self.sink.name(),
                error = %e,
                "Submission failed"
            );
            return Err(e);
        }

        info!(
            session_id = %record.session_id,
            answers = record.answers.len(),
            sink = self.sink.name(),
            "Chat submitted"
        );
        let _ = self.tx.send(ChatEvent::Submitted {
            session_id: record.session_id,
        });
        Ok(record)
    }

    /// Wait until the most recently scheduled reply has been appended.
    pub async fn settle(&self) {
        let scheduled = self.scheduled.lock().await.take();
        if let Some(scheduled) = scheduled {
            scheduled.finished().await;
        }
    }

    async fn deliver(&self, reply: PendingReply) {
        let closes = reply.closes_session();
        let message = reply.message().clone();

        let (delivered, session_id) = {
            let mut session = self.session.write().await;
            (session.deliver(reply), session.id())
        };
        if !delivered {
            return;
        }

        let _ = self.tx.send(ChatEvent::MessageAppended { message });
        if closes {
            info!(session_id = %session_id, "Chat complete");
            let _ = self.tx.send(ChatEvent::SessionComplete { session_id });
        }
    }

    async fn cancel_scheduled(&self) {
        if let Some(scheduled) = self.scheduled.lock().await.take() {
            if !scheduled.is_finished() {
                debug!("Cancelling pending reply");
            }
            scheduled.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::flow::legal_intake_flow;
    use crate::session::{Sender, SessionOptions};
    use crate::submission::MemorySink;

    fn service(delay: Duration) -> (Arc<ChatService>, Arc<MemorySink>) {
        let flow = Arc::new(legal_intake_flow().unwrap());
        let session = Session::new(flow, SessionOptions::default());
        let sink = MemorySink::new();
        let chat = ChatService::new(
            session,
            Pacer::new(delay),
            Arc::clone(&sink) as Arc<dyn SubmissionSink>,
        );
        (chat, sink)
    }

    #[tokio::test]
    async fn start_broadcasts_sync() {
        let (chat, _) = service(Duration::ZERO);
        let mut rx = chat.subscribe();

        let snapshot = chat.start().await;
        assert!(snapshot.active);
        assert_eq!(snapshot.transcript.len(), 1);

        match rx.recv().await.unwrap() {
            ChatEvent::SessionSync { session } => {
                assert_eq!(session.session_id, snapshot.session_id);
            }
            other => panic!("expected SessionSync, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn answer_appends_visitor_then_assistant() {
        let (chat, _) = service(Duration::from_millis(10));
        chat.start().await;
        let mut rx = chat.subscribe();

        let snapshot = chat.answer("Family Law").await.unwrap();
        assert!(snapshot.reply_pending);
        assert_eq!(snapshot.current_node.unwrap().id, "duration");

        match rx.recv().await.unwrap() {
            ChatEvent::MessageAppended { message } => {
                assert_eq!(message.sender, Sender::Visitor);
                assert_eq!(message.text, "Family Law");
            }
            other => panic!("expected visitor message, got {other:?}"),
        }
        match rx.recv().await.unwrap() {
            ChatEvent::MessageAppended { message } => {
                assert_eq!(message.sender, Sender::Assistant);
                assert_eq!(message.text, "How long have you been dealing with this issue?");
            }
            other => panic!("expected assistant message, got {other:?}"),
        }

        chat.settle().await;
        let snapshot = chat.snapshot().await;
        assert!(!snapshot.reply_pending);
        assert_eq!(snapshot.transcript.len(), 3);
    }

    #[tokio::test]
    async fn answer_while_reply_pending_is_rejected() {
        let (chat, _) = service(Duration::from_millis(200));
        chat.start().await;
        chat.answer("Family Law").await.unwrap();
        assert_eq!(
            chat.answer("A few weeks").await.unwrap_err(),
            SessionError::ReplyPending
        );
    }

    #[tokio::test]
    async fn empty_answer_changes_nothing() {
        let (chat, _) = service(Duration::ZERO);
        chat.start().await;
        let err = chat.answer("   ").await.unwrap_err();
        assert!(matches!(err, SessionError::InvalidAnswer { .. }));
        let snapshot = chat.snapshot().await;
        assert_eq!(snapshot.transcript.len(), 1);
        assert!(snapshot.answers.is_empty());
    }

    #[tokio::test]
    async fn reset_during_delay_discards_stale_reply() {
        let (chat, _) = service(Duration::from_millis(50));
        chat.start().await;
        chat.answer("Family Law").await.unwrap();

        chat.reset().await;
        chat.start().await;
        tokio::time::sleep(Duration::from_millis(100)).await;

        let snapshot = chat.snapshot().await;
        assert_eq!(snapshot.transcript.len(), 1);
        assert_eq!(snapshot.current_node.unwrap().id, "start");
        assert!(snapshot.answers.is_empty());
    }

    #[tokio::test]
    async fn full_walk_then_complete_reaches_sink() {
        let (chat, sink) = service(Duration::ZERO);
        chat.start().await;
        let mut rx = chat.subscribe();

        for i in 0..9 {
            chat.answer(&format!("answer {i}")).await.unwrap();
            chat.settle().await;
        }

        let snapshot = chat.snapshot().await;
        assert!(snapshot.complete);
        assert!(snapshot.current_node.is_none());
        assert_eq!(snapshot.transcript.len(), 19);

        let mut saw_complete = false;
        while let Ok(event) = rx.try_recv() {
            if matches!(event, ChatEvent::SessionComplete { .. }) {
                saw_complete = true;
            }
        }
        assert!(saw_complete);

        let record = chat.complete().await.unwrap();
        assert_eq!(record.answers.len(), 9);
        assert_eq!(sink.len().await, 1);
        assert_eq!(sink.records().await[0].answers, record.answers);
    }

    #[tokio::test]
    async fn complete_before_answers_submits_empty_record() {
        let (chat, sink) = service(Duration::ZERO);
        chat.start().await;

        let record = chat.complete().await.unwrap();
        assert!(record.answers.is_empty());
        assert!(chat.snapshot().await.complete);

        // No dedup: a second call hands the record over again.
        chat.complete().await.unwrap();
        assert_eq!(sink.len().await, 2);
    }

    #[tokio::test]
    async fn complete_during_delay_drops_next_question() {
        let (chat, sink) = service(Duration::from_millis(30));
        chat.start().await;
        chat.answer("Family Law").await.unwrap();
        let mut rx = chat.subscribe();

        let record = chat.complete().await.unwrap();
        assert_eq!(record.transcript.len(), 2);
        chat.settle().await;

        let snapshot = chat.snapshot().await;
        assert!(snapshot.complete);
        assert!(!snapshot.reply_pending);
        assert_eq!(snapshot.transcript.len(), 2);
        assert_eq!(sink.len().await, 1);

        assert!(matches!(
            rx.recv().await.unwrap(),
            ChatEvent::Submitted { .. }
        ));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let json = serde_json::to_value(ChatEvent::SessionReset).unwrap();
        assert_eq!(json["type"], "session_reset");

        let json = serde_json::to_value(ChatEvent::Error {
            message: "nope".to_string(),
        })
        .unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["message"], "nope");
    }
}
