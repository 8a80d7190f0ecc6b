//! Session engine: one visitor's walk through the questionnaire.
//!
//! A session starts at the flow's entry node, records one answer per node,
//! and keeps the assistant/visitor transcript for display. When the last
//! node is answered a closing message is appended and the session is
//! complete; `finalize` hands the collected answers to a submission sink.

pub mod engine;
pub mod model;
pub mod pacing;
pub mod state;

pub use engine::{PendingReply, Session, SessionOptions};
pub use model::{AnswerRecord, Message, Sender, SessionSnapshot, SubmissionRecord};
pub use pacing::{Pacer, ScheduledReply};
pub use state::SessionPhase;
