//! Flow definition: the fixed questionnaire a session walks through.
//!
//! A flow is a chain of question nodes starting at the reserved `start`
//! node. Each node names the field its answer is stored under and the node
//! that follows it; the same successor is taken whatever the answer.

pub mod legal;
pub mod model;

pub use legal::{legal_intake_flow, legal_intake_nodes};
pub use model::{ENTRY_NODE, FlowTable, NodeId, QuestionNode};
