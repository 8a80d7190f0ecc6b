//! Legal Intake: guided questionnaire for legal help requests.

pub mod account;
pub mod channels;
pub mod chat;
pub mod config;
pub mod error;
pub mod flow;
pub mod server;
pub mod session;
pub mod submission;
