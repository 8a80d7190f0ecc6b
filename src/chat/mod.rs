//! Chat: the shell-facing service around the session engine.
//!
//! `ChatService` owns the one visitor session, paces assistant replies, and
//! fans every transcript change out to connected shells. The routes expose
//! it over REST and a WebSocket.

pub mod routes;
pub mod service;
pub mod ws;

pub use routes::{ChatRouteState, chat_routes};
pub use service::{ChatEvent, ChatService};
