//! Account stub: mock sign-in by phone number and one-time code.
//!
//! Independent of the chat: it shares no state with the session engine.

pub mod model;
pub mod routes;
pub mod store;
pub mod stub;

pub use model::User;
pub use routes::{AccountRouteState, account_routes};
pub use store::{AccountStore, JsonFileStore, MemoryStore};
pub use stub::AccountStub;
