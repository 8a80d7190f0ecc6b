//! Local shells for the chat.

pub mod cli;

pub use cli::{CliChannel, CliCommand};
