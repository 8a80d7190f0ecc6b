//! Error types for Legal Intake.

use std::time::Duration;

/// Top-level error type for the service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Flow error: {0}")]
    Flow(#[from] FlowError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Submission error: {0}")]
    Submission(#[from] SubmissionError),

    #[error("Account error: {0}")]
    Account(#[from] AccountError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Flow table authoring errors. These surface when a table is loaded,
/// never in the middle of a session.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("Flow table has no nodes")]
    Empty,

    #[error("Flow table is missing the entry node '{0}'")]
    MissingEntry(String),

    #[error("Duplicate node id '{0}'")]
    DuplicateNode(String),

    #[error("Node '{from}' references unknown node '{target}'")]
    UnknownNodeReference { from: String, target: String },

    #[error("Cycle detected at node '{0}'")]
    Cycle(String),

    #[error("Node '{0}' is not reachable from the entry node")]
    Unreachable(String),

    #[error("Flow key '{key}' does not match node id '{id}'")]
    KeyMismatch { key: String, id: String },

    #[error("Node '{0}' neither offers options nor accepts free text")]
    NoAnswerMode(String),

    #[error("Failed to parse flow table: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Session engine errors. All are recoverable by the caller; the session is
/// left untouched when one is returned.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Invalid answer: {reason}")]
    InvalidAnswer { reason: String },

    #[error("No session is active")]
    NotActive,

    #[error("Session is already complete")]
    AlreadyComplete,

    #[error("Waiting for the assistant's reply")]
    ReplyPending,
}

/// Errors raised while handing a finished session to a sink.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("Sink {sink} rejected the submission: {reason}")]
    Rejected { sink: String, reason: String },

    #[error("Sink {sink} timed out after {timeout:?}")]
    Timeout { sink: String, timeout: Duration },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Mock account errors.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("Invalid phone number: {0}")]
    InvalidPhone(String),

    #[error("Invalid OTP. Please try again.")]
    InvalidOtp,

    #[error("Name must not be empty")]
    EmptyName,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Shell channel errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Channel {name} disconnected: {reason}")]
    Disconnected { name: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for the service.
pub type Result<T> = std::result::Result<T, Error>;
