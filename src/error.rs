//! Unified client error model.
//! Every failure a view can observe (validation, transport, HTTP status, session,
//! persistence, navigation) is folded into one enum so callers only ever need
//! `message()` to show something to the user.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::storage::StorageError;

/// Message surfaced when no response was received at all.
pub const GENERIC_FAILURE: &str = "Something went wrong";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientError {
    /// Rejected before any network call was issued.
    Validation { field: String, message: String },
    /// No response received (connect, TLS, timeout, body read).
    Transport { message: String, detail: String },
    /// Backend answered with a non-success status.
    Http { status: u16, message: String, detail: Option<String> },
    /// Success status but the body did not match the expected schema.
    Decode { message: String },
    /// Operation needs a session the client does not hold.
    Session { message: String },
    /// Durable session storage could not be read or written.
    Storage { message: String },
    Navigation { message: String },
    /// The owning view was navigated away from before the call completed.
    Cancelled,
}

impl ClientError {
    pub fn code_str(&self) -> &'static str {
        match self {
            ClientError::Validation { .. } => "validation",
            ClientError::Transport { .. } => "transport",
            ClientError::Http { .. } => "http",
            ClientError::Decode { .. } => "decode",
            ClientError::Session { .. } => "session",
            ClientError::Storage { .. } => "storage",
            ClientError::Navigation { .. } => "navigation",
            ClientError::Cancelled => "cancelled",
        }
    }

    /// Human-readable message, always present.
    pub fn message(&self) -> &str {
        match self {
            ClientError::Validation { message, .. }
            | ClientError::Transport { message, .. }
            | ClientError::Http { message, .. }
            | ClientError::Decode { message }
            | ClientError::Session { message }
            | ClientError::Storage { message }
            | ClientError::Navigation { message } => message.as_str(),
            ClientError::Cancelled => "request cancelled by navigation",
        }
    }

    pub fn validation<F: Into<String>, M: Into<String>>(field: F, msg: M) -> Self {
        ClientError::Validation { field: field.into(), message: msg.into() }
    }
    pub fn transport<S: Into<String>>(detail: S) -> Self {
        ClientError::Transport { message: GENERIC_FAILURE.to_string(), detail: detail.into() }
    }
    pub fn decode<S: Into<String>>(msg: S) -> Self { ClientError::Decode { message: msg.into() } }
    pub fn session<S: Into<String>>(msg: S) -> Self { ClientError::Session { message: msg.into() } }
    pub fn navigation<S: Into<String>>(msg: S) -> Self { ClientError::Navigation { message: msg.into() } }

    /// HTTP status carried by the error, if the backend answered.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the failure happened before anything left the process.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            ClientError::Validation { .. } | ClientError::Session { .. } | ClientError::Navigation { .. }
        )
    }
}

impl Display for ClientError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code_str(), self.message())
    }
}

impl std::error::Error for ClientError {}

pub type ClientResult<T> = Result<T, ClientError>;

impl From<StorageError> for ClientError {
    fn from(err: StorageError) -> Self {
        ClientError::Storage { message: err.to_string() }
    }
}
