//! Generation sessions: opaque ids, background pipelines, status and artifact lifecycle.

use std::fmt;
use std::str::FromStr;

use crate::foundation::error::WheelError;

/// Session registry and pipeline kick-off.
pub mod registry;
/// TTL eviction of sessions and orphaned artifacts.
pub mod retention;

pub use registry::{SessionManager, SessionSettings, StatusReport};

/// Opaque session identifier (random UUID v4).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(transparent)]
pub struct SessionId(uuid::Uuid);

impl SessionId {
    /// Fresh random id.
    pub fn new_v4() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Output file name for this session.
    pub fn artifact_name(&self) -> String {
        format!("{ARTIFACT_PREFIX}{self}{ARTIFACT_SUFFIX}")
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.as_hyphenated().fmt(f)
    }
}

/// Malformed ids are reported as unknown sessions, so they can never name a path.
impl FromStr for SessionId {
    type Err = WheelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| WheelError::not_found(format!("session '{s}'")))
    }
}

/// Prefix of every generated MP4.
pub const ARTIFACT_PREFIX: &str = "wheel_";
/// Extension of every generated MP4.
pub const ARTIFACT_SUFFIX: &str = ".mp4";

/// Lifecycle state of a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionStatus {
    /// Pipeline queued or running.
    Pending,
    /// Artifact written.
    Ready,
    /// Pipeline failed; the message is safe to show to clients.
    Failed {
        /// Error description.
        error: String,
    },
    /// Pipeline stopped by delete, eviction or shutdown.
    Cancelled,
}

impl SessionStatus {
    /// Wire name used by `/api/status`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Ready => "ready",
            Self::Failed { .. } => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/mod.rs"]
mod tests;
