// SPDX-License-Identifier: GPL-3.0-only

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HubErrorKind {
    InvalidInput,
    NotFound,
    Unavailable,
    Timeout,
    Internal,
}

/// Failure reported by a provider or registry.
///
/// Loaders treat every kind the same way (log and retry); the kind only
/// matters to commands and to whoever reads the logs.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind:?}: {message}")]
pub struct HubError {
    pub kind: HubErrorKind,
    pub message: String,
}

impl HubError {
    pub fn new(kind: HubErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(HubErrorKind::NotFound, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(HubErrorKind::Unavailable, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(HubErrorKind::Timeout, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(HubErrorKind::Internal, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hub_error_roundtrips() {
        let error = HubError::unavailable("az exited with status 1");
        let json = serde_json::to_string(&error).expect("serialize error");
        let parsed: HubError = serde_json::from_str(&json).expect("deserialize error");
        assert_eq!(parsed, error);
    }

    #[test]
    fn display_includes_kind_and_message() {
        let error = HubError::not_found("hub 'Hub9'");
        assert_eq!(error.to_string(), "NotFound: hub 'Hub9'");
        assert_eq!(
            HubError::timeout("listing hubs").to_string(),
            "Timeout: listing hubs"
        );
    }
}
