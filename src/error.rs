// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use thiserror::Error;

/// Failures surfaced by the API gateway.
///
/// Cache problems never show up here: a broken cache entry is a miss and a
/// failed cache write is only logged.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with a non-success status code.
    #[error("Network error {0}")]
    Status(u16),

    /// The request never produced a response.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    /// The body was not valid JSON.
    #[error(transparent)]
    Parse(#[from] serde_json::Error),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status(code) => Some(*code),
            _ => None,
        }
    }
}

/// Raised when a manually chosen source has no URL to play.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlayError {
    #[error("No playable url")]
    NoPlayableUrl,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_message_carries_code() {
        let err = ApiError::Status(404);
        assert_eq!(err.to_string(), "Network error 404");
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn parse_error_has_no_status() {
        let err: ApiError = serde_json::from_str::<serde_json::Value>("{nope")
            .unwrap_err()
            .into();
        assert!(matches!(err, ApiError::Parse(_)));
        assert_eq!(err.status(), None);
    }
}
