// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::fmt;

pub const GENERIC_FAILURE: &str = "request failed";

/// Failure classes of a backend round trip. Transport failures and non-2xx
/// statuses are reported the same way to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    Transport(String),
    Status { code: u16, message: Option<String> },
    Malformed(String),
    Rejected { message: Option<String> },
}

impl ApiError {
    /// Message supplied by the server, if the body carried one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Status { message, .. } | Self::Rejected { message } => message
                .as_deref()
                .map(str::trim)
                .filter(|message| !message.is_empty()),
            Self::Transport(_) | Self::Malformed(_) => None,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(detail) => write!(f, "cannot reach server: {detail}"),
            Self::Status { code, message } => match message {
                Some(message) => write!(f, "server error ({code}): {message}"),
                None => write!(f, "server returned {code}"),
            },
            Self::Malformed(detail) => write!(f, "malformed response: {detail}"),
            Self::Rejected { message } => match message {
                Some(message) => write!(f, "request rejected: {message}"),
                None => f.write_str("request rejected"),
            },
        }
    }
}

impl std::error::Error for ApiError {}

/// Client-side form failure; never reaches the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ValidationError {}

/// Text shown to the user for a failed operation.
pub fn failure_message(error: &anyhow::Error) -> String {
    if let Some(validation) = error.downcast_ref::<ValidationError>() {
        return validation.to_string();
    }
    if let Some(api) = error.downcast_ref::<ApiError>() {
        return api
            .server_message()
            .map_or_else(|| GENERIC_FAILURE.to_owned(), str::to_owned);
    }
    GENERIC_FAILURE.to_owned()
}

#[cfg(test)]
mod tests {
    use super::{ApiError, GENERIC_FAILURE, ValidationError, failure_message};

    #[test]
    fn server_message_is_shown_verbatim() {
        let error = anyhow::Error::new(ApiError::Rejected {
            message: Some("名称已存在".to_owned()),
        });
        assert_eq!(failure_message(&error), "名称已存在");
    }

    #[test]
    fn unparseable_bodies_fall_back_to_generic_message() {
        let error = anyhow::Error::new(ApiError::Malformed("expected value".to_owned()));
        assert_eq!(failure_message(&error), GENERIC_FAILURE);

        let error = anyhow::Error::new(ApiError::Status {
            code: 502,
            message: Some("   ".to_owned()),
        });
        assert_eq!(failure_message(&error), GENERIC_FAILURE);
    }

    #[test]
    fn validation_errors_keep_their_text_through_context() {
        let error = anyhow::Error::new(ValidationError::new("name is required"))
            .context("save packaging");
        assert_eq!(failure_message(&error), "name is required");
    }
}
