//! Error taxonomy of the service layer.
//!
//! Two families reach the caller: [`ValidationError`] for malformed input
//! or malformed provider output (local, never retried), and
//! [`ProviderError`] for transport or provider-side failures.

use thiserror::Error;

/// A value did not match the input or output schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid `{field}`: {constraint}")]
pub struct ValidationError {
    /// Name of the offending field (`query` or `response`).
    pub field: &'static str,
    /// Human-readable description of the violated constraint.
    pub constraint: String,
}

impl ValidationError {
    pub fn new(field: &'static str, constraint: impl Into<String>) -> Self {
        Self {
            field,
            constraint: constraint.into(),
        }
    }
}

/// The model provider could not be reached or refused the request.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{provider} request failed: {source}")]
    Transport {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} API error ({status}): {message}")]
    Api {
        provider: &'static str,
        status: reqwest::StatusCode,
        message: String,
    },

    #[error("{provider} returned an undecodable reply: {source}")]
    Decode {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

/// Error returned by the inbound `process_query` call.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl ServiceError {
    /// True when the caller's own input was rejected (as opposed to the
    /// provider or its output).
    pub fn is_input_rejection(&self) -> bool {
        matches!(self, ServiceError::Validation(e) if e.field == "query")
    }
}
