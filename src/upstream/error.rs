//! Upstream fetch errors
//!
//! Every failure of the status API is reported as a [`FetchError`] whose
//! kind tells the orchestrator whether falling back is allowed.

use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

// == Fetch Error Kind ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchErrorKind {
    /// Host name could not be resolved
    Dns,
    /// Connection refused, reset or otherwise broken
    Network,
    /// Upstream answered with a non-2xx status
    Http,
    /// No answer within the request timeout
    Timeout,
    /// Body was not JSON or not a recognised envelope
    Shape,
    /// A node inside a valid envelope could not be mapped
    Normalization,
}

impl FetchErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dns => "dns",
            Self::Network => "network",
            Self::Http => "http",
            Self::Timeout => "timeout",
            Self::Shape => "shape",
            Self::Normalization => "normalization",
        }
    }

    /// Transport and shape failures fall through to the next source.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Normalization)
    }

    /// Failures worth another attempt when retries are configured.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network | Self::Timeout)
    }
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// == Fetch Error ==
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} error: {message}")]
pub struct FetchError {
    pub kind: FetchErrorKind,
    /// Upstream or transport message
    pub message: String,
    /// HTTP status for `Http` failures
    pub status: Option<u16>,
}

impl FetchError {
    pub fn new(kind: FetchErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            ..Self::new(FetchErrorKind::Http, message)
        }
    }

    pub fn is_recoverable(&self) -> bool {
        self.kind.is_recoverable()
    }

    /// Classifies a transport error from the HTTP client.
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        let message = error_chain(err);

        if err.is_timeout() {
            Self::new(FetchErrorKind::Timeout, message)
        } else if let Some(status) = err.status() {
            Self::http(status.as_u16(), message)
        } else if err.is_decode() {
            Self::new(FetchErrorKind::Shape, message)
        } else if mentions_dns(&message) {
            Self::new(FetchErrorKind::Dns, message)
        } else {
            Self::new(FetchErrorKind::Network, message)
        }
    }
}

/// Joins an error and its sources, since reqwest keeps the useful part
/// (resolver or socket error) in the source chain.
fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut parts = vec![err.to_string()];
    let mut current = err.source();
    while let Some(source) = current {
        let text = source.to_string();
        if !parts.iter().any(|part| part.contains(&text)) {
            parts.push(text);
        }
        current = source.source();
    }
    parts.join(": ")
}

fn mentions_dns(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    [
        "dns error",
        "failed to lookup address",
        "name or service not known",
        "no such host",
        "nodename nor servname",
    ]
    .iter()
    .any(|needle| lower.contains(needle))
}
