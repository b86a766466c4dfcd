use std::fmt;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Which outbound call a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiCall {
    Stats,
    Analyze,
    Match,
}

impl fmt::Display for ApiCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ApiCall::Stats => "stats",
            ApiCall::Analyze => "analyze",
            ApiCall::Match => "match",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("http {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unexpected response body: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Transport,
    Status,
    Parse,
}

impl FailureKind {
    pub fn label(self) -> &'static str {
        match self {
            FailureKind::Transport => "transport",
            FailureKind::Status => "status",
            FailureKind::Parse => "parse",
        }
    }
}

impl GatewayError {
    pub fn kind(&self) -> FailureKind {
        match self {
            GatewayError::Transport(_) => FailureKind::Transport,
            GatewayError::Status { .. } => FailureKind::Status,
            GatewayError::Parse(_) => FailureKind::Parse,
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self.kind(), FailureKind::Transport)
            || matches!(self, GatewayError::Status { status, .. } if *status >= 500)
    }
}

/// Cloneable summary of a failure, carried through the delta channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureReport {
    pub call: ApiCall,
    pub kind: FailureKind,
    pub message: String,
}

impl FailureReport {
    pub fn new(call: ApiCall, err: &GatewayError) -> Self {
        Self {
            call,
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for FailureReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} error: {}", self.call, self.kind.label(), self.message)
    }
}

/// Turns a raw HTTP outcome into a typed value or a classified error.
pub fn classify<T: DeserializeOwned>(
    outcome: Result<reqwest::blocking::Response, reqwest::Error>,
) -> Result<T, GatewayError> {
    let resp = outcome?;
    let status = resp.status();
    let body = resp.text()?;
    if !status.is_success() {
        return Err(status_error(status, body));
    }
    parse_body(&body)
}

pub fn parse_body<T: DeserializeOwned>(body: &str) -> Result<T, GatewayError> {
    Ok(serde_json::from_str(body.trim())?)
}

fn status_error(status: StatusCode, body: String) -> GatewayError {
    const MAX_BODY: usize = 200;
    let body = if body.len() > MAX_BODY {
        let mut end = MAX_BODY;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body
    };
    GatewayError::Status {
        status: status.as_u16(),
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_failure_is_classified_as_parse() {
        let err = parse_body::<Vec<u32>>("{not json").unwrap_err();
        assert_eq!(err.kind(), FailureKind::Parse);
        assert!(!err.is_transient());
    }

    #[test]
    fn status_bodies_are_truncated() {
        let err = status_error(StatusCode::BAD_GATEWAY, "x".repeat(500));
        match &err {
            GatewayError::Status { status, body } => {
                assert_eq!(*status, 502);
                assert!(body.len() < 210);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.is_transient());
    }
}
