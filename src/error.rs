//! Error types for check-wildfly
//!
//! Every failure of a check run ends up in [`CheckError`], which the check
//! engine converts into exactly one terminal status line.

use serde_json::Value;
use thiserror::Error;

use crate::check::Status;

/// Management API 통신 에러 타입
#[derive(Error, Debug)]
pub enum TransportError {
    /// HTTP 클라이언트 초기화 실패
    #[error("Failed to initialize HTTP client: {0}")]
    HttpClientInit(#[source] reqwest::Error),

    /// HTTP 요청 실패
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[source] reqwest::Error),

    /// HTTP 응답 읽기 실패
    #[error("Failed to read HTTP response: {0}")]
    HttpResponse(#[source] reqwest::Error),

    /// HTTP 상태 코드 에러
    #[error("HTTP error status: {0}")]
    HttpStatus(u16),

    /// JSON 파싱 에러
    #[error("JSON parse error: {0}")]
    JsonParse(String),

    /// 잘못된 요청 URL
    #[error("Invalid management URL: {0}")]
    InvalidUrl(String),

    /// 타임아웃 (설정된 값, 밀리초)
    #[error("Request timed out{}", .0.map(|ms| format!(" after {}ms", ms)).unwrap_or_default())]
    Timeout(Option<u64>),

    /// 연결 실패
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Digest 챌린지 응답 실패
    #[error("Digest authentication failed: {0}")]
    DigestChallenge(String),

    /// 인증 실패
    #[error("Authentication failed")]
    AuthenticationFailed,
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            // reqwest does not expose the configured duration; use
            // TransportError::timeout_with_duration() when it is known.
            TransportError::Timeout(None)
        } else if err.is_connect() {
            TransportError::ConnectionFailed(err.to_string())
        } else if err.is_request() {
            TransportError::HttpRequest(err)
        } else {
            TransportError::HttpResponse(err)
        }
    }
}

impl TransportError {
    /// 타임아웃 값이 포함된 Timeout 에러 생성
    pub fn timeout_with_duration(ms: u64) -> Self {
        TransportError::Timeout(Some(ms))
    }
}

/// Top-level error of a check run
#[derive(Error, Debug)]
pub enum CheckError {
    /// Network or HTTP failure
    #[error("{0}")]
    Transport(#[from] TransportError),

    /// The management API answered with `"outcome": "failed"`
    #[error("Unexpected value : {payload}")]
    RemoteRejected { payload: Value },

    /// A user supplied option is not acceptable
    #[error("{0}")]
    InvalidParameter(String),

    /// An expected key is absent from the response
    #[error("Missing field '{path}' in management response")]
    MissingField { path: String },

    /// Configuration could not be loaded or validated
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl CheckError {
    /// Build an `InvalidParameter` error
    pub fn invalid(message: impl Into<String>) -> Self {
        CheckError::InvalidParameter(message.into())
    }

    /// Build a `MissingField` error for a dotted field path
    pub fn missing(path: impl Into<String>) -> Self {
        CheckError::MissingField { path: path.into() }
    }

    /// Terminal status for this failure
    ///
    /// Transport and configuration problems say nothing about the server's
    /// health and are reported as UNKNOWN; everything else is CRITICAL.
    pub fn status(&self) -> Status {
        match self {
            CheckError::Transport(_) | CheckError::Config(_) => Status::Unknown,
            CheckError::RemoteRejected { .. }
            | CheckError::InvalidParameter(_)
            | CheckError::MissingField { .. } => Status::Critical,
        }
    }
}

/// Result type alias for check errors
pub type CheckResult<T> = Result<T, CheckError>;
