//! Error types for beat-exporter
//!
//! This module defines the error types used throughout the application.

use thiserror::Error;

/// 에러 분류
///
/// 수집 사이클을 중단시킨 원인을 세 갈래로 나눕니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 설정 또는 URL 구성 문제
    Config,
    /// 연결, DNS, 타임아웃 등 전송 계층 실패
    Network,
    /// 응답 본문 또는 TLS 자료 해석 실패
    Decode,
}

/// Collector 모듈 에러 타입
#[derive(Error, Debug)]
pub enum CollectorError {
    /// 잘못된 설정값
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// URL 파싱 실패
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// TLS 인증서/키 로드 실패
    #[error("TLS configuration error: {0}")]
    Tls(String),

    /// HTTP 클라이언트 초기화 실패
    #[error("Failed to initialize HTTP client: {0}")]
    HttpClientInit(#[source] reqwest::Error),

    /// 타임아웃
    /// The value is the configured timeout in milliseconds, if known.
    #[error("Request timed out{}", .0.map(|ms| format!(" after {}ms", ms)).unwrap_or_default())]
    Timeout(Option<u64>),

    /// 연결 실패
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// HTTP 요청 실패
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[source] reqwest::Error),

    /// HTTP 응답 읽기 실패
    #[error("Failed to read HTTP response: {0}")]
    HttpResponse(#[source] reqwest::Error),

    /// JSON 파싱 에러
    #[error("JSON parse error: {0}")]
    JsonParse(String),
}

impl CollectorError {
    /// 에러 분류 반환
    pub fn kind(&self) -> ErrorKind {
        match self {
            CollectorError::Config(_) | CollectorError::InvalidUrl { .. } => ErrorKind::Config,
            CollectorError::HttpClientInit(_)
            | CollectorError::Timeout(_)
            | CollectorError::ConnectionFailed(_)
            | CollectorError::HttpRequest(_)
            | CollectorError::HttpResponse(_) => ErrorKind::Network,
            CollectorError::Tls(_) | CollectorError::JsonParse(_) => ErrorKind::Decode,
        }
    }

    /// Create a Timeout error with known duration
    pub fn timeout_with_duration(ms: u64) -> Self {
        CollectorError::Timeout(Some(ms))
    }
}

impl From<reqwest::Error> for CollectorError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            // reqwest doesn't expose the configured timeout; callers that know it
            // should use CollectorError::timeout_with_duration() instead.
            CollectorError::Timeout(None)
        } else if err.is_connect() {
            CollectorError::ConnectionFailed(err.to_string())
        } else if err.is_decode() || err.is_body() {
            CollectorError::HttpResponse(err)
        } else {
            CollectorError::HttpRequest(err)
        }
    }
}

impl From<serde_json::Error> for CollectorError {
    fn from(err: serde_json::Error) -> Self {
        CollectorError::JsonParse(err.to_string())
    }
}
