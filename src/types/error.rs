//! Unified Error Type System
//!
//! Centralized error types for the entire application.
//!
//! ## Error Categories
//!
//! - **Transient**: rate limits, timeouts, connection resets (retried with backoff)
//! - **Deadline**: a tier-2 call outran its hard deadline (degrade once, then fatal)
//! - **Malformed**: unparsable or structurally wrong responses (fatal, never retried)
//! - **Cancelled**: a cooperative stop request was observed
//!
//! Failures below an orchestrator boundary (single file reads, single tier-3
//! sections) are absorbed locally and never reach this type.

use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Error Categories
// =============================================================================

/// Categories used to describe completion-service failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Rate limited by the service
    RateLimit,
    /// Connectivity issues
    Network,
    /// Temporary server issues
    Transient,
    /// Authentication failed
    Auth,
    /// The request itself was rejected
    BadRequest,
    /// The response body could not be decoded
    ParseError,
    /// Anything else
    Unknown,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RateLimit => write!(f, "RATE_LIMIT"),
            Self::Network => write!(f, "NETWORK"),
            Self::Transient => write!(f, "TRANSIENT"),
            Self::Auth => write!(f, "AUTH"),
            Self::BadRequest => write!(f, "BAD_REQUEST"),
            Self::ParseError => write!(f, "PARSE_ERROR"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// =============================================================================
// Completion Error
// =============================================================================

/// Completion-service error with category and provider context
#[derive(Debug, Clone)]
pub struct CompletionError {
    pub category: ErrorCategory,
    pub message: String,
    pub provider: Option<String>,
}

impl std::fmt::Display for CompletionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(provider) = &self.provider {
            write!(f, "[{}:{}] {}", provider, self.category, self.message)
        } else {
            write!(f, "[{}] {}", self.category, self.message)
        }
    }
}

impl std::error::Error for CompletionError {}

impl CompletionError {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            provider: None,
        }
    }

    pub fn with_provider(
        category: ErrorCategory,
        message: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            category,
            message: message.into(),
            provider: Some(provider.into()),
        }
    }
}

// =============================================================================
// Error Classifier
// =============================================================================

/// Maps raw transport messages and HTTP statuses to categories
pub struct ErrorClassifier;

impl ErrorClassifier {
    /// Classify an error message from the transport layer
    pub fn classify(message: &str, provider: &str) -> CompletionError {
        let lower = message.to_lowercase();

        let category = if lower.contains("rate limit")
            || lower.contains("429")
            || lower.contains("too many requests")
        {
            ErrorCategory::RateLimit
        } else if lower.contains("401")
            || lower.contains("403")
            || lower.contains("api key")
            || lower.contains("unauthorized")
        {
            ErrorCategory::Auth
        } else if lower.contains("timeout")
            || lower.contains("timed out")
            || lower.contains("connection")
            || lower.contains("dns")
        {
            ErrorCategory::Network
        } else if lower.contains("502")
            || lower.contains("503")
            || lower.contains("504")
            || lower.contains("overloaded")
        {
            ErrorCategory::Transient
        } else if lower.contains("400") || lower.contains("bad request") {
            ErrorCategory::BadRequest
        } else if lower.contains("decode") || lower.contains("json") {
            ErrorCategory::ParseError
        } else {
            ErrorCategory::Unknown
        };

        CompletionError::with_provider(category, message, provider)
    }

    /// Classify an HTTP status code directly (more accurate than string matching)
    pub fn classify_http_status(status: u16, message: &str, provider: &str) -> CompletionError {
        let category = match status {
            429 => ErrorCategory::RateLimit,
            401 | 403 => ErrorCategory::Auth,
            400 | 404 | 422 => ErrorCategory::BadRequest,
            408 => ErrorCategory::Network,
            500 | 502 | 503 | 504 | 529 => ErrorCategory::Transient,
            _ => ErrorCategory::Unknown,
        };
        // Keep the status in the message so signature matching sees it
        CompletionError::with_provider(category, format!("HTTP {}: {}", status, message), provider)
    }
}

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum PrdError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // -------------------------------------------------------------------------
    // Completion Errors
    // -------------------------------------------------------------------------
    #[error("Completion error: {0}")]
    Completion(CompletionError),

    /// Response was not JSON or lacked a required key
    #[error("Malformed response from {stage}: {reason}")]
    MalformedResponse { stage: String, reason: String },

    /// Operation timeout with context
    #[error("Timeout after {duration:?}: {operation}")]
    Timeout {
        operation: String,
        duration: Duration,
    },

    // -------------------------------------------------------------------------
    // Orchestration Errors
    // -------------------------------------------------------------------------
    /// Tier-2 exhausted its degradation budget
    #[error(
        "Deadline of {timeout:?} exceeded after {attempts} calls (last prompt ~{estimated_tokens} tokens)"
    )]
    DeadlineExceeded {
        timeout: Duration,
        estimated_tokens: usize,
        attempts: u32,
    },

    #[error("{operation} failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        operation: String,
        attempts: u32,
        #[source]
        source: Box<PrdError>,
    },

    #[error("Run cancelled")]
    Cancelled,

    // -------------------------------------------------------------------------
    // Domain Errors
    // -------------------------------------------------------------------------
    #[error("Scan error: {0}")]
    Scan(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl From<CompletionError> for PrdError {
    fn from(err: CompletionError) -> Self {
        PrdError::Completion(err)
    }
}

pub type Result<T> = std::result::Result<T, PrdError>;

impl PrdError {
    pub fn malformed(stage: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            stage: stage.into(),
            reason: reason.into(),
        }
    }

    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Errors that no retry can fix, whatever their message says
    pub fn is_structurally_fatal(&self) -> bool {
        matches!(
            self,
            Self::MalformedResponse { .. }
                | Self::Json(_)
                | Self::Config(_)
                | Self::Cancelled
                | Self::RetriesExhausted { .. }
                | Self::DeadlineExceeded { .. }
        )
    }
}

// =============================================================================
// Tests
// =============================================================================
