//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! A loaded `Config` is read-only for the rest of the run.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ai::retry::RetryPolicy;
use crate::constants::{evidence, network, retry, scan, tiers, tokens};
use crate::types::{PrdError, Result, SectionKind};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// Completion service settings
    pub llm: LlmConfig,

    /// Repository scanning settings
    pub scan: ScanConfig,

    /// Evidence collection settings
    pub evidence: EvidenceConfig,

    /// Strategy tier settings
    pub tier2: Tier2Config,

    /// Section tier settings
    pub tier3: Tier3Config,

    /// Retry/backoff settings shared by both tiers
    pub retry: RetryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            llm: LlmConfig::default(),
            scan: ScanConfig::default(),
            evidence: EvidenceConfig::default(),
            tier2: Tier2Config::default(),
            tier3: Tier3Config::default(),
            retry: RetryConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub fn validate(&self) -> Result<()> {
        for (name, temperature) in [
            ("tier2", self.tier2.temperature),
            ("tier3", self.tier3.temperature),
        ] {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(PrdError::Config(format!(
                    "{} temperature must be between 0.0 and 2.0, got {}",
                    name, temperature
                )));
            }
        }

        if self.llm.timeout_secs == 0 {
            return Err(PrdError::Config(
                "llm.timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.tier2.deadline_ms == 0 {
            return Err(PrdError::Config(
                "tier2.deadline_ms must be greater than 0".to_string(),
            ));
        }

        if self.tier2.max_input_tokens == 0 || self.tier3.max_input_tokens == 0 {
            return Err(PrdError::Config(
                "max_input_tokens must be greater than 0".to_string(),
            ));
        }

        if self.retry.backoff_multiplier < 1.0 {
            return Err(PrdError::Config(format!(
                "retry.backoff_multiplier must be at least 1.0, got {}",
                self.retry.backoff_multiplier
            )));
        }

        if self.retry.initial_delay_ms > self.retry.max_delay_ms {
            return Err(PrdError::Config(
                "retry.initial_delay_ms must not exceed retry.max_delay_ms".to_string(),
            ));
        }

        Ok(())
    }
}

// =============================================================================
// LLM Configuration
// =============================================================================

/// Note: the API key is never serialized and is redacted in debug output.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name (currently `openai`, any OpenAI-compatible endpoint)
    pub provider: String,

    /// Model name
    pub model: String,

    /// API base URL (for custom endpoints)
    pub api_base: Option<String>,

    /// API key; falls back to `OPENAI_API_KEY`
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// HTTP request timeout in seconds
    pub timeout_secs: u64,

    /// Maximum tokens to generate per call
    pub max_output_tokens: usize,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .field("max_output_tokens", &self.max_output_tokens)
            .finish()
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_base: None,
            api_key: None,
            timeout_secs: network::DEFAULT_TIMEOUT_SECS,
            max_output_tokens: network::DEFAULT_MAX_OUTPUT_TOKENS,
        }
    }
}

// =============================================================================
// Scan Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Directory names never descended into
    pub skip_dirs: Vec<String>,

    /// Maximum file size in bytes read by detectors
    pub max_file_size: u64,

    /// Maximum files considered
    pub max_files: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            skip_dirs: scan::SKIP_DIRS.iter().map(|d| d.to_string()).collect(),
            max_file_size: scan::MAX_FILE_SIZE,
            max_files: scan::MAX_FILES,
        }
    }
}

// =============================================================================
// Evidence Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvidenceConfig {
    /// Append a synthesized structural summary of the extracted facts
    pub include_code_summary: bool,
    pub max_doc_files: usize,
    pub max_doc_bytes: usize,
    pub max_config_files: usize,
    pub max_test_files: usize,
}

impl Default for EvidenceConfig {
    fn default() -> Self {
        Self {
            include_code_summary: true,
            max_doc_files: evidence::MAX_DOC_FILES,
            max_doc_bytes: evidence::MAX_DOC_BYTES,
            max_config_files: evidence::MAX_CONFIG_FILES,
            max_test_files: evidence::MAX_TEST_FILES,
        }
    }
}

// =============================================================================
// Tier Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tier2Config {
    /// Token ceiling for the whole prompt (system + user)
    pub max_input_tokens: usize,

    /// Hard deadline per call, retries included (milliseconds)
    pub deadline_ms: u64,

    pub temperature: f32,
}

impl Tier2Config {
    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }
}

impl Default for Tier2Config {
    fn default() -> Self {
        Self {
            max_input_tokens: tokens::TIER2_MAX_INPUT_TOKENS,
            deadline_ms: tiers::TIER2_DEADLINE_SECS * 1000,
            temperature: tiers::TIER2_TEMPERATURE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tier3Config {
    /// Token ceiling for each section prompt
    pub max_input_tokens: usize,

    pub temperature: f32,

    /// Sections to generate, in order
    pub sections: Vec<SectionKind>,
}

impl Default for Tier3Config {
    fn default() -> Self {
        Self {
            max_input_tokens: tokens::TIER3_MAX_INPUT_TOKENS,
            temperature: tiers::TIER3_TEMPERATURE,
            sections: SectionKind::ALL.to_vec(),
        }
    }
}

// =============================================================================
// Retry Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f32,
    /// Lower-case substrings that mark an error as transient
    pub retryable_signatures: Vec<String>,
}

impl RetryConfig {
    /// Value object handed to the retry executor
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            initial_delay: Duration::from_millis(self.initial_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            backoff_multiplier: self.backoff_multiplier,
            retryable_signatures: self.retryable_signatures.clone(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: retry::DEFAULT_MAX_RETRIES,
            initial_delay_ms: retry::INITIAL_DELAY_MS,
            max_delay_ms: retry::MAX_DELAY_MS,
            backoff_multiplier: retry::BACKOFF_MULTIPLIER,
            retryable_signatures: retry::RETRYABLE_SIGNATURES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
