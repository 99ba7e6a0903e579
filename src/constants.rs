//! Global Constants
//!
//! Centralized constants for configuration and tuning.
//! All magic numbers should be defined here with documentation.

/// Token estimation constants
pub mod tokens {
    /// Characters per estimated token.
    ///
    /// This is a fixed approximation, not a tokenizer. Every ceiling in the
    /// pipeline is enforced against this estimate.
    pub const CHARS_PER_TOKEN: usize = 4;

    /// Default ceiling for the tier-2 (strategy) prompt
    pub const TIER2_MAX_INPUT_TOKENS: usize = 24_000;

    /// Default ceiling for each tier-3 (section) prompt
    pub const TIER3_MAX_INPUT_TOKENS: usize = 16_000;
}

/// Retry executor constants
pub mod retry {
    /// Additional attempts after the first
    pub const DEFAULT_MAX_RETRIES: u32 = 3;

    /// Delay before the first retry (milliseconds)
    pub const INITIAL_DELAY_MS: u64 = 1_000;

    /// Maximum delay between retries (milliseconds)
    pub const MAX_DELAY_MS: u64 = 30_000;

    /// Backoff multiplier
    pub const BACKOFF_MULTIPLIER: f32 = 2.0;

    /// Substrings marking a failure as transient
    pub const RETRYABLE_SIGNATURES: &[&str] = &[
        "rate limit",
        "rate_limit",
        "429",
        "too many requests",
        "timeout",
        "timed out",
        "econnreset",
        "connection reset",
        "connection closed",
        "socket hang up",
        "overloaded",
        "502",
        "503",
        "504",
    ];
}

/// Tier orchestration constants
pub mod tiers {
    /// Hard deadline for one tier-2 call, retries included (seconds)
    pub const TIER2_DEADLINE_SECS: u64 = 180;

    /// Sampling temperature for the strategy tier
    pub const TIER2_TEMPERATURE: f32 = 0.4;

    /// Sampling temperature for the section tier
    pub const TIER3_TEMPERATURE: f32 = 0.2;
}

/// Repository scanning constants
pub mod scan {
    /// Directories never descended into
    pub const SKIP_DIRS: &[&str] = &[
        "node_modules",
        ".git",
        ".hg",
        ".svn",
        "dist",
        "build",
        "out",
        ".next",
        ".nuxt",
        ".svelte-kit",
        ".turbo",
        ".expo",
        ".cache",
        "coverage",
        "target",
        "vendor",
        "__pycache__",
        ".venv",
        "venv",
        "Pods",
        "__MACOSX",
    ];

    /// Maximum file size read by the detectors (1MB)
    pub const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Maximum number of files considered in one scan
    pub const MAX_FILES: usize = 20_000;
}

/// Evidence collection constants
pub mod evidence {
    /// Maximum documentation files collected from docs directories
    pub const MAX_DOC_FILES: usize = 25;

    /// Maximum bytes read from any single evidence file
    pub const MAX_DOC_BYTES: usize = 200_000;

    /// Maximum config files collected
    pub const MAX_CONFIG_FILES: usize = 8;

    /// Maximum test files collected
    pub const MAX_TEST_FILES: usize = 5;
}

/// HTTP/Network constants
pub mod network {
    /// Default request timeout (seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

    /// Maximum tokens the completion service may generate
    pub const DEFAULT_MAX_OUTPUT_TOKENS: usize = 8_192;
}
