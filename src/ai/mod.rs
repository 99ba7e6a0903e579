//! AI Integration Layer
//!
//! Completion transport plus the generic machinery around it: token
//! estimation, retry/backoff, deadlines and response validation.

pub mod prompt;
pub mod provider;
pub mod retry;
pub mod timeout;
pub mod tokenizer;
pub mod validation;

pub use prompt::PromptBuilder;
pub use provider::{
    CompletionProvider, CompletionRequest, OpenAiProvider, SharedProvider, create_provider,
};
pub use retry::{Failure, RetryPolicy, execute_with_retry};
pub use timeout::{CallOutcome, race_deadline, with_timeout};
pub use tokenizer::{estimate_tokens, truncate_to_tokens};
pub use validation::{extract_json_object, parse_response, require_keys};
