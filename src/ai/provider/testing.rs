//! Scripted provider for orchestration tests.

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{CompletionProvider, CompletionRequest};
use crate::types::{PrdError, Result};

/// What the scripted provider does for one call
pub enum Step {
    Respond(String),
    Fail(PrdError),
    /// Never resolves; only a deadline can end the call
    Hang,
}

type Script = Box<dyn Fn(usize, &CompletionRequest) -> Step + Send + Sync>;

pub struct ScriptedProvider {
    script: Script,
    calls: AtomicUsize,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedProvider {
    pub fn new(script: impl Fn(usize, &CompletionRequest) -> Step + Send + Sync + 'static) -> Self {
        Self {
            script: Box::new(script),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Same response for every call
    pub fn always(response: impl Into<String>) -> Self {
        let response = response.into();
        Self::new(move |_, _| Step::Respond(response.clone()))
    }

    pub fn hanging() -> Self {
        Self::new(|_, _| Step::Hang)
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        match (self.script)(index, request) {
            Step::Respond(text) => Ok(text),
            Step::Fail(err) => Err(err),
            Step::Hang => std::future::pending().await,
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }
}
