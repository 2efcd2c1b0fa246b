// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake reasoning runner for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{ReasoningError, ReasoningRunner};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

struct FakeState {
    responses: VecDeque<Result<String, ReasoningError>>,
    prompts: Vec<String>,
}

/// Fake reasoning runner serving scripted responses in order.
///
/// When the script runs dry it answers "WAIT", which is the safe default
/// the bridge would also fall back to.
#[derive(Clone)]
pub struct FakeReasoningRunner {
    inner: Arc<Mutex<FakeState>>,
}

impl Default for FakeReasoningRunner {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeState {
                responses: VecDeque::new(),
                prompts: Vec::new(),
            })),
        }
    }
}

impl FakeReasoningRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful response.
    pub fn push_response(&self, text: impl Into<String>) {
        self.inner.lock().responses.push_back(Ok(text.into()));
    }

    /// Queue an error response.
    pub fn push_error(&self, error: ReasoningError) {
        self.inner.lock().responses.push_back(Err(error));
    }

    /// Prompts received so far.
    pub fn prompts(&self) -> Vec<String> {
        self.inner.lock().prompts.clone()
    }
}

#[async_trait]
impl ReasoningRunner for FakeReasoningRunner {
    async fn run(&self, prompt: &str) -> Result<String, ReasoningError> {
        let mut inner = self.inner.lock();
        inner.prompts.push(prompt.to_string());
        inner
            .responses
            .pop_front()
            .unwrap_or_else(|| Ok("WAIT".to_string()))
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
