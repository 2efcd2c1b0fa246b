// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake multiplexer adapter for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{MuxAdapter, MuxError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Recorded multiplexer call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MuxCall {
    EnsureSession,
    CreateWindow { name: String, command: String },
    KillWindow { target: String },
    KillSession,
    CapturePane { target: String },
    SendText { target: String, text: String },
    SendKey { target: String, key: String },
    StartPipePane { target: String, file: PathBuf },
}

/// Scripted state for one fake window
#[derive(Debug, Clone, Default)]
struct FakeWindow {
    pane: String,
    sent: Vec<String>,
    keys: Vec<String>,
}

struct FakeMuxState {
    session: String,
    session_count: u32,
    windows: HashMap<String, FakeWindow>,
    file_sizes: HashMap<PathBuf, u64>,
    calls: Vec<MuxCall>,
    default_pane: String,
}

/// Fake multiplexer adapter for testing.
///
/// Pane text and pipe-file sizes are scripted by the test; every call is
/// recorded for assertion.
#[derive(Clone)]
pub struct FakeMuxAdapter {
    inner: Arc<Mutex<FakeMuxState>>,
}

impl FakeMuxAdapter {
    pub fn new(session: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeMuxState {
                session: session.into(),
                session_count: 0,
                windows: HashMap::new(),
                file_sizes: HashMap::new(),
                calls: Vec::new(),
                default_pane: String::new(),
            })),
        }
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<MuxCall> {
        self.inner.lock().calls.clone()
    }

    /// Number of live sessions (0 or 1)
    pub fn session_count(&self) -> u32 {
        self.inner.lock().session_count
    }

    /// Pane content newly created windows start with
    pub fn set_default_pane(&self, pane: impl Into<String>) {
        self.inner.lock().default_pane = pane.into();
    }

    /// Script the pane content a window will render
    pub fn set_pane(&self, target: &str, pane: impl Into<String>) {
        if let Some(window) = self.inner.lock().windows.get_mut(target) {
            window.pane = pane.into();
        }
    }

    /// Script a file size returned by `file_size`
    pub fn set_file_size(&self, path: &Path, size: u64) {
        self.inner.lock().file_sizes.insert(path.to_path_buf(), size);
    }

    /// Text sent to a window via `send_text`
    pub fn sent_text(&self, target: &str) -> Vec<String> {
        self.inner
            .lock()
            .windows
            .get(target)
            .map(|w| w.sent.clone())
            .unwrap_or_default()
    }

    /// Keys sent to a window via `send_key`
    pub fn sent_keys(&self, target: &str) -> Vec<String> {
        self.inner
            .lock()
            .windows
            .get(target)
            .map(|w| w.keys.clone())
            .unwrap_or_default()
    }

    /// Targets of windows that currently exist
    pub fn window_targets(&self) -> Vec<String> {
        let mut targets: Vec<String> = self.inner.lock().windows.keys().cloned().collect();
        targets.sort();
        targets
    }
}

#[async_trait]
impl MuxAdapter for FakeMuxAdapter {
    async fn ensure_session(&self) -> Result<(), MuxError> {
        let mut inner = self.inner.lock();
        inner.calls.push(MuxCall::EnsureSession);
        if inner.session_count == 0 {
            inner.session_count = 1;
        }
        Ok(())
    }

    async fn create_window(&self, name: &str, command: &str) -> Result<String, MuxError> {
        let mut inner = self.inner.lock();
        inner.calls.push(MuxCall::CreateWindow {
            name: name.to_string(),
            command: command.to_string(),
        });
        let target = format!("{}:{}", inner.session, name);
        let window = FakeWindow {
            pane: inner.default_pane.clone(),
            ..FakeWindow::default()
        };
        inner.windows.insert(target.clone(), window);
        Ok(target)
    }

    async fn kill_window(&self, target: &str) -> Result<(), MuxError> {
        let mut inner = self.inner.lock();
        inner.calls.push(MuxCall::KillWindow {
            target: target.to_string(),
        });
        inner.windows.remove(target);
        Ok(())
    }

    async fn kill_session(&self) -> Result<(), MuxError> {
        let mut inner = self.inner.lock();
        inner.calls.push(MuxCall::KillSession);
        inner.session_count = 0;
        inner.windows.clear();
        Ok(())
    }

    async fn capture_pane(&self, target: &str, _lines: Option<u32>) -> Result<String, MuxError> {
        let mut inner = self.inner.lock();
        inner.calls.push(MuxCall::CapturePane {
            target: target.to_string(),
        });
        match inner.windows.get(target) {
            Some(window) => Ok(window.pane.clone()),
            None => Err(MuxError::NotFound(target.to_string())),
        }
    }

    async fn send_text(&self, target: &str, text: &str) -> Result<(), MuxError> {
        let mut inner = self.inner.lock();
        inner.calls.push(MuxCall::SendText {
            target: target.to_string(),
            text: text.to_string(),
        });
        match inner.windows.get_mut(target) {
            Some(window) => {
                window.sent.push(text.to_string());
                Ok(())
            }
            None => Err(MuxError::NotFound(target.to_string())),
        }
    }

    async fn send_key(&self, target: &str, key: &str) -> Result<(), MuxError> {
        let mut inner = self.inner.lock();
        inner.calls.push(MuxCall::SendKey {
            target: target.to_string(),
            key: key.to_string(),
        });
        match inner.windows.get_mut(target) {
            Some(window) => {
                window.keys.push(key.to_string());
                Ok(())
            }
            None => Err(MuxError::NotFound(target.to_string())),
        }
    }

    async fn start_pipe_pane(&self, target: &str, file: &Path) -> Result<(), MuxError> {
        let mut inner = self.inner.lock();
        inner.calls.push(MuxCall::StartPipePane {
            target: target.to_string(),
            file: file.to_path_buf(),
        });
        if !inner.windows.contains_key(target) {
            return Err(MuxError::NotFound(target.to_string()));
        }
        inner.file_sizes.entry(file.to_path_buf()).or_insert(0);
        Ok(())
    }

    async fn file_size(&self, path: &Path) -> u64 {
        self.inner
            .lock()
            .file_sizes
            .get(path)
            .copied()
            .unwrap_or(0)
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
