// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! hive-adapters: External-world adapters for the OpenHive orchestrator.
//!
//! Wraps the terminal multiplexer, ANSI handling, subprocess execution, and
//! the reasoning-tool launcher behind traits the engine consumes.

pub mod ansi;
pub mod env;
pub mod mux;
pub mod reasoning;
pub mod subprocess;

pub use ansi::strip_ansi;
pub use mux::{MuxAdapter, MuxError, TmuxDriver};
pub use reasoning::{CliReasoningRunner, ReasoningError, ReasoningRunner};

#[cfg(any(test, feature = "test-support"))]
pub use mux::{FakeMuxAdapter, MuxCall};
#[cfg(any(test, feature = "test-support"))]
pub use reasoning::FakeReasoningRunner;
