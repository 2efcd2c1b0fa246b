// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! hive-engine: Scheduling, state detection, and the orchestrator loop.
//!
//! The engine is a single-threaded cooperative control loop. All mutation
//! of the queue, tracker, and supervisor records happens inside one tick;
//! agent CLIs and the reasoning tool run as parallel subprocesses that
//! communicate only through pane captures, pipe files, and exit codes.

pub mod config;
pub mod detector;
pub mod dispatcher;
pub mod error;
pub mod limits;
pub mod orchestrator;
pub mod queue;
pub mod reasoning;
pub mod registry;
pub mod supervisor;

pub use config::{AgentConfig, HiveConfig, LogLevel, OrchestratorConfig, PoolConfig, WindowConfig};
pub use detector::{detect_from_output, refine_state, STUCK_PATTERN_ID};
pub use dispatcher::{plan, Dispatch};
pub use error::OrchestratorError;
pub use limits::RateLimitTracker;
pub use orchestrator::{Orchestrator, ShutdownSignal};
pub use queue::TaskQueue;
pub use registry::{AgentKind, AgentRegistry, ExternalAgent, RegisteredAgent};
pub use supervisor::{SupervisorConfig, TickReport, WorkerSupervisor};
