// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reasoning-agent bridge: context assembly and verdict requests.
//!
//! The bridge never knows which reasoning tool runs. It assembles a plain
//! text document (worker state + task prompt + pane tail + instruction
//! stanza), hands it to the configured runner, and parses the reply.

use hive_adapters::{strip_ansi, ReasoningError, ReasoningRunner};
use hive_core::pattern::tail_lines;
use hive_core::{StateSnapshot, Task, Verdict, Worker, WorkerState};
use std::path::Path;

/// How much of the pipe file to consider when extracting the tail.
const PIPE_TAIL_BYTES: usize = 64 * 1024;

/// Context assembled for one reasoning request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReasoningContext {
    pub worker_state: WorkerState,
    pub task_prompt: Option<String>,
    pub pane_tail: String,
    /// The full plain-text document sent to the reasoning tool.
    pub prompt: String,
}

/// Build the reasoning context for a worker needing attention.
///
/// The pane tail prefers the pipe file (authoritative ordering, survives
/// pane scrolling) and falls back to the retained snapshot text.
pub async fn build_context(
    worker: &Worker,
    snapshot: &StateSnapshot,
    task: Option<&Task>,
    context_lines: usize,
) -> ReasoningContext {
    let pane_tail = match read_pipe_tail(&worker.pipe_path, context_lines).await {
        Some(tail) => tail,
        None => tail_lines(&snapshot.pane, context_lines),
    };

    let task_prompt = task.map(|t| t.prompt.clone());
    let prompt = render_prompt(snapshot.state, task_prompt.as_deref(), &pane_tail);

    ReasoningContext {
        worker_state: snapshot.state,
        task_prompt,
        pane_tail,
        prompt,
    }
}

/// Last `lines` of the pipe file, ANSI-stripped. `None` when the file is
/// missing or empty.
async fn read_pipe_tail(path: &Path, lines: usize) -> Option<String> {
    let bytes = tokio::fs::read(path).await.ok()?;
    if bytes.is_empty() {
        return None;
    }
    let start = bytes.len().saturating_sub(PIPE_TAIL_BYTES);
    let text = String::from_utf8_lossy(&bytes[start..]);
    let stripped = strip_ansi(&text);
    Some(tail_lines(&stripped, lines))
}

/// Render the plain-text prompt document.
fn render_prompt(state: WorkerState, task_prompt: Option<&str>, pane_tail: &str) -> String {
    let mut doc = String::new();
    doc.push_str("You are supervising an autonomous coding-agent worker running in a terminal.\n\n");
    doc.push_str(&format!("Worker state: {} ({})\n", state, state.explanation()));
    if let Some(prompt) = task_prompt {
        doc.push_str("\nAssigned task:\n");
        doc.push_str(prompt);
        doc.push('\n');
    }
    doc.push_str("\nRecent terminal output:\n---\n");
    doc.push_str(pane_tail);
    doc.push_str("\n---\n\n");
    doc.push_str(
        "Reply with exactly one of:\n\
         \x20 APPROVE - press the tool's affirmative key\n\
         \x20 WAIT    - do nothing this round\n\
         \x20 RESTART - cancel and re-submit the task prompt\n\
         \x20 DONE    - mark the task complete\n\
         \x20 FAILED  - mark the task failed\n\
         or respond with free-text that will be typed into the worker's terminal verbatim.\n",
    );
    doc
}

/// Ask the runner for a verdict on the assembled context.
pub async fn request_verdict<R: ReasoningRunner>(
    runner: &R,
    context: &ReasoningContext,
) -> Result<Verdict, ReasoningError> {
    let raw = runner.run(&context.prompt).await?;
    Ok(Verdict::parse(&raw))
}

#[cfg(test)]
#[path = "reasoning_tests.rs"]
mod tests;
