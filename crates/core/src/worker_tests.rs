// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    idle             = { WorkerState::Idle, true },
    waiting_input    = { WorkerState::WaitingInput, true },
    waiting_approval = { WorkerState::WaitingApproval, true },
    working          = { WorkerState::Working, false },
    starting         = { WorkerState::Starting, false },
    stuck            = { WorkerState::Stuck, false },
    dead             = { WorkerState::Dead, false },
)]
fn assignment_eligibility(state: WorkerState, expected: bool) {
    assert_eq!(state.accepts_assignment(), expected);
}

#[yare::parameterized(
    stuck            = { WorkerState::Stuck, true },
    waiting_approval = { WorkerState::WaitingApproval, true },
    waiting_input    = { WorkerState::WaitingInput, true },
    working          = { WorkerState::Working, false },
    idle             = { WorkerState::Idle, false },
    error            = { WorkerState::Error, false },
)]
fn attention_states(state: WorkerState, expected: bool) {
    assert_eq!(state.needs_attention(), expected);
}

#[test]
fn every_state_has_an_explanation() {
    let states = [
        WorkerState::Starting,
        WorkerState::Idle,
        WorkerState::Working,
        WorkerState::WaitingApproval,
        WorkerState::WaitingInput,
        WorkerState::RateLimited,
        WorkerState::Stuck,
        WorkerState::Error,
        WorkerState::Dead,
    ];
    for state in states {
        assert!(!state.explanation().is_empty(), "{state} lacks explanation");
    }
}

#[test]
fn state_serializes_snake_case() {
    let json = serde_json::to_string(&WorkerState::WaitingApproval).unwrap();
    assert_eq!(json, "\"waiting_approval\"");
}

#[test]
fn numbered_worker_ids() {
    assert_eq!(WorkerId::numbered(1), "w1");
    assert_eq!(WorkerId::numbered(42), "w42");
}

#[test]
fn new_worker_starts_in_starting() {
    let worker = Worker::new(
        WorkerId::new("w-1"),
        "claude",
        "openhive-orch:claude-w-1",
        PathBuf::from("/tmp/w-1.log"),
        1000,
    );
    assert_eq!(worker.state, WorkerState::Starting);
    assert_eq!(worker.tasks_completed, 0);
    assert_eq!(worker.last_output_change_ms, 1000);
}
