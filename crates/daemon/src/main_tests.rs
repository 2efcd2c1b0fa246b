// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn load_config_reads_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
            defaultAgent = "claude"

            [agents.claude]
            maxConcurrent = 2

            [orchestrator]
            maxWorkers = 3
        "#,
    )
    .unwrap();

    let config = load_config(Some(&path)).unwrap();
    assert_eq!(config.default_agent.as_deref(), Some("claude"));
    assert_eq!(config.orchestrator.max_workers, 3);
}

#[test]
fn load_config_rejects_broken_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "not [valid").unwrap();
    assert!(load_config(Some(&path)).is_err());
}

#[test]
fn load_config_rejects_missing_explicit_path() {
    assert!(load_config(Some(Path::new("/nonexistent/config.toml"))).is_err());
}

#[test]
fn reasoning_runner_parses_command_line() {
    let mut config = HiveConfig::default();
    assert!(reasoning_runner(&config).is_none());

    config.orchestrator.reasoning_tool = Some("claude -p --model opus".to_string());
    assert!(reasoning_runner(&config).is_some());
}

#[test]
fn rotate_log_shifts_files() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("hived.log");

    // Under the limit: untouched.
    std::fs::write(&log, "small").unwrap();
    rotate_log_if_needed(&log);
    assert!(log.exists());

    // Over the limit: rotated to .1.
    std::fs::write(&log, vec![b'x'; (MAX_LOG_SIZE + 1) as usize]).unwrap();
    rotate_log_if_needed(&log);
    assert!(!log.exists());
    assert!(dir.path().join("hived.log.1").exists());
}

#[test]
fn rotate_log_missing_file_is_fine() {
    rotate_log_if_needed(Path::new("/nonexistent/hived.log"));
}
