// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use regex::Regex;
use serial_test::serial;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::LazyLock;
use std::time::Duration;

/// Random prefix for this test run to avoid conflicts with parallel test runs.
static TEST_PREFIX: LazyLock<String> = LazyLock::new(|| {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();
    format!("hive-t{:04x}", nanos & 0xFFFF)
});

/// Counter for generating unique session names across parallel tests.
static SESSION_COUNTER: AtomicU64 = AtomicU64::new(0);

fn unique_session(suffix: &str) -> String {
    let id = SESSION_COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("{}-{}-{}", *TEST_PREFIX, suffix, id)
}

/// Check if tmux is available on this system
fn tmux_available() -> bool {
    std::process::Command::new("tmux")
        .arg("-V")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

macro_rules! fail_if_no_tmux {
    () => {
        if !tmux_available() {
            panic!("tmux is required but not available");
        }
    };
}

// All tmux tests are serialized because some tests modify PATH which affects all others.

#[tokio::test]
#[serial(tmux)]
async fn ensure_session_is_idempotent() {
    fail_if_no_tmux!();
    let driver = TmuxDriver::new(unique_session("ensure"));

    driver.ensure_session().await.unwrap();
    driver.ensure_session().await.unwrap();

    let sessions = std::process::Command::new("tmux")
        .args(["list-sessions", "-F", "#{session_name}"])
        .output()
        .unwrap();
    let stdout = String::from_utf8_lossy(&sessions.stdout);
    let count = stdout
        .lines()
        .filter(|name| *name == driver.session())
        .count();
    assert_eq!(count, 1, "expected exactly one session, got: {stdout}");

    let _ = driver.kill_session().await;
}

#[tokio::test]
#[serial(tmux)]
async fn create_window_returns_composite_target() {
    fail_if_no_tmux!();
    let driver = TmuxDriver::new(unique_session("window"));
    driver.ensure_session().await.unwrap();

    let target = driver.create_window("claude-1", "sleep 60").await.unwrap();
    assert_eq!(target, format!("{}:claude-1", driver.session()));

    let _ = driver.kill_session().await;
}

#[tokio::test]
#[serial(tmux)]
async fn capture_pane_sees_window_output() {
    fail_if_no_tmux!();
    let driver = TmuxDriver::new(unique_session("capture"));
    driver.ensure_session().await.unwrap();

    let target = driver
        .create_window("echoer", "echo 'capture-test-output' && sleep 60")
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(200)).await;

    let output = driver.capture_pane(&target, Some(10)).await.unwrap();
    assert!(output.contains("capture-test-output"));

    let _ = driver.kill_session().await;
}

#[tokio::test]
#[serial(tmux)]
async fn send_text_types_into_pane_with_enter() {
    fail_if_no_tmux!();
    let driver = TmuxDriver::new(unique_session("send"));
    driver.ensure_session().await.unwrap();

    let target = driver.create_window("cat", "cat").await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    driver.send_text(&target, "hello worker").await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let output = driver.capture_pane(&target, None).await.unwrap();
    assert!(output.contains("hello worker"));

    let _ = driver.kill_session().await;
}

#[tokio::test]
#[serial(tmux)]
async fn pipe_pane_grows_the_file() {
    fail_if_no_tmux!();
    let driver = TmuxDriver::new(unique_session("pipe"));
    driver.ensure_session().await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let pipe = dir.path().join("worker.log");

    let target = driver.create_window("cat", "cat").await.unwrap();
    driver.start_pipe_pane(&target, &pipe).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    driver.send_text(&target, "piped output line").await.unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert!(driver.file_size(&pipe).await > 0);

    let _ = driver.kill_session().await;
}

#[tokio::test]
#[serial(tmux)]
async fn wait_for_ready_matches_stripped_pane() {
    fail_if_no_tmux!();
    let driver = TmuxDriver::new(unique_session("ready"));
    driver.ensure_session().await.unwrap();

    let target = driver
        .create_window("prompt", "printf 'booting\\n> ' && sleep 60")
        .await
        .unwrap();

    let pattern = Regex::new(r"(?m)^>\s*$").unwrap();
    let text = driver
        .wait_for_ready(&target, &pattern, Duration::from_secs(5), Duration::from_millis(100))
        .await
        .unwrap();
    assert!(text.contains("booting"));

    let _ = driver.kill_session().await;
}

#[tokio::test]
#[serial(tmux)]
async fn wait_for_ready_times_out() {
    fail_if_no_tmux!();
    let driver = TmuxDriver::new(unique_session("readyto"));
    driver.ensure_session().await.unwrap();

    let target = driver.create_window("quiet", "sleep 60").await.unwrap();

    let pattern = Regex::new("never-rendered").unwrap();
    let result = driver
        .wait_for_ready(
            &target,
            &pattern,
            Duration::from_millis(300),
            Duration::from_millis(100),
        )
        .await;
    assert!(matches!(result, Err(MuxError::TimeoutReady(_))));

    let _ = driver.kill_session().await;
}

#[tokio::test]
#[serial(tmux)]
async fn kill_window_and_session_are_idempotent() {
    fail_if_no_tmux!();
    let driver = TmuxDriver::new(unique_session("kill"));
    driver.ensure_session().await.unwrap();

    let target = driver.create_window("w", "sleep 60").await.unwrap();
    driver.kill_window(&target).await.unwrap();
    driver.kill_window(&target).await.unwrap();

    driver.kill_session().await.unwrap();
    driver.kill_session().await.unwrap();
}

#[tokio::test]
#[serial(tmux)]
async fn capture_nonexistent_target_returns_not_found() {
    fail_if_no_tmux!();
    let driver = TmuxDriver::new(unique_session("missing"));
    driver.ensure_session().await.unwrap();

    let result = driver
        .capture_pane("no-such-session:no-such-window", None)
        .await;
    assert!(matches!(result, Err(MuxError::NotFound(_))));

    let _ = driver.kill_session().await;
}

// Tests below modify PATH to simulate tmux being unavailable.

#[tokio::test]
#[serial(tmux)]
async fn ensure_session_fails_fatal_when_tmux_missing() {
    use std::env;

    let original_path = env::var("PATH").unwrap_or_default();
    env::set_var("PATH", "/nonexistent");

    let driver = TmuxDriver::new("hive-no-tmux");
    let result = driver.ensure_session().await;

    env::set_var("PATH", &original_path);

    assert!(matches!(result, Err(MuxError::Unavailable(_))));
}

#[tokio::test]
#[serial(tmux)]
async fn send_text_fails_fatal_when_tmux_missing() {
    use std::env;

    let original_path = env::var("PATH").unwrap_or_default();
    env::set_var("PATH", "/nonexistent");

    let driver = TmuxDriver::new("hive-no-tmux");
    let result = driver.send_text("any:target", "test").await;

    env::set_var("PATH", &original_path);

    assert!(matches!(result, Err(MuxError::Unavailable(_))));
}
