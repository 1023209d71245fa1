//! Capture against the running process rather than hand-built snapshots

use std::time::Duration;

use faultline_capture::{
    current_thread_id, ExceptionTrace, LaunchTracker, ProcessSnapshot, RawThread,
    ThreadCapturer,
};
use faultline_core::{config::ConfigBuilder, domain::ThreadSendPolicy};

#[test]
fn test_live_snapshot_marks_calling_thread() {
    let capturer = ThreadCapturer::new(ThreadSendPolicy::Always, vec![]);
    let state = capturer.capture(ProcessSnapshot::current_thread_only(), None, false);

    assert_eq!(state.len(), 1);
    let reporting = state.error_reporting_thread().unwrap();
    assert_eq!(reporting.id, current_thread_id());
}

#[test]
fn test_live_snapshot_with_other_threads() {
    let worker = std::thread::spawn(RawThread::current).join().unwrap();
    let worker_id = worker.id;

    let snapshot = ProcessSnapshot::new(RawThread::current(), vec![worker]);
    let state = ThreadCapturer::default().capture(snapshot, None, false);

    assert_eq!(state.len(), 2);
    let ids: Vec<_> = state.threads().iter().map(|t| t.id).collect();
    let mut sorted = ids.clone();
    sorted.sort_unstable();
    assert_eq!(ids, sorted);
    assert!(ids.contains(&worker_id));
    assert_eq!(
        state.error_reporting_thread().map(|t| t.id),
        Some(current_thread_id())
    );
}

#[test]
fn test_unhandled_capture_uses_exception_frames() {
    let exception = ExceptionTrace::new(vec![faultline_capture::RawFrame::new("app::explode")]);
    let state = ThreadCapturer::default().capture(
        ProcessSnapshot::current_thread_only(),
        Some(&exception),
        true,
    );

    let reporting = state.error_reporting_thread().unwrap();
    assert_eq!(reporting.stacktrace.len(), 1);
    assert_eq!(reporting.stacktrace.frames()[0].method, "app::explode");
}

#[tokio::test(start_paused = true)]
async fn test_components_from_config() {
    let config = ConfigBuilder::new()
        .launch_duration_ms(250)
        .threads_send_policy(ThreadSendPolicy::UnhandledOnly)
        .build();

    let tracker = LaunchTracker::from_config(&config.launch);
    let capturer = ThreadCapturer::from_config(&config.threads);

    assert!(tracker.is_launching());
    assert!(capturer
        .capture(ProcessSnapshot::current_thread_only(), None, false)
        .is_empty());

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(!tracker.is_launching());
}
