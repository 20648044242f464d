//! Heartbeat supervisor and lifecycle relay sharing one `HeartbeatState`.
//!
//! Polls are driven with synthetic instants so the quiet-period arithmetic is
//! exact; one test runs the real timer loop with short timings.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use mock_core::{HeartbeatState, Session, SessionEventReason, STATUS_REASON};
use mock_server::application::heartbeat::{
    EnumerationError, HeartbeatSupervisor, HeartbeatTimings, SessionSource, TickOutcome,
};
use mock_server::application::lifecycle_relay::LifecycleRelay;
use mock_server::application::status_reporter::{LineSink, StatusReporter};
use mock_server::infrastructure::console::mock::RecordingSink;
use mock_server::infrastructure::server::session_manager::SessionManager;

const SECOND: Duration = Duration::from_secs(1);

struct Harness {
    t0: Instant,
    sink: Arc<RecordingSink>,
    state: Arc<HeartbeatState>,
    reporter: StatusReporter,
}

impl Harness {
    fn new() -> Self {
        let t0 = Instant::now();
        let sink = Arc::new(RecordingSink::new());
        let line_sink: Arc<dyn LineSink> = sink.clone();
        Self {
            t0,
            sink,
            state: Arc::new(HeartbeatState::new(t0)),
            reporter: StatusReporter::new(line_sink),
        }
    }

    fn at(&self, offset: Duration) -> Instant {
        self.t0 + offset
    }

    fn supervisor<S: SessionSource + 'static>(&self, server: &Arc<S>) -> HeartbeatSupervisor {
        HeartbeatSupervisor::new(
            server,
            Arc::clone(&self.state),
            self.reporter.clone(),
            HeartbeatTimings::default(),
        )
    }

    fn relay(&self) -> Arc<LifecycleRelay> {
        Arc::new(LifecycleRelay::new(
            Arc::clone(&self.state),
            self.reporter.clone(),
        ))
    }

    fn status_lines(&self) -> usize {
        self.sink.count_containing(STATUS_REASON)
    }
}

/// Wraps a [`SessionManager`] and runs a hook once, in the middle of the
/// first enumeration.
struct HookedSource<F: Fn() + Send + Sync> {
    inner: SessionManager,
    hook: F,
    fired: AtomicBool,
}

impl<F: Fn() + Send + Sync> SessionSource for HookedSource<F> {
    fn live_sessions(&self) -> Result<Vec<Arc<Session>>, EnumerationError> {
        let sessions = self.inner.live_sessions();
        if !self.fired.swap(true, Ordering::SeqCst) {
            (self.hook)();
        }
        sessions
    }
}

/// Fails the first `failures` enumerations.
struct FlakySource {
    inner: SessionManager,
    failures: AtomicUsize,
}

impl SessionSource for FlakySource {
    fn live_sessions(&self) -> Result<Vec<Arc<Session>>, EnumerationError> {
        let left = self.failures.load(Ordering::SeqCst);
        if left > 0 {
            self.failures.store(left - 1, Ordering::SeqCst);
            return Err(EnumerationError::Unavailable("injected".to_string()));
        }
        self.inner.live_sessions()
    }
}

#[test]
fn test_heartbeat_is_suppressed_during_activity_and_fires_after_quiet_period() {
    // Arrange
    let h = Harness::new();
    let server = Arc::new(SessionManager::default());
    h.relay().register(&*server);
    server.create_session("Alice", Utc::now()).unwrap();
    let supervisor = h.supervisor(&server);

    // Act / Assert
    assert_eq!(supervisor.tick(h.at(SECOND)), TickOutcome::Quiet);
    assert_eq!(supervisor.tick(h.at(5 * SECOND)), TickOutcome::Quiet);
    assert_eq!(h.status_lines(), 0);

    assert_eq!(supervisor.tick(h.at(7 * SECOND)), TickOutcome::Reported(1));
    assert_eq!(h.status_lines(), 1);

    // The report itself starts a new quiet period.
    assert_eq!(supervisor.tick(h.at(8 * SECOND)), TickOutcome::Quiet);
    assert_eq!(supervisor.tick(h.at(12 * SECOND)), TickOutcome::Quiet);
    assert_eq!(supervisor.tick(h.at(13 * SECOND + SECOND / 2)), TickOutcome::Reported(1));
    assert_eq!(h.status_lines(), 2);
}

#[test]
fn test_every_live_session_gets_one_status_line() {
    let h = Harness::new();
    let server = Arc::new(SessionManager::default());
    for name in ["Alice", "Bob", "Carol"] {
        server.create_session(name, Utc::now()).unwrap();
    }
    let supervisor = h.supervisor(&server);

    assert_eq!(supervisor.tick(h.at(7 * SECOND)), TickOutcome::Reported(3));

    let lines = h.sink.lines();
    assert_eq!(lines.len(), 3);
    for (line, name) in lines.iter().zip(["Alice", "Bob", "Carol"]) {
        assert!(line.starts_with(&format!(" -Status-:{name:>20}:Last Event:")), "{line}");
    }
}

#[test]
fn test_lifecycle_event_during_enumeration_suppresses_the_poll() {
    // Arrange
    let h = Harness::new();
    let state = Arc::clone(&h.state);
    let event_at = h.at(7 * SECOND);
    let server = Arc::new(HookedSource {
        inner: SessionManager::default(),
        hook: move || state.mark_event(event_at),
        fired: AtomicBool::new(false),
    });
    server.inner.create_session("Alice", Utc::now()).unwrap();
    let supervisor = h.supervisor(&server);

    // Act
    let outcome = supervisor.tick(h.at(7 * SECOND));

    // Assert
    assert_eq!(outcome, TickOutcome::Quiet);
    assert_eq!(h.status_lines(), 0);
    assert_eq!(h.state.last_event(), event_at);
    assert_eq!(supervisor.tick(h.at(13 * SECOND + SECOND / 2)), TickOutcome::Reported(1));
}

#[test]
fn test_lifecycle_event_after_claim_is_reported_alongside_the_poll() {
    // Arrange
    let h = Harness::new();
    let server = Arc::new(SessionManager::default());
    let session = server.create_session("Alice", Utc::now()).unwrap();
    let relay = h.relay();
    let supervisor = h.supervisor(&server);

    // Act
    let outcome = supervisor.tick(h.at(7 * SECOND));
    relay.on_event_at(&session, SessionEventReason::Activated, h.at(7 * SECOND));

    // Assert
    assert_eq!(outcome, TickOutcome::Reported(1));
    let lines = h.sink.lines();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with(" -Status-:"));
    assert!(lines[1].starts_with("Activated:"));
    assert_eq!(supervisor.tick(h.at(8 * SECOND)), TickOutcome::Quiet);
}

#[test]
fn test_enumeration_failure_is_retried_on_next_poll() {
    let h = Harness::new();
    let server = Arc::new(FlakySource {
        inner: SessionManager::default(),
        failures: AtomicUsize::new(2),
    });
    server.inner.create_session("Alice", Utc::now()).unwrap();
    let supervisor = h.supervisor(&server);

    assert_eq!(supervisor.tick(h.at(7 * SECOND)), TickOutcome::EnumerationFailed);
    assert_eq!(supervisor.tick(h.at(8 * SECOND)), TickOutcome::EnumerationFailed);
    assert_eq!(h.state.last_event(), h.t0);
    assert_eq!(supervisor.tick(h.at(9 * SECOND)), TickOutcome::Reported(1));
}

#[test]
fn test_supervisor_stops_once_server_is_dropped() {
    let h = Harness::new();
    let server = Arc::new(SessionManager::default());
    let supervisor = h.supervisor(&server);

    drop(server);

    assert_eq!(supervisor.tick(h.at(7 * SECOND)), TickOutcome::Stopped);
    assert!(h.sink.lines().is_empty());
}

#[tokio::test]
async fn test_run_loop_reports_then_ends_with_the_server() {
    // Arrange
    let sink = Arc::new(RecordingSink::new());
    let line_sink: Arc<dyn LineSink> = sink.clone();
    let state = Arc::new(HeartbeatState::default());
    let server = Arc::new(SessionManager::default());
    server.create_session("Alice", Utc::now()).unwrap();
    let supervisor = HeartbeatSupervisor::new(
        &server,
        state,
        StatusReporter::new(line_sink),
        HeartbeatTimings {
            poll_interval: Duration::from_millis(10),
            quiet_period: Duration::from_millis(40),
        },
    );

    // Act
    let task = supervisor.spawn();
    tokio::time::sleep(Duration::from_millis(300)).await;
    drop(server);
    let finished = tokio::time::timeout(Duration::from_secs(2), task).await;

    // Assert
    assert!(finished.is_ok(), "supervisor did not stop after server drop");
    assert!(sink.count_containing(STATUS_REASON) >= 1);
}
