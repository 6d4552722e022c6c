use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::Value;

/// How long a test session stays active without an explicit stop.
pub const TEST_SESSION_TTL: Duration = Duration::from_secs(3600);

/// Single global capture slot for test mode. While active, inbound requests
/// are captured here instead of being dispatched; only the most recent
/// capture is retained.
#[derive(Clone)]
pub struct TestSession {
    state: Arc<Mutex<SessionState>>,
}

#[derive(Default)]
struct SessionState {
    active: bool,
    captured: Option<Value>,
    expires_at: Option<Instant>,
}

impl SessionState {
    /// Lazily expire: past the deadline the session is inactive and the
    /// capture slot must be empty.
    fn refresh(&mut self, now: Instant) {
        if let Some(expires_at) = self.expires_at {
            if now >= expires_at {
                self.active = false;
                self.captured = None;
                self.expires_at = None;
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TestSessionStatus {
    pub active: bool,
    pub captured: Option<Value>,
}

impl TestSession {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SessionState::default())),
        }
    }

    pub fn start(&self) {
        self.start_at(Instant::now())
    }

    pub fn start_at(&self, now: Instant) {
        let mut state = self.state.lock().expect("test session lock");
        state.active = true;
        state.captured = None;
        state.expires_at = Some(now + TEST_SESSION_TTL);
    }

    pub fn stop(&self) {
        let mut state = self.state.lock().expect("test session lock");
        state.active = false;
        state.captured = None;
        state.expires_at = None;
    }

    pub fn is_active(&self) -> bool {
        self.is_active_at(Instant::now())
    }

    pub fn is_active_at(&self, now: Instant) -> bool {
        let mut state = self.state.lock().expect("test session lock");
        state.refresh(now);
        state.active
    }

    /// Overwrite the capture slot. Last writer wins; captures outside an
    /// active session are dropped.
    pub fn capture(&self, envelope: Value) {
        self.capture_at(envelope, Instant::now())
    }

    pub fn capture_at(&self, envelope: Value, now: Instant) {
        let mut state = self.state.lock().expect("test session lock");
        state.refresh(now);
        if state.active {
            state.captured = Some(envelope);
        }
    }

    pub fn status(&self) -> TestSessionStatus {
        self.status_at(Instant::now())
    }

    pub fn status_at(&self, now: Instant) -> TestSessionStatus {
        let mut state = self.state.lock().expect("test session lock");
        state.refresh(now);
        TestSessionStatus {
            active: state.active,
            captured: state.captured.clone(),
        }
    }
}

impl Default for TestSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_start_capture_stop() {
        let session = TestSession::new();
        assert!(!session.is_active());

        session.start();
        assert!(session.is_active());

        session.capture(json!({"action": "upload"}));
        let status = session.status();
        assert!(status.active);
        assert_eq!(status.captured.unwrap()["action"], "upload");

        session.stop();
        let status = session.status();
        assert!(!status.active);
        assert!(status.captured.is_none());
    }

    #[test]
    fn test_last_capture_wins() {
        let session = TestSession::new();
        session.start();

        session.capture(json!({"seq": 1}));
        session.capture(json!({"seq": 2}));

        assert_eq!(session.status().captured.unwrap()["seq"], 2);
    }

    #[test]
    fn test_start_clears_previous_capture() {
        let session = TestSession::new();
        session.start();
        session.capture(json!({"seq": 1}));

        session.start();
        assert!(session.status().captured.is_none());
    }

    #[test]
    fn test_capture_while_inactive_is_dropped() {
        let session = TestSession::new();
        session.capture(json!({"seq": 1}));
        assert!(session.status().captured.is_none());
    }

    #[test]
    fn test_session_expires_on_its_own() {
        let session = TestSession::new();
        let start = Instant::now();

        session.start_at(start);
        session.capture_at(json!({"seq": 1}), start);

        let before_expiry = start + TEST_SESSION_TTL - Duration::from_secs(1);
        assert!(session.is_active_at(before_expiry));

        let after_expiry = start + TEST_SESSION_TTL;
        assert!(!session.is_active_at(after_expiry));
        let status = session.status_at(after_expiry);
        assert!(!status.active);
        assert!(status.captured.is_none());
    }
}
