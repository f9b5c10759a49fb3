use serde::Serialize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Breaker states. Legal transitions only:
/// Closed -> Open (threshold breach), Open -> HalfOpen (reset timeout),
/// HalfOpen -> Closed (probe success), HalfOpen -> Open (probe failure).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug)]
struct CircuitInner {
    state: CircuitState,
    failures: u32,
    last_failure: Option<Instant>,
    probes_issued: u32,
    /// Start of the current half-open probe window.
    window_started: Option<Instant>,
}

/// Per-dependency circuit breaker. Shared across all concurrent callers of
/// the same dependency; all transitions happen under one mutex.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: &'static str,
    failure_threshold: u32,
    reset_timeout: Duration,
    half_open_probes: u32,
    inner: Mutex<CircuitInner>,
}

/// Point-in-time view for health reporting.
#[derive(Debug, Clone, Serialize)]
pub struct CircuitSnapshot {
    pub dependency: &'static str,
    pub state: CircuitState,
    pub failures: u32,
}

impl CircuitBreaker {
    pub fn new(
        name: &'static str,
        failure_threshold: u32,
        reset_timeout: Duration,
        half_open_probes: u32,
    ) -> Self {
        CircuitBreaker {
            name,
            failure_threshold: failure_threshold.max(1),
            reset_timeout,
            half_open_probes: half_open_probes.max(1),
            inner: Mutex::new(CircuitInner {
                state: CircuitState::Closed,
                failures: 0,
                last_failure: None,
                probes_issued: 0,
                window_started: None,
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether a request may go upstream right now. Calling this while open
    /// after the reset timeout moves the breaker to half-open and consumes
    /// one probe slot; the probe budget refills each reset-timeout window,
    /// so probes that never report an outcome cannot pin the breaker shut.
    pub fn can_request(&self) -> bool {
        let mut inner = self.inner.lock().expect("circuit breaker lock poisoned");
        match inner.state {
            CircuitState::Closed => true,
            CircuitState::Open => {
                let elapsed = inner
                    .last_failure
                    .map(|t| t.elapsed())
                    .unwrap_or(Duration::MAX);
                if elapsed >= self.reset_timeout {
                    tracing::info!(dependency = self.name, "Circuit half-open, probing");
                    inner.state = CircuitState::HalfOpen;
                    inner.probes_issued = 1;
                    inner.window_started = Some(Instant::now());
                    true
                } else {
                    false
                }
            }
            CircuitState::HalfOpen => {
                let window_expired = inner
                    .window_started
                    .map(|t| t.elapsed() >= self.reset_timeout)
                    .unwrap_or(true);
                if window_expired {
                    inner.probes_issued = 1;
                    inner.window_started = Some(Instant::now());
                    true
                } else if inner.probes_issued < self.half_open_probes {
                    inner.probes_issued += 1;
                    true
                } else {
                    false
                }
            }
        }
    }

    pub fn record_success(&self) {
        let mut inner = self.inner.lock().expect("circuit breaker lock poisoned");
        if inner.state != CircuitState::Closed {
            tracing::info!(dependency = self.name, "Circuit closed after probe success");
        }
        inner.state = CircuitState::Closed;
        inner.failures = 0;
        inner.probes_issued = 0;
        inner.window_started = None;
        inner.last_failure = None;
    }

    pub fn record_failure(&self) {
        let mut inner = self.inner.lock().expect("circuit breaker lock poisoned");
        inner.failures += 1;
        inner.last_failure = Some(Instant::now());
        match inner.state {
            CircuitState::Closed => {
                if inner.failures >= self.failure_threshold {
                    tracing::warn!(
                        dependency = self.name,
                        failures = inner.failures,
                        "Circuit opened"
                    );
                    inner.state = CircuitState::Open;
                }
            }
            CircuitState::HalfOpen => {
                tracing::warn!(dependency = self.name, "Probe failed, circuit re-opened");
                inner.state = CircuitState::Open;
                inner.probes_issued = 0;
                inner.window_started = None;
            }
            CircuitState::Open => {}
        }
    }

    pub fn snapshot(&self) -> CircuitSnapshot {
        let inner = self.inner.lock().expect("circuit breaker lock poisoned");
        CircuitSnapshot {
            dependency: self.name,
            state: inner.state,
            failures: inner.failures,
        }
    }
}
