//! Click-scheduling and auto-stop state machine.
//!
//! The scheduler owns one run's configuration and state and decides, each
//! time the host ticks it, whether to click, wait, or stop. It never reads
//! the clock itself and never performs side effects; the host passes `now`
//! in and executes the returned decision.

use std::fmt;
use std::time::{Duration, Instant};

use rand::Rng;

/// Immutable configuration for a single run.
#[derive(Clone, Debug)]
pub struct RunConfig {
    /// Nominal inter-click delay in milliseconds, >= 1.
    pub base_delay_ms: u64,
    /// Apply +/-10% uniform jitter to each delay.
    pub jitter: bool,
    /// Countdown before the first click, in seconds. 0 starts immediately.
    pub start_delay_secs: u64,
    /// Stop once the run has lasted this long.
    pub duration_limit_secs: Option<u64>,
    /// Stop once this many clicks have been sent.
    pub click_limit: Option<u64>,
    /// Stop after this long without user interaction. 0 disables.
    pub idle_timeout_secs: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: 100,
            jitter: true,
            start_delay_secs: 0,
            duration_limit_secs: None,
            click_limit: None,
            idle_timeout_secs: 0,
        }
    }
}

/// Why a run ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StopReason {
    DurationLimit(u64),
    ClickLimit(u64),
    IdleTimeout(u64),
    UserStop,
    Canceled,
    InjectFailure(String),
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::DurationLimit(secs) => write!(f, "Duration limit reached ({secs}s)"),
            StopReason::ClickLimit(count) => write!(f, "Click limit reached ({count})"),
            StopReason::IdleTimeout(secs) => write!(f, "Idle timeout reached ({secs}s)"),
            StopReason::UserStop => write!(f, "Stopped by user"),
            StopReason::Canceled => write!(f, "Canceled before start"),
            StopReason::InjectFailure(err) => write!(f, "Click injection failed: {err}"),
        }
    }
}

/// What the host should do on this tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    /// Countdown finished; the run begins now.
    BeginRun,
    /// Still counting down; come back after (at most) this long.
    Wait(Duration),
    /// Send one click.
    Click,
    /// The run is over.
    Stop(StopReason),
}

/// Coarse phase of a run, for status display.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Pending,
    Countdown,
    Running,
    Stopped,
}

enum State {
    Pending,
    Countdown { deadline: Instant },
    Running { started_at: Instant },
    Stopped { reason: StopReason },
}

pub struct ClickScheduler {
    config: RunConfig,
    state: State,
    click_count: u64,
    last_interaction_at: Instant,
}

impl ClickScheduler {
    /// Creates a scheduler for one run. `now` anchors the start-delay
    /// countdown; with a zero start delay the first `evaluate` begins the
    /// run directly.
    pub fn new(config: RunConfig, now: Instant) -> Self {
        let state = if config.start_delay_secs > 0 {
            State::Countdown {
                deadline: now + Duration::from_secs(config.start_delay_secs),
            }
        } else {
            State::Pending
        };
        Self {
            config,
            state,
            click_count: 0,
            last_interaction_at: now,
        }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn click_count(&self) -> u64 {
        self.click_count
    }

    pub fn phase(&self) -> Phase {
        match self.state {
            State::Pending => Phase::Pending,
            State::Countdown { .. } => Phase::Countdown,
            State::Running { .. } => Phase::Running,
            State::Stopped { .. } => Phase::Stopped,
        }
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self.state, State::Stopped { .. })
    }

    pub fn stop_reason(&self) -> Option<&StopReason> {
        match &self.state {
            State::Stopped { reason } => Some(reason),
            _ => None,
        }
    }

    /// Run time so far, `None` before the run has begun.
    pub fn elapsed(&self, now: Instant) -> Option<Duration> {
        match &self.state {
            State::Running { started_at } => Some(now.duration_since(*started_at)),
            _ => None,
        }
    }

    /// Decides what to do at `now`. Pure: call `advance` to apply the
    /// returned decision. Checks run in a fixed order so limits are seen
    /// before the click that would break them.
    pub fn evaluate(&self, now: Instant) -> Decision {
        match &self.state {
            State::Stopped { reason } => Decision::Stop(reason.clone()),
            State::Pending => Decision::BeginRun,
            State::Countdown { deadline } => {
                if now >= *deadline {
                    Decision::BeginRun
                } else {
                    Decision::Wait(deadline.duration_since(now))
                }
            }
            State::Running { started_at } => {
                if let Some(limit) = self.config.duration_limit_secs {
                    if now.duration_since(*started_at) >= Duration::from_secs(limit) {
                        return Decision::Stop(StopReason::DurationLimit(limit));
                    }
                }
                if let Some(limit) = self.config.click_limit {
                    if self.click_count >= limit {
                        return Decision::Stop(StopReason::ClickLimit(limit));
                    }
                }
                if self.config.idle_timeout_secs > 0
                    && now.duration_since(self.last_interaction_at)
                        >= Duration::from_secs(self.config.idle_timeout_secs)
                {
                    return Decision::Stop(StopReason::IdleTimeout(self.config.idle_timeout_secs));
                }
                Decision::Click
            }
        }
    }

    /// Applies the state transition for a decision the host just acted on.
    pub fn advance(&mut self, decision: Decision, now: Instant) {
        match decision {
            Decision::BeginRun => {
                if !self.is_stopped() {
                    self.state = State::Running { started_at: now };
                    // Idle window is measured from run start until the host
                    // reports activity.
                    self.last_interaction_at = now;
                }
            }
            Decision::Click => {
                self.click_count += 1;
                // A live config edit in GUI mode can lower the limit between
                // evaluate and advance; clamp so the count never exceeds it.
                if let Some(limit) = self.config.click_limit {
                    if self.click_count > limit {
                        self.click_count = limit;
                    }
                }
            }
            Decision::Wait(_) => {}
            Decision::Stop(reason) => self.stop(reason),
        }
    }

    /// Ends the run with `reason`. Idempotent: the first reason wins.
    pub fn stop(&mut self, reason: StopReason) {
        if !self.is_stopped() {
            self.state = State::Stopped { reason };
        }
    }

    /// Host-observed cancel signal (ESC key, Stop button). During the
    /// countdown this is a cancel-before-start; once running it is a plain
    /// user stop.
    pub fn cancel(&mut self) {
        match self.state {
            State::Pending | State::Countdown { .. } => self.stop(StopReason::Canceled),
            State::Running { .. } => self.stop(StopReason::UserStop),
            State::Stopped { .. } => {}
        }
    }

    /// Notes user activity for idle detection. Callable in any phase; has
    /// no effect on decisions once stopped.
    pub fn record_interaction(&mut self, now: Instant) {
        self.last_interaction_at = now;
    }
}

/// Effective delay before the next click. With jitter on, a uniform offset
/// from the closed interval `[-base/10, +base/10]` is added; the result is
/// never below 1ms.
pub fn compute_delay<R: Rng>(base_delay_ms: u64, jitter: bool, rng: &mut R) -> Duration {
    let base = base_delay_ms.max(1);
    if !jitter {
        return Duration::from_millis(base);
    }
    let max_jitter = (base_delay_ms / 10) as i64;
    if max_jitter <= 0 {
        return Duration::from_millis(base);
    }
    let offset = rng.gen_range(-max_jitter..=max_jitter);
    let delayed = (base_delay_ms as i64 + offset).max(1);
    Duration::from_millis(delayed as u64)
}
