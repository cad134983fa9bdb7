//! Console host: a blocking evaluate/advance loop with responsive
//! cancellation.
//!
//! Sleeps never exceed [`POLL_SLICE`] in one stretch; each slice polls the
//! terminal so ESC is seen within ~50ms even for long click delays. The
//! terminal stays in raw mode for the duration of the run.

use std::io::{self, Write};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal;
use tracing::info;

use crate::counter::LifetimeCounter;
use crate::error::AppError;
use crate::injector::ClickInjector;
use crate::scheduler::{compute_delay, ClickScheduler, Decision, RunConfig, StopReason};

/// Upper bound on any single uninterruptible sleep.
const POLL_SLICE: Duration = Duration::from_millis(50);

struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> Result<Self, AppError> {
        terminal::enable_raw_mode().map_err(|err| {
            AppError::environment(format!("cannot enter raw terminal mode: {err}"))
        })?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

/// Runs one complete console-mode session and reports why it ended.
pub fn run(
    config: RunConfig,
    counter: &mut LifetimeCounter,
    injector: &mut dyn ClickInjector,
) -> Result<StopReason, AppError> {
    let guard = RawModeGuard::enable()?;
    let outcome = run_loop(&config, counter, injector);
    drop(guard);

    let reason = outcome?;
    println!();
    println!("{reason}");
    println!("Lifetime clicks: {}", counter.total());
    Ok(reason)
}

fn run_loop(
    config: &RunConfig,
    counter: &mut LifetimeCounter,
    injector: &mut dyn ClickInjector,
) -> Result<StopReason, AppError> {
    let mut scheduler = ClickScheduler::new(config.clone(), Instant::now());
    let mut rng = rand::thread_rng();
    let mut stdout = io::stdout();

    loop {
        let now = Instant::now();
        match scheduler.evaluate(now) {
            Decision::BeginRun => {
                scheduler.advance(Decision::BeginRun, now);
                let jitter = if config.jitter { " with jitter" } else { "" };
                write!(
                    stdout,
                    "\r\nClicking every {}ms{jitter} (ESC or q stops)\r\n",
                    config.base_delay_ms
                )?;
                stdout.flush()?;
                info!(
                    delay_ms = config.base_delay_ms,
                    jitter = config.jitter,
                    "run started"
                );
            }
            Decision::Wait(remaining) => {
                let left = remaining.as_secs_f64().ceil() as u64;
                write!(stdout, "\rStarting in {left}s (ESC cancels)  ")?;
                stdout.flush()?;
                if pause(remaining.min(POLL_SLICE), &mut scheduler)? == Signal::Cancel {
                    scheduler.cancel();
                }
            }
            Decision::Click => {
                if let Err(err) = injector.send_click() {
                    scheduler.stop(StopReason::InjectFailure(err.to_string()));
                    continue;
                }
                scheduler.advance(Decision::Click, now);
                counter.record_click();
                let line = status_line(
                    scheduler.click_count(),
                    scheduler.elapsed(now).unwrap_or_default(),
                    counter.total(),
                );
                write!(stdout, "\r{line}")?;
                stdout.flush()?;

                let delay = compute_delay(config.base_delay_ms, config.jitter, &mut rng);
                if pause(delay, &mut scheduler)? == Signal::Cancel {
                    scheduler.cancel();
                }
            }
            Decision::Stop(reason) => {
                scheduler.advance(Decision::Stop(reason.clone()), now);
                counter.flush();
                info!(clicks = scheduler.click_count(), %reason, "run finished");
                return Ok(reason);
            }
        }
    }
}

#[derive(PartialEq, Eq)]
enum Signal {
    Continue,
    Cancel,
}

/// Sleeps for `total` in <=50ms slices, watching the keyboard. ESC and `q`
/// cancel; any other key press counts as interaction for idle tracking.
fn pause(total: Duration, scheduler: &mut ClickScheduler) -> Result<Signal, AppError> {
    let deadline = Instant::now() + total;
    loop {
        let now = Instant::now();
        if now >= deadline {
            return Ok(Signal::Continue);
        }
        let slice = deadline.duration_since(now).min(POLL_SLICE);
        if event::poll(slice)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Esc | KeyCode::Char('q') => return Ok(Signal::Cancel),
                        _ => scheduler.record_interaction(Instant::now()),
                    }
                }
            }
        }
    }
}

fn status_line(clicks: u64, elapsed: Duration, lifetime: u64) -> String {
    format!(
        "clicks: {clicks} | elapsed: {}s | lifetime: {lifetime}   ",
        elapsed.as_secs()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_line_shows_counts_and_elapsed() {
        let line = status_line(42, Duration::from_secs(125), 10_042);
        assert!(line.starts_with("clicks: 42 | elapsed: 125s | lifetime: 10042"));
    }
}
