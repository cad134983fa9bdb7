//! pulseclick: a configurable auto-clicker.
//!
//! Repeats synthetic left-button clicks at a controllable cadence with
//! optional jitter, a start-delay countdown, and auto-stop on duration,
//! click count, or idle timeout. A console loop and an egui window both
//! drive the same [`scheduler::ClickScheduler`].

pub mod config;
pub mod console;
pub mod counter;
pub mod error;
pub mod gui;
pub mod injector;
pub mod scheduler;

pub use config::{Cli, Mode};
pub use counter::LifetimeCounter;
pub use error::{AppError, InjectError};
pub use injector::{ClickInjector, EnigoInjector};
pub use scheduler::{compute_delay, ClickScheduler, Decision, Phase, RunConfig, StopReason};
