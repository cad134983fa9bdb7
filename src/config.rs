//! Command-line surface and run-configuration resolution.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::error::AppError;
use crate::scheduler::RunConfig;

/// Countdown and idle timeout are capped at one day.
pub const MAX_SECS: u64 = 86_400;

/// Default inter-click delay offered to the GUI when none was given.
pub const DEFAULT_DELAY_MS: u64 = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    Console,
    Gui,
}

/// Auto-clicker for a fixed left-button click at a configurable cadence.
#[derive(Parser, Debug)]
#[command(name = "pulseclick", version)]
pub struct Cli {
    /// Presentation mode
    #[arg(long, value_enum, default_value_t = Mode::Gui)]
    pub mode: Mode,

    /// Base delay between clicks in milliseconds (console mode prompts if omitted)
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Disable the +/-10% random jitter applied to each delay
    #[arg(long)]
    pub no_jitter: bool,

    /// Countdown before the first click, in seconds
    #[arg(long, default_value_t = 0)]
    pub start_delay_secs: u64,

    /// Stop automatically after this many seconds of run time
    #[arg(long)]
    pub duration_limit_secs: Option<u64>,

    /// Stop automatically after this many clicks
    #[arg(long)]
    pub click_limit: Option<u64>,

    /// Stop after this many seconds without user interaction (0 disables)
    #[arg(long, default_value_t = 0)]
    pub idle_timeout_secs: u64,

    /// Override the lifetime click counter file location
    #[arg(long)]
    pub counter_file: Option<PathBuf>,
}

impl Cli {
    /// Rejects out-of-range values before anything runs.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.delay_ms == Some(0) {
            return Err(AppError::config("--delay-ms must be at least 1"));
        }
        if self.duration_limit_secs == Some(0) {
            return Err(AppError::config("--duration-limit-secs must be at least 1"));
        }
        if self.click_limit == Some(0) {
            return Err(AppError::config("--click-limit must be at least 1"));
        }
        if self.start_delay_secs > MAX_SECS {
            return Err(AppError::config(format!(
                "--start-delay-secs must be at most {MAX_SECS}"
            )));
        }
        if self.idle_timeout_secs > MAX_SECS {
            return Err(AppError::config(format!(
                "--idle-timeout-secs must be at most {MAX_SECS}"
            )));
        }
        Ok(())
    }

    /// Builds the run configuration once the delay is known.
    pub fn run_config(&self, base_delay_ms: u64) -> RunConfig {
        RunConfig {
            base_delay_ms,
            jitter: !self.no_jitter,
            start_delay_secs: self.start_delay_secs,
            duration_limit_secs: self.duration_limit_secs,
            click_limit: self.click_limit,
            idle_timeout_secs: self.idle_timeout_secs,
        }
    }

    pub fn counter_path(&self) -> PathBuf {
        self.counter_file
            .clone()
            .unwrap_or_else(crate::counter::LifetimeCounter::default_path)
    }
}

/// Asks for the delay interactively; console mode only.
pub fn prompt_delay_ms() -> Result<u64, AppError> {
    dialoguer::Input::<u64>::new()
        .with_prompt("Delay between clicks (ms)")
        .validate_with(|value: &u64| {
            if *value >= 1 {
                Ok(())
            } else {
                Err("delay must be at least 1ms")
            }
        })
        .interact_text()
        .map_err(|err| AppError::environment(format!("cannot prompt for delay: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("pulseclick").chain(args.iter().copied()))
    }

    #[test]
    fn defaults_are_gui_with_jitter() {
        let cli = cli(&[]);
        assert_eq!(cli.mode, Mode::Gui);
        assert!(cli.delay_ms.is_none());
        let cfg = cli.run_config(DEFAULT_DELAY_MS);
        assert!(cfg.jitter);
        assert_eq!(cfg.base_delay_ms, 100);
        assert_eq!(cfg.idle_timeout_secs, 0);
    }

    #[test]
    fn no_jitter_flag_disables_jitter() {
        let cli = cli(&["--no-jitter", "--delay-ms", "250"]);
        let cfg = cli.run_config(cli.delay_ms.unwrap());
        assert!(!cfg.jitter);
        assert_eq!(cfg.base_delay_ms, 250);
    }

    #[test]
    fn zero_values_are_rejected() {
        assert!(cli(&["--delay-ms", "0"]).validate().is_err());
        assert!(cli(&["--duration-limit-secs", "0"]).validate().is_err());
        assert!(cli(&["--click-limit", "0"]).validate().is_err());
    }

    #[test]
    fn out_of_range_seconds_are_rejected() {
        assert!(cli(&["--start-delay-secs", "86401"]).validate().is_err());
        assert!(cli(&["--idle-timeout-secs", "86401"]).validate().is_err());
        assert!(cli(&["--start-delay-secs", "86400"]).validate().is_ok());
    }

    #[test]
    fn limits_pass_through() {
        let cli = cli(&[
            "--mode",
            "console",
            "--delay-ms",
            "100",
            "--duration-limit-secs",
            "60",
            "--click-limit",
            "500",
            "--idle-timeout-secs",
            "30",
        ]);
        cli.validate().unwrap();
        let cfg = cli.run_config(cli.delay_ms.unwrap());
        assert_eq!(cfg.duration_limit_secs, Some(60));
        assert_eq!(cfg.click_limit, Some(500));
        assert_eq!(cfg.idle_timeout_secs, 30);
    }
}
