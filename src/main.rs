use std::process::ExitCode;

use clap::Parser;

use pulseclick::config::{self, Cli, Mode};
use pulseclick::counter::LifetimeCounter;
use pulseclick::error::AppError;
use pulseclick::injector::EnigoInjector;
use pulseclick::{console, gui};

fn main() -> ExitCode {
    setup_tracing();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), AppError> {
    cli.validate()?;
    let mut counter = LifetimeCounter::load(cli.counter_path())?;

    match cli.mode {
        Mode::Console => {
            let delay_ms = match cli.delay_ms {
                Some(ms) => ms,
                None => config::prompt_delay_ms()?,
            };
            let mut injector = EnigoInjector::new();
            console::run(cli.run_config(delay_ms), &mut counter, &mut injector)?;
            Ok(())
        }
        Mode::Gui => gui::run(&cli, counter),
    }
}

fn setup_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}
