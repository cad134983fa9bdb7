//! Windowed host: an eframe app driving the scheduler from the repaint
//! cycle.
//!
//! There is no timer thread. After each click the effective delay is
//! computed and handed to `request_repaint_after`, so every tick reschedules
//! itself one-shot and jitter shows up immediately in the cadence.

use std::time::{Duration, Instant};

use eframe::egui;

use crate::config::{Cli, DEFAULT_DELAY_MS, MAX_SECS};
use crate::counter::LifetimeCounter;
use crate::error::AppError;
use crate::injector::{ClickInjector, EnigoInjector};
use crate::scheduler::{
    compute_delay, ClickScheduler, Decision, Phase, RunConfig, StopReason,
};

/// Repaint cadence while counting down, so the label stays fresh.
const COUNTDOWN_TICK: Duration = Duration::from_millis(100);

pub struct ClickerApp {
    // Live control values, snapshotted into a RunConfig at Start.
    delay_ms: u64,
    jitter: bool,
    start_delay_secs: u64,
    duration_limit: Option<u64>,
    click_limit: Option<u64>,
    idle_timeout_secs: u64,

    scheduler: Option<ClickScheduler>,
    next_click_at: Option<Instant>,
    last_stop_reason: Option<StopReason>,
    last_run_clicks: u64,
    counter: LifetimeCounter,
    injector: EnigoInjector,
}

impl ClickerApp {
    pub fn new(cli: &Cli, counter: LifetimeCounter) -> Self {
        Self {
            delay_ms: cli.delay_ms.unwrap_or(DEFAULT_DELAY_MS),
            jitter: !cli.no_jitter,
            start_delay_secs: cli.start_delay_secs,
            duration_limit: cli.duration_limit_secs,
            click_limit: cli.click_limit,
            idle_timeout_secs: cli.idle_timeout_secs,
            scheduler: None,
            next_click_at: None,
            last_stop_reason: None,
            last_run_clicks: 0,
            counter,
            injector: EnigoInjector::new(),
        }
    }

    /// Atomic read of the live controls; one snapshot per tick prevents
    /// tearing between read and use.
    fn snapshot_config(&self) -> RunConfig {
        RunConfig {
            base_delay_ms: self.delay_ms.max(1),
            jitter: self.jitter,
            start_delay_secs: self.start_delay_secs.min(MAX_SECS),
            duration_limit_secs: self.duration_limit,
            click_limit: self.click_limit,
            idle_timeout_secs: self.idle_timeout_secs.min(MAX_SECS),
        }
    }

    fn start(&mut self) {
        if self.scheduler.is_some() {
            return;
        }
        let config = self.snapshot_config();
        tracing::info!(delay_ms = config.base_delay_ms, jitter = config.jitter, "run started");
        self.scheduler = Some(ClickScheduler::new(config, Instant::now()));
        self.next_click_at = None;
        self.last_stop_reason = None;
        self.last_run_clicks = 0;
    }

    fn stop(&mut self) {
        if let Some(scheduler) = self.scheduler.as_mut() {
            scheduler.cancel();
        }
        self.finish_run();
    }

    /// Tears down a stopped run: records the reason, flushes the counter.
    fn finish_run(&mut self) {
        if let Some(scheduler) = self.scheduler.take() {
            self.last_run_clicks = scheduler.click_count();
            if let Some(reason) = scheduler.stop_reason() {
                tracing::info!(clicks = scheduler.click_count(), %reason, "run finished");
                self.last_stop_reason = Some(reason.clone());
            }
            self.counter.flush();
            self.next_click_at = None;
        }
    }

    /// One scheduling step; reschedules its own next repaint.
    fn tick(&mut self, ctx: &egui::Context) {
        let Some(scheduler) = self.scheduler.as_mut() else {
            return;
        };
        let now = Instant::now();
        match scheduler.evaluate(now) {
            Decision::BeginRun => {
                scheduler.advance(Decision::BeginRun, now);
                self.next_click_at = Some(now);
                ctx.request_repaint();
            }
            Decision::Wait(remaining) => {
                ctx.request_repaint_after(remaining.min(COUNTDOWN_TICK));
            }
            Decision::Click => match self.next_click_at {
                Some(at) if now < at => {
                    ctx.request_repaint_after(at.duration_since(now));
                }
                _ => {
                    if let Err(err) = self.injector.send_click() {
                        scheduler.stop(StopReason::InjectFailure(err.to_string()));
                        ctx.request_repaint();
                        return;
                    }
                    scheduler.advance(Decision::Click, now);
                    self.counter.record_click();
                    let config = scheduler.config();
                    let delay =
                        compute_delay(config.base_delay_ms, config.jitter, &mut rand::thread_rng());
                    self.next_click_at = Some(now + delay);
                    ctx.request_repaint_after(delay);
                }
            },
            Decision::Stop(reason) => {
                scheduler.advance(Decision::Stop(reason), now);
            }
        }
    }

    fn status_text(&self) -> String {
        match &self.scheduler {
            Some(scheduler) => match scheduler.phase() {
                Phase::Pending | Phase::Countdown => {
                    if let Decision::Wait(remaining) = scheduler.evaluate(Instant::now()) {
                        format!("Starting in {}s", remaining.as_secs_f64().ceil() as u64)
                    } else {
                        "Starting".to_string()
                    }
                }
                Phase::Running => format!("Running ({} clicks)", scheduler.click_count()),
                Phase::Stopped => "Stopping".to_string(),
            },
            None => match &self.last_stop_reason {
                Some(reason) => format!("Stopped: {reason} ({} clicks)", self.last_run_clicks),
                None => "Idle".to_string(),
            },
        }
    }
}

impl eframe::App for ClickerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Any input over the window counts as interaction for idle tracking.
        if let Some(scheduler) = self.scheduler.as_mut() {
            if ctx.input(|i| !i.events.is_empty() || i.pointer.delta() != egui::Vec2::ZERO) {
                scheduler.record_interaction(Instant::now());
            }
        }
        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.stop();
        }

        self.tick(ctx);
        if self.scheduler.as_ref().is_some_and(ClickScheduler::is_stopped) {
            self.finish_run();
        }

        let running = self.scheduler.is_some();

        egui::TopBottomPanel::top("top").show(ctx, |ui| {
            ui.heading("Pulseclick");
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.group(|ui| {
                ui.label("Cadence");
                ui.horizontal(|ui| {
                    ui.label("Delay (ms)");
                    ui.add(
                        egui::DragValue::new(&mut self.delay_ms)
                            .speed(1.0)
                            .clamp_range(1..=600_000),
                    );
                });
                ui.checkbox(&mut self.jitter, "Jitter (+/-10%)");
                ui.horizontal(|ui| {
                    ui.label("Start delay (s)");
                    ui.add(
                        egui::DragValue::new(&mut self.start_delay_secs)
                            .speed(1.0)
                            .clamp_range(0..=MAX_SECS),
                    );
                });
            });

            ui.separator();

            ui.group(|ui| {
                ui.label("Auto-stop");
                ui.horizontal(|ui| {
                    let mut has_limit = self.duration_limit.is_some();
                    if ui.checkbox(&mut has_limit, "Duration limit (s)").clicked() {
                        self.duration_limit = if has_limit { Some(60) } else { None };
                    }
                    if let Some(ref mut secs) = self.duration_limit {
                        ui.add(
                            egui::DragValue::new(secs)
                                .speed(1.0)
                                .clamp_range(1..=MAX_SECS),
                        );
                    }
                });
                ui.horizontal(|ui| {
                    let mut has_limit = self.click_limit.is_some();
                    if ui.checkbox(&mut has_limit, "Click limit").clicked() {
                        self.click_limit = if has_limit { Some(100) } else { None };
                    }
                    if let Some(ref mut clicks) = self.click_limit {
                        ui.add(
                            egui::DragValue::new(clicks)
                                .speed(1.0)
                                .clamp_range(1..=1_000_000),
                        );
                    }
                });
                ui.horizontal(|ui| {
                    ui.label("Idle timeout (s, 0 = off)");
                    ui.add(
                        egui::DragValue::new(&mut self.idle_timeout_secs)
                            .speed(1.0)
                            .clamp_range(0..=MAX_SECS),
                    );
                });
            });

            ui.separator();

            ui.horizontal(|ui| {
                if ui.add_enabled(!running, egui::Button::new("Start")).clicked() {
                    self.start();
                }
                if ui.add_enabled(running, egui::Button::new("Stop")).clicked() {
                    self.stop();
                }
            });

            ui.label(format!("Status: {}", self.status_text()));
            ui.monospace(format!("Lifetime clicks: {}", self.counter.total()));
        });
    }
}

impl Drop for ClickerApp {
    fn drop(&mut self) {
        // Window closed mid-run: keep whatever was counted.
        self.counter.flush();
    }
}

/// Opens the window and blocks until it closes.
pub fn run(cli: &Cli, counter: LifetimeCounter) -> Result<(), AppError> {
    let app = ClickerApp::new(cli, counter);
    let mut opts = eframe::NativeOptions::default();
    opts.viewport.inner_size = Some(egui::vec2(380.0, 340.0));
    opts.viewport.resizable = Some(true);
    opts.follow_system_theme = true;

    eframe::run_native(
        "Pulseclick",
        opts,
        Box::new(move |cc| {
            cc.egui_ctx.set_visuals(egui::Visuals::dark());
            Box::new(app)
        }),
    )
    .map_err(|err| AppError::environment(format!("cannot start windowed mode: {err}")))
}
