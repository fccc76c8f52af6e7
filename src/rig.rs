use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crate::angle::AngleState;
use crate::config::RigConfig;
use crate::error::RigError;
use crate::input::IntentSource;
use crate::motion::{MotionOutcome, MotionProfile};
use crate::servo::{ActuatorDriver, PulseChannel};
use crate::telemetry::{TelemetryAction, TelemetryEmitter};

/// The control loop context: one owner for the angle state and all the
/// stage collaborators. `run` is the whole hot path.
pub struct Rig<S: IntentSource, C: PulseChannel> {
    source: S,
    driver: ActuatorDriver<C>,
    profile: MotionProfile,
    angle: AngleState,
    telemetry: TelemetryEmitter,
    running: Arc<AtomicBool>,
    step: u16,
    poll: Duration,
    settle: Duration,
    input_retry: Duration,
    dropped_events: u64,
}

impl<S: IntentSource, C: PulseChannel> Rig<S, C> {
    pub fn new(
        cfg: &RigConfig,
        source: S,
        driver: ActuatorDriver<C>,
        telemetry: TelemetryEmitter,
        running: Arc<AtomicBool>,
    ) -> Self {
        Rig {
            source,
            driver,
            profile: MotionProfile::from_config(cfg),
            angle: AngleState::new(cfg.center_angle, cfg.min_angle, cfg.max_angle),
            telemetry,
            running,
            step: cfg.step,
            poll: Duration::from_millis(cfg.poll_ms),
            settle: Duration::from_millis(cfg.settle_ms),
            input_retry: Duration::from_millis(cfg.input_retry_ms),
            dropped_events: 0,
        }
    }

    pub fn run(&mut self) -> Result<(), RigError> {
        let result = self.run_inner();
        // The actuator ends up disabled on every exit path.
        let stopped = self.driver.stop();
        result.and(stopped)
    }

    fn run_inner(&mut self) -> Result<(), RigError> {
        self.driver.write_angle(self.angle.current())?;
        thread::sleep(self.settle);
        self.send_event(TelemetryAction::Start, self.angle.current());
        println!("[RIG] started at {}°", self.angle.current());

        let mut input_down_since: Option<Instant> = None;
        let mut input_failures: u32 = 0;

        while self.running.load(Ordering::SeqCst) {
            let intent = match self.source.sample() {
                Ok(intent) => {
                    input_down_since = None;
                    input_failures = 0;
                    intent
                }
                Err(e) => {
                    let since = *input_down_since.get_or_insert_with(Instant::now);
                    if since.elapsed() >= self.input_retry {
                        eprintln!("[INPUT] giving up: {}", e);
                        return Err(e);
                    }
                    eprintln!("[INPUT] {} (retrying)", e);
                    thread::sleep(self.poll.saturating_mul(1 << input_failures.min(4)));
                    input_failures += 1;
                    continue;
                }
            };

            if let Some(mv) = self.angle.apply(intent, self.step) {
                let outcome =
                    self.profile
                        .run(&mut self.driver, self.angle.current(), mv.target, &self.running)?;
                match outcome {
                    MotionOutcome::Completed => {
                        self.angle.commit(mv.target);
                        self.send_event(mv.action, mv.target);
                    }
                    MotionOutcome::Interrupted => break,
                }
            }

            thread::sleep(self.poll);
        }

        println!("[RIG] shutting down");
        Ok(())
    }

    fn send_event(&mut self, action: TelemetryAction, angle: u16) {
        if self.telemetry.emit(action, angle).is_err() {
            self.dropped_events += 1;
            println!(
                "[TELEMETRY] consumer not keeping up, {} event(s) dropped",
                self.dropped_events
            );
        }
    }
}
