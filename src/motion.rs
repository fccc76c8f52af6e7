use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use crate::config::{MotionStrategy, RigConfig};
use crate::error::RigError;
use crate::servo::{ActuatorDriver, PulseChannel};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotionOutcome {
    Completed,
    /// Shutdown was requested mid-move; the remaining writes were skipped.
    Interrupted,
}

/// Intermediate angles for a smooth move: starts at the current angle,
/// advances monotonically by `inner_step`, and always ends exactly on the
/// target even when the delta is not a multiple of the step. Empty when
/// already on target.
pub fn plan(current: u16, target: u16, inner_step: u16) -> Vec<u16> {
    if current == target {
        return Vec::new();
    }
    let step = i32::from(inner_step.max(1));
    let target_i = i32::from(target);
    let mut angles = Vec::new();
    let mut a = i32::from(current);
    if target_i > a {
        while a < target_i {
            angles.push(a as u16);
            a += step;
        }
    } else {
        while a > target_i {
            angles.push(a as u16);
            a -= step;
        }
    }
    angles.push(target);
    angles
}

pub struct MotionProfile {
    strategy: MotionStrategy,
    inner_step: u16,
    cadence: Duration,
    settle: Duration,
}

impl MotionProfile {
    pub fn from_config(cfg: &RigConfig) -> Self {
        MotionProfile {
            strategy: cfg.strategy,
            inner_step: cfg.inner_step,
            cadence: Duration::from_millis(cfg.cadence_ms),
            settle: Duration::from_millis(cfg.settle_ms),
        }
    }

    /// Drive the actuator from `current` to `target`. A failed write aborts
    /// the rest of the sequence; once the shutdown flag drops, no further
    /// writes happen and the move reports Interrupted.
    pub fn run<C: PulseChannel>(
        &self,
        driver: &mut ActuatorDriver<C>,
        current: u16,
        target: u16,
        running: &AtomicBool,
    ) -> Result<MotionOutcome, RigError> {
        match self.strategy {
            MotionStrategy::Immediate => {
                if !running.load(Ordering::SeqCst) {
                    return Ok(MotionOutcome::Interrupted);
                }
                driver.write_angle(target)?;
                thread::sleep(self.settle);
                Ok(MotionOutcome::Completed)
            }
            MotionStrategy::Smooth => {
                for angle in plan(current, target, self.inner_step) {
                    if !running.load(Ordering::SeqCst) {
                        return Ok(MotionOutcome::Interrupted);
                    }
                    driver.write_angle(angle)?;
                    thread::sleep(self.cadence);
                }
                Ok(MotionOutcome::Completed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;
    use std::sync::Arc;

    use super::*;
    use crate::servo::testing::FakeChannel;

    fn profile(strategy: MotionStrategy) -> MotionProfile {
        MotionProfile {
            strategy,
            inner_step: 10,
            cadence: Duration::ZERO,
            settle: Duration::ZERO,
        }
    }

    #[test]
    fn smooth_plan_walks_to_the_target_inclusive() {
        assert_eq!(
            plan(90, 180, 10),
            vec![90, 100, 110, 120, 130, 140, 150, 160, 170, 180]
        );
    }

    #[test]
    fn smooth_plan_handles_non_exact_deltas() {
        assert_eq!(plan(90, 125, 10), vec![90, 100, 110, 120, 125]);
        assert_eq!(plan(125, 90, 10), vec![125, 115, 105, 95, 90]);
    }

    #[test]
    fn smooth_plan_is_empty_on_target() {
        assert!(plan(90, 90, 10).is_empty());
    }

    #[test]
    fn smooth_plan_is_symmetric() {
        let down = plan(180, 90, 10);
        let up = plan(90, 180, 10);
        assert_eq!(down.len(), up.len());
        assert_eq!(*down.last().unwrap(), 90);
        assert_eq!(*up.last().unwrap(), 180);

        // Non-exact divisibility keeps the counts within one of each other.
        let down = plan(125, 90, 10);
        let up = plan(90, 125, 10);
        assert!(down.len().abs_diff(up.len()) <= 1);
    }

    #[test]
    fn smooth_run_asserts_every_intermediate_duty() {
        let channel = FakeChannel::default();
        let mut driver = ActuatorDriver::new(channel.clone(), 2.0, 10.0);
        let running = AtomicBool::new(true);

        let outcome = profile(MotionStrategy::Smooth)
            .run(&mut driver, 90, 120, &running)
            .unwrap();

        assert_eq!(outcome, MotionOutcome::Completed);
        // 90, 100, 110, 120 degrees
        let expected: Vec<f64> = [90u16, 100, 110, 120]
            .iter()
            .map(|&a| 2.0 + f64::from(a) / 18.0)
            .collect();
        assert_eq!(channel.0.borrow().writes, expected);
    }

    #[test]
    fn immediate_run_writes_once() {
        let channel = FakeChannel::default();
        let mut driver = ActuatorDriver::new(channel.clone(), 2.0, 10.0);
        let running = AtomicBool::new(true);

        let outcome = profile(MotionStrategy::Immediate)
            .run(&mut driver, 90, 30, &running)
            .unwrap();

        assert_eq!(outcome, MotionOutcome::Completed);
        assert_eq!(channel.0.borrow().writes, vec![2.0 + 30.0 / 18.0]);
    }

    #[test]
    fn failed_write_aborts_the_rest_of_the_sequence() {
        let channel = FakeChannel::failing_after(2);
        let mut driver = ActuatorDriver::new(channel.clone(), 2.0, 10.0);
        let running = AtomicBool::new(true);

        let err = profile(MotionStrategy::Smooth)
            .run(&mut driver, 0, 50, &running)
            .unwrap_err();

        assert!(matches!(err, RigError::HardwareWrite(_)));
        assert_eq!(channel.0.borrow().writes.len(), 2);
    }

    #[test]
    fn lowered_flag_stops_the_move_before_the_next_write() {
        // Wraps the fake channel so the shutdown flag drops after the
        // second write, as an interrupt arriving mid-sequence would.
        struct TrippingChannel {
            inner: FakeChannel,
            running: Arc<AtomicBool>,
            after: Rc<Cell<usize>>,
        }
        impl PulseChannel for TrippingChannel {
            fn set_duty_percent(&mut self, percent: f64) -> Result<(), RigError> {
                self.inner.set_duty_percent(percent)?;
                let left = self.after.get();
                if left <= 1 {
                    self.running.store(false, Ordering::SeqCst);
                } else {
                    self.after.set(left - 1);
                }
                Ok(())
            }
            fn clear(&mut self) -> Result<(), RigError> {
                self.inner.clear()
            }
        }

        let log = FakeChannel::default();
        let running = Arc::new(AtomicBool::new(true));
        let channel = TrippingChannel {
            inner: log.clone(),
            running: Arc::clone(&running),
            after: Rc::new(Cell::new(2)),
        };
        let mut driver = ActuatorDriver::new(channel, 2.0, 10.0);

        let outcome = profile(MotionStrategy::Smooth)
            .run(&mut driver, 0, 180, &running)
            .unwrap();

        assert_eq!(outcome, MotionOutcome::Interrupted);
        assert_eq!(log.0.borrow().writes.len(), 2);

        // Disable must still be possible after the abort.
        driver.stop().unwrap();
        assert!(log.0.borrow().cleared);
    }

    #[test]
    fn already_lowered_flag_writes_nothing() {
        let channel = FakeChannel::default();
        let mut driver = ActuatorDriver::new(channel.clone(), 2.0, 10.0);
        let running = AtomicBool::new(false);

        let outcome = profile(MotionStrategy::Smooth)
            .run(&mut driver, 0, 90, &running)
            .unwrap();
        assert_eq!(outcome, MotionOutcome::Interrupted);

        let outcome = profile(MotionStrategy::Immediate)
            .run(&mut driver, 0, 90, &running)
            .unwrap();
        assert_eq!(outcome, MotionOutcome::Interrupted);

        assert!(channel.0.borrow().writes.is_empty());
    }
}
