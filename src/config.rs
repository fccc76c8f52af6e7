use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};

use crate::error::RigError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MotionStrategy {
    /// One write straight to the target, then a settle delay.
    Immediate,
    /// Walk to the target in inner steps at the configured cadence.
    Smooth,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InputMode {
    /// Buttons (and optionally a stick) wired straight to the Pi.
    Gpio,
    /// Input-event records piped in as JSON lines on stdin.
    EventStream,
}

/// Control codes recognized by the event-stream source. Defaults follow the
/// Linux gamepad conventions (ABS_X, BTN_SOUTH, BTN_EAST).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EventCodes {
    pub axis: u16,
    pub decrease: u16,
    pub increase: u16,
}

impl Default for EventCodes {
    fn default() -> Self {
        EventCodes {
            axis: 0,
            decrease: 304,
            increase: 305,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StickConfig {
    pub channel: u8,  // MCP3008 channel the stick axis is wired to
    pub center: u16,
    pub deadzone: u16,
}

impl Default for StickConfig {
    fn default() -> Self {
        StickConfig {
            channel: 0,
            center: 128,
            deadzone: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RigConfig {
    pub input_mode: InputMode,
    pub servo_pin: u8,
    pub button_left_pin: u8,
    pub button_right_pin: u8,
    /// None runs button-only control. In EventStream mode only center and
    /// deadzone apply.
    pub stick: Option<StickConfig>,
    pub event_codes: EventCodes,

    pub min_angle: u16,
    pub center_angle: u16,
    pub max_angle: u16,
    /// Degrees per accepted intent.
    pub step: u16,

    pub strategy: MotionStrategy,
    /// Degrees per intermediate write in Smooth mode.
    pub inner_step: u16,
    pub cadence_ms: u64,
    pub settle_ms: u64,
    pub poll_ms: u64,
    pub debounce_ms: u64,
    /// How long input reads may keep failing before the loop gives up.
    pub input_retry_ms: u64,

    /// duty% = duty_base + angle * duty_span / 180. The 2.0/10.0 defaults
    /// are the common 50 Hz hobby-servo calibration; adjust per actuator.
    pub duty_base: f64,
    pub duty_span: f64,
    pub pwm_hz: f64,

    pub telemetry_capacity: usize,
    /// Bind address for the dashboard feed, None to disable.
    pub dashboard_bind: Option<String>,
}

impl Default for RigConfig {
    fn default() -> Self {
        RigConfig {
            input_mode: InputMode::Gpio,
            servo_pin: 18,
            button_left_pin: 23,
            button_right_pin: 24,
            stick: None,
            event_codes: EventCodes::default(),
            min_angle: 0,
            center_angle: 90,
            max_angle: 180,
            step: 60,
            strategy: MotionStrategy::Smooth,
            inner_step: 10,
            cadence_ms: 30,
            settle_ms: 300,
            poll_ms: 20,
            debounce_ms: 50,
            input_retry_ms: 2000,
            duty_base: 2.0,
            duty_span: 10.0,
            pwm_hz: 50.0,
            telemetry_capacity: 32,
            dashboard_bind: Some(String::from("0.0.0.0:10013")),
        }
    }
}

impl RigConfig {
    pub fn validate(&self) -> Result<(), RigError> {
        if self.max_angle > 180 {
            return Err(RigError::Config(format!(
                "max_angle {} exceeds the 180 degree servo range",
                self.max_angle
            )));
        }
        if self.min_angle > self.max_angle {
            return Err(RigError::Config(format!(
                "min_angle {} above max_angle {}",
                self.min_angle, self.max_angle
            )));
        }
        if self.center_angle < self.min_angle || self.center_angle > self.max_angle {
            return Err(RigError::Config(format!(
                "center_angle {} outside [{}, {}]",
                self.center_angle, self.min_angle, self.max_angle
            )));
        }
        if self.step == 0 || self.inner_step == 0 {
            return Err(RigError::Config(String::from(
                "step and inner_step must be at least 1 degree",
            )));
        }
        if self.telemetry_capacity == 0 {
            return Err(RigError::Config(String::from(
                "telemetry_capacity must be at least 1",
            )));
        }
        if !(self.pwm_hz > 0.0) || !(self.duty_span > 0.0) {
            return Err(RigError::Config(String::from(
                "pwm_hz and duty_span must be positive",
            )));
        }
        if let Some(stick) = &self.stick {
            if stick.channel >= 8 {
                return Err(RigError::Config(format!(
                    "stick channel {} outside MCP3008 range 0-7",
                    stick.channel
                )));
            }
        }
        Ok(())
    }

    pub fn load(path: &str) -> io::Result<RigConfig> {
        let content = fs::read_to_string(path)?;
        let loaded: RigConfig =
            serde_json::from_str(&content).map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        Ok(loaded)
    }

    pub fn save(&self, path: &str) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

        let mut file = fs::File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}
