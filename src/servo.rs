use rppal::gpio::{Gpio, OutputPin};

use crate::error::RigError;

/// Hard limit of the pulse-width mapping, independent of the configured
/// soft bounds.
pub const ANGLE_LIMIT: u16 = 180;

/// Seam between the driver and the PWM carrier, so motion can be exercised
/// without a Pi under it.
pub trait PulseChannel {
    fn set_duty_percent(&mut self, percent: f64) -> Result<(), RigError>;
    fn clear(&mut self) -> Result<(), RigError>;
}

/// Software PWM on a GPIO output pin.
pub struct SoftPwmPin {
    pin: OutputPin,
    frequency_hz: f64,
}

impl SoftPwmPin {
    pub fn new(pin_num: u8, frequency_hz: f64) -> Result<Self, RigError> {
        let pin = Gpio::new()
            .map_err(|e| RigError::HardwareWrite(e.to_string()))?
            .get(pin_num)
            .map_err(|e| RigError::HardwareWrite(format!("GPIO {}: {}", pin_num, e)))?
            .into_output();
        println!("Servo output on GPIO {} at {} Hz", pin_num, frequency_hz);
        Ok(SoftPwmPin { pin, frequency_hz })
    }
}

impl PulseChannel for SoftPwmPin {
    fn set_duty_percent(&mut self, percent: f64) -> Result<(), RigError> {
        self.pin
            .set_pwm_frequency(self.frequency_hz, percent / 100.0)
            .map_err(|e| RigError::HardwareWrite(e.to_string()))
    }

    fn clear(&mut self) -> Result<(), RigError> {
        self.pin
            .clear_pwm()
            .map_err(|e| RigError::HardwareWrite(e.to_string()))
    }
}

pub struct ActuatorDriver<C: PulseChannel> {
    channel: C,
    duty_base: f64,
    duty_span: f64,
}

impl<C: PulseChannel> ActuatorDriver<C> {
    pub fn new(channel: C, duty_base: f64, duty_span: f64) -> Self {
        ActuatorDriver {
            channel,
            duty_base,
            duty_span,
        }
    }

    /// duty% = base + angle * span / 180. With the 2.0/10.0 defaults this is
    /// the classic 2 + angle / 18 hobby-servo mapping.
    pub fn duty_for(&self, angle: u16) -> Result<f64, RigError> {
        if angle > ANGLE_LIMIT {
            return Err(RigError::InvalidAngle(angle));
        }
        Ok(self.duty_base + f64::from(angle) * self.duty_span / f64::from(ANGLE_LIMIT))
    }

    pub fn write_angle(&mut self, angle: u16) -> Result<(), RigError> {
        let duty = self.duty_for(angle)?;
        self.channel.set_duty_percent(duty)
    }

    /// Drop the carrier, leaving the output inert. Safe to call at any time,
    /// including mid-sequence.
    pub fn stop(&mut self) -> Result<(), RigError> {
        self.channel.clear()
    }
}

// Whatever path the loop exits through, the pin must not keep asserting the
// last duty value.
impl<C: PulseChannel> Drop for ActuatorDriver<C> {
    fn drop(&mut self) {
        let _ = self.channel.clear();
    }
}
