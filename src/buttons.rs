use rppal::gpio::{Gpio, InputPin, Level};
use std::time::{Duration, Instant};

use crate::error::RigError;

// Buttons are wired active-low: the internal pull-up keeps the line high
// until the switch shorts it to ground.
struct DebouncedPin {
    pin: InputPin,
    current: Level,
    last_stable: Level,
    last_change: Instant,
    debounce: Duration,
}

impl DebouncedPin {
    fn new(gpio: &Gpio, pin_num: u8, debounce: Duration) -> Result<Self, RigError> {
        let pin = gpio
            .get(pin_num)
            .map_err(|e| RigError::InputSource(format!("GPIO {}: {}", pin_num, e)))?
            .into_input_pullup();
        println!("GPIO {} initialized (pull-up)", pin_num);
        Ok(DebouncedPin {
            pin,
            current: Level::High,
            last_stable: Level::High,
            last_change: Instant::now(),
            debounce,
        })
    }

    // A level only becomes the stable reading after holding through the
    // debounce interval.
    fn update(&mut self) {
        let level = self.pin.read();
        if level != self.current {
            self.current = level;
            self.last_change = Instant::now();
            return;
        }
        if self.current != self.last_stable && self.last_change.elapsed() >= self.debounce {
            self.last_stable = self.current;
        }
    }

    fn pressed(&self) -> bool {
        self.last_stable == Level::Low
    }
}

pub struct ButtonPair {
    decrease: DebouncedPin,
    increase: DebouncedPin,
}

impl ButtonPair {
    pub fn new(decrease_pin: u8, increase_pin: u8, debounce: Duration) -> Result<Self, RigError> {
        let gpio = Gpio::new().map_err(|e| RigError::InputSource(e.to_string()))?;
        Ok(ButtonPair {
            decrease: DebouncedPin::new(&gpio, decrease_pin, debounce)?,
            increase: DebouncedPin::new(&gpio, increase_pin, debounce)?,
        })
    }

    /// Current debounced (decrease, increase) press states.
    pub fn sample(&mut self) -> (bool, bool) {
        self.decrease.update();
        self.increase.update();
        (self.decrease.pressed(), self.increase.pressed())
    }
}
