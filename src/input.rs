use std::sync::mpsc::{Receiver, TryRecvError};

use serde::{Deserialize, Serialize};

use crate::adc::AdcReader;
use crate::buttons::ButtonPair;
use crate::config::{EventCodes, StickConfig};
use crate::error::RigError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MovementIntent {
    None,
    Decrease,
    Increase,
}

/// Axis deadzone filter. Values inside [center - deadzone, center + deadzone]
/// (inclusive) read as centered.
pub fn axis_intent(raw: u16, center: u16, deadzone: u16) -> MovementIntent {
    let raw = raw as i32;
    let center = center as i32;
    let deadzone = deadzone as i32;
    if raw < center - deadzone {
        MovementIntent::Decrease
    } else if raw > center + deadzone {
        MovementIntent::Increase
    } else {
        MovementIntent::None
    }
}

/// Decrease wins when opposite directions are asserted at once.
pub fn resolve_intent(decrease: bool, increase: bool, axis: MovementIntent) -> MovementIntent {
    if decrease || axis == MovementIntent::Decrease {
        MovementIntent::Decrease
    } else if increase || axis == MovementIntent::Increase {
        MovementIntent::Increase
    } else {
        MovementIntent::None
    }
}

pub trait IntentSource {
    fn sample(&mut self) -> Result<MovementIntent, RigError>;
}

/// Buttons on GPIO, optionally combined with an analog stick axis on the ADC.
pub struct GpioSource {
    buttons: ButtonPair,
    stick: Option<(AdcReader, StickConfig)>,
}

impl GpioSource {
    pub fn new(buttons: ButtonPair, stick: Option<(AdcReader, StickConfig)>) -> Self {
        GpioSource { buttons, stick }
    }
}

impl IntentSource for GpioSource {
    fn sample(&mut self) -> Result<MovementIntent, RigError> {
        let (decrease, increase) = self.buttons.sample();
        let axis = match &mut self.stick {
            Some((adc, cfg)) => {
                axis_intent(adc.read_channel(cfg.channel)?, cfg.center, cfg.deadzone)
            }
            None => MovementIntent::None,
        };
        Ok(resolve_intent(decrease, increase, axis))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InputEventKind {
    AxisMove,
    ButtonChange,
}

/// One record from an abstract input-event stream (a gamepad reader, a
/// remote frontend, a test script).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InputEvent {
    pub kind: InputEventKind,
    pub code: u16,
    pub value: i32,
}

/// Latches the most recent axis position and button states out of the event
/// stream, then derives one intent per sampling cycle.
pub struct EventStreamSource {
    rx: Receiver<InputEvent>,
    codes: EventCodes,
    center: u16,
    deadzone: u16,
    axis_value: u16,
    decrease_pressed: bool,
    increase_pressed: bool,
}

impl EventStreamSource {
    pub fn new(rx: Receiver<InputEvent>, codes: EventCodes, center: u16, deadzone: u16) -> Self {
        EventStreamSource {
            rx,
            codes,
            center,
            deadzone,
            axis_value: center,
            decrease_pressed: false,
            increase_pressed: false,
        }
    }

    fn latch(&mut self, event: InputEvent) {
        match event.kind {
            InputEventKind::AxisMove if event.code == self.codes.axis => {
                self.axis_value = event.value.clamp(0, i32::from(u16::MAX)) as u16;
            }
            InputEventKind::ButtonChange if event.code == self.codes.decrease => {
                self.decrease_pressed = event.value != 0;
            }
            InputEventKind::ButtonChange if event.code == self.codes.increase => {
                self.increase_pressed = event.value != 0;
            }
            _ => {}
        }
    }
}

impl IntentSource for EventStreamSource {
    fn sample(&mut self) -> Result<MovementIntent, RigError> {
        loop {
            match self.rx.try_recv() {
                Ok(event) => self.latch(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    return Err(RigError::InputSource(String::from(
                        "input event stream closed",
                    )));
                }
            }
        }
        let axis = axis_intent(self.axis_value, self.center, self.deadzone);
        Ok(resolve_intent(
            self.decrease_pressed,
            self.increase_pressed,
            axis,
        ))
    }
}
