mod adc;
mod angle;
mod buttons;
mod config;
mod error;
mod input;
mod monitor;
mod motion;
mod rig;
mod servo;
mod telemetry;
mod websocket;

use std::env;
use std::io::{self, BufRead};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, SyncSender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use simple_signal::Signal;

use adc::AdcReader;
use buttons::ButtonPair;
use config::{InputMode, RigConfig};
use input::{EventStreamSource, GpioSource, InputEvent, IntentSource};
use monitor::{monitor_thread, MonitorSnapshot};
use rig::Rig;
use servo::{ActuatorDriver, SoftPwmPin};
use telemetry::{TelemetryEmitter, TelemetryEvent};
use websocket::websocket_thread;

const DEFAULT_CONFIG_PATH: &str = "rig.json";

/// Parses JSON input-event lines from stdin and forwards them to the
/// control loop. Device binding lives outside this process; whatever reads
/// the gamepad just pipes records in.
fn stdin_event_thread(tx: Sender<InputEvent>) {
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<InputEvent>(&line) {
            Ok(event) => {
                if tx.send(event).is_err() {
                    break;
                }
            }
            Err(e) => eprintln!("Bad input event {:?}: {}", line, e),
        }
    }
    // Dropping tx closes the stream; the loop reports the source gone.
}

fn run_rig<S: IntentSource>(
    config: &RigConfig,
    source: S,
    tx: SyncSender<TelemetryEvent>,
    running: Arc<AtomicBool>,
) -> Result<()> {
    let pwm = SoftPwmPin::new(config.servo_pin, config.pwm_hz)?;
    let driver = ActuatorDriver::new(pwm, config.duty_base, config.duty_span);
    let mut rig = Rig::new(config, source, driver, TelemetryEmitter::new(tx), running);
    rig.run()?;
    Ok(())
}

fn main() -> Result<()> {
    println!("Starting servo rig controller");

    let config_path = env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = match RigConfig::load(&config_path) {
        Ok(cfg) => {
            println!("Loaded configuration from {}", config_path);
            cfg
        }
        Err(e) => {
            println!("No configuration at {} ({}), using defaults", config_path, e);
            let cfg = RigConfig::default();
            if let Err(e) = cfg.save(&config_path) {
                eprintln!("Could not write default configuration: {}", e);
            }
            cfg
        }
    };
    config.validate().context("configuration rejected")?;

    let running = Arc::new(AtomicBool::new(true));
    simple_signal::set_handler(&[Signal::Int, Signal::Term], {
        let running = Arc::clone(&running);
        move |_| {
            println!("\nShutdown requested");
            running.store(false, Ordering::SeqCst);
        }
    });

    let (tx, rx): (SyncSender<TelemetryEvent>, Receiver<TelemetryEvent>) =
        mpsc::sync_channel(config.telemetry_capacity);

    let shared = Arc::new(Mutex::new(MonitorSnapshot::default()));

    let shared_monitor = Arc::clone(&shared);
    thread::spawn(move || {
        monitor_thread(rx, shared_monitor);
    });

    if let Some(bind) = config.dashboard_bind.clone() {
        let shared_feed = Arc::clone(&shared);
        thread::spawn(move || {
            websocket_thread(bind, shared_feed);
        });
    }

    match config.input_mode {
        InputMode::Gpio => {
            let buttons = ButtonPair::new(
                config.button_left_pin,
                config.button_right_pin,
                Duration::from_millis(config.debounce_ms),
            )?;
            let stick = match config.stick {
                Some(stick_cfg) => Some((AdcReader::new()?, stick_cfg)),
                None => None,
            };
            run_rig(&config, GpioSource::new(buttons, stick), tx, running)?;
        }
        InputMode::EventStream => {
            let (event_tx, event_rx) = mpsc::channel();
            thread::spawn(move || {
                stdin_event_thread(event_tx);
            });
            let stick = config.stick.unwrap_or_default();
            let source = EventStreamSource::new(
                event_rx,
                config.event_codes,
                stick.center,
                stick.deadzone,
            );
            run_rig(&config, source, tx, running)?;
        }
    }

    println!("Servo disabled, exiting");
    Ok(())
}
