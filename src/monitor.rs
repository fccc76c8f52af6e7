use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex};

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::telemetry::{TelemetryAction, TelemetryEvent};

/// What the dashboard shows: last accepted action, the angle it left the
/// servo at, and how often each direction has been used.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonitorSnapshot {
    pub angle: u16,
    pub last_action: Option<String>,
    pub left_presses: u32,
    pub right_presses: u32,
}

impl MonitorSnapshot {
    pub fn absorb(&mut self, event: &TelemetryEvent) {
        self.angle = event.angle;
        self.last_action = Some(event.action.label().to_string());
        match event.action {
            TelemetryAction::RotatedLeft => self.left_presses += 1,
            TelemetryAction::RotatedRight => self.right_presses += 1,
            TelemetryAction::Start => {}
        }
    }
}

/// Telemetry consumer: drains the channel, logs each event, and keeps the
/// shared snapshot current for the dashboard feed. Exits when the producer
/// side closes.
pub fn monitor_thread(rx: Receiver<TelemetryEvent>, shared: Arc<Mutex<MonitorSnapshot>>) {
    let mut snapshot = MonitorSnapshot::default();
    for event in rx {
        snapshot.absorb(&event);
        println!(
            "[{}] {} -> {}°  (L:{} R:{})",
            Local::now().format("%H:%M:%S%.3f"),
            event.action.label(),
            event.angle,
            snapshot.left_presses,
            snapshot.right_presses,
        );
        *shared.lock().unwrap() = snapshot.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(action: TelemetryAction, angle: u16) -> TelemetryEvent {
        TelemetryEvent { action, angle }
    }

    #[test]
    fn counters_track_rotation_events_only() {
        let mut snapshot = MonitorSnapshot::default();

        snapshot.absorb(&event(TelemetryAction::Start, 90));
        assert_eq!(snapshot.angle, 90);
        assert_eq!(snapshot.last_action.as_deref(), Some("Start"));
        assert_eq!((snapshot.left_presses, snapshot.right_presses), (0, 0));

        snapshot.absorb(&event(TelemetryAction::RotatedLeft, 30));
        snapshot.absorb(&event(TelemetryAction::RotatedLeft, 0));
        snapshot.absorb(&event(TelemetryAction::RotatedRight, 60));
        assert_eq!(snapshot.angle, 60);
        assert_eq!(snapshot.last_action.as_deref(), Some("Rotated Right"));
        assert_eq!((snapshot.left_presses, snapshot.right_presses), (2, 1));
    }

    #[test]
    fn snapshot_serializes_for_the_dashboard() {
        let mut snapshot = MonitorSnapshot::default();
        snapshot.absorb(&event(TelemetryAction::RotatedLeft, 30));
        let json = serde_json::to_string(&snapshot).unwrap();
        assert_eq!(
            json,
            r#"{"angle":30,"last_action":"Rotated Left","left_presses":1,"right_presses":0}"#
        );
    }
}
