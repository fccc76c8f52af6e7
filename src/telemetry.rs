use std::sync::mpsc::{SyncSender, TrySendError};

use serde::{Deserialize, Serialize};

use crate::error::RigError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TelemetryAction {
    Start,
    #[serde(rename = "Rotated Left")]
    RotatedLeft,
    #[serde(rename = "Rotated Right")]
    RotatedRight,
}

impl TelemetryAction {
    pub fn label(&self) -> &'static str {
        match self {
            TelemetryAction::Start => "Start",
            TelemetryAction::RotatedLeft => "Rotated Left",
            TelemetryAction::RotatedRight => "Rotated Right",
        }
    }
}

/// One accepted motion, as reported to the dashboard side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TelemetryEvent {
    pub action: TelemetryAction,
    pub angle: u16,
}

pub struct TelemetryEmitter {
    tx: SyncSender<TelemetryEvent>,
}

impl TelemetryEmitter {
    pub fn new(tx: SyncSender<TelemetryEvent>) -> Self {
        TelemetryEmitter { tx }
    }

    /// Non-blocking send. A full (or closed) channel reports TelemetryFull
    /// so the caller can apply its drop policy; the control loop never waits
    /// on the consumer.
    pub fn emit(&self, action: TelemetryAction, angle: u16) -> Result<(), RigError> {
        match self.tx.try_send(TelemetryEvent { action, angle }) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                Err(RigError::TelemetryFull)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use super::*;

    #[test]
    fn events_arrive_in_order() {
        let (tx, rx) = mpsc::sync_channel(8);
        let emitter = TelemetryEmitter::new(tx);

        emitter.emit(TelemetryAction::Start, 90).unwrap();
        emitter.emit(TelemetryAction::RotatedLeft, 30).unwrap();
        emitter.emit(TelemetryAction::RotatedRight, 90).unwrap();

        let received: Vec<TelemetryEvent> = rx.try_iter().collect();
        assert_eq!(
            received,
            vec![
                TelemetryEvent { action: TelemetryAction::Start, angle: 90 },
                TelemetryEvent { action: TelemetryAction::RotatedLeft, angle: 30 },
                TelemetryEvent { action: TelemetryAction::RotatedRight, angle: 90 },
            ]
        );
    }

    #[test]
    fn full_channel_reports_instead_of_blocking() {
        let (tx, rx) = mpsc::sync_channel(1);
        let emitter = TelemetryEmitter::new(tx);

        emitter.emit(TelemetryAction::Start, 90).unwrap();
        let err = emitter.emit(TelemetryAction::RotatedLeft, 30).unwrap_err();
        assert!(matches!(err, RigError::TelemetryFull));

        // The queued event is untouched by the failed send.
        assert_eq!(rx.recv().unwrap().action, TelemetryAction::Start);
    }

    #[test]
    fn closed_channel_is_not_fatal() {
        let (tx, rx) = mpsc::sync_channel(1);
        drop(rx);
        let emitter = TelemetryEmitter::new(tx);
        assert!(matches!(
            emitter.emit(TelemetryAction::Start, 90),
            Err(RigError::TelemetryFull)
        ));
    }

    #[test]
    fn wire_labels_match_the_dashboard_protocol() {
        let json = serde_json::to_string(&TelemetryEvent {
            action: TelemetryAction::RotatedLeft,
            angle: 30,
        })
        .unwrap();
        assert_eq!(json, r#"{"action":"Rotated Left","angle":30}"#);
        assert_eq!(TelemetryAction::RotatedRight.label(), "Rotated Right");
    }
}
