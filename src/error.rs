use thiserror::Error;

#[derive(Debug, Error)]
pub enum RigError {
    /// Contract violation: the controller clamp should make this impossible.
    #[error("angle {0} outside servo range 0-180")]
    InvalidAngle(u16),

    #[error("hardware write failed: {0}")]
    HardwareWrite(String),

    #[error("input source unavailable: {0}")]
    InputSource(String),

    #[error("telemetry channel full")]
    TelemetryFull,

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<rppal::spi::Error> for RigError {
    fn from(e: rppal::spi::Error) -> Self {
        RigError::InputSource(e.to_string())
    }
}
