use rppal::spi::{Bus, Mode, SlaveSelect, Spi};

use crate::error::RigError;

/// MCP3008 on SPI0.0, used for the analog stick axis.
pub struct AdcReader {
    spi: Spi,
}

impl AdcReader {
    pub fn new() -> Result<Self, RigError> {
        let spi = Spi::new(Bus::Spi0, SlaveSelect::Ss0, 1_000_000, Mode::Mode0)?;
        println!("MCP3008 ADC initialized on SPI0.0");
        Ok(AdcReader { spi })
    }

    /// Single-ended conversion, 10-bit result (0-1023).
    pub fn read_channel(&mut self, channel: u8) -> Result<u16, RigError> {
        if channel >= 8 {
            return Err(RigError::InputSource(format!(
                "ADC channel {} out of range 0-7",
                channel
            )));
        }

        let tx_buffer = [0x01, (0x08 | channel) << 4, 0x00];
        let mut rx_buffer = [0u8; 3];
        self.spi.transfer(&mut rx_buffer, &tx_buffer)?;

        Ok((((rx_buffer[1] & 0x03) as u16) << 8) | (rx_buffer[2] as u16))
    }
}
