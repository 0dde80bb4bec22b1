use rppal::i2c::I2c;
use tracing::trace;

use crate::error::{HwError, Result};

/// How the two payload bytes are fetched from the register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    /// I2C block read; bytes in wire order.
    Block,
    /// SMBus read-word; the device sends the low byte first.
    Word,
}

pub struct I2cProbe {
    i2c: I2c,
    register: u8,
    mode: ReadMode,
}

impl I2cProbe {
    pub fn new(bus: u8, address: u16, register: u8, mode: ReadMode) -> Result<Self> {
        let mut i2c = I2c::with_bus(bus).map_err(|e| HwError::I2c(format!("open bus {bus}: {e}")))?;
        i2c.set_slave_address(address)
            .map_err(|e| HwError::I2c(format!("set address 0x{address:02x}: {e}")))?;
        Ok(Self {
            i2c,
            register,
            mode,
        })
    }

    /// Two bytes in the order they arrived on the wire.
    pub fn read_pair(&mut self) -> Result<[u8; 2]> {
        let bytes = match self.mode {
            ReadMode::Block => {
                let mut buf = [0u8; 2];
                self.i2c
                    .block_read(self.register, &mut buf)
                    .map_err(|e| HwError::I2c(e.to_string()))?;
                buf
            }
            ReadMode::Word => self
                .i2c
                .smbus_read_word(self.register)
                .map_err(|e| HwError::I2c(e.to_string()))?
                .to_le_bytes(),
        };
        trace!(b0 = bytes[0], b1 = bytes[1], register = self.register, "i2c read");
        Ok(bytes)
    }

    /// SMBus read-byte from the register; tells a one-byte register apart
    /// from an address that does not answer at all.
    pub fn read_single(&mut self) -> Result<u8> {
        let b = self
            .i2c
            .smbus_read_byte(self.register)
            .map_err(|e| HwError::I2c(e.to_string()))?;
        trace!(b, register = self.register, "i2c byte read");
        Ok(b)
    }
}
