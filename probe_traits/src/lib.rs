pub mod clock;

pub use clock::{Clock, MonotonicClock};

/// Two-byte register read from the probe under test.
///
/// Bytes are returned in the order they came off the bus; interpreting them
/// (byte order, signedness, scale) is left to the caller.
pub trait Probe {
    fn read_bytes(&mut self) -> Result<[u8; 2], Box<dyn std::error::Error + Send + Sync>>;

    /// Raw 16-bit reading, first byte as the high byte.
    fn read_raw(&mut self) -> Result<u16, Box<dyn std::error::Error + Send + Sync>> {
        self.read_bytes().map(u16::from_be_bytes)
    }

    /// Single byte at the register. Backends without a one-byte transfer
    /// return the first byte of a pair read.
    fn read_byte(&mut self) -> Result<u8, Box<dyn std::error::Error + Send + Sync>> {
        self.read_bytes().map(|b| b[0])
    }
}

pub trait Fan {
    /// Set duty cycle in percent (0.0..=100.0).
    fn set_duty(&mut self, percent: f32) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

impl<P: Probe + ?Sized> Probe for Box<P> {
    fn read_bytes(&mut self) -> Result<[u8; 2], Box<dyn std::error::Error + Send + Sync>> {
        (**self).read_bytes()
    }
    fn read_byte(&mut self) -> Result<u8, Box<dyn std::error::Error + Send + Sync>> {
        (**self).read_byte()
    }
}

impl<F: Fan + ?Sized> Fan for Box<F> {
    fn set_duty(&mut self, percent: f32) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).set_duty(percent)
    }
    fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).stop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed([u8; 2]);

    impl Probe for Fixed {
        fn read_bytes(&mut self) -> Result<[u8; 2], Box<dyn std::error::Error + Send + Sync>> {
            Ok(self.0)
        }
    }

    #[test]
    fn read_raw_uses_first_byte_as_high() {
        let mut p = Fixed([0x01, 0x90]);
        assert_eq!(p.read_raw().unwrap(), 400);
    }

    #[test]
    fn boxed_probe_forwards() {
        let mut p: Box<dyn Probe> = Box::new(Fixed([0x90, 0x01]));
        assert_eq!(p.read_raw().unwrap(), 0x9001);
    }

    struct ByteWide;

    impl Probe for ByteWide {
        fn read_bytes(&mut self) -> Result<[u8; 2], Box<dyn std::error::Error + Send + Sync>> {
            Err("pair read not supported".into())
        }
        fn read_byte(&mut self) -> Result<u8, Box<dyn std::error::Error + Send + Sync>> {
            Ok(0x2a)
        }
    }

    #[test]
    fn read_byte_defaults_to_first_byte() {
        let mut p = Fixed([0x01, 0x90]);
        assert_eq!(p.read_byte().unwrap(), 0x01);
    }

    #[test]
    fn boxed_probe_forwards_byte_reads() {
        let mut p: Box<dyn Probe> = Box::new(ByteWide);
        assert_eq!(p.read_byte().unwrap(), 0x2a);
        assert!(p.read_bytes().is_err());
    }
}
