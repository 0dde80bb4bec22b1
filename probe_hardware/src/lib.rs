//! Probe and fan backends: deterministic simulations plus, with the
//! `hardware` feature on Linux, I2C and hardware-PWM drivers via `rppal`.
pub mod error;
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod i2c;
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod pwm;
pub mod util;

use error::HwError;
use probe_traits::{Fan, Probe};

/// Simulated probe with a programmable refresh pattern and failure rate.
#[derive(Debug, Clone)]
pub struct SimulatedProbe {
    base: u16,
    /// Raw value increments by one after this many reads.
    step_every: Option<u32>,
    /// Every n-th read fails.
    fail_every: Option<u32>,
    always_fail: bool,
    reads: u32,
}

impl SimulatedProbe {
    pub fn new(base: u16) -> Self {
        Self {
            base,
            step_every: None,
            fail_every: None,
            always_fail: false,
            reads: 0,
        }
    }

    pub fn with_step_every(mut self, reads: u32) -> Self {
        self.step_every = Some(reads.max(1));
        self
    }

    pub fn with_fail_every(mut self, reads: u32) -> Self {
        self.fail_every = Some(reads.max(1));
        self
    }

    /// A probe that never acknowledges.
    pub fn failing(mut self) -> Self {
        self.always_fail = true;
        self
    }

    pub fn reads(&self) -> u32 {
        self.reads
    }
}

impl Probe for SimulatedProbe {
    fn read_bytes(&mut self) -> Result<[u8; 2], Box<dyn std::error::Error + Send + Sync>> {
        self.reads = self.reads.saturating_add(1);
        if self.always_fail || self.fail_every.is_some_and(|n| self.reads % n == 0) {
            tracing::debug!(read = self.reads, "simulated probe read failure");
            return Err(Box::new(HwError::SimulatedFailure));
        }
        let steps = self.step_every.map_or(0, |n| (self.reads - 1) / n);
        // Wrap like a 16-bit register would.
        let raw = self.base.wrapping_add(steps as u16);
        tracing::trace!(raw, "simulated probe read");
        Ok(raw.to_be_bytes())
    }
}

/// Simulated fan; remembers every duty cycle it was set to.
#[derive(Debug, Default)]
pub struct SimulatedFan {
    history: Vec<f32>,
    stopped: bool,
}

impl SimulatedFan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> &[f32] {
        &self.history
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}

impl Fan for SimulatedFan {
    fn set_duty(&mut self, percent: f32) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        util::duty_fraction(percent)?;
        tracing::info!(percent, "fan duty (simulated)");
        self.history.push(percent);
        self.stopped = false;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        tracing::info!("fan stopped (simulated)");
        self.stopped = true;
        Ok(())
    }
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod hardware {
    pub use crate::i2c::{I2cProbe, ReadMode};
    pub use crate::pwm::PwmFan;
    use probe_traits::{Fan, Probe};

    impl Probe for I2cProbe {
        fn read_bytes(&mut self) -> Result<[u8; 2], Box<dyn std::error::Error + Send + Sync>> {
            self.read_pair().map_err(|e| {
                tracing::debug!(error = %e, "probe read failed");
                Box::new(e) as Box<dyn std::error::Error + Send + Sync>
            })
        }

        fn read_byte(&mut self) -> Result<u8, Box<dyn std::error::Error + Send + Sync>> {
            Ok(self.read_single()?)
        }
    }

    impl Fan for PwmFan {
        fn set_duty(
            &mut self,
            percent: f32,
        ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            tracing::debug!(percent, "fan duty");
            Ok(self.set_percent(percent)?)
        }

        fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            Ok(self.disable()?)
        }
    }
}
