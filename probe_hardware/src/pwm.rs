use rppal::pwm::{Channel, Polarity, Pwm};

use crate::error::{HwError, Result};
use crate::util::duty_fraction;

pub struct PwmFan {
    pwm: Pwm,
}

impl PwmFan {
    /// Configure the channel at `frequency_hz`, starting at 0 % duty with output enabled.
    pub fn new(channel: u8, frequency_hz: f64) -> Result<Self> {
        let ch = match channel {
            0 => Channel::Pwm0,
            1 => Channel::Pwm1,
            other => return Err(HwError::Pwm(format!("no hardware PWM channel {other}"))),
        };
        let pwm = Pwm::with_frequency(ch, frequency_hz, 0.0, Polarity::Normal, true)
            .map_err(|e| HwError::Pwm(e.to_string()))?;
        Ok(Self { pwm })
    }

    pub fn set_percent(&mut self, percent: f32) -> Result<()> {
        let fraction = duty_fraction(percent)?;
        self.pwm
            .set_duty_cycle(fraction)
            .map_err(|e| HwError::Pwm(e.to_string()))
    }

    pub fn disable(&mut self) -> Result<()> {
        self.pwm
            .set_duty_cycle(0.0)
            .and_then(|()| self.pwm.disable())
            .map_err(|e| HwError::Pwm(e.to_string()))
    }
}
