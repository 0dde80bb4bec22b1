use crate::error::{HwError, Result};

/// Convert a duty cycle in percent to the 0.0..=1.0 fraction PWM drivers expect.
pub fn duty_fraction(percent: f32) -> Result<f64> {
    if !(0.0..=100.0).contains(&percent) {
        return Err(HwError::InvalidDuty(percent));
    }
    Ok(f64::from(percent) / 100.0)
}
