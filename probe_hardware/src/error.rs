use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("i2c error: {0}")]
    I2c(String),
    #[error("pwm error: {0}")]
    Pwm(String),
    #[error("duty cycle must be within 0..=100 %, got {0}")]
    InvalidDuty(f32),
    #[error("simulated read failure")]
    SimulatedFailure,
}

pub type Result<T> = std::result::Result<T, HwError>;
