//! Multi-hypothesis decoding of a two-byte temperature payload.
//!
//! When the datasheet is wrong or missing, the same two bytes are read under
//! every combination of byte order, signedness and fixed-point scale. Each
//! candidate is annotated with whether it lands near an expected reading; the
//! flag is advisory and never removes a candidate.
use crate::config::{DecodeCfg, ScaleHypothesis};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// First byte on the wire is the high byte.
    AsRead,
    Swapped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signedness {
    Unsigned,
    /// Two's-complement 16-bit.
    Signed,
}

impl ByteOrder {
    pub const ALL: [Self; 2] = [Self::AsRead, Self::Swapped];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::AsRead => "as_read",
            Self::Swapped => "swapped",
        }
    }
}

impl Signedness {
    pub const ALL: [Self; 2] = [Self::Unsigned, Self::Signed];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unsigned => "unsigned",
            Self::Signed => "signed",
        }
    }
}

impl fmt::Display for ByteOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl fmt::Display for Signedness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// One interpretation of a payload.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodingCandidate {
    pub byte_order: ByteOrder,
    pub signedness: Signedness,
    pub scale_name: String,
    pub scale_divisor: f64,
    /// 16-bit word after applying `byte_order`.
    pub raw: u16,
    /// `raw` under `signedness`.
    pub value: i32,
    pub celsius: f64,
    pub fahrenheit: f64,
    pub plausible: bool,
}

/// Combine two bytes with `hi` as the most significant.
#[inline]
pub fn word(hi: u8, lo: u8) -> u16 {
    (u16::from(hi) << 8) | u16::from(lo)
}

/// Two's-complement reading of a 16-bit word.
#[inline]
pub fn to_signed16(raw: u16) -> i32 {
    if raw & 0x8000 != 0 {
        i32::from(raw) - 0x1_0000
    } else {
        i32::from(raw)
    }
}

#[inline]
pub fn celsius_to_fahrenheit(c: f64) -> f64 {
    c * 9.0 / 5.0 + 32.0
}

/// Enumerate every (byte order × signedness × scale) reading of `byte0, byte1`.
///
/// Ordering: byte order outer, signedness middle, scales inner in the order
/// given. Divisors must be finite and non-zero.
pub fn decode(
    byte0: u8,
    byte1: u8,
    scales: &[ScaleHypothesis],
    expected_reference: f64,
    tolerance: f64,
) -> Vec<DecodingCandidate> {
    let mut out = Vec::with_capacity(ByteOrder::ALL.len() * Signedness::ALL.len() * scales.len());
    for byte_order in ByteOrder::ALL {
        let raw = match byte_order {
            ByteOrder::AsRead => word(byte0, byte1),
            ByteOrder::Swapped => word(byte1, byte0),
        };
        for signedness in Signedness::ALL {
            let value = match signedness {
                Signedness::Unsigned => i32::from(raw),
                Signedness::Signed => to_signed16(raw),
            };
            for scale in scales {
                debug_assert!(
                    scale.divisor.is_finite() && scale.divisor != 0.0,
                    "scale divisor must be finite and non-zero"
                );
                let celsius = f64::from(value) / scale.divisor;
                let fahrenheit = celsius_to_fahrenheit(celsius);
                let plausible = (fahrenheit - expected_reference).abs() <= tolerance;
                out.push(DecodingCandidate {
                    byte_order,
                    signedness,
                    scale_name: scale.name.clone(),
                    scale_divisor: scale.divisor,
                    raw,
                    value,
                    celsius,
                    fahrenheit,
                    plausible,
                });
            }
        }
    }
    tracing::debug!(
        byte0,
        byte1,
        candidates = out.len(),
        plausible = out.iter().filter(|c| c.plausible).count(),
        "decoded payload"
    );
    out
}

/// [`decode`] bound to a configured scale set and plausibility window.
#[derive(Debug, Clone)]
pub struct HypothesisDecoder {
    cfg: DecodeCfg,
}

impl HypothesisDecoder {
    pub fn new(cfg: DecodeCfg) -> Self {
        Self { cfg }
    }

    pub fn cfg(&self) -> &DecodeCfg {
        &self.cfg
    }

    pub fn decode(&self, bytes: [u8; 2]) -> Vec<DecodingCandidate> {
        decode(
            bytes[0],
            bytes[1],
            &self.cfg.scales,
            self.cfg.expected_f,
            self.cfg.tolerance_f,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_conversion_boundaries() {
        assert_eq!(to_signed16(0x7FFF), 32767);
        assert_eq!(to_signed16(0x8000), -32768);
        assert_eq!(to_signed16(0xFFFF), -1);
        assert_eq!(to_signed16(0), 0);
    }

    #[test]
    fn fahrenheit_reference_points() {
        assert_eq!(celsius_to_fahrenheit(0.0), 32.0);
        assert_eq!(celsius_to_fahrenheit(100.0), 212.0);
        assert_eq!(celsius_to_fahrenheit(-40.0), -40.0);
    }

    #[test]
    fn no_scales_means_no_candidates() {
        assert!(decode(0x01, 0x90, &[], 70.0, 12.0).is_empty());
    }

    #[test]
    fn zero_tolerance_only_matches_exactly() {
        // 0x0019 = 25 counts at per_1 -> 25 °C = 77 °F
        let scales = [ScaleHypothesis::new("per_1", 1.0)];
        let c = decode(0x00, 0x19, &scales, 77.0, 0.0);
        assert!(c[0].plausible);
        assert_eq!(c.iter().filter(|c| c.plausible).count(), 2); // unsigned and signed agree
    }
}
