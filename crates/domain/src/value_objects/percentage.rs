//! Percentage value object used for fault injection rates

use std::fmt;

use serde::{Deserialize, Serialize};

/// A whole-number percentage in the range `0..=100`
///
/// Construction saturates instead of failing: administrative input that is
/// out of range is clamped so that malformed requests degrade to a valid
/// policy.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(from = "i64", into = "u8")]
pub struct Percentage(u8);

impl Percentage {
    /// 0%
    pub const ZERO: Self = Self(0);
    /// 100%
    pub const FULL: Self = Self(100);

    /// Create a percentage, clamping the value into `0..=100`
    ///
    /// # Examples
    ///
    /// ```
    /// use domain::Percentage;
    ///
    /// assert_eq!(Percentage::saturating(42).value(), 42);
    /// assert_eq!(Percentage::saturating(-5).value(), 0);
    /// assert_eq!(Percentage::saturating(250).value(), 100);
    /// ```
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub const fn saturating(value: i64) -> Self {
        if value <= 0 {
            Self(0)
        } else if value >= 100 {
            Self(100)
        } else {
            Self(value as u8)
        }
    }

    /// Get the raw value
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Whether this percentage can never trigger
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Whether a roll drawn uniformly from `0..100` falls under this percentage
    pub const fn admits_roll(self, roll: u8) -> bool {
        roll < self.0
    }
}

impl From<i64> for Percentage {
    fn from(value: i64) -> Self {
        Self::saturating(value)
    }
}

impl From<Percentage> for u8 {
    fn from(p: Percentage) -> Self {
        p.0
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_never_admits() {
        for roll in 0..100 {
            assert!(!Percentage::ZERO.admits_roll(roll));
        }
    }

    #[test]
    fn full_always_admits() {
        for roll in 0..100 {
            assert!(Percentage::FULL.admits_roll(roll));
        }
    }

    #[test]
    fn boundary_roll() {
        let p = Percentage::saturating(30);
        assert!(p.admits_roll(29));
        assert!(!p.admits_roll(30));
    }

    #[test]
    fn display_has_percent_sign() {
        assert_eq!(Percentage::saturating(7).to_string(), "7%");
    }

    #[test]
    fn deserializes_out_of_range_values() {
        let p: Percentage = serde_json::from_str("900").unwrap();
        assert_eq!(p, Percentage::FULL);
        let p: Percentage = serde_json::from_str("-1").unwrap();
        assert_eq!(p, Percentage::ZERO);
    }
}
