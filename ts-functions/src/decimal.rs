use std::fmt;
use std::str::FromStr;

/// A fixed-point `xsd:decimal` value: `mantissa / 10^SCALE`.
///
/// `oxrdf` literals are lexical-form-only, so arithmetic needs its own
/// numeric representation. A fixed scale avoids the drift of repeatedly
/// parsing/reprinting `f64`, at the cost of a fixed precision; 18 fractional
/// digits comfortably covers every value this evaluator constructs
/// (dates-and-times seconds, division results, literal round-trips).
const SCALE: u32 = 18;
const SCALE_FACTOR: i128 = 1_000_000_000_000_000_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Decimal {
    mantissa: i128,
}

impl Decimal {
    pub const ZERO: Decimal = Decimal { mantissa: 0 };

    pub fn from_i64(value: i64) -> Self {
        Decimal {
            mantissa: i128::from(value) * SCALE_FACTOR,
        }
    }

    pub fn to_f64(self) -> f64 {
        self.mantissa as f64 / SCALE_FACTOR as f64
    }

    pub fn from_f64(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        let mantissa = (value * SCALE_FACTOR as f64).round();
        if mantissa.abs() >= i128::MAX as f64 {
            return None;
        }
        Some(Decimal {
            mantissa: mantissa as i128,
        })
    }

    pub fn is_zero(self) -> bool {
        self.mantissa == 0
    }

    pub fn checked_add(self, other: Decimal) -> Option<Decimal> {
        self.mantissa
            .checked_add(other.mantissa)
            .map(|mantissa| Decimal { mantissa })
    }

    pub fn checked_sub(self, other: Decimal) -> Option<Decimal> {
        self.mantissa
            .checked_sub(other.mantissa)
            .map(|mantissa| Decimal { mantissa })
    }

    pub fn checked_mul(self, other: Decimal) -> Option<Decimal> {
        let product = self.mantissa.checked_mul(other.mantissa)?;
        Some(Decimal {
            mantissa: product / SCALE_FACTOR,
        })
    }

    pub fn checked_div(self, other: Decimal) -> Option<Decimal> {
        if other.is_zero() {
            return None;
        }
        let scaled = self.mantissa.checked_mul(SCALE_FACTOR)?;
        Some(Decimal {
            mantissa: scaled / other.mantissa,
        })
    }

    pub fn neg(self) -> Decimal {
        Decimal {
            mantissa: -self.mantissa,
        }
    }

    pub fn abs(self) -> Decimal {
        Decimal {
            mantissa: self.mantissa.abs(),
        }
    }

    pub fn floor(self) -> Decimal {
        let whole = self.mantissa.div_euclid(SCALE_FACTOR);
        Decimal {
            mantissa: whole * SCALE_FACTOR,
        }
    }

    pub fn ceil(self) -> Decimal {
        let floored = self.floor();
        if floored == self {
            floored
        } else {
            floored
                .checked_add(Decimal::from_i64(1))
                .unwrap_or(floored)
        }
    }

    /// Round-half-up, matching SPARQL's `ROUND` (ties away from negative
    /// infinity for positive values, per XPath `fn:round`).
    pub fn round(self) -> Decimal {
        let half = Decimal {
            mantissa: SCALE_FACTOR / 2,
        };
        self.checked_add(half)
            .map(|shifted| shifted.floor())
            .unwrap_or(self)
    }
}

impl FromStr for Decimal {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, ()> {
        let (sign, s) = match s.strip_prefix('-') {
            Some(rest) => (-1i128, rest),
            None => (1i128, s.strip_prefix('+').unwrap_or(s)),
        };
        let (int_part, frac_part) = match s.split_once('.') {
            Some((i, f)) => (i, f),
            None => (s, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(());
        }
        let int_val: i128 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| ())?
        };
        let mut frac_digits = frac_part.to_string();
        if frac_digits.len() > SCALE as usize {
            return Err(());
        }
        while frac_digits.len() < SCALE as usize {
            frac_digits.push('0');
        }
        let frac_val: i128 = if frac_digits.is_empty() {
            0
        } else {
            frac_digits.parse().map_err(|_| ())?
        };
        Ok(Decimal {
            mantissa: sign * (int_val * SCALE_FACTOR + frac_val),
        })
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.mantissa < 0 { "-" } else { "" };
        let abs = self.mantissa.unsigned_abs();
        let int_part = abs / SCALE_FACTOR as u128;
        let frac_part = abs % SCALE_FACTOR as u128;
        if frac_part == 0 {
            return write!(f, "{sign}{int_part}");
        }
        let mut frac_str = format!("{frac_part:0>width$}", width = SCALE as usize);
        while frac_str.ends_with('0') {
            frac_str.pop();
        }
        write!(f, "{sign}{int_part}.{frac_str}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_displays_round_trip() {
        let d: Decimal = "12.5".parse().unwrap();
        assert_eq!(d.to_string(), "12.5");
    }

    #[test]
    fn negative_values_round_trip() {
        let d: Decimal = "-0.25".parse().unwrap();
        assert_eq!(d.to_string(), "-0.25");
    }

    #[test]
    fn division_by_zero_is_none() {
        let a = Decimal::from_i64(1);
        assert_eq!(a.checked_div(Decimal::ZERO), None);
    }

    #[test]
    fn floor_and_ceil_match_expected_values() {
        let d: Decimal = "1.5".parse().unwrap();
        assert_eq!(d.floor().to_string(), "1");
        assert_eq!(d.ceil().to_string(), "2");
        let neg: Decimal = "-1.5".parse().unwrap();
        assert_eq!(neg.floor().to_string(), "-2");
    }

    #[test]
    fn round_rounds_half_up() {
        let d: Decimal = "2.5".parse().unwrap();
        assert_eq!(d.round().to_string(), "3");
    }

    #[test]
    fn add_and_multiply_are_exact_for_simple_values() {
        let a = Decimal::from_i64(2);
        let b: Decimal = "0.5".parse().unwrap();
        assert_eq!(a.checked_mul(b).unwrap().to_string(), "1");
        assert_eq!(a.checked_add(b).unwrap().to_string(), "2.5");
    }
}
