//! Exact rational arithmetic for dimension exponents
//!
//! Unit powers must survive `sqrt` and repeated multiplication without
//! float drift, so exponents are stored as reduced fractions rather than
//! as `f64`.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

/// An exact fraction, always in lowest terms with the sign on the numerator.
///
/// Invariants: `den > 0` and `gcd(|num|, den) == 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rational {
    num: i64,
    den: i64,
}

impl Rational {
    pub const ZERO: Rational = Rational { num: 0, den: 1 };
    pub const ONE: Rational = Rational { num: 1, den: 1 };

    /// Create a reduced rational. Panics if `den == 0`.
    pub fn new(num: i64, den: i64) -> Self {
        assert!(den != 0, "rational denominator must be nonzero");
        let sign = if (num < 0) != (den < 0) { -1 } else { 1 };
        let num = num.unsigned_abs();
        let den = den.unsigned_abs();
        let g = gcd(num, den);
        Self {
            num: sign * (num / g) as i64,
            den: (den / g) as i64,
        }
    }

    pub fn integer(n: i64) -> Self {
        Self { num: n, den: 1 }
    }

    pub fn num(&self) -> i64 {
        self.num
    }

    pub fn den(&self) -> i64 {
        self.den
    }

    pub fn is_zero(&self) -> bool {
        self.num == 0
    }

    pub fn is_integer(&self) -> bool {
        self.den == 1
    }

    pub fn is_negative(&self) -> bool {
        self.num < 0
    }

    pub fn is_positive(&self) -> bool {
        self.num > 0
    }

    pub fn abs(&self) -> Self {
        Self {
            num: self.num.abs(),
            den: self.den,
        }
    }

    /// Raise to an integer power. Panics when raising zero to a negative power.
    pub fn pow(&self, exp: i32) -> Self {
        if exp == 0 {
            return Self::ONE;
        }
        if exp < 0 {
            assert!(self.num != 0, "zero rational raised to a negative power");
            return Self::new(
                self.den.pow(exp.unsigned_abs()),
                self.num.pow(exp.unsigned_abs()),
            );
        }
        Self {
            num: self.num.pow(exp as u32),
            den: self.den.pow(exp as u32),
        }
    }

    /// Largest integer not greater than the fraction.
    pub fn floor(&self) -> i64 {
        self.num.div_euclid(self.den)
    }

    pub fn to_f64(&self) -> f64 {
        self.num as f64 / self.den as f64
    }

    /// Recover a small-denominator fraction from a float exponent
    /// (continued-fraction expansion, denominator bounded by `max_den`).
    ///
    /// Returns `None` when no fraction with a denominator up to `max_den`
    /// is within 1e-9 of the input, which rejects genuinely irrational
    /// exponents instead of silently rounding them.
    pub fn approximate(value: f64, max_den: i64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        let negative = value < 0.0;
        let mut x = value.abs();
        let (mut p0, mut q0, mut p1, mut q1) = (0i64, 1i64, 1i64, 0i64);
        for _ in 0..32 {
            let a = x.floor() as i64;
            let p2 = a.checked_mul(p1)?.checked_add(p0)?;
            let q2 = a.checked_mul(q1)?.checked_add(q0)?;
            if q2 > max_den {
                break;
            }
            p0 = p1;
            q0 = q1;
            p1 = p2;
            q1 = q2;
            let frac = x - a as f64;
            if frac < 1e-12 {
                break;
            }
            x = 1.0 / frac;
        }
        if q1 == 0 {
            return None;
        }
        let candidate = Self::new(if negative { -p1 } else { p1 }, q1);
        if (candidate.to_f64() - value).abs() < 1e-9 {
            Some(candidate)
        } else {
            None
        }
    }
}

fn gcd(a: u64, b: u64) -> u64 {
    if a == 0 && b == 0 {
        return 1;
    }
    let (mut a, mut b) = (a, b);
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

impl Add for Rational {
    type Output = Rational;

    fn add(self, rhs: Rational) -> Rational {
        Rational::new(self.num * rhs.den + rhs.num * self.den, self.den * rhs.den)
    }
}

impl Sub for Rational {
    type Output = Rational;

    fn sub(self, rhs: Rational) -> Rational {
        Rational::new(self.num * rhs.den - rhs.num * self.den, self.den * rhs.den)
    }
}

impl Mul for Rational {
    type Output = Rational;

    fn mul(self, rhs: Rational) -> Rational {
        Rational::new(self.num * rhs.num, self.den * rhs.den)
    }
}

impl Div for Rational {
    type Output = Rational;

    /// Panics when dividing by a zero-numerator rational: that is a caller
    /// contract violation, not malformed user input.
    fn div(self, rhs: Rational) -> Rational {
        assert!(rhs.num != 0, "division by zero rational");
        Rational::new(self.num * rhs.den, self.den * rhs.num)
    }
}

impl Neg for Rational {
    type Output = Rational;

    fn neg(self) -> Rational {
        Rational {
            num: -self.num,
            den: self.den,
        }
    }
}

impl PartialOrd for Rational {
    // Ordering goes through f64; equality stays exact.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self == other {
            return Some(Ordering::Equal);
        }
        self.to_f64().partial_cmp(&other.to_f64())
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.den == 1 {
            write!(f, "{}", self.num)
        } else {
            write!(f, "{}/{}", self.num, self.den)
        }
    }
}

impl From<i64> for Rational {
    fn from(n: i64) -> Self {
        Self::integer(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reduction() {
        assert_eq!(Rational::new(4, 8), Rational::new(1, 2));
        assert_eq!(Rational::new(-2, -4), Rational::new(1, 2));
        assert_eq!(Rational::new(2, -4), Rational::new(-1, 2));
        assert_eq!(Rational::new(0, 5), Rational::ZERO);
    }

    #[test]
    fn test_sign_on_numerator() {
        let r = Rational::new(3, -7);
        assert_eq!(r.num(), -3);
        assert_eq!(r.den(), 7);
    }

    #[test]
    fn test_arithmetic() {
        let half = Rational::new(1, 2);
        let third = Rational::new(1, 3);
        assert_eq!(half + third, Rational::new(5, 6));
        assert_eq!(half - third, Rational::new(1, 6));
        assert_eq!(half * third, Rational::new(1, 6));
        assert_eq!(half / third, Rational::new(3, 2));
    }

    #[test]
    fn test_pow() {
        assert_eq!(Rational::new(2, 3).pow(2), Rational::new(4, 9));
        assert_eq!(Rational::new(2, 3).pow(-1), Rational::new(3, 2));
        assert_eq!(Rational::new(5, 7).pow(0), Rational::ONE);
    }

    #[test]
    #[should_panic(expected = "division by zero rational")]
    fn test_divide_by_zero_panics() {
        let _ = Rational::ONE / Rational::ZERO;
    }

    #[test]
    fn test_floor() {
        assert_eq!(Rational::new(3, 2).floor(), 1);
        assert_eq!(Rational::new(-3, 2).floor(), -2);
        assert_eq!(Rational::integer(4).floor(), 4);
    }

    #[test]
    fn test_ordering() {
        assert!(Rational::new(1, 3) < Rational::new(1, 2));
        assert!(Rational::new(-1, 2) < Rational::ZERO);
    }

    #[test]
    fn test_approximate() {
        assert_eq!(Rational::approximate(0.5, 16), Some(Rational::new(1, 2)));
        assert_eq!(Rational::approximate(-1.5, 16), Some(Rational::new(-3, 2)));
        assert_eq!(Rational::approximate(2.0, 16), Some(Rational::integer(2)));
        assert_eq!(
            Rational::approximate(1.0 / 3.0, 16),
            Some(Rational::new(1, 3))
        );
        assert_eq!(Rational::approximate(std::f64::consts::PI, 16), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Rational::new(3, 2).to_string(), "3/2");
        assert_eq!(Rational::integer(-4).to_string(), "-4");
    }
}
