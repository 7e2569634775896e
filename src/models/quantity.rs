//! Exact decimal quantities
//!
//! Quantities are kept as `BigRational` so that sums of postings never lose
//! precision; they are only turned back into decimal text for display.
use lazy_static::lazy_static;
use num::rational::BigRational;
use num::{BigInt, One, Signed, Zero};
use std::str::FromStr;

/// Decimals shown for quantities that have no finite decimal expansion
const MAX_DECIMALS: usize = 10;

lazy_static! {
    static ref TEN: BigRational = BigRational::from_integer(BigInt::from(10));
    /// Absolute tolerance when comparing balances against assertions
    pub static ref EPSILON: BigRational =
        BigRational::new(BigInt::one(), BigInt::from(1_000_000_000u64));
}

/// Parses a decimal such as `-10.25` into an exact rational
pub fn parse_decimal(number: &str) -> Option<BigRational> {
    let mut num = String::new();
    let mut den = "1".to_string();
    let mut decimal = false;
    for c in number.chars() {
        if c == '.' {
            if decimal {
                return None;
            }
            decimal = true
        } else {
            num.push(c);
            if decimal {
                den.push('0')
            };
        }
    }
    Some(BigRational::new(
        BigInt::from_str(num.as_str()).ok()?,
        BigInt::from_str(den.as_str()).ok()?,
    ))
}

/// Renders a quantity as a decimal number
///
/// Quantities with a finite decimal expansion are rendered exactly, the others are
/// rounded to a fixed number of decimals.
pub fn format_quantity(quantity: &BigRational) -> String {
    if quantity.is_integer() {
        return quantity.to_integer().to_string();
    }
    let mut scaled = quantity.clone();
    let mut decimals = 0;
    while !scaled.is_integer() && decimals < MAX_DECIMALS {
        scaled = &scaled * &*TEN;
        decimals += 1;
    }
    let integer = scaled.round().to_integer();
    let mut digits = integer.abs().to_string();
    if digits.len() <= decimals {
        digits = format!("{}{}", "0".repeat(decimals + 1 - digits.len()), digits);
    }
    let (whole, fraction) = digits.split_at(digits.len() - decimals);
    let fraction = fraction.trim_end_matches('0');
    let sign = if integer.is_negative() { "-" } else { "" };
    if fraction.is_empty() {
        format!("{}{}", sign, whole)
    } else {
        format!("{}{}.{}", sign, whole, fraction)
    }
}

/// Whether two quantities are equal within [`EPSILON`]
pub fn approx_eq(a: &BigRational, b: &BigRational) -> bool {
    (a - b).abs() <= *EPSILON
}

/// Splits `quantity` into `parts` amounts rounded to cents; the rounding remainder
/// goes to the first part so that the parts add up to `quantity` exactly.
pub fn split(quantity: &BigRational, parts: usize) -> Vec<BigRational> {
    if parts == 0 {
        return Vec::new();
    }
    let hundred = BigRational::from_integer(BigInt::from(100));
    let n = BigRational::from_integer(BigInt::from(parts));
    let share = (quantity * &hundred / &n).floor() / &hundred;
    let remainder = quantity - &share * &n;
    let mut result = vec![share; parts];
    if !remainder.is_zero() {
        result[0] = &result[0] + remainder;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(s: &str) -> BigRational {
        parse_decimal(s).unwrap()
    }

    #[test]
    fn parse() {
        assert_eq!(q("10"), BigRational::from_integer(BigInt::from(10)));
        assert_eq!(
            q("-10.25"),
            BigRational::new(BigInt::from(-41), BigInt::from(4))
        );
        assert!(parse_decimal("1.2.3").is_none());
        assert!(parse_decimal("abc").is_none());
    }

    #[test]
    fn format() {
        assert_eq!(format_quantity(&q("100")), "100");
        assert_eq!(format_quantity(&q("100.010")), "100.01");
        assert_eq!(format_quantity(&q("-0.5")), "-0.5");
        assert_eq!(format_quantity(&q("0.05")), "0.05");
        let third = BigRational::new(BigInt::from(1), BigInt::from(3));
        assert_eq!(format_quantity(&third), "0.3333333333");
        let minus_two_thirds = BigRational::new(BigInt::from(-2), BigInt::from(3));
        assert_eq!(format_quantity(&minus_two_thirds), "-0.6666666667");
    }

    #[test]
    fn split_keeps_total() {
        let parts = split(&q("100"), 3);
        assert_eq!(parts, vec![q("33.34"), q("33.33"), q("33.33")]);
        let parts = split(&q("-100"), 3);
        assert_eq!(parts.iter().sum::<BigRational>(), q("-100"));
        assert_eq!(parts[1], q("-33.34"));
        assert!(split(&q("1"), 0).is_empty());
    }

    #[test]
    fn approx() {
        assert!(approx_eq(&q("100"), &q("100.0000000001")));
        assert!(!approx_eq(&q("100"), &q("100.01")));
    }
}
