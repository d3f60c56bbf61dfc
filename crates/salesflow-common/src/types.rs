//! Domain types shared across the pipeline

use chrono::NaiveDate;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::PipelineError;

/// Exact money amount, stored as a whole number of cents.
///
/// Parsed from decimal text (`"3127.5"`, `"3127.50"`, `"-4.25"`) and
/// serialized back as a two-decimal string so that sums never drift.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(i64);

impl Amount {
    /// Zero amount
    pub const ZERO: Amount = Amount(0);

    /// Build from a count of cents
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Build from whole currency units and cents, e.g. `Amount::new(25, 50)` is 25.50
    pub const fn new(units: i64, cents: i64) -> Self {
        if units < 0 {
            Self(units * 100 - cents)
        } else {
            Self(units * 100 + cents)
        }
    }

    /// The amount in cents
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Approximate floating point value, used for plotting only
    pub fn as_f64(self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Nearest amount to a floating point value, `None` when it is not finite
    /// or does not fit in an `i64` of cents
    pub fn from_f64(value: f64) -> Option<Self> {
        let cents = (value * 100.0).round();
        // i64::MAX as f64 rounds up to 2^63, hence the strict upper bound
        if cents.is_finite() && cents >= i64::MIN as f64 && cents < i64::MAX as f64 {
            Some(Self(cents as i64))
        } else {
            None
        }
    }

    /// Multiply by a quantity, `None` on overflow
    pub fn checked_times(self, quantity: i32) -> Option<Self> {
        self.0.checked_mul(i64::from(quantity)).map(Self)
    }

    /// Add two amounts, `None` on overflow
    pub fn checked_add(self, rhs: Amount) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// Sum of `amounts`, `None` on overflow
    pub fn checked_sum<I: IntoIterator<Item = Amount>>(amounts: I) -> Option<Self> {
        amounts
            .into_iter()
            .try_fold(Amount::ZERO, |total, amount| total.checked_add(amount))
    }

    /// Divide by `divisor`, rounding half away from zero to whole cents.
    /// Returns `None` when `divisor` is zero.
    pub fn div_round(self, divisor: usize) -> Option<Self> {
        if divisor == 0 {
            return None;
        }
        let divisor = divisor as i128;
        let value = i128::from(self.0);
        let half = divisor / 2;
        let rounded = if value >= 0 {
            (value + half) / divisor
        } else {
            (value - half) / divisor
        };
        Some(Self(rounded as i64))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl FromStr for Amount {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PipelineError::data(format!("Invalid amount: '{s}'"));

        let trimmed = s.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));

        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let units: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };

        let mut fraction_digits = fraction.bytes().map(|b| i64::from(b - b'0'));
        let tenths = fraction_digits.next().unwrap_or(0);
        let hundredths = fraction_digits.next().unwrap_or(0);
        let round_up = fraction_digits.next().is_some_and(|d| d >= 5);

        let cents = units
            .checked_mul(100)
            .and_then(|c| c.checked_add(tenths * 10 + hundredths + i64::from(round_up)))
            .ok_or_else(invalid)?;

        Ok(Self(if negative { -cents } else { cents }))
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct AmountVisitor;

        impl<'de> de::Visitor<'de> for AmountVisitor {
            type Value = Amount;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a decimal amount such as 3127.50")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
                v.parse().map_err(E::custom)
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Amount, E> {
                Amount::from_f64(v).ok_or_else(|| E::custom(format!("amount out of range: {v}")))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Amount, E> {
                v.checked_mul(100)
                    .map(Amount)
                    .ok_or_else(|| E::custom(format!("amount out of range: {v}")))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
                i64::try_from(v)
                    .map_err(E::custom)
                    .and_then(|v| self.visit_i64(v))
            }
        }

        deserializer.deserialize_any(AmountVisitor)
    }
}

/// One row of the `sales` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesRecord {
    /// Day the order was placed
    pub order_date: NaiveDate,
    /// Product name, at most 100 characters
    pub product_name: String,
    /// Units ordered
    pub quantity: i32,
    /// Price of one unit
    pub unit_price: Amount,
    /// Order total, `quantity * unit_price`
    pub total_amount: Amount,
}

impl SalesRecord {
    /// Create a record
    pub fn new(
        order_date: NaiveDate,
        product_name: impl Into<String>,
        quantity: i32,
        unit_price: Amount,
        total_amount: Amount,
    ) -> Self {
        Self {
            order_date,
            product_name: product_name.into(),
            quantity,
            unit_price,
            total_amount,
        }
    }

    /// Whether the stored total equals `quantity * unit_price`; an
    /// overflowing product never matches
    pub fn total_is_consistent(&self) -> bool {
        self.unit_price.checked_times(self.quantity) == Some(self.total_amount)
    }
}

/// Revenue summed over every sales record of one calendar day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyRevenue {
    /// Calendar day
    pub order_date: NaiveDate,
    /// Sum of `total_amount` over the day's records
    pub daily_revenue: Amount,
}

/// The sample orders inserted on every table reset.
pub fn default_seed_records() -> Vec<SalesRecord> {
    let day = |d: u32| NaiveDate::from_ymd_opt(2024, 1, d).unwrap_or_default();

    vec![
        SalesRecord::new(day(1), "Laptop", 2, Amount::new(1500, 0), Amount::new(3000, 0)),
        SalesRecord::new(day(1), "Mouse", 5, Amount::new(25, 50), Amount::new(127, 50)),
        SalesRecord::new(day(2), "Keyboard", 3, Amount::new(75, 0), Amount::new(225, 0)),
        SalesRecord::new(day(2), "Monitor", 1, Amount::new(800, 0), Amount::new(800, 0)),
        SalesRecord::new(day(3), "Laptop", 1, Amount::new(1500, 0), Amount::new(1500, 0)),
        SalesRecord::new(day(3), "Headphones", 4, Amount::new(50, 0), Amount::new(200, 0)),
        SalesRecord::new(day(4), "Tablet", 2, Amount::new(600, 0), Amount::new(1200, 0)),
        SalesRecord::new(day(4), "Mouse", 3, Amount::new(25, 50), Amount::new(76, 50)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_display() {
        assert_eq!(Amount::from_cents(312_750).to_string(), "3127.50");
        assert_eq!(Amount::from_cents(5).to_string(), "0.05");
        assert_eq!(Amount::from_cents(-425).to_string(), "-4.25");
        assert_eq!(Amount::new(-4, 25), Amount::from_cents(-425));
    }

    #[test]
    fn test_amount_parse() {
        assert_eq!("3127.5".parse::<Amount>().unwrap(), Amount::from_cents(312_750));
        assert_eq!("3127.50".parse::<Amount>().unwrap(), Amount::from_cents(312_750));
        assert_eq!("3127".parse::<Amount>().unwrap(), Amount::from_cents(312_700));
        assert_eq!(".5".parse::<Amount>().unwrap(), Amount::from_cents(50));
        assert_eq!("-4.25".parse::<Amount>().unwrap(), Amount::from_cents(-425));
        assert_eq!("1.005".parse::<Amount>().unwrap(), Amount::from_cents(101));
        assert_eq!(" 12.00 ".parse::<Amount>().unwrap(), Amount::from_cents(1200));

        assert!("".parse::<Amount>().is_err());
        assert!(".".parse::<Amount>().is_err());
        assert!("12,00".parse::<Amount>().is_err());
        assert!("abc".parse::<Amount>().is_err());
        assert!("1.2.3".parse::<Amount>().is_err());
    }

    #[test]
    fn test_div_round() {
        assert_eq!(Amount::from_cents(712_900).div_round(4), Some(Amount::from_cents(178_225)));
        assert_eq!(Amount::from_cents(100).div_round(3), Some(Amount::from_cents(33)));
        assert_eq!(Amount::from_cents(5).div_round(2), Some(Amount::from_cents(3)));
        assert_eq!(Amount::from_cents(-5).div_round(2), Some(Amount::from_cents(-3)));
        assert_eq!(Amount::from_cents(100).div_round(0), None);
    }

    #[test]
    fn test_seed_records_totals() {
        let seed = default_seed_records();
        assert_eq!(seed.len(), 8);

        let total = Amount::checked_sum(seed.iter().map(|r| r.total_amount));
        assert_eq!(total, Some(Amount::from_cents(712_900)));
        assert!(seed.iter().all(SalesRecord::total_is_consistent));
    }

    #[test]
    fn test_checked_arithmetic_reports_overflow() {
        let huge = Amount::from_cents(i64::MAX / 2);

        assert_eq!(huge.checked_times(2), Some(Amount::from_cents(i64::MAX / 2 * 2)));
        assert_eq!(huge.checked_times(3), None);
        assert_eq!(Amount::from_cents(i64::MAX).checked_add(Amount::from_cents(1)), None);
        assert_eq!(Amount::checked_sum([huge, huge, huge]), None);
        assert_eq!(Amount::checked_sum([]), Some(Amount::ZERO));
    }

    #[test]
    fn test_overflowing_record_is_inconsistent() {
        let mut record = default_seed_records().remove(0);
        record.unit_price = Amount::from_cents(i64::MAX / 2);
        record.quantity = 3;

        assert!(!record.total_is_consistent());
    }

    #[test]
    fn test_from_f64_range() {
        assert_eq!(Amount::from_f64(3127.5), Some(Amount::from_cents(312_750)));
        assert_eq!(Amount::from_f64(-4.25), Some(Amount::from_cents(-425)));
        assert_eq!(Amount::from_f64(1e17), None);
        assert_eq!(Amount::from_f64(-1e17), None);
        assert_eq!(Amount::from_f64(f64::NAN), None);
        assert_eq!(Amount::from_f64(f64::INFINITY), None);
    }
}
