use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Money - Fixed-Point Monetary Amounts
// ============================================================================
//
// All amounts are integer cents. The wire format is a plain integer, so
// a 0.01-currency-unit tolerance anywhere in the system is exactly one cent.
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    pub fn cents(&self) -> i64 {
        self.0
    }

    /// Percentage of this amount, rounded half-up to the nearest cent.
    pub fn percent(&self, pct: u8) -> Money {
        Money((self.0 * pct as i64 + 50) / 100)
    }

    /// Absolute difference in cents, for tolerance checks.
    pub fn diff(&self, other: Money) -> i64 {
        (self.0 - other.0).abs()
    }

    pub fn saturating_sub(&self, other: Money) -> Money {
        Money((self.0 - other.0).max(0))
    }

    pub fn times(&self, quantity: u32) -> Money {
        Money(self.0 * quantity as i64)
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl std::ops::Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, |acc, m| acc + m)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.abs();
        write!(f, "{}${}.{:02}", sign, abs / 100, abs % 100)
    }
}
