use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::money::Money;

// ============================================================================
// Promo Code Entity
// ============================================================================
//
// A named discount token with usage and time constraints. `times_used` only
// ever increases, and only through the store's atomic redeem operation; the
// availability check here is the single source of truth for the rejection
// order both stores must follow.
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromoStatus {
    Active,
    Inactive,
}

/// Discount is either a percentage of the subtotal or a fixed amount.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "value")]
pub enum Discount {
    Percent(u8),
    Fixed(Money),
}

impl Discount {
    /// Amount taken off the given subtotal, never exceeding it.
    pub fn amount_off(&self, subtotal: Money) -> Money {
        match self {
            Discount::Percent(pct) => subtotal.percent(*pct),
            Discount::Fixed(amount) => (*amount).min(subtotal),
        }
    }
}

/// Why a promo code cannot be redeemed right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromoRejection {
    Expired,
    Inactive,
    LimitReached,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoCode {
    pub id: Uuid,
    pub code: String,
    pub discount: Discount,
    pub status: PromoStatus,
    pub expires_at: DateTime<Utc>,
    pub usage_limit: Option<i64>,
    pub times_used: i64,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl PromoCode {
    pub fn new(
        code: String,
        discount: Discount,
        expires_at: DateTime<Utc>,
        usage_limit: Option<i64>,
        created_by: Uuid,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            code,
            discount,
            status: PromoStatus::Active,
            expires_at,
            usage_limit,
            times_used: 0,
            created_by,
            created_at: Utc::now(),
        }
    }

    /// Check availability without mutating. Expiry wins over every other
    /// rejection, then status, then the usage limit.
    pub fn availability(&self, now: DateTime<Utc>) -> Result<(), PromoRejection> {
        if now > self.expires_at {
            return Err(PromoRejection::Expired);
        }
        if self.status != PromoStatus::Active {
            return Err(PromoRejection::Inactive);
        }
        if let Some(limit) = self.usage_limit {
            if self.times_used >= limit {
                return Err(PromoRejection::LimitReached);
            }
        }
        Ok(())
    }
}
