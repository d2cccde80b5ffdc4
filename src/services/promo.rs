use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::money::Money;
use crate::domain::ports::{PromoStore, RedeemOutcome};
use crate::domain::promo::{Discount, PromoCode, PromoError};
use crate::metrics::Metrics;

// ============================================================================
// Promo Code Management and Redemption
// ============================================================================

pub(crate) fn outcome_to_promo(outcome: RedeemOutcome) -> Result<PromoCode, PromoError> {
    match outcome {
        RedeemOutcome::Redeemed(promo) => Ok(promo),
        RedeemOutcome::NotFound => Err(PromoError::NotFound),
        RedeemOutcome::Expired => Err(PromoError::Expired),
        RedeemOutcome::Inactive => Err(PromoError::Inactive),
        RedeemOutcome::LimitReached => Err(PromoError::UsageLimitReached),
    }
}

/// What a successful redeem tells the caller: the applied discount and the
/// resulting total when a subtotal was supplied.
#[derive(Debug, Clone)]
pub struct Redemption {
    pub code: String,
    pub discount: Discount,
    pub discount_amount: Option<Money>,
    pub final_amount: Option<Money>,
}

#[derive(Clone)]
pub struct PromoService {
    promos: Arc<dyn PromoStore>,
    metrics: Arc<Metrics>,
}

impl PromoService {
    pub fn new(promos: Arc<dyn PromoStore>, metrics: Arc<Metrics>) -> Self {
        Self { promos, metrics }
    }

    pub async fn create(
        &self,
        code: String,
        discount: Discount,
        expires_at: DateTime<Utc>,
        usage_limit: Option<i64>,
        created_by: Uuid,
    ) -> Result<PromoCode, PromoError> {
        let trimmed = code.trim();
        if trimmed.is_empty() {
            return Err(PromoError::MissingCode);
        }
        let promo = PromoCode::new(trimmed.to_uppercase(), discount, expires_at, usage_limit, created_by);
        if !self.promos.insert(&promo).await? {
            return Err(PromoError::DuplicateCode);
        }
        tracing::info!(code = %promo.code, "promo code created");
        Ok(promo)
    }

    pub async fn list(&self) -> Result<Vec<PromoCode>, PromoError> {
        Ok(self.promos.list().await?)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), PromoError> {
        if !self.promos.delete(id).await? {
            return Err(PromoError::NotFound);
        }
        tracing::info!(promo_id = %id, "promo code deleted");
        Ok(())
    }

    /// Validate-and-consume. A success here spends one use of the code, so a
    /// client that validates and then checks out with the same code spends
    /// two.
    pub async fn redeem(&self, code: &str, subtotal: Option<Money>) -> Result<Redemption, PromoError> {
        let trimmed = code.trim();
        if trimmed.is_empty() {
            return Err(PromoError::MissingCode);
        }

        let outcome = self.promos.redeem(trimmed, Utc::now()).await?;
        let promo = match outcome_to_promo(outcome) {
            Ok(promo) => promo,
            Err(error) => {
                self.metrics.record_promo_redemption(redemption_label(&error));
                return Err(error);
            }
        };
        self.metrics.record_promo_redemption("redeemed");
        tracing::info!(code = %promo.code, times_used = promo.times_used, "promo redeemed");

        let discount_amount = subtotal.map(|s| promo.discount.amount_off(s));
        let final_amount = subtotal.zip(discount_amount).map(|(s, d)| s - d);
        Ok(Redemption {
            code: promo.code,
            discount: promo.discount,
            discount_amount,
            final_amount,
        })
    }
}

fn redemption_label(error: &PromoError) -> &'static str {
    match error {
        PromoError::NotFound => "not_found",
        PromoError::Expired => "expired",
        PromoError::Inactive => "inactive",
        PromoError::UsageLimitReached => "limit_reached",
        _ => "error",
    }
}
