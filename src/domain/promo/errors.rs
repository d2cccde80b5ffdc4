use crate::domain::ports::StoreError;

use super::entity::PromoRejection;

// ============================================================================
// Promo Business Rule Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum PromoError {
    #[error("Promo code is required")]
    MissingCode,

    #[error("Invalid promo code")]
    NotFound,

    #[error("Promo code has expired")]
    Expired,

    #[error("Promo code is not active")]
    Inactive,

    #[error("Promo code usage limit reached")]
    UsageLimitReached,

    #[error("Promo code already exists")]
    DuplicateCode,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<PromoRejection> for PromoError {
    fn from(rejection: PromoRejection) -> Self {
        match rejection {
            PromoRejection::Expired => PromoError::Expired,
            PromoRejection::Inactive => PromoError::Inactive,
            PromoRejection::LimitReached => PromoError::UsageLimitReached,
        }
    }
}
