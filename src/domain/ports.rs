use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::cart::Cart;
use super::order::Order;
use super::product::ProductRecord;
use super::promo::PromoCode;
use super::user::UserRecord;

// ============================================================================
// Storage Ports
// ============================================================================
//
// Every store and collaborator the order workflow touches is a trait injected
// as an owned dependency. The postgres implementations live in `store::
// postgres`, the in-memory ones backing the tests in `store::memory`.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("stored document is corrupt: {0}")]
    Corrupt(String),
}

/// Identity Directory: user lookup and the idempotent customer flag.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, StoreError>;

    /// Safe to repeat; marking an existing customer is a no-op.
    async fn mark_as_customer(&self, id: Uuid) -> Result<(), StoreError>;

    async fn list_customers(&self) -> Result<Vec<UserRecord>, StoreError>;
}

/// Catalog: read-only product lookups for snapshotting.
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ProductRecord>, StoreError>;

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<ProductRecord>, StoreError>;
}

#[async_trait]
pub trait CartStore: Send + Sync {
    async fn find(&self, customer_id: Uuid) -> Result<Option<Cart>, StoreError>;

    /// Whole-document write; last writer wins.
    async fn upsert(&self, cart: &Cart) -> Result<(), StoreError>;

    /// Returns whether a cart existed. Deleting an absent cart is not an
    /// error.
    async fn delete(&self, customer_id: Uuid) -> Result<bool, StoreError>;
}

/// Outcome of an atomic redeem attempt. The increment happens only in the
/// `Redeemed` case, and never pushes `times_used` past the limit even under
/// concurrent redemptions.
#[derive(Debug, Clone)]
pub enum RedeemOutcome {
    Redeemed(PromoCode),
    NotFound,
    Expired,
    Inactive,
    LimitReached,
}

#[async_trait]
pub trait PromoStore: Send + Sync {
    /// Returns false when the code already exists.
    async fn insert(&self, promo: &PromoCode) -> Result<bool, StoreError>;

    async fn find_by_code(&self, code: &str) -> Result<Option<PromoCode>, StoreError>;

    async fn list(&self) -> Result<Vec<PromoCode>, StoreError>;

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;

    /// Validate and increment `times_used` as one atomic step.
    async fn redeem(&self, code: &str, now: DateTime<Utc>) -> Result<RedeemOutcome, StoreError>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn insert(&self, order: &Order) -> Result<(), StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, StoreError>;

    async fn find_by_customer(&self, customer_id: Uuid) -> Result<Vec<Order>, StoreError>;

    /// Every order in the system, newest first. Operator view only.
    async fn list_all(&self) -> Result<Vec<Order>, StoreError>;

    /// Whole-document write of the mutable fields; last writer wins.
    async fn update(&self, order: &Order) -> Result<(), StoreError>;

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
}
