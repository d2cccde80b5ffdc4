use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::cart::Cart;
use crate::domain::order::Order;
use crate::domain::ports::{
    Catalog, CartStore, OrderStore, PromoStore, RedeemOutcome, StoreError, UserDirectory,
};
use crate::domain::product::ProductRecord;
use crate::domain::promo::{PromoCode, PromoRejection};
use crate::domain::user::UserRecord;

// ============================================================================
// In-Memory Store
// ============================================================================
//
// Implements every port over locked maps. Backs the test suite and local
// experimentation; promo redemption holds the write lock for the whole
// check-and-increment, which is the single-writer serialization point the
// usage-limit invariant needs.
//
// ============================================================================

#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, UserRecord>>,
    products: RwLock<HashMap<Uuid, ProductRecord>>,
    carts: RwLock<HashMap<Uuid, Cart>>,
    promos: RwLock<HashMap<Uuid, PromoCode>>,
    orders: RwLock<HashMap<Uuid, Order>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed_user(&self, user: UserRecord) {
        self.users.write().await.insert(user.id, user);
    }

    pub async fn seed_product(&self, product: ProductRecord) {
        self.products.write().await.insert(product.id, product);
    }

    pub async fn seed_promo(&self, promo: PromoCode) {
        self.promos.write().await.insert(promo.id, promo);
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn mark_as_customer(&self, id: Uuid) -> Result<(), StoreError> {
        if let Some(user) = self.users.write().await.get_mut(&id) {
            user.is_customer = true;
        }
        Ok(())
    }

    async fn list_customers(&self) -> Result<Vec<UserRecord>, StoreError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .filter(|u| u.is_customer)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl Catalog for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ProductRecord>, StoreError> {
        Ok(self.products.read().await.get(&id).cloned())
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<ProductRecord>, StoreError> {
        let products = self.products.read().await;
        Ok(ids.iter().filter_map(|id| products.get(id).cloned()).collect())
    }
}

#[async_trait]
impl CartStore for MemoryStore {
    async fn find(&self, customer_id: Uuid) -> Result<Option<Cart>, StoreError> {
        Ok(self.carts.read().await.get(&customer_id).cloned())
    }

    async fn upsert(&self, cart: &Cart) -> Result<(), StoreError> {
        self.carts.write().await.insert(cart.customer_id, cart.clone());
        Ok(())
    }

    async fn delete(&self, customer_id: Uuid) -> Result<bool, StoreError> {
        Ok(self.carts.write().await.remove(&customer_id).is_some())
    }
}

#[async_trait]
impl PromoStore for MemoryStore {
    async fn insert(&self, promo: &PromoCode) -> Result<bool, StoreError> {
        let mut promos = self.promos.write().await;
        if promos.values().any(|p| p.code == promo.code) {
            return Ok(false);
        }
        promos.insert(promo.id, promo.clone());
        Ok(true)
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<PromoCode>, StoreError> {
        Ok(self
            .promos
            .read()
            .await
            .values()
            .find(|p| p.code == code)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<PromoCode>, StoreError> {
        Ok(self.promos.read().await.values().cloned().collect())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.promos.write().await.remove(&id).is_some())
    }

    async fn redeem(&self, code: &str, now: DateTime<Utc>) -> Result<RedeemOutcome, StoreError> {
        let mut promos = self.promos.write().await;
        let promo = match promos.values_mut().find(|p| p.code == code) {
            Some(promo) => promo,
            None => return Ok(RedeemOutcome::NotFound),
        };

        match promo.availability(now) {
            Err(PromoRejection::Expired) => Ok(RedeemOutcome::Expired),
            Err(PromoRejection::Inactive) => Ok(RedeemOutcome::Inactive),
            Err(PromoRejection::LimitReached) => Ok(RedeemOutcome::LimitReached),
            Ok(()) => {
                promo.times_used += 1;
                Ok(RedeemOutcome::Redeemed(promo.clone()))
            }
        }
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn insert(&self, order: &Order) -> Result<(), StoreError> {
        self.orders.write().await.insert(order.id, order.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, StoreError> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn find_by_customer(&self, customer_id: Uuid) -> Result<Vec<Order>, StoreError> {
        let mut orders: Vec<Order> = self
            .orders
            .read()
            .await
            .values()
            .filter(|o| o.customer_id == customer_id)
            .cloned()
            .collect();
        orders.sort_by_key(|o| o.created_at);
        Ok(orders)
    }

    async fn list_all(&self) -> Result<Vec<Order>, StoreError> {
        let mut orders: Vec<Order> = self.orders.read().await.values().cloned().collect();
        orders.sort_by_key(|o| std::cmp::Reverse(o.created_at));
        Ok(orders)
    }

    async fn update(&self, order: &Order) -> Result<(), StoreError> {
        self.orders.write().await.insert(order.id, order.clone());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.orders.write().await.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::promo::Discount;
    use chrono::Duration;

    #[tokio::test]
    async fn test_concurrent_redeems_respect_usage_limit() {
        let store = std::sync::Arc::new(MemoryStore::new());
        let mut promo = PromoCode::new(
            "LIMITED".into(),
            Discount::Percent(10),
            Utc::now() + Duration::days(1),
            Some(5),
            Uuid::new_v4(),
        );
        promo.times_used = 0;
        store.seed_promo(promo).await;

        let mut handles = Vec::new();
        for _ in 0..20 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                matches!(
                    store.redeem("LIMITED", Utc::now()).await.unwrap(),
                    RedeemOutcome::Redeemed(_)
                )
            }));
        }

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap() {
                successes += 1;
            }
        }

        assert_eq!(successes, 5);
        let promo = store.find_by_code("LIMITED").await.unwrap().unwrap();
        assert_eq!(promo.times_used, 5);
    }

    #[tokio::test]
    async fn test_delete_absent_cart_is_not_an_error() {
        let store = MemoryStore::new();
        assert!(!CartStore::delete(&store, Uuid::new_v4()).await.unwrap());
    }
}
