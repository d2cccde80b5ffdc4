use std::sync::Arc;

use serde::Deserialize;
use uuid::Uuid;

use crate::domain::cart::{Cart, CartError, CartItem};
use crate::domain::order::CUSTOMIZATION_SURCHARGE;
use crate::domain::money::Money;
use crate::domain::ports::{CartStore, Catalog, StoreError};

// ============================================================================
// Cart Mutation
// ============================================================================
//
// Read-modify-write over the whole cart document. Adding resolves the catalog
// entry strictly; an unknown product is a 404, unlike checkout which tolerates
// one for items already in the cart.
//
// ============================================================================

const NOT_SELECTED: &str = "Not selected";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub product_id: Uuid,
    pub size: Option<String>,
    pub color: Option<String>,
    pub logo: Option<String>,
    pub quantity: Option<u32>,
    pub method: Option<String>,
    pub position: Option<String>,
    pub text_line: Option<String>,
    pub font: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum CartServiceError {
    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Clone)]
pub struct CartService {
    catalog: Arc<dyn Catalog>,
    carts: Arc<dyn CartStore>,
}

impl CartService {
    pub fn new(catalog: Arc<dyn Catalog>, carts: Arc<dyn CartStore>) -> Self {
        Self { catalog, carts }
    }

    /// Returns the customer's cart, or an empty one if none exists yet.
    pub async fn get(&self, customer_id: Uuid) -> Result<Cart, CartServiceError> {
        Ok(self
            .carts
            .find(customer_id)
            .await?
            .unwrap_or_else(|| Cart::new(customer_id)))
    }

    pub async fn add_item(
        &self,
        customer_id: Uuid,
        request: AddItemRequest,
    ) -> Result<Cart, CartServiceError> {
        let product = self
            .catalog
            .find_by_id(request.product_id)
            .await?
            .ok_or(CartError::ProductNotFound(request.product_id))?;

        let logo = request.logo.unwrap_or_default();
        let text_line = request.text_line.unwrap_or_default();
        let surcharge = if logo.is_empty() && text_line.is_empty() {
            Money::ZERO
        } else {
            CUSTOMIZATION_SURCHARGE
        };

        let item = CartItem {
            id: Uuid::new_v4(),
            product_ref: product.id,
            title: product.title,
            front_image: product.front_image,
            side_image: product.side_image.unwrap_or_default(),
            price: product.price + surcharge,
            size: request.size.unwrap_or_else(|| NOT_SELECTED.to_string()),
            color: request.color.unwrap_or_else(|| NOT_SELECTED.to_string()),
            logo,
            quantity: request.quantity.unwrap_or(1).max(1),
            method: request.method.unwrap_or_else(|| NOT_SELECTED.to_string()),
            position: request.position.unwrap_or_else(|| NOT_SELECTED.to_string()),
            text_line,
            font: request.font.unwrap_or_default(),
            notes: request.notes.unwrap_or_default(),
        };

        let mut cart = self.get(customer_id).await?;
        cart.add_item(item);
        self.carts.upsert(&cart).await?;
        tracing::debug!(customer_id = %customer_id, items = cart.items.len(), "cart item added");
        Ok(cart)
    }

    /// Removing the last item deletes the cart document entirely.
    pub async fn remove_item(
        &self,
        customer_id: Uuid,
        item_id: Uuid,
    ) -> Result<Cart, CartServiceError> {
        let mut cart = self
            .carts
            .find(customer_id)
            .await?
            .ok_or(CartError::CartNotFound)?;
        cart.remove_item(item_id)?;

        if cart.is_empty() {
            self.carts.delete(customer_id).await?;
            tracing::debug!(customer_id = %customer_id, "cart emptied and deleted");
        } else {
            self.carts.upsert(&cart).await?;
        }
        Ok(cart)
    }

    pub async fn increase_quantity(
        &self,
        customer_id: Uuid,
        item_id: Uuid,
    ) -> Result<Cart, CartServiceError> {
        let mut cart = self
            .carts
            .find(customer_id)
            .await?
            .ok_or(CartError::CartNotFound)?;
        cart.increase_quantity(item_id)?;
        self.carts.upsert(&cart).await?;
        Ok(cart)
    }

    pub async fn decrease_quantity(
        &self,
        customer_id: Uuid,
        item_id: Uuid,
    ) -> Result<Cart, CartServiceError> {
        let mut cart = self
            .carts
            .find(customer_id)
            .await?
            .ok_or(CartError::CartNotFound)?;
        cart.decrease_quantity(item_id)?;
        self.carts.upsert(&cart).await?;
        Ok(cart)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::product::ProductRecord;
    use crate::store::MemoryStore;

    async fn fixture() -> (Arc<MemoryStore>, CartService, Uuid) {
        let store = Arc::new(MemoryStore::new());
        let product_id = Uuid::new_v4();
        store
            .seed_product(ProductRecord {
                id: product_id,
                title: "Polo Shirt".into(),
                price: Money::from_cents(2000),
                front_image: "https://img.example/front.png".into(),
                side_image: None,
            })
            .await;
        let service = CartService::new(store.clone(), store.clone());
        (store, service, product_id)
    }

    fn request(product_id: Uuid) -> AddItemRequest {
        AddItemRequest {
            product_id,
            size: None,
            color: None,
            logo: None,
            quantity: None,
            method: None,
            position: None,
            text_line: None,
            font: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_add_applies_defaults_and_catalog_snapshot() {
        let (_, service, product_id) = fixture().await;
        let customer = Uuid::new_v4();

        let cart = service.add_item(customer, request(product_id)).await.unwrap();
        let item = &cart.items[0];
        assert_eq!(item.title, "Polo Shirt");
        assert_eq!(item.price, Money::from_cents(2000));
        assert_eq!(item.size, "Not selected");
        assert_eq!(item.method, "Not selected");
        assert_eq!(item.quantity, 1);
    }

    #[tokio::test]
    async fn test_add_with_customization_carries_surcharge() {
        let (_, service, product_id) = fixture().await;
        let customer = Uuid::new_v4();

        let mut req = request(product_id);
        req.logo = Some("https://img.example/logo.png".into());
        let cart = service.add_item(customer, req).await.unwrap();
        assert_eq!(cart.items[0].price, Money::from_cents(2500));
    }

    #[tokio::test]
    async fn test_add_unknown_product_is_strict() {
        let (_, service, _) = fixture().await;
        let err = service
            .add_item(Uuid::new_v4(), request(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CartServiceError::Cart(CartError::ProductNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_removing_last_item_deletes_cart() {
        let (store, service, product_id) = fixture().await;
        let customer = Uuid::new_v4();

        let cart = service.add_item(customer, request(product_id)).await.unwrap();
        let item_id = cart.items[0].id;

        let cart = service.remove_item(customer, item_id).await.unwrap();
        assert!(cart.is_empty());
        assert!(CartStore::find(store.as_ref(), customer).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_quantity_adjustments_persist() {
        let (store, service, product_id) = fixture().await;
        let customer = Uuid::new_v4();

        let cart = service.add_item(customer, request(product_id)).await.unwrap();
        let item_id = cart.items[0].id;

        service.increase_quantity(customer, item_id).await.unwrap();
        service.increase_quantity(customer, item_id).await.unwrap();
        service.decrease_quantity(customer, item_id).await.unwrap();

        let stored = CartStore::find(store.as_ref(), customer).await.unwrap().unwrap();
        assert_eq!(stored.items[0].quantity, 2);
    }

    #[tokio::test]
    async fn test_get_missing_cart_is_empty() {
        let (_, service, _) = fixture().await;
        let cart = service.get(Uuid::new_v4()).await.unwrap();
        assert!(cart.is_empty());
    }
}
