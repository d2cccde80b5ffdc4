use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::money::Money;
use crate::domain::order::{
    Order, OrderError, OrderLineItem, PaymentMode, ShippingAddress, CUSTOMIZATION_SURCHARGE,
};
use crate::domain::ports::{Catalog, CartStore, OrderStore, PromoStore, StoreError, UserDirectory};
use crate::domain::promo::PromoError;
use crate::metrics::Metrics;
use crate::notify::Notifier;

use super::promo::outcome_to_promo;

// ============================================================================
// Checkout Orchestration (Cart -> Order)
// ============================================================================
//
// Produces a persisted order or fails without side effects. The atomicity
// boundary is the order insert: everything before it is strict validation,
// everything after it (customer flag, confirmation email, cart deletion)
// is log-and-continue.
//
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutItem {
    pub product_id: Uuid,
    pub title: Option<String>,
    /// Fallback unit price in cents when the catalog entry is gone.
    pub price: Option<i64>,
    pub size: Option<String>,
    pub color: Option<String>,
    pub quantity: u32,
    pub logo: Option<String>,
    pub text_line: Option<String>,
    pub font: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub shipping_address: ShippingAddress,
    pub products: Vec<CheckoutItem>,
    /// Client-computed subtotal in cents, verified server-side.
    pub total_amount: i64,
    pub promo_code: Option<String>,
    /// Client-computed discount in cents; informational only, the discount
    /// is always recomputed from the stored promo record.
    pub discount: Option<i64>,
    pub final_amount: i64,
    pub payment_mode: PaymentMode,
}

#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error("Unknown customer: {0}")]
    UnknownCustomer(Uuid),

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Promo(#[from] PromoError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CheckoutError {
    pub fn reason(&self) -> &'static str {
        match self {
            CheckoutError::UnknownCustomer(_) => "identity",
            CheckoutError::Order(_) => "validation",
            CheckoutError::Promo(_) => "promo",
            CheckoutError::Store(_) => "store",
        }
    }
}

#[derive(Clone)]
pub struct CheckoutService {
    users: Arc<dyn UserDirectory>,
    catalog: Arc<dyn Catalog>,
    carts: Arc<dyn CartStore>,
    promos: Arc<dyn PromoStore>,
    orders: Arc<dyn OrderStore>,
    notifier: Notifier,
    metrics: Arc<Metrics>,
}

impl CheckoutService {
    pub fn new(
        users: Arc<dyn UserDirectory>,
        catalog: Arc<dyn Catalog>,
        carts: Arc<dyn CartStore>,
        promos: Arc<dyn PromoStore>,
        orders: Arc<dyn OrderStore>,
        notifier: Notifier,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            users,
            catalog,
            carts,
            promos,
            orders,
            notifier,
            metrics,
        }
    }

    pub async fn checkout(
        &self,
        customer_id: Uuid,
        request: CheckoutRequest,
    ) -> Result<Order, CheckoutError> {
        match self.run(customer_id, request).await {
            Ok(order) => {
                self.metrics.orders_created.inc();
                Ok(order)
            }
            Err(error) => {
                self.metrics.record_checkout_failure(error.reason());
                Err(error)
            }
        }
    }

    async fn run(
        &self,
        customer_id: Uuid,
        request: CheckoutRequest,
    ) -> Result<Order, CheckoutError> {
        let user = self
            .users
            .find_by_id(customer_id)
            .await?
            .ok_or(CheckoutError::UnknownCustomer(customer_id))?;

        request.shipping_address.validate().map_err(CheckoutError::Order)?;
        if request.products.is_empty() {
            return Err(OrderError::EmptyLineItems.into());
        }
        for item in &request.products {
            if item.quantity < 1 {
                return Err(OrderError::InvalidQuantity(item.quantity).into());
            }
        }

        let line_items = self.snapshot_line_items(&request.products).await?;
        let subtotal: Money = line_items.iter().map(|item| item.line_total()).sum();

        if subtotal.diff(Money::from_cents(request.total_amount)) > 1 {
            return Err(OrderError::AmountMismatch {
                expected: subtotal,
                provided: Money::from_cents(request.total_amount),
            }
            .into());
        }

        // Pre-check the promo without consuming a use, so an amount mismatch
        // below leaves `times_used` untouched.
        let discount = match &request.promo_code {
            None => Money::ZERO,
            Some(code) => {
                let promo = self
                    .promos
                    .find_by_code(code)
                    .await?
                    .ok_or(PromoError::NotFound)?;
                promo
                    .availability(Utc::now())
                    .map_err(PromoError::from)?;
                promo.discount.amount_off(subtotal)
            }
        };

        if let Some(client_discount) = request.discount {
            if Money::from_cents(client_discount).diff(discount) > 1 {
                tracing::debug!(
                    client = client_discount,
                    computed = discount.cents(),
                    "client discount differs from recomputed value"
                );
            }
        }

        let expected_final = subtotal - discount;
        if expected_final.diff(Money::from_cents(request.final_amount)) > 1 {
            return Err(OrderError::AmountMismatch {
                expected: expected_final,
                provided: Money::from_cents(request.final_amount),
            }
            .into());
        }

        // Consume the use. The atomic guard re-checks availability, so a
        // concurrent checkout cannot push the code past its limit.
        if let Some(code) = &request.promo_code {
            let outcome = self.promos.redeem(code, Utc::now()).await?;
            let promo = outcome_to_promo(outcome)?;
            self.metrics.record_promo_redemption("redeemed");
            tracing::info!(code = %promo.code, times_used = promo.times_used, "promo redeemed at checkout");
        }

        let order = Order::create(
            customer_id,
            line_items,
            request.shipping_address,
            subtotal,
            discount,
            expected_final,
            request.promo_code,
            request.payment_mode,
        )
        .map_err(CheckoutError::Order)?;

        // Commit point. Failures past this line no longer fail the checkout.
        self.orders.insert(&order).await?;
        tracing::info!(order_id = %order.id, customer_id = %customer_id, "order created");

        if !user.is_customer {
            if let Err(error) = self.users.mark_as_customer(customer_id).await {
                tracing::warn!(customer_id = %customer_id, error = %error, "failed to mark user as customer");
            }
        }

        self.notifier.order_confirmation(&user.email, &order).await;

        match self.carts.delete(customer_id).await {
            Ok(existed) => {
                if existed {
                    tracing::debug!(customer_id = %customer_id, "cart deleted after checkout");
                }
            }
            Err(error) => {
                tracing::warn!(customer_id = %customer_id, error = %error, "failed to delete cart after checkout");
            }
        }

        Ok(order)
    }

    /// Snapshot catalog data into order line items. A missing catalog entry
    /// is tolerated: the request-supplied title/price fill in, with a warning.
    async fn snapshot_line_items(
        &self,
        items: &[CheckoutItem],
    ) -> Result<Vec<OrderLineItem>, CheckoutError> {
        let ids: Vec<Uuid> = items.iter().map(|item| item.product_id).collect();
        let products: HashMap<Uuid, _> = self
            .catalog
            .find_by_ids(&ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let mut line_items = Vec::with_capacity(items.len());
        for item in items {
            let (title, base_price) = match products.get(&item.product_id) {
                Some(product) => (product.title.clone(), product.price),
                None => {
                    tracing::warn!(product_id = %item.product_id, "catalog entry missing at checkout, using request fields");
                    (
                        item.title.clone().unwrap_or_default(),
                        Money::from_cents(item.price.unwrap_or(0)),
                    )
                }
            };

            let customization_text = item.text_line.clone().unwrap_or_default();
            let has_customization = !customization_text.is_empty()
                || item.logo.as_deref().is_some_and(|logo| !logo.is_empty());
            let unit_surcharge = if has_customization {
                CUSTOMIZATION_SURCHARGE
            } else {
                Money::ZERO
            };

            line_items.push(OrderLineItem {
                product_ref: item.product_id,
                title,
                price: base_price + unit_surcharge,
                size: item.size.clone().unwrap_or_default(),
                color: item.color.clone().unwrap_or_default(),
                customization_text,
                customization_font: item.font.clone().unwrap_or_default(),
                quantity: item.quantity,
                unit_surcharge,
            });
        }
        Ok(line_items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cart::{Cart, CartItem};
    use crate::domain::order::PaymentStatus;
    use crate::domain::product::ProductRecord;
    use crate::domain::promo::{Discount, PromoCode};
    use crate::domain::user::{Role, UserRecord};
    use crate::notify::testing::RecordingMailer;
    use crate::store::MemoryStore;
    use chrono::Duration;

    struct Fixture {
        store: Arc<MemoryStore>,
        mailer: Arc<RecordingMailer>,
        service: CheckoutService,
        customer_id: Uuid,
        product_id: Uuid,
    }

    async fn fixture(mailer: RecordingMailer) -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let mailer = Arc::new(mailer);
        let metrics = Arc::new(Metrics::new().unwrap());
        let notifier = Notifier::new(mailer.clone(), metrics.clone());

        let customer_id = Uuid::new_v4();
        store
            .seed_user(UserRecord {
                id: customer_id,
                email: "ada@example.com".into(),
                first_name: "Ada".into(),
                last_name: "Lovelace".into(),
                role: Role::Customer,
                is_customer: false,
            })
            .await;

        let product_id = Uuid::new_v4();
        store
            .seed_product(ProductRecord {
                id: product_id,
                title: "Classic Hoodie".into(),
                price: Money::from_cents(2000),
                front_image: "https://img.example/front.png".into(),
                side_image: None,
            })
            .await;

        let service = CheckoutService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            notifier,
            metrics,
        );

        Fixture {
            store,
            mailer,
            service,
            customer_id,
            product_id,
        }
    }

    fn address() -> ShippingAddress {
        ShippingAddress {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            address: "12 Analytical Row".into(),
            email: "ada@example.com".into(),
            phone: "0300-0000000".into(),
        }
    }

    fn item(product_id: Uuid, quantity: u32) -> CheckoutItem {
        CheckoutItem {
            product_id,
            title: None,
            price: None,
            size: Some("M".into()),
            color: Some("Black".into()),
            quantity,
            logo: None,
            text_line: None,
            font: None,
        }
    }

    async fn seed_cart(fx: &Fixture) {
        let mut cart = Cart::new(fx.customer_id);
        cart.add_item(CartItem {
            id: Uuid::new_v4(),
            product_ref: fx.product_id,
            title: "Classic Hoodie".into(),
            front_image: String::new(),
            side_image: String::new(),
            price: Money::from_cents(2000),
            size: "M".into(),
            color: "Black".into(),
            logo: String::new(),
            quantity: 2,
            method: "Not selected".into(),
            position: "Not selected".into(),
            text_line: String::new(),
            font: String::new(),
            notes: String::new(),
        });
        CartStore::upsert(fx.store.as_ref(), &cart).await.unwrap();
    }

    async fn seed_save10(fx: &Fixture) {
        fx.store
            .seed_promo(PromoCode::new(
                "SAVE10".into(),
                Discount::Percent(10),
                Utc::now() + Duration::days(30),
                None,
                Uuid::new_v4(),
            ))
            .await;
    }

    #[tokio::test]
    async fn test_checkout_with_promo_end_to_end() {
        let fx = fixture(RecordingMailer::new()).await;
        seed_cart(&fx).await;
        seed_save10(&fx).await;

        let order = fx
            .service
            .checkout(
                fx.customer_id,
                CheckoutRequest {
                    shipping_address: address(),
                    products: vec![item(fx.product_id, 2)],
                    total_amount: 4000,
                    promo_code: Some("SAVE10".into()),
                    discount: Some(400),
                    final_amount: 3600,
                    payment_mode: PaymentMode::CashOnDelivery,
                },
            )
            .await
            .unwrap();

        assert_eq!(order.subtotal, Money::from_cents(4000));
        assert_eq!(order.discount_amount, Money::from_cents(400));
        assert_eq!(order.final_amount, Money::from_cents(3600));
        assert_eq!(order.payment_status, PaymentStatus::Pending);
        assert_eq!(order.promo_code.as_deref(), Some("SAVE10"));

        // Cart is gone, promo consumed exactly once, user flagged.
        assert!(CartStore::find(fx.store.as_ref(), fx.customer_id)
            .await
            .unwrap()
            .is_none());
        let promo = fx.store.find_by_code("SAVE10").await.unwrap().unwrap();
        assert_eq!(promo.times_used, 1);
        let user = UserDirectory::find_by_id(fx.store.as_ref(), fx.customer_id)
            .await
            .unwrap()
            .unwrap();
        assert!(user.is_customer);

        let sent = fx.mailer.sent.lock().await;
        assert_eq!(sent.len(), 1);
        assert!(sent[0].subject.contains("Order confirmation"));
    }

    #[tokio::test]
    async fn test_final_amount_mismatch_has_no_side_effects() {
        let fx = fixture(RecordingMailer::new()).await;
        seed_cart(&fx).await;
        seed_save10(&fx).await;

        let err = fx
            .service
            .checkout(
                fx.customer_id,
                CheckoutRequest {
                    shipping_address: address(),
                    products: vec![item(fx.product_id, 2)],
                    total_amount: 4000,
                    promo_code: Some("SAVE10".into()),
                    discount: Some(400),
                    // Client claims a bigger discount than the promo grants.
                    final_amount: 3000,
                    payment_mode: PaymentMode::CashOnDelivery,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Order(OrderError::AmountMismatch { .. })
        ));

        // Strictly-before-commit: nothing changed.
        let promo = fx.store.find_by_code("SAVE10").await.unwrap().unwrap();
        assert_eq!(promo.times_used, 0);
        assert!(CartStore::find(fx.store.as_ref(), fx.customer_id)
            .await
            .unwrap()
            .is_some());
        assert!(OrderStore::find_by_customer(fx.store.as_ref(), fx.customer_id)
            .await
            .unwrap()
            .is_empty());
        assert!(fx.mailer.sent.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_empty_products_rejected() {
        let fx = fixture(RecordingMailer::new()).await;
        let err = fx
            .service
            .checkout(
                fx.customer_id,
                CheckoutRequest {
                    shipping_address: address(),
                    products: vec![],
                    total_amount: 0,
                    promo_code: None,
                    discount: None,
                    final_amount: 0,
                    payment_mode: PaymentMode::CashOnDelivery,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::Order(OrderError::EmptyLineItems)));
    }

    #[tokio::test]
    async fn test_unknown_customer_rejected() {
        let fx = fixture(RecordingMailer::new()).await;
        let stranger = Uuid::new_v4();
        let err = fx
            .service
            .checkout(
                stranger,
                CheckoutRequest {
                    shipping_address: address(),
                    products: vec![item(fx.product_id, 1)],
                    total_amount: 2000,
                    promo_code: None,
                    discount: None,
                    final_amount: 2000,
                    payment_mode: PaymentMode::CashOnDelivery,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::UnknownCustomer(id) if id == stranger));
    }

    #[tokio::test]
    async fn test_missing_catalog_entry_is_lenient() {
        let fx = fixture(RecordingMailer::new()).await;
        let ghost = Uuid::new_v4();
        let mut ghost_item = item(ghost, 1);
        ghost_item.title = Some("Retired Shirt".into());
        ghost_item.price = Some(1500);

        let order = fx
            .service
            .checkout(
                fx.customer_id,
                CheckoutRequest {
                    shipping_address: address(),
                    products: vec![ghost_item],
                    total_amount: 1500,
                    promo_code: None,
                    discount: None,
                    final_amount: 1500,
                    payment_mode: PaymentMode::CashOnDelivery,
                },
            )
            .await
            .unwrap();

        assert_eq!(order.line_items[0].title, "Retired Shirt");
        assert_eq!(order.line_items[0].price, Money::from_cents(1500));
    }

    #[tokio::test]
    async fn test_customization_adds_surcharge() {
        let fx = fixture(RecordingMailer::new()).await;
        let mut custom = item(fx.product_id, 1);
        custom.logo = Some("https://img.example/logo.png".into());
        custom.text_line = Some("Crew 2026".into());
        custom.font = Some("Script".into());

        let order = fx
            .service
            .checkout(
                fx.customer_id,
                CheckoutRequest {
                    shipping_address: address(),
                    products: vec![custom],
                    total_amount: 2500,
                    promo_code: None,
                    discount: None,
                    final_amount: 2500,
                    payment_mode: PaymentMode::CashOnDelivery,
                },
            )
            .await
            .unwrap();

        let line = &order.line_items[0];
        assert_eq!(line.unit_surcharge, CUSTOMIZATION_SURCHARGE);
        assert_eq!(line.price, Money::from_cents(2500));
        assert_eq!(line.customization_text, "Crew 2026");
        assert_eq!(line.customization_font, "Script");
    }

    #[tokio::test]
    async fn test_online_payment_starts_paid() {
        let fx = fixture(RecordingMailer::new()).await;
        let order = fx
            .service
            .checkout(
                fx.customer_id,
                CheckoutRequest {
                    shipping_address: address(),
                    products: vec![item(fx.product_id, 1)],
                    total_amount: 2000,
                    promo_code: None,
                    discount: None,
                    final_amount: 2000,
                    payment_mode: PaymentMode::Online,
                },
            )
            .await
            .unwrap();
        assert_eq!(order.payment_status, PaymentStatus::Paid);
    }

    #[tokio::test]
    async fn test_notification_failure_does_not_fail_checkout() {
        let fx = fixture(RecordingMailer::failing()).await;
        seed_cart(&fx).await;

        let order = fx
            .service
            .checkout(
                fx.customer_id,
                CheckoutRequest {
                    shipping_address: address(),
                    products: vec![item(fx.product_id, 2)],
                    total_amount: 4000,
                    promo_code: None,
                    discount: None,
                    final_amount: 4000,
                    payment_mode: PaymentMode::CashOnDelivery,
                },
            )
            .await
            .unwrap();

        // The order stands and the cart is still cleaned up.
        assert!(OrderStore::find_by_id(fx.store.as_ref(), order.id)
            .await
            .unwrap()
            .is_some());
        assert!(CartStore::find(fx.store.as_ref(), fx.customer_id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_checkout_idempotent_cart_delete() {
        let fx = fixture(RecordingMailer::new()).await;
        // No cart seeded; absence of a cart must not fail the checkout.
        let result = fx
            .service
            .checkout(
                fx.customer_id,
                CheckoutRequest {
                    shipping_address: address(),
                    products: vec![item(fx.product_id, 1)],
                    total_amount: 2000,
                    promo_code: None,
                    discount: None,
                    final_amount: 2000,
                    payment_mode: PaymentMode::CashOnDelivery,
                },
            )
            .await;
        assert!(result.is_ok());
    }
}
