use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::domain::cart::{Cart, CartItem};
use crate::domain::money::Money;
use crate::domain::order::{Order, OrderLineItem, PaymentMode, PaymentStatus, ShippingAddress};
use crate::domain::ports::{
    Catalog, CartStore, OrderStore, PromoStore, RedeemOutcome, StoreError, UserDirectory,
};
use crate::domain::product::ProductRecord;
use crate::domain::promo::{Discount, PromoCode, PromoRejection, PromoStatus};
use crate::domain::user::{Role, UserRecord};

// ============================================================================
// Postgres Store
// ============================================================================
//
// Postgres used as a thin document store: carts, order line items and
// shipping addresses are whole JSONB documents written back as a unit.
// Promo redemption is the one multi-writer shared resource; it takes a
// per-code row lock so the check-and-increment is atomic.
//
// ============================================================================

impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> Self {
        StoreError::Backend(error.to_string())
    }
}

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY,
        email TEXT NOT NULL,
        first_name TEXT NOT NULL DEFAULT '',
        last_name TEXT NOT NULL DEFAULT '',
        role TEXT NOT NULL DEFAULT 'customer',
        is_customer BOOLEAN NOT NULL DEFAULT FALSE
    )",
    "CREATE TABLE IF NOT EXISTS products (
        id UUID PRIMARY KEY,
        title TEXT NOT NULL,
        price BIGINT NOT NULL,
        front_image TEXT NOT NULL DEFAULT '',
        side_image TEXT
    )",
    "CREATE TABLE IF NOT EXISTS carts (
        customer_id UUID PRIMARY KEY,
        items JSONB NOT NULL,
        created_at TIMESTAMPTZ NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS promo_codes (
        id UUID PRIMARY KEY,
        code TEXT NOT NULL UNIQUE,
        discount_kind TEXT NOT NULL,
        discount_value BIGINT NOT NULL,
        status TEXT NOT NULL,
        expires_at TIMESTAMPTZ NOT NULL,
        usage_limit BIGINT,
        times_used BIGINT NOT NULL DEFAULT 0,
        created_by UUID NOT NULL,
        created_at TIMESTAMPTZ NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS orders (
        id UUID PRIMARY KEY,
        customer_id UUID NOT NULL,
        line_items JSONB NOT NULL,
        shipping_address JSONB NOT NULL,
        subtotal BIGINT NOT NULL,
        discount_amount BIGINT NOT NULL,
        final_amount BIGINT NOT NULL,
        promo_code TEXT,
        payment_mode TEXT NOT NULL,
        payment_status TEXT NOT NULL,
        tracking_id TEXT NOT NULL DEFAULT '',
        private_message TEXT,
        last_email_sent TEXT,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL
    )",
];

/// Create the tables if they do not exist yet. Idempotent; runs at startup.
pub async fn init_schema(pool: &PgPool) -> Result<(), StoreError> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

// ----------------------------------------------------------------------------
// Users
// ----------------------------------------------------------------------------

pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn role_from_str(value: &str) -> Result<Role, StoreError> {
    match value {
        "customer" => Ok(Role::Customer),
        "seller" => Ok(Role::Seller),
        "admin" => Ok(Role::Admin),
        other => Err(StoreError::Corrupt(format!("unknown role: {other}"))),
    }
}

fn user_from_row(row: &PgRow) -> Result<UserRecord, StoreError> {
    Ok(UserRecord {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        role: role_from_str(&row.try_get::<String, _>("role")?)?,
        is_customer: row.try_get("is_customer")?,
    })
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, StoreError> {
        let row = sqlx::query("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn mark_as_customer(&self, id: Uuid) -> Result<(), StoreError> {
        sqlx::query("UPDATE users SET is_customer = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_customers(&self) -> Result<Vec<UserRecord>, StoreError> {
        let rows = sqlx::query("SELECT * FROM users WHERE is_customer ORDER BY email")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(user_from_row).collect()
    }
}

// ----------------------------------------------------------------------------
// Catalog
// ----------------------------------------------------------------------------

pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn product_from_row(row: &PgRow) -> Result<ProductRecord, StoreError> {
    Ok(ProductRecord {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        price: Money::from_cents(row.try_get("price")?),
        front_image: row.try_get("front_image")?,
        side_image: row.try_get("side_image")?,
    })
}

#[async_trait]
impl Catalog for PgCatalog {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ProductRecord>, StoreError> {
        let row = sqlx::query("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(product_from_row).transpose()
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<ProductRecord>, StoreError> {
        let rows = sqlx::query("SELECT * FROM products WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(product_from_row).collect()
    }
}

// ----------------------------------------------------------------------------
// Carts
// ----------------------------------------------------------------------------

pub struct PgCartStore {
    pool: PgPool,
}

impl PgCartStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CartStore for PgCartStore {
    async fn find(&self, customer_id: Uuid) -> Result<Option<Cart>, StoreError> {
        let row = sqlx::query("SELECT * FROM carts WHERE customer_id = $1")
            .bind(customer_id)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            None => Ok(None),
            Some(row) => Ok(Some(Cart {
                customer_id: row.try_get("customer_id")?,
                items: row.try_get::<Json<Vec<CartItem>>, _>("items")?.0,
                created_at: row.try_get("created_at")?,
            })),
        }
    }

    async fn upsert(&self, cart: &Cart) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO carts (customer_id, items, created_at) VALUES ($1, $2, $3)
             ON CONFLICT (customer_id) DO UPDATE SET items = EXCLUDED.items",
        )
        .bind(cart.customer_id)
        .bind(Json(&cart.items))
        .bind(cart.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, customer_id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM carts WHERE customer_id = $1")
            .bind(customer_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// ----------------------------------------------------------------------------
// Promo codes
// ----------------------------------------------------------------------------

pub struct PgPromoStore {
    pool: PgPool,
}

impl PgPromoStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn promo_from_row(row: &PgRow) -> Result<PromoCode, StoreError> {
    let discount = match row.try_get::<String, _>("discount_kind")?.as_str() {
        "percent" => Discount::Percent(row.try_get::<i64, _>("discount_value")? as u8),
        "fixed" => Discount::Fixed(Money::from_cents(row.try_get("discount_value")?)),
        other => return Err(StoreError::Corrupt(format!("unknown discount kind: {other}"))),
    };
    let status = match row.try_get::<String, _>("status")?.as_str() {
        "active" => PromoStatus::Active,
        "inactive" => PromoStatus::Inactive,
        other => return Err(StoreError::Corrupt(format!("unknown promo status: {other}"))),
    };

    Ok(PromoCode {
        id: row.try_get("id")?,
        code: row.try_get("code")?,
        discount,
        status,
        expires_at: row.try_get("expires_at")?,
        usage_limit: row.try_get("usage_limit")?,
        times_used: row.try_get("times_used")?,
        created_by: row.try_get("created_by")?,
        created_at: row.try_get("created_at")?,
    })
}

fn discount_columns(discount: Discount) -> (&'static str, i64) {
    match discount {
        Discount::Percent(pct) => ("percent", pct as i64),
        Discount::Fixed(amount) => ("fixed", amount.cents()),
    }
}

#[async_trait]
impl PromoStore for PgPromoStore {
    async fn insert(&self, promo: &PromoCode) -> Result<bool, StoreError> {
        let (kind, value) = discount_columns(promo.discount);
        let status = match promo.status {
            PromoStatus::Active => "active",
            PromoStatus::Inactive => "inactive",
        };
        let result = sqlx::query(
            "INSERT INTO promo_codes
             (id, code, discount_kind, discount_value, status, expires_at,
              usage_limit, times_used, created_by, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             ON CONFLICT (code) DO NOTHING",
        )
        .bind(promo.id)
        .bind(&promo.code)
        .bind(kind)
        .bind(value)
        .bind(status)
        .bind(promo.expires_at)
        .bind(promo.usage_limit)
        .bind(promo.times_used)
        .bind(promo.created_by)
        .bind(promo.created_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<PromoCode>, StoreError> {
        let row = sqlx::query("SELECT * FROM promo_codes WHERE code = $1")
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(promo_from_row).transpose()
    }

    async fn list(&self) -> Result<Vec<PromoCode>, StoreError> {
        let rows = sqlx::query("SELECT * FROM promo_codes ORDER BY created_at")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(promo_from_row).collect()
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM promo_codes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn redeem(&self, code: &str, now: DateTime<Utc>) -> Result<RedeemOutcome, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Row lock serializes concurrent redemptions of the same code.
        let row = sqlx::query("SELECT * FROM promo_codes WHERE code = $1 FOR UPDATE")
            .bind(code)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(row) = row else {
            return Ok(RedeemOutcome::NotFound);
        };
        let mut promo = promo_from_row(&row)?;

        match promo.availability(now) {
            Err(PromoRejection::Expired) => Ok(RedeemOutcome::Expired),
            Err(PromoRejection::Inactive) => Ok(RedeemOutcome::Inactive),
            Err(PromoRejection::LimitReached) => Ok(RedeemOutcome::LimitReached),
            Ok(()) => {
                sqlx::query("UPDATE promo_codes SET times_used = times_used + 1 WHERE id = $1")
                    .bind(promo.id)
                    .execute(&mut *tx)
                    .await?;
                tx.commit().await?;
                promo.times_used += 1;
                Ok(RedeemOutcome::Redeemed(promo))
            }
        }
    }
}

// ----------------------------------------------------------------------------
// Orders
// ----------------------------------------------------------------------------

pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn order_from_row(row: &PgRow) -> Result<Order, StoreError> {
    let payment_mode = row.try_get::<String, _>("payment_mode")?;
    let payment_mode = PaymentMode::parse(&payment_mode)
        .ok_or_else(|| StoreError::Corrupt(format!("unknown payment mode: {payment_mode}")))?;
    let payment_status = row.try_get::<String, _>("payment_status")?;
    let payment_status = PaymentStatus::parse(&payment_status)
        .ok_or_else(|| StoreError::Corrupt(format!("unknown payment status: {payment_status}")))?;

    Ok(Order {
        id: row.try_get("id")?,
        customer_id: row.try_get("customer_id")?,
        line_items: row.try_get::<Json<Vec<OrderLineItem>>, _>("line_items")?.0,
        shipping_address: row.try_get::<Json<ShippingAddress>, _>("shipping_address")?.0,
        subtotal: Money::from_cents(row.try_get("subtotal")?),
        discount_amount: Money::from_cents(row.try_get("discount_amount")?),
        final_amount: Money::from_cents(row.try_get("final_amount")?),
        promo_code: row.try_get("promo_code")?,
        payment_mode,
        payment_status,
        tracking_id: row.try_get("tracking_id")?,
        private_message: row.try_get("private_message")?,
        last_email_sent: row.try_get("last_email_sent")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn insert(&self, order: &Order) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO orders
             (id, customer_id, line_items, shipping_address, subtotal, discount_amount,
              final_amount, promo_code, payment_mode, payment_status, tracking_id,
              private_message, last_email_sent, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)",
        )
        .bind(order.id)
        .bind(order.customer_id)
        .bind(Json(&order.line_items))
        .bind(Json(&order.shipping_address))
        .bind(order.subtotal.cents())
        .bind(order.discount_amount.cents())
        .bind(order.final_amount.cents())
        .bind(&order.promo_code)
        .bind(order.payment_mode.as_str())
        .bind(order.payment_status.as_str())
        .bind(&order.tracking_id)
        .bind(&order.private_message)
        .bind(&order.last_email_sent)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query("SELECT * FROM orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(order_from_row).transpose()
    }

    async fn find_by_customer(&self, customer_id: Uuid) -> Result<Vec<Order>, StoreError> {
        let rows = sqlx::query("SELECT * FROM orders WHERE customer_id = $1 ORDER BY created_at")
            .bind(customer_id)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(order_from_row).collect()
    }

    async fn list_all(&self) -> Result<Vec<Order>, StoreError> {
        let rows = sqlx::query("SELECT * FROM orders ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(order_from_row).collect()
    }

    async fn update(&self, order: &Order) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE orders SET
             payment_status = $2, tracking_id = $3, private_message = $4,
             last_email_sent = $5, updated_at = $6
             WHERE id = $1",
        )
        .bind(order.id)
        .bind(order.payment_status.as_str())
        .bind(&order.tracking_id)
        .bind(&order.private_message)
        .bind(&order.last_email_sent)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
