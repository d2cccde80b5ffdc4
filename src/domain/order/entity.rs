use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::money::Money;

use super::errors::OrderError;

// ============================================================================
// Order Entity
// ============================================================================
//
// An order is an immutable snapshot of catalog and cart data taken at
// checkout time, plus a bounded set of operator-mutable fields (payment
// status, tracking id, annotations). Catalog changes after creation never
// reach an existing order's line items.
//
// ============================================================================

/// Flat per-unit surcharge applied when a line item carries a logo or a
/// customization text line.
pub const CUSTOMIZATION_SURCHARGE: Money = Money::from_cents(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMode {
    Online,
    #[serde(rename = "Cash on Delivery")]
    CashOnDelivery,
}

impl PaymentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMode::Online => "Online",
            PaymentMode::CashOnDelivery => "Cash on Delivery",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Online" => Some(PaymentMode::Online),
            "Cash on Delivery" => Some(PaymentMode::CashOnDelivery),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    Pending,
    Paid,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Paid => "Paid",
            PaymentStatus::Confirmed => "Confirmed",
            PaymentStatus::Shipped => "Shipped",
            PaymentStatus::Delivered => "Delivered",
            PaymentStatus::Cancelled => "Cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Pending" => Some(PaymentStatus::Pending),
            "Paid" => Some(PaymentStatus::Paid),
            "Confirmed" => Some(PaymentStatus::Confirmed),
            "Shipped" => Some(PaymentStatus::Shipped),
            "Delivered" => Some(PaymentStatus::Delivered),
            "Cancelled" => Some(PaymentStatus::Cancelled),
            _ => None,
        }
    }

    /// Values an operator may set through the update endpoint. `Paid` is
    /// reserved for online-payment checkout and rejected here.
    pub fn parse_operator_input(value: &str) -> Result<Self, OrderError> {
        match Self::parse(value) {
            Some(PaymentStatus::Paid) | None => {
                Err(OrderError::InvalidStatus(value.to_string()))
            }
            Some(status) => Ok(status),
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub address: String,
    pub email: String,
    pub phone: String,
}

impl ShippingAddress {
    pub fn validate(&self) -> Result<(), OrderError> {
        for (field, value) in [
            ("firstName", &self.first_name),
            ("address", &self.address),
            ("email", &self.email),
            ("phone", &self.phone),
        ] {
            if value.trim().is_empty() {
                return Err(OrderError::MissingShippingField(field));
            }
        }
        Ok(())
    }
}

/// One product/variant/quantity snapshot inside an order. `price` is the
/// effective unit price (catalog price plus any surcharge) at order time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineItem {
    pub product_ref: Uuid,
    pub title: String,
    pub price: Money,
    pub size: String,
    pub color: String,
    pub customization_text: String,
    pub customization_font: String,
    pub quantity: u32,
    pub unit_surcharge: Money,
}

impl OrderLineItem {
    pub fn line_total(&self) -> Money {
        self.price.times(self.quantity)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub line_items: Vec<OrderLineItem>,
    pub shipping_address: ShippingAddress,
    pub subtotal: Money,
    pub discount_amount: Money,
    pub final_amount: Money,
    pub promo_code: Option<String>,
    pub payment_mode: PaymentMode,
    pub payment_status: PaymentStatus,
    /// Carrier tracking id; the empty string means unset.
    pub tracking_id: String,
    pub private_message: Option<String>,
    pub last_email_sent: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Build a new order, enforcing the amount invariant
    /// `final_amount == subtotal - discount_amount` within one cent.
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        customer_id: Uuid,
        line_items: Vec<OrderLineItem>,
        shipping_address: ShippingAddress,
        subtotal: Money,
        discount_amount: Money,
        final_amount: Money,
        promo_code: Option<String>,
        payment_mode: PaymentMode,
    ) -> Result<Self, OrderError> {
        shipping_address.validate()?;

        if line_items.is_empty() {
            return Err(OrderError::EmptyLineItems);
        }
        for item in &line_items {
            if item.quantity < 1 {
                return Err(OrderError::InvalidQuantity(item.quantity));
            }
        }

        let expected = subtotal - discount_amount;
        if expected.diff(final_amount) > 1 {
            return Err(OrderError::AmountMismatch {
                expected,
                provided: final_amount,
            });
        }

        let payment_status = match payment_mode {
            PaymentMode::Online => PaymentStatus::Paid,
            PaymentMode::CashOnDelivery => PaymentStatus::Pending,
        };

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            customer_id,
            line_items,
            shipping_address,
            subtotal,
            discount_amount,
            final_amount,
            promo_code,
            payment_mode,
            payment_status,
            tracking_id: String::new(),
            private_message: None,
            last_email_sent: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn set_payment_status(&mut self, status: PaymentStatus) {
        self.payment_status = status;
        self.touch();
    }

    pub fn set_tracking_id(&mut self, tracking_id: String) {
        self.tracking_id = tracking_id;
        self.touch();
    }

    /// Clearing writes the empty string rather than a null.
    pub fn remove_tracking_id(&mut self) {
        self.tracking_id.clear();
        self.touch();
    }

    pub fn set_private_message(&mut self, message: String) {
        self.private_message = Some(message);
        self.touch();
    }

    pub fn record_email_sent(&mut self, message: String) {
        self.last_email_sent = Some(message);
        self.touch();
    }

    pub fn clear_email_sent(&mut self) {
        self.last_email_sent = None;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
