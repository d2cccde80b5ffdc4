use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::order::Order;
use crate::metrics::Metrics;
use crate::utils::RetryPolicy;

mod smtp;

pub use smtp::SmtpMailer;

// ============================================================================
// Notification Dispatcher
// ============================================================================
//
// Transactional email keyed by event type. Order-workflow notifications are
// fire-and-forget: a delivery failure is logged and counted, never surfaced
// to the caller — the order stands regardless. Operator-composed emails are
// the one exception; the operator is told when delivery fails.
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    OrderConfirmation,
    StatusUpdate,
    Dispatch,
    Custom,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::OrderConfirmation => "order_confirmation",
            NotificationKind::StatusUpdate => "status_update",
            NotificationKind::Dispatch => "dispatch",
            NotificationKind::Custom => "custom",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("invalid recipient address: {0}")]
    InvalidAddress(String),

    #[error("email transport failed: {0}")]
    Transport(String),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotifyError>;
}

#[derive(Clone)]
pub struct Notifier {
    mailer: Arc<dyn Mailer>,
    metrics: Arc<Metrics>,
    retry: RetryPolicy,
}

impl Notifier {
    pub fn new(mailer: Arc<dyn Mailer>, metrics: Arc<Metrics>) -> Self {
        Self {
            mailer,
            metrics,
            retry: RetryPolicy::default(),
        }
    }

    /// Fired after an order is persisted. Failures are swallowed.
    pub async fn order_confirmation(&self, to: &str, order: &Order) {
        let message = EmailMessage {
            to: to.to_string(),
            subject: format!("Order confirmation - {}", order.id),
            body: confirmation_body(order),
        };
        self.deliver_lenient(NotificationKind::OrderConfirmation, message).await;
    }

    /// Fired after an operator status change. A move to Shipped becomes a
    /// dispatch notification carrying the tracking id.
    pub async fn status_update(&self, to: &str, order: &Order) {
        let kind = if order.payment_status == crate::domain::order::PaymentStatus::Shipped {
            NotificationKind::Dispatch
        } else {
            NotificationKind::StatusUpdate
        };
        let message = EmailMessage {
            to: to.to_string(),
            subject: format!("Your order is now {}", order.payment_status),
            body: status_body(order),
        };
        self.deliver_lenient(kind, message).await;
    }

    /// Operator-composed email; delivery failure is surfaced.
    pub async fn send_custom(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        let message = EmailMessage {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        };
        self.deliver(NotificationKind::Custom, message).await
    }

    async fn deliver_lenient(&self, kind: NotificationKind, message: EmailMessage) {
        if let Err(error) = self.deliver(kind, message).await {
            tracing::warn!(kind = kind.as_str(), error = %error, "notification delivery failed");
        }
    }

    async fn deliver(&self, kind: NotificationKind, message: EmailMessage) -> Result<(), NotifyError> {
        let result = self.retry.run(|| self.mailer.send(&message)).await;
        self.metrics.record_email(kind.as_str(), result.is_ok());
        if result.is_ok() {
            tracing::info!(kind = kind.as_str(), to = %message.to, "notification sent");
        }
        result
    }
}

fn confirmation_body(order: &Order) -> String {
    let mut body = format!(
        "Hi {},\n\nThank you for your order!\n\nOrder ID: {}\nPlaced: {}\n\nItems:\n",
        order.shipping_address.first_name,
        order.id,
        order.created_at.format("%Y-%m-%d %H:%M UTC"),
    );
    for (index, item) in order.line_items.iter().enumerate() {
        let _ = writeln!(
            body,
            "{}. {} - {} x {}",
            index + 1,
            item.title,
            item.quantity,
            item.price
        );
    }
    let _ = write!(
        body,
        "\nSubtotal: {}\nDiscount: {}\nTotal: {}\n\nPayment: {} ({})\n",
        order.subtotal,
        order.discount_amount,
        order.final_amount,
        order.payment_mode.as_str(),
        order.payment_status,
    );
    body
}

fn status_body(order: &Order) -> String {
    let mut body = format!(
        "Hi {},\n\nYour order {} is now {}.\n",
        order.shipping_address.first_name, order.id, order.payment_status
    );
    if !order.tracking_id.is_empty() {
        let _ = write!(body, "\nTracking ID: {}\n", order.tracking_id);
    }
    body
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use tokio::sync::Mutex;

    /// Mailer double that records deliveries and can be told to fail.
    pub struct RecordingMailer {
        pub sent: Mutex<Vec<EmailMessage>>,
        pub fail: bool,
    }

    impl RecordingMailer {
        pub fn new() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        pub fn failing() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail: true,
            }
        }
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, message: &EmailMessage) -> Result<(), NotifyError> {
            if self.fail {
                return Err(NotifyError::Transport("smtp unavailable".into()));
            }
            self.sent.lock().await.push(message.clone());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingMailer;
    use super::*;
    use crate::domain::money::Money;
    use crate::domain::order::{OrderLineItem, PaymentMode, PaymentStatus, ShippingAddress};
    use uuid::Uuid;

    fn sample_order() -> Order {
        Order::create(
            Uuid::new_v4(),
            vec![OrderLineItem {
                product_ref: Uuid::new_v4(),
                title: "Classic Hoodie".into(),
                price: Money::from_cents(2000),
                size: "M".into(),
                color: "Black".into(),
                customization_text: String::new(),
                customization_font: String::new(),
                quantity: 2,
                unit_surcharge: Money::ZERO,
            }],
            ShippingAddress {
                first_name: "Ada".into(),
                last_name: "Lovelace".into(),
                address: "12 Analytical Row".into(),
                email: "ada@example.com".into(),
                phone: "0300-0000000".into(),
            },
            Money::from_cents(4000),
            Money::from_cents(400),
            Money::from_cents(3600),
            Some("SAVE10".into()),
            PaymentMode::CashOnDelivery,
        )
        .unwrap()
    }

    #[test]
    fn test_confirmation_body_lists_items_and_totals() {
        let body = confirmation_body(&sample_order());
        assert!(body.contains("Classic Hoodie - 2 x $20.00"));
        assert!(body.contains("Discount: $4.00"));
        assert!(body.contains("Total: $36.00"));
    }

    #[test]
    fn test_status_body_includes_tracking_when_set() {
        let mut order = sample_order();
        assert!(!status_body(&order).contains("Tracking ID"));

        order.set_payment_status(PaymentStatus::Shipped);
        order.set_tracking_id("TCS-998".into());
        let body = status_body(&order);
        assert!(body.contains("Shipped"));
        assert!(body.contains("Tracking ID: TCS-998"));
    }

    #[tokio::test]
    async fn test_lenient_delivery_swallows_failures() {
        let metrics = Arc::new(Metrics::new().unwrap());
        let notifier = Notifier::new(Arc::new(RecordingMailer::failing()), metrics.clone());

        // Must not panic or propagate.
        notifier.order_confirmation("ada@example.com", &sample_order()).await;

        let gathered = metrics.registry().gather();
        let failed = gathered.iter().find(|m| m.name() == "emails_failed_total").unwrap();
        assert_eq!(failed.metric[0].counter.value, Some(1.0));
    }

    #[tokio::test]
    async fn test_custom_email_surfaces_failure() {
        let metrics = Arc::new(Metrics::new().unwrap());
        let notifier = Notifier::new(Arc::new(RecordingMailer::failing()), metrics);
        let result = notifier.send_custom("ada@example.com", "Hello", "Body").await;
        assert!(result.is_err());
    }
}
