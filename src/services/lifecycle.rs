use std::sync::Arc;

use uuid::Uuid;

use crate::domain::order::{Order, OrderError, PaymentStatus};
use crate::domain::ports::{OrderStore, StoreError, UserDirectory};
use crate::domain::user::UserRecord;
use crate::invoice::{InvoiceError, InvoiceRenderer};
use crate::notify::{Notifier, NotifyError};

use super::Actor;

// ============================================================================
// Order Lifecycle
// ============================================================================
//
// Post-checkout operations on a persisted order: status and tracking changes,
// operator annotations, customer-facing emails and invoices. Ownership is
// enforced here, not in the HTTP layer: a customer touches only their own
// orders, operators touch any.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("Order not found: {0}")]
    NotFound(Uuid),

    #[error("Not allowed to access this order")]
    NotOwner,

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Notify(#[from] NotifyError),

    #[error(transparent)]
    Invoice(#[from] InvoiceError),
}

#[derive(Clone)]
pub struct OrderLifecycle {
    orders: Arc<dyn OrderStore>,
    users: Arc<dyn UserDirectory>,
    notifier: Notifier,
    invoices: Arc<dyn InvoiceRenderer>,
}

impl OrderLifecycle {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        users: Arc<dyn UserDirectory>,
        notifier: Notifier,
        invoices: Arc<dyn InvoiceRenderer>,
    ) -> Self {
        Self {
            orders,
            users,
            notifier,
            invoices,
        }
    }

    /// Fetch an order the actor is allowed to see.
    pub async fn get(&self, actor: &Actor, order_id: Uuid) -> Result<Order, LifecycleError> {
        let order = self
            .orders
            .find_by_id(order_id)
            .await?
            .ok_or(LifecycleError::NotFound(order_id))?;
        if !actor.is_operator() && order.customer_id != actor.id {
            return Err(LifecycleError::NotOwner);
        }
        Ok(order)
    }

    /// A customer's own orders, oldest first.
    pub async fn list_own(&self, actor: &Actor) -> Result<Vec<Order>, LifecycleError> {
        Ok(self.orders.find_by_customer(actor.id).await?)
    }

    /// Every order, newest first. Operator only.
    pub async fn list_all(&self, actor: &Actor) -> Result<Vec<Order>, LifecycleError> {
        self.require_operator(actor)?;
        Ok(self.orders.list_all().await?)
    }

    /// Everyone who has placed at least one order. Operator only.
    pub async fn customers(&self, actor: &Actor) -> Result<Vec<UserRecord>, LifecycleError> {
        self.require_operator(actor)?;
        Ok(self.users.list_customers().await?)
    }

    /// Operator status change, with an optional tracking id set in the same
    /// write. Fires a customer notification after persisting; a delivery
    /// failure does not undo the change.
    pub async fn update_status(
        &self,
        actor: &Actor,
        order_id: Uuid,
        status_input: &str,
        tracking_id: Option<String>,
    ) -> Result<Order, LifecycleError> {
        self.require_operator(actor)?;
        let status = PaymentStatus::parse_operator_input(status_input)?;

        let mut order = self.fetch(order_id).await?;
        order.set_payment_status(status);
        if let Some(tracking) = tracking_id {
            order.set_tracking_id(tracking);
        }
        self.orders.update(&order).await?;
        tracing::info!(order_id = %order.id, status = %status, "order status updated");

        let to = self.recipient(&order).await;
        self.notifier.status_update(&to, &order).await;
        Ok(order)
    }

    /// Notification recipient: the directory email for the order's customer,
    /// falling back to the shipping address when the account is gone.
    async fn recipient(&self, order: &Order) -> String {
        match self.users.find_by_id(order.customer_id).await {
            Ok(Some(user)) => user.email,
            Ok(None) => order.shipping_address.email.clone(),
            Err(error) => {
                tracing::warn!(
                    customer_id = %order.customer_id,
                    error = %error,
                    "directory lookup failed, using shipping email"
                );
                order.shipping_address.email.clone()
            }
        }
    }

    pub async fn set_tracking(
        &self,
        actor: &Actor,
        order_id: Uuid,
        tracking_id: String,
    ) -> Result<Order, LifecycleError> {
        self.require_operator(actor)?;
        let mut order = self.fetch(order_id).await?;
        order.set_tracking_id(tracking_id);
        self.orders.update(&order).await?;
        Ok(order)
    }

    pub async fn remove_tracking(
        &self,
        actor: &Actor,
        order_id: Uuid,
    ) -> Result<Order, LifecycleError> {
        self.require_operator(actor)?;
        let mut order = self.fetch(order_id).await?;
        order.remove_tracking_id();
        self.orders.update(&order).await?;
        Ok(order)
    }

    pub async fn set_private_message(
        &self,
        actor: &Actor,
        order_id: Uuid,
        message: String,
    ) -> Result<Order, LifecycleError> {
        self.require_operator(actor)?;
        let mut order = self.fetch(order_id).await?;
        order.set_private_message(message);
        self.orders.update(&order).await?;
        Ok(order)
    }

    /// Operator-composed email to the order's shipping address. Unlike the
    /// workflow notifications, a transport failure here is surfaced, and the
    /// message is recorded on the order only after delivery succeeds.
    pub async fn send_email(
        &self,
        actor: &Actor,
        order_id: Uuid,
        subject: &str,
        body: &str,
    ) -> Result<Order, LifecycleError> {
        self.require_operator(actor)?;
        let mut order = self.fetch(order_id).await?;

        self.notifier
            .send_custom(&order.shipping_address.email, subject, body)
            .await?;

        order.record_email_sent(body.to_string());
        self.orders.update(&order).await?;
        Ok(order)
    }

    pub async fn clear_email(
        &self,
        actor: &Actor,
        order_id: Uuid,
    ) -> Result<Order, LifecycleError> {
        self.require_operator(actor)?;
        let mut order = self.fetch(order_id).await?;
        order.clear_email_sent();
        self.orders.update(&order).await?;
        Ok(order)
    }

    /// Render the order's invoice as PDF bytes.
    pub async fn invoice(&self, actor: &Actor, order_id: Uuid) -> Result<Vec<u8>, LifecycleError> {
        let order = self.get(actor, order_id).await?;
        Ok(self.invoices.render(&order)?)
    }

    /// Owner (or operator) removal of an order.
    pub async fn delete(&self, actor: &Actor, order_id: Uuid) -> Result<(), LifecycleError> {
        // Ownership check happens on the fetch.
        let order = self.get(actor, order_id).await?;
        self.orders.delete(order.id).await?;
        tracing::info!(order_id = %order.id, "order deleted");
        Ok(())
    }

    async fn fetch(&self, order_id: Uuid) -> Result<Order, LifecycleError> {
        self.orders
            .find_by_id(order_id)
            .await?
            .ok_or(LifecycleError::NotFound(order_id))
    }

    fn require_operator(&self, actor: &Actor) -> Result<(), LifecycleError> {
        if actor.is_operator() {
            Ok(())
        } else {
            Err(LifecycleError::NotOwner)
        }
    }
}
