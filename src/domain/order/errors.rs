use crate::domain::money::Money;

// ============================================================================
// Order Business Rule Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Missing required shipping field: {0}")]
    MissingShippingField(&'static str),

    #[error("Order must contain at least one line item")]
    EmptyLineItems,

    #[error("Invalid line item quantity: {0}")]
    InvalidQuantity(u32),

    #[error("Amount mismatch. Expected: {expected}, Provided: {provided}")]
    AmountMismatch { expected: Money, provided: Money },

    #[error("Invalid order status: {0}")]
    InvalidStatus(String),
}
