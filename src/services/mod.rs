use uuid::Uuid;

use crate::domain::user::Role;

pub mod cart;
pub mod checkout;
pub mod lifecycle;
pub mod promo;

pub use cart::{AddItemRequest, CartService, CartServiceError};
pub use checkout::{CheckoutError, CheckoutItem, CheckoutRequest, CheckoutService};
pub use lifecycle::{LifecycleError, OrderLifecycle};
pub use promo::{PromoService, Redemption};

/// The authenticated principal a service call runs as. Built by the HTTP
/// layer from verified token claims.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn is_operator(&self) -> bool {
        self.role.is_operator()
    }
}
