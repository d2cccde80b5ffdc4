// ============================================================================
// Promo Domain
// ============================================================================

pub mod entity;
pub mod errors;

pub use entity::*;
pub use errors::*;
