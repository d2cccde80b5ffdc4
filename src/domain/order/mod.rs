// ============================================================================
// Order Domain
// ============================================================================
//
// Order entity, line-item snapshots, shipping address, payment enums,
// and the business rule errors for the order lifecycle.
//
// ============================================================================

pub mod entity;
pub mod errors;

pub use entity::*;
pub use errors::*;
