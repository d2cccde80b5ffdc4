// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// Entities, business rule errors, and the storage/collaborator ports the
// services are wired against. This layer never touches HTTP or SQL.
//
// ============================================================================

pub mod cart;
pub mod money;
pub mod order;
pub mod ports;
pub mod product;
pub mod promo;
pub mod user;
