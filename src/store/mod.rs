// ============================================================================
// Store Implementations
// ============================================================================

#[cfg(test)]
pub mod memory;
pub mod postgres;

#[cfg(test)]
pub use memory::MemoryStore;
pub use postgres::{
    init_schema, PgCartStore, PgCatalog, PgOrderStore, PgPromoStore, PgUserDirectory,
};
