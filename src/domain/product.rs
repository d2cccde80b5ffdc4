use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::money::Money;

// ============================================================================
// Catalog Records
// ============================================================================
//
// The catalog is a collaborator: checkout and cart mutation only read these
// fields to snapshot them. Product CRUD lives outside this service.
//
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    pub id: Uuid,
    pub title: String,
    pub price: Money,
    pub front_image: String,
    pub side_image: Option<String>,
}
