use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Identity Directory Records
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Seller,
    Admin,
}

impl Role {
    /// Sellers and admins act as shop operators.
    pub fn is_operator(&self) -> bool {
        matches!(self, Role::Seller | Role::Admin)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub is_customer: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_roles() {
        assert!(Role::Seller.is_operator());
        assert!(Role::Admin.is_operator());
        assert!(!Role::Customer.is_operator());
    }

    #[test]
    fn test_role_wire_format() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        let role: Role = serde_json::from_str("\"seller\"").unwrap();
        assert_eq!(role, Role::Seller);
    }
}
