use serde::{Deserialize, Serialize};

/// Role of an HR dashboard account. `Hr` accounts are scoped to their own
/// company for every read; `Admin` bypasses company scoping.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AccountRole {
    Hr,
    Admin,
}

/// Certification lifecycle. Revocation is terminal; `Expired` exists in
/// the schema but is never set by the service.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CertificationStatus {
    Active,
    Revoked,
    Expired,
}
