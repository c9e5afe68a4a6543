use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Individual,
    Organization,
}

/// Account record created at signup. Immutable afterwards; `email` is the
/// identity key for every per-user collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub email: String,
    pub user_type: UserType,
    pub created_at: DateTime<Utc>,
}

/// Catalog reference data. Read-only to the settlement path, which only
/// consumes `id`, `name`, `project_type` and `price_per_ton`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub country: String,
    pub region: String,
    pub project_type: String,
    pub description: String,
    pub price_per_ton: Decimal,
    pub available_credits: u32,
    pub verified: bool,
    pub impact_per_year: u32,
    pub certification: Option<String>,
}

/// `filled` and `cancelled` are terminal; no transition leaves them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Open,
    Filled,
    Cancelled,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrderVisibility {
    Public,
    Private,
}

/// An open offer to sell `tons` credits of one project at a fixed price.
/// The record always belongs to the seller; fills only transfer exposure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SellOrder {
    pub id: Uuid,
    pub seller_id: String,
    pub seller_name: String,
    pub project_id: String,
    pub project_name: String,
    pub project_type: String,
    pub tons: u32,
    pub price_per_ton: Decimal,
    pub visibility: OrderVisibility,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HoldingStatus {
    Owned,
    Retired,
    Listed,
}

/// One lot of credits. The merge key for acquisitions is
/// `(project_id, status)`, so a holder never carries duplicate rows for
/// the same project in the same state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioItem {
    pub id: Uuid,
    pub project_id: String,
    pub project_name: String,
    pub project_type: String,
    pub tons: u32,
    pub price_per_ton: Decimal,
    pub status: HoldingStatus,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Buy,
    Sell,
    Retire,
}

/// Append-only log entry; never mutated or deleted once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub kind: TransactionKind,
    pub project_name: String,
    pub tons: u32,
    pub price_per_ton: Decimal,
    pub total_value: Decimal,
    pub date: DateTime<Utc>,
    pub counterparty: Option<String>,
}
