use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{PortfolioItem, SellOrder, Transaction, UserProfile};

/// Key under which the single global order book lives.
pub const ORDER_BOOK_KEY: &str = "sellOrders:all";

pub fn profile_key(email: &str) -> String {
    format!("user:{email}")
}

pub fn portfolio_key(email: &str) -> String {
    format!("portfolio:{email}")
}

pub fn transactions_key(email: &str) -> String {
    format!("transactions:{email}")
}

/// Exact-key string persistence primitive. Values are JSON documents;
/// namespacing is the implementation's concern.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    async fn set(&self, key: &str, value: String) -> anyhow::Result<()>;
    async fn delete(&self, key: &str) -> anyhow::Result<()>;
}

/// The global order book as stored: the whole collection under one key,
/// wrapped in a version envelope so concurrent replacements are detectable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderBookSnapshot {
    pub version: u64,
    pub orders: Vec<SellOrder>,
}

impl OrderBookSnapshot {
    pub fn find(&self, order_id: Uuid) -> Option<&SellOrder> {
        self.orders.iter().find(|order| order.id == order_id)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("order book version moved: expected {expected}, found {actual}")]
    StaleVersion { expected: u64, actual: u64 },
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Persistence collaborator for the settlement path. Per-user collections
/// are single-writer by construction (only the owning session writes them);
/// the order book is the one multi-writer resource and goes through the
/// versioned replace.
#[async_trait]
pub trait TradeLedger: Send + Sync {
    async fn read_profile(&self, email: &str) -> anyhow::Result<Option<UserProfile>>;
    async fn write_profile(&self, profile: &UserProfile) -> anyhow::Result<()>;

    /// Seeds the two empty per-user collections at signup. The transaction
    /// log is append-only afterwards.
    async fn init_user_collections(&self, email: &str) -> anyhow::Result<()>;

    /// Whole-array overwrite, not a merge.
    async fn write_portfolio(&self, email: &str, items: &[PortfolioItem]) -> anyhow::Result<()>;
    async fn read_portfolio(&self, email: &str) -> anyhow::Result<Vec<PortfolioItem>>;

    async fn read_transactions(&self, email: &str) -> anyhow::Result<Vec<Transaction>>;
    /// Prepends one entry (newest first) and returns the full log.
    async fn append_transaction(
        &self,
        email: &str,
        entry: &Transaction,
    ) -> anyhow::Result<Vec<Transaction>>;

    async fn read_order_book(&self) -> anyhow::Result<OrderBookSnapshot>;
    /// Prepends one order, retrying internally if the book moves underneath.
    async fn append_order(&self, order: &SellOrder) -> anyhow::Result<OrderBookSnapshot>;
    /// Replaces the whole book iff the stored version still matches
    /// `expected_version`; the stored version increments on success.
    async fn replace_order_book(
        &self,
        orders: &[SellOrder],
        expected_version: u64,
    ) -> Result<OrderBookSnapshot, LedgerError>;
}
