use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use verdant_core::storage::{ORDER_BOOK_KEY, portfolio_key, profile_key, transactions_key};
use verdant_core::{
    KvStore, LedgerError, OrderBookSnapshot, PortfolioItem, SellOrder, TradeLedger, Transaction,
    UserProfile,
};

/// How often an append re-reads the book when a concurrent replace lands
/// between its read and its write.
const APPEND_RETRIES: usize = 3;

/// Realizes the trade ledger over any exact-key store. Every operation is
/// one read-then-write cycle against the store; the order-book version
/// check detects concurrent sessions going through the same process, while
/// the store write itself stays last-write-wins.
pub struct KvTradeLedger {
    store: Arc<dyn KvStore>,
}

impl KvTradeLedger {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> anyhow::Result<Option<T>> {
        let raw = self.store.get(key).await?;
        match raw {
            Some(raw) => {
                let value = serde_json::from_str(&raw)
                    .with_context(|| format!("malformed document under '{key}'"))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    async fn write_json<T: Serialize>(&self, key: &str, value: &T) -> anyhow::Result<()> {
        let raw = serde_json::to_string(value)?;
        self.store.set(key, raw).await
    }
}

#[async_trait]
impl TradeLedger for KvTradeLedger {
    async fn read_profile(&self, email: &str) -> anyhow::Result<Option<UserProfile>> {
        self.read_json(&profile_key(email)).await
    }

    async fn write_profile(&self, profile: &UserProfile) -> anyhow::Result<()> {
        self.write_json(&profile_key(&profile.email), profile).await
    }

    async fn init_user_collections(&self, email: &str) -> anyhow::Result<()> {
        self.write_json(&portfolio_key(email), &Vec::<PortfolioItem>::new())
            .await?;
        self.write_json(&transactions_key(email), &Vec::<Transaction>::new())
            .await
    }

    async fn write_portfolio(&self, email: &str, items: &[PortfolioItem]) -> anyhow::Result<()> {
        self.write_json(&portfolio_key(email), &items).await
    }

    async fn read_portfolio(&self, email: &str) -> anyhow::Result<Vec<PortfolioItem>> {
        Ok(self
            .read_json(&portfolio_key(email))
            .await?
            .unwrap_or_default())
    }

    async fn read_transactions(&self, email: &str) -> anyhow::Result<Vec<Transaction>> {
        Ok(self
            .read_json(&transactions_key(email))
            .await?
            .unwrap_or_default())
    }

    async fn append_transaction(
        &self,
        email: &str,
        entry: &Transaction,
    ) -> anyhow::Result<Vec<Transaction>> {
        let key = transactions_key(email);
        let mut log: Vec<Transaction> = self.read_json(&key).await?.unwrap_or_default();
        log.insert(0, entry.clone());
        self.write_json(&key, &log).await?;
        Ok(log)
    }

    async fn read_order_book(&self) -> anyhow::Result<OrderBookSnapshot> {
        Ok(self
            .read_json(ORDER_BOOK_KEY)
            .await?
            .unwrap_or_default())
    }

    async fn append_order(&self, order: &SellOrder) -> anyhow::Result<OrderBookSnapshot> {
        for _ in 0..APPEND_RETRIES {
            let book = self.read_order_book().await?;
            let mut orders = book.orders;
            orders.insert(0, order.clone());
            match self.replace_order_book(&orders, book.version).await {
                Ok(snapshot) => return Ok(snapshot),
                Err(LedgerError::StaleVersion { .. }) => continue,
                Err(LedgerError::Store(err)) => return Err(err),
            }
        }
        anyhow::bail!("order book kept moving while appending order {}", order.id)
    }

    async fn replace_order_book(
        &self,
        orders: &[SellOrder],
        expected_version: u64,
    ) -> Result<OrderBookSnapshot, LedgerError> {
        let current = self.read_order_book().await?;
        if current.version != expected_version {
            return Err(LedgerError::StaleVersion {
                expected: expected_version,
                actual: current.version,
            });
        }

        let snapshot = OrderBookSnapshot {
            version: current.version + 1,
            orders: orders.to_vec(),
        };
        self.write_json(ORDER_BOOK_KEY, &snapshot).await?;
        Ok(snapshot)
    }
}
