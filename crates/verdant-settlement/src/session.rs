use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::error;
use uuid::Uuid;
use verdant_core::{
    LedgerError, OrderVisibility, PortfolioItem, Project, SellOrder, TradeLedger, Transaction,
    UserProfile,
};

use crate::engine::{PortfolioSummary, SettlementState};
use crate::error::SettlementError;
use crate::intent::{TradeIntent, TradeSource};

/// How many times an order-book write is retried when another session's
/// replace lands first.
const BOOK_RETRIES: usize = 3;

/// An order-book change the session may need to re-apply onto a freshly
/// loaded book after losing a version race.
#[derive(Debug, Clone, Copy)]
enum BookEdit {
    Fill { order_id: Uuid, tons: u32 },
    Cancel { order_id: Uuid },
}

/// One signed-in holder's trading session: the in-memory settlement state,
/// at most one in-flight trade intent, and the ledger it syncs to.
///
/// Engine transitions are applied first; the persistence writes that
/// follow are caught and logged on failure without rolling the local state
/// back. The divergence window closes on the next full [`refresh`].
///
/// [`refresh`]: TradingSession::refresh
pub struct TradingSession {
    user: UserProfile,
    ledger: Arc<dyn TradeLedger>,
    state: SettlementState,
    book_version: u64,
    intent: Option<TradeIntent>,
}

impl TradingSession {
    /// Opens a session for an already-verified profile, loading the
    /// holder's collections and the shared order book.
    pub async fn open(ledger: Arc<dyn TradeLedger>, user: UserProfile) -> anyhow::Result<Self> {
        let portfolio = ledger.read_portfolio(&user.email).await?;
        let transactions = ledger.read_transactions(&user.email).await?;
        let book = ledger.read_order_book().await?;

        Ok(Self {
            user,
            ledger,
            state: SettlementState::from_parts(portfolio, transactions, book.orders),
            book_version: book.version,
            intent: None,
        })
    }

    /// Re-fetches everything from the ledger, dropping any in-flight
    /// intent. This is the reconciliation point after a persistence
    /// failure left local and stored state diverged.
    pub async fn refresh(&mut self) -> anyhow::Result<()> {
        let portfolio = self.ledger.read_portfolio(&self.user.email).await?;
        let transactions = self.ledger.read_transactions(&self.user.email).await?;
        let book = self.ledger.read_order_book().await?;

        self.state = SettlementState::from_parts(portfolio, transactions, book.orders);
        self.book_version = book.version;
        self.intent = None;
        Ok(())
    }

    /// Stages a primary-market buy. No state changes until confirmation.
    pub fn initiate_catalog_buy(
        &mut self,
        project: &Project,
        tons: u32,
        price_per_ton: Decimal,
        retire: bool,
    ) -> Result<&TradeIntent, SettlementError> {
        let intent = TradeIntent::buy_from_catalog(project, tons, price_per_ton, retire)?;
        Ok(self.intent.insert(intent))
    }

    /// Stages a secondary-market buy against a listing currently in the
    /// book.
    pub fn initiate_listing_buy(
        &mut self,
        order_id: Uuid,
        tons: u32,
    ) -> Result<&TradeIntent, SettlementError> {
        let order = self
            .state
            .sell_orders
            .iter()
            .find(|order| order.id == order_id)
            .ok_or(SettlementError::OrderNotFound(order_id))?;
        let intent = TradeIntent::buy_from_listing(order, tons)?;
        Ok(self.intent.insert(intent))
    }

    /// Discards the in-flight intent without applying it.
    pub fn cancel_trade(&mut self) {
        self.intent = None;
    }

    /// Settles the staged trade and syncs portfolio, transaction log and
    /// (for secondary-market buys) the order book. The intent is consumed
    /// whether or not settlement succeeds.
    pub async fn confirm_trade(&mut self) -> Result<Transaction, SettlementError> {
        let intent = self.intent.take().ok_or(SettlementError::NoTradeInFlight)?;
        let edit = match &intent.source {
            TradeSource::Listing(order) => Some(BookEdit::Fill {
                order_id: order.id,
                tons: intent.tons,
            }),
            TradeSource::Catalog(_) => None,
        };

        let outcome = self.state.confirm_buy(&intent)?;

        if let Err(err) = self
            .ledger
            .write_portfolio(&self.user.email, &self.state.portfolio)
            .await
        {
            error!("failed to persist portfolio for {}: {err:#}", self.user.email);
        }
        if let Err(err) = self
            .ledger
            .append_transaction(&self.user.email, &outcome.transaction)
            .await
        {
            error!(
                "failed to persist transaction {} for {}: {err:#}",
                outcome.transaction.id, self.user.email
            );
        }
        if outcome.order_book_changed {
            if let Some(edit) = edit {
                self.push_book_edit(edit).await;
            }
        }

        Ok(outcome.transaction)
    }

    /// Lists owned credits for sale and syncs the new order plus the
    /// recharacterized portfolio.
    pub async fn create_listing(
        &mut self,
        project_id: &str,
        tons: u32,
        price_per_ton: Decimal,
        visibility: OrderVisibility,
    ) -> Result<SellOrder, SettlementError> {
        let order =
            self.state
                .create_sell_order(&self.user, project_id, tons, price_per_ton, visibility)?;

        match self.ledger.append_order(&order).await {
            Ok(book) => {
                self.state.sell_orders = book.orders;
                self.book_version = book.version;
            }
            Err(err) => error!("failed to persist sell order {}: {err:#}", order.id),
        }
        if let Err(err) = self
            .ledger
            .write_portfolio(&self.user.email, &self.state.portfolio)
            .await
        {
            error!("failed to persist portfolio for {}: {err:#}", self.user.email);
        }

        Ok(order)
    }

    /// Cancels one of the holder's listings and syncs the book.
    pub async fn cancel_listing(&mut self, order_id: Uuid) -> Result<(), SettlementError> {
        self.state.cancel_sell_order(order_id)?;
        self.push_book_edit(BookEdit::Cancel { order_id }).await;
        Ok(())
    }

    /// Version-checked replace of the shared book. On a lost race the
    /// fresh book is loaded, the session's single edit re-applied, and the
    /// replace retried; after `BOOK_RETRIES` losses the change stays local
    /// until the next refresh.
    async fn push_book_edit(&mut self, edit: BookEdit) {
        for _ in 0..BOOK_RETRIES {
            match self
                .ledger
                .replace_order_book(&self.state.sell_orders, self.book_version)
                .await
            {
                Ok(book) => {
                    self.book_version = book.version;
                    return;
                }
                Err(LedgerError::StaleVersion { .. }) => {
                    let fresh = match self.ledger.read_order_book().await {
                        Ok(fresh) => fresh,
                        Err(err) => {
                            error!("failed to reload order book: {err:#}");
                            return;
                        }
                    };
                    self.state.sell_orders = fresh.orders;
                    self.book_version = fresh.version;
                    if let Err(err) = self.apply_book_edit(edit) {
                        error!("order book change no longer applies after reload: {err}");
                        return;
                    }
                }
                Err(LedgerError::Store(err)) => {
                    error!("failed to persist order book: {err:#}");
                    return;
                }
            }
        }
        error!("order book stayed contended after {BOOK_RETRIES} attempts; change kept locally");
    }

    fn apply_book_edit(&mut self, edit: BookEdit) -> Result<(), SettlementError> {
        match edit {
            BookEdit::Fill { order_id, tons } => {
                self.state.fill_listing(order_id, tons).map(|_| ())
            }
            BookEdit::Cancel { order_id } => self.state.cancel_sell_order(order_id).map(|_| ()),
        }
    }

    pub fn user(&self) -> &UserProfile {
        &self.user
    }

    pub fn portfolio(&self) -> &[PortfolioItem] {
        &self.state.portfolio
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.state.transactions
    }

    pub fn order_book(&self) -> &[SellOrder] {
        &self.state.sell_orders
    }

    pub fn book_version(&self) -> u64 {
        self.book_version
    }

    pub fn pending_trade(&self) -> Option<&TradeIntent> {
        self.intent.as_ref()
    }

    pub fn market_listings(&self) -> Vec<&SellOrder> {
        self.state.market_listings_for(&self.user.email)
    }

    pub fn own_listings(&self) -> Vec<&SellOrder> {
        self.state.own_listings(&self.user.email)
    }

    pub fn portfolio_summary(&self) -> PortfolioSummary {
        self.state.portfolio_summary()
    }
}
