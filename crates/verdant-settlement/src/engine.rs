use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;
use verdant_core::{
    HoldingStatus, OrderStatus, OrderVisibility, PortfolioItem, SellOrder, Transaction,
    TransactionKind, UserProfile, UserType,
};

use crate::error::SettlementError;
use crate::intent::{TradeIntent, TradeSource};

/// What a confirmed trade changed, for the caller to sync out.
#[derive(Debug, Clone)]
pub struct TradeOutcome {
    pub transaction: Transaction,
    pub order_book_changed: bool,
}

/// Aggregate figures the portfolio surfaces display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortfolioSummary {
    pub owned_tons: u32,
    pub listed_tons: u32,
    pub retired_tons: u32,
    pub owned_value: Decimal,
}

/// One holder's in-memory marketplace state: their portfolio and
/// transaction log plus the shared sell-order book. All transitions are
/// synchronous and validate before mutating, so an error leaves the state
/// untouched.
#[derive(Debug, Clone, Default)]
pub struct SettlementState {
    pub portfolio: Vec<PortfolioItem>,
    pub transactions: Vec<Transaction>,
    pub sell_orders: Vec<SellOrder>,
}

impl SettlementState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(
        portfolio: Vec<PortfolioItem>,
        transactions: Vec<Transaction>,
        sell_orders: Vec<SellOrder>,
    ) -> Self {
        Self {
            portfolio,
            transactions,
            sell_orders,
        }
    }

    /// Applies a confirmed buy: merge or prepend the acquired lot, append
    /// exactly one transaction, and decrement the filled listing if the
    /// trade came from the secondary market.
    ///
    /// Listing quantities are re-checked against the book's current copy
    /// of the order; the intent may have been built from a stale snapshot.
    pub fn confirm_buy(&mut self, intent: &TradeIntent) -> Result<TradeOutcome, SettlementError> {
        if intent.tons == 0 {
            return Err(SettlementError::QuantityNotPositive);
        }
        if let TradeSource::Listing(listed) = &intent.source {
            let live = self
                .sell_orders
                .iter()
                .find(|order| order.id == listed.id)
                .ok_or(SettlementError::OrderNotFound(listed.id))?;
            if live.status != OrderStatus::Open {
                return Err(SettlementError::ListingNotOpen(live.id));
            }
            if intent.tons > live.tons {
                return Err(SettlementError::QuantityExceedsAvailable {
                    requested: intent.tons,
                    available: live.tons,
                });
            }
        }

        let status = if intent.retire {
            HoldingStatus::Retired
        } else {
            HoldingStatus::Owned
        };
        let (project_id, project_name, project_type) = intent.project_fields();
        let project_name = project_name.to_string();

        // Merge rule: one lot per (project_id, status). The existing lot's
        // price_per_ton is left as-is; only the transaction log carries the
        // price actually paid.
        match self
            .portfolio
            .iter_mut()
            .find(|item| item.project_id == project_id && item.status == status)
        {
            Some(existing) => existing.tons += intent.tons,
            None => self.portfolio.insert(
                0,
                PortfolioItem {
                    id: Uuid::new_v4(),
                    project_id: project_id.to_string(),
                    project_name: project_name.clone(),
                    project_type: project_type.to_string(),
                    tons: intent.tons,
                    price_per_ton: intent.price_per_ton,
                    status,
                    date: Utc::now(),
                },
            ),
        }

        let transaction = Transaction {
            id: Uuid::new_v4(),
            kind: TransactionKind::Buy,
            project_name,
            tons: intent.tons,
            price_per_ton: intent.price_per_ton,
            total_value: intent.total_cost,
            date: Utc::now(),
            counterparty: intent.counterparty(),
        };
        self.transactions.insert(0, transaction.clone());

        let order_book_changed = if let TradeSource::Listing(listed) = &intent.source {
            self.fill_listing(listed.id, intent.tons)?;
            true
        } else {
            false
        };

        Ok(TradeOutcome {
            transaction,
            order_book_changed,
        })
    }

    /// Decrements an open listing by `tons`; at exactly zero the order
    /// transitions to `filled` and accepts no further fills.
    pub fn fill_listing(
        &mut self,
        order_id: Uuid,
        tons: u32,
    ) -> Result<OrderStatus, SettlementError> {
        if tons == 0 {
            return Err(SettlementError::QuantityNotPositive);
        }
        let order = self
            .sell_orders
            .iter_mut()
            .find(|order| order.id == order_id)
            .ok_or(SettlementError::OrderNotFound(order_id))?;
        if order.status != OrderStatus::Open {
            return Err(SettlementError::ListingNotOpen(order_id));
        }
        if tons > order.tons {
            return Err(SettlementError::QuantityExceedsAvailable {
                requested: tons,
                available: order.tons,
            });
        }

        order.tons -= tons;
        if order.tons == 0 {
            order.status = OrderStatus::Filled;
        }
        Ok(order.status)
    }

    /// Lists `tons` from the seller's owned holding of `project_id`. The
    /// source lot loses the listed amount and its entire remainder is
    /// recharacterized as `listed`; the remainder is not split into a
    /// separate still-owned lot.
    pub fn create_sell_order(
        &mut self,
        seller: &UserProfile,
        project_id: &str,
        tons: u32,
        price_per_ton: Decimal,
        visibility: OrderVisibility,
    ) -> Result<SellOrder, SettlementError> {
        if seller.user_type != UserType::Organization {
            return Err(SettlementError::SellerNotOrganization);
        }
        if tons == 0 {
            return Err(SettlementError::QuantityNotPositive);
        }

        let item = self
            .portfolio
            .iter_mut()
            .find(|item| item.project_id == project_id && item.status == HoldingStatus::Owned)
            .ok_or(SettlementError::LotNotSellable)?;
        if tons > item.tons {
            return Err(SettlementError::QuantityExceedsAvailable {
                requested: tons,
                available: item.tons,
            });
        }

        let order = SellOrder {
            id: Uuid::new_v4(),
            seller_id: seller.email.clone(),
            seller_name: seller.name.clone(),
            project_id: item.project_id.clone(),
            project_name: item.project_name.clone(),
            project_type: item.project_type.clone(),
            tons,
            price_per_ton,
            visibility,
            status: OrderStatus::Open,
            created_at: Utc::now(),
        };

        item.tons -= tons;
        item.status = HoldingStatus::Listed;
        self.sell_orders.insert(0, order.clone());

        Ok(order)
    }

    /// Cancels an open listing. Cancelling an already-cancelled order is a
    /// no-op success; a filled order stays filled. Listed tons are not
    /// returned to the seller's owned balance.
    pub fn cancel_sell_order(&mut self, order_id: Uuid) -> Result<OrderStatus, SettlementError> {
        let order = self
            .sell_orders
            .iter_mut()
            .find(|order| order.id == order_id)
            .ok_or(SettlementError::OrderNotFound(order_id))?;

        match order.status {
            OrderStatus::Cancelled => Ok(OrderStatus::Cancelled),
            OrderStatus::Filled => Err(SettlementError::ListingNotOpen(order_id)),
            OrderStatus::Open => {
                order.status = OrderStatus::Cancelled;
                Ok(OrderStatus::Cancelled)
            }
        }
    }

    /// Open, public listings from other sellers: the buy side of the
    /// marketplace.
    pub fn market_listings_for(&self, email: &str) -> Vec<&SellOrder> {
        self.sell_orders
            .iter()
            .filter(|order| {
                order.status == OrderStatus::Open
                    && order.visibility == OrderVisibility::Public
                    && order.seller_id != email
            })
            .collect()
    }

    /// The caller's own open listings, cancellable from the marketplace.
    pub fn own_listings(&self, email: &str) -> Vec<&SellOrder> {
        self.sell_orders
            .iter()
            .filter(|order| order.status == OrderStatus::Open && order.seller_id == email)
            .collect()
    }

    pub fn portfolio_summary(&self) -> PortfolioSummary {
        let mut summary = PortfolioSummary {
            owned_tons: 0,
            listed_tons: 0,
            retired_tons: 0,
            owned_value: Decimal::ZERO,
        };
        for item in &self.portfolio {
            match item.status {
                HoldingStatus::Owned => {
                    summary.owned_tons += item.tons;
                    summary.owned_value += item.price_per_ton * Decimal::from(item.tons);
                }
                HoldingStatus::Listed => summary.listed_tons += item.tons,
                HoldingStatus::Retired => summary.retired_tons += item.tons,
            }
        }
        summary
    }

    /// Total tons held for one `(project, status)` lot.
    pub fn holding_tons(&self, project_id: &str, status: HoldingStatus) -> u32 {
        self.portfolio
            .iter()
            .filter(|item| item.project_id == project_id && item.status == status)
            .map(|item| item.tons)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::TradeIntent;
    use rust_decimal_macros::dec;
    use verdant_core::Project;

    fn organization(email: &str, name: &str) -> UserProfile {
        UserProfile {
            name: name.to_string(),
            email: email.to_string(),
            user_type: UserType::Organization,
            created_at: Utc::now(),
        }
    }

    fn individual(email: &str) -> UserProfile {
        UserProfile {
            name: "Ravi".to_string(),
            email: email.to_string(),
            user_type: UserType::Individual,
            created_at: Utc::now(),
        }
    }

    fn project(id: &str, price: Decimal, available: u32) -> Project {
        Project {
            id: id.to_string(),
            name: format!("Project {id}"),
            country: "India".to_string(),
            region: "Kerala".to_string(),
            project_type: "Reforestation".to_string(),
            description: String::new(),
            price_per_ton: price,
            available_credits: available,
            verified: true,
            impact_per_year: 1_000,
            certification: None,
        }
    }

    fn owned_lot(project_id: &str, tons: u32, price: Decimal) -> PortfolioItem {
        PortfolioItem {
            id: Uuid::new_v4(),
            project_id: project_id.to_string(),
            project_name: format!("Project {project_id}"),
            project_type: "Reforestation".to_string(),
            tons,
            price_per_ton: price,
            status: HoldingStatus::Owned,
            date: Utc::now(),
        }
    }

    #[test]
    fn catalog_buy_into_empty_portfolio_creates_one_owned_lot() {
        let mut state = SettlementState::new();
        let project = project("p1", dec!(800), 1_000);
        let intent = TradeIntent::buy_from_catalog(&project, 10, dec!(800), false).unwrap();

        let outcome = state.confirm_buy(&intent).unwrap();

        assert_eq!(state.portfolio.len(), 1);
        let lot = &state.portfolio[0];
        assert_eq!(lot.tons, 10);
        assert_eq!(lot.status, HoldingStatus::Owned);
        assert_eq!(lot.price_per_ton, dec!(800));

        assert_eq!(state.transactions.len(), 1);
        let entry = &state.transactions[0];
        assert_eq!(entry.kind, TransactionKind::Buy);
        assert_eq!(entry.tons, 10);
        assert_eq!(entry.total_value, dec!(8000));
        assert!(entry.counterparty.is_none());
        assert!(!outcome.order_book_changed);
    }

    #[test]
    fn repeat_buys_merge_into_the_existing_lot() {
        let mut state = SettlementState::new();
        let project = project("p1", dec!(800), 1_000);

        let first = TradeIntent::buy_from_catalog(&project, 10, dec!(800), false).unwrap();
        state.confirm_buy(&first).unwrap();
        let second = TradeIntent::buy_from_catalog(&project, 5, dec!(950), false).unwrap();
        state.confirm_buy(&second).unwrap();

        assert_eq!(state.portfolio.len(), 1);
        assert_eq!(state.portfolio[0].tons, 15);
        // The lot keeps its original price; only the log carries the new one.
        assert_eq!(state.portfolio[0].price_per_ton, dec!(800));
        assert_eq!(state.transactions.len(), 2);
        assert_eq!(state.transactions[0].price_per_ton, dec!(950));
    }

    #[test]
    fn buy_and_retire_creates_a_fresh_retired_lot() {
        let mut state = SettlementState::new();
        state.portfolio.push(owned_lot("p1", 10, dec!(800)));
        let project = project("p1", dec!(800), 1_000);

        let intent = TradeIntent::buy_from_catalog(&project, 5, dec!(800), true).unwrap();
        state.confirm_buy(&intent).unwrap();

        assert_eq!(state.holding_tons("p1", HoldingStatus::Owned), 10);
        assert_eq!(state.holding_tons("p1", HoldingStatus::Retired), 5);
        assert_eq!(state.portfolio.len(), 2);
    }

    #[test]
    fn conservation_across_mixed_buys() {
        let mut state = SettlementState::new();
        let project = project("p1", dec!(700), 10_000);

        for tons in [10, 25, 7] {
            let before = state.holding_tons("p1", HoldingStatus::Owned);
            let intent = TradeIntent::buy_from_catalog(&project, tons, dec!(700), false).unwrap();
            state.confirm_buy(&intent).unwrap();
            assert_eq!(state.holding_tons("p1", HoldingStatus::Owned), before + tons);
        }
    }

    #[test]
    fn organization_listing_recharacterizes_the_remainder() {
        let mut state = SettlementState::new();
        state.portfolio.push(owned_lot("p1", 50, dec!(800)));
        let seller = organization("org@example.org", "Green Collective");

        let order = state
            .create_sell_order(&seller, "p1", 20, dec!(900), OrderVisibility::Public)
            .unwrap();

        assert_eq!(order.tons, 20);
        assert_eq!(order.price_per_ton, dec!(900));
        assert_eq!(order.status, OrderStatus::Open);
        assert_eq!(order.seller_id, "org@example.org");

        let lot = &state.portfolio[0];
        assert_eq!(lot.tons, 30);
        assert_eq!(lot.status, HoldingStatus::Listed);
    }

    #[test]
    fn individuals_cannot_list_credits() {
        let mut state = SettlementState::new();
        state.portfolio.push(owned_lot("p1", 50, dec!(800)));

        let err = state
            .create_sell_order(
                &individual("ravi@example.org"),
                "p1",
                20,
                dec!(900),
                OrderVisibility::Public,
            )
            .unwrap_err();

        assert_eq!(err, SettlementError::SellerNotOrganization);
        assert_eq!(state.portfolio[0].status, HoldingStatus::Owned);
        assert!(state.sell_orders.is_empty());
    }

    #[test]
    fn listing_more_than_owned_is_rejected_without_mutation() {
        let mut state = SettlementState::new();
        state.portfolio.push(owned_lot("p1", 50, dec!(800)));
        let seller = organization("org@example.org", "Green Collective");

        let err = state
            .create_sell_order(&seller, "p1", 60, dec!(900), OrderVisibility::Public)
            .unwrap_err();

        assert_eq!(
            err,
            SettlementError::QuantityExceedsAvailable {
                requested: 60,
                available: 50,
            }
        );
        assert_eq!(state.portfolio[0].tons, 50);
        assert_eq!(state.portfolio[0].status, HoldingStatus::Owned);
    }

    #[test]
    fn full_fill_closes_the_order_and_records_the_counterparty() {
        let mut seller_state = SettlementState::new();
        seller_state.portfolio.push(owned_lot("p1", 50, dec!(800)));
        let seller = organization("org@example.org", "Green Collective");
        let order = seller_state
            .create_sell_order(&seller, "p1", 20, dec!(900), OrderVisibility::Public)
            .unwrap();

        // Buyer sees the same shared book.
        let mut buyer_state =
            SettlementState::from_parts(Vec::new(), Vec::new(), seller_state.sell_orders.clone());
        let intent = TradeIntent::buy_from_listing(&order, 20).unwrap();
        let outcome = buyer_state.confirm_buy(&intent).unwrap();

        let filled = &buyer_state.sell_orders[0];
        assert_eq!(filled.tons, 0);
        assert_eq!(filled.status, OrderStatus::Filled);

        assert_eq!(buyer_state.holding_tons("p1", HoldingStatus::Owned), 20);
        assert_eq!(buyer_state.portfolio[0].price_per_ton, dec!(900));
        assert_eq!(
            outcome.transaction.counterparty.as_deref(),
            Some("Green Collective")
        );
        assert_eq!(outcome.transaction.total_value, dec!(18000));
        assert!(outcome.order_book_changed);
    }

    #[test]
    fn partial_fill_leaves_the_order_open() {
        let mut state = SettlementState::new();
        state.portfolio.push(owned_lot("p1", 50, dec!(800)));
        let seller = organization("org@example.org", "Green Collective");
        let order = state
            .create_sell_order(&seller, "p1", 20, dec!(900), OrderVisibility::Public)
            .unwrap();

        let status = state.fill_listing(order.id, 8).unwrap();

        assert_eq!(status, OrderStatus::Open);
        assert_eq!(state.sell_orders[0].tons, 12);
    }

    #[test]
    fn confirm_revalidates_against_the_live_order() {
        let mut state = SettlementState::new();
        state.portfolio.push(owned_lot("p1", 50, dec!(800)));
        let seller = organization("org@example.org", "Green Collective");
        let order = state
            .create_sell_order(&seller, "p1", 20, dec!(900), OrderVisibility::Public)
            .unwrap();

        // Intent built while 20 tons were on offer.
        let intent = TradeIntent::buy_from_listing(&order, 10).unwrap();
        // Another buyer drains the order down to 5 in the meantime.
        state.fill_listing(order.id, 15).unwrap();

        let transactions_before = state.transactions.len();
        let err = state.confirm_buy(&intent).unwrap_err();

        assert_eq!(
            err,
            SettlementError::QuantityExceedsAvailable {
                requested: 10,
                available: 5,
            }
        );
        assert_eq!(state.transactions.len(), transactions_before);
        assert_eq!(state.sell_orders[0].tons, 5);
    }

    #[test]
    fn cancelling_an_open_order_is_idempotent() {
        let mut state = SettlementState::new();
        state.portfolio.push(owned_lot("p1", 50, dec!(800)));
        let seller = organization("org@example.org", "Green Collective");
        let order = state
            .create_sell_order(&seller, "p1", 20, dec!(900), OrderVisibility::Public)
            .unwrap();

        assert_eq!(
            state.cancel_sell_order(order.id).unwrap(),
            OrderStatus::Cancelled
        );
        assert_eq!(
            state.cancel_sell_order(order.id).unwrap(),
            OrderStatus::Cancelled
        );
        // Listed tons stay listed; cancellation does no portfolio reversal.
        assert_eq!(state.portfolio[0].status, HoldingStatus::Listed);
        assert_eq!(state.portfolio[0].tons, 30);
    }

    #[test]
    fn filled_and_missing_orders_cannot_be_cancelled() {
        let mut state = SettlementState::new();
        state.portfolio.push(owned_lot("p1", 50, dec!(800)));
        let seller = organization("org@example.org", "Green Collective");
        let order = state
            .create_sell_order(&seller, "p1", 20, dec!(900), OrderVisibility::Public)
            .unwrap();
        state.fill_listing(order.id, 20).unwrap();

        assert_eq!(
            state.cancel_sell_order(order.id).unwrap_err(),
            SettlementError::ListingNotOpen(order.id)
        );

        let missing = Uuid::new_v4();
        assert_eq!(
            state.cancel_sell_order(missing).unwrap_err(),
            SettlementError::OrderNotFound(missing)
        );
    }

    #[test]
    fn intent_constructors_reject_bad_quantities() {
        let project = project("p1", dec!(800), 100);
        assert_eq!(
            TradeIntent::buy_from_catalog(&project, 0, dec!(800), false).unwrap_err(),
            SettlementError::QuantityNotPositive
        );
        assert_eq!(
            TradeIntent::buy_from_catalog(&project, 101, dec!(800), false).unwrap_err(),
            SettlementError::QuantityExceedsAvailable {
                requested: 101,
                available: 100,
            }
        );

        let mut state = SettlementState::new();
        state.portfolio.push(owned_lot("p1", 50, dec!(800)));
        let seller = organization("org@example.org", "Green Collective");
        let order = state
            .create_sell_order(&seller, "p1", 20, dec!(900), OrderVisibility::Public)
            .unwrap();
        state.cancel_sell_order(order.id).unwrap();

        let cancelled = state.sell_orders[0].clone();
        assert_eq!(
            TradeIntent::buy_from_listing(&cancelled, 5).unwrap_err(),
            SettlementError::ListingNotOpen(cancelled.id)
        );
    }

    #[test]
    fn market_view_hides_own_private_and_closed_listings() {
        let mut state = SettlementState::new();
        state.portfolio.push(owned_lot("p1", 100, dec!(800)));
        state.portfolio.push(owned_lot("p2", 100, dec!(800)));
        state.portfolio.push(owned_lot("p3", 100, dec!(800)));
        let seller = organization("org@example.org", "Green Collective");

        let public = state
            .create_sell_order(&seller, "p1", 10, dec!(900), OrderVisibility::Public)
            .unwrap();
        state
            .create_sell_order(&seller, "p2", 10, dec!(900), OrderVisibility::Private)
            .unwrap();
        let cancelled = state
            .create_sell_order(&seller, "p3", 10, dec!(900), OrderVisibility::Public)
            .unwrap();
        state.cancel_sell_order(cancelled.id).unwrap();

        let market = state.market_listings_for("buyer@example.org");
        assert_eq!(market.len(), 1);
        assert_eq!(market[0].id, public.id);

        assert!(state.market_listings_for("org@example.org").is_empty());
        assert_eq!(state.own_listings("org@example.org").len(), 2);
    }

    #[test]
    fn portfolio_summary_totals_by_status() {
        let mut state = SettlementState::new();
        state.portfolio.push(owned_lot("p1", 40, dec!(800)));
        state.portfolio.push(owned_lot("p2", 10, dec!(650)));
        let project = project("p3", dec!(900), 1_000);
        let retire = TradeIntent::buy_from_catalog(&project, 5, dec!(900), true).unwrap();
        state.confirm_buy(&retire).unwrap();
        let seller = organization("org@example.org", "Green Collective");
        state
            .create_sell_order(&seller, "p2", 4, dec!(700), OrderVisibility::Public)
            .unwrap();

        let summary = state.portfolio_summary();
        assert_eq!(summary.owned_tons, 40);
        assert_eq!(summary.listed_tons, 6);
        assert_eq!(summary.retired_tons, 5);
        assert_eq!(summary.owned_value, dec!(32000));
    }
}
