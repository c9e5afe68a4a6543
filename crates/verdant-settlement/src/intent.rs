use rust_decimal::Decimal;
use verdant_core::{OrderStatus, Project, SellOrder};

use crate::error::SettlementError;

/// Where a buy sources its credits: the primary market (catalog project)
/// or the secondary market (another holder's listing).
#[derive(Debug, Clone)]
pub enum TradeSource {
    Catalog(Project),
    Listing(SellOrder),
}

/// In-flight trade intent. Lives between initiate and confirm/cancel and
/// is discarded on every exit path; never persisted.
#[derive(Debug, Clone)]
pub struct TradeIntent {
    pub source: TradeSource,
    pub tons: u32,
    pub price_per_ton: Decimal,
    pub total_cost: Decimal,
    pub retire: bool,
}

impl TradeIntent {
    /// Pure construction; no state is touched until confirmation.
    pub fn buy_from_catalog(
        project: &Project,
        tons: u32,
        price_per_ton: Decimal,
        retire: bool,
    ) -> Result<Self, SettlementError> {
        if tons == 0 {
            return Err(SettlementError::QuantityNotPositive);
        }
        if tons > project.available_credits {
            return Err(SettlementError::QuantityExceedsAvailable {
                requested: tons,
                available: project.available_credits,
            });
        }

        Ok(Self {
            source: TradeSource::Catalog(project.clone()),
            tons,
            price_per_ton,
            total_cost: price_per_ton * Decimal::from(tons),
            retire,
        })
    }

    /// Secondary-market buys always trade at the listing's price.
    pub fn buy_from_listing(order: &SellOrder, tons: u32) -> Result<Self, SettlementError> {
        if order.status != OrderStatus::Open {
            return Err(SettlementError::ListingNotOpen(order.id));
        }
        if tons == 0 {
            return Err(SettlementError::QuantityNotPositive);
        }
        if tons > order.tons {
            return Err(SettlementError::QuantityExceedsAvailable {
                requested: tons,
                available: order.tons,
            });
        }

        Ok(Self {
            source: TradeSource::Listing(order.clone()),
            tons,
            price_per_ton: order.price_per_ton,
            total_cost: order.price_per_ton * Decimal::from(tons),
            retire: false,
        })
    }

    /// `(project_id, project_name, project_type)` resolved from the source.
    pub fn project_fields(&self) -> (&str, &str, &str) {
        match &self.source {
            TradeSource::Catalog(project) => {
                (&project.id, &project.name, &project.project_type)
            }
            TradeSource::Listing(order) => {
                (&order.project_id, &order.project_name, &order.project_type)
            }
        }
    }

    /// Seller on the other side, present only for secondary-market buys.
    pub fn counterparty(&self) -> Option<String> {
        match &self.source {
            TradeSource::Catalog(_) => None,
            TradeSource::Listing(order) => Some(order.seller_name.clone()),
        }
    }
}
