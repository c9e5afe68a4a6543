use uuid::Uuid;

/// Validation taxonomy for settlement operations. Every operation checks
/// its bounds before touching state, so a returned error implies no
/// mutation happened.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum SettlementError {
    #[error("quantity must be a positive number of tons")]
    QuantityNotPositive,
    #[error("requested {requested} tons but only {available} are available")]
    QuantityExceedsAvailable { requested: u32, available: u32 },
    #[error("listing {0} not found in the order book")]
    OrderNotFound(Uuid),
    #[error("listing {0} is no longer open")]
    ListingNotOpen(Uuid),
    #[error("no owned holding of that project to list from")]
    LotNotSellable,
    #[error("only organization accounts can list credits for sale")]
    SellerNotOrganization,
    #[error("no trade is in flight")]
    NoTradeInFlight,
}
