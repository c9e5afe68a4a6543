pub mod models;
pub mod storage;

pub use models::{
    HoldingStatus, OrderStatus, OrderVisibility, PortfolioItem, Project, SellOrder, Transaction,
    TransactionKind, UserProfile, UserType,
};
pub use storage::{KvStore, LedgerError, OrderBookSnapshot, TradeLedger};
