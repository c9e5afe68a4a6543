pub mod engine;
pub mod error;
pub mod intent;
pub mod session;

pub use engine::{PortfolioSummary, SettlementState, TradeOutcome};
pub use error::SettlementError;
pub use intent::{TradeIntent, TradeSource};
pub use session::TradingSession;
