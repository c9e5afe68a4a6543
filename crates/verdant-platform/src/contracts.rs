use serde::{Deserialize, Serialize};
use verdant_core::{PortfolioItem, SellOrder, Transaction, UserProfile, UserType};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    /// Credential handled by the identity collaborator; accepted on the
    /// wire for compatibility and never stored.
    pub password: Option<String>,
    pub user_type: UserType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupResponse {
    pub user: UserProfile,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SigninRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SigninResponse {
    pub user: UserProfile,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDataResponse {
    pub portfolio: Vec<PortfolioItem>,
    pub transactions: Vec<Transaction>,
    pub sell_orders: Vec<SellOrder>,
    pub order_book_version: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionListResponse {
    pub transactions: Vec<Transaction>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderBookResponse {
    pub version: u64,
    pub orders: Vec<SellOrder>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplaceOrderBookRequest {
    pub expected_version: u64,
    pub orders: Vec<SellOrder>,
}
