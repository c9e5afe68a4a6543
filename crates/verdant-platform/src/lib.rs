pub mod config;
pub mod contracts;
pub mod redis_kv;

pub use config::ServiceConfig;
pub use contracts::{
    OrderBookResponse, ReplaceOrderBookRequest, SigninRequest, SigninResponse, SignupRequest,
    SignupResponse, TransactionListResponse, UserDataResponse,
};
pub use redis_kv::RedisKv;
