use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result as AnyResult;
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::Utc;
use tracing::{error, info};
use verdant_core::{LedgerError, PortfolioItem, SellOrder, TradeLedger, Transaction, UserProfile};
use verdant_platform::{
    OrderBookResponse, RedisKv, ReplaceOrderBookRequest, ServiceConfig, SigninRequest,
    SigninResponse, SignupRequest, SignupResponse, TransactionListResponse, UserDataResponse,
};
use verdant_store::KvTradeLedger;

#[derive(Clone)]
struct AppState {
    ledger: Arc<dyn TradeLedger>,
}

#[tokio::main]
async fn main() -> AnyResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "verdant_gateway=info".to_string()),
        )
        .init();

    let config = ServiceConfig::from_env("0.0.0.0:8080")?;
    let store = RedisKv::connect(&config.redis_url, &config.store_namespace)?;
    let ledger: Arc<dyn TradeLedger> = Arc::new(KvTradeLedger::new(Arc::new(store)));

    let state = AppState { ledger };
    let router = app_router(state);

    let addr: SocketAddr = config.http_addr.parse()?;
    info!("trade ledger listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}

fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/signup", post(signup))
        .route("/signin", post(signin))
        .route("/user-data/{email}", get(user_data))
        .route("/portfolio/{email}", post(update_portfolio))
        .route("/transactions/{email}", post(add_transaction))
        .route(
            "/sell-orders",
            get(get_sell_orders)
                .post(create_sell_order)
                .put(replace_sell_orders),
        )
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<(StatusCode, Json<SignupResponse>), (StatusCode, String)> {
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "name is required".to_string()));
    }
    let email = normalize_email(&payload.email).map_err(invalid_request)?;

    let existing = state
        .ledger
        .read_profile(&email)
        .await
        .map_err(internal_error)?;
    if existing.is_some() {
        return Err((
            StatusCode::CONFLICT,
            format!("an account already exists for {email}"),
        ));
    }

    let profile = UserProfile {
        name,
        email: email.clone(),
        user_type: payload.user_type,
        created_at: Utc::now(),
    };
    state
        .ledger
        .write_profile(&profile)
        .await
        .map_err(internal_error)?;
    state
        .ledger
        .init_user_collections(&email)
        .await
        .map_err(internal_error)?;

    Ok((StatusCode::CREATED, Json(SignupResponse { user: profile })))
}

async fn signin(
    State(state): State<AppState>,
    Json(payload): Json<SigninRequest>,
) -> Result<Json<SigninResponse>, (StatusCode, String)> {
    let email = normalize_email(&payload.email).map_err(invalid_request)?;

    let profile = state
        .ledger
        .read_profile(&email)
        .await
        .map_err(internal_error)?;

    match profile {
        Some(user) => Ok(Json(SigninResponse { user })),
        None => Err((StatusCode::NOT_FOUND, "user not found".to_string())),
    }
}

async fn user_data(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<UserDataResponse>, (StatusCode, String)> {
    let email = normalize_email(&email).map_err(invalid_request)?;

    let portfolio = state
        .ledger
        .read_portfolio(&email)
        .await
        .map_err(internal_error)?;
    let transactions = state
        .ledger
        .read_transactions(&email)
        .await
        .map_err(internal_error)?;
    let book = state
        .ledger
        .read_order_book()
        .await
        .map_err(internal_error)?;

    Ok(Json(UserDataResponse {
        portfolio,
        transactions,
        sell_orders: book.orders,
        order_book_version: book.version,
    }))
}

/// Whole-array overwrite; the owning session is the only writer of this
/// key, so no version check is needed.
async fn update_portfolio(
    State(state): State<AppState>,
    Path(email): Path<String>,
    Json(portfolio): Json<Vec<PortfolioItem>>,
) -> Result<Json<Vec<PortfolioItem>>, (StatusCode, String)> {
    let email = normalize_email(&email).map_err(invalid_request)?;

    state
        .ledger
        .write_portfolio(&email, &portfolio)
        .await
        .map_err(internal_error)?;

    Ok(Json(portfolio))
}

async fn add_transaction(
    State(state): State<AppState>,
    Path(email): Path<String>,
    Json(entry): Json<Transaction>,
) -> Result<Json<TransactionListResponse>, (StatusCode, String)> {
    let email = normalize_email(&email).map_err(invalid_request)?;

    let transactions = state
        .ledger
        .append_transaction(&email, &entry)
        .await
        .map_err(internal_error)?;

    Ok(Json(TransactionListResponse { transactions }))
}

async fn get_sell_orders(
    State(state): State<AppState>,
) -> Result<Json<OrderBookResponse>, (StatusCode, String)> {
    let book = state
        .ledger
        .read_order_book()
        .await
        .map_err(internal_error)?;

    Ok(Json(OrderBookResponse {
        version: book.version,
        orders: book.orders,
    }))
}

async fn create_sell_order(
    State(state): State<AppState>,
    Json(order): Json<SellOrder>,
) -> Result<(StatusCode, Json<OrderBookResponse>), (StatusCode, String)> {
    let book = state
        .ledger
        .append_order(&order)
        .await
        .map_err(internal_error)?;

    Ok((
        StatusCode::CREATED,
        Json(OrderBookResponse {
            version: book.version,
            orders: book.orders,
        }),
    ))
}

async fn replace_sell_orders(
    State(state): State<AppState>,
    Json(payload): Json<ReplaceOrderBookRequest>,
) -> Result<Json<OrderBookResponse>, (StatusCode, String)> {
    let book = state
        .ledger
        .replace_order_book(&payload.orders, payload.expected_version)
        .await
        .map_err(|err| match err {
            LedgerError::StaleVersion { .. } => (StatusCode::CONFLICT, err.to_string()),
            LedgerError::Store(err) => internal_error(err),
        })?;

    Ok(Json(OrderBookResponse {
        version: book.version,
        orders: book.orders,
    }))
}

fn normalize_email(raw: &str) -> anyhow::Result<String> {
    let email = raw.trim().to_ascii_lowercase();
    if email.is_empty() || !email.contains('@') {
        anyhow::bail!("a valid email is required");
    }
    Ok(email)
}

fn invalid_request(err: impl std::fmt::Display) -> (StatusCode, String) {
    (StatusCode::BAD_REQUEST, err.to_string())
}

fn internal_error<E: std::fmt::Display>(err: E) -> (StatusCode, String) {
    error!("store operation failed: {err}");
    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}
