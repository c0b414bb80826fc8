// Transfer Ledger - Web Server
// REST API over a single shared ledger session

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, put},
    Router,
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::CorsLayer;
use tracing::{error, info};
use transfer_ledger::{
    logging, Account, AccountType, BalanceDrift, Config, LedgerError, MonthlyVolumeReport,
    Recipient, Session, SqliteStore, Transfer,
};

type SharedSession = Arc<Mutex<Session<SqliteStore>>>;

/// Shared application state
#[derive(Clone)]
struct AppState {
    session: SharedSession,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let body = ApiResponse {
        success: false,
        data: serde_json::Value::Null,
        error: Some(message.into()),
    };
    (status, Json(body)).into_response()
}

impl From<LedgerError> for ApiError {
    fn from(e: LedgerError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

enum ApiError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(msg) => error_response(StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => error_response(StatusCode::NOT_FOUND, msg),
            ApiError::Internal(msg) => error_response(StatusCode::INTERNAL_SERVER_ERROR, msg),
        }
    }
}

fn lock(state: &AppState) -> Result<MutexGuard<'_, Session<SqliteStore>>, ApiError> {
    state.session.lock().map_err(|_| {
        error!("session mutex poisoned");
        ApiError::Internal("ledger session unavailable".to_string())
    })
}

// ============================================================================
// Request / response bodies
// ============================================================================

#[derive(Deserialize)]
struct AccountRequest {
    name: String,
    #[serde(rename = "type")]
    account_type: String,
}

impl AccountRequest {
    fn validate(self) -> Result<(String, AccountType), ApiError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(ApiError::BadRequest("account name must not be empty".to_string()));
        }
        Ok((name, self.account_type.parse()?))
    }
}

#[derive(Deserialize)]
struct AccountQuery {
    #[serde(rename = "type")]
    account_type: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransferRequest {
    source_account_id: String,
    /// YYYY-MM-DD; today when omitted
    date: Option<String>,
    recipients: Vec<Recipient>,
}

impl TransferRequest {
    fn validate(self) -> Result<(String, NaiveDate, Vec<Recipient>), ApiError> {
        let date = match self.date {
            Some(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                .map_err(|_| LedgerError::InvalidDate(raw.clone()))?,
            None => Local::now().date_naive(),
        };

        let recipients = self
            .recipients
            .into_iter()
            .map(|r| Recipient::checked(r.account_id, r.amount))
            .collect::<Result<Vec<_>, _>>()?;

        Ok((self.source_account_id, date, recipients))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AccountsResponse {
    accounts: Vec<Account>,
    total_balance: f64,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/accounts?type= - List accounts, optionally of one type
async fn list_accounts(
    State(state): State<AppState>,
    Query(query): Query<AccountQuery>,
) -> Result<Json<ApiResponse<AccountsResponse>>, ApiError> {
    let filter = query
        .account_type
        .map(|t| t.parse::<AccountType>())
        .transpose()?;

    let session = lock(&state)?;
    let accounts: Vec<Account> = session
        .ledger()
        .accounts_of_type(filter)
        .into_iter()
        .cloned()
        .collect();
    let total_balance = accounts.iter().map(|a| a.balance()).sum();

    Ok(Json(ApiResponse::ok(AccountsResponse {
        accounts,
        total_balance,
    })))
}

/// POST /api/accounts - Create an account with zero balance
async fn create_account(
    State(state): State<AppState>,
    Json(request): Json<AccountRequest>,
) -> Result<Response, ApiError> {
    let (name, account_type) = request.validate()?;
    let account = lock(&state)?.add_account(name, account_type);
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(account))).into_response())
}

/// PUT /api/accounts/:id - Rename and/or retype; balance untouched
async fn update_account(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<AccountRequest>,
) -> Result<Json<ApiResponse<Account>>, ApiError> {
    let (name, account_type) = request.validate()?;
    let mut session = lock(&state)?;

    if !session.update_account(&id, name, account_type) {
        return Err(ApiError::NotFound(format!("no account with id {}", id)));
    }

    let updated = session.ledger().account(&id).cloned();
    updated
        .map(|a| Json(ApiResponse::ok(a)))
        .ok_or_else(|| ApiError::NotFound(format!("no account with id {}", id)))
}

/// DELETE /api/accounts/:id - Remove the account; transfer history stays
async fn delete_account(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Account>>, ApiError> {
    let removed = lock(&state)?.delete_account(&id);
    removed
        .map(|a| Json(ApiResponse::ok(a)))
        .ok_or_else(|| ApiError::NotFound(format!("no account with id {}", id)))
}

/// GET /api/transfers - The full transfer log, oldest first
async fn list_transfers(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Transfer>>>, ApiError> {
    let transfers = lock(&state)?.ledger().transfers().as_slice().to_vec();
    Ok(Json(ApiResponse::ok(transfers)))
}

/// POST /api/transfers - Apply a transfer and append it to the log
async fn create_transfer(
    State(state): State<AppState>,
    Json(request): Json<TransferRequest>,
) -> Result<Response, ApiError> {
    let (source, date, recipients) = request.validate()?;
    let transfer = lock(&state)?.apply_transfer(&source, date, recipients);
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(transfer))).into_response())
}

/// GET /api/reports/monthly-volume - Amount received per account per month
async fn monthly_volume(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<MonthlyVolumeReport>>, ApiError> {
    let report = lock(&state)?.monthly_volume();
    Ok(Json(ApiResponse::ok(report)))
}

/// GET /api/audit - Accounts whose balance disagrees with the transfer log
async fn audit(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<BalanceDrift>>>, ApiError> {
    let drift = lock(&state)?.audit();
    Ok(Json(ApiResponse::ok(drift)))
}

fn app(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/accounts", get(list_accounts).post(create_account))
        .route("/accounts/:id", put(update_account).delete(delete_account))
        .route("/transfers", get(list_transfers).post(create_transfer))
        .route("/reports/monthly-volume", get(monthly_volume))
        .route("/audit", get(audit))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();
    logging::init(&config.log_filter);

    let store = SqliteStore::open(&config.db_path)?;
    info!(path = %config.db_path.display(), "database opened");

    let session: SharedSession = Arc::new(Mutex::new(Session::open(store)));
    let state = AppState {
        session: Arc::clone(&session),
    };

    let listener = tokio::net::TcpListener::bind(&config.server_addr).await?;
    info!(addr = %config.server_addr, "server running; press Ctrl+C to stop");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    // Final flush once every handler has released its clone
    match Arc::try_unwrap(session) {
        Ok(mutex) => match mutex.into_inner() {
            Ok(session) => {
                session.close();
            }
            Err(_) => error!("session mutex poisoned; skipping final flush"),
        },
        Err(_) => error!("session still shared at shutdown; skipping final flush"),
    }

    Ok(())
}
