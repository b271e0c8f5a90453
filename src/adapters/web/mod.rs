//! Web dashboard adapter.
//!
//! Axum server with an HTMX-friendly frontend for browsing account
//! dashboards and logging trades from a browser.

mod error;
mod handlers;
mod templates;

pub use error::WebError;
pub use handlers::TradeFormData;

use axum::{
    routing::{get, post},
    Router,
};
use chrono::NaiveDate;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::domain::dashboard::DEFAULT_RECENT_TRADES;
use crate::domain::error::JournalError;
use crate::domain::risk::RiskPlan;
use crate::ports::journal_store::JournalStore;

pub struct AppState {
    pub store: Arc<dyn JournalStore>,
    /// Risk parameters; the initial capital comes from each account.
    pub plan: RiskPlan,
    pub recent_trades: usize,
    /// Fixed "today" for deterministic dashboards; the local date otherwise.
    pub today: Option<NaiveDate>,
}

impl AppState {
    pub fn new(store: Arc<dyn JournalStore>, plan: RiskPlan) -> Self {
        Self {
            store,
            plan,
            recent_trades: DEFAULT_RECENT_TRADES,
            today: None,
        }
    }

    pub fn with_recent_trades(mut self, count: usize) -> Self {
        self.recent_trades = count;
        self
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    fn today(&self) -> NaiveDate {
        self.today
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::list_accounts))
        .route("/accounts/{name}", get(handlers::account_dashboard))
        .route("/accounts/{name}/trades/new", get(handlers::trade_form))
        .route("/accounts/{name}/trades", post(handlers::create_trade))
        .route(
            "/accounts/{name}/trades/{id}/delete",
            post(handlers::delete_trade),
        )
        .route("/accounts/{name}/equity.svg", get(handlers::equity_chart_svg))
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Binds `listen` and serves until the process is stopped.
pub async fn serve(state: AppState, listen: &str) -> Result<(), JournalError> {
    let listener = tokio::net::TcpListener::bind(listen).await?;
    info!(address = %listener.local_addr()?, "web dashboard listening");
    axum::serve(listener, build_router(state)).await?;
    Ok(())
}

fn is_htmx_request(headers: &axum::http::HeaderMap) -> bool {
    headers.get("HX-Request").is_some()
}
