//! HTTP request handlers for web adapter.

use askama::Template;
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::info;

use crate::adapters::typst_report::chart_svg::generate_equity_svg;
use crate::domain::dashboard::Dashboard;
use crate::domain::error::JournalError;
use crate::domain::ledger::Ledger;
use crate::domain::trade::{parse_flags, NewTrade};

use super::templates::{
    flag_options, AccountRow, AccountsTemplate, DashboardTemplate, PageTemplate,
    TradeFormTemplate,
};
use super::{is_htmx_request, AppState, WebError};

/// Returns the bare fragment for HTMX requests, otherwise the full page.
fn respond(
    headers: &HeaderMap,
    status: StatusCode,
    title: &str,
    content: String,
) -> Result<Response, WebError> {
    if is_htmx_request(headers) {
        return Ok((status, Html(content)).into_response());
    }
    let page = PageTemplate {
        title,
        content: &content,
    }
    .render()?;
    Ok((status, Html(page)).into_response())
}

fn dashboard_url(account: &str) -> String {
    format!("/accounts/{account}")
}

pub async fn list_accounts(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, WebError> {
    let mut rows = Vec::new();
    for account in state.store.list_accounts()? {
        let trades = state.store.load_trades(&account.name)?;
        rows.push(AccountRow::from_ledger(&Ledger::new(account, trades)));
    }
    let content = AccountsTemplate { accounts: &rows }.render()?;
    respond(&headers, StatusCode::OK, "Accounts", content)
}

pub async fn account_dashboard(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    headers: HeaderMap,
) -> Result<Response, WebError> {
    let dashboard = state.dashboard(&name)?;
    let content = DashboardTemplate::from_dashboard(&dashboard).render()?;
    respond(&headers, StatusCode::OK, &name, content)
}

pub async fn trade_form(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    headers: HeaderMap,
) -> Result<Response, WebError> {
    let account = state.store.require_account(&name)?;
    let content = TradeFormTemplate::blank(&account.name, state.today()).render()?;
    respond(&headers, StatusCode::OK, "Log a trade", content)
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct TradeFormData {
    pub date: String,
    pub instrument: String,
    pub direction: String,
    pub pnl: String,
    #[serde(default)]
    pub risk: String,
    #[serde(default)]
    pub flags: String,
    #[serde(default)]
    pub feedback: String,
}

impl TradeFormData {
    pub fn to_new_trade(&self) -> Result<NewTrade, JournalError> {
        let date = NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d")
            .map_err(|_| JournalError::invalid_trade(format!("invalid date '{}'", self.date)))?;
        let pnl = self
            .pnl
            .trim()
            .parse::<f64>()
            .map_err(|_| JournalError::invalid_trade(format!("invalid P/L '{}'", self.pnl)))?;
        let risk = match self.risk.trim() {
            "" => 0.0,
            value => value
                .parse::<f64>()
                .map_err(|_| JournalError::invalid_trade(format!("invalid risk '{value}'")))?,
        };
        Ok(NewTrade {
            date,
            instrument: self.instrument.clone(),
            direction: self.direction.parse()?,
            pnl,
            risk,
            flags: parse_flags(&self.flags)?,
            feedback: self.feedback.clone(),
        })
    }
}

pub async fn create_trade(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    headers: HeaderMap,
    Form(form): Form<TradeFormData>,
) -> Result<Response, WebError> {
    let account = state.store.require_account(&name)?;
    let result = form
        .to_new_trade()
        .and_then(|trade| state.store.append_trade(&account.name, trade));

    match result {
        Ok(entry) => {
            info!(account = %account.name, id = entry.id, pnl = entry.pnl, "trade logged");
            Ok(Redirect::to(&dashboard_url(&account.name)).into_response())
        }
        Err(err @ JournalError::InvalidTrade { .. }) => {
            let content = TradeFormTemplate {
                account: &account.name,
                error: Some(err.to_string()),
                date: form.date,
                instrument: form.instrument,
                direction: form.direction,
                pnl: form.pnl,
                risk: form.risk,
                flags: form.flags,
                feedback: form.feedback,
                flag_options: flag_options(),
            }
            .render()?;
            respond(&headers, StatusCode::BAD_REQUEST, "Log a trade", content)
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn delete_trade(
    State(state): State<Arc<AppState>>,
    Path((name, id)): Path<(String, u64)>,
) -> Result<Response, WebError> {
    let account = state.store.require_account(&name)?;
    let removed = state.store.delete_trade(&account.name, id)?;
    info!(account = %account.name, id = removed.id, "trade deleted");
    Ok(Redirect::to(&dashboard_url(&account.name)).into_response())
}

pub async fn equity_chart_svg(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Response, WebError> {
    let account = state.store.require_account(&name)?;
    let trades = state.store.load_trades(&account.name)?;
    let svg = generate_equity_svg(&Ledger::new(account, trades).equity_curve());
    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], svg).into_response())
}

pub async fn not_found() -> WebError {
    WebError::not_found("page not found")
}

impl AppState {
    pub(super) fn dashboard(&self, name: &str) -> Result<Dashboard, JournalError> {
        let account = self.store.require_account(name)?;
        let trades = self.store.load_trades(&account.name)?;
        Ok(Dashboard::build(account, trades, &self.plan, self.today())
            .with_recent_count(self.recent_trades))
    }
}
