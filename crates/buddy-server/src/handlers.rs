use axum::extract::State;
use axum::Json;
use buddy_client::telegram::{TelegramUpdate, WebhookInfo};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;

use crate::error::ApiError;
use crate::state::AppState;

pub const WEBHOOK_PATH: &str = "/telegram/webhook";

/// Webhook status as exposed by this API.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookInfoView {
    pub url: String,
    pub has_custom_certificate: bool,
    pub pending_update_count: u32,
    pub last_error_date: Option<i64>,
    pub last_error_message: Option<String>,
    pub max_connections: Option<u32>,
    pub allowed_updates: Option<Vec<String>>,
}

impl From<WebhookInfo> for WebhookInfoView {
    fn from(info: WebhookInfo) -> Self {
        Self {
            url: info.url,
            has_custom_certificate: info.has_custom_certificate,
            pending_update_count: info.pending_update_count,
            last_error_date: info.last_error_date,
            last_error_message: info.last_error_message,
            max_connections: info.max_connections,
            allowed_updates: info.allowed_updates,
        }
    }
}

pub async fn health() -> Json<Value> {
    Json(json!({
        "success": true,
        "message": "WeightBuddy API is running",
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }))
}

pub async fn send_inspiration(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let result = state.inspiration.send_daily_inspiration().await?;
    info!("Sent {} inspiration via API", result.category);

    Ok(Json(json!({
        "success": true,
        "data": result,
    })))
}

pub async fn telegram_webhook(
    State(state): State<AppState>,
    Json(update): Json<TelegramUpdate>,
) -> Result<Json<Value>, ApiError> {
    state
        .bot
        .handle_update(update)
        .await
        .map_err(|e| ApiError::internal("Failed to process Telegram update", e))?;

    Ok(Json(json!({ "success": true })))
}

pub async fn setup_webhook(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let Some(base_url) = state.webhook_base_url.as_deref().filter(|u| !u.is_empty()) else {
        return Err(ApiError::internal(
            "Failed to set up webhook",
            buddy_core::BuddyError::ConfigError("WEBHOOK_BASE_URL is not configured".to_string()),
        ));
    };
    let webhook_url = format!("{}{}", base_url.trim_end_matches('/'), WEBHOOK_PATH);

    state
        .webhooks
        .set_webhook(&webhook_url)
        .await
        .map_err(|e| ApiError::internal("Failed to set up webhook", e))?;
    let webhook_info = state
        .webhooks
        .get_webhook_info()
        .await
        .map_err(|e| ApiError::internal("Failed to set up webhook", e))?;

    Ok(Json(json!({
        "success": true,
        "message": "Webhook set up successfully",
        "webhookInfo": WebhookInfoView::from(webhook_info),
    })))
}

pub async fn remove_webhook(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    state
        .webhooks
        .delete_webhook()
        .await
        .map_err(|e| ApiError::internal("Failed to remove webhook", e))?;

    Ok(Json(json!({
        "success": true,
        "message": "Webhook removed successfully",
    })))
}

pub async fn webhook_info(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let info = state
        .webhooks
        .get_webhook_info()
        .await
        .map_err(|e| ApiError::internal("Failed to get webhook info", e))?;

    Ok(Json(json!({
        "success": true,
        "webhookInfo": WebhookInfoView::from(info),
    })))
}

pub async fn not_found() -> ApiError {
    ApiError::not_found()
}
