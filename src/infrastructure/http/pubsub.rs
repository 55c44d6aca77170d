use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{error, info, warn};
use crate::application::ingestion_service::TriggerError;
use super::AppState;

pub const SUCCESS_BODY: &str = "CSV processed successfully";

/// `POST /process-csv`
pub async fn process_csv(State(state): State<AppState>, body: Bytes) -> Response {
    match state.service.handle_body(&body).await {
        Ok(report) => {
            info!(
                rows = report.rows,
                products_created = report.products_created,
                items_created = report.items_created,
                items_updated = report.items_updated,
                "{}",
                report.message()
            );
            (StatusCode::OK, SUCCESS_BODY).into_response()
        }
        Err(e) => e.into_response(),
    }
}

impl IntoResponse for TriggerError {
    fn into_response(self) -> Response {
        match self {
            TriggerError::Decode(e) => {
                warn!("Rejected trigger: {}", e);
                (StatusCode::BAD_REQUEST, e.to_string()).into_response()
            }
            TriggerError::Reconcile(e) => {
                error!("Reconciliation failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Error processing CSV: {}", e),
                )
                    .into_response()
            }
            TriggerError::Unexpected(text) => {
                error!("Unexpected trigger failure: {}", text);
                (StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {}", text)).into_response()
            }
        }
    }
}
