//! Export Routes
//!
//! Data export endpoint for backup and analysis.
//!
//! - GET /api/v1/export?format=csv|json - Every log of the caller

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use std::sync::Arc;

use crate::api::dto::ExportParams;
use crate::api::error::{ApiError, ApiResult};
use crate::api::identity::CurrentUser;
use crate::api::state::AppState;
use crate::storage::DrinkLog;

/// GET /api/v1/export
pub async fn export_logs(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Query(params): Query<ExportParams>,
) -> ApiResult<Response> {
    // Check if export is enabled
    if !state.config.enable_export {
        return Err(ApiError::Validation(
            "Export feature is disabled".to_string(),
        ));
    }

    let format = params.format.to_lowercase();
    let logs = state.storage.all_logs(&user_id).await?;

    let (content_type, body) = match format.as_str() {
        "csv" => ("text/csv", format_csv(&logs)?),
        "json" => (
            "application/json",
            serde_json::to_string_pretty(&logs)
                .map_err(|e| ApiError::Internal(format!("JSON export failed: {}", e)))?,
        ),
        other => {
            return Err(ApiError::Validation(format!(
                "Unsupported export format: {}. Use csv or json",
                other
            )))
        }
    };

    tracing::info!(user_id = %user_id, format = %format, logs = logs.len(), "Logs exported");

    let filename = format!(
        "hydrocult_export_{}.{}",
        Utc::now().format("%Y%m%d_%H%M%S"),
        format
    );

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        Body::from(body),
    )
        .into_response())
}

/// Format as CSV
fn format_csv(logs: &[DrinkLog]) -> ApiResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record(["id", "timestamp", "amount_ml", "drink_type", "status"])
        .map_err(csv_error)?;

    for log in logs {
        let timestamp = log.timestamp.to_rfc3339();
        let amount = log.amount.to_string();
        writer
            .write_record([
                log.id.as_str(),
                timestamp.as_str(),
                amount.as_str(),
                log.drink_type.as_str(),
                log.status.as_str(),
            ])
            .map_err(csv_error)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ApiError::Internal(format!("CSV export failed: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| ApiError::Internal(format!("CSV export failed: {}", e)))
}

fn csv_error(e: csv::Error) -> ApiError {
    ApiError::Internal(format!("CSV export failed: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::DrinkType;
    use chrono::TimeZone;

    #[test]
    fn test_format_csv() {
        let log = DrinkLog::new(250, DrinkType::Tea)
            .with_id("log-1")
            .at(Utc.with_ymd_and_hms(2024, 6, 1, 8, 30, 0).unwrap());

        let csv = format_csv(&[log]).unwrap();
        let mut lines = csv.lines();

        assert_eq!(lines.next(), Some("id,timestamp,amount_ml,drink_type,status"));
        assert_eq!(
            lines.next(),
            Some("log-1,2024-06-01T08:30:00+00:00,250,tea,synced")
        );
        assert_eq!(lines.next(), None);
    }
}
