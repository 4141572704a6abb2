use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use domain::{
    DomainError, DomainResult,
    models::{FlightCancellationReport, FlightCancelled, FlightId, MessageTemplate},
};

use super::notification_use_case;
use crate::{
    AppState,
    http::{ApiError, ApiResult},
};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAllResponseBody {
    deleted_count: u64,
}

/// 通知一括削除ハンドラ
#[tracing::instrument(skip(app_state))]
pub async fn delete_all(State(app_state): State<AppState>) -> ApiResult<Json<DeleteAllResponseBody>> {
    let use_case = notification_use_case(&app_state);
    let deleted_count = use_case.delete_all().await.map_err(ApiError::from)?;
    Ok(Json(DeleteAllResponseBody { deleted_count }))
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightCancelledRequestBody {
    flight_id: i64,
    message: Option<String>,
}

impl TryFrom<FlightCancelledRequestBody> for FlightCancelled {
    type Error = DomainError;

    fn try_from(body: FlightCancelledRequestBody) -> DomainResult<Self> {
        Ok(FlightCancelled {
            flight_id: FlightId::new(body.flight_id)?,
            message: body.message.map(MessageTemplate::new).transpose()?,
        })
    }
}

/// フライト欠航ハンドラ
///
/// フライトサービスから欠航イベントを受け取り、そのフライトのすべての乗客に通知する。
/// サーバーが停止を始めた場合、コミット前の通知は作成されない。
#[tracing::instrument(skip(app_state))]
pub async fn flight_cancelled(
    State(app_state): State<AppState>,
    Json(request_body): Json<FlightCancelledRequestBody>,
) -> ApiResult<Json<FlightCancellationReport>> {
    let event = FlightCancelled::try_from(request_body).map_err(ApiError::from)?;
    let template = event
        .message
        .unwrap_or_else(|| app_state.message_template.clone());
    let cancel = app_state.shutdown.child_token();
    let use_case = notification_use_case(&app_state);
    let report = use_case
        .notify_flight_cancelled(event.flight_id, &template, &cancel)
        .await
        .map_err(ApiError::from)?;
    Ok(Json(report))
}
