use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;

use domain::models::{NewPassenger, Notification, Passenger, PassengerId};

use super::{notification_use_case, passenger_use_case};
use crate::{
    AppState,
    http::{ApiError, ApiResult, not_found},
};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePassengerRequestBody {
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    flight_id: Option<i64>,
}

impl From<CreatePassengerRequestBody> for NewPassenger {
    fn from(body: CreatePassengerRequestBody) -> Self {
        NewPassenger {
            first_name: body.first_name,
            last_name: body.last_name,
            email: body.email,
            flight_id: body.flight_id,
        }
    }
}

/// 乗客リストハンドラ
#[tracing::instrument(skip(app_state))]
pub async fn list(State(app_state): State<AppState>) -> ApiResult<Json<Vec<Passenger>>> {
    let use_case = passenger_use_case(&app_state);
    let passengers = use_case.list().await.map_err(ApiError::from)?;
    Ok(Json(passengers))
}

/// 乗客登録ハンドラ
#[tracing::instrument(skip(app_state))]
pub async fn create(
    State(app_state): State<AppState>,
    Json(request_body): Json<CreatePassengerRequestBody>,
) -> ApiResult<(StatusCode, Json<Passenger>)> {
    let use_case = passenger_use_case(&app_state);
    let passenger = use_case
        .create(request_body.into())
        .await
        .map_err(ApiError::from)?;
    Ok((StatusCode::CREATED, Json(passenger)))
}

/// 乗客取得ハンドラ
#[tracing::instrument(skip(app_state))]
pub async fn by_id(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Passenger>> {
    let use_case = passenger_use_case(&app_state);
    let passenger = use_case
        .by_id(PassengerId::new(id))
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| not_found("Passenger"))?;
    Ok(Json(passenger))
}

/// 乗客削除ハンドラ
#[tracing::instrument(skip(app_state))]
pub async fn delete(State(app_state): State<AppState>, Path(id): Path<i64>) -> ApiResult<StatusCode> {
    let use_case = passenger_use_case(&app_state);
    let deleted = use_case
        .delete(PassengerId::new(id))
        .await
        .map_err(ApiError::from)?;
    match deleted {
        true => Ok(StatusCode::OK),
        false => Err(not_found("Passenger")),
    }
}

/// 乗客の通知リストハンドラ
#[tracing::instrument(skip(app_state))]
pub async fn notifications(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<Notification>>> {
    let use_case = notification_use_case(&app_state);
    let notifications = use_case
        .list(PassengerId::new(id))
        .await
        .map_err(ApiError::from)?;
    Ok(Json(notifications))
}
