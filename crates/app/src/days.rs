use axum::{
    extract::{Path, State},
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use metrics::counter;
use serde::Deserialize;
use tracing::{debug, error};

use dayfinder_core::types::{Day, DayPatch, NewDay};
use dayfinder_storage::DayError;

use crate::problem::ProblemResponse;
use crate::router::AppState;

const ENTITY_NAME: &str = "day";
const APPLICATION_NAME: &str = "dayfinder";

const HEADER_ALERT: HeaderName = HeaderName::from_static("x-dayfinder-alert");
const HEADER_PARAMS: HeaderName = HeaderName::from_static("x-dayfinder-params");

/// Wire payload for day writes. Every field is optional so that the handlers
/// can report missing or conflicting fields themselves instead of failing
/// deserialization.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DayPayload {
    pub id: Option<i64>,
    pub date: Option<String>,
    pub day_of_week: Option<String>,
}

/// `POST /api/days`: creates a new day. The id must be absent.
pub async fn create_day(
    State(state): State<AppState>,
    Json(payload): Json<DayPayload>,
) -> Result<Response, ProblemResponse> {
    debug!(stage = "days", payload = ?payload, "REST request to create day");

    if payload.id.is_some() {
        return Err(rejected(
            "create",
            "idexists",
            "a new day cannot already have an id",
        ));
    }
    let record = require_fields(payload, "create")?;

    let day = state
        .storage()
        .days()
        .insert(&record)
        .await
        .map_err(|err| storage_problem("create", err))?;

    counter!("day_requests_total", "op" => "create", "result" => "ok").increment(1);
    let headers = [
        (header::LOCATION, format!("/api/days/{}", day.id)),
        (HEADER_ALERT, alert("created")),
        (HEADER_PARAMS, day.id.to_string()),
    ];
    Ok((StatusCode::CREATED, headers, Json(day)).into_response())
}

/// `PUT /api/days/{id}`: full update of an existing day.
pub async fn update_day(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<DayPayload>,
) -> Result<Response, ProblemResponse> {
    debug!(stage = "days", id, payload = ?payload, "REST request to update day");

    validate_body_id("update", id, payload.id)?;
    let record = require_fields(payload, "update")?;
    ensure_exists(&state, "update", id).await?;

    let day = state
        .storage()
        .days()
        .update(&Day {
            id,
            date: record.date,
            day_of_week: record.day_of_week,
        })
        .await
        .map_err(|err| match err {
            DayError::NotFound => rejected("update", "idnotfound", "day does not exist"),
            other => storage_problem("update", other),
        })?;

    counter!("day_requests_total", "op" => "update", "result" => "ok").increment(1);
    let headers = [(HEADER_ALERT, alert("updated")), (HEADER_PARAMS, id.to_string())];
    Ok((StatusCode::OK, headers, Json(day)).into_response())
}

/// `PATCH /api/days/{id}`: merge-patch of an existing day. Only fields present
/// in the body overwrite the stored value.
pub async fn partial_update_day(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<DayPayload>,
) -> Result<Response, ProblemResponse> {
    debug!(stage = "days", id, payload = ?payload, "REST request to partially update day");

    validate_body_id("patch", id, payload.id)?;
    ensure_exists(&state, "patch", id).await?;

    let patch = DayPatch {
        date: payload.date,
        day_of_week: payload.day_of_week,
    };
    let merged = state
        .storage()
        .days()
        .merge(id, &patch)
        .await
        .map_err(|err| storage_problem("patch", err))?;

    // The exists check passed, so an empty merge means the record vanished in
    // between.
    let Some(day) = merged else {
        counter!("day_requests_total", "op" => "patch", "result" => "not_found").increment(1);
        return Err(not_found(id));
    };

    counter!("day_requests_total", "op" => "patch", "result" => "ok").increment(1);
    let headers = [(HEADER_ALERT, alert("updated")), (HEADER_PARAMS, id.to_string())];
    Ok((StatusCode::OK, headers, Json(day)).into_response())
}

/// `GET /api/days`: lists every day in store order.
pub async fn get_all_days(
    State(state): State<AppState>,
) -> Result<Json<Vec<Day>>, ProblemResponse> {
    debug!(stage = "days", "REST request to get all days");

    let days = state
        .storage()
        .days()
        .fetch_all()
        .await
        .map_err(|err| storage_problem("get_all", err))?;

    counter!("day_requests_total", "op" => "get_all", "result" => "ok").increment(1);
    Ok(Json(days))
}

/// `GET /api/days/{id}`: fetches one day or 404.
pub async fn get_day(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Day>, ProblemResponse> {
    debug!(stage = "days", id, "REST request to get day");

    let day = state
        .storage()
        .days()
        .fetch_by_id(id)
        .await
        .map_err(|err| storage_problem("get", err))?;

    let Some(day) = day else {
        counter!("day_requests_total", "op" => "get", "result" => "not_found").increment(1);
        return Err(not_found(id));
    };

    counter!("day_requests_total", "op" => "get", "result" => "ok").increment(1);
    Ok(Json(day))
}

/// `DELETE /api/days/{id}`: deletes a day. Deleting an unknown id still
/// responds 204.
pub async fn delete_day(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, ProblemResponse> {
    debug!(stage = "days", id, "REST request to delete day");

    state
        .storage()
        .days()
        .delete(id)
        .await
        .map_err(|err| storage_problem("delete", err))?;

    counter!("day_requests_total", "op" => "delete", "result" => "ok").increment(1);
    let headers = [(HEADER_ALERT, alert("deleted")), (HEADER_PARAMS, id.to_string())];
    Ok((StatusCode::NO_CONTENT, headers).into_response())
}

fn alert(action: &str) -> String {
    format!("{APPLICATION_NAME}.{ENTITY_NAME}.{action}")
}

fn require_fields(payload: DayPayload, op: &'static str) -> Result<NewDay, ProblemResponse> {
    let (Some(date), Some(day_of_week)) = (payload.date, payload.day_of_week) else {
        return Err(rejected(op, "missing_field", "date and dayOfWeek are required"));
    };
    Ok(NewDay { date, day_of_week })
}

fn validate_body_id(
    op: &'static str,
    path_id: i64,
    body_id: Option<i64>,
) -> Result<(), ProblemResponse> {
    let Some(id) = body_id else {
        return Err(rejected(op, "idnull", "body id must be set"));
    };
    if id != path_id {
        return Err(rejected(op, "idinvalid", "body id does not match path id"));
    }
    Ok(())
}

async fn ensure_exists(
    state: &AppState,
    op: &'static str,
    id: i64,
) -> Result<(), ProblemResponse> {
    let exists = state
        .storage()
        .days()
        .exists(id)
        .await
        .map_err(|err| storage_problem(op, err))?;

    if !exists {
        return Err(rejected(op, "idnotfound", "day does not exist"));
    }
    Ok(())
}

fn rejected(op: &'static str, key: &'static str, detail: &'static str) -> ProblemResponse {
    counter!("day_requests_total", "op" => op, "result" => "rejected").increment(1);
    ProblemResponse::validation(key, ENTITY_NAME, detail)
}

fn not_found(id: i64) -> ProblemResponse {
    ProblemResponse::new(
        StatusCode::NOT_FOUND,
        "not_found",
        format!("no day with id {id}"),
    )
}

fn storage_problem(op: &'static str, err: DayError) -> ProblemResponse {
    error!(stage = "days", op, error = %err, "storage operation failed");
    counter!("day_requests_total", "op" => op, "result" => "error").increment(1);
    ProblemResponse::new(
        StatusCode::INTERNAL_SERVER_ERROR,
        "storage_error",
        "storage operation failed",
    )
}
