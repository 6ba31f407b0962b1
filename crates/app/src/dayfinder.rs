use std::time::Instant;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use metrics::{counter, histogram};
use serde::Deserialize;
use tracing::{debug, warn};

use dayfinder_core::types::WeekdayLookup;
use dayfinder_core::weekday;
use dayfinder_notify::LookupRecord;

use crate::problem::ProblemResponse;
use crate::router::AppState;

#[derive(Debug, Deserialize)]
pub struct DayfinderQuery {
    date: String,
}

/// `GET /services/calendar/dayfinder?date=dd-MM-yyyy`: derives the weekday for
/// the given date and records the lookup with the history service.
///
/// A parse failure is the only error surfaced to the caller. The history
/// notification is best effort: its outcome never changes the response.
pub async fn find_day(
    State(state): State<AppState>,
    Query(query): Query<DayfinderQuery>,
) -> Result<Json<WeekdayLookup>, ProblemResponse> {
    debug!(stage = "dayfinder", date = %query.date, "REST request to find day of week");

    let lookup = weekday::lookup(&query.date).map_err(|err| {
        counter!("dayfinder_lookups_total", "result" => "parse_error").increment(1);
        ProblemResponse::new(StatusCode::BAD_REQUEST, "invalid_date", err.to_string())
    })?;

    notify_history(&state, &lookup).await;

    counter!("dayfinder_lookups_total", "result" => "ok").increment(1);
    Ok(Json(lookup))
}

async fn notify_history(state: &AppState, lookup: &WeekdayLookup) {
    let record = LookupRecord {
        date: &lookup.date,
        day_of_week: &lookup.day_of_week,
        searched_at: state.now(),
    };

    let start = Instant::now();
    let outcome = state.history().save_lookup(&record).await;
    histogram!("history_notify_latency_seconds").record(start.elapsed().as_secs_f64());

    match outcome {
        Ok(()) => {
            counter!("history_notify_total", "result" => "ok").increment(1);
        }
        Err(err) => {
            // Best-effort telemetry: the lookup response must not depend on
            // the history service being reachable.
            warn!(stage = "dayfinder", error = %err, "failed to record lookup with history service");
            counter!("history_notify_total", "result" => "error").increment(1);
        }
    }
}
