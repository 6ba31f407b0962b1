use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;

use dayfinder_notify::HistoryClient;
use dayfinder_storage::Database;

use crate::{dayfinder, days, telemetry};

#[derive(Clone)]
pub struct AppState {
    metrics: PrometheusHandle,
    storage: Database,
    history: HistoryClient,
    clock: Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>,
}

impl AppState {
    pub fn new(metrics: PrometheusHandle, storage: Database, history: HistoryClient) -> Self {
        Self {
            metrics,
            storage,
            history,
            clock: Arc::new(Utc::now),
        }
    }

    #[cfg(test)]
    pub fn with_clock(mut self, clock: Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>) -> Self {
        self.clock = clock;
        self
    }

    pub fn metrics(&self) -> &PrometheusHandle {
        &self.metrics
    }

    pub fn storage(&self) -> &Database {
        &self.storage
    }

    pub fn history(&self) -> &HistoryClient {
        &self.history
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }
}

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .route("/api/days", get(days::get_all_days).post(days::create_day))
        .route(
            "/api/days/:id",
            get(days::get_day)
                .put(days::update_day)
                .patch(days::partial_update_day)
                .delete(days::delete_day),
        )
        .route("/services/calendar/dayfinder", get(dayfinder::find_day))
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let body = telemetry::render_metrics(state.metrics());
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/plain; version=0.0.4")
        .body(Body::from(body))
        .unwrap()
}

#[cfg(test)]
pub(crate) mod testutil {
    use std::time::Duration;

    use reqwest::Client;
    use url::Url;

    use super::AppState;
    use crate::telemetry;
    use dayfinder_notify::HistoryClient;
    use dayfinder_storage::Database;

    /// Builds an [`AppState`] backed by a named in-memory database and a
    /// history client pointed at `history_base`.
    pub async fn setup_state(db_name: &str, history_base: &str) -> AppState {
        let metrics = telemetry::init_metrics().expect("metrics init");

        let url = format!("sqlite:file:{db_name}?mode=memory&cache=shared");
        let database = Database::connect(&url).await.expect("connect");
        database.run_migrations().await.expect("migrations");

        let history = HistoryClient::new(
            Url::parse(history_base).expect("history url"),
            Duration::from_secs(1),
            Client::builder().build().expect("client"),
        );

        AppState::new(metrics, database, history)
    }
}

#[cfg(test)]
mod tests {
    use super::testutil::setup_state;
    use super::*;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    #[tokio::test]
    async fn healthz_returns_ok() {
        let app = app_router(setup_state("router_healthz", "http://127.0.0.1:1").await);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/healthz")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .expect("handler should respond");

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn metrics_exports_build_info() {
        let app = app_router(setup_state("router_metrics", "http://127.0.0.1:1").await);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/metrics")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .expect("handler should respond");

        assert_eq!(response.status(), StatusCode::OK);
        let collected = response
            .into_body()
            .collect()
            .await
            .expect("body should read");
        let body = String::from_utf8(collected.to_bytes().to_vec()).expect("utf-8");
        assert!(body.contains("app_build_info"));
        assert!(body.contains("app_uptime_seconds"));
    }
}
