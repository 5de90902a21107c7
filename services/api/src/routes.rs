use crate::infra::{AppState, DatasetStore, ReloadSummary};
use crate::views::{
    self, CompanyComparisonRequest, CountryComparisonRequest, GeoResponse, GroupsReport,
    GroupsRequest, OverviewReport, OverviewRequest, PillarReport, PillarRequest, RankingReport,
    RankingRequest,
};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use csr_score::error::AppError;
use csr_score::scoring::{CompanyScoreView, Comparison, GroupSummary};
use serde_json::json;

pub(crate) fn csr_routes() -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/overview", post(overview_endpoint))
        .route("/api/v1/rankings", post(rankings_endpoint))
        .route("/api/v1/groups", post(groups_endpoint))
        .route("/api/v1/pillars", post(pillar_endpoint))
        .route(
            "/api/v1/comparison/companies",
            post(company_comparison_endpoint),
        )
        .route(
            "/api/v1/comparison/countries",
            post(country_comparison_endpoint),
        )
        .route("/api/v1/geo", post(geo_endpoint))
        .route("/api/v1/dataset/reload", post(reload_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn overview_endpoint(
    Extension(store): Extension<DatasetStore>,
    Json(request): Json<OverviewRequest>,
) -> Result<Json<OverviewReport>, AppError> {
    let dataset = store.current();
    Ok(Json(views::overview_report(&dataset, &request)?))
}

pub(crate) async fn rankings_endpoint(
    Extension(store): Extension<DatasetStore>,
    Json(request): Json<RankingRequest>,
) -> Result<Json<RankingReport>, AppError> {
    let dataset = store.current();
    Ok(Json(views::ranking_report(&dataset, &request)?))
}

pub(crate) async fn groups_endpoint(
    Extension(store): Extension<DatasetStore>,
    Json(request): Json<GroupsRequest>,
) -> Result<Json<GroupsReport>, AppError> {
    let dataset = store.current();
    Ok(Json(views::groups_report(&dataset, &request)?))
}

pub(crate) async fn pillar_endpoint(
    Extension(store): Extension<DatasetStore>,
    Json(request): Json<PillarRequest>,
) -> Result<Json<PillarReport>, AppError> {
    let dataset = store.current();
    Ok(Json(views::pillar_report(&dataset, &request)?))
}

pub(crate) async fn company_comparison_endpoint(
    Extension(store): Extension<DatasetStore>,
    Json(request): Json<CompanyComparisonRequest>,
) -> Result<Json<Comparison<CompanyScoreView>>, AppError> {
    let dataset = store.current();
    Ok(Json(views::company_comparison(&dataset, &request)?))
}

pub(crate) async fn country_comparison_endpoint(
    Extension(store): Extension<DatasetStore>,
    Json(request): Json<CountryComparisonRequest>,
) -> Result<Json<Comparison<GroupSummary>>, AppError> {
    let dataset = store.current();
    Ok(Json(views::country_comparison(&dataset, &request)?))
}

pub(crate) async fn geo_endpoint(
    Extension(store): Extension<DatasetStore>,
) -> Result<Json<GeoResponse>, AppError> {
    let dataset = store.current();
    Ok(Json(views::geo_report(&dataset)?))
}

/// File reading and scoring run on the blocking pool; readers keep serving the old
/// snapshot until the swap.
pub(crate) async fn reload_endpoint(
    Extension(store): Extension<DatasetStore>,
) -> Result<Json<ReloadSummary>, AppError> {
    let summary = tokio::task::spawn_blocking(move || store.reload())
        .await
        .map_err(std::io::Error::from)??;
    Ok(Json(summary))
}
