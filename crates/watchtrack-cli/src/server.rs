//! HTTP surface: a health probe and the bearer-protected cron trigger that
//! runs one bounded refresh batch.

use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use constant_time_eq::constant_time_eq;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};
use watchtrack_core::{RefreshPolicy, Refresher};

#[derive(Clone)]
pub struct AppState {
    /// `None` when sources could not be built at startup
    pub refresher: Option<Arc<Refresher>>,
    pub cron_secret: Option<Arc<str>>,
    pub policy: RefreshPolicy,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/cron/refresh", get(cron_refresh).post(cron_refresh))
        .with_state(state)
}

async fn healthz() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

fn extract_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
}

fn token_matches(headers: &HeaderMap, secret: &str) -> bool {
    extract_token(headers).is_some_and(|token| constant_time_eq(token.as_bytes(), secret.as_bytes()))
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

async fn cron_refresh(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let (Some(secret), Some(refresher)) = (state.cron_secret.as_deref(), state.refresher.as_ref()) else {
        error!(operation = "cron_refresh", "Cron endpoint called but the secret or refresher is not configured");
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Server misconfigured");
    };

    if !token_matches(&headers, secret) {
        warn!(operation = "cron_refresh", "Rejected cron call with a missing or wrong token");
        return error_response(StatusCode::UNAUTHORIZED, "Unauthorized");
    }

    match refresher.run(state.policy).await {
        Ok(report) => {
            info!(
                operation = "cron_refresh",
                count = report.count(),
                refreshed = report.refreshed(),
                failed = report.failures(),
                "Cron refresh finished"
            );
            (
                StatusCode::OK,
                Json(json!({
                    "status": "ok",
                    "count": report.count(),
                    "processed": report.processed_titles(),
                })),
            )
                .into_response()
        }
        Err(e) => {
            error!(operation = "cron_refresh", error = %e, "Cron refresh failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request};
    use std::time::Duration;
    use tower::ServiceExt;
    use watchtrack_core::Enricher;
    use watchtrack_models::{
        CatalogDetails, CatalogFields, ItemStatus, MediaKind, Metadata, ReleaseDates, SearchPage, TrendingWindow,
        WatchlistItem,
    };
    use watchtrack_sources::{CatalogProvider, MemoryStore, SourceResult};

    /// Every id resolves to a movie titled after its id
    struct StaticCatalog;

    #[async_trait]
    impl CatalogProvider for StaticCatalog {
        fn provider_name(&self) -> &str {
            "static"
        }

        async fn details(&self, tmdb_id: u32, _kind: MediaKind, _region: &str) -> SourceResult<CatalogDetails> {
            Ok(CatalogDetails {
                id: tmdb_id,
                fields: CatalogFields {
                    title: Some(format!("Movie {}", tmdb_id)),
                    ..Default::default()
                },
                watch_providers: None,
                videos: None,
            })
        }

        async fn release_dates(&self, movie_id: u32) -> SourceResult<ReleaseDates> {
            Ok(ReleaseDates {
                id: movie_id,
                results: Vec::new(),
            })
        }

        async fn search(&self, _q: &str, _k: MediaKind, _r: &str, _p: u32) -> SourceResult<SearchPage> {
            Ok(SearchPage::default())
        }

        async fn trending(&self, _k: MediaKind, _w: TrendingWindow, _r: &str) -> SourceResult<SearchPage> {
            Ok(SearchPage::default())
        }
    }

    fn state(secret: Option<&str>, with_refresher: bool) -> AppState {
        let item = WatchlistItem::new("user-1", 42, MediaKind::Movie, ItemStatus::MovieComingSoon, Metadata::default())
            .unwrap();
        let store = Arc::new(MemoryStore::with_items([item]));
        let refresher = Refresher::new(store, Enricher::new(Arc::new(StaticCatalog)), "US");
        AppState {
            refresher: with_refresher.then(|| Arc::new(refresher)),
            cron_secret: secret.map(Arc::from),
            policy: RefreshPolicy::Bounded {
                limit: 5,
                budget: Duration::from_secs(5),
            },
        }
    }

    fn cron_request(method: Method, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri("/api/cron/refresh");
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_token_matches_only_the_exact_secret() {
        let mut headers = HeaderMap::new();
        assert!(!token_matches(&headers, "s3cret"));

        for (value, expected) in [
            ("Bearer s3cret", true),
            ("Bearer s3cre", false),
            ("Bearer s3cret-longer", false),
            ("Basic s3cret", false),
        ] {
            headers.insert(AUTHORIZATION, value.parse().unwrap());
            assert_eq!(token_matches(&headers, "s3cret"), expected, "{}", value);
        }
    }

    #[tokio::test]
    async fn test_healthz() {
        let response = router(state(None, false))
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_secret_is_server_error_before_auth() {
        let response = router(state(None, true))
            .oneshot(cron_request(Method::GET, Some("anything")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = router(state(Some("s3cret"), false))
            .oneshot(cron_request(Method::GET, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_bad_or_missing_token_is_unauthorized() {
        for token in [None, Some("wrong")] {
            let response = router(state(Some("s3cret"), true))
                .oneshot(cron_request(Method::POST, token))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[tokio::test]
    async fn test_authorized_call_runs_batch() {
        for method in [Method::GET, Method::POST] {
            let response = router(state(Some("s3cret"), true))
                .oneshot(cron_request(method, Some("s3cret")))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);

            let body = body_json(response).await;
            assert_eq!(body["status"], "ok");
            assert_eq!(body["count"], 1);
            assert_eq!(body["processed"], json!(["Movie 42"]));
        }
    }
}
