//! HTTP router construction.

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::api;
use crate::state::AppState;

/// Build the application router with all routes and middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = match state.config.server.cors_origin.as_str() {
        "*" => CorsLayer::new().allow_origin(Any),
        origin => match origin.parse::<HeaderValue>() {
            Ok(value) => CorsLayer::new().allow_origin(value),
            Err(_) => CorsLayer::new().allow_origin(Any),
        },
    };

    Router::new()
        .route("/health", get(api::health))
        // Scheduled leaderboards
        .route(
            "/api/v1/scheduled-leaderboards",
            get(api::list_scheduled).post(api::create_scheduled),
        )
        .route(
            "/api/v1/scheduled-leaderboards/{name}/status",
            get(api::scheduled_status),
        )
        .route(
            "/api/v1/scheduled-leaderboards/{name}/scores",
            post(api::scheduled_update_score),
        )
        .route(
            "/api/v1/scheduled-leaderboards/{name}/top",
            get(api::scheduled_top_n),
        )
        .route(
            "/api/v1/scheduled-leaderboards/{name}/settle",
            post(api::scheduled_settle),
        )
        .route(
            "/api/v1/scheduled-leaderboards/{name}/history",
            get(api::scheduled_history),
        )
        // Plain leaderboards
        .route(
            "/api/v1/leaderboards/{name}/scores",
            post(api::update_score),
        )
        .route(
            "/api/v1/leaderboards/{name}/scores/{user_id}",
            get(api::user_score),
        )
        .route("/api/v1/leaderboards/{name}/top/{n}", get(api::top_n))
        .route(
            "/api/v1/leaderboards/{name}/users/{user_id}",
            delete(api::remove_user),
        )
        .route("/api/v1/leaderboards/{name}", delete(api::reset))
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::util::ServiceExt;

    use chrono::NaiveTime;
    use rankd_core::config::{
        Config, RedisConfig, SchedulerConfig, ServerConfig, SettlementDefaults,
    };
    use rankd_core::types::Cycle;
    use rankd_store::MemoryStore;

    fn test_state() -> Arc<AppState> {
        let config = Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors_origin: "*".to_string(),
            },
            redis: RedisConfig {
                host: "127.0.0.1".to_string(),
                port: 6379,
                db: 0,
                timeout_ms: 1_000,
            },
            scheduler: SchedulerConfig {
                tick_interval_secs: 60,
            },
            settlement: SettlementDefaults {
                default_time: NaiveTime::from_hms_opt(0, 0, 0).unwrap(),
                default_cycle: Cycle::Daily,
                supported_cycles: Cycle::SUPPORTED.to_vec(),
            },
        };
        Arc::new(AppState::new(config, Arc::new(MemoryStore::new())))
    }

    async fn send(router: Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = router.oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, body)
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn create_then_status_round_trip() {
        let state = test_state();

        let (status, _) = send(
            build_router(state.clone()),
            post_json(
                "/api/v1/scheduled-leaderboards",
                serde_json::json!({
                    "name": "weekly_contest",
                    "settlement_time": "00:00:00",
                    "settlement_cycle": "weekly",
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(
            build_router(state),
            Request::builder()
                .uri("/api/v1/scheduled-leaderboards/weekly_contest/status")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "pending");
    }

    #[tokio::test]
    async fn create_with_unsupported_cycle_is_rejected() {
        let state = test_state();

        let (status, body) = send(
            build_router(state.clone()),
            post_json(
                "/api/v1/scheduled-leaderboards",
                serde_json::json!({
                    "name": "hourly_race",
                    "settlement_cycle": "hourly",
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("unsupported settlement cycle"));

        // No registry entry was created.
        let (_, listed) = send(
            build_router(state),
            Request::builder()
                .uri("/api/v1/scheduled-leaderboards")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(listed, serde_json::json!({}));
    }

    #[tokio::test]
    async fn unknown_leaderboard_is_404() {
        let (status, _) = send(
            build_router(test_state()),
            Request::builder()
                .uri("/api/v1/scheduled-leaderboards/missing/status")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn score_update_on_pending_board_is_400() {
        let state = test_state();
        let (status, _) = send(
            build_router(state.clone()),
            post_json(
                "/api/v1/scheduled-leaderboards",
                serde_json::json!({ "name": "gated" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(
            build_router(state),
            post_json(
                "/api/v1/scheduled-leaderboards/gated/scores",
                serde_json::json!({ "user_id": "alice", "score": 10.0 }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"],
            "cannot update score when leaderboard is not in progress"
        );
    }

    #[tokio::test]
    async fn plain_leaderboard_score_and_top_n() {
        let state = test_state();

        for (user, score) in [("alice", 50.0), ("bob", 80.0)] {
            let (status, _) = send(
                build_router(state.clone()),
                post_json(
                    "/api/v1/leaderboards/arena/scores",
                    serde_json::json!({ "user_id": user, "score": score }),
                ),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
        }

        let (status, body) = send(
            build_router(state.clone()),
            Request::builder()
                .uri("/api/v1/leaderboards/arena/top/2")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["user_id"], "bob");
        assert_eq!(body[0]["rank"], 1);
        assert_eq!(body[1]["user_id"], "alice");

        let (status, body) = send(
            build_router(state),
            Request::builder()
                .uri("/api/v1/leaderboards/arena/scores/nobody")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("not found"));
    }
}
