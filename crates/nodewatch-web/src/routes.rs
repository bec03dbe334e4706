//! Router assembly.

use axum::Router;
use axum::routing::get;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;

use crate::access_log::AccessLogLayer;
use crate::handlers;
use crate::state::AppState;

pub(crate) fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::handle_index))
        .route("/health", get(handlers::handle_health))
        .route("/truncate", get(handlers::handle_truncate))
        .route("/api-docs/openapi.json", get(handlers::handle_openapi))
        .route(
            "/{category}/",
            get(handlers::handle_list).post(handlers::handle_create),
        )
        .route(
            "/{category}/{id}/",
            get(handlers::handle_retrieve).delete(handlers::handle_delete),
        )
        .with_state(state)
        .layer(AccessLogLayer)
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use chrono::{Duration, Utc};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use nodewatch_core::collector::mock::{MockCommands, MockFs};
    use nodewatch_core::collector::{Collector, CollectorConfig};
    use nodewatch_core::registry::Registry;
    use nodewatch_core::storage::{MemoryStore, RetentionPolicy};

    fn state_with(commands: MockCommands) -> AppState {
        let collector = Collector::new(
            MockFs::typical_system(),
            commands,
            CollectorConfig::default(),
        );
        AppState::new(
            Registry::standard(),
            collector,
            Box::new(MemoryStore::new()),
            RetentionPolicy::default(),
        )
    }

    fn typical_state() -> AppState {
        state_with(MockCommands::typical_system())
    }

    async fn send(state: &AppState, method: &str, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = build_router(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, body)
    }

    /// Fourteen loadavg observations, one per day, collected just before now.
    fn seed(state: &AppState) {
        let collected = Utc::now() - Duration::seconds(1);
        let mut store = state.lock_store();
        for i in 0..14 {
            store
                .append("loadavg", collected - Duration::days(i), json!({"i": i}))
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_index_lists_categories() {
        let (status, body) = send(&typical_state(), "GET", "/").await;
        assert_eq!(status, StatusCode::OK);
        let index = body.as_object().unwrap();
        assert_eq!(index.len(), 9);
        assert_eq!(index["loadavg"], "/loadavg/");
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(&typical_state(), "GET", "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
    }

    #[tokio::test]
    async fn test_create_observation() {
        let state = typical_state();
        let (status, body) = send(&state, "POST", "/loadavg/").await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["id"], 1);
        assert_eq!(body["category"], "loadavg");
        assert!(body["datetime"].as_str().unwrap().ends_with('Z'));
        assert_eq!(body["data"]["loadavg1"], 0.15);
        assert_eq!(state.lock_store().count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_create_every_category() {
        let state = typical_state();
        for category in Registry::standard().categories() {
            let (status, body) = send(&state, "POST", &format!("/{category}/")).await;
            assert_eq!(status, StatusCode::CREATED, "{category}: {body}");
            assert_eq!(body["category"], category);
        }
    }

    #[tokio::test]
    async fn test_unknown_category() {
        let state = typical_state();
        let (status, body) = send(&state, "POST", "/machineid/").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["errors"][0]["status"], 404);
        assert_eq!(body["errors"][0]["detail"], "Unknown category: machineid");

        let (status, _) = send(&state, "GET", "/machineid/").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_collection_failure_persists_nothing() {
        let state = state_with(MockCommands::new());
        let (status, body) = send(&state, "POST", "/df/").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body["errors"][0]["detail"].as_str().unwrap().is_empty());
        assert_eq!(state.lock_store().count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_list_newest_first_per_category() {
        let state = typical_state();
        send(&state, "POST", "/cpu/").await;
        send(&state, "POST", "/mem/").await;
        send(&state, "POST", "/cpu/").await;

        let (status, body) = send(&state, "GET", "/cpu/").await;
        assert_eq!(status, StatusCode::OK);
        let ids: Vec<u64> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|o| o["id"].as_u64().unwrap())
            .collect();
        assert_eq!(ids, vec![3, 1]);
    }

    #[tokio::test]
    async fn test_retrieve_and_delete() {
        let state = typical_state();
        send(&state, "POST", "/uptime/").await;

        let (status, body) = send(&state, "GET", "/uptime/1/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["boot_times"].as_array().unwrap().len(), 2);

        // Observation 1 belongs to uptime, not mem.
        let (status, _) = send(&state, "GET", "/mem/1/").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&state, "DELETE", "/mem/1/").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&state, "DELETE", "/uptime/1/").await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&state, "GET", "/uptime/1/").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_truncate_default_window() {
        let state = typical_state();
        seed(&state);

        let (status, body) = send(&state, "GET", "/truncate").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["current_observation_count"], 7);
    }

    #[tokio::test]
    async fn test_truncate_with_datetime() {
        let state = typical_state();
        seed(&state);
        let (_, body) = send(&state, "GET", "/truncate?datetime=-10d").await;
        assert_eq!(body["current_observation_count"], 10);

        let state = typical_state();
        seed(&state);
        let cutoff = (Utc::now() - Duration::days(4)).format("%Y-%m-%dT%H:%M:%SZ");
        let (status, body) = send(&state, "GET", &format!("/truncate?datetime={cutoff}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["current_observation_count"], 4);
    }

    #[tokio::test]
    async fn test_truncate_invalid_datetime() {
        let state = typical_state();
        seed(&state);

        let (status, body) = send(&state, "GET", "/truncate?datetime=why").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["status"], 400);
        assert_eq!(body["errors"][0]["detail"], "Invalid datetime");
        assert_eq!(state.lock_store().count().unwrap(), 14);
    }

    #[tokio::test]
    async fn test_truncate_relative_datetime_out_of_range() {
        let state = typical_state();
        seed(&state);

        let (status, body) = send(&state, "GET", "/truncate?datetime=-100000000000000d").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["detail"], "Invalid datetime");
        assert_eq!(state.lock_store().count().unwrap(), 14);
    }

    #[tokio::test]
    async fn test_truncate_unescaped_plus_offset() {
        let state = typical_state();
        seed(&state);
        let (status, body) =
            send(&state, "GET", "/truncate?datetime=2000-01-01T00:00:00+00:00").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["current_observation_count"], 14);

        // str(datetime) shape: space separator, microseconds, `+00:00` offset.
        let state = typical_state();
        seed(&state);
        let cutoff = (Utc::now() - Duration::days(10)).format("%Y-%m-%d%%20%H:%M:%S%.6f+00:00");
        let (status, body) = send(&state, "GET", &format!("/truncate?datetime={cutoff}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["current_observation_count"], 10);
    }

    #[tokio::test]
    async fn test_bad_path_id_uses_error_envelope() {
        let state = typical_state();
        let (status, body) = send(&state, "GET", "/uptime/abc/").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["status"], 400);
        assert!(body["errors"][0]["detail"].is_string());

        let (status, body) = send(&state, "DELETE", "/uptime/-1/").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["status"], 400);
    }

    #[tokio::test]
    async fn test_duplicate_query_param_uses_error_envelope() {
        let state = typical_state();
        seed(&state);

        let (status, body) = send(&state, "GET", "/truncate?datetime=-1d&datetime=-2d").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["status"], 400);
        assert!(body["errors"][0]["detail"].is_string());
        assert_eq!(state.lock_store().count().unwrap(), 14);
    }

    #[tokio::test]
    async fn test_openapi_document() {
        let (status, body) = send(&typical_state(), "GET", "/api-docs/openapi.json").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["paths"].get("/truncate").is_some());
        assert!(body["paths"].get("/{category}/").is_some());
    }
}
