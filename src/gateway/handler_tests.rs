//! Router-level tests for the gateway handlers.

use axum::{Router, body::Body, http::Request, http::StatusCode, response::Response};
use http_body_util::BodyExt;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

use crate::artifact::{DirectorySource, MemorySource, encode_npy};
use crate::embedding::{EmbeddingVector, MockEmbedder};
use crate::gateway::error::ErrorResponse;
use crate::gateway::{HandlerState, LANDMARK_STATUS_HEADER, create_router_with_state};
use crate::store::{ReferenceStore, StoreHandle};
use crate::verify::{LandmarkVerifier, VerificationEngine};

const DIM: usize = 4;

fn at_similarity(s: f32) -> Vec<f32> {
    vec![s, (1.0 - s * s).sqrt(), 0.0, 0.0]
}

fn axis(i: usize) -> EmbeddingVector {
    let mut v = vec![0.0; DIM];
    v[i] = 1.0;
    EmbeddingVector::from_raw(v).expect("valid vector")
}

fn tower_source() -> MemorySource {
    MemorySource::default()
        .with_vector("tower.01.jpg", &at_similarity(0.91))
        .with_vector("tower.02.jpg", &at_similarity(0.85))
        .with_vector("tower.03.jpg", &at_similarity(0.82))
        .with_vector("tower.04.jpg", &at_similarity(0.79))
        .with_vector("tower.05.jpg", &at_similarity(0.60))
        .with_vector("bridge.01.jpg", &[0.0, 0.0, 1.0, 0.0])
}

fn png_bytes() -> Vec<u8> {
    vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 7, 7, 7]
}

fn router_with(source: MemorySource, embedder: MockEmbedder, timeout: Duration) -> Router {
    let store = ReferenceStore::load(&source, DIM).expect("load");
    let handle = StoreHandle::from_store(Arc::new(source), store);
    let verifier = LandmarkVerifier::new(
        Arc::new(embedder),
        handle,
        VerificationEngine::default(),
        timeout,
    );
    create_router_with_state(HandlerState::new(verifier).with_max_image_bytes(1024))
}

fn tower_router(embedder: MockEmbedder) -> Router {
    router_with(tower_source(), embedder, Duration::from_secs(5))
}

fn verify_request(landmark: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(format!("/v1/landmarks/{}/verify", landmark))
        .header("content-type", "application/octet-stream")
        .body(Body::from(body))
        .expect("request")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

fn status_header(response: &Response) -> String {
    response
        .headers()
        .get(LANDMARK_STATUS_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

async fn json_body(response: Response) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("json body")
}

#[tokio::test]
async fn test_healthz() {
    let response = tower_router(MockEmbedder::returning(axis(0)))
        .oneshot(get("/healthz"))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(status_header(&response), "healthy");
    assert_eq!(json_body(response).await["status"], "ok");
}

#[tokio::test]
async fn test_ready_with_references() {
    let response = tower_router(MockEmbedder::returning(axis(0)))
        .oneshot(get("/ready"))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ready");
    assert_eq!(body["generation"], 1);
    assert_eq!(body["landmarks"], 2);
    assert_eq!(body["references"], 6);
    assert_eq!(body["embedder_mode"], "real");
}

#[tokio::test]
async fn test_ready_without_references() {
    let router = router_with(
        MemorySource::default(),
        MockEmbedder::returning(axis(0)),
        Duration::from_secs(5),
    );

    let response = router.oneshot(get("/ready")).await.expect("response");

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(status_header(&response), "pending");
}

#[tokio::test]
async fn test_list_landmarks() {
    let response = tower_router(MockEmbedder::returning(axis(0)))
        .oneshot(get("/v1/landmarks"))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(
        body["landmarks"],
        serde_json::json!([
            {"landmark_id": "bridge", "references": 1},
            {"landmark_id": "tower", "references": 5},
        ])
    );
}

#[tokio::test]
async fn test_verify_matched() {
    let response = tower_router(MockEmbedder::returning(axis(0)))
        .oneshot(verify_request("Tower", png_bytes()))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(status_header(&response), "matched");

    let body = json_body(response).await;
    assert_eq!(body["landmark_id"], "tower");
    assert_eq!(body["matched"], true);
    assert_eq!(body["match_count"], 3);
    assert_eq!(body["scored"].as_array().map(Vec::len), Some(5));
    assert_eq!(body["scored"][0]["source_name"], "tower.01.jpg");
}

#[tokio::test]
async fn test_verify_not_matched() {
    let response = tower_router(MockEmbedder::returning(axis(3)))
        .oneshot(verify_request("tower", png_bytes()))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(status_header(&response), "not_matched");

    let body = json_body(response).await;
    assert_eq!(body["matched"], false);
    assert_eq!(body["match_count"], 0);
}

#[tokio::test]
async fn test_verify_unknown_landmark() {
    let embedder = MockEmbedder::returning(axis(0));
    let response = tower_router(embedder.clone())
        .oneshot(verify_request("cathedral", png_bytes()))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(status_header(&response), "unknown_landmark");
    assert_eq!(embedder.calls(), 0);

    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    let error: ErrorResponse = serde_json::from_slice(&bytes).expect("error body");
    assert_eq!(error.code, 404);
    assert!(error.error.contains("cathedral"));
}

#[tokio::test]
async fn test_verify_empty_body() {
    let response = tower_router(MockEmbedder::returning(axis(0)))
        .oneshot(verify_request("tower", Vec::new()))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(status_header(&response), "embedding_failed");
}

#[tokio::test]
async fn test_verify_unsupported_format() {
    let response = tower_router(MockEmbedder::returning(axis(0)))
        .oneshot(verify_request("tower", b"plain text upload".to_vec()))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json_body(response).await["code"], 422);
}

#[tokio::test]
async fn test_verify_embedder_unavailable() {
    let response = tower_router(MockEmbedder::unavailable(DIM, "model offline"))
        .oneshot(verify_request("tower", png_bytes()))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(status_header(&response), "embedding_failed");
}

#[tokio::test(start_paused = true)]
async fn test_verify_embedder_timeout() {
    let router = router_with(
        tower_source(),
        MockEmbedder::hanging(DIM),
        Duration::from_millis(100),
    );

    let response = router
        .oneshot(verify_request("tower", png_bytes()))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
}

#[tokio::test]
async fn test_verify_body_too_large() {
    let mut body = png_bytes();
    body.resize(4096, 0);

    let response = tower_router(MockEmbedder::returning(axis(0)))
        .oneshot(verify_request("tower", body))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_verify_blank_landmark() {
    let response = tower_router(MockEmbedder::returning(axis(0)))
        .oneshot(verify_request("%20", png_bytes()))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(status_header(&response), "invalid_request");
}

mod reload {
    use super::*;

    fn directory_router(handle: StoreHandle) -> Router {
        let verifier = LandmarkVerifier::new(
            Arc::new(MockEmbedder::returning(axis(0))),
            handle,
            VerificationEngine::default(),
            Duration::from_secs(5),
        );
        create_router_with_state(HandlerState::new(verifier))
    }

    fn reload_request() -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/v1/references/reload")
            .body(Body::empty())
            .expect("request")
    }

    fn write(dir: &TempDir, name: &str, values: &[f32]) {
        std::fs::write(dir.path().join(format!("{}.npy", name)), encode_npy(values))
            .expect("write artifact");
    }

    #[tokio::test]
    async fn test_reload_picks_up_new_artifacts() {
        let dir = TempDir::new().expect("tempdir");
        write(&dir, "tower.01.jpg", &at_similarity(0.95));
        let handle = StoreHandle::load(Arc::new(DirectorySource::new(dir.path())), DIM)
            .await
            .expect("load");
        let router = directory_router(handle.clone());

        let response = router
            .clone()
            .oneshot(reload_request())
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "unchanged");

        write(&dir, "kremlin.01.jpg", &[0.0, 0.0, 1.0, 0.0]);
        let response = router
            .clone()
            .oneshot(reload_request())
            .await
            .expect("response");
        let body = json_body(response).await;
        assert_eq!(body["status"], "swapped");
        assert_eq!(body["generation"], 2);
        assert_eq!(body["landmarks"], 2);

        assert!(handle.snapshot().contains("kremlin"));
    }

    #[tokio::test]
    async fn test_ready_and_listing_report_swapped_generation() {
        let dir = TempDir::new().expect("tempdir");
        write(&dir, "tower.01.jpg", &at_similarity(0.95));
        let handle = StoreHandle::load(Arc::new(DirectorySource::new(dir.path())), DIM)
            .await
            .expect("load");
        let router = directory_router(handle.clone());

        write(&dir, "kremlin.01.jpg", &[0.0, 0.0, 1.0, 0.0]);
        router
            .clone()
            .oneshot(reload_request())
            .await
            .expect("response");

        let ready = json_body(router.clone().oneshot(get("/ready")).await.expect("response")).await;
        assert_eq!(ready["generation"], 2);
        assert_eq!(ready["landmarks"], 2);

        let listing =
            json_body(router.oneshot(get("/v1/landmarks")).await.expect("response")).await;
        assert_eq!(listing["generation"], 2);
        assert_eq!(listing["landmarks"][0]["landmark_id"], "kremlin");
    }

    #[tokio::test]
    async fn test_reload_corrupt_keeps_snapshot() {
        let dir = TempDir::new().expect("tempdir");
        write(&dir, "tower.01.jpg", &at_similarity(0.95));
        let handle = StoreHandle::load(Arc::new(DirectorySource::new(dir.path())), DIM)
            .await
            .expect("load");
        let router = directory_router(handle.clone());

        std::fs::write(dir.path().join("tower.02.jpg.npy"), b"garbage").expect("write");
        let response = router.oneshot(reload_request()).await.expect("response");

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(status_header(&response), "store_error");
        assert_eq!(handle.generation(), 1);
        assert_eq!(handle.snapshot().len(), 1);
    }
}
