//! End-to-end tests: `.npy` artifacts on disk, the stub embedder and the HTTP server.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::net::TcpListener;

use landmark::artifact::{DirectorySource, encode_npy};
use landmark::embedding::{ImageEmbedder, MockEmbedder, StubEmbedder};
use landmark::gateway::{HandlerState, LANDMARK_STATUS_HEADER, create_router_with_state};
use landmark::store::StoreHandle;
use landmark::verify::{EngineConfig, LandmarkVerifier, VerificationEngine};
use landmark::{EmbeddingVector, VerifyError};

const DIM: usize = 64;

fn png(tag: u8) -> Vec<u8> {
    let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.extend(std::iter::repeat_n(tag, 32));
    bytes
}

/// Returns `vector` with a small perturbation, still close to the original.
fn near(vector: &EmbeddingVector, shift: f32) -> Vec<f32> {
    let mut values = vector.as_slice().to_vec();
    values[0] += shift;
    values[1] -= shift;
    values
}

fn write_artifact(dir: &Path, name: &str, values: &[f32]) {
    std::fs::write(dir.join(format!("{}.npy", name)), encode_npy(values)).expect("write artifact");
}

/// Three near copies of the tower photo, one unrelated tower shot, two bridge shots.
fn seed_references(dir: &Path, embedder: &StubEmbedder) {
    let tower = embedder.embed_sync(&png(1)).expect("embed");
    write_artifact(dir, "tower.01.jpg", &near(&tower, 0.0));
    write_artifact(dir, "tower.02.jpg", &near(&tower, 0.01));
    write_artifact(dir, "tower.03.jpg", &near(&tower, -0.02));

    let other = embedder.embed_sync(&png(9)).expect("embed");
    write_artifact(dir, "tower.04.jpg", other.as_slice());

    for (i, tag) in [20u8, 21].into_iter().enumerate() {
        let bridge = embedder.embed_sync(&png(tag)).expect("embed");
        write_artifact(dir, &format!("bridge.{:02}.png", i + 1), bridge.as_slice());
    }
}

async fn stub_verifier(dir: &TempDir) -> LandmarkVerifier {
    let embedder = StubEmbedder::new(DIM);
    let store = StoreHandle::load(Arc::new(DirectorySource::new(dir.path())), DIM)
        .await
        .expect("initial load");
    LandmarkVerifier::new(
        Arc::new(embedder),
        store,
        VerificationEngine::new(EngineConfig::new(0.80, 3).expect("config")),
        Duration::from_secs(5),
    )
}

async fn spawn_server(verifier: LandmarkVerifier) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let app = create_router_with_state(HandlerState::new(verifier));

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server");
    });

    addr
}

#[tokio::test]
async fn test_library_flow_from_directory() {
    let dir = TempDir::new().expect("tempdir");
    seed_references(dir.path(), &StubEmbedder::new(DIM));
    let verifier = stub_verifier(&dir).await;

    let result = verifier.verify("tower", &png(1)).await.expect("verify");
    assert!(result.matched);
    assert_eq!(result.match_count, 3);
    assert_eq!(result.scored.len(), 4);
    assert_eq!(result.scored[0].source_name, "tower.01.jpg");
    assert!((result.scored[0].similarity - 1.0).abs() < 1e-5);

    let result = verifier.verify("bridge", &png(1)).await.expect("verify");
    assert!(!result.matched);
    assert_eq!(result.match_count, 0);

    let err = verifier.verify("kremlin", &png(1)).await.expect_err("unknown");
    assert!(matches!(err, VerifyError::UnknownLandmark { .. }));
}

#[tokio::test]
async fn test_reload_adds_landmark() {
    let dir = TempDir::new().expect("tempdir");
    let embedder = StubEmbedder::new(DIM);
    seed_references(dir.path(), &embedder);
    let verifier = stub_verifier(&dir).await;

    assert!(matches!(
        verifier.verify("kremlin", &png(40)).await,
        Err(VerifyError::UnknownLandmark { .. })
    ));

    let kremlin = embedder.embed_sync(&png(40)).expect("embed");
    for i in 1..=3 {
        write_artifact(
            dir.path(),
            &format!("Kremlin.{:02}.jpg", i),
            &near(&kremlin, i as f32 * 0.01),
        );
    }

    let outcome = verifier.store().reload().await.expect("reload");
    assert_eq!(outcome.generation(), 2);

    let result = verifier.verify("KREMLIN", &png(40)).await.expect("verify");
    assert!(result.matched);
    assert_eq!(result.landmark_id, "kremlin");
}

#[tokio::test]
async fn test_mismatched_artifact_fails_initial_load() {
    let dir = TempDir::new().expect("tempdir");
    seed_references(dir.path(), &StubEmbedder::new(DIM));
    write_artifact(dir.path(), "tower.09.jpg", &[1.0; DIM / 2]);

    let err = StoreHandle::load(Arc::new(DirectorySource::new(dir.path())), DIM)
        .await
        .expect_err("corrupt artifact");
    assert!(err.to_string().contains("tower.09.jpg"));
}

#[tokio::test]
async fn test_http_verify_round() {
    let dir = TempDir::new().expect("tempdir");
    seed_references(dir.path(), &StubEmbedder::new(DIM));
    let addr = spawn_server(stub_verifier(&dir).await).await;
    let client = reqwest::Client::new();

    let health = client
        .get(format!("http://{}/healthz", addr))
        .send()
        .await
        .expect("healthz");
    assert!(health.status().is_success());

    let response = client
        .post(format!("http://{}/v1/landmarks/tower/verify", addr))
        .body(png(1))
        .send()
        .await
        .expect("verify");
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(LANDMARK_STATUS_HEADER)
            .and_then(|v| v.to_str().ok()),
        Some("matched")
    );
    let body: serde_json::Value = response.json().await.expect("json");
    assert_eq!(body["match_count"], 3);

    let response = client
        .post(format!("http://{}/v1/landmarks/bridge/verify", addr))
        .body(png(1))
        .send()
        .await
        .expect("verify");
    assert_eq!(
        response
            .headers()
            .get(LANDMARK_STATUS_HEADER)
            .and_then(|v| v.to_str().ok()),
        Some("not_matched")
    );

    let landmarks: serde_json::Value = client
        .get(format!("http://{}/v1/landmarks", addr))
        .send()
        .await
        .expect("landmarks")
        .json()
        .await
        .expect("json");
    assert_eq!(landmarks["landmarks"][0]["landmark_id"], "bridge");
    assert_eq!(landmarks["landmarks"][1]["references"], 4);
}

#[tokio::test]
async fn test_http_unknown_landmark_is_not_found() {
    let dir = TempDir::new().expect("tempdir");
    seed_references(dir.path(), &StubEmbedder::new(DIM));

    let mock = MockEmbedder::returning(EmbeddingVector::from_raw(vec![1.0; DIM]).expect("vector"));
    assert_eq!(mock.dimension(), DIM);
    let store = StoreHandle::load(Arc::new(DirectorySource::new(dir.path())), DIM)
        .await
        .expect("load");
    let verifier = LandmarkVerifier::new(
        Arc::new(mock.clone()),
        store,
        VerificationEngine::default(),
        Duration::from_secs(5),
    );
    let addr = spawn_server(verifier).await;

    let response = reqwest::Client::new()
        .post(format!("http://{}/v1/landmarks/atlantis/verify", addr))
        .body(png(1))
        .send()
        .await
        .expect("verify");

    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
    assert_eq!(mock.calls(), 0);
}

async fn run_health_check_binary(port: u16) -> std::process::ExitStatus {
    tokio::process::Command::new(env!("CARGO_BIN_EXE_landmark-verify"))
        .arg("--health-check")
        .env("LANDMARK_PORT", port.to_string())
        .status()
        .await
        .expect("run binary")
}

#[tokio::test]
async fn test_binary_health_check_against_running_server() {
    let dir = TempDir::new().expect("tempdir");
    seed_references(dir.path(), &StubEmbedder::new(DIM));
    let addr = spawn_server(stub_verifier(&dir).await).await;

    let status = run_health_check_binary(addr.port()).await;

    assert_eq!(status.code(), Some(0));
}

#[tokio::test]
async fn test_binary_health_check_without_server() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        listener.local_addr().expect("local addr").port()
    };

    let status = run_health_check_binary(port).await;

    assert_eq!(status.code(), Some(1));
}
