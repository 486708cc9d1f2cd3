//! End-to-end upload tests against an in-process HTTP server.
//!
//! The server parses the request with axum's multipart extractor, so these
//! tests check that the streamed body is well-formed on the wire.

use std::collections::HashMap;
use std::fs;
use std::sync::{Arc, Mutex};

use axum::extract::{Multipart, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;
use clap::Parser;
use tempfile::TempDir;

use faynosync_cli::app::App;
use faynosync_cli::cli::Cli;
use faynosync_cli::config::{RuntimeConfig, ENV_ACCOUNT, ENV_TOKEN, ENV_URL};
use faynosync_cli::error::FaynoError;
use faynosync_cli::upload::{run_upload, ReportSink, UploadIntent, UploadOutcome};

#[derive(Debug, Clone)]
struct ReceivedPart {
    name: String,
    file_name: Option<String>,
    content_type: Option<String>,
    data: Vec<u8>,
}

#[derive(Debug, Default)]
struct Received {
    authorization: Option<String>,
    content_type: Option<String>,
    parts: Vec<ReceivedPart>,
}

#[derive(Clone)]
struct ServerState {
    received: Arc<Mutex<Received>>,
    status: StatusCode,
    reply: String,
}

async fn upload_handler(
    State(state): State<ServerState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> (StatusCode, String) {
    let mut parts = Vec::new();
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                let name = field.name().unwrap_or_default().to_string();
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let data = match field.bytes().await {
                    Ok(data) => data.to_vec(),
                    Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()),
                };
                parts.push(ReceivedPart {
                    name,
                    file_name,
                    content_type,
                    data,
                });
            }
            Ok(None) => break,
            Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()),
        }
    }

    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let mut received = state.received.lock().unwrap();
    received.authorization = header("authorization");
    received.content_type = header("content-type");
    received.parts = parts;

    (state.status, state.reply.clone())
}

/// Start a server on an ephemeral port and return its base URL.
async fn spawn_server(status: StatusCode, reply: impl Into<String>) -> (String, Arc<Mutex<Received>>) {
    let received = Arc::new(Mutex::new(Received::default()));
    let state = ServerState {
        received: received.clone(),
        status,
        reply: reply.into(),
    };
    let router = Router::new()
        .route("/upload", post(upload_handler))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (format!("http://{addr}/"), received)
}

#[derive(Default)]
struct RecordingSink {
    outcomes: Mutex<Vec<UploadOutcome>>,
}

impl ReportSink for RecordingSink {
    fn report(&self, outcome: &UploadOutcome) {
        self.outcomes.lock().unwrap().push(outcome.clone());
    }
}

fn runtime(server: &str) -> RuntimeConfig {
    RuntimeConfig {
        token: "secret-token".to_string(),
        server: server.to_string(),
        owner: "acme".to_string(),
    }
}

fn write_artifacts(dir: &TempDir) -> (String, String) {
    let tarball = dir.path().join("myapp-1.1.0.tar.gz");
    let package = dir.path().join("myapp_1.1.0_amd64.deb");
    fs::write(&tarball, b"\x1f\x8btarball-bytes").unwrap();
    fs::write(&package, vec![b'd'; 200 * 1024]).unwrap();
    (
        tarball.display().to_string(),
        package.display().to_string(),
    )
}

#[tokio::test]
async fn test_upload_streams_files_then_metadata() {
    let dir = TempDir::new().unwrap();
    let (tarball, package) = write_artifacts(&dir);
    let (server, received) =
        spawn_server(StatusCode::OK, r#"{"uploadResult":{"Uploaded":"abc123"}}"#).await;

    let intent = UploadIntent {
        app_name: "myapp".to_string(),
        files: vec![package.clone(), tarball.clone()],
        version: "1.1.0".to_string(),
        channel: "stable".to_string(),
        platform: "linux".to_string(),
        arch: "amd64".to_string(),
        publish: true,
        changelog_stdin: true,
        ..Default::default()
    };
    let sink = RecordingSink::default();
    let mut stdin: &[u8] = b"\xef\xbb\xbf- fix\r\n- feature\r\n";

    let outcome = run_upload(&intent, &runtime(&server), &mut stdin, &sink)
        .await
        .unwrap();

    let expected = UploadOutcome::Completed {
        files: 2,
        app: "myapp".to_string(),
        version: "1.1.0".to_string(),
        uploaded_id: "abc123".to_string(),
    };
    assert_eq!(outcome, expected);
    assert_eq!(*sink.outcomes.lock().unwrap(), vec![expected]);

    let received = received.lock().unwrap();
    assert_eq!(received.authorization.as_deref(), Some("Bearer secret-token"));
    assert!(received
        .content_type
        .as_deref()
        .unwrap()
        .starts_with("multipart/form-data; boundary="));

    let names: Vec<_> = received.parts.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["file", "file", "data"]);
    assert_eq!(
        received.parts[0].content_type.as_deref(),
        Some("application/octet-stream")
    );
    assert_eq!(received.parts[2].file_name, None);

    assert_eq!(
        received.parts[0].file_name.as_deref(),
        Some("myapp_1.1.0_amd64.deb")
    );
    assert_eq!(received.parts[0].data, fs::read(&package).unwrap());
    assert_eq!(
        received.parts[1].file_name.as_deref(),
        Some("myapp-1.1.0.tar.gz")
    );
    assert_eq!(received.parts[1].data, fs::read(&tarball).unwrap());

    let metadata: serde_json::Value = serde_json::from_slice(&received.parts[2].data).unwrap();
    assert_eq!(
        metadata,
        serde_json::json!({
            "app_name": "myapp",
            "version": "1.1.0",
            "channel": "stable",
            "publish": true,
            "critical": false,
            "intermediate": false,
            "platform": "linux",
            "arch": "amd64",
            "changelog": "- fix\n- feature\n",
        })
    );
}

#[tokio::test]
async fn test_file_names_are_sent_verbatim() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("My App (x64) 1.0.zip");
    fs::write(&path, b"zip-bytes").unwrap();
    let (server, received) = spawn_server(StatusCode::OK, "{}").await;

    let intent = UploadIntent {
        files: vec![path.display().to_string()],
        ..Default::default()
    };
    run_upload(
        &intent,
        &runtime(&server),
        &mut tokio::io::empty(),
        &RecordingSink::default(),
    )
    .await
    .unwrap();

    let received = received.lock().unwrap();
    assert_eq!(
        received.parts[0].file_name.as_deref(),
        Some("My App (x64) 1.0.zip")
    );
    assert_eq!(received.parts[0].data, b"zip-bytes");
    assert_eq!(received.parts[1].name, "data");
}

#[tokio::test]
async fn test_rejection_is_reported_not_raised() {
    let dir = TempDir::new().unwrap();
    let (tarball, _) = write_artifacts(&dir);
    let (server, _) = spawn_server(StatusCode::UNAUTHORIZED, "  invalid token\n").await;

    let intent = UploadIntent {
        files: vec![tarball],
        ..Default::default()
    };
    let sink = RecordingSink::default();
    let outcome = run_upload(&intent, &runtime(&server), &mut tokio::io::empty(), &sink)
        .await
        .unwrap();

    let expected = UploadOutcome::Rejected {
        status: 401,
        body: "invalid token".to_string(),
    };
    assert_eq!(outcome, expected);
    assert_eq!(*sink.outcomes.lock().unwrap(), vec![expected]);
}

#[tokio::test]
async fn test_oversized_response_is_truncated() {
    let dir = TempDir::new().unwrap();
    let (tarball, _) = write_artifacts(&dir);
    let (server, _) = spawn_server(StatusCode::INTERNAL_SERVER_ERROR, "x".repeat(3 << 20)).await;

    let intent = UploadIntent {
        files: vec![tarball],
        ..Default::default()
    };
    let outcome = run_upload(
        &intent,
        &runtime(&server),
        &mut tokio::io::empty(),
        &RecordingSink::default(),
    )
    .await
    .unwrap();

    match outcome {
        UploadOutcome::Rejected { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body.len(), 1 << 20);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test]
async fn test_unrecognised_response_gives_empty_id() {
    let dir = TempDir::new().unwrap();
    let (tarball, _) = write_artifacts(&dir);
    let (server, _) = spawn_server(StatusCode::CREATED, r#"{"foo":"bar"}"#).await;

    let intent = UploadIntent {
        app_name: "myapp".to_string(),
        files: vec![tarball],
        ..Default::default()
    };
    let outcome = run_upload(
        &intent,
        &runtime(&server),
        &mut tokio::io::empty(),
        &RecordingSink::default(),
    )
    .await
    .unwrap();

    assert!(matches!(
        outcome,
        UploadOutcome::Completed { ref uploaded_id, .. } if uploaded_id.is_empty()
    ));
}

#[tokio::test]
async fn test_missing_file_aborts_upload() {
    let dir = TempDir::new().unwrap();
    let (tarball, _) = write_artifacts(&dir);
    let missing = dir.path().join("missing.bin").display().to_string();
    let (server, _) = spawn_server(StatusCode::OK, "{}").await;

    let intent = UploadIntent {
        files: vec![tarball, missing.clone()],
        ..Default::default()
    };
    let sink = RecordingSink::default();
    let err = run_upload(&intent, &runtime(&server), &mut tokio::io::empty(), &sink)
        .await
        .unwrap_err();

    assert!(matches!(err, FaynoError::OpenFile { ref path, .. } if *path == missing));
    assert!(sink.outcomes.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let dir = TempDir::new().unwrap();
    let (tarball, _) = write_artifacts(&dir);
    let intent = UploadIntent {
        files: vec![tarball],
        ..Default::default()
    };
    let err = run_upload(
        &intent,
        &runtime(&format!("http://{addr}")),
        &mut tokio::io::empty(),
        &RecordingSink::default(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, FaynoError::Http(_)));
}

#[tokio::test]
async fn test_cli_upload_end_to_end() {
    let dir = TempDir::new().unwrap();
    let (tarball, _) = write_artifacts(&dir);
    let changelog = dir.path().join("CHANGELOG.md");
    fs::write(&changelog, "## 2.0.0\r\n- rewrite\r\n").unwrap();
    let (server, received) = spawn_server(StatusCode::OK, r#"{"uploaded_id":"id-42"}"#).await;

    let env: HashMap<String, String> = [
        (ENV_TOKEN, "cli-token"),
        (ENV_URL, server.as_str()),
        (ENV_ACCOUNT, "acme"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    let sink = Arc::new(RecordingSink::default());
    let mut app = App::new(&b""[..], Vec::new())
        .with_env(move |key: &str| env.get(key).cloned())
        .with_config_path(dir.path().join("unused.yaml"))
        .with_sink(sink.clone());

    let cli = Cli::try_parse_from([
        "faynosync",
        "upload",
        "--app=myapp",
        "--version",
        "2.0.0",
        "--file",
        tarball.as_str(),
        "--critical",
        "--intermediate",
        "false",
        "--changelog-file",
        changelog.to_str().unwrap(),
    ])
    .unwrap();
    app.run(cli).await.unwrap();

    assert_eq!(
        *sink.outcomes.lock().unwrap(),
        vec![UploadOutcome::Completed {
            files: 1,
            app: "myapp".to_string(),
            version: "2.0.0".to_string(),
            uploaded_id: "id-42".to_string(),
        }]
    );

    let received = received.lock().unwrap();
    assert_eq!(received.authorization.as_deref(), Some("Bearer cli-token"));
    let metadata: serde_json::Value = serde_json::from_slice(&received.parts[1].data).unwrap();
    assert_eq!(metadata["critical"], true);
    assert_eq!(metadata["intermediate"], false);
    assert_eq!(metadata["changelog"], "## 2.0.0\n- rewrite\n");
}
