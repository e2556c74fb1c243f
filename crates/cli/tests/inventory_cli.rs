use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tokio::net::TcpListener;

const TOKEN: &str = "cli-token";

fn make_home() -> tempfile::TempDir {
    tempfile::tempdir().expect("tempdir")
}

fn session_file(home: &Path) -> std::path::PathBuf {
    home.join(".config").join("dcinv").join("session.json")
}

fn write_session(home: &Path, access: &str) {
    let path = session_file(home);
    fs::create_dir_all(path.parent().expect("session dir")).expect("create session dir");
    fs::write(
        &path,
        json!({"access": access, "refresh": "cli-refresh"}).to_string(),
    )
    .expect("write session");
}

fn run_dcinv(home: &Path, server: &str, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_dcinv"))
        .args(args)
        .env("HOME", home)
        .env("DCINV_SERVER_URL", server)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .output()
        .expect("run dcinv")
}

async fn run_dcinv_async(home: &Path, server: &str, args: &[&str]) -> Output {
    let home = home.to_path_buf();
    let server = server.to_string();
    let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
    tokio::task::spawn_blocking(move || {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        run_dcinv(&home, &server, &args)
    })
    .await
    .expect("join dcinv")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {TOKEN}"))
}

async fn empty_equipment(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Given token not valid for any token type"})),
        )
            .into_response();
    }
    Json(json!([])).into_response()
}

async fn rejected_refresh() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"detail": "Token is invalid or expired"})),
    )
        .into_response()
}

async fn spawn_server() -> String {
    let app = Router::new()
        .route("/datacenters/{dc}/equipments/", get(empty_equipment))
        .route("/token/refresh/", post(rejected_refresh));
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock server");
    let address = listener.local_addr().expect("mock addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve mock");
    });
    format!("http://{address}")
}

#[test]
fn help_lists_commands() {
    let home = make_home();
    let output = run_dcinv(home.path(), "http://127.0.0.1:9", &["--help"]);
    assert!(output.status.success());
    let text = stdout(&output);
    for command in ["login", "show", "delete", "import", "export", "send-report", "config"] {
        assert!(text.contains(command), "missing {command} in:\n{text}");
    }
}

#[test]
fn config_set_persists_normalized_values() {
    let home = make_home();
    let output = Command::new(env!("CARGO_BIN_EXE_dcinv"))
        .args([
            "config",
            "--server",
            "https://inventory.example.com/api/",
            "--max-attempts",
            "4",
        ])
        .env("HOME", home.path())
        .env_remove("DCINV_SERVER_URL")
        .output()
        .expect("run dcinv config");
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("Configuration updated."));

    let written = fs::read_to_string(home.path().join(".config/dcinv/dcinv.toml"))
        .expect("config written");
    assert!(written.contains("url = \"https://inventory.example.com/api\""));
    assert!(written.contains("max_attempts = 4"));
    assert!(written.contains("request_secs = 10"));
}

#[test]
fn config_show_reports_env_override() {
    let home = make_home();
    let output = run_dcinv(home.path(), "http://override.local/api", &["config"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("url = http://override.local/api"), "{text}");
    assert!(text.contains("overridden by DCINV_SERVER_URL"));
    assert!(text.contains("(not logged in)"));
}

#[test]
fn show_without_login_fails_before_any_request() {
    let home = make_home();
    let output = run_dcinv(home.path(), "http://127.0.0.1:9/api", &["show", "1"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(
        stderr(&output).contains("Authentication required. Please log in again."),
        "stderr: {}",
        stderr(&output)
    );
}

#[test]
fn csv_import_is_rejected_locally() {
    let home = make_home();
    write_session(home.path(), TOKEN);
    let file = home.path().join("racks.csv");
    fs::write(&file, "a,b\n").expect("write csv");

    let output = run_dcinv(
        home.path(),
        "http://127.0.0.1:9/api",
        &["import", "1", file.to_str().expect("utf-8 path")],
    );

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Invalid file type"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn empty_datacenter_reports_no_equipment() {
    let server = spawn_server().await;
    let home = make_home();
    write_session(home.path(), TOKEN);

    let output = run_dcinv_async(home.path(), &server, &["show", "1"]).await;

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("No equipment data found. Add equipment to get started."));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn rejected_refresh_clears_saved_session() {
    let server = spawn_server().await;
    let home = make_home();
    write_session(home.path(), "expired-token");

    let output = run_dcinv_async(home.path(), &server, &["show", "1"]).await;

    assert_eq!(output.status.code(), Some(1));
    assert!(
        stderr(&output).contains("Session expired. Please log in again. Run `dcinv login`."),
        "stderr: {}",
        stderr(&output)
    );
    assert!(!session_file(home.path()).exists());
}
