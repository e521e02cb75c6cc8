use reqwest::{header, Method, StatusCode};
use serde_json::{json, Value};
use serial_test::serial;

use crate::tests::api::TestServer;

#[serial]
#[tokio::test]
async fn test_serial_health() {
	let server = TestServer::start().await;

	let resp = reqwest::get(server.url("/v1/health")).await.expect("failed to get health");

	assert_eq!(resp.status(), StatusCode::OK);
	assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
	assert_eq!(resp.headers()[header::CONTENT_TYPE], "application/json");

	let body: Value = resp.json().await.expect("failed to read body");
	assert_eq!(body, json!({ "status": "ok" }));

	server.shutdown().await;
}

#[serial]
#[tokio::test]
async fn test_serial_not_found() {
	let server = TestServer::start().await;

	let resp = reqwest::get(server.url("/v1/does-not-exist")).await.expect("failed to send request");

	assert_eq!(resp.status(), StatusCode::NOT_FOUND);
	let body: Value = resp.json().await.expect("failed to read body");
	assert_eq!(body, json!({ "error": "not found" }));

	server.shutdown().await;
}

#[serial]
#[tokio::test]
async fn test_serial_preflight() {
	let server = TestServer::start_with(|config| {
		config.api.cors_origin = "https://admin.example.com".to_string();
	})
	.await;

	let resp = reqwest::Client::new()
		.request(Method::OPTIONS, server.url("/v1/celebrities"))
		.send()
		.await
		.expect("failed to send preflight");

	assert_eq!(resp.status(), StatusCode::NO_CONTENT);
	assert_eq!(
		resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
		"https://admin.example.com"
	);
	assert_eq!(
		resp.headers()[header::ACCESS_CONTROL_ALLOW_METHODS],
		"GET, POST, DELETE, OPTIONS"
	);
	assert_eq!(
		resp.headers()[header::ACCESS_CONTROL_ALLOW_HEADERS],
		"Content-Type, Authorization"
	);

	server.shutdown().await;
}
