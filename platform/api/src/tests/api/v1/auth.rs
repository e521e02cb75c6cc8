use platform_view::Role;
use reqwest::{header, StatusCode};
use serde_json::{json, Value};
use serial_test::serial;

use crate::database::Database;
use crate::tests::api::TestServer;

#[serial]
#[tokio::test]
async fn test_serial_login_and_me() {
	let server = TestServer::start().await;
	server.user_with_password("alice", "password123", Role::TeamUser).await;

	let client = reqwest::Client::new();

	let resp = client
		.post(server.url("/v1/auth/login"))
		.json(&json!({ "email": "Alice@Example.com", "password": "password123" }))
		.send()
		.await
		.expect("failed to login");
	assert_eq!(resp.status(), StatusCode::OK);

	let body: Value = resp.json().await.expect("failed to read body");
	assert_eq!(
		body["user"],
		json!({ "name": "alice", "email": "alice@example.com", "role": "teamUser" })
	);
	let token = body["token"].as_str().expect("token is a string").to_string();

	let resp = client
		.get(server.url("/v1/auth/me"))
		.bearer_auth(&token)
		.send()
		.await
		.expect("failed to get me");
	assert_eq!(resp.status(), StatusCode::OK);

	let body: Value = resp.json().await.expect("failed to read body");
	assert_eq!(body, json!({ "name": "alice", "email": "alice@example.com", "role": "teamUser" }));

	server.shutdown().await;
}

#[serial]
#[tokio::test]
async fn test_serial_login_rejects_bad_credentials() {
	let server = TestServer::start().await;
	server.user_with_password("alice", "password123", Role::TeamUser).await;

	let client = reqwest::Client::new();

	for (email, password) in [("alice@example.com", "wrong-password"), ("nobody@example.com", "password123")] {
		let resp = client
			.post(server.url("/v1/auth/login"))
			.json(&json!({ "email": email, "password": password }))
			.send()
			.await
			.expect("failed to login");
		assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

		let body: Value = resp.json().await.expect("failed to read body");
		assert_eq!(body, json!({ "error": "Invalid email or password" }));
	}

	let resp = client
		.post(server.url("/v1/auth/login"))
		.body("not json")
		.send()
		.await
		.expect("failed to login");
	assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

	server.shutdown().await;
}

#[serial]
#[tokio::test]
async fn test_serial_me_requires_valid_token() {
	let server = TestServer::start().await;
	let client = reqwest::Client::new();

	let cases = [
		(None, "not logged in"),
		(Some("Bearer garbage"), "invalid token"),
		(Some("Basic YWxpY2U6cGFzcw=="), "token must be a bearer token"),
	];

	for (authorization, error) in cases {
		let mut req = client.get(server.url("/v1/auth/me"));
		if let Some(value) = authorization {
			req = req.header(header::AUTHORIZATION, value);
		}

		let resp = req.send().await.expect("failed to get me");
		assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

		let body: Value = resp.json().await.expect("failed to read body");
		assert_eq!(body, json!({ "error": error }));
	}

	// A token for a user that no longer exists.
	let (user, token) = server.user("ghost", Role::TeamUser).await;
	server.global.db.delete_user(user.id).await.expect("failed to delete user");

	let resp = client
		.get(server.url("/v1/auth/me"))
		.bearer_auth(&token)
		.send()
		.await
		.expect("failed to get me");
	assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

	server.shutdown().await;
}

#[serial]
#[tokio::test]
async fn test_serial_register() {
	let server = TestServer::start().await;
	let client = reqwest::Client::new();

	let resp = client
		.post(server.url("/v1/auth/register"))
		.json(&json!({ "email": "carol@example.com", "password": "secret1", "name": "Carol" }))
		.send()
		.await
		.expect("failed to register");
	assert_eq!(resp.status(), StatusCode::CREATED);

	let body: Value = resp.json().await.expect("failed to read body");
	assert_eq!(
		body["user"],
		json!({ "name": "Carol", "email": "carol@example.com", "role": "newUser" })
	);
	assert!(body["token"].is_string());

	let resp = client
		.post(server.url("/v1/auth/register"))
		.json(&json!({ "email": "CAROL@example.com", "password": "secret2" }))
		.send()
		.await
		.expect("failed to register");
	assert_eq!(resp.status(), StatusCode::CONFLICT);
	let body: Value = resp.json().await.expect("failed to read body");
	assert_eq!(body, json!({ "error": "Email already registered" }));

	let resp = client
		.post(server.url("/v1/auth/register"))
		.json(&json!({ "email": "dave@example.com", "password": "short" }))
		.send()
		.await
		.expect("failed to register");
	assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

	let resp = client
		.post(server.url("/v1/auth/register"))
		.json(&json!({ "email": "not-an-email", "password": "long enough" }))
		.send()
		.await
		.expect("failed to register");
	assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
	let body: Value = resp.json().await.expect("failed to read body");
	assert_eq!(body, json!({ "error": "Invalid email address" }));

	// Without a name the local part of the email is used.
	let resp = client
		.post(server.url("/v1/auth/register"))
		.json(&json!({ "email": "erin@example.com", "password": "secret1" }))
		.send()
		.await
		.expect("failed to register");
	assert_eq!(resp.status(), StatusCode::CREATED);
	let body: Value = resp.json().await.expect("failed to read body");
	assert_eq!(body["user"]["name"], "erin");

	server.shutdown().await;
}

#[serial]
#[tokio::test]
async fn test_serial_user_management() {
	let server = TestServer::start().await;
	let (admin, admin_token) = server.user("root", Role::Admin).await;
	let (team, team_token) = server.user("alice", Role::TeamUser).await;

	let client = reqwest::Client::new();

	let resp = client
		.get(server.url("/v1/auth/users"))
		.bearer_auth(&team_token)
		.send()
		.await
		.expect("failed to list users");
	assert_eq!(resp.status(), StatusCode::FORBIDDEN);

	let resp = client
		.get(server.url("/v1/auth/users"))
		.bearer_auth(&admin_token)
		.send()
		.await
		.expect("failed to list users");
	assert_eq!(resp.status(), StatusCode::OK);
	let body: Value = resp.json().await.expect("failed to read body");
	assert_eq!(body.as_array().map(Vec::len), Some(2));
	assert!(body[0].get("password_hash").is_none());

	// Promote alice.
	let resp = client
		.post(server.url("/v1/auth/users"))
		.bearer_auth(&admin_token)
		.json(&json!({ "id": team.id, "role": "admin" }))
		.send()
		.await
		.expect("failed to update user");
	assert_eq!(resp.status(), StatusCode::OK);
	let body: Value = resp.json().await.expect("failed to read body");
	assert_eq!(body["role"], "admin");

	// Her existing token picks up the new role.
	let resp = client
		.get(server.url("/v1/auth/me"))
		.bearer_auth(&team_token)
		.send()
		.await
		.expect("failed to get me");
	let body: Value = resp.json().await.expect("failed to read body");
	assert_eq!(body["role"], "admin");

	let resp = client
		.post(server.url("/v1/auth/users"))
		.bearer_auth(&admin_token)
		.json(&json!({ "id": admin.id, "action": "delete" }))
		.send()
		.await
		.expect("failed to delete user");
	assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

	let resp = client
		.post(server.url("/v1/auth/users"))
		.bearer_auth(&admin_token)
		.json(&json!({ "id": team.id, "action": "promote" }))
		.send()
		.await
		.expect("failed to update user");
	assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

	let resp = client
		.post(server.url("/v1/auth/users"))
		.bearer_auth(&admin_token)
		.json(&json!({ "id": team.id, "action": "delete" }))
		.send()
		.await
		.expect("failed to delete user");
	assert_eq!(resp.status(), StatusCode::OK);

	let resp = client
		.post(server.url("/v1/auth/users"))
		.bearer_auth(&admin_token)
		.json(&json!({ "id": team.id, "action": "delete" }))
		.send()
		.await
		.expect("failed to delete user");
	assert_eq!(resp.status(), StatusCode::NOT_FOUND);

	let users = server.global.db.list_users().await.expect("failed to list users");
	assert_eq!(users.len(), 1);

	server.shutdown().await;
}
