use base64::Engine;
use platform_view::{Celebrity, Role};
use reqwest::StatusCode;
use serde_json::{json, Value};
use serial_test::serial;

use crate::database::Database;
use crate::tests::api::TestServer;

async fn insert(server: &TestServer, owner: &str) -> i64 {
	server
		.global
		.db
		.insert_celebrity(&Celebrity {
			geo: "US".to_string(),
			name: "Adele".to_string(),
			category: "Music".to_string(),
			subject: "Singer".to_string(),
			owner: Some(owner.to_string()),
			..Default::default()
		})
		.await
		.expect("failed to insert record")
		.id
		.expect("record has an id")
}

#[serial]
#[tokio::test]
async fn test_serial_upload_serve_delete() {
	let server = TestServer::start().await;
	let (_, token) = server.user("alice", Role::TeamUser).await;
	let id = insert(&server, "alice").await;

	let client = reqwest::Client::new();
	let data = format!(
		"data:image/jpeg;base64,{}",
		base64::engine::general_purpose::STANDARD.encode(b"jpeg bytes")
	);

	let resp = client
		.post(server.url("/v1/images"))
		.bearer_auth(&token)
		.json(&json!({ "id": id, "imageName": "1-cimg1.jpg", "imageData": data }))
		.send()
		.await
		.expect("failed to upload");
	assert_eq!(resp.status(), StatusCode::OK);

	let body: Value = resp.json().await.expect("failed to read body");
	assert_eq!(
		body,
		json!({ "success": true, "imagePath": format!("/v1/images/{id}/1-cimg1.jpg") })
	);

	let resp = client
		.get(server.url(&format!("/v1/images/{id}/1-cimg1.jpg")))
		.send()
		.await
		.expect("failed to get image");
	assert_eq!(resp.status(), StatusCode::OK);
	assert_eq!(resp.headers()[reqwest::header::CONTENT_TYPE], "image/jpeg");
	assert_eq!(resp.headers()[reqwest::header::X_CONTENT_TYPE_OPTIONS], "nosniff");
	assert_eq!(resp.bytes().await.expect("failed to read image").as_ref(), b"jpeg bytes");

	let resp = client
		.delete(server.url("/v1/images"))
		.bearer_auth(&token)
		.json(&json!({ "id": id, "imageName": "1-cimg1.jpg" }))
		.send()
		.await
		.expect("failed to delete");
	assert_eq!(resp.status(), StatusCode::OK);

	let resp = client
		.get(server.url(&format!("/v1/images/{id}/1-cimg1.jpg")))
		.send()
		.await
		.expect("failed to get image");
	assert_eq!(resp.status(), StatusCode::NOT_FOUND);
	let body: Value = resp.json().await.expect("failed to read body");
	assert_eq!(body, json!({ "error": "Image not found" }));

	server.shutdown().await;
}

#[serial]
#[tokio::test]
async fn test_serial_svg_is_not_rendered() {
	let server = TestServer::start().await;
	let id = insert(&server, "alice").await;

	let svg = br#"<svg xmlns="http://www.w3.org/2000/svg"><script>alert(1)</script></svg>"#;
	server.global.image_store.save(id, "1-cimg1.svg", svg).await.unwrap();

	let resp = reqwest::get(server.url(&format!("/v1/images/{id}/1-cimg1.svg")))
		.await
		.expect("failed to get image");
	assert_eq!(resp.status(), StatusCode::OK);
	assert_eq!(resp.headers()[reqwest::header::CONTENT_TYPE], "application/octet-stream");
	assert_eq!(resp.headers()[reqwest::header::X_CONTENT_TYPE_OPTIONS], "nosniff");
	assert_eq!(resp.bytes().await.expect("failed to read image").as_ref(), svg);

	server.shutdown().await;
}

#[serial]
#[tokio::test]
async fn test_serial_upload_rejections() {
	let server = TestServer::start_with(|config| config.images.max_size = 4).await;
	let (_, alice) = server.user("alice", Role::TeamUser).await;
	let (_, newbie) = server.user("newbie", Role::NewUser).await;
	let own = insert(&server, "alice").await;
	let others = insert(&server, "bob").await;

	let client = reqwest::Client::new();
	let small = base64::engine::general_purpose::STANDARD.encode(b"ok");
	let large = base64::engine::general_purpose::STANDARD.encode(b"too large");

	let cases = [
		(&alice, json!({ "id": own, "imageName": "../x.jpg", "imageData": small }), StatusCode::BAD_REQUEST),
		(&alice, json!({ "id": own, "imageName": "x.jpg", "imageData": "%%%" }), StatusCode::BAD_REQUEST),
		(&alice, json!({ "id": own, "imageName": "x.jpg", "imageData": large }), StatusCode::PAYLOAD_TOO_LARGE),
		(&alice, json!({ "id": 999, "imageName": "x.jpg", "imageData": small }), StatusCode::NOT_FOUND),
		(&alice, json!({ "id": others, "imageName": "x.jpg", "imageData": small }), StatusCode::FORBIDDEN),
		(&newbie, json!({ "id": own, "imageName": "x.jpg", "imageData": small }), StatusCode::FORBIDDEN),
	];

	for (token, body, status) in cases {
		let resp = client
			.post(server.url("/v1/images"))
			.bearer_auth(token)
			.json(&body)
			.send()
			.await
			.expect("failed to upload");
		assert_eq!(resp.status(), status, "uploading {body}");
	}

	let resp = client
		.get(server.url("/v1/images/not-a-number/x.jpg"))
		.send()
		.await
		.expect("failed to get image");
	assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

	server.shutdown().await;
}
