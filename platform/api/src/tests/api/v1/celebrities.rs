use platform_view::{Celebrity, Role};
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde_json::{json, Value};
use serial_test::serial;

use crate::database::Database;
use crate::tests::api::TestServer;

fn record(name: &str, owner: Option<&str>) -> Celebrity {
	Celebrity {
		geo: "US".to_string(),
		name: name.to_string(),
		category: "Music".to_string(),
		subject: "Singer".to_string(),
		owner: owner.map(str::to_string),
		..Default::default()
	}
}

fn full_form(name: &str) -> Form {
	Form::new()
		.text("geo", "US")
		.text("name", name.to_string())
		.text("category", "Music")
		.text("subject", "Singer")
}

async fn submit(server: &TestServer, token: &str, form: Form) -> (StatusCode, Value) {
	let resp = reqwest::Client::new()
		.post(server.url("/v1/celebrities"))
		.bearer_auth(token)
		.multipart(form)
		.send()
		.await
		.expect("failed to submit");

	let status = resp.status();
	(status, resp.json().await.expect("failed to read body"))
}

#[serial]
#[tokio::test]
async fn test_serial_list_is_public() {
	let server = TestServer::start().await;
	server.global.db.insert_celebrity(&record("Adele", Some("alice"))).await.unwrap();
	server.global.db.insert_celebrity(&record("Beyonce", None)).await.unwrap();

	let resp = reqwest::get(server.url("/v1/celebrities")).await.expect("failed to list");
	assert_eq!(resp.status(), StatusCode::OK);

	let records: Vec<Celebrity> = resp.json().await.expect("failed to read body");
	assert_eq!(records.len(), 2);
	assert_eq!(records[0].id, Some(1));
	assert_eq!(records[0].owner.as_deref(), Some("alice"));
	assert_eq!(records[1].name, "Beyonce");

	server.shutdown().await;
}

#[serial]
#[tokio::test]
async fn test_serial_create_blank() {
	let server = TestServer::start().await;
	let (_, new_token) = server.user("newbie", Role::NewUser).await;
	let (_, team_token) = server.user("alice", Role::TeamUser).await;

	let client = reqwest::Client::new();

	let resp = client
		.post(server.url("/v1/celebrities/create"))
		.send()
		.await
		.expect("failed to create");
	assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

	let resp = client
		.post(server.url("/v1/celebrities/create"))
		.bearer_auth(&new_token)
		.send()
		.await
		.expect("failed to create");
	assert_eq!(resp.status(), StatusCode::FORBIDDEN);

	let resp = client
		.post(server.url("/v1/celebrities/create"))
		.bearer_auth(&team_token)
		.send()
		.await
		.expect("failed to create");
	assert_eq!(resp.status(), StatusCode::CREATED);

	let created: Celebrity = resp.json().await.expect("failed to read body");
	assert_eq!(created.id, Some(1));
	assert_eq!(created.owner.as_deref(), Some("alice"));
	assert!(created.name.is_empty());

	server.shutdown().await;
}

#[serial]
#[tokio::test]
async fn test_serial_submit_requires_fields() {
	let server = TestServer::start().await;
	let (_, token) = server.user("alice", Role::TeamUser).await;

	let (status, body) = submit(&server, &token, Form::new().text("name", "Adele").text("geo", "  ")).await;
	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body, json!({ "error": "Missing required fields: geo, category, subject" }));

	assert!(server.global.db.list_celebrities().await.unwrap().is_empty());

	server.shutdown().await;
}

#[serial]
#[tokio::test]
async fn test_serial_submit_create_and_update() {
	let server = TestServer::start().await;
	let (_, token) = server.user("alice", Role::TeamUser).await;

	let form = full_form("Adele")
		.text("about", "British singer")
		.text("owner", "")
		.part("cimg2", Part::bytes(vec![1u8, 2, 3]).file_name("portrait.PNG"));

	let (status, body) = submit(&server, &token, form).await;
	assert_eq!(status, StatusCode::CREATED);

	let created: Celebrity = serde_json::from_value(body).expect("response is a record");
	let id = created.id.expect("created record has an id");
	assert_eq!(created.owner.as_deref(), Some("alice"));
	assert_eq!(created.about, "British singer");

	let image = created.images.get(2).expect("uploaded image is referenced").to_string();
	assert!(image.ends_with("-cimg2.png"), "unexpected image name {image}");
	assert!(server.images_dir().join(id.to_string()).join(&image).exists());

	let resp = reqwest::get(server.url(&format!("/v1/images/{id}/{image}")))
		.await
		.expect("failed to get image");
	assert_eq!(resp.status(), StatusCode::OK);
	assert_eq!(resp.headers()[reqwest::header::CONTENT_TYPE], "image/png");
	assert_eq!(resp.bytes().await.expect("failed to read image").as_ref(), &[1u8, 2, 3]);

	// Updates replace the record with the submitted form.
	let form = full_form("Adele Adkins").text("id", id.to_string()).text("cimg2", image.clone());
	let (status, body) = submit(&server, &token, form).await;
	assert_eq!(status, StatusCode::OK);

	let updated: Celebrity = serde_json::from_value(body).expect("response is a record");
	assert_eq!(updated.id, Some(id));
	assert_eq!(updated.name, "Adele Adkins");
	assert_eq!(updated.about, "");
	assert_eq!(updated.images.get(2), Some(image.as_str()));
	assert_eq!(server.global.db.get_celebrity(id).await.unwrap(), Some(updated));

	let (status, _) = submit(&server, &token, full_form("Nobody").text("id", "999")).await;
	assert_eq!(status, StatusCode::NOT_FOUND);

	let (status, _) = submit(&server, &token, full_form("Nobody").text("id", "abc")).await;
	assert_eq!(status, StatusCode::BAD_REQUEST);

	server.shutdown().await;
}

#[serial]
#[tokio::test]
async fn test_serial_ownership_rules() {
	let server = TestServer::start().await;
	let (_, alice) = server.user("alice", Role::TeamUser).await;
	let (_, admin) = server.user("root", Role::Admin).await;
	let (_, newbie) = server.user("newbie", Role::NewUser).await;

	let bobs = server.global.db.insert_celebrity(&record("Bob's", Some("bob"))).await.unwrap();
	let unowned = server.global.db.insert_celebrity(&record("Shared", Some("#N/A"))).await.unwrap();
	let bobs_id = bobs.id.unwrap().to_string();
	let unowned_id = unowned.id.unwrap().to_string();

	let (status, _) = submit(&server, &alice, full_form("Taken").text("id", bobs_id.clone())).await;
	assert_eq!(status, StatusCode::FORBIDDEN);

	let (status, _) = submit(&server, &alice, Form::new().text("action", "delete").text("id", bobs_id.clone())).await;
	assert_eq!(status, StatusCode::FORBIDDEN);

	let (status, _) = submit(&server, &newbie, full_form("Nope")).await;
	assert_eq!(status, StatusCode::FORBIDDEN);

	// Team users may edit unowned records.
	let form = full_form("Shared").text("id", unowned_id).text("owner", "#n/a");
	let (status, body) = submit(&server, &alice, form).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["owner"], "#n/a");

	// Team users may not hand records to someone else.
	let alices = server.global.db.insert_celebrity(&record("Alice's", Some("alice"))).await.unwrap();
	let alices_id = alices.id.unwrap().to_string();
	let form = full_form("Alice's").text("id", alices_id.clone()).text("owner", "bob");
	let (status, _) = submit(&server, &alice, form).await;
	assert_eq!(status, StatusCode::FORBIDDEN);
	let stored = server.global.db.get_celebrity(alices.id.unwrap()).await.unwrap().unwrap();
	assert_eq!(stored.owner.as_deref(), Some("alice"));

	let (status, _) = submit(&server, &alice, full_form("Gift").text("owner", "bob")).await;
	assert_eq!(status, StatusCode::FORBIDDEN);

	let form = Form::new().text("action", "duplicate").text("id", alices_id).text("owner", "bob");
	let (status, _) = submit(&server, &alice, form).await;
	assert_eq!(status, StatusCode::FORBIDDEN);

	// Admins may edit anything.
	let form = full_form("Bob's").text("id", bobs_id).text("owner", "bob").text("about", "edited");
	let (status, body) = submit(&server, &admin, form).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["about"], "edited");
	assert_eq!(body["owner"], "bob");

	server.shutdown().await;
}

#[serial]
#[tokio::test]
async fn test_serial_delete() {
	let server = TestServer::start().await;
	let (_, token) = server.user("alice", Role::TeamUser).await;

	let saved = server.global.db.insert_celebrity(&record("Adele", Some("alice"))).await.unwrap();
	let id = saved.id.unwrap();
	server.global.image_store.save(id, "a.jpg", b"a").await.unwrap();

	let (status, body) = submit(&server, &token, Form::new().text("action", "delete").text("id", id.to_string())).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["name"], "Adele");

	assert!(server.global.db.get_celebrity(id).await.unwrap().is_none());
	assert!(!server.images_dir().join(id.to_string()).exists());

	let (status, _) = submit(&server, &token, Form::new().text("action", "delete").text("id", id.to_string())).await;
	assert_eq!(status, StatusCode::NOT_FOUND);

	let (status, body) = submit(&server, &token, Form::new().text("action", "delete")).await;
	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body, json!({ "error": "missing id" }));

	let (status, body) = submit(&server, &token, Form::new().text("action", "explode").text("id", "1")).await;
	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body, json!({ "error": "unknown action" }));

	server.shutdown().await;
}

#[serial]
#[tokio::test]
async fn test_serial_duplicate() {
	let server = TestServer::start().await;
	let (_, token) = server.user("alice", Role::TeamUser).await;

	let mut source = record("Adele", Some("bob"));
	source.images.set(1, Some("face.jpg".to_string()));
	let source = server.global.db.insert_celebrity(&source).await.unwrap();
	let source_id = source.id.unwrap();
	server.global.image_store.save(source_id, "face.jpg", b"face").await.unwrap();

	let form = Form::new().text("action", "duplicate").text("id", source_id.to_string());
	let (status, body) = submit(&server, &token, form).await;
	assert_eq!(status, StatusCode::CREATED);

	let copy: Celebrity = serde_json::from_value(body).expect("response is a record");
	let copy_id = copy.id.expect("copy has an id");
	assert_ne!(copy_id, source_id);
	assert_eq!(copy.name, "Adele");
	assert_eq!(copy.owner.as_deref(), Some("alice"));
	assert_eq!(copy.images.get(1), Some("face.jpg"));

	assert_eq!(
		server.global.image_store.read(copy_id, "face.jpg").await.unwrap(),
		b"face"
	);

	// The source is untouched.
	let unchanged = server.global.db.get_celebrity(source_id).await.unwrap();
	assert_eq!(unchanged, Some(source));

	let form = Form::new().text("action", "duplicate").text("id", "999");
	let (status, _) = submit(&server, &token, form).await;
	assert_eq!(status, StatusCode::NOT_FOUND);

	server.shutdown().await;
}
