use platform_view::access::AccessMode;
use platform_view::auth::{AuthStore, FileSessionStore};
use platform_view::client::HttpClient;
use platform_view::images::{encode_image, image_url, upload_name, ImageStore};
use platform_view::store::ReloadOutcome;
use platform_view::{Celebrity, Role, SortField, SortOrder, ViewStore};
use serial_test::serial;

use crate::database::Database;
use crate::tests::api::TestServer;

fn record(name: &str, owner: &str) -> Celebrity {
	Celebrity {
		geo: "US".to_string(),
		name: name.to_string(),
		category: "Music".to_string(),
		subject: "Singer".to_string(),
		owner: Some(owner.to_string()),
		..Default::default()
	}
}

/// Drives the server through the view engine's own HTTP client.
#[serial]
#[tokio::test]
async fn test_serial_view_engine_against_api() {
	let server = TestServer::start().await;
	server.user_with_password("alice", "password123", Role::TeamUser).await;

	for (name, owner) in [("Adele", "alice"), ("Beyonce", "bob"), ("Cher", "#n/a")] {
		server.global.db.insert_celebrity(&record(name, owner)).await.unwrap();
	}

	let sessions = tempfile::tempdir().unwrap();
	let client = HttpClient::new(server.url("/v1"));

	let mut auth = AuthStore::new(client.clone(), FileSessionStore::new(sessions.path()));
	let viewer = auth.login("alice@example.com", "password123").await.expect("failed to login");
	assert_eq!(viewer.role, Role::TeamUser);
	assert!(client.token().is_some());

	let mut view = ViewStore::new(client.clone());
	view.set_viewer(Some(viewer));
	assert_eq!(view.reload().await, ReloadOutcome::Applied);

	// Own mode shows her record plus the unowned one.
	let names = view.visible_page().iter().map(|c| c.name.as_str()).collect::<Vec<_>>();
	assert_eq!(names, ["Adele", "Cher"]);

	// "all" widens nothing for team users beyond the unowned records.
	view.set_owner_filter_mode(AccessMode::All);
	let names = view.visible_page().iter().map(|c| c.name.as_str()).collect::<Vec<_>>();
	assert_eq!(names, ["Cher"]);
	view.set_owner_filter_mode(AccessMode::Own);

	let saved = view
		.submit(Celebrity {
			about: "new".to_string(),
			..record("Dido", "")
		})
		.await
		.expect("failed to submit");
	assert_eq!(saved.owner.as_deref(), Some("alice"));
	assert_eq!(view.refresh_trigger(), 1);
	assert_eq!(view.collection().len(), 4);

	view.set_sort(SortField::Name, SortOrder::Desc);
	let names = view.visible_page().iter().map(|c| c.name.as_str()).collect::<Vec<_>>();
	assert_eq!(names, ["Dido", "Cher", "Adele"]);

	let id = saved.id.expect("saved record has an id");
	let name = upload_name(1);
	let path = client.upload(id, &name, &encode_image(b"hello")).await.expect("failed to upload");
	assert_eq!(path, image_url("/v1/images", id, &name));
	assert_eq!(server.global.image_store.read(id, &name).await.unwrap(), b"hello");

	let copy = view.duplicate(saved.clone()).await.expect("failed to duplicate");
	assert_ne!(copy.id, saved.id);
	assert_eq!(view.collection().len(), 5);

	view.delete(id).await.expect("failed to delete");
	assert_eq!(view.collection().len(), 4);

	// Editing someone else's record surfaces the server's refusal.
	let bobs = view
		.collection()
		.iter()
		.find(|c| c.name == "Beyonce")
		.cloned()
		.expect("record exists");
	assert!(view.submit(bobs).await.is_err());
	assert!(view
		.last_error()
		.is_some_and(|e| e.starts_with("Failed to upsert celebrity")));

	// A restarted client resumes the stored session.
	let mut resumed = AuthStore::new(HttpClient::new(server.url("/v1")), FileSessionStore::new(sessions.path()));
	let viewer = resumed.check_auth(true).await.expect("session is restored");
	assert_eq!(viewer.name, "alice");

	// Once the user is gone the token is rejected and the session dropped.
	let user = server
		.global
		.db
		.user_by_email("alice@example.com")
		.await
		.unwrap()
		.expect("user exists");
	server.global.db.delete_user(user.id).await.unwrap();

	let mut rejected = AuthStore::new(HttpClient::new(server.url("/v1")), FileSessionStore::new(sessions.path()));
	assert!(rejected.check_auth(true).await.is_none());
	assert!(rejected.viewer().is_none());

	server.shutdown().await;
}
