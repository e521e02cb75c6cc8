use platform_view::{Celebrity, Role};

use crate::config::BootstrapAdmin;
use crate::database::{
	ensure_admin, hash_password, validate_email, validate_password, Database, DatabaseError, MemoryDatabase, NewUser, UserUpdate,
};

fn record(name: &str) -> Celebrity {
	Celebrity {
		geo: "US".to_string(),
		name: name.to_string(),
		category: "Music".to_string(),
		subject: "Singer".to_string(),
		..Default::default()
	}
}

fn new_user(email: &str, role: Role) -> NewUser {
	NewUser {
		email: email.to_string(),
		name: email.split('@').next().unwrap_or_default().to_string(),
		password_hash: String::new(),
		role,
	}
}

#[tokio::test]
async fn test_celebrity_crud() {
	let db = MemoryDatabase::default();

	let first = db.insert_celebrity(&record("Adele")).await.unwrap();
	let second = db
		.insert_celebrity(&Celebrity {
			id: Some(99),
			..record("Beyonce")
		})
		.await
		.unwrap();

	assert_eq!(first.id, Some(1));
	// Ids on inserted records are ignored.
	assert_eq!(second.id, Some(2));

	let updated = db
		.update_celebrity(1, &Celebrity {
			about: "British singer".to_string(),
			..record("Adele")
		})
		.await
		.unwrap()
		.expect("record exists");
	assert_eq!(updated.id, Some(1));
	assert_eq!(updated.about, "British singer");
	assert_eq!(db.get_celebrity(1).await.unwrap(), Some(updated));

	assert_eq!(db.update_celebrity(42, &record("Nobody")).await.unwrap(), None);

	let deleted = db.delete_celebrity(2).await.unwrap().expect("record exists");
	assert_eq!(deleted.name, "Beyonce");
	assert_eq!(db.delete_celebrity(2).await.unwrap(), None);

	let all = db.list_celebrities().await.unwrap();
	assert_eq!(all.len(), 1);
	assert_eq!(all[0].name, "Adele");
}

#[tokio::test]
async fn test_user_email_is_unique_ignoring_case() {
	let db = MemoryDatabase::default();

	db.insert_user(new_user("alice@example.com", Role::TeamUser)).await.unwrap();

	match db.insert_user(new_user("ALICE@example.com", Role::NewUser)).await {
		Err(DatabaseError::Conflict(_)) => {}
		other => panic!("expected conflict, got {other:?}"),
	}

	let found = db.user_by_email("Alice@Example.com").await.unwrap().expect("user exists");
	assert_eq!(found.role, Role::TeamUser);
}

#[tokio::test]
async fn test_update_and_delete_user() {
	let db = MemoryDatabase::default();

	let user = db.insert_user(new_user("bob@example.com", Role::NewUser)).await.unwrap();

	let updated = db
		.update_user(
			user.id,
			UserUpdate {
				name: None,
				role: Some(Role::TeamUser),
			},
		)
		.await
		.unwrap()
		.expect("user exists");
	assert_eq!(updated.name, "bob");
	assert_eq!(updated.role, Role::TeamUser);

	assert_eq!(db.update_user(999, UserUpdate::default()).await.unwrap(), None);

	assert!(db.delete_user(user.id).await.unwrap());
	assert!(!db.delete_user(user.id).await.unwrap());
	assert!(db.user_by_id(user.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_ensure_admin_runs_once() {
	let db = MemoryDatabase::default();
	let admin = BootstrapAdmin {
		email: "root@example.com".to_string(),
		password: "hunter22".to_string(),
		name: "Root".to_string(),
	};

	assert!(ensure_admin(&db, &admin).await.unwrap());
	assert!(!ensure_admin(&db, &admin).await.unwrap());

	let users = db.list_users().await.unwrap();
	assert_eq!(users.len(), 1);
	assert_eq!(users[0].role, Role::Admin);
	assert_eq!(users[0].name, "Root");
	assert!(users[0].verify_password("hunter22"));
	assert!(!users[0].verify_password("hunter23"));
}

#[test]
fn test_password_hash() {
	let hash = hash_password("correct horse").unwrap();
	assert_ne!(hash, "correct horse");

	let user = crate::database::User {
		id: 1,
		email: "a@b.c".to_string(),
		name: "a".to_string(),
		password_hash: hash,
		role: Role::NewUser,
	};

	assert!(user.verify_password("correct horse"));
	assert!(!user.verify_password("wrong horse"));

	let broken = crate::database::User {
		password_hash: "not a hash".to_string(),
		..user
	};
	assert!(!broken.verify_password("correct horse"));
}

#[test]
fn test_validation() {
	assert!(validate_password("12345").is_err());
	assert!(validate_password("123456").is_ok());

	assert!(validate_email("alice@example.com").is_ok());
	assert!(validate_email("alice").is_err());
	assert!(validate_email("").is_err());
}
