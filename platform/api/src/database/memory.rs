use std::collections::BTreeMap;

use async_trait::async_trait;
use platform_view::Celebrity;
use tokio::sync::RwLock;

use super::{Database, DatabaseError, NewUser, User, UserUpdate};

#[derive(Default)]
struct Tables {
	celebrities: BTreeMap<i64, Celebrity>,
	users: BTreeMap<i64, User>,
	next_celebrity_id: i64,
	next_user_id: i64,
}

/// Keeps everything in process, ordered by id.
#[derive(Default)]
pub struct MemoryDatabase {
	tables: RwLock<Tables>,
}

#[async_trait]
impl Database for MemoryDatabase {
	async fn list_celebrities(&self) -> Result<Vec<Celebrity>, DatabaseError> {
		Ok(self.tables.read().await.celebrities.values().cloned().collect())
	}

	async fn get_celebrity(&self, id: i64) -> Result<Option<Celebrity>, DatabaseError> {
		Ok(self.tables.read().await.celebrities.get(&id).cloned())
	}

	async fn insert_celebrity(&self, record: &Celebrity) -> Result<Celebrity, DatabaseError> {
		let mut tables = self.tables.write().await;
		tables.next_celebrity_id += 1;
		let id = tables.next_celebrity_id;

		let record = Celebrity {
			id: Some(id),
			..record.clone()
		};
		tables.celebrities.insert(id, record.clone());

		Ok(record)
	}

	async fn update_celebrity(&self, id: i64, record: &Celebrity) -> Result<Option<Celebrity>, DatabaseError> {
		let mut tables = self.tables.write().await;
		let Some(existing) = tables.celebrities.get_mut(&id) else {
			return Ok(None);
		};

		*existing = Celebrity {
			id: Some(id),
			..record.clone()
		};

		Ok(Some(existing.clone()))
	}

	async fn delete_celebrity(&self, id: i64) -> Result<Option<Celebrity>, DatabaseError> {
		Ok(self.tables.write().await.celebrities.remove(&id))
	}

	async fn list_users(&self) -> Result<Vec<User>, DatabaseError> {
		Ok(self.tables.read().await.users.values().cloned().collect())
	}

	async fn user_by_id(&self, id: i64) -> Result<Option<User>, DatabaseError> {
		Ok(self.tables.read().await.users.get(&id).cloned())
	}

	async fn user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
		Ok(self
			.tables
			.read()
			.await
			.users
			.values()
			.find(|u| u.email.eq_ignore_ascii_case(email))
			.cloned())
	}

	async fn insert_user(&self, user: NewUser) -> Result<User, DatabaseError> {
		let mut tables = self.tables.write().await;
		if tables.users.values().any(|u| u.email.eq_ignore_ascii_case(&user.email)) {
			return Err(DatabaseError::Conflict(format!("user {}", user.email)));
		}

		tables.next_user_id += 1;
		let user = User {
			id: tables.next_user_id,
			email: user.email,
			name: user.name,
			password_hash: user.password_hash,
			role: user.role,
		};
		tables.users.insert(user.id, user.clone());

		Ok(user)
	}

	async fn update_user(&self, id: i64, update: UserUpdate) -> Result<Option<User>, DatabaseError> {
		let mut tables = self.tables.write().await;
		let Some(user) = tables.users.get_mut(&id) else {
			return Ok(None);
		};

		if let Some(name) = update.name {
			user.name = name;
		}
		if let Some(role) = update.role {
			user.role = role;
		}

		Ok(Some(user.clone()))
	}

	async fn delete_user(&self, id: i64) -> Result<bool, DatabaseError> {
		Ok(self.tables.write().await.users.remove(&id).is_some())
	}
}
