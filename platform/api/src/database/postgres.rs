use std::str::FromStr;

use async_trait::async_trait;
use platform_view::record::ImageSlots;
use platform_view::Celebrity;
use sqlx::postgres::{PgConnectOptions, PgPool, PgRow};
use sqlx::{ConnectOptions, Row};

use super::{parse_role, Database, DatabaseError, NewUser, User, UserUpdate};

const MIGRATIONS: &[&str] = &[
	"CREATE TABLE IF NOT EXISTS celebrities (
		id BIGSERIAL PRIMARY KEY,
		geo TEXT NOT NULL DEFAULT '',
		name TEXT NOT NULL DEFAULT '',
		category TEXT NOT NULL DEFAULT '',
		subject TEXT NOT NULL DEFAULT '',
		about TEXT NOT NULL DEFAULT '',
		owner TEXT,
		cimg1 TEXT, cimg2 TEXT, cimg3 TEXT, cimg4 TEXT, cimg5 TEXT,
		cimg6 TEXT, cimg7 TEXT, cimg8 TEXT, cimg9 TEXT, cimg10 TEXT
	)",
	"CREATE TABLE IF NOT EXISTS users (
		id BIGSERIAL PRIMARY KEY,
		email TEXT NOT NULL,
		name TEXT NOT NULL DEFAULT '',
		password_hash TEXT NOT NULL,
		role TEXT NOT NULL DEFAULT 'newUser'
	)",
	"CREATE UNIQUE INDEX IF NOT EXISTS users_email_idx ON users (LOWER(email))",
];

const CELEBRITY_COLUMNS: &str = "id, geo, name, category, subject, about, owner, \
	cimg1, cimg2, cimg3, cimg4, cimg5, cimg6, cimg7, cimg8, cimg9, cimg10";

const USER_COLUMNS: &str = "id, email, name, password_hash, role";

pub struct PgDatabase {
	pool: PgPool,
}

impl PgDatabase {
	pub async fn connect(uri: &str) -> Result<Self, DatabaseError> {
		let options = PgConnectOptions::from_str(uri)?.disable_statement_logging();
		let pool = PgPool::connect_with(options).await?;

		tracing::info!("connected to postgres");

		Ok(Self { pool })
	}

	pub async fn migrate(&self) -> Result<(), DatabaseError> {
		for statement in MIGRATIONS {
			sqlx::query(statement).execute(&self.pool).await?;
		}

		Ok(())
	}
}

fn celebrity_from_row(row: &PgRow) -> Result<Celebrity, sqlx::Error> {
	let mut images = ImageSlots::default();
	for slot in 1..=platform_view::record::IMAGE_SLOTS {
		images.set(slot, row.try_get(format!("cimg{slot}").as_str())?);
	}

	Ok(Celebrity {
		id: Some(row.try_get("id")?),
		geo: row.try_get::<Option<String>, _>("geo")?.unwrap_or_default(),
		name: row.try_get::<Option<String>, _>("name")?.unwrap_or_default(),
		category: row.try_get::<Option<String>, _>("category")?.unwrap_or_default(),
		subject: row.try_get::<Option<String>, _>("subject")?.unwrap_or_default(),
		about: row.try_get::<Option<String>, _>("about")?.unwrap_or_default(),
		owner: row.try_get("owner")?,
		images,
	})
}

fn user_from_row(row: &PgRow) -> Result<User, DatabaseError> {
	Ok(User {
		id: row.try_get("id")?,
		email: row.try_get("email")?,
		name: row.try_get("name")?,
		password_hash: row.try_get("password_hash")?,
		role: parse_role(row.try_get::<&str, _>("role")?)?,
	})
}

/// Binds the writable celebrity columns in table order.
fn bind_celebrity<'q>(
	mut query: sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>,
	record: &'q Celebrity,
) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
	query = query
		.bind(&record.geo)
		.bind(&record.name)
		.bind(&record.category)
		.bind(&record.subject)
		.bind(&record.about)
		.bind(&record.owner);

	for slot in 1..=platform_view::record::IMAGE_SLOTS {
		query = query.bind(record.images.get(slot));
	}

	query
}

#[async_trait]
impl Database for PgDatabase {
	async fn list_celebrities(&self) -> Result<Vec<Celebrity>, DatabaseError> {
		let rows = sqlx::query(&format!("SELECT {CELEBRITY_COLUMNS} FROM celebrities ORDER BY id"))
			.fetch_all(&self.pool)
			.await?;

		Ok(rows.iter().map(celebrity_from_row).collect::<Result<_, _>>()?)
	}

	async fn get_celebrity(&self, id: i64) -> Result<Option<Celebrity>, DatabaseError> {
		let row = sqlx::query(&format!("SELECT {CELEBRITY_COLUMNS} FROM celebrities WHERE id = $1"))
			.bind(id)
			.fetch_optional(&self.pool)
			.await?;

		Ok(row.as_ref().map(celebrity_from_row).transpose()?)
	}

	async fn insert_celebrity(&self, record: &Celebrity) -> Result<Celebrity, DatabaseError> {
		let sql = format!(
			"INSERT INTO celebrities (geo, name, category, subject, about, owner, \
			cimg1, cimg2, cimg3, cimg4, cimg5, cimg6, cimg7, cimg8, cimg9, cimg10) \
			VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16) \
			RETURNING {CELEBRITY_COLUMNS}"
		);

		let row = bind_celebrity(sqlx::query(&sql), record).fetch_one(&self.pool).await?;

		Ok(celebrity_from_row(&row)?)
	}

	async fn update_celebrity(&self, id: i64, record: &Celebrity) -> Result<Option<Celebrity>, DatabaseError> {
		let sql = format!(
			"UPDATE celebrities SET geo = $1, name = $2, category = $3, subject = $4, about = $5, owner = $6, \
			cimg1 = $7, cimg2 = $8, cimg3 = $9, cimg4 = $10, cimg5 = $11, cimg6 = $12, cimg7 = $13, \
			cimg8 = $14, cimg9 = $15, cimg10 = $16 WHERE id = $17 RETURNING {CELEBRITY_COLUMNS}"
		);

		let row = bind_celebrity(sqlx::query(&sql), record)
			.bind(id)
			.fetch_optional(&self.pool)
			.await?;

		Ok(row.as_ref().map(celebrity_from_row).transpose()?)
	}

	async fn delete_celebrity(&self, id: i64) -> Result<Option<Celebrity>, DatabaseError> {
		let row = sqlx::query(&format!("DELETE FROM celebrities WHERE id = $1 RETURNING {CELEBRITY_COLUMNS}"))
			.bind(id)
			.fetch_optional(&self.pool)
			.await?;

		Ok(row.as_ref().map(celebrity_from_row).transpose()?)
	}

	async fn list_users(&self) -> Result<Vec<User>, DatabaseError> {
		let rows = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))
			.fetch_all(&self.pool)
			.await?;

		rows.iter().map(user_from_row).collect()
	}

	async fn user_by_id(&self, id: i64) -> Result<Option<User>, DatabaseError> {
		let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
			.bind(id)
			.fetch_optional(&self.pool)
			.await?;

		row.as_ref().map(user_from_row).transpose()
	}

	async fn user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
		let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)"))
			.bind(email)
			.fetch_optional(&self.pool)
			.await?;

		row.as_ref().map(user_from_row).transpose()
	}

	async fn insert_user(&self, user: NewUser) -> Result<User, DatabaseError> {
		let result = sqlx::query(&format!(
			"INSERT INTO users (email, name, password_hash, role) VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
		))
		.bind(&user.email)
		.bind(&user.name)
		.bind(&user.password_hash)
		.bind(user.role.as_str())
		.fetch_one(&self.pool)
		.await;

		match result {
			Ok(row) => user_from_row(&row),
			Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
				Err(DatabaseError::Conflict(format!("user {}", user.email)))
			}
			Err(err) => Err(err.into()),
		}
	}

	async fn update_user(&self, id: i64, update: UserUpdate) -> Result<Option<User>, DatabaseError> {
		let row = sqlx::query(&format!(
			"UPDATE users SET name = COALESCE($1, name), role = COALESCE($2, role) WHERE id = $3 RETURNING {USER_COLUMNS}"
		))
		.bind(update.name)
		.bind(update.role.map(|r| r.as_str()))
		.bind(id)
		.fetch_optional(&self.pool)
		.await?;

		row.as_ref().map(user_from_row).transpose()
	}

	async fn delete_user(&self, id: i64) -> Result<bool, DatabaseError> {
		let result = sqlx::query("DELETE FROM users WHERE id = $1").bind(id).execute(&self.pool).await?;

		Ok(result.rows_affected() > 0)
	}
}
