use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use platform_view::{Role, Viewer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
	/// The unique identifier for the user.
	pub id: i64,
	/// The email the user logs in with.
	pub email: String,
	/// The display name of the user, also the owner name on records.
	pub name: String,
	/// The hashed password of the user. (argon2)
	pub password_hash: String,
	pub role: Role,
}

#[derive(Debug, Clone)]
pub struct NewUser {
	pub email: String,
	pub name: String,
	pub password_hash: String,
	pub role: Role,
}

#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
	pub name: Option<String>,
	pub role: Option<Role>,
}

impl User {
	/// Uses argon2 to verify the password hash against the provided password.
	pub fn verify_password(&self, password: &str) -> bool {
		let hash = match PasswordHash::new(&self.password_hash) {
			Ok(hash) => hash,
			Err(err) => {
				tracing::error!("failed to parse password hash: {}", err);
				return false;
			}
		};

		Argon2::default().verify_password(password.as_bytes(), &hash).is_ok()
	}

	pub fn viewer(&self) -> Viewer {
		Viewer::new(self.name.clone(), self.email.clone(), self.role)
	}
}

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
	let salt = SaltString::generate(&mut OsRng);

	Ok(Argon2::default().hash_password(password.as_bytes(), &salt)?.to_string())
}

/// Passwords need at least this many characters.
pub const MIN_PASSWORD_LENGTH: usize = 6;

pub fn validate_password(password: &str) -> Result<(), &'static str> {
	if password.chars().count() < MIN_PASSWORD_LENGTH {
		return Err("Password must be at least 6 characters long");
	}

	Ok(())
}

pub fn validate_email(email: &str) -> Result<(), &'static str> {
	if !email_address::EmailAddress::is_valid(email) {
		return Err("Invalid email address");
	}

	Ok(())
}
