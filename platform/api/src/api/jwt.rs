use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use hmac::{Hmac, Mac};
use jwt::{Claims, Header, RegisteredClaims, SignWithKey, Token, VerifyWithKey};
use platform_view::Role;
use serde_json::Value;
use sha2::Sha256;

use crate::config::JwtConfig;
use crate::database::User;
use crate::global::ApiGlobal;

pub struct AuthJwtPayload {
	pub user_id: i64,
	pub email: String,
	pub role: Role,
	pub expiration: Option<DateTime<Utc>>,
	pub issued_at: DateTime<Utc>,
}

impl AuthJwtPayload {
	/// A token for `user` valid for the configured lifetime.
	pub fn for_user(user: &User, config: &JwtConfig) -> Self {
		let now = Utc::now();

		Self {
			user_id: user.id,
			email: user.email.clone(),
			role: user.role,
			expiration: Some(now + Duration::seconds(config.expiration)),
			issued_at: now,
		}
	}
}

pub trait JwtState: Sized {
	fn to_claims(&self) -> Claims;

	fn from_claims(claims: &Claims) -> Option<Self>;

	fn serialize<G: ApiGlobal>(&self, global: &Arc<G>) -> Option<String> {
		let config = global.config::<JwtConfig>();

		let key = Hmac::<Sha256>::new_from_slice(config.secret.as_bytes()).ok()?;
		let mut claims = self.to_claims();

		claims.registered.issuer = Some(config.issuer.clone());

		if claims.registered.issued_at.is_none() {
			claims.registered.issued_at = Some(Utc::now().timestamp() as u64);
		}

		claims.sign_with_key(&key).ok()
	}

	fn verify<G: ApiGlobal>(global: &Arc<G>, token: &str) -> Option<Self> {
		let config = global.config::<JwtConfig>();

		let key = Hmac::<Sha256>::new_from_slice(config.secret.as_bytes()).ok()?;
		let token: Token<Header, Claims, _> = token.verify_with_key(&key).ok()?;

		let claims = token.claims();

		if claims.registered.issuer.as_ref() != Some(&config.issuer) {
			return None;
		}

		let iat = Utc.timestamp_opt(claims.registered.issued_at? as i64, 0).single()?;
		if iat > Utc::now() {
			return None;
		}

		let nbf = claims
			.registered
			.not_before
			.and_then(|x| Utc.timestamp_opt(x as i64, 0).single());
		if let Some(nbf) = nbf {
			if nbf > Utc::now() {
				return None;
			}
		}

		let exp = claims
			.registered
			.expiration
			.and_then(|x| Utc.timestamp_opt(x as i64, 0).single());
		if let Some(exp) = exp {
			if exp < Utc::now() {
				return None;
			}
		}

		Self::from_claims(claims)
	}
}

impl JwtState for AuthJwtPayload {
	fn to_claims(&self) -> Claims {
		let mut claims = Claims::new(RegisteredClaims {
			issuer: None,
			subject: Some(self.user_id.to_string()),
			audience: None,
			expiration: self.expiration.map(|x| x.timestamp() as u64),
			not_before: None,
			issued_at: Some(self.issued_at.timestamp() as u64),
			json_web_token_id: None,
		});

		claims.private.insert("email".to_string(), Value::String(self.email.clone()));
		claims.private.insert("role".to_string(), Value::String(self.role.as_str().to_string()));

		claims
	}

	fn from_claims(claims: &Claims) -> Option<Self> {
		Some(Self {
			user_id: claims.registered.subject.as_ref()?.parse().ok()?,
			email: claims.private.get("email")?.as_str()?.to_string(),
			role: claims.private.get("role")?.as_str()?.parse().ok()?,
			expiration: claims
				.registered
				.expiration
				.and_then(|x| Utc.timestamp_opt(x as i64, 0).single()),
			issued_at: Utc.timestamp_opt(claims.registered.issued_at? as i64, 0).single()?,
		})
	}
}
