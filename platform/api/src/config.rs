use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Result;
use common::config::{lenient_string, LoggingConfig, TlsConfig};

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default)]
/// The API is the backend for the celebrity admin
pub struct AppConfig {
	/// The path to the config file
	pub config_file: Option<String>,

	/// Name of this instance
	#[serde(deserialize_with = "lenient_string")]
	pub name: String,

	/// The logging config
	pub logging: LoggingConfig,

	/// API Config
	pub api: ApiConfig,

	/// Database Config
	pub database: DatabaseConfig,

	/// JWT Config
	pub jwt: JwtConfig,

	/// Image storage
	pub images: ImagesConfig,

	/// An admin account created at startup when no user has its email
	pub bootstrap_admin: Option<BootstrapAdmin>,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct ApiConfig {
	/// Bind address for the API
	pub bind_address: SocketAddr,

	/// If we should use TLS for the API server
	pub tls: Option<TlsConfig>,

	/// Value of `Access-Control-Allow-Origin`
	#[serde(deserialize_with = "lenient_string")]
	pub cors_origin: String,

	/// Largest request body we accept, in bytes
	pub max_body_size: usize,
}

impl Default for ApiConfig {
	fn default() -> Self {
		Self {
			bind_address: SocketAddr::from(([0, 0, 0, 0], 4000)),
			tls: None,
			cors_origin: "*".to_string(),
			max_body_size: 32 * 1024 * 1024,
		}
	}
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
	/// The database URL to use, `memory://` keeps everything in process
	#[serde(deserialize_with = "lenient_string")]
	pub uri: String,
}

impl Default for DatabaseConfig {
	fn default() -> Self {
		Self {
			uri: "postgres://root@localhost:5432/celebrity_admin".to_string(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct JwtConfig {
	/// JWT secret
	#[serde(deserialize_with = "lenient_string")]
	pub secret: String,

	/// JWT issuer
	#[serde(deserialize_with = "lenient_string")]
	pub issuer: String,

	/// Token lifetime in seconds
	pub expiration: i64,
}

impl Default for JwtConfig {
	fn default() -> Self {
		Self {
			issuer: "celebrity-admin".to_string(),
			secret: "celebrity-admin".to_string(),
			expiration: 60 * 60,
		}
	}
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct ImagesConfig {
	/// Directory images are stored under, one sub directory per record
	pub root: PathBuf,

	/// Public prefix images are served from
	#[serde(deserialize_with = "lenient_string")]
	pub base_url: String,

	/// Largest accepted image, in bytes
	pub max_size: usize,
}

impl Default for ImagesConfig {
	fn default() -> Self {
		Self {
			root: PathBuf::from("images"),
			base_url: "/v1/images".to_string(),
			max_size: 10 * 1024 * 1024,
		}
	}
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct BootstrapAdmin {
	#[serde(deserialize_with = "lenient_string")]
	pub email: String,
	#[serde(deserialize_with = "lenient_string")]
	pub password: String,
	#[serde(default = "default_admin_name", deserialize_with = "lenient_string")]
	pub name: String,
}

fn default_admin_name() -> String {
	"Admin".to_string()
}

impl Default for AppConfig {
	fn default() -> Self {
		Self {
			config_file: Some("config".to_string()),
			name: "celebrity-admin-api".to_string(),
			logging: LoggingConfig::default(),
			api: ApiConfig::default(),
			database: DatabaseConfig::default(),
			jwt: JwtConfig::default(),
			images: ImagesConfig::default(),
			bootstrap_admin: None,
		}
	}
}

impl AppConfig {
	pub fn parse() -> Result<Self> {
		let (mut config, config_file) = common::config::parse::<Self>(!cfg!(test), Self::default().config_file)?;

		config.config_file = config_file;

		Ok(config)
	}
}
