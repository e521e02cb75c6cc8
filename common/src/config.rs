use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::logging;

/// Prefix for environment overrides, e.g. `CELEB_API__BIND_ADDRESS`.
pub const ENV_PREFIX: &str = "CELEB";

/// Separator between nested keys in environment variable names.
pub const ENV_JOINER: &str = "__";

#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct TlsConfig {
	/// The path to the TLS certificate
	#[serde(deserialize_with = "lenient_string")]
	pub cert: String,

	/// The path to the TLS private key
	#[serde(deserialize_with = "lenient_string")]
	pub key: String,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
	/// The log level to use, this is a tracing env filter
	#[serde(deserialize_with = "lenient_string")]
	pub level: String,

	/// What logging mode we should use
	pub mode: logging::Mode,
}

impl Default for LoggingConfig {
	fn default() -> Self {
		Self {
			level: "info".to_string(),
			mode: logging::Mode::Default,
		}
	}
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("failed to read config file {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
	#[error("unsupported config file format: {0}")]
	UnsupportedFormat(String),
	#[error("invalid toml: {0}")]
	Toml(#[from] toml::de::Error),
	#[error("invalid yaml: {0}")]
	Yaml(#[from] serde_yaml::Error),
	#[error("invalid json: {0}")]
	Json(#[source] serde_json::Error),
	#[error("invalid override {0:?}, expected key=value")]
	InvalidOverride(String),
	#[error("failed to parse command line: {0}")]
	Cli(#[from] clap::Error),
	#[error("invalid config: {0}")]
	Deserialize(#[source] serde_json::Error),
}

impl ConfigError {
	pub fn is_io(&self) -> bool {
		matches!(self, Self::Io { .. })
	}
}

/// Loads `C` from layered sources. Later layers win:
///
/// 1. `#[serde(default)]` values of `C`
/// 2. the config file (TOML, YAML or JSON, picked by extension)
/// 3. `CELEB_*` environment variables
/// 4. `--set key.path=value` command line overrides
///
/// The file is `--config-file`, then `CELEB_CONFIG_FILE`, then
/// `default_file`. A missing default file is skipped; a missing file that
/// was asked for explicitly is an error.
pub fn parse<C: DeserializeOwned>(enable_cli: bool, default_file: Option<String>) -> Result<(C, Option<String>), ConfigError> {
	let cli = if enable_cli {
		Some(CliArgs::parse_from(std::env::args_os())?)
	} else {
		None
	};

	parse_from(cli, std::env::vars(), default_file)
}

#[derive(Debug, Default)]
struct CliArgs {
	config_file: Option<String>,
	overrides: Vec<String>,
}

impl CliArgs {
	fn parse_from<I: IntoIterator<Item = T>, T: Into<OsString> + Clone>(args: I) -> Result<Self, ConfigError> {
		let matches = clap::Command::new("celebrity-admin")
			.arg(
				clap::Arg::new("config-file")
					.long("config-file")
					.short('c')
					.help("Path to the config file"),
			)
			.arg(
				clap::Arg::new("set")
					.long("set")
					.short('s')
					.action(clap::ArgAction::Append)
					.help("Override a config key, e.g. --set api.bind_address=0.0.0.0:4000"),
			)
			.try_get_matches_from(args)?;

		Ok(Self {
			config_file: matches.get_one::<String>("config-file").cloned(),
			overrides: matches.get_many::<String>("set").into_iter().flatten().cloned().collect(),
		})
	}
}

fn parse_from<C: DeserializeOwned>(
	cli: Option<CliArgs>,
	env: impl IntoIterator<Item = (String, String)>,
	default_file: Option<String>,
) -> Result<(C, Option<String>), ConfigError> {
	let cli = cli.unwrap_or_default();
	let env = env_layer(env);

	let requested = cli
		.config_file
		.clone()
		.or_else(|| env.get("config_file").and_then(Value::as_str).map(str::to_owned));
	let explicit = requested.is_some();

	let mut merged = Value::Object(Map::new());
	let mut config_path = None;

	if let Some(path) = requested.or(default_file) {
		match load_file(Path::new(&path)) {
			Ok((value, location)) => {
				merge(&mut merged, value);
				config_path = Some(location);
			}
			Err(err) if !explicit && err.is_io() => {
				tracing::debug!("failed to load config file: {}", err);
			}
			Err(err) => return Err(err),
		}
	}

	merge(&mut merged, Value::Object(env));

	for entry in &cli.overrides {
		let (key, value) = entry
			.split_once('=')
			.ok_or_else(|| ConfigError::InvalidOverride(entry.clone()))?;
		let path = key.split('.').map(str::to_owned).collect::<Vec<_>>();
		merge(&mut merged, nest(&path, scalar(value)));
	}

	if let (Some(location), Value::Object(map)) = (&config_path, &mut merged) {
		map.insert("config_file".to_owned(), Value::String(location.clone()));
	}

	let config = serde_json::from_value(merged).map_err(ConfigError::Deserialize)?;

	Ok((config, config_path))
}

fn load_file(path: &Path) -> Result<(Value, String), ConfigError> {
	let ext = path.extension().and_then(|s| s.to_str());

	let Some(ext) = ext else {
		// No extension, try the supported ones in order.
		let mut last = None;
		for ext in ["json", "toml", "yaml", "yml"] {
			match load_file(&path.with_extension(ext)) {
				Ok(found) => return Ok(found),
				Err(err) if err.is_io() => last = Some(err),
				Err(err) => return Err(err),
			}
		}

		return Err(last.unwrap_or_else(|| ConfigError::UnsupportedFormat(String::new())));
	};

	let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
		path: path.to_owned(),
		source,
	})?;

	let value = match ext {
		"toml" => serde_json::to_value(toml::from_str::<toml::Value>(&content)?).map_err(ConfigError::Json)?,
		"yaml" | "yml" => serde_yaml::from_str::<Value>(&content)?,
		"json" => serde_json::from_str::<Value>(&content).map_err(ConfigError::Json)?,
		other => return Err(ConfigError::UnsupportedFormat(other.to_owned())),
	};

	let location = std::fs::canonicalize(path)
		.unwrap_or_else(|_| path.to_owned())
		.display()
		.to_string();

	Ok((value, location))
}

fn env_layer(vars: impl IntoIterator<Item = (String, String)>) -> Map<String, Value> {
	let prefix = format!("{ENV_PREFIX}_");
	let mut root = Value::Object(Map::new());

	for (key, value) in vars {
		let Some(key) = key.strip_prefix(&prefix) else {
			continue;
		};

		let path = key.split(ENV_JOINER).map(|s| s.to_lowercase()).collect::<Vec<_>>();
		if path.iter().any(String::is_empty) {
			continue;
		}

		merge(&mut root, nest(&path, scalar(&value)));
	}

	match root {
		Value::Object(map) => map,
		_ => Map::new(),
	}
}

/// Deserializes a string field that may arrive as a bare number or boolean
/// from an environment variable or `--set` override, e.g.
/// `CELEB_JWT__SECRET=123456`.
pub fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
	D: serde::Deserializer<'de>,
{
	struct LenientString;

	impl serde::de::Visitor<'_> for LenientString {
		type Value = String;

		fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
			f.write_str("a string, number or boolean")
		}

		fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<String, E> {
			Ok(v.to_owned())
		}

		fn visit_string<E: serde::de::Error>(self, v: String) -> Result<String, E> {
			Ok(v)
		}

		fn visit_bool<E: serde::de::Error>(self, v: bool) -> Result<String, E> {
			Ok(v.to_string())
		}

		fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<String, E> {
			Ok(v.to_string())
		}

		fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<String, E> {
			Ok(v.to_string())
		}

		fn visit_f64<E: serde::de::Error>(self, v: f64) -> Result<String, E> {
			Ok(v.to_string())
		}
	}

	deserializer.deserialize_any(LenientString)
}

/// Numbers, booleans, arrays and objects are taken as JSON; anything else
/// stays a string. Quote a value to force a string.
fn scalar(raw: &str) -> Value {
	match serde_json::from_str::<Value>(raw) {
		Ok(Value::Null) | Err(_) => Value::String(raw.to_owned()),
		Ok(value) => value,
	}
}

fn nest(path: &[String], value: Value) -> Value {
	path.iter().rev().fold(value, |acc, key| {
		let mut map = Map::new();
		map.insert(key.clone(), acc);
		Value::Object(map)
	})
}

fn merge(target: &mut Value, source: Value) {
	match (target, source) {
		(Value::Object(target), Value::Object(source)) => {
			for (key, value) in source {
				match target.get_mut(&key) {
					Some(existing) => merge(existing, value),
					None => {
						target.insert(key, value);
					}
				}
			}
		}
		(target, source) => *target = source,
	}
}

#[cfg(test)]
pub(crate) fn parse_for_test<C: DeserializeOwned>(
	args: &[&str],
	env: &[(&str, &str)],
	default_file: Option<String>,
) -> Result<(C, Option<String>), ConfigError> {
	let cli = CliArgs::parse_from(std::iter::once("test").chain(args.iter().copied()))?;
	let env = env.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect::<Vec<_>>();
	parse_from(Some(cli), env, default_file)
}
