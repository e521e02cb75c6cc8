use std::path::{Path, PathBuf};

use base64::Engine;

#[derive(Debug, thiserror::Error)]
pub enum ImageStoreError {
	#[error("invalid image name")]
	InvalidName,
	#[error("invalid image data: {0}")]
	InvalidData(#[from] base64::DecodeError),
	#[error("image too large: {size} bytes, max {max}")]
	TooLarge { size: usize, max: usize },
	#[error("image not found")]
	NotFound,
	#[error("io error: {0}")]
	Io(#[from] std::io::Error),
}

/// Image files on disk, laid out as `{root}/{id}/{name}`.
#[derive(Debug, Clone)]
pub struct ImageStore {
	root: PathBuf,
	max_size: usize,
}

/// Rejects names that could leave the record directory.
pub fn sanitize_name(name: &str) -> Result<&str, ImageStoreError> {
	let valid = !name.is_empty()
		&& name.len() <= 255
		&& name != "."
		&& name != ".."
		&& name
			.chars()
			.all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'));

	if valid {
		Ok(name)
	} else {
		Err(ImageStoreError::InvalidName)
	}
}

/// Strips a `data:image/...;base64,` prefix and decodes the rest.
pub fn decode_image_data(data: &str) -> Result<Vec<u8>, ImageStoreError> {
	let data = match data.strip_prefix("data:") {
		Some(rest) => rest.split_once(";base64,").map(|(_, b64)| b64).unwrap_or(rest),
		None => data,
	};

	Ok(base64::engine::general_purpose::STANDARD.decode(data.trim())?)
}

/// Unknown and scriptable formats such as SVG map to `application/octet-stream`.
pub fn content_type(name: &str) -> &'static str {
	match Path::new(name).extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref() {
		Some("jpg" | "jpeg") => "image/jpeg",
		Some("png") => "image/png",
		Some("gif") => "image/gif",
		Some("webp") => "image/webp",
		Some("avif") => "image/avif",
		_ => "application/octet-stream",
	}
}

impl ImageStore {
	pub fn new(root: impl Into<PathBuf>, max_size: usize) -> Self {
		Self {
			root: root.into(),
			max_size,
		}
	}

	fn path(&self, id: i64, name: &str) -> Result<PathBuf, ImageStoreError> {
		Ok(self.root.join(id.to_string()).join(sanitize_name(name)?))
	}

	/// Returns the path relative to the root, e.g. `3/cimg1.jpg`.
	pub async fn save(&self, id: i64, name: &str, bytes: &[u8]) -> Result<String, ImageStoreError> {
		if bytes.len() > self.max_size {
			return Err(ImageStoreError::TooLarge {
				size: bytes.len(),
				max: self.max_size,
			});
		}

		let path = self.path(id, name)?;
		if let Some(dir) = path.parent() {
			tokio::fs::create_dir_all(dir).await?;
		}

		tokio::fs::write(&path, bytes).await?;
		tracing::debug!(path = %path.display(), size = bytes.len(), "saved image");

		Ok(format!("{id}/{name}"))
	}

	pub async fn read(&self, id: i64, name: &str) -> Result<Vec<u8>, ImageStoreError> {
		match tokio::fs::read(self.path(id, name)?).await {
			Ok(bytes) => Ok(bytes),
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(ImageStoreError::NotFound),
			Err(err) => Err(err.into()),
		}
	}

	pub async fn delete(&self, id: i64, name: &str) -> Result<(), ImageStoreError> {
		match tokio::fs::remove_file(self.path(id, name)?).await {
			Ok(()) => Ok(()),
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(ImageStoreError::NotFound),
			Err(err) => Err(err.into()),
		}
	}

	/// Removes the record's directory. Missing directories are fine.
	pub async fn delete_all(&self, id: i64) -> Result<(), ImageStoreError> {
		match tokio::fs::remove_dir_all(self.root.join(id.to_string())).await {
			Ok(()) => Ok(()),
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
			Err(err) => Err(err.into()),
		}
	}

	/// Copies `name` from one record to another. A missing source is
	/// skipped and reported as `false`.
	pub async fn copy(&self, from: i64, to: i64, name: &str) -> Result<bool, ImageStoreError> {
		let bytes = match self.read(from, name).await {
			Ok(bytes) => bytes,
			Err(ImageStoreError::NotFound) => return Ok(false),
			Err(err) => return Err(err),
		};

		self.save(to, name, &bytes).await?;
		Ok(true)
	}
}
