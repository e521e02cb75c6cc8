use async_trait::async_trait;
use base64::Engine;

use crate::error::SourceError;
use crate::record::slot_field;

#[async_trait]
pub trait ImageStore: Send + Sync {
	/// Stores base64 image data under the record and returns its path.
	async fn upload(&self, id: i64, image_name: &str, image_data: &str) -> Result<String, SourceError>;

	async fn delete(&self, id: i64, image_name: &str) -> Result<(), SourceError>;
}

pub fn image_url(base: &str, id: i64, image_name: &str) -> String {
	format!("{}/{id}/{image_name}", base.trim_end_matches('/'))
}

/// File name for a fresh upload into `slot`, e.g. `1700000000000-cimg2.jpg`.
pub fn upload_name(slot: usize) -> String {
	format!("{}-{}.jpg", chrono::Utc::now().timestamp_millis(), slot_field(slot))
}

pub fn encode_image(bytes: &[u8]) -> String {
	base64::engine::general_purpose::STANDARD.encode(bytes)
}
