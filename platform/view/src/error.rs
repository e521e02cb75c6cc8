use crate::record::RequiredField;

/// Failure talking to one of the remote collaborators.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
	#[error("request failed: {0}")]
	Transport(#[from] reqwest::Error),
	#[error("server responded with {status}: {message}")]
	Status { status: u16, message: String },
	#[error("invalid response: {0}")]
	Decode(String),
	#[error("not authenticated")]
	Unauthenticated,
}

impl SourceError {
	/// True when the remote side rejected our credentials, as opposed to
	/// being unreachable.
	pub fn is_auth_rejection(&self) -> bool {
		match self {
			Self::Unauthenticated => true,
			Self::Status { status, .. } => *status == 401 || *status == 403,
			_ => false,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("missing required fields: {}", .fields.iter().map(|f| f.as_str()).collect::<Vec<_>>().join(", "))]
pub struct ValidationError {
	pub fields: Vec<RequiredField>,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
	#[error(transparent)]
	Validation(#[from] ValidationError),
	#[error(transparent)]
	Source(#[from] SourceError),
	#[error("record has no id")]
	MissingId,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
	#[error("failed to access session file: {0}")]
	Io(#[from] std::io::Error),
	#[error("corrupt session: {0}")]
	Corrupt(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
	#[error(transparent)]
	Source(#[from] SourceError),
	#[error(transparent)]
	Session(#[from] SessionError),
}
