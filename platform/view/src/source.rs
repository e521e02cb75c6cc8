use async_trait::async_trait;

use crate::error::SourceError;
use crate::record::Celebrity;

/// A change sent to the data source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
	/// Creates the record when it has no id, updates it otherwise.
	Upsert(Celebrity),
	/// Copies the record with the given id, overriding its fields with
	/// the ones supplied.
	Duplicate(Celebrity),
	Delete { id: i64 },
}

impl Mutation {
	/// Value of the `action` form field, absent for an upsert.
	pub fn action(&self) -> Option<&'static str> {
		match self {
			Self::Upsert(_) => None,
			Self::Duplicate(_) => Some("duplicate"),
			Self::Delete { .. } => Some("delete"),
		}
	}
}

/// Where the full record collection comes from and where changes go.
#[async_trait]
pub trait DataSource: Send + Sync {
	async fn fetch_all(&self) -> Result<Vec<Celebrity>, SourceError>;

	/// Returns the record as stored after the change.
	async fn submit(&self, mutation: Mutation) -> Result<Celebrity, SourceError>;
}
