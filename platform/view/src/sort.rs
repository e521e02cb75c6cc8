use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::record::Celebrity;

/// The closed set of sortable columns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
	#[default]
	Id,
	Geo,
	Name,
	Category,
	Subject,
	About,
	Owner,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
	#[default]
	Asc,
	Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown sort field: {0}")]
pub struct UnknownSortField(pub String);

impl SortField {
	pub const ALL: [SortField; 7] = [
		Self::Id,
		Self::Geo,
		Self::Name,
		Self::Category,
		Self::Subject,
		Self::About,
		Self::Owner,
	];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Id => "id",
			Self::Geo => "geo",
			Self::Name => "name",
			Self::Category => "category",
			Self::Subject => "subject",
			Self::About => "about",
			Self::Owner => "owner",
		}
	}

	pub fn compare(self, a: &Celebrity, b: &Celebrity) -> Ordering {
		match self {
			Self::Id => a.id.unwrap_or(0).cmp(&b.id.unwrap_or(0)),
			Self::Geo => locale_compare(&a.geo, &b.geo),
			Self::Name => locale_compare(&a.name, &b.name),
			Self::Category => locale_compare(&a.category, &b.category),
			Self::Subject => locale_compare(&a.subject, &b.subject),
			Self::About => locale_compare(&a.about, &b.about),
			// A missing owner sorts like an empty one.
			Self::Owner => locale_compare(a.owner.as_deref().unwrap_or(""), b.owner.as_deref().unwrap_or("")),
		}
	}
}

impl fmt::Display for SortField {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for SortField {
	type Err = UnknownSortField;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|field| field.as_str() == s)
			.ok_or_else(|| UnknownSortField(s.to_owned()))
	}
}

impl SortOrder {
	pub fn apply(self, ordering: Ordering) -> Ordering {
		match self {
			Self::Asc => ordering,
			Self::Desc => ordering.reverse(),
		}
	}

	pub fn toggled(self) -> Self {
		match self {
			Self::Asc => Self::Desc,
			Self::Desc => Self::Asc,
		}
	}
}

/// Case-insensitive first; among strings equal ignoring case, lowercase
/// sorts before uppercase.
pub fn locale_compare(a: &str, b: &str) -> Ordering {
	let folded = a.chars().flat_map(char::to_lowercase).cmp(b.chars().flat_map(char::to_lowercase));
	folded.then_with(|| b.cmp(a))
}

/// Stable, so ties keep their input order in both directions.
pub fn sort(records: &mut [&Celebrity], field: SortField, order: SortOrder) {
	records.sort_by(|a, b| order.apply(field.compare(a, b)));
}
