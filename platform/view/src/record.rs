use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ValidationError;

/// Number of image slots on a record, `cimg1` through `cimg10`.
pub const IMAGE_SLOTS: usize = 10;

/// Owner value that marks a record as visible to everyone.
pub const UNOWNED: &str = "#n/a";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Celebrity {
	#[serde(default)]
	pub id: Option<i64>,
	#[serde(default, deserialize_with = "nullable_string")]
	pub geo: String,
	#[serde(default, deserialize_with = "nullable_string")]
	pub name: String,
	#[serde(default, deserialize_with = "nullable_string")]
	pub category: String,
	#[serde(default, deserialize_with = "nullable_string")]
	pub subject: String,
	#[serde(default, deserialize_with = "nullable_string")]
	pub about: String,
	#[serde(default)]
	pub owner: Option<String>,
	#[serde(flatten)]
	pub images: ImageSlots,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RequiredField {
	Geo,
	Name,
	Category,
	Subject,
}

impl RequiredField {
	pub const ALL: [RequiredField; 4] = [Self::Geo, Self::Name, Self::Category, Self::Subject];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Geo => "geo",
			Self::Name => "name",
			Self::Category => "category",
			Self::Subject => "subject",
		}
	}
}

impl Celebrity {
	pub fn field(&self, field: RequiredField) -> &str {
		match field {
			RequiredField::Geo => &self.geo,
			RequiredField::Name => &self.name,
			RequiredField::Category => &self.category,
			RequiredField::Subject => &self.subject,
		}
	}

	/// Checks that every required field holds something other than
	/// whitespace, reporting all offenders at once.
	pub fn validate(&self) -> Result<(), ValidationError> {
		let fields = RequiredField::ALL
			.into_iter()
			.filter(|f| self.field(*f).trim().is_empty())
			.collect::<Vec<_>>();

		if fields.is_empty() {
			Ok(())
		} else {
			Err(ValidationError { fields })
		}
	}

	pub fn normalized_owner(&self) -> String {
		self.owner.as_deref().map(normalize_owner).unwrap_or_default()
	}

	pub fn is_unowned(&self) -> bool {
		is_unowned(&self.normalized_owner())
	}

	/// An unowned record belongs to nobody, not even a viewer with an
	/// empty name.
	pub fn is_owned_by(&self, name: &str) -> bool {
		let owner = self.normalized_owner();
		!is_unowned(&owner) && owner == normalize_owner(name)
	}
}

pub fn normalize_owner(owner: &str) -> String {
	owner.trim().to_lowercase()
}

/// Takes an already normalized owner.
pub fn is_unowned(normalized: &str) -> bool {
	normalized.is_empty() || normalized == UNOWNED
}

/// The ten `cimgN` references. Empty strings are treated as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSlots {
	#[serde(default)]
	pub cimg1: Option<String>,
	#[serde(default)]
	pub cimg2: Option<String>,
	#[serde(default)]
	pub cimg3: Option<String>,
	#[serde(default)]
	pub cimg4: Option<String>,
	#[serde(default)]
	pub cimg5: Option<String>,
	#[serde(default)]
	pub cimg6: Option<String>,
	#[serde(default)]
	pub cimg7: Option<String>,
	#[serde(default)]
	pub cimg8: Option<String>,
	#[serde(default)]
	pub cimg9: Option<String>,
	#[serde(default)]
	pub cimg10: Option<String>,
}

impl ImageSlots {
	fn slots(&self) -> [&Option<String>; IMAGE_SLOTS] {
		[
			&self.cimg1,
			&self.cimg2,
			&self.cimg3,
			&self.cimg4,
			&self.cimg5,
			&self.cimg6,
			&self.cimg7,
			&self.cimg8,
			&self.cimg9,
			&self.cimg10,
		]
	}

	fn slot_mut(&mut self, slot: usize) -> Option<&mut Option<String>> {
		Some(match slot {
			1 => &mut self.cimg1,
			2 => &mut self.cimg2,
			3 => &mut self.cimg3,
			4 => &mut self.cimg4,
			5 => &mut self.cimg5,
			6 => &mut self.cimg6,
			7 => &mut self.cimg7,
			8 => &mut self.cimg8,
			9 => &mut self.cimg9,
			10 => &mut self.cimg10,
			_ => return None,
		})
	}

	/// Slots are numbered from 1.
	pub fn get(&self, slot: usize) -> Option<&str> {
		let index = slot.checked_sub(1)?;
		self.slots()
			.get(index)
			.and_then(|s| s.as_deref())
			.filter(|s| !s.is_empty())
	}

	/// Returns false when `slot` is out of range.
	pub fn set(&mut self, slot: usize, value: Option<String>) -> bool {
		match self.slot_mut(slot) {
			Some(target) => {
				*target = value.filter(|v| !v.is_empty());
				true
			}
			None => false,
		}
	}

	/// Set slots as `(slot, name)` pairs.
	pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> + '_ {
		(1..=IMAGE_SLOTS).filter_map(|slot| self.get(slot).map(|name| (slot, name)))
	}
}

/// Field name of an image slot, e.g. `cimg3`.
pub fn slot_field(slot: usize) -> String {
	format!("cimg{slot}")
}

/// Parses `cimgN` back into `N`.
pub fn parse_slot_field(field: &str) -> Option<usize> {
	field
		.strip_prefix("cimg")
		.and_then(|n| n.parse::<usize>().ok())
		.filter(|n| (1..=IMAGE_SLOTS).contains(n))
}

fn nullable_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
	Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
