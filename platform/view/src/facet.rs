use crate::record::{is_unowned, normalize_owner, Celebrity};

/// Distinct owners in first-seen order, trimmed, without the unowned
/// markers.
pub fn distinct_owners<'a>(records: impl IntoIterator<Item = &'a Celebrity>) -> Vec<String> {
	let mut owners: Vec<String> = Vec::new();

	for owner in records.into_iter().filter_map(|r| r.owner.as_deref()) {
		let owner = owner.trim();
		if is_unowned(&normalize_owner(owner)) || owners.iter().any(|o| o == owner) {
			continue;
		}

		owners.push(owner.to_owned());
	}

	owners
}

/// Restricts `records` to those whose owner matches `filter`, ignoring
/// case and surrounding whitespace. A blank filter keeps everything.
pub fn filter_owner<'a>(records: Vec<&'a Celebrity>, filter: &str) -> Vec<&'a Celebrity> {
	let filter = normalize_owner(filter);
	if filter.is_empty() {
		return records;
	}

	records.into_iter().filter(|r| r.normalized_owner() == filter).collect()
}
