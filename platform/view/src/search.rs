use crate::record::Celebrity;

/// A prepared free-text query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery<'q> {
	raw: &'q str,
	lower: String,
	numeric: bool,
}

impl<'q> SearchQuery<'q> {
	pub fn new(raw: &'q str) -> Self {
		Self {
			raw,
			lower: raw.to_lowercase(),
			numeric: is_numeric(raw),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.raw.is_empty()
	}

	pub fn matches(&self, record: &Celebrity) -> bool {
		if self.is_empty() {
			return true;
		}

		let text = [&record.geo, &record.name, &record.category, &record.subject]
			.into_iter()
			.any(|field| field.to_lowercase().contains(&self.lower));

		text || (self.numeric && record.id.is_some_and(|id| id.to_string().contains(self.raw)))
	}
}

pub fn matches(record: &Celebrity, query: &str) -> bool {
	SearchQuery::new(query).matches(record)
}

/// Whether `raw` reads as a number the way a browser's `Number()` would:
/// surrounding whitespace ignored, blank counts as zero, `0x`/`0o`/`0b`
/// literals and a signed `Infinity` allowed, `NaN` rejected.
pub fn is_numeric(raw: &str) -> bool {
	let trimmed = raw.trim();
	if trimmed.is_empty() {
		return true;
	}

	let radix = [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)]
		.into_iter()
		.find_map(|(prefix, radix)| trimmed.strip_prefix(prefix).map(|digits| (digits, radix)));
	if let Some((digits, radix)) = radix {
		return !digits.is_empty() && digits.chars().all(|c| c.is_digit(radix));
	}

	let unsigned = trimmed.strip_prefix(['+', '-']).unwrap_or(trimmed);
	if unsigned == "Infinity" {
		return true;
	}

	// Rust also accepts "inf", "nan" and friends, which a browser does not.
	if unsigned.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
		return false;
	}

	trimmed.parse::<f64>().is_ok()
}
