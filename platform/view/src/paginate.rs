pub const DEFAULT_PAGE_SIZE: usize = 30;

/// Never less than one, even for an empty list.
pub fn total_pages(count: usize, limit: usize) -> usize {
	count.div_ceil(limit.max(1)).max(1)
}

/// The 1-based `page` of `items`. Page zero and pages past the end are
/// empty; callers clamp.
pub fn page_slice<T>(items: &[T], page: usize, limit: usize) -> &[T] {
	let Some(index) = page.checked_sub(1) else {
		return &[];
	};

	let limit = limit.max(1);
	let start = index.saturating_mul(limit);
	if start >= items.len() {
		return &[];
	}

	&items[start..items.len().min(start + limit)]
}
