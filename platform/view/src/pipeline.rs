use crate::access::{self, AccessMode};
use crate::facet;
use crate::paginate::{self, DEFAULT_PAGE_SIZE};
use crate::record::Celebrity;
use crate::search::SearchQuery;
use crate::sort::{self, SortField, SortOrder};
use crate::viewer::Viewer;

/// Every input of one pipeline run other than the collection itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewQuery {
	pub viewer: Option<Viewer>,
	pub mode: AccessMode,
	pub owner_filter: String,
	pub text_filter: String,
	pub sort_field: SortField,
	pub sort_order: SortOrder,
	/// 1-based.
	pub page: usize,
	pub page_size: usize,
}

impl Default for ViewQuery {
	fn default() -> Self {
		Self {
			viewer: None,
			mode: AccessMode::default(),
			owner_filter: String::new(),
			text_filter: String::new(),
			sort_field: SortField::default(),
			sort_order: SortOrder::default(),
			page: 1,
			page_size: DEFAULT_PAGE_SIZE,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewOutput {
	pub visible_page: Vec<Celebrity>,
	pub total_pages: usize,
	pub distinct_owners: Vec<String>,
	/// Records left after filtering, across all pages.
	pub matched: usize,
}

impl Default for ViewOutput {
	fn default() -> Self {
		Self {
			visible_page: Vec::new(),
			total_pages: 1,
			distinct_owners: Vec::new(),
			matched: 0,
		}
	}
}

/// Access filter, owner facet, owner sub-filter, search, sort, paginate.
/// Pure: the same inputs always give the same output.
pub fn run(records: &[Celebrity], query: &ViewQuery) -> ViewOutput {
	let visible = access::accessible(records, query.viewer.as_ref(), query.mode);
	let distinct_owners = facet::distinct_owners(visible.iter().copied());

	let visible = match query.mode {
		AccessMode::All => facet::filter_owner(visible, &query.owner_filter),
		AccessMode::Own => visible,
	};

	let search = SearchQuery::new(&query.text_filter);
	let mut matched = visible.into_iter().filter(|r| search.matches(r)).collect::<Vec<_>>();

	sort::sort(&mut matched, query.sort_field, query.sort_order);

	ViewOutput {
		visible_page: paginate::page_slice(&matched, query.page, query.page_size)
			.iter()
			.map(|r| (*r).clone())
			.collect(),
		total_pages: paginate::total_pages(matched.len(), query.page_size),
		distinct_owners,
		matched: matched.len(),
	}
}
