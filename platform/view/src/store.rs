use crate::access::AccessMode;
use crate::error::{SourceError, StoreError};
use crate::pipeline::{self, ViewOutput, ViewQuery};
use crate::record::Celebrity;
use crate::sort::{SortField, SortOrder};
use crate::source::{DataSource, Mutation};
use crate::viewer::Viewer;

/// Identifies one reload so that late responses from an older one can be
/// told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReloadTicket(u64);

impl ReloadTicket {
	pub fn generation(self) -> u64 {
		self.0
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
	Applied,
	/// A newer reload started after this one; its result was dropped.
	Stale,
	/// The fetch failed; the previous collection is kept.
	Failed,
}

/// Holds the collection and the view inputs, and republishes the current
/// page whenever an input changes.
///
/// Setters only mutate inputs and then call [`ViewStore::recompute`], which
/// is the one place the pipeline runs.
pub struct ViewStore<S> {
	source: S,
	collection: Vec<Celebrity>,
	query: ViewQuery,
	output: ViewOutput,
	generation: u64,
	is_loading: bool,
	last_error: Option<String>,
	refresh_trigger: u64,
}

impl<S: DataSource> ViewStore<S> {
	pub fn new(source: S) -> Self {
		Self {
			source,
			collection: Vec::new(),
			query: ViewQuery::default(),
			output: ViewOutput::default(),
			generation: 0,
			is_loading: false,
			last_error: None,
			refresh_trigger: 0,
		}
	}

	pub fn source(&self) -> &S {
		&self.source
	}

	pub fn collection(&self) -> &[Celebrity] {
		&self.collection
	}

	pub fn query(&self) -> &ViewQuery {
		&self.query
	}

	pub fn output(&self) -> &ViewOutput {
		&self.output
	}

	pub fn visible_page(&self) -> &[Celebrity] {
		&self.output.visible_page
	}

	pub fn total_pages(&self) -> usize {
		self.output.total_pages
	}

	pub fn distinct_owners(&self) -> &[String] {
		&self.output.distinct_owners
	}

	pub fn page(&self) -> usize {
		self.query.page
	}

	pub fn is_loading(&self) -> bool {
		self.is_loading
	}

	/// The message of the most recent failed operation, cleared by the next
	/// successful reload.
	pub fn last_error(&self) -> Option<&str> {
		self.last_error.as_deref()
	}

	pub fn refresh_trigger(&self) -> u64 {
		self.refresh_trigger
	}

	pub fn recompute(&mut self) {
		self.output = pipeline::run(&self.collection, &self.query);
	}

	/// Changing who is looking changes the visible set, so this returns to
	/// the first page like a filter change.
	pub fn set_viewer(&mut self, viewer: Option<Viewer>) {
		self.query.viewer = viewer;
		self.query.page = 1;
		self.recompute();
	}

	pub fn set_text_filter(&mut self, filter: impl Into<String>) {
		self.query.text_filter = filter.into();
		self.query.page = 1;
		self.recompute();
	}

	pub fn set_owner_filter(&mut self, filter: impl Into<String>) {
		self.query.owner_filter = filter.into();
		self.query.page = 1;
		self.recompute();
	}

	pub fn set_owner_filter_mode(&mut self, mode: AccessMode) {
		self.query.mode = mode;
		self.query.page = 1;
		self.recompute();
	}

	pub fn set_sort(&mut self, field: SortField, order: SortOrder) {
		self.query.sort_field = field;
		self.query.sort_order = order;
		self.recompute();
	}

	pub fn set_sort_field(&mut self, field: SortField) {
		self.query.sort_field = field;
		self.recompute();
	}

	pub fn set_sort_order(&mut self, order: SortOrder) {
		self.query.sort_order = order;
		self.recompute();
	}

	/// Selecting the current sort field flips the order; a new field
	/// starts ascending.
	pub fn toggle_sort(&mut self, field: SortField) {
		if self.query.sort_field == field {
			self.query.sort_order = self.query.sort_order.toggled();
		} else {
			self.query.sort_field = field;
			self.query.sort_order = SortOrder::Asc;
		}

		self.recompute();
	}

	/// Not clamped; an out of range page shows nothing.
	pub fn set_page(&mut self, page: usize) {
		self.query.page = page;
		self.recompute();
	}

	pub fn set_page_size(&mut self, page_size: usize) {
		self.query.page_size = page_size.max(1);
		self.query.page = 1;
		self.recompute();
	}

	pub fn next_page(&mut self) {
		self.query.page = (self.query.page + 1).clamp(1, self.output.total_pages);
		self.recompute();
	}

	pub fn prev_page(&mut self) {
		self.query.page = self.query.page.saturating_sub(1).clamp(1, self.output.total_pages);
		self.recompute();
	}

	pub fn trigger_refresh(&mut self) {
		self.refresh_trigger += 1;
	}

	/// Starts a reload and marks the store as loading.
	pub fn begin_reload(&mut self) -> ReloadTicket {
		self.generation += 1;
		self.is_loading = true;
		ReloadTicket(self.generation)
	}

	/// Applies the result of the fetch started with `ticket`. Results from
	/// anything but the latest reload are dropped, and only the latest one
	/// clears the loading flag.
	pub fn finish_reload(&mut self, ticket: ReloadTicket, result: Result<Vec<Celebrity>, SourceError>) -> ReloadOutcome {
		if ticket.0 != self.generation {
			tracing::debug!(generation = ticket.0, current = self.generation, "dropping stale reload");
			return ReloadOutcome::Stale;
		}

		self.is_loading = false;

		match result {
			Ok(collection) => {
				tracing::debug!(count = collection.len(), "reloaded collection");
				self.collection = collection;
				self.last_error = None;
				self.recompute();
				ReloadOutcome::Applied
			}
			Err(err) => {
				tracing::error!(error = %err, "failed to fetch celebrities");
				self.last_error = Some(format!("Failed to load celebrities: {err}"));
				ReloadOutcome::Failed
			}
		}
	}

	pub async fn reload(&mut self) -> ReloadOutcome {
		let ticket = self.begin_reload();
		let result = self.source.fetch_all().await;
		self.finish_reload(ticket, result)
	}

	/// Validates and saves `record`. A record without an owner is assigned
	/// to the current viewer.
	pub async fn submit(&mut self, mut record: Celebrity) -> Result<Celebrity, StoreError> {
		if let Err(err) = record.validate() {
			self.last_error = Some(err.to_string());
			return Err(err.into());
		}

		if record.owner.as_deref().map_or(true, |o| o.trim().is_empty()) {
			if let Some(viewer) = &self.query.viewer {
				record.owner = Some(viewer.name.clone());
			}
		}

		self.mutate(Mutation::Upsert(record)).await
	}

	/// Saves a copy of `record` owned by the current viewer.
	pub async fn duplicate(&mut self, mut record: Celebrity) -> Result<Celebrity, StoreError> {
		if record.id.is_none() {
			return Err(StoreError::MissingId);
		}

		if let Some(viewer) = &self.query.viewer {
			record.owner = Some(viewer.name.clone());
		}

		self.mutate(Mutation::Duplicate(record)).await
	}

	pub async fn delete(&mut self, id: i64) -> Result<Celebrity, StoreError> {
		self.mutate(Mutation::Delete { id }).await
	}

	async fn mutate(&mut self, mutation: Mutation) -> Result<Celebrity, StoreError> {
		let action = mutation.action().unwrap_or("upsert");

		match self.source.submit(mutation).await {
			Ok(saved) => {
				tracing::info!(action, id = ?saved.id, "celebrity saved");
				self.trigger_refresh();
				self.reload().await;
				Ok(saved)
			}
			Err(err) => {
				tracing::error!(action, error = %err, "failed to save celebrity");
				self.last_error = Some(format!("Failed to {action} celebrity: {err}"));
				Err(err.into())
			}
		}
	}
}
