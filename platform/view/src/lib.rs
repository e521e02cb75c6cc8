#![forbid(unsafe_code)]

pub mod access;
pub mod auth;
pub mod client;
pub mod error;
pub mod facet;
pub mod images;
pub mod paginate;
pub mod pipeline;
pub mod record;
pub mod search;
pub mod sort;
pub mod source;
pub mod store;
pub mod viewer;

pub use access::AccessMode;
pub use pipeline::{ViewOutput, ViewQuery};
pub use record::Celebrity;
pub use sort::{SortField, SortOrder};
pub use store::ViewStore;
pub use viewer::{Role, Viewer};

#[cfg(test)]
mod tests;
