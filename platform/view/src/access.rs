use serde::{Deserialize, Serialize};

use crate::record::Celebrity;
use crate::viewer::{Role, Viewer};

/// Whether a viewer looks at their own records or at the wider set their
/// role allows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessMode {
	#[default]
	Own,
	All,
}

/// Decides whether a single record is visible.
///
/// Unowned records are visible to everyone in every mode. Beyond that:
///
/// | viewer               | `own`          | `all`         |
/// |----------------------|----------------|---------------|
/// | anonymous            | nothing more   | nothing more  |
/// | `newUser`/`noUser`   | nothing more   | nothing more  |
/// | `teamUser`           | owned by them  | nothing more  |
/// | `admin`              | owned by them  | everything    |
pub fn is_accessible(record: &Celebrity, viewer: Option<&Viewer>, mode: AccessMode) -> bool {
	if record.is_unowned() {
		return true;
	}

	let Some(viewer) = viewer else {
		return false;
	};

	match (viewer.role, mode) {
		(Role::Admin, AccessMode::All) => true,
		(Role::Admin | Role::TeamUser, AccessMode::Own) => record.is_owned_by(&viewer.name),
		(Role::TeamUser, AccessMode::All) => false,
		(Role::NewUser | Role::NoUser, _) => false,
	}
}

/// Keeps input order.
pub fn accessible<'a>(
	records: impl IntoIterator<Item = &'a Celebrity>,
	viewer: Option<&Viewer>,
	mode: AccessMode,
) -> Vec<&'a Celebrity> {
	records
		.into_iter()
		.filter(|record| is_accessible(record, viewer, mode))
		.collect()
}
