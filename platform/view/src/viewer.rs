use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
	Admin,
	TeamUser,
	#[default]
	NewUser,
	NoUser,
}

impl Role {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Admin => "admin",
			Self::TeamUser => "teamUser",
			Self::NewUser => "newUser",
			Self::NoUser => "noUser",
		}
	}

	/// Roles that see nothing beyond unowned records.
	pub fn is_restricted(self) -> bool {
		matches!(self, Self::NewUser | Self::NoUser)
	}
}

impl fmt::Display for Role {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
	type Err = UnknownRole;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"admin" => Ok(Self::Admin),
			"teamUser" => Ok(Self::TeamUser),
			"newUser" => Ok(Self::NewUser),
			"noUser" => Ok(Self::NoUser),
			other => Err(UnknownRole(other.to_owned())),
		}
	}
}

/// The signed-in user as the view engine sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewer {
	pub name: String,
	pub email: String,
	pub role: Role,
}

impl Viewer {
	pub fn new(name: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
		Self {
			name: name.into(),
			email: email.into(),
			role,
		}
	}
}
