
use crate::record::Celebrity;
use crate::viewer::{Role, Viewer};

pub(crate) fn celeb(id: i64, name: &str, owner: Option<&str>) -> Celebrity {
	Celebrity {
		id: Some(id),
		geo: "US".to_owned(),
		name: name.to_owned(),
		category: "Music".to_owned(),
		subject: "Singer".to_owned(),
		owner: owner.map(str::to_owned),
		..Default::default()
	}
}

pub(crate) fn viewer(name: &str, role: Role) -> Viewer {
	Viewer::new(name, format!("{}@example.com", name.to_lowercase()), role)
}
