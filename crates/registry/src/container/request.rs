use crate::role::Role;

/// Name and role for `maybe_create`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreationRequest {
	pub name: String,
	pub role: Role,
}

impl CreationRequest {
	pub fn new(name: impl Into<String>, role: Role) -> Self {
		Self { name: name.into(), role }
	}
}

impl std::fmt::Display for CreationRequest {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{} ({})", self.name, self.role)
	}
}
