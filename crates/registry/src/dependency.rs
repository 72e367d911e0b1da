//! Declared dependencies and component identity.

use std::fmt;

/// A dependency declared on a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Dependency {
	group: String,
	name: String,
	version: Option<String>,
	reason: Option<String>,
}

impl Dependency {
	pub fn new(group: impl Into<String>, name: impl Into<String>) -> Self {
		Self {
			group: group.into(),
			name: name.into(),
			version: None,
			reason: None,
		}
	}

	/// Parses `group:name[:version]` notation.
	pub fn parse(notation: &str) -> Option<Self> {
		let mut parts = notation.split(':');
		let group = parts.next().filter(|s| !s.is_empty())?;
		let name = parts.next().filter(|s| !s.is_empty())?;
		let version = parts.next().filter(|s| !s.is_empty());
		if parts.next().is_some() {
			return None;
		}
		let mut dep = Self::new(group, name);
		dep.version = version.map(str::to_owned);
		Some(dep)
	}

	pub fn with_version(mut self, version: impl Into<String>) -> Self {
		self.version = Some(version.into());
		self
	}

	pub fn because(mut self, reason: impl Into<String>) -> Self {
		self.reason = Some(reason.into());
		self
	}

	pub fn group(&self) -> &str {
		&self.group
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn version(&self) -> Option<&str> {
		self.version.as_deref()
	}

	pub fn reason(&self) -> Option<&str> {
		self.reason.as_deref()
	}

	/// Returns an equal but independent declaration.
	pub fn copy(&self) -> Self {
		self.clone()
	}
}

impl fmt::Display for Dependency {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}", self.group, self.name)?;
		if let Some(version) = &self.version {
			write!(f, ":{version}")?;
		}
		Ok(())
	}
}

/// Identity of the root component that owns a set of configurations.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComponentIdentity {
	pub group: String,
	pub name: String,
	pub version: String,
}

impl ComponentIdentity {
	pub fn new(group: impl Into<String>, name: impl Into<String>, version: impl Into<String>) -> Self {
		Self {
			group: group.into(),
			name: name.into(),
			version: version.into(),
		}
	}

	/// Private copy used by detached configurations, so that resolving them never
	/// collides with the owning component.
	pub fn detached(&self) -> Self {
		Self {
			group: self.group.clone(),
			name: format!("{}-detached", self.name),
			version: self.version.clone(),
		}
	}
}

impl Default for ComponentIdentity {
	fn default() -> Self {
		Self::new("", "unspecified", "unspecified")
	}
}

impl fmt::Display for ComponentIdentity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}:{}", self.group, self.name, self.version)
	}
}
