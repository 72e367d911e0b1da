use std::fmt;
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

use super::{Configuration, Owner};
use crate::role::Role;

/// A configure action, run once on a fresh entry before anyone else can observe it.
pub(crate) type Configure = Box<dyn FnOnce(&Configuration) + Send>;

struct Pending {
	owner: Arc<Owner>,
	configure: Option<Configure>,
	role_specific: bool,
}

/// Handle to a registered configuration that may not exist yet.
///
/// Lazily registered configurations are realized on the first [`get`](Self::get), which
/// builds the entry, runs its configure action and, for role-specific registrations,
/// locks it. A role-specific entry cannot change its role, not even from inside the
/// configure action, so [`role`](Self::role) always agrees with the realized entry.
///
/// Realization happens exactly once; concurrent callers block until it is done and then
/// observe the same entry. If the configure action panics the provider is poisoned and
/// every later [`get`](Self::get) panics too.
pub struct ConfigurationProvider {
	name: String,
	role: Role,
	pending: Mutex<Option<Pending>>,
	cell: OnceLock<Arc<Configuration>>,
}

impl ConfigurationProvider {
	pub(crate) fn lazy(
		name: String,
		role: Role,
		owner: Arc<Owner>,
		configure: Option<Configure>,
		role_specific: bool,
	) -> Self {
		Self {
			name,
			role,
			pending: Mutex::new(Some(Pending {
				owner,
				configure,
				role_specific,
			})),
			cell: OnceLock::new(),
		}
	}

	pub(crate) fn realized(configuration: Arc<Configuration>) -> Self {
		let cell = OnceLock::new();
		let role = configuration.role();
		let name = configuration.name().to_owned();
		let _ = cell.set(configuration);
		Self {
			name,
			role,
			pending: Mutex::new(None),
			cell,
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// Role the configuration was registered with.
	pub fn role(&self) -> Role {
		self.role
	}

	pub fn is_realized(&self) -> bool {
		self.cell.get().is_some()
	}

	/// The entry, if it has been realized already.
	pub fn get_if_realized(&self) -> Option<&Arc<Configuration>> {
		self.cell.get()
	}

	/// Realizes the entry if needed and returns it.
	///
	/// The configure action must not call `get` on its own provider.
	///
	/// # Panics
	///
	/// When an earlier realization was aborted by a panicking configure action.
	pub fn get(&self) -> Arc<Configuration> {
		Arc::clone(self.cell.get_or_init(|| {
			let pending = self.pending.lock().take();
			let Some(Pending {
				owner,
				configure,
				role_specific,
			}) = pending
			else {
				panic!("configuration '{}' is poisoned: its configure action panicked", self.name);
			};

			let mut configuration = Configuration::new(self.name.clone(), self.role, owner);
			if role_specific {
				configuration = configuration.with_fixed_role();
			}
			if let Some(configure) = configure {
				configure(&configuration);
			}
			if role_specific {
				configuration.lock();
			}
			tracing::debug!(target: crate::container::REGISTRY_TARGET, name = %self.name, role = %self.role, "realized lazy configuration");
			Arc::new(configuration)
		}))
	}
}

impl fmt::Debug for ConfigurationProvider {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ConfigurationProvider")
			.field("name", &self.name)
			.field("role", &self.role)
			.field("realized", &self.is_realized())
			.finish()
	}
}
