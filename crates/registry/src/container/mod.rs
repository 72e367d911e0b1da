//! The named configuration registry.
//!
//! # Role
//!
//! [`ConfigurationRegistry`] owns every non-detached configuration of one component. It
//! enforces name uniqueness and role compatibility, realizes lazy registrations once,
//! and routes every structural change through the mutation validators.
//!
//! # Invariants
//!
//! - Readers never observe a partially configured entry.
//!   - Enforced in: entries are configured (and locked, where required) before the
//!     snapshot holding them is published.
//!   - Tested by: `container::tests::configure_runs_before_publication`
//! - No two published entries share a name.
//!   - Enforced in: `ConfigurationRegistry::commit` (rechecked under the writer lock).
//!   - Tested by: `container::tests::create_twice_is_duplicate`
//! - A rejected mutation leaves the published snapshot untouched, batches included.
//!   - Enforced in: `ConfigurationRegistry::commit` (one snapshot per batch).
//!   - Tested by: `container::tests::rejected_add_is_rolled_back`, `container::tests::add_all_is_all_or_nothing`
//! - Concurrent `maybe_create` calls for one name yield the same entry.
//!   - Enforced in: [`ConfigurationRegistry::maybe_create`] (lookup-or-insert under the writer lock).
//!   - Tested by: `tests/concurrent_maybe_create.rs`

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::ArcSwap;
use gantry_matcher::MatchExplanation;
use parking_lot::Mutex;

use crate::config::{ExplainMode, RegistrySettings};
use crate::configuration::{Configuration, ConfigurationProvider, Configure, Owner};
use crate::dependency::{ComponentIdentity, Dependency};
use crate::diagnostics::{Deprecation, Diagnostics};
use crate::error::{RegistryError, Result};
use crate::role::Role;

mod request;
mod snapshot;
mod validation;

pub use request::CreationRequest;
use snapshot::Snapshot;
pub use validation::{ExtendedParentValidator, HierarchyMutation, MutationKind, MutationValidator};

/// Tracing target for structural registry events.
pub const REGISTRY_TARGET: &str = "gantry::registry";

/// Name prefix reserved for detached configurations.
pub const DETACHED_PREFIX: &str = "detachedConfiguration";

/// True for `detachedConfiguration` optionally followed by digits.
pub fn is_reserved_name(name: &str) -> bool {
	name.strip_prefix(DETACHED_PREFIX)
		.is_some_and(|rest| rest.bytes().all(|b| b.is_ascii_digit()))
}

/// Entries published together, each with its realized configuration when there is one.
type Batch<'a> = Vec<(Arc<ConfigurationProvider>, Option<&'a Arc<Configuration>>)>;

struct Writer {
	validators: Vec<Box<dyn MutationValidator>>,
}

/// Named container of configurations for one component.
pub struct ConfigurationRegistry {
	owner: Arc<Owner>,
	display_name: String,
	explain: ExplainMode,
	state: ArcSwap<Snapshot>,
	writer: Mutex<Writer>,
	detached_count: AtomicU64,
}

impl ConfigurationRegistry {
	/// Creates an empty registry owned by `owner` (e.g. `project ':app'`).
	pub fn new(owner: impl Into<String>, root_component: ComponentIdentity) -> Self {
		let settings = RegistrySettings {
			owner: owner.into(),
			..RegistrySettings::default()
		};
		Self::with_settings(root_component, &settings)
	}

	pub fn with_settings(root_component: ComponentIdentity, settings: &RegistrySettings) -> Self {
		let diagnostics = Arc::new(Diagnostics::new(settings.warning_mode));
		Self {
			owner: Arc::new(Owner::new(root_component, diagnostics, false)),
			display_name: format!("configuration container for {}", settings.owner),
			explain: settings.explain,
			state: ArcSwap::from_pointee(Snapshot::default()),
			writer: Mutex::new(Writer {
				validators: vec![Box::new(ExtendedParentValidator)],
			}),
			detached_count: AtomicU64::new(1),
		}
	}

	pub fn display_name(&self) -> &str {
		&self.display_name
	}

	pub fn root_component(&self) -> &ComponentIdentity {
		&self.owner.component
	}

	pub fn diagnostics(&self) -> &Arc<Diagnostics> {
		&self.owner.diagnostics
	}

	/// Explanation sink selected by the registry settings.
	pub fn explanation(&self) -> Box<dyn MatchExplanation + Send> {
		self.explain.sink()
	}

	/// Creates an unlocked configuration.
	pub fn create(&self, name: &str, role: Role) -> Result<Arc<Configuration>> {
		self.create_entry(name, role, |_| {}, false, "create")
	}

	/// Creates an unlocked configuration and configures it before publication.
	pub fn create_with(
		&self,
		name: &str,
		role: Role,
		configure: impl FnOnce(&Configuration),
	) -> Result<Arc<Configuration>> {
		self.create_entry(name, role, configure, false, "create")
	}

	/// Creates a configuration whose usage is locked before it becomes visible.
	pub fn create_locked(&self, name: &str, role: Role) -> Result<Arc<Configuration>> {
		self.create_entry(name, role, |_| {}, true, "createLocked")
	}

	pub fn create_locked_with(
		&self,
		name: &str,
		role: Role,
		configure: impl FnOnce(&Configuration),
	) -> Result<Arc<Configuration>> {
		self.create_entry(name, role, configure, true, "createLocked")
	}

	/// Returns the entry named by `request`, creating it locked if absent.
	///
	/// With `verify_preexisting`, an existing entry must have a role compatible with the
	/// request and is locked before it is returned. Without it the existing entry is
	/// returned as is.
	pub fn maybe_create(&self, request: &CreationRequest, verify_preexisting: bool) -> Result<Arc<Configuration>> {
		let existing = {
			let writer = self.writer.lock();
			let current = self.state.load_full();
			match current.get(&request.name) {
				Some(provider) => Arc::clone(provider),
				None => return self.insert_maybe_created(&writer, &current, request),
			}
		};

		let configuration = existing.get();
		if verify_preexisting {
			configuration
				.lock_verified(request.role)
				.map_err(|violation| RegistryError::RoleConflict {
					name: request.name.clone(),
					violation,
				})?;
		}
		Ok(configuration)
	}

	pub fn maybe_create_consumable_locked(&self, name: &str) -> Result<Arc<Configuration>> {
		self.maybe_create(&CreationRequest::new(name, Role::Consumable), true)
	}

	pub fn maybe_create_resolvable_locked(&self, name: &str) -> Result<Arc<Configuration>> {
		self.maybe_create(&CreationRequest::new(name, Role::Resolvable), true)
	}

	pub fn maybe_create_dependency_scope_locked(&self, name: &str, verify_preexisting: bool) -> Result<Arc<Configuration>> {
		self.maybe_create(&CreationRequest::new(name, Role::DependencyScope), verify_preexisting)
	}

	pub fn maybe_create_resolvable_dependency_scope_locked(&self, name: &str) -> Result<Arc<Configuration>> {
		self.maybe_create(&CreationRequest::new(name, Role::ResolvableDependencyScope), true)
	}

	fn insert_maybe_created(
		&self,
		writer: &Writer,
		current: &Snapshot,
		request: &CreationRequest,
	) -> Result<Arc<Configuration>> {
		if current.sealed {
			return Err(self.sealed_error("maybeCreate"));
		}
		if !request.role.is_valid_for_maybe_create() {
			return Err(RegistryError::InvalidMaybeCreateRole {
				name: request.name.clone(),
				role: request.role,
			});
		}
		let configuration = Configuration::new(request.name.clone(), request.role, Arc::clone(&self.owner));
		configuration.lock();
		let configuration = Arc::new(configuration);
		let provider = Arc::new(ConfigurationProvider::realized(Arc::clone(&configuration)));
		self.commit(writer, current, vec![(provider, Some(&configuration))], MutationKind::Add)?;
		Ok(configuration)
	}

	/// Creates a configuration outside the registry.
	///
	/// The entry gets a generated `detachedConfiguration<N>` name, a private component
	/// identity and a copy of every given dependency. It is never published, validated
	/// or visited.
	pub fn detached_configuration<'a>(&self, dependencies: impl IntoIterator<Item = &'a Dependency>) -> Arc<Configuration> {
		let id = self.detached_count.fetch_add(1, Ordering::Relaxed);
		let name = format!("{DETACHED_PREFIX}{id}");
		let owner = Arc::new(Owner::new(
			self.owner.component.detached(),
			Arc::clone(&self.owner.diagnostics),
			true,
		));

		let configuration = Configuration::new(name, Role::ResolvableDependencyScope, owner);
		for dependency in dependencies {
			configuration.push_dependency(dependency.copy());
		}
		tracing::trace!(target: REGISTRY_TARGET, name = configuration.name(), "created detached configuration");
		Arc::new(configuration)
	}

	/// Looks up an entry, realizing it if it was registered lazily.
	pub fn find_by_name(&self, name: &str) -> Option<Arc<Configuration>> {
		let provider = self.named(name)?;
		Some(provider.get())
	}

	pub fn get_by_name(&self, name: &str) -> Result<Arc<Configuration>> {
		self.find_by_name(name).ok_or_else(|| RegistryError::NotFound { name: name.to_owned() })
	}

	/// Looks up the provider for `name` without realizing it.
	pub fn named(&self, name: &str) -> Option<Arc<ConfigurationProvider>> {
		self.state.load().get(name).cloned()
	}

	/// Calls `visitor` on every consumable entry, in insertion order.
	///
	/// A pending registration is realized only when its registered role can be consumed.
	/// Role-specific registrations cannot change role, so the others are skipped as they
	/// are. Legacy registrations are realized, since their configure action may narrow the
	/// role.
	pub fn visit_consumable(&self, mut visitor: impl FnMut(&Arc<Configuration>)) {
		let current = self.state.load_full();
		for provider in current.entries.values() {
			if !provider.is_realized() && !provider.role().can_be_consumed() {
				continue;
			}
			let configuration = provider.get();
			if configuration.is_can_be_consumed() {
				visitor(&configuration);
			}
		}
	}

	/// Registers a configuration that is realized on first access.
	pub fn register(&self, name: &str, role: Role) -> Result<Arc<ConfigurationProvider>> {
		self.register_entry(name, role, None, role != Role::LegacyAll, "register")
	}

	pub fn register_with(
		&self,
		name: &str,
		role: Role,
		configure: impl FnOnce(&Configuration) + Send + 'static,
	) -> Result<Arc<ConfigurationProvider>> {
		self.register_entry(name, role, Some(Box::new(configure)), role != Role::LegacyAll, "register")
	}

	pub fn consumable(&self, name: &str) -> Result<Arc<ConfigurationProvider>> {
		self.register_entry(name, Role::Consumable, None, true, "consumable")
	}

	pub fn resolvable(&self, name: &str) -> Result<Arc<ConfigurationProvider>> {
		self.register_entry(name, Role::Resolvable, None, true, "resolvable")
	}

	pub fn dependency_scope(&self, name: &str) -> Result<Arc<ConfigurationProvider>> {
		self.register_entry(name, Role::DependencyScope, None, true, "dependencyScope")
	}

	/// Removes an entry. Pending registrations are dropped without being realized.
	pub fn remove(&self, name: &str) -> Result<Arc<ConfigurationProvider>> {
		let writer = self.writer.lock();
		let current = self.state.load_full();
		if current.sealed {
			return Err(self.sealed_error("remove"));
		}
		let provider = current
			.get(name)
			.cloned()
			.ok_or_else(|| RegistryError::NotFound { name: name.to_owned() })?;

		let mutation = HierarchyMutation {
			kind: MutationKind::Remove,
			name,
			entry: provider.get_if_realized(),
			current: &current,
		};
		validate(&writer, &mutation)?;
		self.state.store(Arc::new(current.without(name)));
		tracing::debug!(target: REGISTRY_TARGET, name, "configuration removed");
		Ok(provider)
	}

	/// Rejects every later structural mutation. Lookups keep working.
	pub fn seal(&self) {
		let _writer = self.writer.lock();
		let current = self.state.load_full();
		if !current.sealed {
			self.state.store(Arc::new(current.sealed()));
			tracing::debug!(target: REGISTRY_TARGET, container = %self.display_name, "container sealed");
		}
	}

	pub fn is_sealed(&self) -> bool {
		self.state.load().sealed
	}

	/// Appends a validator; validators run in the order they were added.
	pub fn add_validator(&self, validator: impl MutationValidator + 'static) {
		self.writer.lock().validators.push(Box::new(validator));
	}

	/// Names of every published entry, in insertion order.
	pub fn names(&self) -> Vec<String> {
		self.state.load().entries.keys().map(|k| k.to_string()).collect()
	}

	/// Every published entry, realizing pending ones.
	pub fn all(&self) -> Vec<Arc<Configuration>> {
		let current = self.state.load_full();
		current.entries.values().map(|p| p.get()).collect()
	}

	pub fn len(&self) -> usize {
		self.state.load().entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn contains(&self, name: &str) -> bool {
		self.state.load().get(name).is_some()
	}

	/// Adds a configuration with the legacy role. Deprecated.
	pub fn add(&self, name: &str) -> Result<Arc<Configuration>> {
		self.nag_legacy_add("Adding a configuration directly to the configuration container.");
		self.create_entry(name, Role::LegacyAll, |_| {}, false, "add")
	}

	/// Adds several legacy configurations. Deprecated.
	///
	/// Either every name is published or, on the first failure, none is.
	pub fn add_all<I, S>(&self, names: I) -> Result<Vec<Arc<Configuration>>>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		self.nag_legacy_add("Adding a collection of configurations directly to the configuration container.");
		let configurations: Vec<Arc<Configuration>> = names
			.into_iter()
			.map(|name| Arc::new(Configuration::new(name.as_ref(), Role::LegacyAll, Arc::clone(&self.owner))))
			.collect();
		let batch = configurations
			.iter()
			.map(|c| (Arc::new(ConfigurationProvider::realized(Arc::clone(c))), Some(c)))
			.collect();
		self.publish(batch, MutationKind::Add, "addAll")?;
		Ok(configurations)
	}

	/// Registers a lazy legacy configuration. Deprecated.
	pub fn add_later(
		&self,
		name: &str,
		configure: impl FnOnce(&Configuration) + Send + 'static,
	) -> Result<Arc<ConfigurationProvider>> {
		self.nag_legacy_add("Adding a configuration provider directly to the configuration container.");
		self.register_entry(name, Role::LegacyAll, Some(Box::new(configure)), false, "addLater")
	}

	/// Registers several lazy legacy configurations, all or none. Deprecated.
	pub fn add_all_later<I, S>(&self, names: I) -> Result<Vec<Arc<ConfigurationProvider>>>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		self.nag_legacy_add("Adding a provider of configurations directly to the configuration container.");
		let providers: Vec<Arc<ConfigurationProvider>> = names
			.into_iter()
			.map(|name| {
				Arc::new(ConfigurationProvider::lazy(
					name.as_ref().to_owned(),
					Role::LegacyAll,
					Arc::clone(&self.owner),
					None,
					false,
				))
			})
			.collect();
		let batch = providers.iter().map(|p| (Arc::clone(p), None)).collect();
		self.publish(batch, MutationKind::LazyAdd, "addAllLater")?;
		Ok(providers)
	}

	fn create_entry(
		&self,
		name: &str,
		role: Role,
		configure: impl FnOnce(&Configuration),
		lock: bool,
		method: &'static str,
	) -> Result<Arc<Configuration>> {
		// Fail before running the configure action when the outcome is already known.
		let current = self.state.load_full();
		if current.sealed {
			return Err(self.sealed_error(method));
		}
		check_vacant(&current, name, role)?;

		let configuration = Configuration::new(name, role, Arc::clone(&self.owner));
		configure(&configuration);
		if lock {
			configuration.lock();
		}
		let configuration = Arc::new(configuration);
		let provider = Arc::new(ConfigurationProvider::realized(Arc::clone(&configuration)));
		self.publish(vec![(provider, Some(&configuration))], MutationKind::Add, method)?;
		Ok(configuration)
	}

	fn register_entry(
		&self,
		name: &str,
		role: Role,
		configure: Option<Configure>,
		role_specific: bool,
		method: &'static str,
	) -> Result<Arc<ConfigurationProvider>> {
		let provider = Arc::new(ConfigurationProvider::lazy(
			name.to_owned(),
			role,
			Arc::clone(&self.owner),
			configure,
			role_specific,
		));
		self.publish(vec![(Arc::clone(&provider), None)], MutationKind::LazyAdd, method)?;
		Ok(provider)
	}

	fn publish(&self, batch: Batch<'_>, kind: MutationKind, method: &'static str) -> Result<()> {
		let writer = self.writer.lock();
		let current = self.state.load_full();
		if current.sealed {
			return Err(self.sealed_error(method));
		}
		self.commit(&writer, &current, batch, kind)
	}

	/// Checks and validates every entry of `batch`, then publishes them in one snapshot.
	///
	/// Each entry is checked against the snapshot that already holds the entries before
	/// it. Nothing is published or reported unless the whole batch passes. The caller
	/// holds the writer lock.
	fn commit(&self, writer: &Writer, current: &Snapshot, batch: Batch<'_>, kind: MutationKind) -> Result<()> {
		let mut next = current.clone();
		let mut published = Vec::with_capacity(batch.len());
		for (provider, entry) in batch {
			check_vacant(&next, provider.name(), provider.role())?;
			let mutation = HierarchyMutation {
				kind,
				name: provider.name(),
				entry,
				current: &next,
			};
			validate(writer, &mutation)?;
			next = next.with_entry(Arc::clone(&provider));
			published.push(provider);
		}

		for provider in &published {
			self.announce(provider.name(), provider.role());
			tracing::debug!(
				target: REGISTRY_TARGET,
				name = provider.name(),
				role = %provider.role(),
				?kind,
				"configuration published"
			);
		}
		self.state.store(Arc::new(next));
		Ok(())
	}

	/// Reports deprecated creation paths. Never fails.
	fn announce(&self, name: &str, role: Role) {
		if is_reserved_name(name) {
			self.owner.diagnostics.report(
				Deprecation::new(format!(
					"Creating a configuration with a name that starts with '{DETACHED_PREFIX}'."
				))
				.with_advice(format!("Use a different name for the configuration '{name}'."))
				.with_guide_section("reserved_configuration_names"),
			);
		}
		if role.is_deprecated() {
			self.owner.diagnostics.report(
				Deprecation::new(format!("Creating configuration '{name}' with the {role} role."))
					.with_advice("Create a dependency scope and a separate resolvable configuration instead.")
					.with_guide_section("configurations_allowed_usage"),
			);
		}
	}

	fn nag_legacy_add(&self, summary: &str) {
		self.owner.diagnostics.report(
			Deprecation::new(summary)
				.with_advice("Use a factory method instead.")
				.with_guide_section("adding_to_configuration_container"),
		);
	}

	fn sealed_error(&self, method: &'static str) -> RegistryError {
		RegistryError::ContainerSealed {
			container: self.display_name.clone(),
			method,
		}
	}
}

fn check_vacant(current: &Snapshot, name: &str, role: Role) -> Result<()> {
	let Some(existing) = current.get(name) else {
		return Ok(());
	};
	let existing_role = existing.get_if_realized().map_or(existing.role(), |c| c.role());
	match Role::validate_transition(existing_role, role) {
		Err(violation) => Err(RegistryError::RoleConflict {
			name: name.to_owned(),
			violation,
		}),
		Ok(()) => Err(RegistryError::DuplicateName { name: name.to_owned() }),
	}
}

fn validate(writer: &Writer, mutation: &HierarchyMutation<'_>) -> Result<()> {
	for validator in &writer.validators {
		if let Err(reason) = validator.validate(mutation) {
			tracing::debug!(target: REGISTRY_TARGET, name = mutation.name, kind = ?mutation.kind, %reason, "mutation rejected");
			return Err(RegistryError::HierarchyValidationRejected {
				name: mutation.name.to_owned(),
				mutation: mutation.kind.verb(),
				reason,
			});
		}
	}
	Ok(())
}

impl fmt::Debug for ConfigurationRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ConfigurationRegistry")
			.field("display_name", &self.display_name)
			.field("names", &self.names())
			.field("sealed", &self.is_sealed())
			.finish()
	}
}

impl fmt::Display for ConfigurationRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.display_name)
	}
}

#[cfg(test)]
mod tests;
