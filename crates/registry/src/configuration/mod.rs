//! Configuration entries.
//!
//! A [`Configuration`] is a named, role-bound bucket of declared dependencies plus the
//! attributes that describe it as a variant. Its role decides which operations are legal;
//! once [locked](Configuration::lock) the role and the declared dependencies are frozen.
//!
//! # Invariants
//!
//! - The locked flag only ever moves from `false` to `true`.
//!   - Enforced in: [`Configuration::lock`].
//!   - Tested by: `configuration::tests::lock_is_monotonic`
//! - A configuration is never its own ancestor.
//!   - Enforced in: [`Configuration::extends_from`] (checked under the scope's hierarchy lock).
//!   - Tested by: `configuration::tests::extends_from_rejects_cycles`
//! - A role-specific entry keeps the role it was created with.
//!   - Enforced in: [`Configuration::set_role`].
//!   - Tested by: `configuration::tests::fixed_role_rejects_set_role`

use std::fmt;
use std::sync::Arc;

use gantry_matcher::{AttributeSet, AttributeValue, HasAttributes};
use parking_lot::{Mutex, RwLock};

use crate::dependency::{ComponentIdentity, Dependency};
use crate::diagnostics::{Deprecation, Diagnostics};
use crate::error::{RegistryError, Result};
use crate::role::{Role, RoleViolation, Usage};

mod provider;

pub use provider::ConfigurationProvider;
pub(crate) use provider::Configure;

/// Shared scope of a group of configurations.
///
/// Every configuration of a registry points at the registry's owner. A detached
/// configuration gets an owner of its own, so it never shares identity or hierarchy
/// with anything else.
pub(crate) struct Owner {
	pub(crate) component: ComponentIdentity,
	pub(crate) diagnostics: Arc<Diagnostics>,
	pub(crate) detached: bool,
	hierarchy: Mutex<()>,
}

impl Owner {
	pub(crate) fn new(component: ComponentIdentity, diagnostics: Arc<Diagnostics>, detached: bool) -> Self {
		Self {
			component,
			diagnostics,
			detached,
			hierarchy: Mutex::new(()),
		}
	}
}

struct State {
	role: Role,
	locked: bool,
	dependencies: Vec<Arc<Dependency>>,
	attributes: AttributeSet,
	parents: Vec<Arc<Configuration>>,
	description: Option<String>,
}

/// A named, role-bound configuration.
pub struct Configuration {
	name: String,
	owner: Arc<Owner>,
	fixed_role: bool,
	state: RwLock<State>,
}

impl Configuration {
	pub(crate) fn new(name: impl Into<String>, role: Role, owner: Arc<Owner>) -> Self {
		Self {
			name: name.into(),
			owner,
			fixed_role: false,
			state: RwLock::new(State {
				role,
				locked: false,
				dependencies: Vec::new(),
				attributes: AttributeSet::empty(),
				parents: Vec::new(),
				description: None,
			}),
		}
	}

	/// Marks the role as part of the entry's identity; [`set_role`](Self::set_role) then fails
	/// even while the entry is unlocked.
	pub(crate) fn with_fixed_role(mut self) -> Self {
		self.fixed_role = true;
		self
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn role(&self) -> Role {
		self.state.read().role
	}

	pub fn is_locked(&self) -> bool {
		self.state.read().locked
	}

	/// True for configurations created by `detached_configuration`.
	pub fn is_detached(&self) -> bool {
		self.owner.detached
	}

	pub fn is_can_be_consumed(&self) -> bool {
		self.role().can_be_consumed()
	}

	pub fn is_can_be_resolved(&self) -> bool {
		self.role().can_be_resolved()
	}

	pub fn is_can_be_declared(&self) -> bool {
		self.role().can_be_declared()
	}

	/// Identity of the component this configuration belongs to.
	pub fn component(&self) -> &ComponentIdentity {
		&self.owner.component
	}

	pub fn description(&self) -> Option<String> {
		self.state.read().description.clone()
	}

	pub fn set_description(&self, description: impl Into<String>) {
		self.state.write().description = Some(description.into());
	}

	/// Freezes the role and the declared dependencies. Idempotent.
	pub fn lock(&self) {
		let mut state = self.state.write();
		if !state.locked {
			state.locked = true;
			tracing::trace!(target: crate::container::REGISTRY_TARGET, name = %self.name, role = %state.role, "configuration usage locked");
		}
	}

	/// Checks the role against `requested` and locks, in one step.
	///
	/// Nothing can change the role between the check and the lock. On a mismatch the entry
	/// is left as it was.
	pub fn lock_verified(&self, requested: Role) -> std::result::Result<(), RoleViolation> {
		let mut state = self.state.write();
		Role::validate_transition(state.role, requested)?;
		if !state.locked {
			state.locked = true;
			tracing::trace!(target: crate::container::REGISTRY_TARGET, name = %self.name, role = %state.role, "configuration usage locked");
		}
		Ok(())
	}

	/// Replaces the role of an unlocked configuration.
	pub fn set_role(&self, role: Role) -> Result<()> {
		let mut state = self.state.write();
		if state.locked || self.fixed_role {
			return Err(self.mutation_rejected("change the role of"));
		}
		state.role = role;
		Ok(())
	}

	/// Fails unless the current role allows `usage`.
	///
	/// A deprecated role still passes, but the usage is reported. Detached entries are
	/// exempt because their role is chosen by the registry, not by the caller.
	pub fn check_usage(&self, usage: Usage) -> Result<()> {
		let role = self.role();
		if !role.allows(usage) {
			return Err(RegistryError::UsageNotAllowed {
				name: self.name.clone(),
				role,
				usage,
			});
		}
		if role.is_deprecated() && !self.is_detached() {
			self.diagnostics().report(
				Deprecation::new(format!(
					"Using configuration '{}' with the {role} role for {usage}.",
					self.name
				))
				.with_advice("Split it into a dependency scope and a resolvable configuration.")
				.with_guide_section("configurations_allowed_usage"),
			);
		}
		Ok(())
	}

	/// Declares a dependency; requires an unlocked, declarable configuration.
	pub fn add_dependency(&self, dependency: Dependency) -> Result<Arc<Dependency>> {
		let mut state = self.state.write();
		if state.locked {
			return Err(self.mutation_rejected("declare dependencies on"));
		}
		if !state.role.can_be_declared() {
			return Err(RegistryError::UsageNotAllowed {
				name: self.name.clone(),
				role: state.role,
				usage: Usage::Declare,
			});
		}
		let dependency = Arc::new(dependency);
		state.dependencies.push(Arc::clone(&dependency));
		Ok(dependency)
	}

	pub(crate) fn push_dependency(&self, dependency: Dependency) {
		self.state.write().dependencies.push(Arc::new(dependency));
	}

	/// Dependencies declared directly on this configuration, in declaration order.
	pub fn dependencies(&self) -> Vec<Arc<Dependency>> {
		self.state.read().dependencies.clone()
	}

	/// Dependencies declared on this configuration and every ancestor, without duplicates.
	pub fn all_dependencies(&self) -> Vec<Arc<Dependency>> {
		let mut all = self.dependencies();
		for ancestor in self.ancestors() {
			for dep in ancestor.dependencies() {
				if !all.iter().any(|d| **d == *dep) {
					all.push(dep);
				}
			}
		}
		all
	}

	pub fn attributes(&self) -> AttributeSet {
		self.state.read().attributes.clone()
	}

	pub fn set_attributes(&self, attributes: AttributeSet) {
		self.state.write().attributes = attributes;
	}

	/// Adds or replaces one attribute.
	pub fn attribute(&self, name: &str, value: impl Into<AttributeValue>) {
		let mut state = self.state.write();
		state.attributes = state.attributes.with(name, value);
	}

	/// Makes `parent` a direct ancestor of this configuration.
	///
	/// Both configurations must belong to the same scope, and the new edge must not
	/// close a cycle.
	pub fn extends_from(&self, parent: &Arc<Configuration>) -> Result<()> {
		if !Arc::ptr_eq(&self.owner, &parent.owner) {
			return Err(RegistryError::HierarchyValidationRejected {
				name: self.name.clone(),
				mutation: "extend",
				reason: format!("configuration '{}' belongs to a different container", parent.name),
			});
		}

		let _hierarchy = self.owner.hierarchy.lock();
		if std::ptr::eq(self, &**parent) || parent.ancestors().iter().any(|a| std::ptr::eq(self, &**a)) {
			return Err(RegistryError::CyclicHierarchy {
				child: self.name.clone(),
				parent: parent.name.clone(),
			});
		}

		let mut state = self.state.write();
		if !state.parents.iter().any(|p| Arc::ptr_eq(p, parent)) {
			state.parents.push(Arc::clone(parent));
		}
		Ok(())
	}

	/// Direct parents, in the order they were added.
	pub fn parents(&self) -> Vec<Arc<Configuration>> {
		self.state.read().parents.clone()
	}

	pub fn extends_from_names(&self) -> Vec<String> {
		self.state.read().parents.iter().map(|p| p.name.clone()).collect()
	}

	/// Every transitive ancestor, breadth first, each listed once.
	pub fn ancestors(&self) -> Vec<Arc<Configuration>> {
		let mut seen: Vec<Arc<Configuration>> = Vec::new();
		let mut queue = self.parents();
		let mut next = 0;
		while next < queue.len() {
			let current = Arc::clone(&queue[next]);
			next += 1;
			if seen.iter().any(|s| Arc::ptr_eq(s, &current)) {
				continue;
			}
			queue.extend(current.parents());
			seen.push(current);
		}
		seen
	}

	pub(crate) fn diagnostics(&self) -> &Diagnostics {
		&self.owner.diagnostics
	}

	fn mutation_rejected(&self, action: &'static str) -> RegistryError {
		RegistryError::UsageMutationRejected {
			name: self.name.clone(),
			action,
		}
	}
}

impl fmt::Debug for Configuration {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let state = self.state.read();
		f.debug_struct("Configuration")
			.field("name", &self.name)
			.field("role", &state.role)
			.field("locked", &state.locked)
			.field("detached", &self.owner.detached)
			.field("dependencies", &state.dependencies.len())
			.field("attributes", &state.attributes)
			.finish()
	}
}

impl fmt::Display for Configuration {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "configuration '{}'", self.name)
	}
}

/// A configuration paired with a snapshot of its attributes, ready for matching.
#[derive(Debug, Clone)]
pub struct ConfigurationVariant {
	pub attributes: AttributeSet,
	pub configuration: Arc<Configuration>,
}

impl ConfigurationVariant {
	pub fn of(configuration: Arc<Configuration>) -> Self {
		Self {
			attributes: configuration.attributes(),
			configuration,
		}
	}
}

impl HasAttributes for ConfigurationVariant {
	fn attributes(&self) -> &AttributeSet {
		&self.attributes
	}
}
