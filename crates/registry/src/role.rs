//! Configuration roles.
//!
//! A role is one of a fixed set of presets. Each preset carries its capabilities as
//! data, so two roles are compatible exactly when their [`UsageSet`]s are equal.

use std::fmt;

bitflags::bitflags! {
	/// Capabilities granted by a role.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
	pub struct UsageSet: u8 {
		/// Other components may select this configuration as a variant.
		const CONSUMABLE = 1 << 0;
		/// The configuration's dependency graph may be resolved.
		const RESOLVABLE = 1 << 1;
		/// Dependencies may be declared on the configuration.
		const DECLARABLE = 1 << 2;
	}
}

/// A single way of using a configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Usage {
	Consume,
	Resolve,
	Declare,
}

impl Usage {
	pub const fn as_set(self) -> UsageSet {
		match self {
			Self::Consume => UsageSet::CONSUMABLE,
			Self::Resolve => UsageSet::RESOLVABLE,
			Self::Declare => UsageSet::DECLARABLE,
		}
	}

	pub const fn past_participle(self) -> &'static str {
		match self {
			Self::Consume => "consumed",
			Self::Resolve => "resolved",
			Self::Declare => "declared against",
		}
	}
}

impl fmt::Display for Usage {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Consume => f.write_str("consumption"),
			Self::Resolve => f.write_str("resolution"),
			Self::Declare => f.write_str("declaration"),
		}
	}
}

/// Preset capability combinations a configuration may be created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
	/// Exposes artifacts and attributes to consumers.
	Consumable,
	/// Resolves a dependency graph.
	Resolvable,
	/// Collects declared dependencies for other configurations to extend.
	DependencyScope,
	/// Resolvable and declarable at once; kept for migration and deprecated.
	ResolvableDependencyScope,
	/// Every capability; the default for configurations created without a role.
	LegacyAll,
}

impl Role {
	pub const ALL: [Role; 5] = [
		Role::Consumable,
		Role::Resolvable,
		Role::DependencyScope,
		Role::ResolvableDependencyScope,
		Role::LegacyAll,
	];

	pub const fn usage(self) -> UsageSet {
		match self {
			Self::Consumable => UsageSet::CONSUMABLE,
			Self::Resolvable => UsageSet::RESOLVABLE,
			Self::DependencyScope => UsageSet::DECLARABLE,
			Self::ResolvableDependencyScope => UsageSet::RESOLVABLE.union(UsageSet::DECLARABLE),
			Self::LegacyAll => UsageSet::all(),
		}
	}

	pub const fn can_be_consumed(self) -> bool {
		self.usage().contains(UsageSet::CONSUMABLE)
	}

	pub const fn can_be_resolved(self) -> bool {
		self.usage().contains(UsageSet::RESOLVABLE)
	}

	pub const fn can_be_declared(self) -> bool {
		self.usage().contains(UsageSet::DECLARABLE)
	}

	pub const fn allows(self, usage: Usage) -> bool {
		self.usage().contains(usage.as_set())
	}

	/// Soft-fail signal: the role still works but using it should be reported.
	pub const fn is_deprecated(self) -> bool {
		matches!(self, Self::ResolvableDependencyScope)
	}

	/// Roles accepted by `maybe_create`; the legacy catch-all is not one of them.
	pub const fn is_valid_for_maybe_create(self) -> bool {
		!matches!(self, Self::LegacyAll)
	}

	/// Checks that an entry observed with `current` may be handed out for `requested`.
	///
	/// Only the capability set participates; the deprecation flag does not.
	pub fn validate_transition(current: Role, requested: Role) -> Result<(), RoleViolation> {
		if current.usage() == requested.usage() {
			Ok(())
		} else {
			Err(RoleViolation { current, requested })
		}
	}
}

impl fmt::Display for Role {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::Consumable => "Consumable",
			Self::Resolvable => "Resolvable",
			Self::DependencyScope => "Dependency Scope",
			Self::ResolvableDependencyScope => "Resolvable Dependency Scope",
			Self::LegacyAll => "Legacy",
		})
	}
}

/// A requested role disagrees with the capabilities already observed on an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("usage for role {requested} requested, but it already has role {current} ({})", describe(.current.usage()))]
pub struct RoleViolation {
	pub current: Role,
	pub requested: Role,
}

fn describe(usage: UsageSet) -> String {
	let flag = |set: UsageSet, name: &str| format!("{name}={}", usage.contains(set));
	[
		flag(UsageSet::CONSUMABLE, "canBeConsumed"),
		flag(UsageSet::RESOLVABLE, "canBeResolved"),
		flag(UsageSet::DECLARABLE, "canBeDeclared"),
	]
	.join(", ")
}
