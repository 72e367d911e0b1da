use crate::role::{Role, RoleViolation, Usage};

/// Errors raised by the configuration registry and its entries.
///
/// Every error is local to the operation that raised it: the registry and the entry
/// involved are left exactly as they were before the call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
	/// A non-detached configuration with this name already exists.
	#[error("cannot add a configuration with name '{name}' as a configuration with that name already exists")]
	DuplicateName { name: String },

	/// The requested role is incompatible with the role of the existing entry.
	#[error("cannot use configuration '{name}': {violation}")]
	RoleConflict { name: String, violation: RoleViolation },

	/// Lookup of an unknown name.
	#[error("Configuration with name '{name}' not found.")]
	NotFound { name: String },

	/// The entry is locked and its usage or dependencies can no longer change.
	#[error("cannot {action} configuration '{name}': its usage has been locked")]
	UsageMutationRejected { name: String, action: &'static str },

	/// The entry's role does not allow the requested usage.
	#[error("configuration '{name}' with role {role} cannot be {}", .usage.past_participle())]
	UsageNotAllowed { name: String, role: Role, usage: Usage },

	/// A mutation validator vetoed a structural change.
	#[error("cannot {mutation} configuration '{name}': {reason}")]
	HierarchyValidationRejected {
		name: String,
		mutation: &'static str,
		reason: String,
	},

	/// `maybe_create` only accepts role-specific presets.
	#[error("cannot maybe create configuration '{name}' with invalid role: {role}")]
	InvalidMaybeCreateRole { name: String, role: Role },

	/// `extends_from` would make a configuration its own ancestor.
	#[error("cyclic extendsFrom from configuration '{child}' to '{parent}' is not allowed")]
	CyclicHierarchy { child: String, parent: String },

	/// The container no longer accepts structural changes.
	#[error("cannot call {method} on {container}: the container has been sealed")]
	ContainerSealed { container: String, method: &'static str },
}

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
