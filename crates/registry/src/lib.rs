//! Role-bound configuration registry.
//!
//! A [`ConfigurationRegistry`] is the named namespace of [`Configuration`]s that one
//! component declares. Every configuration carries a [`Role`] that decides whether it may
//! be consumed, resolved or declared against, and that role can be locked so uncoordinated
//! callers asking for the same shared configuration all see the same, stable entry.
//!
//! ```
//! use gantry_registry::{ComponentIdentity, ConfigurationRegistry, Role};
//!
//! let registry = ConfigurationRegistry::new("project ':app'", ComponentIdentity::default());
//! let first = registry.maybe_create_resolvable_locked("compileClasspath").unwrap();
//! let second = registry.maybe_create_resolvable_locked("compileClasspath").unwrap();
//!
//! assert!(std::sync::Arc::ptr_eq(&first, &second));
//! assert!(first.is_locked());
//! assert_eq!(first.role(), Role::Resolvable);
//! ```
//!
//! Variant selection over the consumable entries lives in [`select_consumable_variant`].

mod config;
mod configuration;
mod container;
mod dependency;
mod diagnostics;
mod error;
mod role;
mod selection;

pub use config::{ConfigError, ExplainMode, RegistrySettings, WarningMode};
pub use configuration::{Configuration, ConfigurationProvider, ConfigurationVariant};
pub use container::{
	ConfigurationRegistry, CreationRequest, DETACHED_PREFIX, ExtendedParentValidator, HierarchyMutation, MutationKind,
	MutationValidator, REGISTRY_TARGET, is_reserved_name,
};
pub use dependency::{ComponentIdentity, Dependency};
pub use diagnostics::{DEPRECATION_TARGET, Deprecation, Diagnostics};
pub use error::{RegistryError, Result};
pub use gantry_matcher as matcher;
pub use role::{Role, RoleViolation, Usage, UsageSet};
pub use selection::{SelectionError, select_consumable_variant};
