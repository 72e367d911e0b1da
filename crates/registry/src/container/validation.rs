//! Hierarchy mutation validators.
//!
//! Validators run synchronously, in registration order, under the registry's writer lock
//! and before the mutation is published. The first rejection aborts the mutation.

use std::sync::Arc;

use super::snapshot::Snapshot;
use crate::configuration::Configuration;

/// Kind of structural change being validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
	/// A realized entry is about to be published.
	Add,
	/// A lazy registration is about to be published.
	LazyAdd,
	/// An entry is about to be removed.
	Remove,
}

impl MutationKind {
	pub(crate) fn verb(self) -> &'static str {
		match self {
			Self::Add => "add",
			Self::LazyAdd => "register",
			Self::Remove => "remove",
		}
	}
}

/// A pending structural change, seen against the state it would replace.
pub struct HierarchyMutation<'a> {
	pub kind: MutationKind,
	pub name: &'a str,
	/// The entry being added or removed, when it is realized.
	pub entry: Option<&'a Arc<Configuration>>,
	pub(crate) current: &'a Snapshot,
}

impl HierarchyMutation<'_> {
	/// Names currently published, in insertion order.
	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.current.entries.keys().map(|k| &**k)
	}

	/// Currently published entries that are realized. Pending ones are not realized here.
	pub fn realized(&self) -> impl Iterator<Item = &Arc<Configuration>> {
		self.current.realized()
	}
}

/// Veto hook for structural registry changes.
pub trait MutationValidator: Send + Sync {
	/// Returns the rejection reason, if any.
	fn validate(&self, mutation: &HierarchyMutation<'_>) -> Result<(), String>;
}

impl<F> MutationValidator for F
where
	F: Fn(&HierarchyMutation<'_>) -> Result<(), String> + Send + Sync,
{
	fn validate(&self, mutation: &HierarchyMutation<'_>) -> Result<(), String> {
		self(mutation)
	}
}

/// Rejects removing an entry that another realized entry extends from.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtendedParentValidator;

impl MutationValidator for ExtendedParentValidator {
	fn validate(&self, mutation: &HierarchyMutation<'_>) -> Result<(), String> {
		if mutation.kind != MutationKind::Remove {
			return Ok(());
		}
		let Some(removed) = mutation.entry else {
			return Ok(());
		};
		let children: Vec<&str> = mutation
			.realized()
			.filter(|c| c.parents().iter().any(|p| Arc::ptr_eq(p, removed)))
			.map(|c| c.name())
			.collect();
		if children.is_empty() {
			Ok(())
		} else {
			Err(format!("it is extended by {}", children.join(", ")))
		}
	}
}
