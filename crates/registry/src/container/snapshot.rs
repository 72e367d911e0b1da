//! Published registry state.
//!
//! # Invariants
//!
//! - A snapshot is never mutated after publication; writers clone, edit and swap.
//! - Iteration order is insertion order (removal preserves the order of the rest).

use std::sync::Arc;

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

use crate::configuration::{Configuration, ConfigurationProvider};

pub(crate) type EntryMap = IndexMap<Box<str>, Arc<ConfigurationProvider>, FxBuildHasher>;

#[derive(Clone, Default)]
pub(crate) struct Snapshot {
	pub(crate) entries: EntryMap,
	pub(crate) sealed: bool,
}

impl Snapshot {
	pub(crate) fn get(&self, name: &str) -> Option<&Arc<ConfigurationProvider>> {
		self.entries.get(name)
	}

	pub(crate) fn with_entry(&self, provider: Arc<ConfigurationProvider>) -> Self {
		let mut next = self.clone();
		next.entries.insert(provider.name().into(), provider);
		next
	}

	pub(crate) fn without(&self, name: &str) -> Self {
		let mut next = self.clone();
		next.entries.shift_remove(name);
		next
	}

	pub(crate) fn sealed(&self) -> Self {
		Self {
			entries: self.entries.clone(),
			sealed: true,
		}
	}

	/// Entries that have been realized, without realizing pending ones.
	pub(crate) fn realized(&self) -> impl Iterator<Item = &Arc<Configuration>> {
		self.entries.values().filter_map(|p| p.get_if_realized())
	}
}
