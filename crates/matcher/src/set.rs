//! Immutable attribute sets.

use std::fmt;
use std::sync::Arc;

use crate::attribute::{Attribute, AttributeKey, AttributeValue, FromAttributeValue};

/// Immutable mapping from [`AttributeKey`] to [`AttributeValue`].
///
/// Entries are kept sorted by attribute name, so equality, hashing, iteration and
/// [`Display`](fmt::Display) output are independent of insertion order. Cloning only
/// bumps a reference count, which makes sets cheap to share across threads and caches.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
	feature = "serde",
	derive(serde::Serialize, serde::Deserialize),
	serde(
		into = "std::collections::BTreeMap<String, AttributeValue>",
		from = "std::collections::BTreeMap<String, AttributeValue>"
	)
)]
pub struct AttributeSet {
	entries: Arc<[(AttributeKey, AttributeValue)]>,
}

impl AttributeSet {
	/// Returns the empty set.
	pub fn empty() -> Self {
		Self::default()
	}

	pub fn builder() -> AttributeSetBuilder {
		AttributeSetBuilder::default()
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Iterates entries in attribute-name order.
	pub fn iter(&self) -> impl Iterator<Item = (&AttributeKey, &AttributeValue)> {
		self.entries.iter().map(|(k, v)| (k, v))
	}

	pub fn keys(&self) -> impl Iterator<Item = &AttributeKey> {
		self.entries.iter().map(|(k, _)| k)
	}

	/// Looks up the value stored for `key`.
	///
	/// A value stored under the same name but a different declared type is not a match.
	pub fn get(&self, key: &AttributeKey) -> Option<&AttributeValue> {
		let (stored, value) = self.find_by_name(key.name())?;
		(stored == key).then_some(value)
	}

	/// Looks up the entry stored under `name`, regardless of its type.
	pub fn find_by_name(&self, name: &str) -> Option<(&AttributeKey, &AttributeValue)> {
		let idx = self
			.entries
			.binary_search_by(|(k, _)| k.name().cmp(name))
			.ok()?;
		let (k, v) = &self.entries[idx];
		Some((k, v))
	}

	pub fn get_typed<T: FromAttributeValue>(&self, attribute: &Attribute<T>) -> Option<T> {
		self.get(attribute.key()).and_then(T::from_attribute)
	}

	pub fn contains(&self, key: &AttributeKey) -> bool {
		self.get(key).is_some()
	}

	/// Returns true iff every entry of `other` is present in `self` with an equal value.
	pub fn is_superset_of(&self, other: &AttributeSet) -> bool {
		if other.len() > self.len() {
			return false;
		}
		other.iter().all(|(key, value)| self.get(key) == Some(value))
	}

	/// Returns true iff `self` is a superset of `other` and carries at least one more key.
	pub fn is_strict_superset_of(&self, other: &AttributeSet) -> bool {
		self.len() > other.len() && self.is_superset_of(other)
	}

	/// Returns a new set with `value` stored under `name`, replacing any previous entry.
	pub fn with(&self, name: impl Into<Arc<str>>, value: impl Into<AttributeValue>) -> Self {
		let mut builder = AttributeSetBuilder {
			entries: self.entries.to_vec(),
		};
		builder.insert_value(name, value.into());
		builder.build()
	}
}

impl fmt::Display for AttributeSet {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("{")?;
		for (i, (key, value)) in self.iter().enumerate() {
			if i > 0 {
				f.write_str(", ")?;
			}
			write!(f, "{}={}", key.name(), value)?;
		}
		f.write_str("}")
	}
}

impl fmt::Debug for AttributeSet {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "AttributeSet{self}")
	}
}

impl<N, V> FromIterator<(N, V)> for AttributeSet
where
	N: Into<Arc<str>>,
	V: Into<AttributeValue>,
{
	fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
		let mut builder = AttributeSet::builder();
		for (name, value) in iter {
			builder.insert_value(name, value.into());
		}
		builder.build()
	}
}

#[cfg(feature = "serde")]
impl From<AttributeSet> for std::collections::BTreeMap<String, AttributeValue> {
	fn from(set: AttributeSet) -> Self {
		set.iter()
			.map(|(k, v)| (k.name().to_owned(), v.clone()))
			.collect()
	}
}

#[cfg(feature = "serde")]
impl From<std::collections::BTreeMap<String, AttributeValue>> for AttributeSet {
	fn from(map: std::collections::BTreeMap<String, AttributeValue>) -> Self {
		map.into_iter().collect()
	}
}

/// Accumulates entries for an [`AttributeSet`].
///
/// Later writes to the same attribute name replace earlier ones.
#[derive(Debug, Default, Clone)]
pub struct AttributeSetBuilder {
	entries: Vec<(AttributeKey, AttributeValue)>,
}

impl AttributeSetBuilder {
	/// Stores a typed attribute value.
	pub fn attribute<T: FromAttributeValue>(mut self, attribute: &Attribute<T>, value: T) -> Self {
		self.insert(attribute.key().clone(), value.into());
		self
	}

	/// Stores a value under `name`; the declared type follows the value.
	pub fn value(mut self, name: impl Into<Arc<str>>, value: impl Into<AttributeValue>) -> Self {
		self.insert_value(name, value.into());
		self
	}

	fn insert_value(&mut self, name: impl Into<Arc<str>>, value: AttributeValue) {
		let key = AttributeKey::new(name, value.value_type());
		self.insert(key, value);
	}

	fn insert(&mut self, key: AttributeKey, value: AttributeValue) {
		match self.entries.iter_mut().find(|(k, _)| k.name() == key.name()) {
			Some(slot) => *slot = (key, value),
			None => self.entries.push((key, value)),
		}
	}

	pub fn build(mut self) -> AttributeSet {
		self.entries.sort_by(|(a, _), (b, _)| a.name().cmp(b.name()));
		AttributeSet {
			entries: Arc::from(self.entries),
		}
	}
}
