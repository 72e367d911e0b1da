//! Typed attribute keys and values.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// The value of an attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(untagged))]
pub enum AttributeValue {
	Bool(bool),
	Int(i64),
	String(Arc<str>),
}

impl AttributeValue {
	/// The declared type a key needs to hold this value.
	pub fn value_type(&self) -> AttributeType {
		match self {
			Self::Bool(_) => AttributeType::Bool,
			Self::Int(_) => AttributeType::Int,
			Self::String(_) => AttributeType::String,
		}
	}
}

impl fmt::Display for AttributeValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Bool(b) => write!(f, "{b}"),
			Self::Int(n) => write!(f, "{n}"),
			Self::String(s) => f.write_str(s),
		}
	}
}

impl From<&str> for AttributeValue {
	fn from(s: &str) -> Self {
		Self::String(s.into())
	}
}

/// Ties a Rust scalar to one [`AttributeValue`] variant, in both directions.
macro_rules! scalar_attribute {
	($ty:ty, $variant:ident, |$v:ident| $extract:expr) => {
		impl From<$ty> for AttributeValue {
			fn from($v: $ty) -> Self {
				Self::$variant($v.into())
			}
		}

		impl FromAttributeValue for $ty {
			const TYPE: AttributeType = AttributeType::$variant;

			fn from_attribute(value: &AttributeValue) -> Option<Self> {
				match value {
					AttributeValue::$variant($v) => Some($extract),
					_ => None,
				}
			}
		}
	};
}

scalar_attribute!(bool, Bool, |b| *b);
scalar_attribute!(i64, Int, |n| *n);
scalar_attribute!(String, String, |s| s.to_string());

/// The declared type of an attribute's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttributeType {
	Bool,
	Int,
	String,
}

impl AttributeType {
	pub const fn name(self) -> &'static str {
		match self {
			Self::Bool => "bool",
			Self::Int => "int",
			Self::String => "string",
		}
	}
}

impl fmt::Display for AttributeType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

/// Untyped attribute identity: a name plus its declared value type.
///
/// Two keys are the same attribute only when both the name and the type agree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttributeKey {
	name: Arc<str>,
	ty: AttributeType,
}

impl AttributeKey {
	pub fn new(name: impl Into<Arc<str>>, ty: AttributeType) -> Self {
		Self { name: name.into(), ty }
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn value_type(&self) -> AttributeType {
		self.ty
	}
}

impl fmt::Display for AttributeKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}({})", self.name, self.ty)
	}
}

/// Conversion from [`AttributeValue`] to a concrete Rust type.
pub trait FromAttributeValue: Sized + Into<AttributeValue> {
	/// The attribute type this Rust type maps to.
	const TYPE: AttributeType;

	/// Extracts a value of this type, or `None` on a type mismatch.
	fn from_attribute(value: &AttributeValue) -> Option<Self>;
}

/// Typed handle to an attribute with compile-time value type information.
///
/// ```
/// use gantry_matcher::{Attribute, AttributeSet};
///
/// let usage = Attribute::<String>::of("usage");
/// let set = AttributeSet::builder().attribute(&usage, "java-api".to_string()).build();
/// assert_eq!(set.get_typed(&usage).as_deref(), Some("java-api"));
/// ```
pub struct Attribute<T: FromAttributeValue> {
	key: AttributeKey,
	_marker: PhantomData<fn() -> T>,
}

impl<T: FromAttributeValue> Attribute<T> {
	/// Declares an attribute with the given name.
	pub fn of(name: impl Into<Arc<str>>) -> Self {
		Self {
			key: AttributeKey::new(name, T::TYPE),
			_marker: PhantomData,
		}
	}

	pub fn name(&self) -> &str {
		self.key.name()
	}

	/// Returns the untyped key for use with [`crate::AttributeSet::get`].
	pub fn key(&self) -> &AttributeKey {
		&self.key
	}
}

impl<T: FromAttributeValue> Clone for Attribute<T> {
	fn clone(&self) -> Self {
		Self {
			key: self.key.clone(),
			_marker: PhantomData,
		}
	}
}

impl<T: FromAttributeValue> fmt::Debug for Attribute<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Attribute").field(&self.key).finish()
	}
}
