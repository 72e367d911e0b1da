//! Consumable variant selection.
//!
//! Glue between the registry and the matcher: every consumable entry of a registry is a
//! candidate variant, described by its attributes.

use std::sync::Arc;

use gantry_matcher::{AttributeSet, CandidateMatcher, MatchExplanation};

use crate::configuration::{Configuration, ConfigurationVariant};
use crate::container::ConfigurationRegistry;
use crate::error::RegistryError;
use crate::role::Usage;

/// Why no single variant could be selected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
	#[error("no variant of {container} matches {requested}; candidates: [{}]", .candidates.join(", "))]
	NoMatchingVariant {
		container: String,
		requested: AttributeSet,
		candidates: Vec<String>,
	},

	#[error("cannot choose between the variants of {container} matching {requested}: [{}]", .candidates.join(", "))]
	AmbiguousMatch {
		container: String,
		requested: AttributeSet,
		candidates: Vec<String>,
	},

	#[error(transparent)]
	Usage(#[from] RegistryError),
}

/// Selects the consumable entry of `registry` that best matches `requested`.
pub fn select_consumable_variant(
	registry: &ConfigurationRegistry,
	requested: &AttributeSet,
	explain: &mut dyn MatchExplanation,
) -> Result<Arc<Configuration>, SelectionError> {
	let mut variants = Vec::new();
	registry.visit_consumable(|c| variants.push(ConfigurationVariant::of(Arc::clone(c))));

	let result = CandidateMatcher::new().select(requested, &variants, explain);
	if let Some(selected) = result.single() {
		selected.configuration.check_usage(Usage::Consume)?;
		return Ok(Arc::clone(&selected.configuration));
	}

	let container = registry.display_name().to_owned();
	if result.is_empty() {
		Err(SelectionError::NoMatchingVariant {
			container,
			requested: requested.clone(),
			candidates: variants.iter().map(describe).collect(),
		})
	} else {
		Err(SelectionError::AmbiguousMatch {
			container,
			requested: requested.clone(),
			candidates: result.matches().iter().map(|v| describe(v)).collect(),
		})
	}
}

fn describe(variant: &ConfigurationVariant) -> String {
	format!("{} {}", variant.configuration.name(), variant.attributes)
}
