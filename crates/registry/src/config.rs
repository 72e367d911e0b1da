//! Registry settings.
//!
//! Settings are format-neutral structs with serde defaults; [`RegistrySettings::from_toml_str`]
//! reads them from a TOML document such as:
//!
//! ```toml
//! owner = "project ':app'"
//! warning-mode = "all"
//! explain = "verbose"
//! ```

use gantry_matcher::{MatchExplanation, NoExplanation, TracingExplanation, explanation_for_level};
use serde::Deserialize;

/// How deprecation warnings are surfaced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WarningMode {
	/// Log every occurrence.
	All,
	/// Log the first occurrence of each distinct warning.
	#[default]
	Summary,
	/// Record without logging.
	None,
	/// Log every occurrence and flag the run as failed.
	Fail,
}

/// Which [`MatchExplanation`] sink drives variant selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExplainMode {
	/// Tracing sink when `DEBUG` is enabled for matching, otherwise the no-op sink.
	#[default]
	Auto,
	/// Always the no-op sink.
	Quiet,
	/// Always the tracing sink.
	Verbose,
}

impl ExplainMode {
	pub fn sink(self) -> Box<dyn MatchExplanation + Send> {
		match self {
			Self::Auto => explanation_for_level(),
			Self::Quiet => Box::new(NoExplanation),
			Self::Verbose => Box::new(TracingExplanation),
		}
	}
}

/// Settings for a [`crate::ConfigurationRegistry`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct RegistrySettings {
	/// Display name of the owning scope, e.g. `project ':app'`.
	pub owner: String,
	pub warning_mode: WarningMode,
	pub explain: ExplainMode,
}

impl Default for RegistrySettings {
	fn default() -> Self {
		Self {
			owner: "root project".to_string(),
			warning_mode: WarningMode::default(),
			explain: ExplainMode::default(),
		}
	}
}

impl RegistrySettings {
	pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
		toml::from_str(content).map_err(|e| ConfigError::Toml(e.to_string()))
	}
}

/// Settings parse errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
	#[error("TOML parse error: {0}")]
	Toml(String),
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn empty_document_yields_defaults() {
		assert_eq!(RegistrySettings::from_toml_str("").unwrap(), RegistrySettings::default());
	}

	#[test]
	fn parses_all_fields() {
		let settings = RegistrySettings::from_toml_str(
			r#"
			owner = "project ':lib'"
			warning-mode = "fail"
			explain = "verbose"
			"#,
		)
		.unwrap();

		assert_eq!(settings.owner, "project ':lib'");
		assert_eq!(settings.warning_mode, WarningMode::Fail);
		assert_eq!(settings.explain, ExplainMode::Verbose);
	}

	#[test]
	fn rejects_unknown_fields_and_values() {
		assert!(RegistrySettings::from_toml_str("colour = true").is_err());
		assert!(RegistrySettings::from_toml_str("warning-mode = \"loud\"").is_err());
	}

	#[test]
	fn quiet_sink_is_disabled() {
		assert!(!ExplainMode::Quiet.sink().is_enabled());
		assert!(ExplainMode::Verbose.sink().is_enabled());
	}
}
