//! Deprecation reporting.
//!
//! Deprecated paths never fail the operation that triggered them. They are recorded
//! here and logged according to the configured [`WarningMode`].

use std::fmt;

use parking_lot::Mutex;
use rustc_hash::FxHashSet as HashSet;

use crate::config::WarningMode;

/// Tracing target for deprecation warnings.
pub const DEPRECATION_TARGET: &str = "gantry::deprecation";

/// A single deprecation warning.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Deprecation {
	/// What was deprecated, e.g. "Adding a configuration directly to the configuration container."
	pub summary: String,
	/// What to do instead.
	pub advice: Option<String>,
	/// Upgrade guide anchor.
	pub guide_section: Option<&'static str>,
}

impl Deprecation {
	pub fn new(summary: impl Into<String>) -> Self {
		Self {
			summary: summary.into(),
			advice: None,
			guide_section: None,
		}
	}

	pub fn with_advice(mut self, advice: impl Into<String>) -> Self {
		self.advice = Some(advice.into());
		self
	}

	pub fn with_guide_section(mut self, section: &'static str) -> Self {
		self.guide_section = Some(section);
		self
	}
}

impl fmt::Display for Deprecation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} This behavior has been deprecated.", self.summary)?;
		if let Some(advice) = &self.advice {
			write!(f, " {advice}")?;
		}
		if let Some(section) = self.guide_section {
			write!(f, " See the upgrade guide section '{section}'.")?;
		}
		Ok(())
	}
}

#[derive(Default)]
struct State {
	reported: Vec<Deprecation>,
	seen: HashSet<String>,
}

/// Collects deprecation warnings for one registry and its entries.
pub struct Diagnostics {
	mode: WarningMode,
	state: Mutex<State>,
}

impl Diagnostics {
	pub fn new(mode: WarningMode) -> Self {
		Self {
			mode,
			state: Mutex::new(State::default()),
		}
	}

	pub fn mode(&self) -> WarningMode {
		self.mode
	}

	pub fn report(&self, deprecation: Deprecation) {
		let mut state = self.state.lock();
		let first = state.seen.insert(deprecation.summary.clone());

		let log = match self.mode {
			WarningMode::All | WarningMode::Fail => true,
			WarningMode::Summary => first,
			WarningMode::None => false,
		};
		if log {
			tracing::warn!(target: DEPRECATION_TARGET, "{deprecation}");
		}

		state.reported.push(deprecation);
	}

	/// Every warning reported so far, in order.
	pub fn reported(&self) -> Vec<Deprecation> {
		self.state.lock().reported.clone()
	}

	pub fn count(&self) -> usize {
		self.state.lock().reported.len()
	}

	/// True when running in [`WarningMode::Fail`] and at least one warning was reported.
	pub fn has_failures(&self) -> bool {
		self.mode == WarningMode::Fail && self.count() > 0
	}
}

impl Default for Diagnostics {
	fn default() -> Self {
		Self::new(WarningMode::default())
	}
}

impl fmt::Debug for Diagnostics {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Diagnostics")
			.field("mode", &self.mode)
			.field("count", &self.count())
			.finish()
	}
}
