//! Observers for candidate matching decisions.
//!
//! The matcher reports every decision it makes to a [`MatchExplanation`] sink. Sinks
//! never influence the outcome; they only describe it. Three sinks ship with the crate:
//!
//! | Sink | Use |
//! |------|-----|
//! | [`NoExplanation`] | Quiet mode. Disabled, so the matcher skips building report arguments. |
//! | [`TracingExplanation`] | Debug mode. Emits `tracing` events on the `gantry::matching` target. |
//! | [`RecordingExplanation`] | Collects [`ExplanationEvent`]s for diagnostics and tests. |

use crate::attribute::{AttributeKey, AttributeValue};
use crate::set::AttributeSet;

/// Tracing target used by [`TracingExplanation`].
pub const MATCHING_TARGET: &str = "gantry::matching";

/// Receives the decisions made by [`crate::CandidateMatcher`].
pub trait MatchExplanation {
	/// Returns false when the sink discards everything it is told.
	fn is_enabled(&self) -> bool {
		true
	}

	/// No candidates were offered for `requested`.
	fn no_candidates(&mut self, requested: &AttributeSet);

	/// `candidate` is the only candidate compatible with `requested`.
	fn single_match(&mut self, candidate: &AttributeSet, candidates: &[&AttributeSet], requested: &AttributeSet);

	/// `candidate` failed at least one requested attribute.
	fn candidate_rejected_by_attributes(&mut self, candidate: &AttributeSet, requested: &AttributeSet);

	/// `candidate` does not carry the requested `attribute`.
	fn candidate_missing_attribute(&mut self, candidate: &AttributeSet, attribute: &AttributeKey, requested_value: &AttributeValue);

	/// `candidate` carries `attribute` with a value different from the requested one.
	fn candidate_attribute_mismatch(
		&mut self,
		candidate: &AttributeSet,
		attribute: &AttributeKey,
		requested_value: &AttributeValue,
		candidate_value: &AttributeValue,
	);

	/// `candidate` won disambiguation because its attributes strictly contain those of the others.
	fn candidate_is_superset_of_others(&mut self, candidate: &AttributeSet);
}

/// Sink that ignores every report.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExplanation;

impl MatchExplanation for NoExplanation {
	fn is_enabled(&self) -> bool {
		false
	}

	fn no_candidates(&mut self, _requested: &AttributeSet) {}

	fn single_match(&mut self, _candidate: &AttributeSet, _candidates: &[&AttributeSet], _requested: &AttributeSet) {}

	fn candidate_rejected_by_attributes(&mut self, _candidate: &AttributeSet, _requested: &AttributeSet) {}

	fn candidate_missing_attribute(&mut self, _candidate: &AttributeSet, _attribute: &AttributeKey, _requested_value: &AttributeValue) {}

	fn candidate_attribute_mismatch(
		&mut self,
		_candidate: &AttributeSet,
		_attribute: &AttributeKey,
		_requested_value: &AttributeValue,
		_candidate_value: &AttributeValue,
	) {
	}

	fn candidate_is_superset_of_others(&mut self, _candidate: &AttributeSet) {}
}

/// Sink that logs each decision at `DEBUG` level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingExplanation;

impl MatchExplanation for TracingExplanation {
	fn no_candidates(&mut self, requested: &AttributeSet) {
		tracing::debug!(target: MATCHING_TARGET, %requested, "no candidates, selecting nothing");
	}

	fn single_match(&mut self, candidate: &AttributeSet, candidates: &[&AttributeSet], requested: &AttributeSet) {
		tracing::debug!(
			target: MATCHING_TARGET,
			%candidate,
			?candidates,
			%requested,
			"selected single match"
		);
	}

	fn candidate_rejected_by_attributes(&mut self, candidate: &AttributeSet, requested: &AttributeSet) {
		tracing::debug!(target: MATCHING_TARGET, %candidate, %requested, "candidate does not match attributes");
	}

	fn candidate_missing_attribute(&mut self, candidate: &AttributeSet, attribute: &AttributeKey, requested_value: &AttributeValue) {
		tracing::debug!(
			target: MATCHING_TARGET,
			%candidate,
			%attribute,
			%requested_value,
			"candidate is missing attribute"
		);
	}

	fn candidate_attribute_mismatch(
		&mut self,
		candidate: &AttributeSet,
		attribute: &AttributeKey,
		requested_value: &AttributeValue,
		candidate_value: &AttributeValue,
	) {
		tracing::debug!(
			target: MATCHING_TARGET,
			%candidate,
			%attribute,
			%requested_value,
			%candidate_value,
			"candidate attribute value does not match requested value"
		);
	}

	fn candidate_is_superset_of_others(&mut self, candidate: &AttributeSet) {
		tracing::debug!(
			target: MATCHING_TARGET,
			%candidate,
			"candidate selected because its attributes are a superset of the other candidates"
		);
	}
}

/// Returns the tracing sink when debug output is enabled for matching, otherwise the no-op sink.
pub fn explanation_for_level() -> Box<dyn MatchExplanation + Send> {
	if tracing::enabled!(target: MATCHING_TARGET, tracing::Level::DEBUG) {
		Box::new(TracingExplanation)
	} else {
		Box::new(NoExplanation)
	}
}

/// One decision reported to a [`RecordingExplanation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExplanationEvent {
	NoCandidates {
		requested: AttributeSet,
	},
	SingleMatch {
		candidate: AttributeSet,
		candidates: Vec<AttributeSet>,
		requested: AttributeSet,
	},
	RejectedByAttributes {
		candidate: AttributeSet,
		requested: AttributeSet,
	},
	MissingAttribute {
		candidate: AttributeSet,
		attribute: AttributeKey,
		requested_value: AttributeValue,
	},
	AttributeMismatch {
		candidate: AttributeSet,
		attribute: AttributeKey,
		requested_value: AttributeValue,
		candidate_value: AttributeValue,
	},
	SupersetOfOthers {
		candidate: AttributeSet,
	},
}

impl std::fmt::Display for ExplanationEvent {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::NoCandidates { requested } => write!(f, "no candidates for {requested}"),
			Self::SingleMatch { candidate, requested, .. } => {
				write!(f, "selected {candidate} as the only match for {requested}")
			}
			Self::RejectedByAttributes { candidate, requested } => {
				write!(f, "candidate {candidate} does not match {requested}")
			}
			Self::MissingAttribute { candidate, attribute, .. } => {
				write!(f, "candidate {candidate} is missing attribute '{}'", attribute.name())
			}
			Self::AttributeMismatch {
				candidate,
				attribute,
				requested_value,
				candidate_value,
			} => write!(
				f,
				"candidate {candidate} has {}={candidate_value}, requested {requested_value}",
				attribute.name()
			),
			Self::SupersetOfOthers { candidate } => {
				write!(f, "selected {candidate} as a superset of the other candidates")
			}
		}
	}
}

/// Sink that keeps every decision in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordingExplanation {
	events: Vec<ExplanationEvent>,
}

impl RecordingExplanation {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn events(&self) -> &[ExplanationEvent] {
		&self.events
	}

	pub fn into_events(self) -> Vec<ExplanationEvent> {
		self.events
	}
}

impl MatchExplanation for RecordingExplanation {
	fn no_candidates(&mut self, requested: &AttributeSet) {
		self.events.push(ExplanationEvent::NoCandidates {
			requested: requested.clone(),
		});
	}

	fn single_match(&mut self, candidate: &AttributeSet, candidates: &[&AttributeSet], requested: &AttributeSet) {
		self.events.push(ExplanationEvent::SingleMatch {
			candidate: candidate.clone(),
			candidates: candidates.iter().map(|c| (*c).clone()).collect(),
			requested: requested.clone(),
		});
	}

	fn candidate_rejected_by_attributes(&mut self, candidate: &AttributeSet, requested: &AttributeSet) {
		self.events.push(ExplanationEvent::RejectedByAttributes {
			candidate: candidate.clone(),
			requested: requested.clone(),
		});
	}

	fn candidate_missing_attribute(&mut self, candidate: &AttributeSet, attribute: &AttributeKey, requested_value: &AttributeValue) {
		self.events.push(ExplanationEvent::MissingAttribute {
			candidate: candidate.clone(),
			attribute: attribute.clone(),
			requested_value: requested_value.clone(),
		});
	}

	fn candidate_attribute_mismatch(
		&mut self,
		candidate: &AttributeSet,
		attribute: &AttributeKey,
		requested_value: &AttributeValue,
		candidate_value: &AttributeValue,
	) {
		self.events.push(ExplanationEvent::AttributeMismatch {
			candidate: candidate.clone(),
			attribute: attribute.clone(),
			requested_value: requested_value.clone(),
			candidate_value: candidate_value.clone(),
		});
	}

	fn candidate_is_superset_of_others(&mut self, candidate: &AttributeSet) {
		self.events.push(ExplanationEvent::SupersetOfOthers {
			candidate: candidate.clone(),
		});
	}
}
