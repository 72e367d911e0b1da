//! Attribute-based candidate selection.

use crate::engine::{CandidateFilter, dominant_index};
use crate::explain::MatchExplanation;
use crate::set::AttributeSet;

/// Anything that exposes an [`AttributeSet`] can compete in matching.
pub trait HasAttributes {
	fn attributes(&self) -> &AttributeSet;
}

impl HasAttributes for AttributeSet {
	fn attributes(&self) -> &AttributeSet {
		self
	}
}

impl<T: HasAttributes + ?Sized> HasAttributes for &T {
	fn attributes(&self) -> &AttributeSet {
		(**self).attributes()
	}
}

/// A variant offered to the matcher: its attributes plus an opaque payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate<T> {
	pub attributes: AttributeSet,
	pub payload: T,
}

impl<T> Candidate<T> {
	pub fn new(attributes: AttributeSet, payload: T) -> Self {
		Self { attributes, payload }
	}
}

impl<T> HasAttributes for Candidate<T> {
	fn attributes(&self) -> &AttributeSet {
		&self.attributes
	}
}

/// Outcome of a matching call.
///
/// Zero matches means nothing is compatible; more than one means the request is
/// ambiguous. The matcher never breaks a tie arbitrarily, so callers decide how an
/// ambiguity is reported.
#[derive(Debug)]
pub struct MatchResult<'a, C> {
	matches: Vec<&'a C>,
}

impl<'a, C> MatchResult<'a, C> {
	/// Selected candidates in input order.
	pub fn matches(&self) -> &[&'a C] {
		&self.matches
	}

	/// Returns the winner when exactly one candidate was selected.
	pub fn single(&self) -> Option<&'a C> {
		match self.matches.as_slice() {
			[only] => Some(*only),
			_ => None,
		}
	}

	pub fn is_empty(&self) -> bool {
		self.matches.is_empty()
	}

	pub fn is_ambiguous(&self) -> bool {
		self.matches.len() > 1
	}

	pub fn len(&self) -> usize {
		self.matches.len()
	}

	pub fn into_vec(self) -> Vec<&'a C> {
		self.matches
	}
}

/// Stateless selector of the best candidates for a requested attribute set.
///
/// # Algorithm
///
/// 1. No candidates: report [`MatchExplanation::no_candidates`] and return nothing.
/// 2. Filter: a candidate survives iff it carries every requested attribute with the
///    requested value. Extra attributes on the candidate are not penalized.
/// 3. One survivor: report [`MatchExplanation::single_match`] and return it.
/// 4. Several survivors: if exactly one survivor is strictly contained by no other and
///    strictly contains at least one other, report
///    [`MatchExplanation::candidate_is_superset_of_others`] and return it.
/// 5. Otherwise return every survivor (ambiguous).
///
/// Candidates are always visited in input order, so identical input yields identical
/// output and an identical explanation sequence.
#[derive(Debug, Clone, Copy, Default)]
pub struct CandidateMatcher;

impl CandidateMatcher {
	pub fn new() -> Self {
		Self
	}

	pub fn select<'a, C: HasAttributes>(
		&self,
		requested: &AttributeSet,
		candidates: &'a [C],
		explain: &mut dyn MatchExplanation,
	) -> MatchResult<'a, C> {
		if candidates.is_empty() {
			explain.no_candidates(requested);
			return MatchResult { matches: Vec::new() };
		}

		let filter = CandidateFilter::new(requested);
		let survivors: Vec<&'a C> = candidates
			.iter()
			.filter(|candidate| filter.allows(candidate.attributes(), explain))
			.collect();

		match survivors.len() {
			0 => MatchResult { matches: survivors },
			1 => {
				if explain.is_enabled() {
					let all: Vec<&AttributeSet> = candidates.iter().map(|c| c.attributes()).collect();
					explain.single_match(survivors[0].attributes(), &all, requested);
				}
				MatchResult { matches: survivors }
			}
			_ => {
				let sets: Vec<&AttributeSet> = survivors.iter().map(|c| c.attributes()).collect();
				let Some(idx) = dominant_index(&sets) else {
					return MatchResult { matches: survivors };
				};
				explain.candidate_is_superset_of_others(sets[idx]);
				MatchResult {
					matches: vec![survivors[idx]],
				}
			}
		}
	}
}
