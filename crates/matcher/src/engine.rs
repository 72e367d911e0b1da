use crate::explain::MatchExplanation;
use crate::set::AttributeSet;

/// Compatibility check of a single candidate against the requested attributes.
pub(crate) struct CandidateFilter<'r> {
	requested: &'r AttributeSet,
}

impl<'r> CandidateFilter<'r> {
	pub fn new(requested: &'r AttributeSet) -> Self {
		Self { requested }
	}

	/// Returns true when `candidate` carries every requested attribute with the requested value.
	///
	/// Every requested attribute is checked, even after the first failure, so that the
	/// explanation lists all reasons for a rejection.
	pub fn allows(&self, candidate: &AttributeSet, explain: &mut dyn MatchExplanation) -> bool {
		let mut compatible = true;

		for (key, requested_value) in self.requested.iter() {
			match candidate.find_by_name(key.name()) {
				None => {
					explain.candidate_missing_attribute(candidate, key, requested_value);
					compatible = false;
				}
				// Values of different declared types never compare equal.
				Some((_, candidate_value)) if candidate_value != requested_value => {
					explain.candidate_attribute_mismatch(candidate, key, requested_value, candidate_value);
					compatible = false;
				}
				Some(_) => {}
			}
		}

		if !compatible {
			explain.candidate_rejected_by_attributes(candidate, self.requested);
		}
		compatible
	}
}

/// Picks the single survivor that no other survivor strictly contains and that strictly
/// contains at least one other survivor.
///
/// Returns `None` when there is no such survivor or when more than one qualifies.
pub(crate) fn dominant_index(survivors: &[&AttributeSet]) -> Option<usize> {
	let mut winner = None;

	for (i, &candidate) in survivors.iter().enumerate() {
		let mut dominated = false;
		let mut dominates = false;
		for (j, &other) in survivors.iter().enumerate() {
			if i == j {
				continue;
			}
			dominated |= other.is_strict_superset_of(candidate);
			dominates |= candidate.is_strict_superset_of(other);
		}

		if dominated || !dominates {
			continue;
		}
		if winner.replace(i).is_some() {
			return None;
		}
	}

	winner
}
