//! Attribute-based variant matching.
//!
//! Variants of a component are described by [`AttributeSet`]s: immutable, typed
//! name/value maps. Given the attributes a consumer requests, the [`CandidateMatcher`]
//! narrows a list of candidates down to the compatible ones and, when several remain,
//! prefers the one whose attributes strictly contain those of the others. Every decision
//! is reported to a [`MatchExplanation`] sink so that a selection, or the lack of one,
//! can be explained afterwards.
//!
//! ```
//! use gantry_matcher::{AttributeSet, Candidate, CandidateMatcher, NoExplanation};
//!
//! let jar = AttributeSet::builder().value("type", "jar").build();
//! let sources = jar.with("variant", "sources");
//! let candidates = [Candidate::new(jar.clone(), "main"), Candidate::new(sources, "sources")];
//!
//! let result = CandidateMatcher::new().select(&jar, &candidates, &mut NoExplanation);
//! assert_eq!(result.single().map(|c| c.payload), Some("sources"));
//! ```

mod attribute;
mod engine;
mod explain;
mod matcher;
mod set;

pub use attribute::{Attribute, AttributeKey, AttributeType, AttributeValue, FromAttributeValue};
pub use explain::{
	ExplanationEvent, MATCHING_TARGET, MatchExplanation, NoExplanation, RecordingExplanation, TracingExplanation,
	explanation_for_level,
};
pub use matcher::{Candidate, CandidateMatcher, HasAttributes, MatchResult};
pub use set::{AttributeSet, AttributeSetBuilder};
