//! Hard constraints (experience ceiling, location set) → vector store predicate.

use crate::locations::LocationSelection;
use crate::vector_store::ChunkFilter;

/// Eligibility constraints derived once per request.
#[derive(Debug, Clone, PartialEq)]
pub struct HardConstraint {
    pub max_experience: u32,
    pub locations: LocationSelection,
}

impl HardConstraint {
    /// `experience ≤ ceiling`, conjoined with `location ∈ selection` unless the
    /// selection is "all". A lone clause is emitted without an `And` wrapper.
    /// An empty selection yields a predicate that matches nothing.
    pub fn to_filter(&self) -> ChunkFilter {
        let experience = ChunkFilter::ExperienceAtMost(self.max_experience);
        match &self.locations {
            LocationSelection::All => experience,
            LocationSelection::Only(labels) => {
                ChunkFilter::And(vec![experience, ChunkFilter::LocationIn(labels.clone())])
            }
        }
    }
}
