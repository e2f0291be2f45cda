//! Squad specifications gating aggressive expansion.

use serde::{Deserialize, Serialize};

use crate::domain::models::priority::ExpansionKind;
use crate::domain::models::unit::{UnitCensus, UnitType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SquadMember {
    pub unit_type: UnitType,
    pub minimum: usize,
}

/// Ordered minimum head counts that must be present before a squad acts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SquadSpecification {
    members: Vec<SquadMember>,
}

impl SquadSpecification {
    pub fn new(members: Vec<SquadMember>) -> Self {
        Self { members }
    }

    fn from_pairs(pairs: &[(UnitType, usize)]) -> Self {
        Self::new(
            pairs
                .iter()
                .map(|&(unit_type, minimum)| SquadMember { unit_type, minimum })
                .collect(),
        )
    }

    /// Raiding squad. No demolishers: knocked-down walls leave energy the
    /// defender reuses between raids.
    pub fn harassment() -> Self {
        Self::from_pairs(&[
            (UnitType::Medic, 4),
            (UnitType::Tank, 1),
            (UnitType::Bruiser, 1),
            (UnitType::Marksman, 1),
        ])
    }

    pub fn obliteration() -> Self {
        Self::from_pairs(&[
            (UnitType::Medic, 4),
            (UnitType::Tank, 1),
            (UnitType::Demolisher, 1),
            (UnitType::Marksman, 1),
        ])
    }

    /// Squad required for an expansion kind; settling needs none.
    pub fn for_expansion(kind: ExpansionKind) -> Option<Self> {
        match kind {
            ExpansionKind::Settling => None,
            ExpansionKind::Harassment => Some(Self::harassment()),
            ExpansionKind::Obliteration => Some(Self::obliteration()),
        }
    }

    pub fn members(&self) -> &[SquadMember] {
        &self.members
    }

    /// First member, in specification order, whose minimum is unmet.
    pub fn first_shortfall(&self, census: &UnitCensus) -> Option<UnitType> {
        self.members
            .iter()
            .find(|member| census.count(member.unit_type) < member.minimum)
            .map(|member| member.unit_type)
    }

    pub fn is_assembled(&self, census: &UnitCensus) -> bool {
        self.first_shortfall(census).is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::unit::Unit;

    fn census(types: &[(UnitType, usize)]) -> UnitCensus {
        let units: Vec<Unit> = types
            .iter()
            .flat_map(|&(t, n)| (0..n).map(move |i| Unit::new(format!("{t}-{i}"), t)))
            .collect();
        UnitCensus::from_units(&units)
    }

    #[test]
    fn test_obliteration_assembled() {
        let spec = SquadSpecification::obliteration();
        let full = census(&[
            (UnitType::Medic, 4),
            (UnitType::Tank, 1),
            (UnitType::Demolisher, 1),
            (UnitType::Marksman, 1),
        ]);
        assert!(spec.is_assembled(&full));
    }

    #[test]
    fn test_shortfall_in_specification_order() {
        let spec = SquadSpecification::obliteration();
        let partial = census(&[(UnitType::Medic, 3), (UnitType::Marksman, 1)]);
        assert_eq!(spec.first_shortfall(&partial), Some(UnitType::Medic));

        let medics_done = census(&[(UnitType::Medic, 4)]);
        assert_eq!(spec.first_shortfall(&medics_done), Some(UnitType::Tank));
    }

    #[test]
    fn test_settling_has_no_squad() {
        assert!(SquadSpecification::for_expansion(ExpansionKind::Settling).is_none());
        assert!(SquadSpecification::for_expansion(ExpansionKind::Harassment).is_some());
    }
}
