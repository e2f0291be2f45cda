//! Unit bodies and their manufacture cost.

use serde::{Deserialize, Serialize};

use crate::domain::errors::ManufactureError;
use crate::domain::models::unit::UnitType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyPart {
    Move,
    Work,
    Carry,
    Attack,
    RangedAttack,
    Heal,
    Claim,
    Tough,
}

impl BodyPart {
    pub const fn cost(self) -> u32 {
        match self {
            Self::Move | Self::Carry => 50,
            Self::Work => 100,
            Self::Attack => 80,
            Self::RangedAttack => 150,
            Self::Heal => 250,
            Self::Claim => 600,
            Self::Tough => 10,
        }
    }
}

pub fn body_cost(parts: &[BodyPart]) -> u32 {
    parts.iter().map(|p| p.cost()).sum()
}

/// Smallest viable body for a unit type. Repeated to build larger bodies.
pub fn base_body(unit_type: UnitType) -> &'static [BodyPart] {
    use BodyPart::{Attack, Carry, Claim, Heal, Move, RangedAttack, Tough, Work};
    match unit_type {
        UnitType::Bruiser => &[Move, Attack],
        UnitType::Claimer => &[Move, RangedAttack, Move, Claim],
        UnitType::Marksman => &[Move, RangedAttack],
        UnitType::Medic => &[Move, Heal],
        UnitType::Scout => &[Tough, Move, Tough, Move, Tough, Move, Tough, Move, Tough, Move],
        UnitType::Worker => &[Work, Carry, Move],
        UnitType::Demolisher => &[Move, Work],
        UnitType::Tank => &[Tough, Tough, Move],
    }
}

/// Whether the first half of the base body shields the second half.
fn is_layered(unit_type: UnitType) -> bool {
    !matches!(
        unit_type,
        UnitType::Worker | UnitType::Scout | UnitType::Tank | UnitType::Claimer
    )
}

/// Largest body of `unit_type` affordable with `energy`, capped at
/// `max_parts`. Layered types keep all protective parts in front of the
/// valuable ones.
pub fn max_body(
    unit_type: UnitType,
    energy: u64,
    max_parts: usize,
) -> Result<Vec<BodyPart>, ManufactureError> {
    let base = base_body(unit_type);
    let unit_cost = body_cost(base);
    let repetitions = energy / u64::from(unit_cost);
    if repetitions < 1 {
        return Err(ManufactureError::InsufficientResources {
            unit_type,
            needed: unit_cost,
            available: energy,
        });
    }

    let fit = (max_parts / base.len()).max(1);
    let count = usize::try_from(repetitions).unwrap_or(usize::MAX).min(fit);

    if is_layered(unit_type) {
        let (protective, valuable) = base.split_at(base.len() / 2);
        let mut body = Vec::with_capacity(count * base.len());
        for _ in 0..count {
            body.extend_from_slice(protective);
        }
        for _ in 0..count {
            body.extend_from_slice(valuable);
        }
        Ok(body)
    } else {
        Ok(base.repeat(count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_body_repeats_base() {
        let body = max_body(UnitType::Worker, 650, 50).unwrap();
        assert_eq!(body.len(), 9);
        assert_eq!(&body[..3], base_body(UnitType::Worker));
        assert!(body_cost(&body) <= 650);
    }

    #[test]
    fn test_layered_body_puts_protection_first() {
        let body = max_body(UnitType::Bruiser, 390, 50).unwrap();
        assert_eq!(
            body,
            vec![
                BodyPart::Move,
                BodyPart::Move,
                BodyPart::Move,
                BodyPart::Attack,
                BodyPart::Attack,
                BodyPart::Attack
            ]
        );
    }

    #[test]
    fn test_body_capped_at_max_parts() {
        let body = max_body(UnitType::Tank, 1_000_000, 50).unwrap();
        assert_eq!(body.len(), 48);
    }

    #[test]
    fn test_insufficient_energy() {
        let result = max_body(UnitType::Claimer, 300, 50);
        assert!(matches!(
            result,
            Err(ManufactureError::InsufficientResources { needed: 850, .. })
        ));
    }
}
