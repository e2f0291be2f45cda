use crate::domain::errors::ManufactureError;
use crate::domain::models::{BodyPart, UnitType, ZoneId};

/// Acknowledgement of an accepted manufacture request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManufactureReceipt {
    pub unit_id: String,
    pub unit_type: UnitType,
    pub parts: usize,
}

/// Spawn collaborator turning a request into a new unit.
pub trait Manufacturer {
    fn manufacture(
        &mut self,
        zone: &ZoneId,
        unit_type: UnitType,
        body: Vec<BodyPart>,
    ) -> Result<ManufactureReceipt, ManufactureError>;
}
