//! Macroscopic medium properties carried inside the layer.
//!
//! The layer never evaluates material expressions itself; it hands each
//! property field to a [`MediumProvider`] once at construction.

use crate::arrays::BlockField;
use crate::constants::{EPS0, MU0};
use crate::geometry::Geometry;
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediumProperty {
    Permittivity,
    Permeability,
    Conductivity,
}

impl MediumProperty {
    pub const ALL: [MediumProperty; 3] = [
        MediumProperty::Conductivity,
        MediumProperty::Permittivity,
        MediumProperty::Permeability,
    ];
}

/// Fills medium property fields (constant value, parsed expression, ...).
pub trait MediumProvider: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &str;

    /// Initialize `field` (cell-centered, one component) for `property` on
    /// refinement level `level` with geometry `geom`.
    fn initialize(
        &self,
        property: MediumProperty,
        field: &mut BlockField,
        geom: &Geometry,
        level: usize,
    ) -> Result<()>;
}

/// Spatially uniform medium.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantMedium {
    pub permittivity: f64,
    pub permeability: f64,
    pub conductivity: f64,
}

impl Default for ConstantMedium {
    fn default() -> Self {
        Self {
            permittivity: EPS0,
            permeability: MU0,
            conductivity: 0.0,
        }
    }
}

impl MediumProvider for ConstantMedium {
    fn name(&self) -> &str {
        "constant"
    }

    fn initialize(
        &self,
        property: MediumProperty,
        field: &mut BlockField,
        _geom: &Geometry,
        _level: usize,
    ) -> Result<()> {
        let value = match property {
            MediumProperty::Permittivity => self.permittivity,
            MediumProperty::Permeability => self.permeability,
            MediumProperty::Conductivity => self.conductivity,
        };
        field.set_val(value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{BoxArray, IndexBox, SpaceDim};

    #[test]
    fn test_constant_medium_fills_ghosts() {
        let ba = BoxArray::new(vec![IndexBox::new_2d([0, 0], [3, 3])]);
        let geom = Geometry::new(IndexBox::new_2d([0, 0], [3, 3]), [1.0; 3], SpaceDim::Two);
        let mut f = BlockField::new(ba, 1, [1, 1, 0]);
        let medium = ConstantMedium {
            conductivity: 0.5,
            ..Default::default()
        };
        medium
            .initialize(MediumProperty::Conductivity, &mut f, &geom, 0)
            .unwrap();
        assert_eq!(f.blocks()[0].get([-1, -1, 0], 0), 0.5);
        medium
            .initialize(MediumProperty::Permittivity, &mut f, &geom, 0)
            .unwrap();
        assert_eq!(f.value_at([2, 2, 0], 0), Some(EPS0));
    }
}
