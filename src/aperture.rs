//! Hydraulic aperture update and the derived cubic-law quantities.

use crate::attrib_defines::{APERTURE_ATTRIB, APERTURE_CHANGE_ATTRIB};
use crate::grid::GridCollection;
use crate::regions::RegionTable;
use crate::Error;

/// Recomputes every fracture's aperture field as baseline plus the
/// accumulated slip-induced change.
///
/// Must run after slip convergence and before the next flow solve, since the
/// fracture permeability is derived from the current aperture. An aperture at
/// or below zero means the accumulated change has driven the fracture past its
/// physical floor; that is a modeling error and fails rather than being
/// clamped.
pub fn update_apertures(gb: &mut GridCollection, regions: &RegionTable) -> Result<(), Error> {
    for grid in gb.fractures_mut() {
        let node = grid.node_number();
        let baseline = regions.fracture(node)?.baseline_aperture;
        let change = grid.cell_field(APERTURE_CHANGE_ATTRIB)?;
        let mut aperture = Vec::with_capacity(change.len());
        for (cell, &dc) in change.iter().enumerate() {
            let value = baseline + dc;
            if value <= 0.0 {
                return Err(Error::ApertureCollapse { node, cell });
            }
            aperture.push(value);
        }
        grid.set_cell_field(APERTURE_ATTRIB, aperture)?;
    }
    Ok(())
}

/// Cubic-law fracture permeability over viscosity: aperture squared over 12,
/// divided by the fluid viscosity.
pub fn cubic_law_permeability(aperture: f64, viscosity: f64) -> f64 {
    aperture * aperture / 12.0 / viscosity
}

/// Dimension-reduction weight for fracture storage terms: aperture raised to
/// the codimension 3 - dim.
pub fn dimension_weight(aperture: f64, dim: usize) -> f64 {
    aperture.powi(3 - dim as i32)
}
