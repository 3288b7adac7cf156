use serde::{Deserialize, Serialize};

use crate::grid::GridCollection;
use crate::input::EllipticFracture;
use crate::Error;

/// Axis-aligned domain bounds. Measured in m.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl Default for BoundingBox {
    fn default() -> Self {
        BoundingBox {
            min: [-5000.0; 3],
            max: [10_000.0; 3],
        }
    }
}

/// Target mesh element sizes handed to the geometry provider. Measured in m.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeshSizes {
    /// Near the domain boundary.
    pub bound: f64,
    /// Near fractures.
    pub frac: f64,
    /// Global lower bound.
    pub min: f64,
}

impl Default for MeshSizes {
    fn default() -> Self {
        MeshSizes {
            bound: 10_000.0,
            frac: 500.0,
            min: 200.0,
        }
    }
}

/// External mesh generator.
///
/// The only contract is that the returned collection is consistent: stable
/// node numbers, and a face-cell incidence relation for every fracture grid
/// that never changes after construction.
pub trait GeometryProvider {
    fn build_grids(
        &self,
        fractures: &[EllipticFracture],
        domain: &BoundingBox,
        sizes: &MeshSizes,
    ) -> Result<GridCollection, Error>;
}
