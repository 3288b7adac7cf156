//! Physical parameter assignment, dispatched by grid identity.
//!
//! Each grid in the collection is assigned a tagged region: the matrix grid
//! carries flow and rock-mechanical properties, fracture grids carry flow
//! properties only, and one designated fracture additionally carries the
//! injection source. The dispatch happens once after grid creation; during
//! stepping the only mutable quantity is the aperture (through the aperture
//! updater) and the only time-dependent one is the injection source.

use ahash::AHashMap;
use na::{Matrix3, Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::aperture::{cubic_law_permeability, dimension_weight};
use crate::attrib_defines::APERTURE_ATTRIB;
use crate::grid::{Grid, GridCollection};
use crate::Error;

/// One darcy in square meters.
pub const DARCY: f64 = 9.869233e-13;

/// Tolerance added to the injection cutoff so a step landing exactly on the
/// cutoff still injects.
const CUTOFF_TOL: f64 = 1e-6;

/// Rock stiffness moduli. Measured in Pa.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rock {
    /// Shear modulus (second Lame parameter).
    pub mu: f64,
    /// First Lame parameter.
    pub lambda: f64,
}

/// Fluid injection into a single designated fracture.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InjectionParams {
    /// Node number of the fracture grid receiving the injection.
    pub node: usize,
    /// The source is placed in the cell nearest this point. Measured in m.
    pub point: [f64; 3],
    /// Mass rate. Measured in kg/s.
    pub rate: f64,
    /// Injection is active only while simulated time is below this cutoff.
    /// Measured in s.
    pub cutoff: f64,
}

/// Boundary condition kind for the mechanics problem.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BcKind {
    Dirichlet,
    Neumann,
}

/// Fluid properties shared by every region.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlowProperties {
    /// Fluid compressibility. Measured in 1/Pa.
    pub compressibility: f64,
    /// Dynamic viscosity. Measured in Pa s.
    pub viscosity: f64,
    /// Fluid density. Measured in kg/m^3.
    pub density: f64,
}

/// The full physical configuration of a run. The defaults reproduce a low
/// pressure stimulation of a granite reservoir at a few kilometers depth.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhysicalConfig {
    /// Initial pore pressure everywhere. Measured in Pa.
    pub initial_pressure: f64,
    pub flow: FlowProperties,
    /// Matrix permeability. Measured in m^2.
    pub matrix_permeability: f64,
    pub matrix_porosity: f64,
    pub fracture_porosity: f64,
    /// Baseline fracture aperture fixed at initialization. Measured in m.
    pub baseline_aperture: f64,
    pub rock: Rock,
    /// Principal compressive background stresses along x, y, z. Measured in Pa.
    pub background_stress: [f64; 3],
    pub injection: InjectionParams,
}

impl Default for PhysicalConfig {
    fn default() -> Self {
        PhysicalConfig {
            initial_pressure: 40.0e6,
            flow: FlowProperties {
                compressibility: 4.6e-10,
                viscosity: 0.45e-3,
                density: 1014.0,
            },
            // A relatively high matrix permeability, corresponding to a high
            // density of upscaled fractures.
            matrix_permeability: 1.0e-9 * DARCY,
            matrix_porosity: 0.01,
            fracture_porosity: 1.0,
            baseline_aperture: 0.1e-3,
            rock: Rock {
                mu: 20.0e9,
                lambda: 20.0e9,
            },
            background_stress: [120.0e6, 80.0e6, 100.0e6],
            injection: InjectionParams {
                node: 1,
                point: [1200.0, 2200.0, 2000.0],
                rate: 10.0,
                cutoff: 6000.0,
            },
        }
    }
}

/// Parameters of the 3D matrix rock.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MatrixRegion {
    pub flow: FlowProperties,
    pub initial_pressure: f64,
    /// Measured in m^2.
    pub permeability: f64,
    pub porosity: f64,
    pub rock: Rock,
    pub background_stress: [f64; 3],
    pub bc: BcKind,
}

/// Flow parameters of a 2D fracture.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FractureRegion {
    pub flow: FlowProperties,
    pub initial_pressure: f64,
    pub porosity: f64,
    /// Measured in m.
    pub baseline_aperture: f64,
}

/// Per-grid parameter bundle, tagged by the role the grid plays.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Region {
    Matrix(MatrixRegion),
    Fracture(FractureRegion),
    InjectionFracture(FractureRegion, InjectionParams),
}

impl Region {
    pub fn initial_pressure(&self, grid: &Grid) -> Vec<f64> {
        let p = match self {
            Region::Matrix(m) => m.initial_pressure,
            Region::Fracture(f) | Region::InjectionFracture(f, _) => f.initial_pressure,
        };
        vec![p; grid.num_cells()]
    }

    pub fn compressibility(&self) -> f64 {
        self.flow().compressibility
    }

    pub fn viscosity(&self) -> f64 {
        self.flow().viscosity
    }

    pub fn density(&self) -> f64 {
        self.flow().density
    }

    pub fn porosity(&self, grid: &Grid) -> Vec<f64> {
        let phi = match self {
            Region::Matrix(m) => m.porosity,
            Region::Fracture(f) | Region::InjectionFracture(f, _) => f.porosity,
        };
        vec![phi; grid.num_cells()]
    }

    /// Permeability over viscosity per cell. For fractures this follows the
    /// cubic law on the current aperture field, falling back to the baseline
    /// aperture before the first aperture update.
    pub fn permeability(&self, grid: &Grid) -> Vec<f64> {
        match self {
            Region::Matrix(m) => {
                vec![m.permeability / m.flow.viscosity; grid.num_cells()]
            }
            Region::Fracture(f) | Region::InjectionFracture(f, _) => {
                let viscosity = f.flow.viscosity;
                match grid.cell_field(APERTURE_ATTRIB) {
                    Ok(aperture) => aperture
                        .iter()
                        .map(|&a| cubic_law_permeability(a, viscosity))
                        .collect(),
                    Err(_) => vec![
                        cubic_law_permeability(f.baseline_aperture, viscosity);
                        grid.num_cells()
                    ],
                }
            }
        }
    }

    /// Dimension-reduction storage weight per cell: the current aperture
    /// raised to the codimension. `None` for the matrix region.
    pub fn aperture_weight(&self, grid: &Grid) -> Option<Vec<f64>> {
        let baseline = match self {
            Region::Matrix(_) => return None,
            Region::Fracture(f) | Region::InjectionFracture(f, _) => f.baseline_aperture,
        };
        let dim = grid.dim();
        Some(match grid.cell_field(APERTURE_ATTRIB) {
            Ok(aperture) => aperture.iter().map(|&a| dimension_weight(a, dim)).collect(),
            Err(_) => vec![dimension_weight(baseline, dim); grid.num_cells()],
        })
    }

    /// Source term at simulated time `t`. Zero everywhere except the
    /// injection cell of the designated fracture while injection is active.
    pub fn source(&self, grid: &Grid, t: f64) -> Vec<f64> {
        let mut values = vec![0.0; grid.num_cells()];
        if let Region::InjectionFracture(f, injection) = self {
            if t < injection.cutoff + CUTOFF_TOL {
                if let Some(cell) = nearest_cell(grid.cell_centers(), &Point3::from(injection.point))
                {
                    values[cell] = injection.rate / f.flow.density;
                }
            }
        }
        values
    }

    pub fn rock(&self) -> Option<&Rock> {
        match self {
            Region::Matrix(m) => Some(&m.rock),
            _ => None,
        }
    }

    /// Background stress tensor for the mechanics problem, compressive by
    /// sign convention. `None` for fracture regions.
    pub fn background_stress(&self) -> Option<Matrix3<f64>> {
        match self {
            Region::Matrix(m) => {
                let [tx, ty, tz] = m.background_stress;
                Some(Matrix3::from_diagonal(&Vector3::new(-tx, -ty, -tz)))
            }
            _ => None,
        }
    }

    pub fn boundary_condition(&self) -> Option<BcKind> {
        match self {
            Region::Matrix(m) => Some(m.bc),
            _ => None,
        }
    }

    fn flow(&self) -> &FlowProperties {
        match self {
            Region::Matrix(m) => &m.flow,
            Region::Fracture(f) | Region::InjectionFracture(f, _) => &f.flow,
        }
    }
}

/// Index of the cell whose center is nearest `point`. Ties resolve to the
/// first minimum so the designated injection cell is stable across runs.
pub fn nearest_cell(centers: &[Point3<f64>], point: &Point3<f64>) -> Option<usize> {
    let mut best = None;
    let mut best_distance = f64::INFINITY;
    for (cell, center) in centers.iter().enumerate() {
        let distance = (center - point).norm_squared();
        if distance < best_distance {
            best_distance = distance;
            best = Some(cell);
        }
    }
    best
}

/// The per-grid parameter sets of a collection, keyed by node number.
#[derive(Clone, Debug)]
pub struct RegionTable {
    regions: AHashMap<usize, Region>,
}

impl RegionTable {
    /// Assigns a region to every grid in the collection: the matrix grid gets
    /// rock-mechanical and flow properties, the fracture whose node number
    /// matches the configured injection node gets the source term, and all
    /// other fractures get plain flow properties.
    pub fn assign(gb: &GridCollection, config: &PhysicalConfig) -> Self {
        let mut regions = AHashMap::new();
        regions.insert(
            gb.matrix().node_number(),
            Region::Matrix(MatrixRegion {
                flow: config.flow,
                initial_pressure: config.initial_pressure,
                permeability: config.matrix_permeability,
                porosity: config.matrix_porosity,
                rock: config.rock,
                background_stress: config.background_stress,
                bc: BcKind::Dirichlet,
            }),
        );
        for grid in gb.fractures() {
            let fracture = FractureRegion {
                flow: config.flow,
                initial_pressure: config.initial_pressure,
                porosity: config.fracture_porosity,
                baseline_aperture: config.baseline_aperture,
            };
            let region = if grid.node_number() == config.injection.node {
                Region::InjectionFracture(fracture, config.injection)
            } else {
                Region::Fracture(fracture)
            };
            regions.insert(grid.node_number(), region);
        }
        RegionTable { regions }
    }

    pub fn get(&self, node: usize) -> Result<&Region, Error> {
        self.regions.get(&node).ok_or(Error::UnknownNode { node })
    }

    /// The fracture parameters for `node`; fails if the node is unknown or
    /// designates the matrix grid.
    pub fn fracture(&self, node: usize) -> Result<&FractureRegion, Error> {
        match self.regions.get(&node) {
            Some(Region::Fracture(f)) | Some(Region::InjectionFracture(f, _)) => Ok(f),
            _ => Err(Error::UnknownNode { node }),
        }
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearest_cell_prefers_first_minimum() {
        let centers = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ];
        assert_eq!(nearest_cell(&centers, &Point3::new(1.9, 0.0, 0.0)), Some(1));
        assert_eq!(nearest_cell(&[], &Point3::origin()), None);
    }

    #[test]
    fn background_stress_is_compressive() {
        let config = PhysicalConfig::default();
        let region = Region::Matrix(MatrixRegion {
            flow: config.flow,
            initial_pressure: config.initial_pressure,
            permeability: config.matrix_permeability,
            porosity: config.matrix_porosity,
            rock: config.rock,
            background_stress: config.background_stress,
            bc: BcKind::Dirichlet,
        });
        let sigma = region.background_stress().unwrap();
        assert_eq!(sigma[(0, 0)], -120.0e6);
        assert_eq!(sigma[(1, 1)], -80.0e6);
        assert_eq!(sigma[(2, 2)], -100.0e6);
        assert_eq!(sigma[(0, 1)], 0.0);
    }
}
