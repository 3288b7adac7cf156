//! Shared fixtures and scripted collaborators for tests.
//!
//! The scripted solvers honor the narrow solver contracts without doing any
//! numerics, which is all the coordinator tests need.

use na::Point3;

use crate::export::Exporter;
use crate::geometry::{BoundingBox, GeometryProvider, MeshSizes};
use crate::grid::{Grid, GridCollection, IncidenceMap};
use crate::input::EllipticFracture;
use crate::regions::{PhysicalConfig, RegionTable};
use crate::sim::{SimParams, SlipState};
use crate::solver::{FlowSolver, FrictionSolver, MechanicsSolver, SolverError};
use crate::Error;

/*
 * Setup code
 */

pub const TEST_PARAMS: SimParams = SimParams {
    time_step: 600.0,
    total_time: 1800.0,
    max_slip_iterations: 50,
};

fn solver_err(err: Error) -> SolverError {
    SolverError::Other(err.to_string())
}

fn matrix_centers() -> Vec<Point3<f64>> {
    let mut centers = Vec::new();
    for i in 0..2 {
        for j in 0..2 {
            for k in 0..2 {
                centers.push(Point3::new(
                    1000.0 * i as f64,
                    1000.0 * j as f64,
                    1000.0 * k as f64,
                ));
            }
        }
    }
    centers
}

/// A matrix grid and one single-cell fracture mapped to the given faces.
pub fn single_cell_collection(mapped_faces: &[usize], num_faces: usize) -> GridCollection {
    let matrix = Grid::new(3, 0, num_faces, matrix_centers());
    let fracture = Grid::new(2, 1, 4, vec![Point3::new(1200.0, 2200.0, 2000.0)]);
    let pairs: Vec<_> = mapped_faces.iter().map(|&face| (0, face)).collect();
    let map = IncidenceMap::from_pairs(1, num_faces, &pairs);
    GridCollection::new(matrix, vec![(fracture, map)])
        .expect("Failed to build the single cell collection fixture.")
}

/// Two two-cell fractures, each cell mapped to two distinct matrix faces.
/// Fracture 1 holds the cell nearest the default injection point.
pub fn two_fracture_collection() -> GridCollection {
    let matrix = Grid::new(3, 0, 12, matrix_centers());
    let fracture1 = Grid::new(
        2,
        1,
        6,
        vec![
            Point3::new(1200.0, 2200.0, 2000.0),
            Point3::new(1700.0, 2200.0, 2000.0),
        ],
    );
    let map1 = IncidenceMap::from_pairs(2, 12, &[(0, 0), (0, 1), (1, 2), (1, 3)]);
    let fracture2 = Grid::new(
        2,
        2,
        6,
        vec![
            Point3::new(4000.0, 4000.0, 4000.0),
            Point3::new(4500.0, 4000.0, 4000.0),
        ],
    );
    let map2 = IncidenceMap::from_pairs(2, 12, &[(0, 4), (0, 5), (1, 6), (1, 7)]);
    GridCollection::new(matrix, vec![(fracture1, map1), (fracture2, map2)])
        .expect("Failed to build the two fracture collection fixture.")
}

/// A collection whose second fracture cell has no incident matrix faces.
pub fn orphan_collection() -> GridCollection {
    let matrix = Grid::new(3, 0, 12, matrix_centers());
    let fracture = Grid::new(
        2,
        1,
        6,
        vec![
            Point3::new(1200.0, 2200.0, 2000.0),
            Point3::new(1700.0, 2200.0, 2000.0),
        ],
    );
    let map = IncidenceMap::from_pairs(2, 12, &[(0, 0), (0, 1)]);
    GridCollection::new(matrix, vec![(fracture, map)])
        .expect("Failed to build the orphan collection fixture.")
}

pub fn default_regions(gb: &GridCollection) -> RegionTable {
    RegionTable::assign(gb, &PhysicalConfig::default())
}

/// Geometry provider producing one single-cell fracture grid per input row,
/// centered on the row's fracture center and mapped to two matrix faces.
pub struct FixtureProvider;

impl GeometryProvider for FixtureProvider {
    fn build_grids(
        &self,
        fractures: &[EllipticFracture],
        _domain: &BoundingBox,
        _sizes: &MeshSizes,
    ) -> Result<GridCollection, Error> {
        let matrix = Grid::new(3, 0, 12, matrix_centers());
        let mut lower = Vec::new();
        for (i, fracture) in fractures.iter().enumerate() {
            let grid = Grid::new(2, i + 1, 4, vec![Point3::from(fracture.center)]);
            let map = IncidenceMap::from_pairs(1, 12, &[(0, 2 * i), (0, 2 * i + 1)]);
            lower.push((grid, map));
        }
        GridCollection::new(matrix, lower)
    }
}

/// Flow solver that fills every grid with a constant pressure and records the
/// last source-update time.
pub struct UniformFlow {
    pub pressure: f64,
    pub last_source_time: Option<f64>,
}

impl UniformFlow {
    pub fn new(pressure: f64) -> Self {
        UniformFlow {
            pressure,
            last_source_time: None,
        }
    }
}

impl FlowSolver for UniformFlow {
    fn update_sources(
        &mut self,
        _gb: &mut GridCollection,
        _regions: &RegionTable,
        time: f64,
    ) -> Result<(), SolverError> {
        self.last_source_time = Some(time);
        Ok(())
    }

    fn reassemble(
        &mut self,
        _gb: &GridCollection,
        _regions: &RegionTable,
    ) -> Result<(), SolverError> {
        Ok(())
    }

    fn step(&mut self, _gb: &mut GridCollection) -> Result<(), SolverError> {
        Ok(())
    }

    fn pressure(&self, gb: &mut GridCollection, field: &str) -> Result<(), SolverError> {
        for grid in gb.grids_mut() {
            let values = vec![self.pressure; grid.num_cells()];
            grid.set_cell_field(field, values).map_err(solver_err)?;
        }
        Ok(())
    }
}

/// Mechanics solver writing a constant traction on every matrix face.
pub struct StaticMechanics {
    pub traction: f64,
    pub solve_count: u32,
}

impl StaticMechanics {
    pub fn new(traction: f64) -> Self {
        StaticMechanics {
            traction,
            solve_count: 0,
        }
    }
}

impl MechanicsSolver for StaticMechanics {
    fn reassemble(
        &mut self,
        _gb: &GridCollection,
        _regions: &RegionTable,
    ) -> Result<(), SolverError> {
        Ok(())
    }

    fn solve(&mut self, _gb: &GridCollection) -> Result<(), SolverError> {
        self.solve_count += 1;
        Ok(())
    }

    fn traction(&self, gb: &mut GridCollection, field: &str) -> Result<(), SolverError> {
        let num_faces = gb.matrix().num_faces();
        gb.matrix_mut()
            .set_face_field(field, vec![self.traction; num_faces])
            .map_err(solver_err)
    }
}

/// Mechanics solver whose solve always reports a singular system.
pub struct FailingMechanics;

impl MechanicsSolver for FailingMechanics {
    fn reassemble(
        &mut self,
        _gb: &GridCollection,
        _regions: &RegionTable,
    ) -> Result<(), SolverError> {
        Ok(())
    }

    fn solve(&mut self, _gb: &GridCollection) -> Result<(), SolverError> {
        Err(SolverError::SingularSystem)
    }

    fn traction(&self, _gb: &mut GridCollection, _field: &str) -> Result<(), SolverError> {
        Ok(())
    }
}

/// Friction solver scripted to report slip a fixed number of times per outer
/// step before converging, writing a constant accumulated aperture change.
///
/// A fresh outer step is detected by the coordinator's slip-flag reset; with
/// `slips_per_step = 0` this is a no-slip solver, with a large value it never
/// terminates.
pub struct ScriptedFriction {
    pub slips_per_step: u32,
    pub face_aperture_change: f64,
    remaining: u32,
    has_slipped: bool,
}

impl ScriptedFriction {
    pub fn new(slips_per_step: u32, face_aperture_change: f64) -> Self {
        ScriptedFriction {
            slips_per_step,
            face_aperture_change,
            remaining: 0,
            has_slipped: false,
        }
    }
}

impl FrictionSolver for ScriptedFriction {
    fn step(&mut self, _gb: &mut GridCollection, slip: &mut SlipState) -> Result<bool, SolverError> {
        if !slip.any_slipping() {
            self.remaining = self.slips_per_step;
        }
        if self.remaining > 0 {
            self.remaining -= 1;
            self.has_slipped = true;
            for (flag, distance) in slip.is_slipping.iter_mut().zip(slip.slip_distance.iter_mut())
            {
                *flag = true;
                distance[0] = self.face_aperture_change;
            }
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn aperture_change(&self, gb: &mut GridCollection, field: &str) -> Result<(), SolverError> {
        // Nothing has accumulated before the first slip.
        let change = if self.has_slipped {
            self.face_aperture_change
        } else {
            0.0
        };
        let num_faces = gb.matrix().num_faces();
        gb.matrix_mut()
            .set_face_field(field, vec![change; num_faces])
            .map_err(solver_err)
    }
}

/// Exporter that keeps every snapshot in memory for assertions.
#[derive(Clone, Debug, Default)]
pub struct RecordingExporter {
    pub snapshots: Vec<RecordedSnapshot>,
    pub times: Vec<f64>,
}

#[derive(Clone, Debug)]
pub struct RecordedSnapshot {
    pub step: usize,
    /// (node number, field name, cell values) for every grid and field.
    pub fields: Vec<(usize, String, Vec<f64>)>,
}

impl RecordedSnapshot {
    pub fn field(&self, node: usize, name: &str) -> Option<&[f64]> {
        self.fields
            .iter()
            .find(|(n, f, _)| *n == node && f == name)
            .map(|(_, _, values)| values.as_slice())
    }
}

impl Exporter for RecordingExporter {
    fn write(&mut self, gb: &GridCollection, fields: &[&str], step: usize) -> Result<(), Error> {
        let mut captured = Vec::new();
        for grid in gb.grids() {
            for name in fields {
                captured.push((
                    grid.node_number(),
                    name.to_string(),
                    grid.cell_field(name)?.to_vec(),
                ));
            }
        }
        self.snapshots.push(RecordedSnapshot {
            step,
            fields: captured,
        });
        Ok(())
    }

    fn write_index(&mut self, times: &[f64]) -> Result<(), Error> {
        self.times = times.to_vec();
        Ok(())
    }
}
