mod attrib_defines;

pub mod aperture;
pub mod export;
pub mod geometry;
pub mod grid;
pub mod input;
pub mod io;
pub mod regions;
pub mod sim;
pub mod solver;
pub mod transfer;

// TODO: This should be feature gated once cargo allows enabling features for
// tests by default; until then it is compiled unconditionally so integration
// tests and downstream solver implementations can share fixtures.
pub mod test_utils;

pub use attrib_defines::*;
pub use export::{CsvExporter, Exporter};
pub use geometry::{BoundingBox, GeometryProvider, MeshSizes};
pub use grid::{Grid, GridCollection, IncidenceMap};
pub use input::{load_fractures, parse_fractures, EllipticFracture};
pub use regions::{InjectionParams, PhysicalConfig, Region, RegionTable, Rock};
pub use sim::{SimParams, SimState, Simulation, SlipState};
pub use solver::{FlowSolver, FrictionSolver, MechanicsSolver, Phase, SolverError};
pub use transfer::{project_cell_to_face, project_face_to_cell};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid input: {message}")]
    Config { message: String },
    #[error("Fracture {node} cell {cell} has no incident matrix faces")]
    Mapping { node: usize, cell: usize },
    #[error("Missing field {name:?} on grid {node}")]
    MissingField { node: usize, name: String },
    #[error("Field {name:?} on grid {node} has {actual} entries, expected {expected}")]
    FieldSize {
        node: usize,
        name: String,
        expected: usize,
        actual: usize,
    },
    #[error("Inconsistent grid collection: {message}")]
    InvalidCollection { message: String },
    #[error("No fracture region with node number {node}")]
    UnknownNode { node: usize },
    #[error("{phase} solve failed at time step {step}")]
    Solver {
        phase: Phase,
        step: usize,
        #[source]
        source: SolverError,
    },
    #[error("Slip iteration did not terminate at time step {step} after {iterations} iterations")]
    SlipNonTermination { step: usize, iterations: u32 },
    #[error("Aperture collapsed to a non-physical value on fracture {node}, cell {cell}")]
    ApertureCollapse { node: usize, cell: usize },
    #[error("File I/O Error")]
    FileIOError {
        #[from]
        source: std::io::Error,
    },
    #[error("Error during table I/O")]
    TableIOError {
        #[from]
        source: csv::Error,
    },
}
