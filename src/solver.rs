//! Narrow interfaces to the external flow, mechanics and friction solvers.
//!
//! Discretization and linear solves happen behind these traits. The
//! coordinator only relies on the call contracts documented here: each solve
//! is a blocking call that either succeeds, leaving its output fields written
//! on the grid collection, or fails fatally for the run.

use std::fmt;

use thiserror::Error;

use crate::grid::GridCollection;
use crate::regions::RegionTable;
use crate::sim::SlipState;

/// Failure of an external solve call. Fatal to the run; the coordinator
/// attaches the phase and time step index for diagnosis.
#[derive(Debug, Error)]
pub enum SolverError {
    #[error("linear system is singular")]
    SingularSystem,
    #[error("failed to converge after {iterations} iterations")]
    NonConvergence { iterations: u32 },
    #[error("{0}")]
    Other(String),
}

/// The phase of the coupled step a failure occurred in.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    Flow,
    Mechanics,
    Friction,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Phase::Flow => write!(f, "Flow"),
            Phase::Mechanics => write!(f, "Mechanics"),
            Phase::Friction => write!(f, "Friction"),
        }
    }
}

/// Advances the pressure field one time step at a time.
pub trait FlowSolver {
    /// Re-evaluates time-dependent source terms for simulated time `time`.
    fn update_sources(
        &mut self,
        gb: &mut GridCollection,
        regions: &RegionTable,
        time: f64,
    ) -> Result<(), SolverError>;

    /// Rebuilds the right hand side for the current parameter state.
    fn reassemble(&mut self, gb: &GridCollection, regions: &RegionTable)
        -> Result<(), SolverError>;

    /// Solves for the next time step.
    fn step(&mut self, gb: &mut GridCollection) -> Result<(), SolverError>;

    /// Writes the current pressure solution into the cell field `field` on
    /// every grid of the collection.
    fn pressure(&self, gb: &mut GridCollection, field: &str) -> Result<(), SolverError>;
}

/// Solves the quasi-static elasticity problem for the current boundary and
/// stress state.
pub trait MechanicsSolver {
    /// Discretizes the elasticity operator. Called once at initialization;
    /// subsequent solves reuse the discretization.
    fn reassemble(&mut self, gb: &GridCollection, regions: &RegionTable)
        -> Result<(), SolverError>;

    fn solve(&mut self, gb: &GridCollection) -> Result<(), SolverError>;

    /// Writes the resulting tractions into the face field `field` on the
    /// matrix grid.
    fn traction(&self, gb: &mut GridCollection, field: &str) -> Result<(), SolverError>;
}

/// Evaluates the Mohr-Coulomb criterion and applies the slip correction.
pub trait FrictionSolver {
    /// Marks faces violating the friction criterion as slipping, assigns
    /// their slip displacement, and returns whether any face newly slipped.
    ///
    /// Contract: repeated calls within one outer time step monotonically
    /// shrink the violating face set, so a return of `false` means the slip
    /// state is converged for this step.
    fn step(&mut self, gb: &mut GridCollection, slip: &mut SlipState) -> Result<bool, SolverError>;

    /// Writes the accumulated slip-induced aperture change into the face
    /// field `field` on the matrix grid.
    fn aperture_change(&self, gb: &mut GridCollection, field: &str) -> Result<(), SolverError>;
}
