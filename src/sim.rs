//! The time-step coordinator.
//!
//! Each outer step solves flow, maps the new pressure onto the matrix faces,
//! then iterates mechanics and friction until no face violates the
//! Mohr-Coulomb criterion, and finally maps the accumulated slip-induced
//! aperture change back onto the fracture cells, updates apertures and
//! records a snapshot. The physics are sequentially dependent, so the phase
//! order (pressure, traction, slip, aperture) is fixed by this control flow.

use serde::{Deserialize, Serialize};

use crate::aperture::update_apertures;
use crate::attrib_defines::{
    face_attrib, APERTURE_CHANGE_ATTRIB, PRESSURE_ATTRIB, TRACTION_ATTRIB,
};
use crate::export::Exporter;
use crate::grid::GridCollection;
use crate::regions::RegionTable;
use crate::solver::{FlowSolver, FrictionSolver, MechanicsSolver, Phase, SolverError};
use crate::transfer::{project_cell_to_face, project_face_to_cell};
use crate::Error;

/// Time stepping parameters.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimParams {
    /// Outer time step. Measured in s.
    pub time_step: f64,
    /// Total simulated time. Measured in s.
    pub total_time: f64,
    /// Safety bound on the inner slip-convergence loop. Exceeding it is
    /// fatal rather than silently truncated: exiting the loop early would
    /// under-report slip and corrupt the aperture update.
    pub max_slip_iterations: u32,
}

impl Default for SimParams {
    fn default() -> Self {
        SimParams {
            time_step: 600.0,
            total_time: 10_800.0,
            max_slip_iterations: 50,
        }
    }
}

/// Per-matrix-face slip state, reset at the start of each outer step and
/// updated within the inner slip-convergence loop.
#[derive(Clone, Debug, PartialEq)]
pub struct SlipState {
    pub is_slipping: Vec<bool>,
    pub slip_distance: Vec<[f64; 3]>,
}

impl SlipState {
    pub fn new(num_faces: usize) -> Self {
        SlipState {
            is_slipping: vec![false; num_faces],
            slip_distance: vec![[0.0; 3]; num_faces],
        }
    }

    /// Marks every face as not slipping. Slip distances are kept; they
    /// accumulate over the run.
    pub fn reset(&mut self) {
        for flag in self.is_slipping.iter_mut() {
            *flag = false;
        }
    }

    pub fn any_slipping(&self) -> bool {
        self.is_slipping.iter().any(|&flag| flag)
    }
}

/// Mutable simulation state threaded through the coordinator.
#[derive(Clone, Debug, PartialEq)]
pub struct SimState {
    /// Current simulated time. Measured in s.
    pub time: f64,
    /// Outer step index; 0 is the initial condition.
    pub step: usize,
    /// Times at which snapshots were recorded. Strictly increasing,
    /// append-only.
    pub time_axis: Vec<f64>,
    pub slip: SlipState,
}

impl SimState {
    fn new(num_faces: usize) -> Self {
        SimState {
            time: 0.0,
            step: 0,
            time_axis: Vec::new(),
            slip: SlipState::new(num_faces),
        }
    }
}

/// The coupled flow, mechanics and fracture slip simulation.
pub struct Simulation<F, M, S, E> {
    gb: GridCollection,
    regions: RegionTable,
    flow: F,
    mech: M,
    friction: S,
    exporter: E,
    params: SimParams,
    state: SimState,
}

fn at(phase: Phase, step: usize) -> impl FnOnce(SolverError) -> Error {
    move |source| Error::Solver {
        phase,
        step,
        source,
    }
}

impl<F, M, S, E> Simulation<F, M, S, E>
where
    F: FlowSolver,
    M: MechanicsSolver,
    S: FrictionSolver,
    E: Exporter,
{
    pub fn new(
        gb: GridCollection,
        regions: RegionTable,
        flow: F,
        mech: M,
        friction: S,
        exporter: E,
        params: SimParams,
    ) -> Result<Self, Error> {
        if params.time_step <= 0.0 {
            return Err(Error::Config {
                message: format!("time step must be positive, got {}", params.time_step),
            });
        }
        let num_faces = gb.matrix().num_faces();
        Ok(Simulation {
            gb,
            regions,
            flow,
            mech,
            friction,
            exporter,
            params,
            state: SimState::new(num_faces),
        })
    }

    pub fn grids(&self) -> &GridCollection {
        &self.gb
    }

    pub fn regions(&self) -> &RegionTable {
        &self.regions
    }

    pub fn params(&self) -> &SimParams {
        &self.params
    }

    pub fn state(&self) -> &SimState {
        &self.state
    }

    pub fn exporter(&self) -> &E {
        &self.exporter
    }

    pub fn flow(&self) -> &F {
        &self.flow
    }

    pub fn mech(&self) -> &M {
        &self.mech
    }

    pub fn friction(&self) -> &S {
        &self.friction
    }

    /// Runs the simulation to completion.
    ///
    /// Writes the initial snapshot, advances outer steps until the total time
    /// is reached, then writes the time-index manifest. On failure the error
    /// carries the offending phase and step; snapshots already written remain
    /// valid.
    pub fn run(&mut self) -> Result<&SimState, Error> {
        self.initialize()?;
        while self.state.time < self.params.total_time {
            self.step()?;
        }
        self.finalize()?;
        Ok(&self.state)
    }

    /// Records the t = 0 snapshot and discretizes the elasticity problem.
    fn initialize(&mut self) -> Result<(), Error> {
        log::info!(
            "initializing run: {} fracture grids, dt = {} s, T = {} s",
            self.gb.fractures().len(),
            self.params.time_step,
            self.params.total_time
        );

        // The slip-induced aperture change starts at zero on every grid.
        for grid in self.gb.grids_mut() {
            let zeros = vec![0.0; grid.num_cells()];
            grid.set_cell_field(APERTURE_CHANGE_ATTRIB, zeros)?;
        }

        self.flow
            .pressure(&mut self.gb, PRESSURE_ATTRIB)
            .map_err(at(Phase::Flow, 0))?;
        self.friction
            .aperture_change(&mut self.gb, &face_attrib(APERTURE_CHANGE_ATTRIB))
            .map_err(at(Phase::Friction, 0))?;
        project_face_to_cell(&mut self.gb, APERTURE_CHANGE_ATTRIB)?;

        self.exporter
            .write(&self.gb, &[PRESSURE_ATTRIB, APERTURE_CHANGE_ATTRIB], 0)?;
        self.state.time_axis.push(0.0);

        self.mech
            .reassemble(&self.gb, &self.regions)
            .map_err(at(Phase::Mechanics, 0))?;
        Ok(())
    }

    /// Advances one outer time step.
    fn step(&mut self) -> Result<(), Error> {
        let Simulation {
            gb,
            regions,
            flow,
            mech,
            friction,
            exporter,
            params,
            state,
        } = self;

        state.step += 1;
        state.time += params.time_step;
        let step = state.step;
        log::info!("solving time step {} (t = {} s)", step, state.time);

        // Flow: update injection, reassemble the rhs, solve one step and map
        // the new fracture pressure onto the matrix faces.
        flow.update_sources(gb, regions, state.time)
            .map_err(at(Phase::Flow, step))?;
        flow.reassemble(gb, regions).map_err(at(Phase::Flow, step))?;
        flow.step(gb).map_err(at(Phase::Flow, step))?;
        flow.pressure(gb, PRESSURE_ATTRIB)
            .map_err(at(Phase::Flow, step))?;
        project_cell_to_face(gb, PRESSURE_ATTRIB)?;

        // At the start of each time step no face is assumed to be slipping.
        state.slip.reset();
        let mut iterations = 0;
        loop {
            mech.solve(gb).map_err(at(Phase::Mechanics, step))?;
            mech.traction(gb, TRACTION_ATTRIB)
                .map_err(at(Phase::Mechanics, step))?;
            let slipped = friction
                .step(gb, &mut state.slip)
                .map_err(at(Phase::Friction, step))?;
            if !slipped {
                break;
            }
            // A slipped face changes the stress field, so the displaced state
            // must be re-solved.
            iterations += 1;
            log::debug!("slip iteration {} at time step {}", iterations, step);
            if iterations >= params.max_slip_iterations {
                return Err(Error::SlipNonTermination { step, iterations });
            }
        }

        friction
            .aperture_change(gb, &face_attrib(APERTURE_CHANGE_ATTRIB))
            .map_err(at(Phase::Friction, step))?;
        project_face_to_cell(gb, APERTURE_CHANGE_ATTRIB)?;
        update_apertures(gb, regions)?;

        exporter.write(gb, &[PRESSURE_ATTRIB, APERTURE_CHANGE_ATTRIB], step)?;
        state.time_axis.push(state.time);
        Ok(())
    }

    /// Writes the time-index manifest over all recorded snapshots.
    fn finalize(&mut self) -> Result<(), Error> {
        self.exporter.write_index(&self.state.time_axis)?;
        log::info!(
            "run complete: {} snapshots recorded",
            self.state.time_axis.len()
        );
        Ok(())
    }
}
