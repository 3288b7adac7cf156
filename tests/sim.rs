mod test_utils;

use approx::assert_relative_eq;
use fracstim::*;
use test_utils::*;

type TestSim =
    Simulation<UniformFlow, StaticMechanics, ScriptedFriction, RecordingExporter>;

fn build_sim(friction: ScriptedFriction, params: SimParams) -> TestSim {
    let gb = two_fracture_collection();
    let regions = default_regions(&gb);
    Simulation::new(
        gb,
        regions,
        UniformFlow::new(40.0e6),
        StaticMechanics::new(-1.0e6),
        friction,
        RecordingExporter::default(),
        params,
    )
    .expect("Failed to build a simulation for the coordinator tests.")
}

/// Two fractures, three time steps, no slip ever triggered: four snapshots
/// with aperture change identically zero at every one of them.
#[test]
fn no_slip_run_records_four_snapshots() {
    init_logger();
    let mut sim = build_sim(ScriptedFriction::new(0, 0.0), TEST_PARAMS);
    let time_axis = sim.run().unwrap().time_axis.clone();

    assert_eq!(time_axis, vec![0.0, 600.0, 1200.0, 1800.0]);
    assert!(time_axis.windows(2).all(|w| w[0] < w[1]));

    let exporter = sim.exporter();
    assert_eq!(exporter.times, time_axis);
    assert_eq!(exporter.snapshots.len(), 4);
    for (k, snapshot) in exporter.snapshots.iter().enumerate() {
        assert_eq!(snapshot.step, k);
        for node in [0, 1, 2] {
            let change = snapshot.field(node, APERTURE_CHANGE_ATTRIB).unwrap();
            assert!(change.iter().all(|&dc| dc == 0.0));
            let pressure = snapshot.field(node, PRESSURE_ATTRIB).unwrap();
            assert!(pressure.iter().all(|&p| p == 40.0e6));
        }
    }

    // The injection terms were last refreshed for the final step.
    assert_eq!(sim.flow().last_source_time, Some(1800.0));
    // One mechanics solve per outer step when nothing slips.
    assert_eq!(sim.mech().solve_count, 3);
}

/// The fracture pressure ends up broadcast onto the mapped matrix faces.
#[test]
fn pressure_reaches_the_matrix_faces() {
    let mut sim = build_sim(ScriptedFriction::new(0, 0.0), TEST_PARAMS);
    sim.run().unwrap();

    let face_pressure = sim
        .grids()
        .matrix()
        .face_field(&face_attrib(PRESSURE_ATTRIB))
        .unwrap();
    for face in 0..8 {
        assert_eq!(face_pressure[face], 40.0e6);
    }
    // Faces incident to no fracture cell stay at their creation value.
    for face in 8..12 {
        assert_eq!(face_pressure[face], 0.0);
    }
}

/// A single trigger-and-relax cycle converges and its aperture change
/// propagates to the fracture cells as the mean over incident faces.
#[test]
fn slip_converges_and_updates_apertures() {
    init_logger();
    let baseline = PhysicalConfig::default().baseline_aperture;
    let mut sim = build_sim(ScriptedFriction::new(1, 5.0e-5), TEST_PARAMS);
    sim.run().unwrap();

    // Each outer step re-solves mechanics once after the slip correction.
    assert_eq!(sim.mech().solve_count, 6);

    for fracture in sim.grids().fractures() {
        let change = fracture.cell_field(APERTURE_CHANGE_ATTRIB).unwrap();
        let aperture = fracture.cell_field(APERTURE_ATTRIB).unwrap();
        for cell in 0..fracture.num_cells() {
            assert_relative_eq!(change[cell], 5.0e-5);
            assert_relative_eq!(aperture[cell], baseline + 5.0e-5);
        }
    }

    // The slip displacement assigned by the friction solver is retained in
    // the simulation state.
    assert_relative_eq!(sim.state().slip.slip_distance[0][0], 5.0e-5);

    // The t = 0 snapshot predates the first slip.
    let first = &sim.exporter().snapshots[0];
    assert!(first
        .field(1, APERTURE_CHANGE_ATTRIB)
        .unwrap()
        .iter()
        .all(|&dc| dc == 0.0));
    let last = sim.exporter().snapshots.last().unwrap();
    assert_relative_eq!(last.field(1, APERTURE_CHANGE_ATTRIB).unwrap()[0], 5.0e-5);
}

/// A friction solver that never stops slipping hits the iteration bound and
/// aborts with the offending step attached.
#[test]
fn endless_slip_is_fatal() {
    let mut sim = build_sim(ScriptedFriction::new(u32::MAX, 0.0), TEST_PARAMS);
    let err = sim.run().unwrap_err();
    match err {
        Error::SlipNonTermination { step, iterations } => {
            assert_eq!(step, 1);
            assert_eq!(iterations, TEST_PARAMS.max_slip_iterations);
        }
        other => panic!("expected SlipNonTermination, got {:?}", other),
    }
}

/// A failed solve aborts the run with its phase and step; snapshots already
/// written remain available.
#[test]
fn solver_failure_carries_phase_and_step() {
    let gb = two_fracture_collection();
    let regions = default_regions(&gb);
    let mut sim = Simulation::new(
        gb,
        regions,
        UniformFlow::new(40.0e6),
        FailingMechanics,
        ScriptedFriction::new(0, 0.0),
        RecordingExporter::default(),
        TEST_PARAMS,
    )
    .unwrap();

    let err = sim.run().unwrap_err();
    match err {
        Error::Solver { phase, step, .. } => {
            assert_eq!(phase, Phase::Mechanics);
            assert_eq!(step, 1);
        }
        other => panic!("expected Solver, got {:?}", other),
    }
    assert_eq!(sim.exporter().snapshots.len(), 1);
    assert_eq!(sim.exporter().snapshots[0].step, 0);
}

/// With no simulated time remaining only the initial snapshot is recorded.
#[test]
fn zero_total_time_finalizes_immediately() {
    let params = SimParams {
        total_time: 0.0,
        ..TEST_PARAMS
    };
    let mut sim = build_sim(ScriptedFriction::new(0, 0.0), params);
    let state = sim.run().unwrap();
    assert_eq!(state.time_axis, vec![0.0]);
    assert_eq!(state.step, 0);
    assert_eq!(sim.exporter().snapshots.len(), 1);
}

/// Fracture table in, snapshots out: the whole pipeline through a geometry
/// provider, parameter assignment and the coordinator.
#[test]
fn fracture_table_to_snapshots() {
    init_logger();
    let table = "1200, 2200, 2000, 1000, 600, 0.0, 0.3, 1.1\n\
                 2400, 2000, 1800, 800, 500, 0.1, 0.2, 0.9, 24\n";
    let fractures = parse_fractures(table.as_bytes()).unwrap();
    let gb = FixtureProvider
        .build_grids(&fractures, &BoundingBox::default(), &MeshSizes::default())
        .unwrap();
    assert_eq!(gb.fractures().len(), 2);

    let regions = RegionTable::assign(&gb, &PhysicalConfig::default());
    let mut sim = Simulation::new(
        gb,
        regions,
        UniformFlow::new(40.0e6),
        StaticMechanics::new(-1.0e6),
        ScriptedFriction::new(0, 0.0),
        RecordingExporter::default(),
        TEST_PARAMS,
    )
    .unwrap();
    let state = sim.run().unwrap();
    assert_eq!(state.time_axis.len(), 4);
    assert_eq!(sim.exporter().snapshots.len(), 4);
}

#[test]
fn non_positive_time_step_is_rejected() {
    let gb = two_fracture_collection();
    let regions = default_regions(&gb);
    let params = SimParams {
        time_step: 0.0,
        ..TEST_PARAMS
    };
    let result = Simulation::new(
        gb,
        regions,
        UniformFlow::new(40.0e6),
        StaticMechanics::new(0.0),
        ScriptedFriction::new(0, 0.0),
        RecordingExporter::default(),
        params,
    );
    assert!(matches!(result, Err(Error::Config { .. })));
}
