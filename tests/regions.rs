use approx::assert_relative_eq;
use fracstim::regions::BcKind;
use fracstim::test_utils::*;
use fracstim::*;

/// The matrix grid gets rock-mechanical properties, the designated node gets
/// the injection source, and every other fracture gets plain flow properties.
#[test]
fn assignment_dispatches_by_node_number() {
    let gb = two_fracture_collection();
    let regions = default_regions(&gb);
    assert_eq!(regions.len(), 3);

    assert!(matches!(regions.get(0).unwrap(), Region::Matrix(_)));
    assert!(matches!(
        regions.get(1).unwrap(),
        Region::InjectionFracture(..)
    ));
    assert!(matches!(regions.get(2).unwrap(), Region::Fracture(_)));

    // The matrix node is not a fracture.
    assert!(matches!(
        regions.fracture(0),
        Err(Error::UnknownNode { node: 0 })
    ));
    assert!(matches!(
        regions.get(7),
        Err(Error::UnknownNode { node: 7 })
    ));
}

#[test]
fn matrix_region_carries_mechanics() {
    let gb = two_fracture_collection();
    let regions = default_regions(&gb);
    let matrix = regions.get(0).unwrap();

    let rock = matrix.rock().unwrap();
    assert_relative_eq!(rock.mu, 20.0e9);
    assert_relative_eq!(rock.lambda, 20.0e9);
    assert_eq!(matrix.boundary_condition(), Some(BcKind::Dirichlet));
    assert!(matrix.background_stress().is_some());

    let fracture = regions.get(2).unwrap();
    assert!(fracture.rock().is_none());
    assert!(fracture.background_stress().is_none());
    assert!(fracture.aperture_weight(&gb.fractures()[1]).is_some());
    assert!(matrix.aperture_weight(gb.matrix()).is_none());
}

/// Injection is active strictly below the cutoff and exactly zero beyond it,
/// only in the cell nearest the configured point.
#[test]
fn injection_source_respects_cutoff() {
    let gb = two_fracture_collection();
    let regions = default_regions(&gb);
    let config = PhysicalConfig::default();
    let injection_grid = gb.fracture_by_node(1).unwrap();
    let region = regions.get(1).unwrap();

    let active = region.source(injection_grid, 5999.0);
    assert_relative_eq!(active[0], config.injection.rate / config.flow.density);
    assert_eq!(active[1], 0.0);

    // A step landing exactly on the cutoff still injects.
    let at_cutoff = region.source(injection_grid, 6000.0);
    assert!(at_cutoff[0] > 0.0);

    let expired = region.source(injection_grid, 6001.0);
    assert_eq!(expired, vec![0.0, 0.0]);
}

#[test]
fn non_injection_regions_have_no_source() {
    let gb = two_fracture_collection();
    let regions = default_regions(&gb);

    let fracture = regions.get(2).unwrap();
    assert_eq!(fracture.source(&gb.fractures()[1], 10.0), vec![0.0, 0.0]);
    let matrix = regions.get(0).unwrap();
    assert!(matrix.source(gb.matrix(), 10.0).iter().all(|&q| q == 0.0));
}

#[test]
fn flow_properties_by_dimension() {
    let gb = two_fracture_collection();
    let regions = default_regions(&gb);
    let config = PhysicalConfig::default();

    let matrix = regions.get(0).unwrap();
    assert_eq!(
        matrix.porosity(gb.matrix()),
        vec![config.matrix_porosity; gb.matrix().num_cells()]
    );
    assert_relative_eq!(matrix.compressibility(), 4.6e-10);
    assert_relative_eq!(matrix.viscosity(), 0.45e-3);
    assert_relative_eq!(matrix.density(), 1014.0);
    let expected = config.matrix_permeability / config.flow.viscosity;
    assert_relative_eq!(matrix.permeability(gb.matrix())[0], expected);

    let fracture = regions.get(2).unwrap();
    assert_eq!(
        fracture.porosity(&gb.fractures()[1]),
        vec![config.fracture_porosity; 2]
    );
    assert_eq!(
        fracture.initial_pressure(&gb.fractures()[1]),
        vec![config.initial_pressure; 2]
    );
}
