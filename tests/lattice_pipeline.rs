//! End-to-end pipeline tests on realistic parameter sets.

use tpmslat::{
    ComponentSelection, DensityMethod, DomainShape, Equation, LatticeParams, Topology,
    analyze_curvature, analyze_pores, analyze_topology, generate_lattice,
};

#[test]
fn primitive_sheet_cube_matches_target_density() {
    let params = LatticeParams {
        length: 2.0,
        resolution: 80,
        domain: DomainShape::Cube,
        equation: Equation::Primitive,
        topology: Topology::Sheet,
        method: DensityMethod::RelativeDensity(0.3),
        cells: [1.0, 1.0, 1.0],
        unit_cell: [1.0, 1.0, 1.0],
    };
    let model = generate_lattice(&params).expect("pipeline succeeds");

    assert!(model.isovalue > 0.0 && model.isovalue < 15.0);
    assert!(
        (model.achieved_density - 0.3).abs() < 1e-3,
        "achieved {} vs target 0.3",
        model.achieved_density
    );
    assert!(!model.mesh.is_empty());
    assert!(model.mesh.is_index_valid());
    // The surface lives inside the sampling box.
    for v in &model.mesh.vertices {
        for c in [v.x, v.y, v.z] {
            assert!((0.0..=model.length + 1e-9).contains(&c));
        }
    }
}

#[test]
fn every_equation_meshes_in_every_shape() {
    let shapes = [
        DomainShape::Cube,
        DomainShape::Cuboid { radius: 1.2 },
        DomainShape::Sphere { radius: 0.9 },
        DomainShape::Cylinder { radius: 0.9 },
        DomainShape::Ring {
            inner_radius: 0.35,
            radius: 0.9,
        },
    ];
    let equations = [
        Equation::Primitive,
        Equation::Gyroid,
        Equation::Iwp,
        Equation::Diamond,
        Equation::Neovius,
        Equation::FkS,
    ];
    for shape in shapes {
        for equation in equations {
            let params = LatticeParams {
                length: 2.0,
                resolution: 32,
                domain: shape,
                equation,
                topology: Topology::Sheet,
                method: DensityMethod::RelativeDensity(0.35),
                cells: [1.0, 1.0, 1.0],
                unit_cell: [1.0, 1.0, 1.0],
            };
            let model = generate_lattice(&params).expect("pipeline succeeds");
            assert!(
                !model.mesh.is_empty(),
                "{:?} in {:?} produced no surface",
                equation,
                shape
            );
        }
    }
}

#[test]
fn analyzers_run_on_a_generated_lattice() {
    let params = LatticeParams {
        length: 2.0,
        resolution: 40,
        domain: DomainShape::Cube,
        equation: Equation::Gyroid,
        topology: Topology::Sheet,
        method: DensityMethod::RelativeDensity(0.35),
        cells: [1.0, 1.0, 1.0],
        unit_cell: [1.0, 1.0, 1.0],
    };
    let model = generate_lattice(&params).expect("pipeline succeeds");

    let topo = analyze_topology(
        &model.field,
        &model.mask,
        model.voxel_size(),
        ComponentSelection::Largest,
    );
    assert_eq!(topo.b0, 1, "a sheet gyroid is one connected solid");
    assert!(topo.volume > 0.0);
    assert!(topo.b1 >= 0);

    let pores = analyze_pores(&model.field, model.voxel_size()).expect("pore space exists");
    assert!(pores.min > 0.0);
    assert!(pores.min <= pores.median && pores.median <= pores.max);
    // Pores cannot be thicker than the sampling box edge.
    assert!(pores.max <= model.length * 2.0);

    let curvature = analyze_curvature(&model.mesh).expect("surface exists");
    assert!(curvature.mean_curvature.mean >= 0.0);
    assert!(curvature.gaussian_curvature.p10 <= curvature.gaussian_curvature.p90);
}

#[test]
fn solid_topologies_bracket_the_sheet_density() {
    // At the same isovalue magnitude, Solid1 and Solid2 select complementary
    // halves of the field, so both must still solve against a target.
    for topology in [Topology::Solid1, Topology::Solid2] {
        let params = LatticeParams {
            length: 2.0,
            resolution: 32,
            domain: DomainShape::Cube,
            equation: Equation::Gyroid,
            topology,
            method: DensityMethod::RelativeDensity(0.5),
            cells: [1.0, 1.0, 1.0],
            unit_cell: [1.0, 1.0, 1.0],
        };
        let model = generate_lattice(&params).expect("pipeline succeeds");
        assert!((model.achieved_density - 0.5).abs() < 0.01);
        assert!(model.isovalue.abs() < 15.0);
    }
}
