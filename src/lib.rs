//! Triply periodic minimal surface (TPMS) lattices over bounded 3D domains.
//!
//! The crate samples one of six periodic implicit equations on a cubic grid,
//! masks the field by a bounding primitive (cube, cuboid, sphere, cylinder,
//! ring), matches a target relative density by root-finding on the isovalue,
//! extracts a triangle mesh at level 0 with marching cubes, and computes
//! topological and morphological statistics of the resulting solid/pore
//! structure (Betti numbers, pore-size distribution, curvature statistics).
//!
//! # Features
//! #### Default
//! - **f64**: use f64 as Real
//!
//! #### Optional
//! - **f32**: use f32 as Real, this conflicts with f64
//! - **parallel**: use rayon for multithreaded field evaluation
//!
//! # Quick start
//!
//! ```
//! use tpmslat::{generate_lattice, DensityMethod, DomainShape, Equation, LatticeParams, Topology};
//!
//! let params = LatticeParams {
//!     length: 2.0,
//!     resolution: 40,
//!     domain: DomainShape::Cube,
//!     equation: Equation::Gyroid,
//!     topology: Topology::Sheet,
//!     method: DensityMethod::RelativeDensity(0.3),
//!     cells: [1.0, 1.0, 1.0],
//!     unit_cell: [1.0, 1.0, 1.0],
//! };
//! let model = generate_lattice(&params).unwrap();
//! assert!(!model.mesh.is_empty());
//! ```

#![forbid(unsafe_code)]
#![deny(unused)]
#![warn(clippy::missing_const_for_fn, clippy::approx_constant, clippy::all)]

pub mod errors;
pub mod float_types;
pub mod volume;
pub mod grid;
pub mod domain;
pub mod field;
pub mod density;
pub mod isosurface;
pub mod topology;
pub mod pore;
pub mod curvature;
pub mod generate;

#[cfg(any(all(feature = "f64", feature = "f32"), not(any(feature = "f64", feature = "f32"))))]
compile_error!("Either 'f64' or 'f32' feature must be specified, but not both");

pub use curvature::{CurvatureStats, RawStats, WeightedStats, analyze_curvature};
pub use density::{DensitySolution, IsovalueBracket, solid_fraction, solve_isovalue};
pub use domain::DomainShape;
pub use errors::LatticeError;
pub use field::{Equation, Topology, WaveNumbers};
pub use generate::{DensityMethod, LatticeModel, LatticeParams, generate_lattice};
pub use grid::Grid;
pub use isosurface::{TriangleMesh, extract_isosurface};
pub use pore::{PoreStats, analyze_pores};
pub use topology::{ComponentSelection, TopologyStats, analyze_topology};
pub use volume::Volume;
