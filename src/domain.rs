//! Bounding primitives and domain-mask construction.
//!
//! A mask classifies every lattice point as strictly inside (`true`) or not
//! (`false`) one of five bounding shapes. Boundaries are open: a point lying
//! exactly on the shape surface is outside.

use crate::errors::LatticeError;
use crate::float_types::Real;
use crate::grid::Grid;
use crate::volume::Volume;

/// The bounding primitive limiting the lattice.
///
/// The axial extent (the `Length` of the cube, and of the cuboid, cylinder
/// and ring along z) is the grid's edge length; the radial parameters are
/// carried per shape.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DomainShape {
    /// `|x| < L/2 ∧ |y| < L/2 ∧ |z| < L/2`.
    Cube,
    /// `|x| < r/2 ∧ |y| < r/2 ∧ |z| < L/2`.
    Cuboid {
        /// Edge length of the square x/y cross-section.
        radius: Real,
    },
    /// `√(x²+y²+z²) < r`.
    Sphere {
        /// Sphere radius.
        radius: Real,
    },
    /// `√(x²+y²) < r ∧ |z| < L/2`.
    Cylinder {
        /// Cylinder radius.
        radius: Real,
    },
    /// `r_in < √(x²+y²) < r ∧ |z| < L/2`.
    Ring {
        /// Inner (bore) radius, strictly less than `radius`.
        inner_radius: Real,
        /// Outer radius.
        radius: Real,
    },
}

impl DomainShape {
    /// Name used in log output.
    pub const fn name(&self) -> &'static str {
        match self {
            DomainShape::Cube => "Cube",
            DomainShape::Cuboid { .. } => "Cuboid",
            DomainShape::Sphere { .. } => "Sphere",
            DomainShape::Cylinder { .. } => "Cylinder",
            DomainShape::Ring { .. } => "Ring",
        }
    }

    fn validate(&self) -> Result<(), LatticeError> {
        match *self {
            DomainShape::Cube => Ok(()),
            DomainShape::Cuboid { radius }
            | DomainShape::Sphere { radius }
            | DomainShape::Cylinder { radius } => {
                if !(radius > 0.0) {
                    return Err(LatticeError::not_positive("radius", radius));
                }
                Ok(())
            },
            DomainShape::Ring {
                inner_radius,
                radius,
            } => {
                if !(radius > 0.0) {
                    return Err(LatticeError::not_positive("radius", radius));
                }
                if !(inner_radius > 0.0) {
                    return Err(LatticeError::not_positive("inner_radius", inner_radius));
                }
                if inner_radius >= radius {
                    return Err(LatticeError::InvalidParameter {
                        name: "inner_radius",
                        value: inner_radius,
                        constraint: "must be strictly less than the outer radius",
                    });
                }
                Ok(())
            },
        }
    }

    /// Classify every lattice point of `grid` against this shape.
    ///
    /// # Errors
    /// [`LatticeError::InvalidParameter`] when a required radius is missing
    /// its constraint (non-positive, or ring radii out of order).
    pub fn mask(&self, grid: &Grid) -> Result<Volume<bool>, LatticeError> {
        self.validate()?;

        let half = grid.length / 2.0;
        let (nx, ny, nz) = grid.shape();
        let mask = Volume::from_fn(nx, ny, nz, |i, j, k| {
            let (x, y, z) = (grid.x[(i, j, k)], grid.y[(i, j, k)], grid.z[(i, j, k)]);
            match *self {
                DomainShape::Cube => x.abs() < half && y.abs() < half && z.abs() < half,
                DomainShape::Cuboid { radius } => {
                    x.abs() < radius / 2.0 && y.abs() < radius / 2.0 && z.abs() < half
                },
                DomainShape::Sphere { radius } => (x * x + y * y + z * z).sqrt() < radius,
                DomainShape::Cylinder { radius } => {
                    (x * x + y * y).sqrt() < radius && z.abs() < half
                },
                DomainShape::Ring {
                    inner_radius,
                    radius,
                } => {
                    let rho = (x * x + y * y).sqrt();
                    rho > inner_radius && rho < radius && z.abs() < half
                },
            }
        });
        Ok(mask)
    }
}
