//! Sampling lattice over a cubic domain centred at the origin.

use crate::errors::LatticeError;
use crate::float_types::Real;
use crate::volume::Volume;

/// Three coordinate volumes spanning `[-length/2, +length/2]` on every axis,
/// with `resolution` samples per axis (meshgrid `ij` semantics: every
/// combination of the 1D axis samples appears exactly once).
///
/// Immutable once built; every downstream stage reads from it.
#[derive(Clone, Debug)]
pub struct Grid {
    /// X coordinate of every lattice point.
    pub x: Volume<Real>,
    /// Y coordinate of every lattice point.
    pub y: Volume<Real>,
    /// Z coordinate of every lattice point.
    pub z: Volume<Real>,
    /// Total edge length of the cubic sampling domain.
    pub length: Real,
    /// Samples per axis.
    pub resolution: usize,
    /// Distance between adjacent samples, `length / (resolution - 1)`,
    /// identical on all three axes.
    pub spacing: Real,
}

impl Grid {
    /// Build the sampling lattice.
    ///
    /// # Errors
    /// [`LatticeError::InvalidParameter`] when `length <= 0` or
    /// `resolution < 2`.
    pub fn new(length: Real, resolution: usize) -> Result<Grid, LatticeError> {
        if !(length > 0.0) {
            return Err(LatticeError::not_positive("length", length));
        }
        if resolution < 2 {
            return Err(LatticeError::InvalidParameter {
                name: "resolution",
                value: resolution as Real,
                constraint: "must be at least 2",
            });
        }

        let half = length / 2.0;
        let spacing = length / (resolution - 1) as Real;
        // Interpolate between the endpoints instead of accumulating steps:
        // the first and last samples must land exactly on -L/2 and +L/2 or
        // the open-boundary mask predicates misclassify the boundary planes.
        let axis: Vec<Real> = (0..resolution)
            .map(|n| {
                let t = n as Real / (resolution - 1) as Real;
                -half * (1.0 - t) + half * t
            })
            .collect();

        let r = resolution;
        let x = Volume::from_fn(r, r, r, |i, _, _| axis[i]);
        let y = Volume::from_fn(r, r, r, |_, j, _| axis[j]);
        let z = Volume::from_fn(r, r, r, |_, _, k| axis[k]);

        Ok(Grid {
            x,
            y,
            z,
            length,
            resolution,
            spacing,
        })
    }

    /// Shape shared by the three coordinate volumes.
    pub const fn shape(&self) -> (usize, usize, usize) {
        (self.resolution, self.resolution, self.resolution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn spans_symmetric_interval() {
        let g = Grid::new(2.0, 5).unwrap();
        let r = g.resolution - 1;
        assert_relative_eq!(g.x[(0, 0, 0)], -1.0);
        assert_relative_eq!(g.x[(r, 0, 0)], 1.0);
        assert_relative_eq!(g.y[(0, 0, 0)], -1.0);
        assert_relative_eq!(g.y[(0, r, 0)], 1.0);
        assert_relative_eq!(g.z[(0, 0, r)], 1.0);
        assert_relative_eq!(g.spacing, 0.5);
    }

    #[test]
    fn meshgrid_semantics() {
        // x varies with the first index only, z with the last only.
        let g = Grid::new(1.0, 3).unwrap();
        for j in 0..3 {
            for k in 0..3 {
                assert_relative_eq!(g.x[(1, j, k)], 0.0);
            }
        }
        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(g.z[(i, j, 2)], 0.5);
            }
        }
    }

    #[test]
    fn endpoints_are_exact_at_every_resolution() {
        // Accumulated `start + n * step` drifts off the endpoint for many
        // (length, resolution) pairs; the axis must pin both ends exactly.
        for resolution in [2, 3, 9, 50, 64, 99, 104, 108, 119] {
            for length in [1.0, 2.0, 3.0, 0.7] {
                let g = Grid::new(length, resolution).unwrap();
                let r = resolution - 1;
                assert_eq!(g.x[(0, 0, 0)], -length / 2.0, "lo, R={resolution}");
                assert_eq!(g.x[(r, 0, 0)], length / 2.0, "hi, R={resolution}");
                assert_eq!(g.z[(0, 0, r)], length / 2.0, "z hi, R={resolution}");
            }
        }
    }

    #[test]
    fn rejects_bad_parameters() {
        assert!(matches!(
            Grid::new(0.0, 10),
            Err(LatticeError::InvalidParameter { name: "length", .. })
        ));
        assert!(matches!(
            Grid::new(-1.0, 10),
            Err(LatticeError::InvalidParameter { name: "length", .. })
        ));
        assert!(matches!(
            Grid::new(1.0, 1),
            Err(LatticeError::InvalidParameter {
                name: "resolution",
                ..
            })
        ));
    }
}
