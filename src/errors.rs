//! Validation errors

use crate::float_types::Real;

/// All the failure modes a lattice request can hit.
///
/// Every variant is raised synchronously by the stage that detects it;
/// degenerate-but-valid inputs (empty mesh, zero solid volume) are results,
/// not errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LatticeError {
    /// A length, radius, resolution, repetition count, unit-cell length or
    /// target density is missing or out of range.
    #[error("invalid parameter `{name}`: {value} ({constraint})")]
    InvalidParameter {
        /// Name of the offending parameter.
        name: &'static str,
        /// The rejected value.
        value: Real,
        /// The constraint it violates.
        constraint: &'static str,
    },

    /// The domain mask contains no voxel, so relative density is undefined.
    #[error("domain mask is empty: no lattice point lies inside the bounding shape")]
    EmptyDomain,

    /// The density objective keeps the same sign across the whole isovalue
    /// bracket, so no root exists inside it.
    #[error("no isovalue in [{lo}, {hi}] brackets the target density {target}")]
    RootNotBracketed {
        /// Lower end of the bracket.
        lo: Real,
        /// Upper end of the bracket.
        hi: Real,
        /// The requested relative density.
        target: Real,
    },
}

impl LatticeError {
    /// Shorthand for an [`InvalidParameter`](Self::InvalidParameter) that must
    /// be strictly positive.
    pub const fn not_positive(name: &'static str, value: Real) -> Self {
        LatticeError::InvalidParameter {
            name,
            value,
            constraint: "must be strictly positive",
        }
    }
}
