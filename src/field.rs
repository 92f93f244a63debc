//! The periodic implicit-equation library and its topology variants.

use crate::errors::LatticeError;
use crate::float_types::{Real, TAU};
use crate::grid::Grid;
use crate::volume::Volume;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Angular wave numbers `K = 2π·N/L` per axis, derived from repetition
/// counts and unit-cell lengths.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WaveNumbers {
    /// Wave number along x.
    pub kx: Real,
    /// Wave number along y.
    pub ky: Real,
    /// Wave number along z.
    pub kz: Real,
}

impl WaveNumbers {
    /// Convert repetition counts `(nx, ny, nz)` and unit-cell lengths
    /// `(lx, ly, lz)` into angular wave numbers.
    ///
    /// # Errors
    /// [`LatticeError::InvalidParameter`] when any of the six inputs is not
    /// strictly positive.
    pub fn new(
        nx: Real,
        ny: Real,
        nz: Real,
        lx: Real,
        ly: Real,
        lz: Real,
    ) -> Result<WaveNumbers, LatticeError> {
        for (name, value) in [
            ("nx", nx),
            ("ny", ny),
            ("nz", nz),
            ("lx", lx),
            ("ly", ly),
            ("lz", lz),
        ] {
            if !(value > 0.0) {
                return Err(LatticeError::not_positive(name, value));
            }
        }
        Ok(WaveNumbers {
            kx: TAU * nx / lx,
            ky: TAU * ny / ly,
            kz: TAU * nz / lz,
        })
    }
}

/// The six supported periodic surface equations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Equation {
    /// Schwarz Primitive: `cos(Kx·x) + cos(Ky·y) + cos(Kz·z)`.
    Primitive,
    /// Schoen Gyroid: `sin(Kx·x)cos(Ky·y) + sin(Ky·y)cos(Kz·z) + sin(Kz·z)cos(Kx·x)`.
    Gyroid,
    /// Schoen I-WP:
    /// `2[cos(Kx·x)cos(Ky·y) + cos(Ky·y)cos(Kz·z) + cos(Kz·z)cos(Kx·x)]
    ///  − [cos(2Kx·x) + cos(2Ky·y) + cos(2Kz·z)]`.
    Iwp,
    /// Schwarz Diamond:
    /// `cos(Kx·x)cos(Kx·y)cos(Kz·z) − sin(Kx·x)sin(Ky·y)sin(Kz·z)`.
    Diamond,
    /// Neovius: `3[cos(Kx·x)+cos(Ky·y)+cos(Kz·z)] + 4·cos(Kx·x)cos(Ky·y)cos(Kz·z)`.
    Neovius,
    /// Fischer-Koch S:
    /// `cos(2Kx·x)sin(Ky·y)cos(Kz·z) + cos(Kx·x)cos(2Ky·y)sin(Kz·z)
    ///  + sin(Kx·x)cos(Ky·y)cos(2Kz·z)`.
    FkS,
}

impl Equation {
    /// Name used in log output.
    pub const fn name(&self) -> &'static str {
        match self {
            Equation::Primitive => "Primitive",
            Equation::Gyroid => "Gyroid",
            Equation::Iwp => "IWP",
            Equation::Diamond => "Diamond",
            Equation::Neovius => "Neovius",
            Equation::FkS => "FK-S",
        }
    }

    /// Evaluate the base periodic function at one point.
    pub fn eval(&self, x: Real, y: Real, z: Real, k: &WaveNumbers) -> Real {
        let (kx, ky, kz) = (k.kx * x, k.ky * y, k.kz * z);
        match self {
            Equation::Primitive => kx.cos() + ky.cos() + kz.cos(),
            Equation::Gyroid => {
                kx.sin() * ky.cos() + ky.sin() * kz.cos() + kz.sin() * kx.cos()
            },
            Equation::Iwp => {
                2.0 * (kx.cos() * ky.cos() + ky.cos() * kz.cos() + kz.cos() * kx.cos())
                    - ((2.0 * kx).cos() + (2.0 * ky).cos() + (2.0 * kz).cos())
            },
            Equation::Diamond => {
                // The second cosine uses the x wave number against the y
                // coordinate, matching the reference formula this family was
                // calibrated against.
                // TODO: confirm with the product owner whether that factor
                // should read cos(Ky·y); changing it changes the geometry.
                kx.cos() * (k.kx * y).cos() * kz.cos() - kx.sin() * ky.sin() * kz.sin()
            },
            Equation::Neovius => {
                3.0 * (kx.cos() + ky.cos() + kz.cos())
                    + 4.0 * (kx.cos() * ky.cos() * kz.cos())
            },
            Equation::FkS => {
                (2.0 * kx).cos() * ky.sin() * kz.cos()
                    + kx.cos() * (2.0 * ky).cos() * kz.sin()
                    + kx.sin() * ky.cos() * (2.0 * kz).cos()
            },
        }
    }
}

/// The rule turning a base equation value into the solid/sheet field for a
/// given isovalue `t`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Topology {
    /// `f − t`.
    Solid1,
    /// `f + t`.
    Solid2,
    /// `(f − t)(f + t)`: a sheet of thickness controlled by `t`, never
    /// negative outside `|f| < t`.
    Sheet,
}

impl Topology {
    /// Name used in log output.
    pub const fn name(&self) -> &'static str {
        match self {
            Topology::Solid1 => "Solid 1",
            Topology::Solid2 => "Solid 2",
            Topology::Sheet => "Sheet",
        }
    }

    /// Apply the rule to a base value `f` at isovalue `t`.
    #[inline]
    pub fn adjust(&self, f: Real, t: Real) -> Real {
        match self {
            Topology::Solid1 => f - t,
            Topology::Solid2 => f + t,
            Topology::Sheet => (f - t) * (f + t),
        }
    }
}

/// Evaluate the base equation at every lattice point of `grid`.
///
/// The result carries no topology rule or mask; [`Topology::adjust`] and
/// [`masked_field`] are applied downstream so the density solver can re-use
/// one base field across isovalue candidates.
pub fn base_field(grid: &Grid, equation: Equation, k: &WaveNumbers) -> Volume<Real> {
    let (nx, ny, nz) = grid.shape();

    #[cfg(feature = "parallel")]
    {
        let data: Vec<Real> = grid
            .x
            .as_slice()
            .par_iter()
            .zip(grid.y.as_slice().par_iter())
            .zip(grid.z.as_slice().par_iter())
            .map(|((&x, &y), &z)| equation.eval(x, y, z, k))
            .collect();
        Volume::from_vec(nx, ny, nz, data)
    }

    #[cfg(not(feature = "parallel"))]
    {
        let data: Vec<Real> = grid
            .x
            .as_slice()
            .iter()
            .zip(grid.y.as_slice().iter())
            .zip(grid.z.as_slice().iter())
            .map(|((&x, &y), &z)| equation.eval(x, y, z, k))
            .collect();
        Volume::from_vec(nx, ny, nz, data)
    }
}

/// Evaluate the topology-adjusted raw field at isovalue `t` (no mask).
pub fn raw_field(
    grid: &Grid,
    equation: Equation,
    topology: Topology,
    k: &WaveNumbers,
    isovalue: Real,
) -> Volume<Real> {
    base_field(grid, equation, k).map(|&f| topology.adjust(f, isovalue))
}

/// Negate the raw field inside the domain and zero it outside:
/// `field = -raw * mask`.
///
/// The zero exterior deliberately creates an outer boundary surface
/// coincident with the domain edge when the field is isosurfaced at 0.
pub fn masked_field(raw: &Volume<Real>, mask: &Volume<bool>) -> Volume<Real> {
    raw.zip_map(mask, |&f, &inside| if inside { -f } else { 0.0 })
}
