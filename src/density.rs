//! Matching the solid fraction to a requested relative density by
//! root-finding on the isovalue.

use crate::errors::LatticeError;
use crate::field::{self, Equation, Topology, WaveNumbers};
use crate::float_types::{EPSILON, Real};
use crate::grid::Grid;
use crate::volume::Volume;
use tracing::debug;

/// Search interval for the isovalue, chosen per topology rule.
///
/// These are configuration values, not algorithm constants: the solver never
/// expands or retries a bracket that fails.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IsovalueBracket {
    /// Lower end of the bracket.
    pub lo: Real,
    /// Upper end of the bracket.
    pub hi: Real,
}

impl IsovalueBracket {
    /// Default bracket for a topology rule.
    ///
    /// Sheet's squared-product form is never negative, so negative isovalues
    /// are meaningless for it and its bracket starts at 0.
    pub const fn for_topology(topology: Topology) -> IsovalueBracket {
        match topology {
            Topology::Solid1 | Topology::Solid2 => IsovalueBracket { lo: -15.0, hi: 15.0 },
            Topology::Sheet => IsovalueBracket { lo: 0.0, hi: 15.0 },
        }
    }
}

/// Convergence tolerance of the root finder.
const SOLVER_TOLERANCE: Real = 1e-12;
/// Iteration cap of the root finder.
const MAX_ITERATIONS: usize = 100;

/// Solved isovalue together with the field it produces.
#[derive(Clone, Debug)]
pub struct DensitySolution {
    /// The isovalue matching the target density.
    pub isovalue: Real,
    /// Masked field evaluated at [`isovalue`](Self::isovalue).
    pub field: Volume<Real>,
    /// Solid fraction actually achieved at the solved isovalue.
    pub achieved_density: Real,
}

/// Solid fraction of a masked field: `1 - count(field < 0) / count(mask)`.
///
/// # Errors
/// [`LatticeError::EmptyDomain`] when the mask holds no voxel.
pub fn solid_fraction(field: &Volume<Real>, mask: &Volume<bool>) -> Result<Real, LatticeError> {
    let domain = mask.count_true();
    if domain == 0 {
        return Err(LatticeError::EmptyDomain);
    }
    let pore = field.iter().filter(|&&v| v < 0.0).count();
    Ok(1.0 - pore as Real / domain as Real)
}

/// Solid fraction the masked field would have at isovalue `t`, computed from
/// the base field without materializing the adjusted volume.
///
/// A voxel is pore exactly when it is inside the domain and the adjusted
/// value is positive (the mask negates the field, so `masked < 0` there).
fn fraction_at(
    base: &Volume<Real>,
    mask: &Volume<bool>,
    topology: Topology,
    t: Real,
    domain: usize,
) -> Real {
    let pore = base
        .as_slice()
        .iter()
        .zip(mask.as_slice().iter())
        .filter(|&(&f, &inside)| inside && topology.adjust(f, t) > 0.0)
        .count();
    1.0 - pore as Real / domain as Real
}

/// Find the isovalue whose solid fraction matches `target`, and the masked
/// field at that isovalue.
///
/// # Errors
/// - [`LatticeError::EmptyDomain`] when the mask holds no voxel (checked
///   before solving; the objective is undefined on an empty domain).
/// - [`LatticeError::RootNotBracketed`] when the objective keeps one sign
///   over the whole bracket.
pub fn solve_isovalue(
    grid: &Grid,
    mask: &Volume<bool>,
    equation: Equation,
    topology: Topology,
    k: &WaveNumbers,
    target: Real,
) -> Result<DensitySolution, LatticeError> {
    let domain = mask.count_true();
    if domain == 0 {
        return Err(LatticeError::EmptyDomain);
    }

    let base = field::base_field(grid, equation, k);
    let bracket = IsovalueBracket::for_topology(topology);
    let objective = |t: Real| fraction_at(&base, mask, topology, t, domain) - target;

    let isovalue = brent(objective, bracket, target)?;
    debug!(
        equation = equation.name(),
        topology = topology.name(),
        isovalue,
        target,
        "density solve converged"
    );

    let raw = base.map(|&f| topology.adjust(f, isovalue));
    let field = field::masked_field(&raw, mask);
    let achieved_density = solid_fraction(&field, mask)?;

    Ok(DensitySolution {
        isovalue,
        field,
        achieved_density,
    })
}

/// Brent's method: inverse-quadratic interpolation with a bisection
/// fallback, requiring a sign change over the bracket.
fn brent<F: Fn(Real) -> Real>(
    f: F,
    bracket: IsovalueBracket,
    target: Real,
) -> Result<Real, LatticeError> {
    let (mut a, mut b) = (bracket.lo, bracket.hi);
    let (mut fa, mut fb) = (f(a), f(b));

    if (fa > 0.0 && fb > 0.0) || (fa < 0.0 && fb < 0.0) {
        return Err(LatticeError::RootNotBracketed {
            lo: bracket.lo,
            hi: bracket.hi,
            target,
        });
    }

    let (mut c, mut fc) = (a, fa);
    let mut d = b - a;
    let mut e = d;

    for _ in 0..MAX_ITERATIONS {
        if (fb > 0.0 && fc > 0.0) || (fb < 0.0 && fc < 0.0) {
            c = a;
            fc = fa;
            d = b - a;
            e = d;
        }
        if fc.abs() < fb.abs() {
            a = b;
            b = c;
            c = a;
            fa = fb;
            fb = fc;
            fc = fa;
        }

        let tol1 = 2.0 * EPSILON * b.abs() + 0.5 * SOLVER_TOLERANCE;
        let xm = 0.5 * (c - b);
        if xm.abs() <= tol1 || fb == 0.0 {
            return Ok(b);
        }

        if e.abs() >= tol1 && fa.abs() > fb.abs() {
            // Attempt inverse quadratic interpolation.
            let s = fb / fa;
            let (mut p, mut q);
            if a == c {
                p = 2.0 * xm * s;
                q = 1.0 - s;
            } else {
                q = fa / fc;
                let r = fb / fc;
                p = s * (2.0 * xm * q * (q - r) - (b - a) * (r - 1.0));
                q = (q - 1.0) * (r - 1.0) * (s - 1.0);
            }
            if p > 0.0 {
                q = -q;
            }
            p = p.abs();
            let min1 = 3.0 * xm * q - (tol1 * q).abs();
            let min2 = (e * q).abs();
            if 2.0 * p < min1.min(min2) {
                e = d;
                d = p / q;
            } else {
                d = xm;
                e = d;
            }
        } else {
            d = xm;
            e = d;
        }

        a = b;
        fa = fb;
        if d.abs() > tol1 {
            b += d;
        } else {
            b += tol1.copysign(xm);
        }
        fb = f(b);
    }

    Ok(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DomainShape;
    use approx::assert_relative_eq;

    fn brent_root<F: Fn(Real) -> Real>(f: F, lo: Real, hi: Real) -> Real {
        brent(f, IsovalueBracket { lo, hi }, 0.0).expect("bracketed")
    }

    #[test]
    fn brent_finds_analytic_roots() {
        assert_relative_eq!(brent_root(|x| x * x - 2.0, 0.0, 2.0), (2.0 as Real).sqrt(), epsilon = 1e-9);
        assert_relative_eq!(brent_root(|x| x.cos(), 0.0, 3.0), crate::float_types::PI / 2.0, epsilon = 1e-9);
        assert_relative_eq!(brent_root(|x| x, -1.0, 4.0), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn brent_rejects_unbracketed_objective() {
        let r = brent(|x| x * x + 1.0, IsovalueBracket { lo: -1.0, hi: 1.0 }, 0.5);
        assert!(matches!(r, Err(LatticeError::RootNotBracketed { .. })));
    }

    #[test]
    fn bracket_depends_on_topology() {
        assert_eq!(IsovalueBracket::for_topology(Topology::Solid1).lo, -15.0);
        assert_eq!(IsovalueBracket::for_topology(Topology::Solid2).lo, -15.0);
        assert_eq!(IsovalueBracket::for_topology(Topology::Sheet).lo, 0.0);
        assert_eq!(IsovalueBracket::for_topology(Topology::Sheet).hi, 15.0);
    }

    #[test]
    fn empty_domain_is_rejected_before_solving() {
        let grid = Grid::new(2.0, 8).unwrap();
        let mask = Volume::filled(8, 8, 8, false);
        let k = WaveNumbers::new(1.0, 1.0, 1.0, 1.0, 1.0, 1.0).unwrap();
        let r = solve_isovalue(&grid, &mask, Equation::Gyroid, Topology::Sheet, &k, 0.3);
        assert!(matches!(r, Err(LatticeError::EmptyDomain)));
    }

    #[test]
    fn solve_is_idempotent() {
        let grid = Grid::new(2.0, 24).unwrap();
        let mask = DomainShape::Cube.mask(&grid).unwrap();
        let k = WaveNumbers::new(1.0, 1.0, 1.0, 1.0, 1.0, 1.0).unwrap();
        let a = solve_isovalue(&grid, &mask, Equation::Primitive, Topology::Sheet, &k, 0.4)
            .unwrap();
        let b = solve_isovalue(&grid, &mask, Equation::Primitive, Topology::Sheet, &k, 0.4)
            .unwrap();
        assert_relative_eq!(a.isovalue, b.isovalue, epsilon = 1e-9);
    }

    #[test]
    fn sheet_isovalue_grows_with_target_density() {
        // The sheet thickens monotonically with the isovalue, so denser
        // targets must not solve to smaller isovalues.
        let grid = Grid::new(2.0, 24).unwrap();
        let mask = DomainShape::Cube.mask(&grid).unwrap();
        let k = WaveNumbers::new(1.0, 1.0, 1.0, 1.0, 1.0, 1.0).unwrap();
        let mut last = Real::NEG_INFINITY;
        for target in [0.15, 0.3, 0.45, 0.6, 0.75] {
            let sol =
                solve_isovalue(&grid, &mask, Equation::Gyroid, Topology::Sheet, &k, target)
                    .unwrap();
            assert!(
                sol.isovalue >= last - 1e-9,
                "isovalue decreased: {} -> {} at target {}",
                last,
                sol.isovalue,
                target
            );
            last = sol.isovalue;
        }
    }

    #[test]
    fn achieved_density_tracks_target() {
        let grid = Grid::new(2.0, 32).unwrap();
        let mask = DomainShape::Cube.mask(&grid).unwrap();
        let k = WaveNumbers::new(1.0, 1.0, 1.0, 1.0, 1.0, 1.0).unwrap();
        let sol = solve_isovalue(&grid, &mask, Equation::Gyroid, Topology::Sheet, &k, 0.3)
            .unwrap();
        // On a finite grid the achieved fraction is quantized to 1/|mask|,
        // so allow a loose tolerance at this resolution.
        assert!((sol.achieved_density - 0.3).abs() < 0.05);
    }
}
