//! Pore-size analysis by local thickness.
//!
//! Local thickness of a pore voxel is the diameter of the largest ball that
//! both fits in the pore phase and covers the voxel. It is computed by an
//! ascending radius sweep: for each radius, voxels whose exact Euclidean
//! distance to the solid is at least the radius seed a ball, and every pore
//! voxel covered by some ball takes (and keeps being overwritten with) the
//! diameter of the largest covering ball.

use tracing::debug;

use crate::float_types::Real;
use crate::volume::Volume;

/// Largest ball radius probed, in voxels.
const MAX_RADIUS: usize = 49;

/// Stand-in for an unreachable distance; large but finite so the envelope
/// arithmetic of the distance transform stays NaN-free.
const FAR: Real = 1e20;

/// Summary of the local-thickness distribution, in physical units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PoreStats {
    /// Mean thickness over pore voxels.
    pub mean: Real,
    /// Median thickness over pore voxels.
    pub median: Real,
    /// Largest thickness.
    pub max: Real,
    /// Smallest positive thickness.
    pub min: Real,
}

/// Analyze the pore phase `field < 0`.
///
/// Returns `None` when no pore voxel receives a positive thickness, which
/// covers both fields without pore space and pores thinner than one voxel
/// radius everywhere.
pub fn analyze_pores(field: &Volume<Real>, voxel: Real) -> Option<PoreStats> {
    let pore = field.map(|&v| v < 0.0);
    let thickness = local_thickness(&pore);

    let mut values: Vec<Real> = thickness
        .iter()
        .zip(pore.iter())
        .filter(|&(&t, &p)| p && t > 0.0)
        .map(|(&t, _)| t * voxel)
        .collect();
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));

    let n = values.len();
    let mean = values.iter().sum::<Real>() / n as Real;
    let median = if n % 2 == 1 {
        values[n / 2]
    } else {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    };
    let stats = PoreStats {
        mean,
        median,
        max: values[n - 1],
        min: values[0],
    };
    debug!(voxels = n, mean, median, "pore thickness analyzed");
    Some(stats)
}

/// Local thickness in voxel units (diameters), zero where no probed ball
/// covers the voxel.
fn local_thickness(pore: &Volume<bool>) -> Volume<Real> {
    let (nx, ny, nz) = pore.shape();
    let mut thickness: Volume<Real> = Volume::filled(nx, ny, nz, 0.0);

    // Distance from each voxel to the nearest non-pore voxel.
    let solid = pore.map(|&p| !p);
    if solid.count_true() == 0 || pore.count_true() == 0 {
        return thickness;
    }
    let sq_to_solid = squared_edt(&solid);

    for r in 1..=MAX_RADIUS {
        let rr = (r * r) as Real;
        let seeds = sq_to_solid.map(|&d| d >= rr);
        if seeds.count_true() == 0 {
            // Radii are swept ascending, so larger balls cannot fit either.
            break;
        }
        let sq_to_seed = squared_edt(&seeds);
        for i in 0..nx {
            for j in 0..ny {
                for k in 0..nz {
                    if pore[(i, j, k)] && sq_to_seed[(i, j, k)] <= rr {
                        thickness[(i, j, k)] = (2 * r) as Real;
                    }
                }
            }
        }
    }
    thickness
}

/// Exact squared Euclidean distance to the nearest `true` site, by the
/// separable lower-envelope-of-parabolas method, one pass per axis.
fn squared_edt(sites: &Volume<bool>) -> Volume<Real> {
    let (nx, ny, nz) = sites.shape();
    let mut d = sites.map(|&s| if s { 0.0 } else { FAR });

    let mut line = vec![0.0 as Real; nx.max(ny).max(nz)];

    // Along z.
    for i in 0..nx {
        for j in 0..ny {
            for k in 0..nz {
                line[k] = d[(i, j, k)];
            }
            let out = dt_line(&line[..nz]);
            for k in 0..nz {
                d[(i, j, k)] = out[k];
            }
        }
    }
    // Along y.
    for i in 0..nx {
        for k in 0..nz {
            for j in 0..ny {
                line[j] = d[(i, j, k)];
            }
            let out = dt_line(&line[..ny]);
            for j in 0..ny {
                d[(i, j, k)] = out[j];
            }
        }
    }
    // Along x.
    for j in 0..ny {
        for k in 0..nz {
            for i in 0..nx {
                line[i] = d[(i, j, k)];
            }
            let out = dt_line(&line[..nx]);
            for i in 0..nx {
                d[(i, j, k)] = out[i];
            }
        }
    }
    d
}

/// One-dimensional squared distance transform of sampled costs `f`:
/// `d[q] = min_p (q - p)^2 + f[p]`.
fn dt_line(f: &[Real]) -> Vec<Real> {
    let n = f.len();
    let mut d = vec![0.0 as Real; n];
    if n == 0 {
        return d;
    }

    // Lower envelope of the parabolas (p, f[p]).
    let mut v = vec![0usize; n];
    let mut z = vec![0.0 as Real; n + 1];
    let mut k = 0usize;
    z[0] = -FAR;
    z[1] = FAR;

    for q in 1..n {
        loop {
            let p = v[k];
            let s = ((f[q] + (q * q) as Real) - (f[p] + (p * p) as Real))
                / (2.0 * (q as Real - p as Real));
            if s <= z[k] {
                // z[0] is -FAR, so k never underflows here.
                k -= 1;
            } else {
                k += 1;
                v[k] = q;
                z[k] = s;
                z[k + 1] = FAR;
                break;
            }
        }
    }

    k = 0;
    for (q, out) in d.iter_mut().enumerate() {
        while z[k + 1] < q as Real {
            k += 1;
        }
        let p = v[k];
        *out = (q as Real - p as Real).powi(2) + f[p];
    }
    d
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn line_transform_matches_hand_computation() {
        // Single site at the left end.
        let f = [0.0, FAR, FAR, FAR, FAR];
        assert_eq!(dt_line(&f), vec![0.0, 1.0, 4.0, 9.0, 16.0]);

        // Sites at both ends.
        let f = [0.0, FAR, FAR, FAR, 0.0];
        assert_eq!(dt_line(&f), vec![0.0, 1.0, 4.0, 1.0, 0.0]);
    }

    #[test]
    fn volume_transform_is_euclidean() {
        let mut sites = Volume::filled(5, 5, 5, false);
        sites[(0, 0, 0)] = true;
        let d = squared_edt(&sites);
        assert_relative_eq!(d[(0, 0, 0)], 0.0);
        assert_relative_eq!(d[(3, 4, 0)], 25.0);
        assert_relative_eq!(d[(1, 2, 2)], 9.0);
    }

    #[test]
    fn slab_pore_takes_the_largest_fitting_ball() {
        // Solid walls at i = 0 and i = 4, pore in between. The widest ball
        // centered on the mid plane has radius 2.
        let field = Volume::from_fn(5, 3, 3, |i, _, _| {
            if i == 0 || i == 4 { 1.0 } else { -1.0 }
        });
        let stats = analyze_pores(&field, 1.0).expect("pore space exists");
        assert_relative_eq!(stats.max, 4.0);
        assert_relative_eq!(stats.min, 4.0);
        assert_relative_eq!(stats.mean, 4.0);
        assert_relative_eq!(stats.median, 4.0);
    }

    #[test]
    fn thickness_scales_with_voxel_size() {
        let field = Volume::from_fn(5, 3, 3, |i, _, _| {
            if i == 0 || i == 4 { 1.0 } else { -1.0 }
        });
        let stats = analyze_pores(&field, 0.5).expect("pore space exists");
        assert_relative_eq!(stats.max, 2.0);
    }

    #[test]
    fn solid_only_field_has_no_pores() {
        let field = Volume::filled(4, 4, 4, 1.0);
        assert!(analyze_pores(&field, 1.0).is_none());
    }

    #[test]
    fn all_pore_field_has_no_reference_solid() {
        // Without any solid voxel the distance field is unbounded and no
        // finite ball is anchored; treat as degenerate.
        let field = Volume::filled(4, 4, 4, -1.0);
        assert!(analyze_pores(&field, 1.0).is_none());
    }
}
