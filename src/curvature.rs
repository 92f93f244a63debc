//! Discrete curvature estimation on the extracted surface.
//!
//! Gaussian curvature comes from the angle deficit at each vertex over its
//! barycentric area; mean curvature from the cotangent Laplace-Beltrami
//! estimate of the mean curvature normal, signed against the area-weighted
//! vertex normal so convex regions read positive.

use nalgebra::Vector3;
use tracing::debug;

use crate::float_types::{Real, TAU};
use crate::isosurface::TriangleMesh;

/// Floor applied to barycentric vertex areas before dividing by them.
const AREA_FLOOR: Real = 1e-18;

/// Area-weighted summary of an absolute curvature distribution.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WeightedStats {
    /// Area-weighted mean.
    pub mean: Real,
    /// Area-weighted standard deviation.
    pub std_dev: Real,
    /// Area-weighted 10th percentile.
    pub p10: Real,
    /// Area-weighted median.
    pub p50: Real,
    /// Area-weighted 90th percentile.
    pub p90: Real,
}

/// Unweighted summary of the raw signed per-vertex values.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RawStats {
    /// Arithmetic mean.
    pub mean: Real,
    /// Median.
    pub median: Real,
    /// Largest value.
    pub max: Real,
    /// Smallest value.
    pub min: Real,
}

/// Curvature summaries of a triangle mesh.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CurvatureStats {
    /// Area-weighted stats of |H|.
    pub mean_curvature: WeightedStats,
    /// Area-weighted stats of |K|.
    pub gaussian_curvature: WeightedStats,
    /// Unweighted stats of the signed H values.
    pub mean_curvature_raw: RawStats,
    /// Unweighted stats of the signed K values.
    pub gaussian_curvature_raw: RawStats,
}

/// Estimate per-vertex curvatures of `mesh` and summarize them.
///
/// Vertices not referenced by any non-degenerate face carry no area and are
/// skipped. Empty meshes yield `None`.
pub fn analyze_curvature(mesh: &TriangleMesh) -> Option<CurvatureStats> {
    let (mean, gauss, areas) = vertex_curvatures(mesh)?;

    let abs_mean: Vec<Real> = mean.iter().map(|h| h.abs()).collect();
    let abs_gauss: Vec<Real> = gauss.iter().map(|k| k.abs()).collect();

    let stats = CurvatureStats {
        mean_curvature: weighted_stats(&abs_mean, &areas),
        gaussian_curvature: weighted_stats(&abs_gauss, &areas),
        mean_curvature_raw: raw_stats(&mean),
        gaussian_curvature_raw: raw_stats(&gauss),
    };
    debug!(vertices = mean.len(), "curvature analyzed");
    Some(stats)
}

/// Signed per-vertex mean and Gaussian curvature with barycentric area
/// weights, restricted to vertices touched by at least one face.
fn vertex_curvatures(mesh: &TriangleMesh) -> Option<(Vec<Real>, Vec<Real>, Vec<Real>)> {
    if mesh.is_empty() {
        return None;
    }
    let nv = mesh.vertex_count();
    let mut area = vec![0.0 as Real; nv];
    let mut normal = vec![Vector3::<Real>::zeros(); nv];
    let mut angle_sum = vec![0.0 as Real; nv];
    let mut laplacian = vec![Vector3::<Real>::zeros(); nv];

    for &[a, b, c] in &mesh.faces {
        let (pa, pb, pc) = (mesh.vertices[a], mesh.vertices[b], mesh.vertices[c]);
        let face_normal = (pb - pa).cross(&(pc - pa));
        let double_area = face_normal.norm();
        if double_area <= AREA_FLOOR {
            continue;
        }

        for v in [a, b, c] {
            area[v] += double_area / 6.0;
            normal[v] += face_normal;
        }

        // Interior angle and cotangent of the opposite edge, per corner.
        let corners = [(a, pb - pa, pc - pa), (b, pc - pb, pa - pb), (c, pa - pc, pb - pc)];
        for &(v, u, w) in &corners {
            let cos = (u.dot(&w) / (u.norm() * w.norm())).clamp(-1.0, 1.0);
            angle_sum[v] += cos.acos();
        }
        let (cot_a, cot_b, cot_c) = (
            (pb - pa).dot(&(pc - pa)) / double_area,
            (pc - pb).dot(&(pa - pb)) / double_area,
            (pa - pc).dot(&(pb - pc)) / double_area,
        );
        // cot at a corner weights the edge opposite to it.
        laplacian[b] += (pc - pb) * cot_a;
        laplacian[c] += (pb - pc) * cot_a;
        laplacian[a] += (pc - pa) * cot_b;
        laplacian[c] += (pa - pc) * cot_b;
        laplacian[a] += (pb - pa) * cot_c;
        laplacian[b] += (pa - pb) * cot_c;
    }

    let mut mean = Vec::with_capacity(nv);
    let mut gauss = Vec::with_capacity(nv);
    let mut weights = Vec::with_capacity(nv);
    for v in 0..nv {
        if area[v] <= 0.0 {
            continue;
        }
        let a = area[v].max(AREA_FLOOR);
        gauss.push((TAU - angle_sum[v]) / a);

        let delta = laplacian[v] / (2.0 * a);
        let n = normal[v].norm();
        let h = if n > AREA_FLOOR {
            -0.5 * delta.dot(&normal[v]) / n
        } else {
            0.5 * delta.norm()
        };
        mean.push(h);
        weights.push(a);
    }
    if mean.is_empty() {
        return None;
    }
    Some((mean, gauss, weights))
}

fn weighted_stats(values: &[Real], weights: &[Real]) -> WeightedStats {
    let total: Real = weights.iter().sum();
    let mean = values
        .iter()
        .zip(weights)
        .map(|(&v, &w)| v * w)
        .sum::<Real>()
        / total;
    let variance = values
        .iter()
        .zip(weights)
        .map(|(&v, &w)| w * (v - mean) * (v - mean))
        .sum::<Real>()
        / total;

    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&i, &j| values[i].total_cmp(&values[j]));
    let percentile = |p: Real| -> Real {
        let threshold = p / 100.0 * total;
        let mut cumulative = 0.0;
        for &i in &order {
            cumulative += weights[i];
            if cumulative >= threshold {
                return values[i];
            }
        }
        values[order[order.len() - 1]]
    };

    WeightedStats {
        mean,
        std_dev: variance.sqrt(),
        p10: percentile(10.0),
        p50: percentile(50.0),
        p90: percentile(90.0),
    }
}

fn raw_stats(values: &[Real]) -> RawStats {
    let mut sorted = values.to_vec();
    sorted.sort_by(Real::total_cmp);
    let n = sorted.len();
    let median = if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    };
    RawStats {
        mean: sorted.iter().sum::<Real>() / n as Real,
        median,
        max: sorted[n - 1],
        min: sorted[0],
    }
}
