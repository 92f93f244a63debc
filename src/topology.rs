//! Connectivity and Betti-number analysis of the voxelized solid.
//!
//! The solid phase is taken under full 26-connectivity and the background
//! under 6-connectivity, the usual complementary pairing for 3D digital
//! topology. The Euler characteristic is computed exactly as the Euler
//! characteristic of the clique complex of the 26-adjacency graph; `b1`
//! then follows from `chi = b0 - b1 + b2`.

use std::sync::OnceLock;

use tracing::debug;

use crate::float_types::Real;
use crate::volume::Volume;

/// Policy for reducing a multi-component solid to the part worth analyzing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ComponentSelection {
    /// Keep only the largest 26-connected component.
    #[default]
    Largest,
}

/// Betti numbers and derived quantities of the retained solid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TopologyStats {
    /// Number of retained connected components.
    pub b0: usize,
    /// Number of independent loops (genus count for one closed component).
    pub b1: i64,
    /// Number of enclosed cavities.
    pub b2: usize,
    /// Euler characteristic of the retained solid.
    pub chi: i64,
    /// Physical volume of the retained solid.
    pub volume: Real,
    /// Loops per unit volume.
    pub b1_density: Real,
}

impl TopologyStats {
    const fn zeroed() -> TopologyStats {
        TopologyStats {
            b0: 0,
            b1: 0,
            b2: 0,
            chi: 0,
            volume: 0.0,
            b1_density: 0.0,
        }
    }
}

/// Analyze the solid phase `(field >= 0) & mask`.
///
/// The selection policy first reduces the solid to one component; all
/// reported numbers describe the retained part. A field with no solid voxel
/// yields zeroed stats.
pub fn analyze_topology(
    field: &Volume<Real>,
    mask: &Volume<bool>,
    voxel: Real,
    selection: ComponentSelection,
) -> TopologyStats {
    let solid = field.zip_map(mask, |&v, &inside| inside && v >= 0.0);
    let solid = match selection {
        ComponentSelection::Largest => largest_component(&solid),
    };

    let count = solid.count_true();
    if count == 0 {
        return TopologyStats::zeroed();
    }

    let b0 = 1usize;
    let b2 = count_cavities(&solid);
    let chi = euler_characteristic(&solid);
    let b1 = b0 as i64 + b2 as i64 - chi;
    let volume = count as Real * voxel * voxel * voxel;

    debug!(b0, b1, b2, chi, volume, "topology analyzed");
    TopologyStats {
        b0,
        b1,
        b2,
        chi,
        volume,
        b1_density: b1 as Real / volume,
    }
}

/// Keep only the largest 26-connected component of `solid`.
fn largest_component(solid: &Volume<bool>) -> Volume<bool> {
    let (nx, ny, nz) = solid.shape();
    let mut label: Volume<u32> = Volume::filled(nx, ny, nz, 0);
    let mut next = 0u32;
    let mut sizes: Vec<usize> = Vec::new();
    let mut stack: Vec<(usize, usize, usize)> = Vec::new();

    for i in 0..nx {
        for j in 0..ny {
            for k in 0..nz {
                if !solid[(i, j, k)] || label[(i, j, k)] != 0 {
                    continue;
                }
                next += 1;
                let mut size = 0usize;
                label[(i, j, k)] = next;
                stack.push((i, j, k));
                while let Some((ci, cj, ck)) = stack.pop() {
                    size += 1;
                    for (ni, nj, nk) in neighbors26(ci, cj, ck, nx, ny, nz) {
                        if solid[(ni, nj, nk)] && label[(ni, nj, nk)] == 0 {
                            label[(ni, nj, nk)] = next;
                            stack.push((ni, nj, nk));
                        }
                    }
                }
                sizes.push(size);
            }
        }
    }

    let Some(largest) = sizes
        .iter()
        .enumerate()
        .max_by_key(|&(_, &s)| s)
        .map(|(idx, _)| idx as u32 + 1)
    else {
        return Volume::filled(nx, ny, nz, false);
    };
    label.map(|&l| l == largest)
}

/// Count 6-connected background components fully enclosed by the solid
/// (touching none of the six faces of the sample box).
fn count_cavities(solid: &Volume<bool>) -> usize {
    let (nx, ny, nz) = solid.shape();
    let mut seen: Volume<bool> = Volume::filled(nx, ny, nz, false);
    let mut stack: Vec<(usize, usize, usize)> = Vec::new();
    let mut cavities = 0usize;

    for i in 0..nx {
        for j in 0..ny {
            for k in 0..nz {
                if solid[(i, j, k)] || seen[(i, j, k)] {
                    continue;
                }
                let mut enclosed = true;
                seen[(i, j, k)] = true;
                stack.push((i, j, k));
                while let Some((ci, cj, ck)) = stack.pop() {
                    if ci == 0
                        || cj == 0
                        || ck == 0
                        || ci == nx - 1
                        || cj == ny - 1
                        || ck == nz - 1
                    {
                        enclosed = false;
                    }
                    for (ni, nj, nk) in neighbors6(ci, cj, ck, nx, ny, nz) {
                        if !solid[(ni, nj, nk)] && !seen[(ni, nj, nk)] {
                            seen[(ni, nj, nk)] = true;
                            stack.push((ni, nj, nk));
                        }
                    }
                }
                if enclosed {
                    cavities += 1;
                }
            }
        }
    }
    cavities
}

fn neighbors26(
    i: usize,
    j: usize,
    k: usize,
    nx: usize,
    ny: usize,
    nz: usize,
) -> impl Iterator<Item = (usize, usize, usize)> {
    let range = |c: usize, n: usize| c.saturating_sub(1)..(c + 2).min(n);
    range(i, nx).flat_map(move |ni| {
        range(j, ny).flat_map(move |nj| {
            range(k, nz).filter_map(move |nk| {
                if (ni, nj, nk) == (i, j, k) {
                    None
                } else {
                    Some((ni, nj, nk))
                }
            })
        })
    })
}

fn neighbors6(
    i: usize,
    j: usize,
    k: usize,
    nx: usize,
    ny: usize,
    nz: usize,
) -> impl Iterator<Item = (usize, usize, usize)> {
    let mut out: Vec<(usize, usize, usize)> = Vec::with_capacity(6);
    if i > 0 {
        out.push((i - 1, j, k));
    }
    if i + 1 < nx {
        out.push((i + 1, j, k));
    }
    if j > 0 {
        out.push((i, j - 1, k));
    }
    if j + 1 < ny {
        out.push((i, j + 1, k));
    }
    if k > 0 {
        out.push((i, j, k - 1));
    }
    if k + 1 < nz {
        out.push((i, j, k + 1));
    }
    out.into_iter()
}

/// Euler characteristic of the clique complex of the 26-adjacency graph.
///
/// A set of voxels is pairwise 26-adjacent exactly when its bounding box
/// fits in a 2x2x2 block, so the simplices of the complex are the nonempty
/// solid subsets of such blocks. Each simplex is counted once at its exact
/// bounding box: for every window shape in {1,2}^3 and every anchor, a
/// lookup table gives the signed count of solid subsets spanning that
/// window. The tables are derived by brute force over all window patterns.
fn euler_characteristic(solid: &Volume<bool>) -> i64 {
    let (nx, ny, nz) = solid.shape();
    let tables = cached_spanning_tables();
    let mut chi = 0i64;

    for sx in 1..=2usize {
        for sy in 1..=2usize {
            for sz in 1..=2usize {
                if sx > nx || sy > ny || sz > nz {
                    continue;
                }
                let table = &tables[shape_index(sx, sy, sz)];
                for i in 0..=nx - sx {
                    for j in 0..=ny - sy {
                        for k in 0..=nz - sz {
                            let mut pattern = 0usize;
                            for di in 0..sx {
                                for dj in 0..sy {
                                    for dk in 0..sz {
                                        if solid[(i + di, j + dj, k + dk)] {
                                            pattern |= 1 << ((di * sy + dj) * sz + dk);
                                        }
                                    }
                                }
                            }
                            chi += i64::from(table[pattern]);
                        }
                    }
                }
            }
        }
    }
    chi
}

const fn shape_index(sx: usize, sy: usize, sz: usize) -> usize {
    (sx - 1) * 4 + (sy - 1) * 2 + (sz - 1)
}

/// The tables depend on nothing but the window shapes; build them once.
fn cached_spanning_tables() -> &'static [[i32; 256]; 8] {
    static TABLES: OnceLock<[[i32; 256]; 8]> = OnceLock::new();
    TABLES.get_or_init(spanning_tables)
}

/// For each window shape and solid pattern, the signed number of subsets
/// spanning the full window: sum over spanning subsets S of (-1)^(|S|+1).
fn spanning_tables() -> [[i32; 256]; 8] {
    let mut tables = [[0i32; 256]; 8];
    for sx in 1..=2usize {
        for sy in 1..=2usize {
            for sz in 1..=2usize {
                let cells = sx * sy * sz;
                let table = &mut tables[shape_index(sx, sy, sz)];
                for (pattern, entry) in table.iter_mut().enumerate().take(1 << cells) {
                    let mut total = 0i32;
                    // Enumerate nonempty submasks of the pattern.
                    let mut sub = pattern;
                    while sub != 0 {
                        if spans_window(sub, sx, sy, sz) {
                            total += if sub.count_ones() % 2 == 1 { 1 } else { -1 };
                        }
                        sub = (sub - 1) & pattern;
                    }
                    *entry = total;
                }
            }
        }
    }
    tables
}

/// A subset spans the window when, along every axis of extent 2, it holds a
/// voxel in both layers.
fn spans_window(subset: usize, sx: usize, sy: usize, sz: usize) -> bool {
    let mut layer_hit = [[false; 2]; 3];
    for di in 0..sx {
        for dj in 0..sy {
            for dk in 0..sz {
                if subset & (1 << ((di * sy + dj) * sz + dk)) != 0 {
                    layer_hit[0][di] = true;
                    layer_hit[1][dj] = true;
                    layer_hit[2][dk] = true;
                }
            }
        }
    }
    (sx == 1 || (layer_hit[0][0] && layer_hit[0][1]))
        && (sy == 1 || (layer_hit[1][0] && layer_hit[1][1]))
        && (sz == 1 || (layer_hit[2][0] && layer_hit[2][1]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn analyze(solid: &Volume<bool>) -> TopologyStats {
        let field = solid.map(|&s| if s { 1.0 } else { -1.0 });
        let mask = solid.map(|_| true);
        analyze_topology(&field, &mask, 1.0, ComponentSelection::Largest)
    }

    fn from_coords(n: usize, coords: &[(usize, usize, usize)]) -> Volume<bool> {
        let mut v = Volume::filled(n, n, n, false);
        for &c in coords {
            v[c] = true;
        }
        v
    }

    #[test]
    fn empty_solid_gives_zeroed_stats() {
        let solid = Volume::filled(4, 4, 4, false);
        assert_eq!(analyze(&solid), TopologyStats::zeroed());
    }

    #[test]
    fn single_voxel() {
        let stats = analyze(&from_coords(3, &[(1, 1, 1)]));
        assert_eq!(stats.b0, 1);
        assert_eq!(stats.b1, 0);
        assert_eq!(stats.b2, 0);
        assert_eq!(stats.chi, 1);
        assert_relative_eq!(stats.volume, 1.0);
    }

    #[test]
    fn diagonal_pair_is_one_component() {
        // Body-diagonal neighbors are 26-adjacent: one contractible blob.
        let stats = analyze(&from_coords(4, &[(1, 1, 1), (2, 2, 2)]));
        assert_eq!(stats.b0, 1);
        assert_eq!(stats.chi, 1);
        assert_eq!(stats.b1, 0);
    }

    #[test]
    fn full_block_is_contractible() {
        let solid = Volume::filled(4, 4, 4, true);
        let stats = analyze(&solid);
        assert_eq!(stats.b0, 1);
        assert_eq!(stats.b1, 0);
        assert_eq!(stats.b2, 0);
        assert_eq!(stats.chi, 1);
        assert_relative_eq!(stats.volume, 64.0);
    }

    #[test]
    fn shell_encloses_one_cavity() {
        // 3x3x3 cube with the center voxel removed: topological sphere.
        let solid = Volume::from_fn(5, 5, 5, |i, j, k| {
            (1..=3).contains(&i)
                && (1..=3).contains(&j)
                && (1..=3).contains(&k)
                && (i, j, k) != (2, 2, 2)
        });
        let stats = analyze(&solid);
        assert_eq!(stats.b0, 1);
        assert_eq!(stats.b2, 1);
        assert_eq!(stats.chi, 2);
        assert_eq!(stats.b1, 0);
    }

    #[test]
    fn planar_ring_has_one_loop() {
        // 3x3 ring of voxels in one z-slice: homotopy equivalent to a
        // circle, so chi = 0 and b1 = 1.
        let solid = Volume::from_fn(5, 5, 3, |i, j, k| {
            k == 1 && (1..=3).contains(&i) && (1..=3).contains(&j) && (i, j) != (2, 2)
        });
        let field = solid.map(|&s| if s { 1.0 } else { -1.0 });
        let mask = solid.map(|_| true);
        let stats = analyze_topology(&field, &mask, 1.0, ComponentSelection::Largest);
        assert_eq!(stats.b0, 1);
        assert_eq!(stats.b2, 0);
        assert_eq!(stats.chi, 0);
        assert_eq!(stats.b1, 1);
    }

    #[test]
    fn only_the_largest_component_is_retained() {
        // A 2-voxel blob and a far-away single voxel.
        let stats = analyze(&from_coords(6, &[(0, 0, 0), (0, 0, 1), (4, 4, 4)]));
        assert_eq!(stats.b0, 1);
        assert_relative_eq!(stats.volume, 2.0);
    }

    #[test]
    fn background_touching_a_face_is_not_a_cavity() {
        // A tube open at both z faces encloses nothing.
        let solid = Volume::from_fn(3, 3, 3, |i, j, _| (i, j) != (1, 1));
        let stats = analyze(&solid);
        assert_eq!(stats.b2, 0);
        assert_eq!(stats.b1, 1, "an open tube is a loop");
    }

    #[test]
    fn mask_excludes_exterior_zeros_from_the_solid() {
        // Zero-valued voxels outside the mask must not count as solid.
        let field = Volume::filled(3, 3, 3, 0.0);
        let mask = Volume::from_fn(3, 3, 3, |i, _, _| i == 1);
        let stats = analyze_topology(&field, &mask, 1.0, ComponentSelection::Largest);
        assert_relative_eq!(stats.volume, 9.0);
        assert_eq!(stats.b0, 1);
    }

    #[test]
    fn spanning_tables_are_built_once() {
        let first = cached_spanning_tables();
        let second = cached_spanning_tables();
        assert!(std::ptr::eq(first, second));
        // Spot-check against hand-derived entries: a lone solid voxel in a
        // 1x1x1 window contributes +1; a solid 2x1x1 pair contributes the
        // edge simplex, -1.
        assert_eq!(first[shape_index(1, 1, 1)][0b1], 1);
        assert_eq!(first[shape_index(2, 1, 1)][0b11], -1);
        assert_eq!(first[shape_index(2, 1, 1)][0b01], 0);
    }

    #[test]
    fn b1_density_scales_with_voxel_size() {
        let solid = from_coords(3, &[(1, 1, 1)]);
        let field = solid.map(|&s| if s { 1.0 } else { -1.0 });
        let mask = solid.map(|_| true);
        let stats = analyze_topology(&field, &mask, 0.5, ComponentSelection::Largest);
        assert_relative_eq!(stats.volume, 0.125);
    }
}
