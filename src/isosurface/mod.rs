//! Zero-level isosurface extraction, plus the winding repair pass that
//! leaves every closed component outward-oriented.
//!
//! The extractor follows the sign convention of the masked field: a voxel is
//! solid when its value is strictly positive, so corners at or below zero
//! count as outside. Exterior voxels are exactly zero, which places boundary
//! vertices exactly on the domain edge instead of halfway into the exterior.
//!
//! Triangulation is not driven by a fixed 256-case table. Each cell face
//! contributes contour segments, with the bilinear saddle value (the
//! asymptotic decider) resolving faces where both diagonals share a sign
//! class; the segments close into loops, each capped with triangles, except
//! that a two-loop cell whose interior carries a tunnel is bridged with a
//! tube instead. Because every face
//! decision depends only on the values of that face, adjacent cells always
//! agree and the mesh is crack-free.

pub mod tables;

use std::collections::{HashMap, HashSet, VecDeque};

use nalgebra::Point3;
use tracing::debug;

use self::tables::{CORNER_OFFSETS, EDGE_CORNERS, EDGE_TABLE, FACES};
use crate::float_types::Real;
use crate::volume::Volume;

/// An indexed triangle soup in lattice coordinates scaled by the voxel
/// spacing: vertex components run from 0 to the domain edge length.
#[derive(Clone, Debug, Default)]
pub struct TriangleMesh {
    /// Deduplicated vertex positions.
    pub vertices: Vec<Point3<Real>>,
    /// Counter-clockwise-from-outside triangles, as vertex indices.
    pub faces: Vec<[usize; 3]>,
}

impl TriangleMesh {
    /// `true` when the mesh holds no triangles.
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of triangles.
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// `true` when every face references only existing vertices.
    pub fn is_index_valid(&self) -> bool {
        self.faces
            .iter()
            .all(|face| face.iter().all(|&v| v < self.vertices.len()))
    }

    /// Signed volume enclosed by the mesh, by the divergence theorem.
    /// Positive for closed, outward-oriented surfaces.
    pub fn signed_volume(&self) -> Real {
        self.faces
            .iter()
            .map(|&[a, b, c]| {
                let (v0, v1, v2) = (
                    self.vertices[a].coords,
                    self.vertices[b].coords,
                    self.vertices[c].coords,
                );
                v0.dot(&v1.cross(&v2)) / 6.0
            })
            .sum()
    }

    /// Total surface area.
    pub fn surface_area(&self) -> Real {
        self.faces
            .iter()
            .map(|&[a, b, c]| {
                let e1 = self.vertices[b] - self.vertices[a];
                let e2 = self.vertices[c] - self.vertices[a];
                e1.cross(&e2).norm() / 2.0
            })
            .sum()
    }
}

/// Key of a shared cell edge: lattice coordinates of the lower endpoint and
/// the axis the edge runs along (0 = x, 1 = y, 2 = z).
type EdgeKey = (usize, usize, usize, u8);

fn edge_key(i: usize, j: usize, k: usize, edge: usize) -> EdgeKey {
    let [a, b] = EDGE_CORNERS[edge];
    let (ax, ay, az) = CORNER_OFFSETS[a];
    let (bx, by, bz) = CORNER_OFFSETS[b];
    let axis = if ax != bx {
        0
    } else if ay != by {
        1
    } else {
        2
    };
    (i + ax.min(bx), j + ay.min(by), k + az.min(bz), axis)
}

/// Interpolation samples per axis for the tunnel test. Values that flip the
/// decision between this and a finer grid sit on razor-thin channels where
/// either patch topology is defensible.
const TUNNEL_SAMPLES: usize = 33;

/// March over every cell of `field` and triangulate the zero level set.
///
/// Vertices shared between cells are emitted once, keyed by the lattice edge
/// they sit on; loop caps and tube interiors add cell-local vertices. The
/// returned mesh has consistent outward winding on every closed component.
pub fn extract_isosurface(field: &Volume<Real>, spacing: Real) -> TriangleMesh {
    let (nx, ny, nz) = field.shape();
    let mut vertices: Vec<Point3<Real>> = Vec::new();
    let mut faces: Vec<[usize; 3]> = Vec::new();
    let mut edge_vertices: HashMap<EdgeKey, usize> = HashMap::new();

    if nx < 2 || ny < 2 || nz < 2 {
        return TriangleMesh::default();
    }

    for i in 0..nx - 1 {
        for j in 0..ny - 1 {
            for k in 0..nz - 1 {
                let corner_values: [Real; 8] = std::array::from_fn(|c| {
                    let (dx, dy, dz) = CORNER_OFFSETS[c];
                    field[(i + dx, j + dy, k + dz)]
                });

                let mut config = 0usize;
                for (c, &v) in corner_values.iter().enumerate() {
                    if v <= 0.0 {
                        config |= 1 << c;
                    }
                }
                if EDGE_TABLE[config] == 0 {
                    continue;
                }

                let loops = cell_loops(&corner_values);
                let vertex_loops: Vec<Vec<usize>> = loops
                    .iter()
                    .map(|cell_loop| {
                        cell_loop
                            .iter()
                            .map(|&edge| {
                                vertex_on_edge(
                                    i,
                                    j,
                                    k,
                                    edge,
                                    &corner_values,
                                    spacing,
                                    &mut vertices,
                                    &mut edge_vertices,
                                )
                            })
                            .collect()
                    })
                    .collect();

                if vertex_loops.len() == 2 && interior_connected(&corner_values) {
                    zip_loops(&vertex_loops[0], &vertex_loops[1], &mut vertices, &mut faces);
                } else {
                    for ring in &vertex_loops {
                        cap_loop(ring, &mut vertices, &mut faces);
                    }
                }
            }
        }
    }

    let mut mesh = TriangleMesh { vertices, faces };
    fix_winding(&mut mesh);
    debug!(
        vertices = mesh.vertex_count(),
        faces = mesh.face_count(),
        "isosurface extracted"
    );
    mesh
}

/// Contour segments of one face, as pairs of crossed cube-edge indices.
///
/// Two crossings join directly. Four crossings mean both diagonals share a
/// sign class; the saddle value of the face bilinear decides which diagonal
/// the contour connects, so the two segments wrap the separated corners.
fn face_segments(
    values: &[Real; 8],
    corners: &[usize; 4],
    edges: &[usize; 4],
    out: &mut Vec<(usize, usize)>,
) {
    let outside = |c: usize| values[c] <= 0.0;
    let mut crossed = [0usize; 4];
    let mut count = 0;
    for i in 0..4 {
        if outside(corners[i]) != outside(corners[(i + 1) % 4]) {
            crossed[count] = edges[i];
            count += 1;
        }
    }
    match count {
        0 => {},
        2 => out.push((crossed[0], crossed[1])),
        _ => {
            let (va, vb, vc, vd) = (
                values[corners[0]],
                values[corners[1]],
                values[corners[2]],
                values[corners[3]],
            );
            // Saddle value of the bilinear is (va*vc - vb*vd) over
            // (va + vc - vb - vd); the denominator always carries the sign
            // of the positive diagonal pair, so the test reduces to the
            // numerator.
            let saddle_numerator = va * vc - vb * vd;
            let positive_at_even = !outside(corners[0]);
            let positive_connected = if positive_at_even {
                saddle_numerator > 0.0
            } else {
                saddle_numerator < 0.0
            };
            let separated = if positive_connected == positive_at_even {
                [1, 3]
            } else {
                [0, 2]
            };
            for p in separated {
                out.push((edges[(p + 3) % 4], edges[p]));
            }
        },
    }
}

/// Trace the contour loops of one cell as cycles of crossed-edge indices.
///
/// Every crossed cube edge lies on exactly two faces and each face
/// contributes one segment endpoint there, so the segment graph is
/// 2-regular and decomposes into disjoint cycles of length at least 3.
fn cell_loops(values: &[Real; 8]) -> Vec<Vec<usize>> {
    let mut segments: Vec<(usize, usize)> = Vec::with_capacity(12);
    for (corners, edges) in &FACES {
        face_segments(values, corners, edges, &mut segments);
    }

    let mut adjacent = [[usize::MAX; 2]; 12];
    let mut degree = [0usize; 12];
    for &(a, b) in &segments {
        adjacent[a][degree[a]] = b;
        degree[a] += 1;
        adjacent[b][degree[b]] = a;
        degree[b] += 1;
    }

    let mut visited = [false; 12];
    let mut loops = Vec::new();
    for start in 0..12 {
        if degree[start] == 0 || visited[start] {
            continue;
        }
        visited[start] = true;
        let mut cycle = vec![start];
        let mut previous = start;
        let mut current = adjacent[start][0];
        while current != start {
            visited[current] = true;
            cycle.push(current);
            let next = if adjacent[current][0] == previous {
                adjacent[current][1]
            } else {
                adjacent[current][0]
            };
            previous = current;
            current = next;
        }
        loops.push(cycle);
    }
    loops
}

/// `true` when both sign classes of the cell's trilinear interpolant are
/// connected over the closed cell, i.e. a two-loop cell carries a tunnel.
///
/// The supersample includes the cell boundary so sign slivers hugging a
/// corner are never missed.
fn interior_connected(values: &[Real; 8]) -> bool {
    let n = TUNNEL_SAMPLES;
    let step = 1.0 / (n - 1) as Real;
    let mut solid = vec![false; n * n * n];
    let mut index = 0;
    for i in 0..n {
        let x = i as Real * step;
        let c00 = values[0] + (values[1] - values[0]) * x;
        let c10 = values[3] + (values[2] - values[3]) * x;
        let c01 = values[4] + (values[5] - values[4]) * x;
        let c11 = values[7] + (values[6] - values[7]) * x;
        for j in 0..n {
            let y = j as Real * step;
            let lo = c00 + (c10 - c00) * y;
            let hi = c01 + (c11 - c01) * y;
            for k in 0..n {
                let z = k as Real * step;
                solid[index] = lo + (hi - lo) * z > 0.0;
                index += 1;
            }
        }
    }
    single_component(&solid, n, true) && single_component(&solid, n, false)
}

/// `true` when the voxels of `solid` equal to `target` form exactly one
/// 6-connected component.
fn single_component(solid: &[bool], n: usize, target: bool) -> bool {
    let mut seen = vec![false; solid.len()];
    let mut stack: Vec<usize> = Vec::new();
    let mut components = 0usize;
    for start in 0..solid.len() {
        if solid[start] != target || seen[start] {
            continue;
        }
        components += 1;
        if components > 1 {
            return false;
        }
        seen[start] = true;
        stack.push(start);
        while let Some(cur) = stack.pop() {
            let i = cur / (n * n);
            let j = (cur / n) % n;
            let k = cur % n;
            let neighbors = [
                (i > 0, cur.wrapping_sub(n * n)),
                (i + 1 < n, cur + n * n),
                (j > 0, cur.wrapping_sub(n)),
                (j + 1 < n, cur + n),
                (k > 0, cur.wrapping_sub(1)),
                (k + 1 < n, cur + 1),
            ];
            for (in_range, next) in neighbors {
                if in_range && solid[next] == target && !seen[next] {
                    seen[next] = true;
                    stack.push(next);
                }
            }
        }
    }
    components == 1
}

/// Vertex index on a crossed cube edge, deduplicated across cells.
#[allow(clippy::too_many_arguments)]
fn vertex_on_edge(
    i: usize,
    j: usize,
    k: usize,
    edge: usize,
    values: &[Real; 8],
    spacing: Real,
    vertices: &mut Vec<Point3<Real>>,
    edge_vertices: &mut HashMap<EdgeKey, usize>,
) -> usize {
    let key = edge_key(i, j, k, edge);
    if let Some(&index) = edge_vertices.get(&key) {
        return index;
    }
    let [a, b] = EDGE_CORNERS[edge];
    let (va, vb) = (values[a], values[b]);
    // Crossed edges have va != vb by construction.
    let t = va / (va - vb);
    let (ax, ay, az) = CORNER_OFFSETS[a];
    let (bx, by, bz) = CORNER_OFFSETS[b];
    let point = Point3::new(
        ((i + ax) as Real + t * (bx as Real - ax as Real)) * spacing,
        ((j + ay) as Real + t * (by as Real - ay as Real)) * spacing,
        ((k + az) as Real + t * (bz as Real - az as Real)) * spacing,
    );
    vertices.push(point);
    let index = vertices.len() - 1;
    edge_vertices.insert(key, index);
    index
}

/// Triangulate one contour loop: a triangle directly, larger rings as a fan
/// around a fresh centroid vertex so no interior edge can collide with a
/// neighboring cell's triangulation.
fn cap_loop(ring: &[usize], vertices: &mut Vec<Point3<Real>>, faces: &mut Vec<[usize; 3]>) {
    if ring.len() == 3 {
        faces.push([ring[0], ring[1], ring[2]]);
        return;
    }
    let mut centroid = Point3::origin();
    for &v in ring {
        centroid += vertices[v].coords;
    }
    let centroid = Point3::from(centroid.coords / ring.len() as Real);
    vertices.push(centroid);
    let center = vertices.len() - 1;
    for m in 0..ring.len() {
        faces.push([ring[m], ring[(m + 1) % ring.len()], center]);
    }
}

/// Midpoint vertex of two existing vertices, deduplicated per tube.
fn midpoint(
    u: usize,
    v: usize,
    vertices: &mut Vec<Point3<Real>>,
    cache: &mut HashMap<(usize, usize), usize>,
) -> usize {
    let key = (u.min(v), u.max(v));
    if let Some(&index) = cache.get(&key) {
        return index;
    }
    let mid = Point3::from((vertices[u].coords + vertices[v].coords) / 2.0);
    vertices.push(mid);
    let index = vertices.len() - 1;
    cache.insert(key, index);
    index
}

/// Bridge the two contour loops of a tunnel cell with a triangle tube.
///
/// A greedy zipper walks both rings at once, advancing whichever side makes
/// the shorter bridging diagonal. Two guards keep the tube a combinatorial
/// annulus: a move may not recreate a diagonal already in the strip (the
/// wrapped index pair repeats when one ring laps the other while it stands
/// still), and every diagonal is split at a fresh midpoint vertex so no tube
/// edge can coincide with an edge emitted by a neighboring cell.
fn zip_loops(
    ring_a: &[usize],
    ring_b: &[usize],
    vertices: &mut Vec<Point3<Real>>,
    faces: &mut Vec<[usize; 3]>,
) {
    let p = ring_a.len();
    let q = ring_b.len();

    // Align ring_b's start and direction with ring_a.
    let mut start = 0;
    for j in 1..q {
        if (vertices[ring_a[0]] - vertices[ring_b[j]]).norm()
            < (vertices[ring_a[0]] - vertices[ring_b[start]]).norm()
        {
            start = j;
        }
    }
    let forward = (vertices[ring_a[1]] - vertices[ring_b[(start + 1) % q]]).norm();
    let backward = (vertices[ring_a[1]] - vertices[ring_b[(start + q - 1) % q]]).norm();
    let ring_b: Vec<usize> = (0..q)
        .map(|m| {
            if backward < forward {
                ring_b[(start + q - m) % q]
            } else {
                ring_b[(start + m) % q]
            }
        })
        .collect();

    let mut midpoints: HashMap<(usize, usize), usize> = HashMap::new();
    let mut seen: HashSet<(usize, usize)> = HashSet::new();
    seen.insert((0, 0));
    let mut i = 0usize;
    let mut j = 0usize;
    while i < p || j < q {
        let (ai, an) = (ring_a[i % p], ring_a[(i + 1) % p]);
        let (bj, bn) = (ring_b[j % q], ring_b[(j + 1) % q]);
        let duplicate =
            |ni: usize, nj: usize| (ni, nj) != (p, q) && seen.contains(&(ni % p, nj % q));
        let mut take_a = i < p
            && (j == q
                || (vertices[an] - vertices[bj]).norm() <= (vertices[ai] - vertices[bn]).norm());
        if take_a && duplicate(i + 1, j) {
            take_a = false;
        } else if !take_a && duplicate(i, j + 1) {
            take_a = true;
        }
        let (s, t, apex) = if take_a {
            i += 1;
            (ai, an, bj)
        } else {
            j += 1;
            (bj, bn, ai)
        };
        seen.insert((i % p, j % q));
        let m0 = midpoint(s, apex, vertices, &mut midpoints);
        let m1 = midpoint(t, apex, vertices, &mut midpoints);
        faces.push([s, t, m1]);
        faces.push([s, m1, m0]);
        faces.push([m0, m1, apex]);
    }
}

/// `true` when `face` traverses the directed edge `a -> b`.
fn traverses(face: &[usize; 3], a: usize, b: usize) -> bool {
    (face[0] == a && face[1] == b)
        || (face[1] == a && face[2] == b)
        || (face[2] == a && face[0] == b)
}

/// Make winding consistent across each edge-connected component, then flip
/// whole components whose signed volume is negative so closed surfaces end
/// up outward-oriented.
///
/// Orientation is only propagated across edges shared by exactly two faces;
/// non-manifold junctions are left alone.
fn fix_winding(mesh: &mut TriangleMesh) {
    let mut edge_faces: HashMap<(usize, usize), Vec<usize>> = HashMap::new();
    for (fi, face) in mesh.faces.iter().enumerate() {
        for e in 0..3 {
            let (a, b) = (face[e], face[(e + 1) % 3]);
            edge_faces.entry((a.min(b), a.max(b))).or_default().push(fi);
        }
    }

    let mut visited = vec![false; mesh.faces.len()];
    let mut queue = VecDeque::new();

    for seed in 0..mesh.faces.len() {
        if visited[seed] {
            continue;
        }
        visited[seed] = true;
        queue.push_back(seed);
        let mut component = vec![seed];

        while let Some(fi) = queue.pop_front() {
            let face = mesh.faces[fi];
            for e in 0..3 {
                let (a, b) = (face[e], face[(e + 1) % 3]);
                let adjacent = &edge_faces[&(a.min(b), a.max(b))];
                if adjacent.len() != 2 {
                    continue;
                }
                for &nf in adjacent {
                    if visited[nf] {
                        continue;
                    }
                    // Neighbors must traverse the shared edge in opposite
                    // directions; a neighbor walking a -> b like us is
                    // wound the wrong way.
                    if traverses(&mesh.faces[nf], a, b) {
                        mesh.faces[nf].swap(1, 2);
                    }
                    visited[nf] = true;
                    component.push(nf);
                    queue.push_back(nf);
                }
            }
        }

        let volume: Real = component
            .iter()
            .map(|&fi| {
                let [a, b, c] = mesh.faces[fi];
                let (v0, v1, v2) = (
                    mesh.vertices[a].coords,
                    mesh.vertices[b].coords,
                    mesh.vertices[c].coords,
                );
                v0.dot(&v1.cross(&v2)) / 6.0
            })
            .sum();
        if volume < 0.0 {
            for &fi in &component {
                mesh.faces[fi].swap(1, 2);
            }
        }
    }
}
