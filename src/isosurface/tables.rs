//! Lookup tables for the isosurface extractor.
//!
//! # Cube topology
//!
//! ```text
//!        4──────5        Corners:
//!       /│     /│          0=(0,0,0)  1=(1,0,0)  2=(1,1,0)  3=(0,1,0)
//!      7─┼────6 │          4=(0,0,1)  5=(1,0,1)  6=(1,1,1)  7=(0,1,1)
//!      │ 0────┼─1
//!      │/     │/         +z up, +y back, +x right
//!      3──────2
//! ```
//!
//! Edges 0..3 ring the z=0 face (0-1, 1-2, 2-3, 3-0), edges 4..7 ring the
//! z=1 face (4-5, 5-6, 6-7, 7-4), edges 8..11 are the verticals (0-4, 1-5,
//! 2-6, 3-7).
//!
//! Given an 8-bit corner mask (bit set when the corner value is at or below
//! the level), `EDGE_TABLE[mask]` is a 12-bit mask of the crossed edges.
//! Triangulation is not table-driven: the extractor builds contour loops
//! from per-face segments, so `FACES` records each face as a corner cycle
//! with the edges joining consecutive corners.

/// Endpoint corner indices of the 12 cube edges.
pub const EDGE_CORNERS: [[usize; 2]; 12] = [
    [0, 1],
    [1, 2],
    [2, 3],
    [3, 0],
    [4, 5],
    [5, 6],
    [6, 7],
    [7, 4],
    [0, 4],
    [1, 5],
    [2, 6],
    [3, 7],
];

/// Offset of each corner from the cell origin, as `(dx, dy, dz)`.
pub const CORNER_OFFSETS: [(usize, usize, usize); 8] = [
    (0, 0, 0),
    (1, 0, 0),
    (1, 1, 0),
    (0, 1, 0),
    (0, 0, 1),
    (1, 0, 1),
    (1, 1, 1),
    (0, 1, 1),
];

/// The six cell faces as `(corners, edges)`: `corners` is a cyclic walk
/// around the face and `edges[i]` is the cube edge joining `corners[i]`
/// and `corners[(i + 1) % 4]`.
pub const FACES: [([usize; 4], [usize; 4]); 6] = [
    ([0, 1, 2, 3], [0, 1, 2, 3]),
    ([4, 5, 6, 7], [4, 5, 6, 7]),
    ([0, 1, 5, 4], [0, 9, 4, 8]),
    ([1, 2, 6, 5], [1, 10, 5, 9]),
    ([2, 3, 7, 6], [2, 11, 6, 10]),
    ([3, 0, 4, 7], [3, 8, 7, 11]),
];

/// Crossed-edge mask per corner configuration, generated at compile time:
/// an edge is crossed exactly when its two endpoint corners classify
/// differently.
pub const EDGE_TABLE: [u16; 256] = generate_edge_table();

const fn generate_edge_table() -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut mask = 0usize;
    while mask < 256 {
        let mut edges = 0u16;
        let mut edge = 0;
        while edge < 12 {
            let a = EDGE_CORNERS[edge][0];
            let b = EDGE_CORNERS[edge][1];
            if ((mask >> a) & 1) != ((mask >> b) & 1) {
                edges |= 1 << edge;
            }
            edge += 1;
        }
        table[mask] = edges;
        mask += 1;
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complementary_configurations_cross_the_same_edges() {
        for mask in 0..256usize {
            assert_eq!(EDGE_TABLE[mask], EDGE_TABLE[255 - mask]);
        }
    }

    #[test]
    fn corner_offsets_match_edge_endpoints() {
        // Every edge spans exactly one axis of the unit cell.
        for [a, b] in EDGE_CORNERS {
            let (ax, ay, az) = CORNER_OFFSETS[a];
            let (bx, by, bz) = CORNER_OFFSETS[b];
            let differing = usize::from(ax != bx) + usize::from(ay != by) + usize::from(az != bz);
            assert_eq!(differing, 1, "edge {a}-{b}");
        }
    }

    #[test]
    fn face_edges_join_consecutive_corners() {
        for (corners, edges) in FACES {
            for i in 0..4 {
                let want = [corners[i], corners[(i + 1) % 4]];
                let got = EDGE_CORNERS[edges[i]];
                assert!(
                    got == want || got == [want[1], want[0]],
                    "face {corners:?} edge {i}"
                );
            }
        }
    }

    #[test]
    fn every_edge_lies_on_exactly_two_faces() {
        let mut counts = [0usize; 12];
        for (_, edges) in FACES {
            for e in edges {
                counts[e] += 1;
            }
        }
        assert_eq!(counts, [2; 12]);
    }
}
