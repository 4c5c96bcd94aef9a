//! Tetrahedron edge numbering and edge-ring traversal.
//!
//! Edge `e` of a tetrahedron is the edge shared by facets [`EDGE_FACETS`]`[e]`;
//! its endpoints are the two node slots [`EDGE_NODES`]`[e]` that neither facet
//! excludes. The same numbering indexes the six edge-constraint bits of
//! [`TetFlags`](crate::core::tet_mesh::TetFlags).
//!
//! [`edge_ring`] walks the cyclic sequence of tetrahedra sharing an edge. Edges
//! on the hull are closed through ghost tetrahedra, so every ring of a
//! well-formed mesh is a cycle.

use crate::core::cavity::CavityError;
use crate::core::collections::EdgeRingBuffer;
use crate::core::facet::HalfFace;
use crate::core::tet_mesh::{TetMesh, VertexIndex};
use crate::geometry::point::Point;

/// Facet pair sharing each edge.
pub const EDGE_FACETS: [[usize; 2]; 6] = [[0, 1], [0, 2], [0, 3], [1, 2], [1, 3], [2, 3]];

/// Node slots joined by each edge.
pub const EDGE_NODES: [[usize; 2]; 6] = [[2, 3], [1, 3], [1, 2], [0, 3], [0, 2], [0, 1]];

/// Returns the edge shared by facets `a` and `b`, or `None` when `a == b` or
/// either index is out of range.
///
/// # Examples
///
/// ```rust
/// use tetra_cavity::core::edge::{EDGE_FACETS, edge_between_facets};
///
/// for (edge, &[a, b]) in EDGE_FACETS.iter().enumerate() {
///     assert_eq!(edge_between_facets(a, b), Some(edge));
///     assert_eq!(edge_between_facets(b, a), Some(edge));
/// }
/// assert_eq!(edge_between_facets(2, 2), None);
/// ```
#[must_use]
pub const fn edge_between_facets(a: usize, b: usize) -> Option<usize> {
    let (lo, hi) = if a < b { (a, b) } else { (b, a) };
    match (lo, hi) {
        (0, 1) => Some(0),
        (0, 2) => Some(1),
        (0, 3) => Some(2),
        (1, 2) => Some(3),
        (1, 3) => Some(4),
        (2, 3) => Some(5),
        _ => None,
    }
}

/// Returns the edge joining node slots `a` and `b`.
#[must_use]
pub const fn edge_between_slots(a: usize, b: usize) -> Option<usize> {
    if a > 3 || b > 3 || a == b {
        return None;
    }
    // The edge through two slots is shared by the facets opposite the other two.
    let mut others = [0usize; 2];
    let mut n = 0;
    let mut slot = 0;
    while slot < 4 {
        if slot != a && slot != b {
            others[n] = slot;
            n += 1;
        }
        slot += 1;
    }
    edge_between_facets(others[0], others[1])
}

/// Finds the local edge of a tetrahedron joining vertices `a` and `b`.
#[must_use]
pub fn edge_with_vertices(nodes: &[VertexIndex; 4], a: VertexIndex, b: VertexIndex) -> Option<usize> {
    let sa = nodes.iter().position(|&v| v == a)?;
    let sb = nodes.iter().position(|&v| v == b)?;
    edge_between_slots(sa, sb)
}

// =============================================================================
// EDGE RINGS
// =============================================================================

/// One tetrahedron of an edge ring.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RingStep {
    tet: usize,
    edge: usize,
    apexes: [VertexIndex; 2],
}

impl RingStep {
    /// Tetrahedron index.
    #[inline]
    #[must_use]
    pub const fn tet(&self) -> usize {
        self.tet
    }

    /// Local index of the ring's edge within this tetrahedron.
    #[inline]
    #[must_use]
    pub const fn edge(&self) -> usize {
        self.edge
    }

    /// The two nodes of this tetrahedron that are not on the ring's edge.
    #[inline]
    #[must_use]
    pub const fn apexes(&self) -> [VertexIndex; 2] {
        self.apexes
    }

    /// Midpoint of the edge opposite the ring's edge, or `None` for a ghost
    /// tetrahedron.
    #[must_use]
    pub fn opposite_midpoint(&self, mesh: &TetMesh) -> Option<Point> {
        let a = mesh.point(self.apexes[0])?;
        let b = mesh.point(self.apexes[1])?;
        Some(a.midpoint(b))
    }
}

/// Walks the ring of tetrahedra around edge `edge` of tetrahedron `tet`.
///
/// The ring starts with `tet` itself and lists every tetrahedron sharing the
/// edge exactly once, in traversal order. Ghost tetrahedra are included.
///
/// # Errors
///
/// - [`CavityError::BrokenRing`] if a step lands in a tetrahedron that does not
///   contain the vertex carried over from the previous one.
/// - [`CavityError::RingNotClosed`] if the walk does not return to `tet` within
///   as many steps as the mesh has tetrahedra.
pub fn edge_ring(mesh: &TetMesh, tet: usize, edge: usize) -> Result<EdgeRingBuffer, CavityError> {
    let mut ring = EdgeRingBuffer::new();
    let [mut in_facet, mut out_facet] = EDGE_FACETS[edge];
    let limit = mesh.number_of_tetrahedra();
    let mut current = tet;

    loop {
        let nodes = mesh.nodes(current);
        let local_edge = edge_between_facets(in_facet, out_facet).ok_or(CavityError::BrokenRing {
            tet: current,
            vertex: nodes[in_facet],
        })?;
        ring.push(RingStep {
            tet: current,
            edge: local_edge,
            apexes: [nodes[in_facet], nodes[out_facet]],
        });
        if ring.len() > limit {
            return Err(CavityError::RingNotClosed {
                tet,
                edge,
                steps: ring.len(),
            });
        }

        let carried = nodes[in_facet];
        let across = mesh.neighbor(HalfFace::new(current, out_facet));
        current = across.tet();
        if current == tet {
            return Ok(ring);
        }
        in_facet = usize::from(across.facet());
        out_facet = mesh
            .nodes(current)
            .iter()
            .position(|&v| v == carried)
            .ok_or(CavityError::BrokenRing {
                tet: current,
                vertex: carried,
            })?;
    }
}
