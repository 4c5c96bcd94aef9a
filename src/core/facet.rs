//! Tetrahedron facets and half-face references.
//!
//! Facet `i` of a tetrahedron is the triangle opposite node `i`. A facet is
//! addressed from a particular side by a [`HalfFace`], which packs the owning
//! tetrahedron index and the local facet index as `4 * tet + facet`. Every
//! half-face of a closed [`TetMesh`](crate::core::tet_mesh::TetMesh) has exactly
//! one twin, reachable through
//! [`TetMesh::neighbor`](crate::core::tet_mesh::TetMesh::neighbor).
//!
//! # Local numbering
//!
//! The node order of each facet is fixed by [`FACET_NODES`]: seen from inside
//! the owning tetrahedron the triangle is oriented so that
//! `orient3d(opposite, a, b, c) > 0`. Cavity boundary faces reuse that order, so
//! a point on the cavity side of a face yields a negative orientation.
//!
//! # Examples
//!
//! ```rust
//! use tetra_cavity::core::facet::HalfFace;
//!
//! let hf = HalfFace::new(10, 3);
//! assert_eq!(hf.raw(), 43);
//! assert_eq!(hf.tet(), 10);
//! assert_eq!(hf.facet(), 3);
//! ```

// =============================================================================
// IMPORTS
// =============================================================================

use crate::core::collections::FacetIndex;
use crate::core::tet_mesh::{TetFlags, VertexIndex};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// LOCAL NUMBERING TABLES
// =============================================================================

/// Node slots of each facet, in the order seen from inside the tetrahedron.
pub const FACET_NODES: [[usize; 3]; 4] = [[2, 1, 3], [0, 2, 3], [1, 0, 3], [0, 1, 2]];

/// Tetrahedron edges carried by each facet, listed by face-local edge.
///
/// Face-local edge `i` is the edge opposite face node `i`. Entry `[f][i]` is
/// the tetrahedron edge (see [`EDGE_NODES`](crate::core::edge::EDGE_NODES))
/// that becomes local edge `i` when facet `f` turns into a cavity boundary face.
pub const FACET_EDGES: [[usize; 3]; 4] = [[1, 0, 2], [0, 3, 4], [3, 1, 5], [2, 4, 5]];

// =============================================================================
// HALF-FACE REFERENCE
// =============================================================================

/// Reference to one side of a facet: `4 * tet + facet`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HalfFace(u64);

impl HalfFace {
    /// Creates the half-face of facet `facet` of tetrahedron `tet`.
    ///
    /// `facet` must be below 4; only the two low bits are kept.
    #[inline]
    #[must_use]
    pub const fn new(tet: usize, facet: usize) -> Self {
        Self(((tet as u64) << 2) | (facet as u64 & 3))
    }

    /// Returns the packed value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Index of the owning tetrahedron.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn tet(self) -> usize {
        (self.0 >> 2) as usize
    }

    /// Local facet index within the owning tetrahedron.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn facet(self) -> FacetIndex {
        (self.0 & 3) as FacetIndex
    }
}

impl fmt::Display for HalfFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.tet(), self.facet())
    }
}

/// Returns the nodes of facet `facet` of a tetrahedron, in [`FACET_NODES`] order.
#[inline]
#[must_use]
pub const fn facet_nodes(nodes: &[VertexIndex; 4], facet: usize) -> [VertexIndex; 3] {
    let slots = FACET_NODES[facet];
    [nodes[slots[0]], nodes[slots[1]], nodes[slots[2]]]
}

// =============================================================================
// FACE CONSTRAINTS
// =============================================================================

bitflags! {
    /// Constraint bits of a cavity boundary face, in face-local numbering.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct FaceConstraints: u8 {
        /// Local edge 0 (opposite face node 0) is constrained.
        const EDGE_0 = 1;
        /// Local edge 1 (opposite face node 1) is constrained.
        const EDGE_1 = 1 << 1;
        /// Local edge 2 (opposite face node 2) is constrained.
        const EDGE_2 = 1 << 2;
        /// The face itself is constrained.
        const FACET = 1 << 3;
    }
}

impl FaceConstraints {
    /// Converts the constraint bits of facet `facet` of a tetrahedron into
    /// face-local bits using [`FACET_EDGES`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tetra_cavity::core::facet::FaceConstraints;
    /// use tetra_cavity::core::tet_mesh::TetFlags;
    ///
    /// // Tetrahedron edge 3 joins nodes 0 and 3; on facet 1 it is local edge 1.
    /// let flags = TetFlags::edge(3) | TetFlags::facet(1);
    /// let face = FaceConstraints::from_tetrahedron(flags, 1);
    /// assert_eq!(face, FaceConstraints::EDGE_1 | FaceConstraints::FACET);
    ///
    /// // Facet 0 does not contain edge 3.
    /// assert!(FaceConstraints::from_tetrahedron(flags, 0).is_empty());
    /// ```
    #[must_use]
    pub fn from_tetrahedron(flags: TetFlags, facet: usize) -> Self {
        let mut face = Self::empty();
        for (local, &edge) in FACET_EDGES[facet].iter().enumerate() {
            if flags.contains(TetFlags::edge(edge)) {
                face |= Self::edge(local);
            }
        }
        if flags.contains(TetFlags::facet(facet)) {
            face |= Self::FACET;
        }
        face
    }

    /// Flag of face-local edge `local` (0..3).
    #[inline]
    #[must_use]
    pub const fn edge(local: usize) -> Self {
        Self::from_bits_truncate(1 << (local & 3))
    }
}

// =============================================================================
// TESTS
// =============================================================================
