//! Flat-array tetrahedral mesh store with half-face adjacency.
//!
//! [`TetMesh`] keeps one entry per tetrahedron in parallel arrays: four node
//! indices, four neighbor [`HalfFace`]s (the neighbor across facet `i` is the
//! one opposite node `i`), a [`TetFlags`] word and a color tag. Vertices are
//! plain [`Point`]s addressed by [`VertexIndex`].
//!
//! # Ghost tetrahedra
//!
//! The hull is closed by ghost tetrahedra `[p, r, q, GHOST_VERTEX]`, one per
//! hull triangle, so every half-face has a twin and every edge ring is a cycle.
//! Facet 3 of a ghost is the real hull triangle seen from outside; facets 0-2
//! join the ghosts around the hull.
//!
//! # Orientation
//!
//! Every real tetrahedron `(n0, n1, n2, n3)` satisfies
//! `orient3d(n0, n1, n2, n3) < 0`. [`TetMesh::from_tetrahedra`] reorders
//! positively oriented input and rejects flat tetrahedra.
//!
//! # Examples
//!
//! ```rust
//! use tetra_cavity::core::tet_mesh::TetMesh;
//! use tetra_cavity::geometry::point::Point;
//!
//! let points = vec![
//!     Point::new([0.0, 0.0, 0.0]),
//!     Point::new([1.0, 0.0, 0.0]),
//!     Point::new([0.0, 1.0, 0.0]),
//!     Point::new([0.0, 0.0, 1.0]),
//! ];
//! let mesh = TetMesh::from_tetrahedra(points, &[[0, 1, 2, 3]]).unwrap();
//!
//! // One real tetrahedron plus one ghost per hull triangle.
//! assert_eq!(mesh.number_of_tetrahedra(), 5);
//! assert_eq!(mesh.real_tetrahedra().count(), 1);
//! assert!(mesh.validate().is_ok());
//! ```

#![forbid(unsafe_code)]

// =============================================================================
// IMPORTS
// =============================================================================

use crate::core::collections::{Entry, FastHashMap, FastHashSet};
use crate::core::edge::edge_with_vertices;
use crate::core::facet::{HalfFace, facet_nodes};
use crate::geometry::point::{Point, PointValidationError};
use crate::geometry::predicates::{Orientation, orientation};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// TYPES
// =============================================================================

/// Index of a vertex in a [`TetMesh`].
pub type VertexIndex = u32;

/// Sentinel standing for the vertex at infinity.
pub const GHOST_VERTEX: VertexIndex = VertexIndex::MAX;

bitflags! {
    /// Per-tetrahedron flag word: edge constraints, facet constraints and the
    /// deleted bit.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct TetFlags: u16 {
        /// Edge 0 is constrained.
        const EDGE_0 = 1;
        /// Edge 1 is constrained.
        const EDGE_1 = 1 << 1;
        /// Edge 2 is constrained.
        const EDGE_2 = 1 << 2;
        /// Edge 3 is constrained.
        const EDGE_3 = 1 << 3;
        /// Edge 4 is constrained.
        const EDGE_4 = 1 << 4;
        /// Edge 5 is constrained.
        const EDGE_5 = 1 << 5;
        /// Facet 0 is constrained.
        const FACET_0 = 1 << 8;
        /// Facet 1 is constrained.
        const FACET_1 = 1 << 9;
        /// Facet 2 is constrained.
        const FACET_2 = 1 << 10;
        /// Facet 3 is constrained.
        const FACET_3 = 1 << 11;
        /// The tetrahedron belongs to a cavity.
        const DELETED = 1 << 12;
    }
}

impl TetFlags {
    /// All six edge-constraint bits.
    pub const EDGES: Self = Self::from_bits_truncate(0x3F);

    /// Constraint bit of local edge `edge` (0..6).
    #[inline]
    #[must_use]
    pub const fn edge(edge: usize) -> Self {
        Self::from_bits_truncate(1 << (edge % 6))
    }

    /// Constraint bit of local facet `facet` (0..4).
    #[inline]
    #[must_use]
    pub const fn facet(facet: usize) -> Self {
        Self::from_bits_truncate(1 << (8 + (facet & 3)))
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors raised while building, editing or validating a [`TetMesh`].
#[derive(Clone, Debug, Error, PartialEq)]
pub enum MeshError {
    /// A vertex position is not finite.
    #[error("Vertex {vertex} is invalid: {source}")]
    InvalidPoint {
        /// Offending vertex index.
        vertex: usize,
        /// Underlying coordinate error.
        source: PointValidationError,
    },
    /// The mesh cannot address this many vertices.
    #[error("Too many vertices: {count} exceeds the addressable range")]
    TooManyVertices {
        /// Number of vertices requested.
        count: usize,
    },
    /// A tetrahedron references a vertex that does not exist.
    #[error("Tetrahedron {tet} references vertex {vertex}, but only {vertex_count} exist")]
    VertexOutOfRange {
        /// Input tetrahedron index.
        tet: usize,
        /// Offending vertex index.
        vertex: VertexIndex,
        /// Number of vertices in the mesh.
        vertex_count: usize,
    },
    /// A tetrahedron repeats a vertex.
    #[error("Tetrahedron {tet} repeats a vertex: {nodes:?}")]
    RepeatedVertex {
        /// Input tetrahedron index.
        tet: usize,
        /// Its nodes.
        nodes: [VertexIndex; 4],
    },
    /// A tetrahedron has zero volume.
    #[error("Tetrahedron {tet} is flat: {nodes:?}")]
    DegenerateTetrahedron {
        /// Input tetrahedron index.
        tet: usize,
        /// Its nodes.
        nodes: [VertexIndex; 4],
    },
    /// A triangle is shared by more than two tetrahedra.
    #[error("Triangle {nodes:?} is shared by more than two tetrahedra")]
    NonManifoldFacet {
        /// Sorted triangle nodes.
        nodes: [VertexIndex; 3],
    },
    /// A hull edge is shared by more than two hull triangles.
    #[error("Hull edge {nodes:?} is shared by more than two hull triangles")]
    NonManifoldHullEdge {
        /// Sorted edge endpoints.
        nodes: [VertexIndex; 2],
    },
    /// A hull edge belongs to a single hull triangle.
    #[error("Hull edge {nodes:?} is not closed")]
    OpenHullEdge {
        /// Sorted edge endpoints.
        nodes: [VertexIndex; 2],
    },
    /// Adjacency is not symmetric or does not describe a shared triangle.
    #[error("Broken adjacency at half-face {half_face}: {message}")]
    BrokenAdjacency {
        /// Half-face where the problem was found.
        half_face: HalfFace,
        /// Description of the problem.
        message: String,
    },
    /// Two neighbors lie on the same side of their shared triangle.
    #[error("Tetrahedra {tet} and {neighbor} overlap across their shared triangle")]
    FoldedFacet {
        /// First tetrahedron.
        tet: usize,
        /// Neighbor across the shared triangle.
        neighbor: usize,
    },
    /// No tetrahedron contains the requested edge.
    #[error("No tetrahedron contains edge ({a}, {b})")]
    EdgeNotFound {
        /// First endpoint.
        a: VertexIndex,
        /// Second endpoint.
        b: VertexIndex,
    },
    /// No tetrahedron contains the requested triangle.
    #[error("No tetrahedron contains triangle ({a}, {b}, {c})")]
    FacetNotFound {
        /// First node.
        a: VertexIndex,
        /// Second node.
        b: VertexIndex,
        /// Third node.
        c: VertexIndex,
    },
}

// =============================================================================
// MESH STORE
// =============================================================================

/// Tetrahedral mesh stored as parallel flat arrays.
///
/// Deserialized meshes are not checked; call [`TetMesh::validate`] on
/// untrusted input.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TetMesh {
    vertices: Vec<Point>,
    nodes: Vec<[VertexIndex; 4]>,
    neighbors: Vec<[HalfFace; 4]>,
    flags: Vec<TetFlags>,
    colors: Vec<u16>,
}

#[inline]
const fn slot(vertex: VertexIndex) -> usize {
    vertex as usize
}

fn sorted3(mut face: [VertexIndex; 3]) -> [VertexIndex; 3] {
    face.sort_unstable();
    face
}

impl TetMesh {
    /// Builds a closed mesh from vertex positions and tetrahedra.
    ///
    /// Tetrahedra may be given in either orientation; positively oriented ones
    /// have their last two nodes swapped. Adjacency is derived from shared
    /// triangles and the hull is closed with ghost tetrahedra, which are
    /// appended after the input tetrahedra (input tetrahedron `i` keeps index `i`).
    ///
    /// # Errors
    ///
    /// Returns a [`MeshError`] for non-finite points, out-of-range or repeated
    /// vertices, flat tetrahedra, and non-manifold input.
    pub fn from_tetrahedra(
        vertices: Vec<Point>,
        tetrahedra: &[[VertexIndex; 4]],
    ) -> Result<Self, MeshError> {
        if vertices.len() >= slot(GHOST_VERTEX) {
            return Err(MeshError::TooManyVertices {
                count: vertices.len(),
            });
        }
        for (vertex, point) in vertices.iter().enumerate() {
            point
                .validate()
                .map_err(|source| MeshError::InvalidPoint { vertex, source })?;
        }

        let mut mesh = Self {
            vertices,
            ..Self::default()
        };

        for (tet, &input) in tetrahedra.iter().enumerate() {
            let oriented = mesh.orient_input(tet, input)?;
            mesh.push_tetrahedron(oriented);
        }

        let hull = mesh.link_real_facets()?;
        mesh.close_hull(hull)?;

        tracing::debug!(
            vertices = mesh.number_of_vertices(),
            tetrahedra = tetrahedra.len(),
            ghosts = mesh.number_of_tetrahedra() - tetrahedra.len(),
            "built tetrahedral mesh"
        );
        Ok(mesh)
    }

    fn orient_input(
        &self,
        tet: usize,
        mut nodes: [VertexIndex; 4],
    ) -> Result<[VertexIndex; 4], MeshError> {
        for &vertex in &nodes {
            if slot(vertex) >= self.vertices.len() {
                return Err(MeshError::VertexOutOfRange {
                    tet,
                    vertex,
                    vertex_count: self.vertices.len(),
                });
            }
        }
        for i in 0..4 {
            if nodes[i + 1..].contains(&nodes[i]) {
                return Err(MeshError::RepeatedVertex { tet, nodes });
            }
        }
        let [a, b, c, d] = nodes.map(|v| &self.vertices[slot(v)]);
        match orientation(a, b, c, d) {
            Orientation::NEGATIVE => {}
            Orientation::POSITIVE => nodes.swap(2, 3),
            Orientation::DEGENERATE => {
                return Err(MeshError::DegenerateTetrahedron { tet, nodes });
            }
        }
        Ok(nodes)
    }

    fn push_tetrahedron(&mut self, nodes: [VertexIndex; 4]) -> usize {
        let tet = self.nodes.len();
        self.nodes.push(nodes);
        self.neighbors.push([HalfFace::default(); 4]);
        self.flags.push(TetFlags::empty());
        self.colors.push(0);
        tet
    }

    /// Pairs the facets of real tetrahedra and returns the hull half-faces,
    /// the ones left unpaired.
    fn link_real_facets(&mut self) -> Result<Vec<HalfFace>, MeshError> {
        let mut open: FastHashMap<[VertexIndex; 3], HalfFace> = FastHashMap::default();
        let mut closed: FastHashSet<[VertexIndex; 3]> = FastHashSet::default();

        for tet in 0..self.nodes.len() {
            for facet in 0..4 {
                let key = sorted3(facet_nodes(&self.nodes[tet], facet));
                let here = HalfFace::new(tet, facet);
                if closed.contains(&key) {
                    return Err(MeshError::NonManifoldFacet { nodes: key });
                }
                match open.entry(key) {
                    Entry::Occupied(entry) => {
                        let there = entry.remove();
                        self.link(here, there);
                        closed.insert(key);
                    }
                    Entry::Vacant(entry) => {
                        entry.insert(here);
                    }
                }
            }
        }
        let mut hull: Vec<HalfFace> = open.into_values().collect();
        hull.sort_unstable();
        Ok(hull)
    }

    /// Adds one ghost per hull triangle and links the ghosts around the hull.
    fn close_hull(&mut self, hull: Vec<HalfFace>) -> Result<(), MeshError> {
        let mut open: FastHashMap<[VertexIndex; 2], HalfFace> = FastHashMap::default();
        let mut closed: FastHashSet<[VertexIndex; 2]> = FastHashSet::default();
        for here in hull {
            let [p, q, r] = facet_nodes(&self.nodes[here.tet()], usize::from(here.facet()));
            let ghost = self.push_tetrahedron([p, r, q, GHOST_VERTEX]);
            self.link(here, HalfFace::new(ghost, 3));

            // Ghost facet i joins the ghost vertex to the hull edge opposite slot i.
            let rim = [p, r, q];
            for facet in 0..3 {
                let mut key = [rim[(facet + 1) % 3], rim[(facet + 2) % 3]];
                key.sort_unstable();
                let side = HalfFace::new(ghost, facet);
                if closed.contains(&key) {
                    return Err(MeshError::NonManifoldHullEdge { nodes: key });
                }
                match open.entry(key) {
                    Entry::Occupied(entry) => {
                        let there = entry.remove();
                        self.link(side, there);
                        closed.insert(key);
                    }
                    Entry::Vacant(entry) => {
                        entry.insert(side);
                    }
                }
            }
        }

        if let Some((&nodes, _)) = open.iter().min_by_key(|(key, _)| **key) {
            return Err(MeshError::OpenHullEdge { nodes });
        }
        Ok(())
    }

    fn link(&mut self, a: HalfFace, b: HalfFace) {
        self.neighbors[a.tet()][usize::from(a.facet())] = b;
        self.neighbors[b.tet()][usize::from(b.facet())] = a;
    }

    /// Appends a vertex and returns its index.
    ///
    /// The vertex is not connected to any tetrahedron; this is how an
    /// insertion driver registers the point whose cavity is being reshaped.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::InvalidPoint`] for non-finite coordinates and
    /// [`MeshError::TooManyVertices`] when the index space is exhausted.
    pub fn add_vertex(&mut self, point: Point) -> Result<VertexIndex, MeshError> {
        let vertex = self.vertices.len();
        point
            .validate()
            .map_err(|source| MeshError::InvalidPoint { vertex, source })?;
        let index = VertexIndex::try_from(vertex)
            .ok()
            .filter(|&v| v != GHOST_VERTEX)
            .ok_or(MeshError::TooManyVertices { count: vertex + 1 })?;
        self.vertices.push(point);
        Ok(index)
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// Number of vertices.
    #[inline]
    #[must_use]
    pub fn number_of_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Number of tetrahedra, ghosts included.
    #[inline]
    #[must_use]
    pub fn number_of_tetrahedra(&self) -> usize {
        self.nodes.len()
    }

    /// Indices of non-ghost tetrahedra.
    pub fn real_tetrahedra(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.nodes.len()).filter(|&tet| !self.is_ghost(tet))
    }

    /// Position of `vertex`, or `None` for the ghost vertex or an unknown index.
    #[inline]
    #[must_use]
    pub fn point(&self, vertex: VertexIndex) -> Option<&Point> {
        self.vertices.get(slot(vertex))
    }

    /// All vertex positions.
    #[inline]
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.vertices
    }

    /// Nodes of `tet`.
    ///
    /// # Panics
    ///
    /// Panics if `tet` is out of range.
    #[inline]
    #[must_use]
    pub fn nodes(&self, tet: usize) -> &[VertexIndex; 4] {
        &self.nodes[tet]
    }

    /// The twin of `half_face`: the same triangle seen from the other side.
    ///
    /// # Panics
    ///
    /// Panics if the owning tetrahedron is out of range.
    #[inline]
    #[must_use]
    pub fn neighbor(&self, half_face: HalfFace) -> HalfFace {
        self.neighbors[half_face.tet()][usize::from(half_face.facet())]
    }

    /// Flag word of `tet`.
    #[inline]
    #[must_use]
    pub fn flags(&self, tet: usize) -> TetFlags {
        self.flags[tet]
    }

    /// Whether `tet` is a ghost tetrahedron.
    #[inline]
    #[must_use]
    pub fn is_ghost(&self, tet: usize) -> bool {
        self.nodes[tet][3] == GHOST_VERTEX
    }

    /// Whether `tet` is marked deleted.
    #[inline]
    #[must_use]
    pub fn is_deleted(&self, tet: usize) -> bool {
        self.flags[tet].contains(TetFlags::DELETED)
    }

    /// Marks `tet` deleted.
    #[inline]
    pub fn set_deleted(&mut self, tet: usize) {
        self.flags[tet].insert(TetFlags::DELETED);
    }

    /// Clears the deleted mark of `tet`.
    #[inline]
    pub fn unset_deleted(&mut self, tet: usize) {
        self.flags[tet].remove(TetFlags::DELETED);
    }

    /// Whether facet `facet` of `tet` is constrained.
    #[inline]
    #[must_use]
    pub fn facet_constraint(&self, tet: usize, facet: usize) -> bool {
        self.flags[tet].contains(TetFlags::facet(facet))
    }

    /// Whether edge `edge` of `tet` is constrained.
    #[inline]
    #[must_use]
    pub fn edge_constraint(&self, tet: usize, edge: usize) -> bool {
        self.flags[tet].contains(TetFlags::edge(edge))
    }

    /// Color tag of `tet`.
    #[inline]
    #[must_use]
    pub fn color(&self, tet: usize) -> u16 {
        self.colors[tet]
    }

    /// Sets the color tag of `tet`.
    #[inline]
    pub fn set_color(&mut self, tet: usize, color: u16) {
        self.colors[tet] = color;
    }

    /// Positions of the nodes of a real tetrahedron, `None` for ghosts.
    #[must_use]
    pub fn tetrahedron_points(&self, tet: usize) -> Option<[&Point; 4]> {
        let [a, b, c, d] = self.nodes[tet];
        Some([self.point(a)?, self.point(b)?, self.point(c)?, self.point(d)?])
    }

    /// Whether `point` lies inside or on the boundary of real tetrahedron
    /// `tet`. Always `false` for ghosts.
    #[must_use]
    pub fn contains(&self, tet: usize, point: &Point) -> bool {
        if self.is_ghost(tet) {
            return false;
        }
        (0..4).all(|facet| {
            let [a, b, c] = facet_nodes(&self.nodes[tet], facet);
            match (self.point(a), self.point(b), self.point(c)) {
                (Some(a), Some(b), Some(c)) => orientation(point, a, b, c) != Orientation::NEGATIVE,
                _ => false,
            }
        })
    }

    // -------------------------------------------------------------------------
    // Constraints
    // -------------------------------------------------------------------------

    /// Marks the edge `(a, b)` constrained in every tetrahedron containing it,
    /// ghosts included. Returns the number of tetrahedra marked.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::EdgeNotFound`] if no tetrahedron has this edge.
    pub fn constrain_edge(&mut self, a: VertexIndex, b: VertexIndex) -> Result<usize, MeshError> {
        let mut marked = 0;
        for tet in 0..self.nodes.len() {
            if let Some(edge) = edge_with_vertices(&self.nodes[tet], a, b) {
                self.flags[tet].insert(TetFlags::edge(edge));
                marked += 1;
            }
        }
        if marked == 0 {
            return Err(MeshError::EdgeNotFound { a, b });
        }
        tracing::trace!(a, b, marked, "constrained edge");
        Ok(marked)
    }

    /// Marks triangle `(a, b, c)` constrained on both of its sides.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::FacetNotFound`] if no tetrahedron has this triangle.
    pub fn constrain_facet(
        &mut self,
        a: VertexIndex,
        b: VertexIndex,
        c: VertexIndex,
    ) -> Result<(), MeshError> {
        let key = sorted3([a, b, c]);
        let found = (0..self.nodes.len()).find_map(|tet| {
            (0..4)
                .find(|&facet| sorted3(facet_nodes(&self.nodes[tet], facet)) == key)
                .map(|facet| HalfFace::new(tet, facet))
        });
        let here = found.ok_or(MeshError::FacetNotFound { a, b, c })?;
        let there = self.neighbor(here);
        for side in [here, there] {
            self.flags[side.tet()].insert(TetFlags::facet(usize::from(side.facet())));
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Validation
    // -------------------------------------------------------------------------

    /// Checks array sizes, adjacency symmetry, that twins describe the same
    /// triangle, and that real neighbors lie on opposite sides of it.
    ///
    /// # Errors
    ///
    /// Returns the first [`MeshError`] found.
    pub fn validate(&self) -> Result<(), MeshError> {
        let n = self.nodes.len();
        if self.neighbors.len() != n || self.flags.len() != n || self.colors.len() != n {
            return Err(MeshError::BrokenAdjacency {
                half_face: HalfFace::default(),
                message: format!(
                    "array lengths differ: nodes {n}, neighbors {}, flags {}, colors {}",
                    self.neighbors.len(),
                    self.flags.len(),
                    self.colors.len()
                ),
            });
        }

        for tet in 0..n {
            for facet in 0..4 {
                let here = HalfFace::new(tet, facet);
                let there = self.neighbors[tet][facet];
                if there.tet() >= n {
                    return Err(MeshError::BrokenAdjacency {
                        half_face: here,
                        message: format!("neighbor {there} is out of range"),
                    });
                }
                if self.neighbor(there) != here {
                    return Err(MeshError::BrokenAdjacency {
                        half_face: here,
                        message: format!("neighbor {there} does not point back"),
                    });
                }
                let mine = sorted3(facet_nodes(&self.nodes[tet], facet));
                let theirs =
                    sorted3(facet_nodes(&self.nodes[there.tet()], usize::from(there.facet())));
                if mine != theirs {
                    return Err(MeshError::BrokenAdjacency {
                        half_face: here,
                        message: format!("triangle {mine:?} differs from twin {theirs:?}"),
                    });
                }
                self.check_sides(here, there)?;
            }
        }
        Ok(())
    }

    fn check_sides(&self, here: HalfFace, there: HalfFace) -> Result<(), MeshError> {
        let (tet, other) = (here.tet(), there.tet());
        if self.is_ghost(tet) || self.is_ghost(other) {
            return Ok(());
        }
        let [a, b, c] = facet_nodes(&self.nodes[tet], usize::from(here.facet()));
        let apex = self.nodes[other][usize::from(there.facet())];
        let points = (self.point(a), self.point(b), self.point(c), self.point(apex));
        if let (Some(a), Some(b), Some(c), Some(apex)) = points
            && orientation(apex, a, b, c) != Orientation::NEGATIVE
        {
            return Err(MeshError::FoldedFacet {
                tet,
                neighbor: other,
            });
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
