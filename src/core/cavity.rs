//! Cavity working set: the deleted tetrahedra and the ball bounding them.
//!
//! A cavity is a set of tetrahedra flagged deleted in the [`TetMesh`]. Its
//! boundary, the *ball*, is a list of [`BallFace`]s, one per facet of a deleted
//! tetrahedron whose neighbor survives, plus one per constrained facet (a
//! constrained facet always bounds the cavity, even between two deleted
//! tetrahedra). Each ball face is stored from the surviving side: its nodes are
//! in the facet order of the surviving tetrahedron and `neigh` is that
//! tetrahedron's half-face, so `mesh.neighbor(face.neigh())` points back into
//! the cavity.
//!
//! Both lists are unordered; removal swaps in the last element.

// =============================================================================
// IMPORTS
// =============================================================================

use crate::core::collections::FastHashSet;
use crate::core::facet::{FaceConstraints, HalfFace, facet_nodes};
use crate::core::tet_mesh::{GHOST_VERTEX, TetMesh, VertexIndex};
use thiserror::Error;

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors raised while carving, repairing or checking a cavity.
///
/// Every variant except the input errors (`UnknownTetrahedron`,
/// `UnknownVertex`, `AlreadyDeleted`, `InvalidCheckpoint`) signals an internal
/// inconsistency and is fatal to the current insertion.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CavityError {
    /// A tetrahedron index is out of range.
    #[error("Tetrahedron {tet} does not exist (mesh has {count})")]
    UnknownTetrahedron {
        /// Offending index.
        tet: usize,
        /// Number of tetrahedra in the mesh.
        count: usize,
    },
    /// A vertex index is out of range or is the ghost vertex.
    #[error("Vertex {vertex} does not exist")]
    UnknownVertex {
        /// Offending index.
        vertex: VertexIndex,
    },
    /// A tetrahedron passed to carve is already deleted.
    #[error("Tetrahedron {tet} is already deleted")]
    AlreadyDeleted {
        /// Offending tetrahedron.
        tet: usize,
    },
    /// Restoration was requested for a tetrahedron that is not deleted.
    #[error("Tetrahedron {tet} is not deleted and cannot be restored")]
    NotDeleted {
        /// Offending tetrahedron.
        tet: usize,
    },
    /// A tetrahedron is flagged deleted but absent from the deleted list.
    #[error("Tetrahedron {tet} is flagged deleted but missing from the deleted set")]
    MissingFromDeletedSet {
        /// Offending tetrahedron.
        tet: usize,
    },
    /// Restoration removed a different number of ball faces than the restored
    /// tetrahedron owns.
    #[error("Restoring tetrahedron {tet} removed {removed} ball faces, expected {expected}")]
    BoundaryMismatch {
        /// Restored tetrahedron.
        tet: usize,
        /// Ball faces removed.
        removed: usize,
        /// Ball faces the tetrahedron's flags account for.
        expected: usize,
    },
    /// The ball does not describe the boundary of the deleted set.
    #[error("Inconsistent cavity boundary: {message}")]
    InconsistentBoundary {
        /// Description of the problem.
        message: String,
    },
    /// The checkpoint lies beyond the end of the deleted list.
    #[error("Checkpoint {checkpoint} exceeds the {deleted} deleted tetrahedra")]
    InvalidCheckpoint {
        /// Requested checkpoint.
        checkpoint: usize,
        /// Length of the deleted list.
        deleted: usize,
    },
    /// An edge ring did not return to its starting tetrahedron.
    #[error("Ring around edge {edge} of tetrahedron {tet} did not close after {steps} steps")]
    RingNotClosed {
        /// Starting tetrahedron.
        tet: usize,
        /// Local edge in the starting tetrahedron.
        edge: usize,
        /// Steps taken.
        steps: usize,
    },
    /// An edge ring stepped into a tetrahedron lacking the expected vertex.
    #[error("Edge ring entered tetrahedron {tet}, which does not contain vertex {vertex}")]
    BrokenRing {
        /// Tetrahedron entered.
        tet: usize,
        /// Vertex carried over from the previous step.
        vertex: VertexIndex,
    },
    /// An edge ring visited a tetrahedron already marked for the same edge.
    #[error("Edge {edge} of tetrahedron {tet} was visited twice")]
    RingRevisited {
        /// Tetrahedron visited twice.
        tet: usize,
        /// Local edge.
        edge: usize,
    },
    /// Every tetrahedron around a constrained edge is deleted and none can be
    /// restored.
    #[error("No tetrahedron around constrained edge {edge} of tetrahedron {tet} can be restored")]
    NoRescueCandidate {
        /// Tetrahedron whose edge was being checked.
        tet: usize,
        /// Local edge.
        edge: usize,
    },
    /// The tetrahedron recorded at the checkpoint does not contain the point.
    #[error("Vertex {vertex} is not inside tetrahedron {tet}, the first one deleted for it")]
    PointOutsideStartTetrahedron {
        /// First tetrahedron deleted since the checkpoint.
        tet: usize,
        /// Candidate vertex.
        vertex: VertexIndex,
    },
}

// =============================================================================
// BALL FACES
// =============================================================================

/// One triangle of the cavity boundary, seen from the surviving side.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BallFace {
    nodes: [VertexIndex; 3],
    neigh: HalfFace,
    constraints: FaceConstraints,
}

impl BallFace {
    /// Builds the ball face for the surviving half-face `outer`.
    ///
    /// # Panics
    ///
    /// Panics if `outer` refers to a tetrahedron outside `mesh`.
    #[must_use]
    pub fn from_half_face(mesh: &TetMesh, outer: HalfFace) -> Self {
        let facet = usize::from(outer.facet());
        Self {
            nodes: facet_nodes(mesh.nodes(outer.tet()), facet),
            neigh: outer,
            constraints: FaceConstraints::from_tetrahedron(mesh.flags(outer.tet()), facet),
        }
    }

    /// Triangle nodes; the third is [`GHOST_VERTEX`] for ghost faces.
    #[inline]
    #[must_use]
    pub const fn nodes(&self) -> [VertexIndex; 3] {
        self.nodes
    }

    /// Half-face of the surviving tetrahedron.
    #[inline]
    #[must_use]
    pub const fn neigh(&self) -> HalfFace {
        self.neigh
    }

    /// Constraint bits in face-local numbering.
    #[inline]
    #[must_use]
    pub const fn constraints(&self) -> FaceConstraints {
        self.constraints
    }

    /// Whether the face touches the vertex at infinity.
    #[inline]
    #[must_use]
    pub const fn is_ghost(&self) -> bool {
        self.nodes[2] == GHOST_VERTEX
    }
}

// =============================================================================
// WORKING SET
// =============================================================================

/// Deleted tetrahedra and ball of the cavity currently being reshaped.
///
/// The working set is owned by one insertion at a time and reused across
/// insertions to keep its allocations.
///
/// # Examples
///
/// ```rust
/// use tetra_cavity::core::cavity::CavityWorkingSet;
/// use tetra_cavity::core::tet_mesh::TetMesh;
/// use tetra_cavity::geometry::point::Point;
///
/// let points = vec![
///     Point::new([0.0, 0.0, 0.0]),
///     Point::new([1.0, 0.0, 0.0]),
///     Point::new([0.0, 1.0, 0.0]),
///     Point::new([0.0, 0.0, 1.0]),
/// ];
/// let mut mesh = TetMesh::from_tetrahedra(points, &[[0, 1, 2, 3]]).unwrap();
/// let mut cavity = CavityWorkingSet::new();
///
/// let checkpoint = cavity.carve(&mut mesh, &[0]).unwrap();
/// assert_eq!(checkpoint, 0);
/// assert_eq!(cavity.deleted(), &[0]);
/// assert_eq!(cavity.ball().len(), 4);
/// assert!(cavity.validate_boundary(&mesh, checkpoint).is_ok());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CavityWorkingSet {
    deleted: Vec<usize>,
    ball: Vec<BallFace>,
}

impl CavityWorkingSet {
    /// Creates an empty working set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            deleted: Vec::new(),
            ball: Vec::new(),
        }
    }

    /// Deleted tetrahedra, in no particular order.
    #[inline]
    #[must_use]
    pub fn deleted(&self) -> &[usize] {
        &self.deleted
    }

    /// Boundary faces, in no particular order.
    #[inline]
    #[must_use]
    pub fn ball(&self) -> &[BallFace] {
        &self.ball
    }

    pub(crate) const fn deleted_mut(&mut self) -> &mut Vec<usize> {
        &mut self.deleted
    }

    pub(crate) const fn ball_mut(&mut self) -> &mut Vec<BallFace> {
        &mut self.ball
    }

    /// Empties both lists without touching the mesh.
    ///
    /// Call this once the external driver has consumed the cavity.
    pub fn clear(&mut self) {
        self.deleted.clear();
        self.ball.clear();
    }

    /// Deletes `tets` and updates the ball to bound the enlarged cavity.
    ///
    /// Returns the checkpoint to hand to the repair operations: the length of
    /// the deleted list before this call. By convention the first tetrahedron
    /// of `tets` is the one containing the point being inserted.
    ///
    /// # Errors
    ///
    /// Returns [`CavityError::UnknownTetrahedron`] or
    /// [`CavityError::AlreadyDeleted`] (listing a tetrahedron twice included).
    /// The mesh and working set are unchanged on error.
    pub fn carve(&mut self, mesh: &mut TetMesh, tets: &[usize]) -> Result<usize, CavityError> {
        let count = mesh.number_of_tetrahedra();
        let mut fresh = FastHashSet::default();
        for &tet in tets {
            if tet >= count {
                return Err(CavityError::UnknownTetrahedron { tet, count });
            }
            if mesh.is_deleted(tet) || !fresh.insert(tet) {
                return Err(CavityError::AlreadyDeleted { tet });
            }
        }

        let checkpoint = self.deleted.len();
        for &tet in tets {
            mesh.set_deleted(tet);
            self.deleted.push(tet);
        }

        // Faces whose surviving side was just deleted stop being boundary,
        // unless the facet is constrained.
        self.ball.retain(|face| {
            let outer = face.neigh();
            !fresh.contains(&outer.tet())
                || mesh.facet_constraint(outer.tet(), usize::from(outer.facet()))
        });

        for &tet in tets {
            for facet in 0..4 {
                let outer = mesh.neighbor(HalfFace::new(tet, facet));
                if !mesh.is_deleted(outer.tet()) || mesh.facet_constraint(tet, facet) {
                    self.ball.push(BallFace::from_half_face(mesh, outer));
                }
            }
        }

        tracing::trace!(
            carved = tets.len(),
            deleted = self.deleted.len(),
            ball = self.ball.len(),
            "carved cavity"
        );
        Ok(checkpoint)
    }

    /// Checks that the working set describes the cavity recorded in `mesh`.
    ///
    /// Verifies that `checkpoint` is in range, that every listed tetrahedron
    /// is flagged deleted exactly once, and that the ball holds exactly one
    /// up-to-date face per boundary facet of the deleted set.
    ///
    /// # Errors
    ///
    /// [`CavityError::InvalidCheckpoint`], [`CavityError::UnknownTetrahedron`],
    /// [`CavityError::NotDeleted`] or [`CavityError::InconsistentBoundary`].
    pub fn validate_boundary(&self, mesh: &TetMesh, checkpoint: usize) -> Result<(), CavityError> {
        if checkpoint > self.deleted.len() {
            return Err(CavityError::InvalidCheckpoint {
                checkpoint,
                deleted: self.deleted.len(),
            });
        }

        let count = mesh.number_of_tetrahedra();
        let mut seen = FastHashSet::default();
        let mut expected = FastHashSet::default();
        for &tet in &self.deleted {
            if tet >= count {
                return Err(CavityError::UnknownTetrahedron { tet, count });
            }
            if !mesh.is_deleted(tet) {
                return Err(CavityError::NotDeleted { tet });
            }
            if !seen.insert(tet) {
                return Err(CavityError::InconsistentBoundary {
                    message: format!("tetrahedron {tet} is listed twice"),
                });
            }
            for facet in 0..4 {
                let outer = mesh.neighbor(HalfFace::new(tet, facet));
                if !mesh.is_deleted(outer.tet()) || mesh.facet_constraint(tet, facet) {
                    expected.insert(outer);
                }
            }
        }

        for (index, face) in self.ball.iter().enumerate() {
            if !expected.remove(&face.neigh()) {
                return Err(CavityError::InconsistentBoundary {
                    message: format!(
                        "ball face {index} ({}) does not bound the deleted set or is duplicated",
                        face.neigh()
                    ),
                });
            }
            if *face != BallFace::from_half_face(mesh, face.neigh()) {
                return Err(CavityError::InconsistentBoundary {
                    message: format!("ball face {index} ({}) is stale", face.neigh()),
                });
            }
        }

        if let Some(missing) = expected.iter().min() {
            return Err(CavityError::InconsistentBoundary {
                message: format!(
                    "{} boundary facets have no ball face, first {missing}",
                    expected.len()
                ),
            });
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::point::Point;

    fn two_tets() -> TetMesh {
        let points = vec![
            Point::new([0.0, 0.0, 0.0]),
            Point::new([1.0, 0.0, 0.0]),
            Point::new([0.0, 1.0, 0.0]),
            Point::new([0.0, 0.0, 1.0]),
            Point::new([1.0, 1.0, 1.0]),
        ];
        TetMesh::from_tetrahedra(points, &[[0, 1, 2, 3], [1, 2, 3, 4]]).unwrap()
    }

    #[test]
    fn carve_builds_outer_boundary() {
        let mut mesh = two_tets();
        let mut cavity = CavityWorkingSet::new();
        let checkpoint = cavity.carve(&mut mesh, &[0, 1]).unwrap();
        assert_eq!(checkpoint, 0);
        assert_eq!(cavity.ball().len(), 6);
        assert!(cavity.ball().iter().all(|f| mesh.is_ghost(f.neigh().tet())));
        // Hull faces seen from a ghost are real triangles.
        assert!(cavity.ball().iter().all(|f| !f.is_ghost()));
        cavity.validate_boundary(&mesh, checkpoint).unwrap();
    }

    #[test]
    fn incremental_carve_matches_single_carve() {
        let mut mesh = two_tets();
        let mut cavity = CavityWorkingSet::new();
        assert_eq!(cavity.carve(&mut mesh, &[0]).unwrap(), 0);
        assert_eq!(cavity.ball().len(), 4);
        assert_eq!(cavity.carve(&mut mesh, &[1]).unwrap(), 1);
        assert_eq!(cavity.ball().len(), 6);
        cavity.validate_boundary(&mesh, 1).unwrap();
    }

    #[test]
    fn constrained_facet_stays_on_both_sides() {
        let mut mesh = two_tets();
        mesh.constrain_facet(1, 2, 3).unwrap();
        let mut cavity = CavityWorkingSet::new();
        cavity.carve(&mut mesh, &[0, 1]).unwrap();
        assert_eq!(cavity.ball().len(), 8);
        let constrained = cavity
            .ball()
            .iter()
            .filter(|f| f.constraints().contains(FaceConstraints::FACET))
            .count();
        assert_eq!(constrained, 2);
        cavity.validate_boundary(&mesh, 0).unwrap();
    }

    #[test]
    fn carve_rejects_bad_input_without_side_effects() {
        let mut mesh = two_tets();
        let mut cavity = CavityWorkingSet::new();
        assert_eq!(
            cavity.carve(&mut mesh, &[0, 99]),
            Err(CavityError::UnknownTetrahedron {
                tet: 99,
                count: mesh.number_of_tetrahedra()
            })
        );
        assert_eq!(
            cavity.carve(&mut mesh, &[1, 1]),
            Err(CavityError::AlreadyDeleted { tet: 1 })
        );
        assert!(cavity.deleted().is_empty());
        assert!(!mesh.is_deleted(0) && !mesh.is_deleted(1));
    }

    #[test]
    fn validate_boundary_reports_problems() {
        let mut mesh = two_tets();
        let mut cavity = CavityWorkingSet::new();
        cavity.carve(&mut mesh, &[0]).unwrap();
        assert_eq!(
            cavity.validate_boundary(&mesh, 2),
            Err(CavityError::InvalidCheckpoint {
                checkpoint: 2,
                deleted: 1
            })
        );

        let mut missing_face = cavity.clone();
        missing_face.ball_mut().pop();
        assert!(matches!(
            missing_face.validate_boundary(&mesh, 0),
            Err(CavityError::InconsistentBoundary { .. })
        ));

        mesh.unset_deleted(0);
        assert_eq!(
            cavity.validate_boundary(&mesh, 0),
            Err(CavityError::NotDeleted { tet: 0 })
        );
    }

    #[test]
    fn clear_keeps_mesh_flags() {
        let mut mesh = two_tets();
        let mut cavity = CavityWorkingSet::new();
        cavity.carve(&mut mesh, &[1]).unwrap();
        cavity.clear();
        assert!(cavity.deleted().is_empty() && cavity.ball().is_empty());
        assert!(mesh.is_deleted(1));
    }
}
