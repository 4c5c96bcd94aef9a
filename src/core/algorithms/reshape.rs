//! Cavity reshape driver.
//!
//! Repeats validate → restore until the ball is star-shaped with respect to
//! the inserted point:
//!
//! 1. [`find_blind_face`] scans the ball.
//! 2. On [`StarShape::BlindFace`], the deleted tetrahedron behind that face is
//!    restored with [`restore_tetrahedron`] and the scan restarts.
//! 3. On [`StarShape::Star`] the cavity is accepted.
//!
//! Each restoration shrinks the deleted list by one, so the loop runs at most
//! once per deleted tetrahedron. In the worst case the cavity becomes empty,
//! which is degenerate but safe.
//!
//! Constrained-edge recovery
//! ([`respect_edge_constraint`](crate::core::algorithms::edge_recovery::respect_edge_constraint))
//! is a separate pass the insertion driver runs before this one.

use crate::core::algorithms::restoration::restore_tetrahedron;
use crate::core::algorithms::star_shape::{StarShape, find_blind_face};
use crate::core::cavity::{CavityError, CavityWorkingSet};
use crate::core::tet_mesh::{TetMesh, VertexIndex};

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Policy switches shared by the reshape operations.
///
/// # Examples
///
/// ```rust
/// use tetra_cavity::core::algorithms::reshape::{ReshapeConfig, ReshapeConfigBuilder};
///
/// let config = ReshapeConfigBuilder::default()
///     .consistency_checks(true)
///     .build()
///     .unwrap();
/// assert!(config.consistency_checks);
/// assert!(!config.degenerate_faces_are_blind);
/// assert_eq!(ReshapeConfig::strict(), ReshapeConfig {
///     consistency_checks: true,
///     degenerate_faces_are_blind: true,
/// });
/// ```
#[derive(Builder, Clone, Copy, Debug, PartialEq, Eq)]
#[builder(default)]
pub struct ReshapeConfig {
    /// Run the internal consistency checks: ball bookkeeping on every
    /// restoration, the full boundary check on entry, ring revisits, and the
    /// location of the point in the first deleted tetrahedron.
    ///
    /// Defaults to on in debug builds and off in release builds.
    pub consistency_checks: bool,
    /// Treat a face exactly coplanar with the point as blind.
    ///
    /// Off by default: coplanar faces count as visible, which always
    /// terminates but may leave zero-volume tetrahedra for the filling step.
    pub degenerate_faces_are_blind: bool,
}

impl Default for ReshapeConfig {
    fn default() -> Self {
        Self {
            consistency_checks: cfg!(debug_assertions),
            degenerate_faces_are_blind: false,
        }
    }
}

impl ReshapeConfig {
    /// All checks on, coplanar faces blind.
    #[must_use]
    pub const fn strict() -> Self {
        Self {
            consistency_checks: true,
            degenerate_faces_are_blind: true,
        }
    }

    /// All checks off, coplanar faces visible.
    #[must_use]
    pub const fn fast() -> Self {
        Self {
            consistency_checks: false,
            degenerate_faces_are_blind: false,
        }
    }
}

// =============================================================================
// STATISTICS
// =============================================================================

/// Work done by one call to [`reshape_cavity_if_needed`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReshapeStatistics {
    /// Tetrahedra restored to make the ball star-shaped.
    pub restored: usize,
    /// Star-shape scans performed, the final successful one included.
    pub validation_passes: usize,
}

impl ReshapeStatistics {
    /// Returns true if the cavity was star-shaped as given.
    #[must_use]
    pub const fn was_star_shaped(&self) -> bool {
        self.restored == 0
    }
}

// =============================================================================
// DRIVER
// =============================================================================

/// Shrinks the cavity until its ball is star-shaped with respect to `vertex`,
/// using [`ReshapeConfig::default`].
///
/// `checkpoint` is the deleted-list length before the current insertion dug
/// its cavity (the value returned by
/// [`CavityWorkingSet::carve`]).
///
/// # Errors
///
/// See [`reshape_cavity_if_needed_with_config`].
pub fn reshape_cavity_if_needed(
    working_set: &mut CavityWorkingSet,
    mesh: &mut TetMesh,
    vertex: VertexIndex,
    checkpoint: usize,
) -> Result<ReshapeStatistics, CavityError> {
    reshape_cavity_if_needed_with_config(
        working_set,
        mesh,
        vertex,
        checkpoint,
        &ReshapeConfig::default(),
    )
}

/// Shrinks the cavity until its ball is star-shaped with respect to `vertex`.
///
/// # Errors
///
/// - [`CavityError::UnknownVertex`] if `vertex` has no position.
/// - [`CavityError::InvalidCheckpoint`] if `checkpoint` exceeds the deleted list.
/// - With consistency checks on, any error of
///   [`CavityWorkingSet::validate_boundary`] on entry.
/// - Any error of [`restore_tetrahedron`]; these are internal inconsistencies.
///
/// # Examples
///
/// ```rust
/// use tetra_cavity::core::algorithms::reshape::reshape_cavity_if_needed;
/// use tetra_cavity::core::cavity::CavityWorkingSet;
/// use tetra_cavity::core::tet_mesh::TetMesh;
/// use tetra_cavity::geometry::point::Point;
///
/// let points = vec![
///     Point::new([0.0, 0.0, 0.0]),
///     Point::new([1.0, 0.0, 0.0]),
///     Point::new([0.0, 1.0, 0.0]),
///     Point::new([0.0, 0.0, 1.0]),
///     Point::new([1.5, 1.5, -1.9]),
/// ];
/// let mut mesh = TetMesh::from_tetrahedra(points, &[[0, 1, 2, 3], [1, 2, 3, 4]]).unwrap();
/// let vertex = mesh.add_vertex(Point::new([0.2, 0.2, 0.2])).unwrap();
///
/// let mut cavity = CavityWorkingSet::new();
/// let checkpoint = cavity.carve(&mut mesh, &[0, 1]).unwrap();
/// let stats = reshape_cavity_if_needed(&mut cavity, &mut mesh, vertex, checkpoint).unwrap();
///
/// assert_eq!(stats.restored, 1);
/// assert_eq!(cavity.deleted(), &[0]);
/// assert_eq!(cavity.ball().len(), 4);
/// ```
pub fn reshape_cavity_if_needed_with_config(
    working_set: &mut CavityWorkingSet,
    mesh: &mut TetMesh,
    vertex: VertexIndex,
    checkpoint: usize,
    config: &ReshapeConfig,
) -> Result<ReshapeStatistics, CavityError> {
    let point = *mesh
        .point(vertex)
        .ok_or(CavityError::UnknownVertex { vertex })?;
    if checkpoint > working_set.deleted().len() {
        return Err(CavityError::InvalidCheckpoint {
            checkpoint,
            deleted: working_set.deleted().len(),
        });
    }
    if config.consistency_checks {
        working_set.validate_boundary(mesh, checkpoint)?;
    }

    let mut stats = ReshapeStatistics::default();
    loop {
        stats.validation_passes += 1;
        let StarShape::BlindFace(index) =
            find_blind_face(working_set.ball(), mesh, &point, config)
        else {
            break;
        };
        let behind = mesh.neighbor(working_set.ball()[index].neigh()).tet();
        restore_tetrahedron(working_set, mesh, behind, config)?;
        stats.restored += 1;
    }

    tracing::debug!(
        vertex,
        restored = stats.restored,
        deleted = working_set.deleted().len(),
        ball = working_set.ball().len(),
        "cavity is star-shaped"
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::point::Point;
    use crate::geometry::predicates::orient3d;

    fn two_tets() -> TetMesh {
        let points = vec![
            Point::new([0.0, 0.0, 0.0]),
            Point::new([1.0, 0.0, 0.0]),
            Point::new([0.0, 1.0, 0.0]),
            Point::new([0.0, 0.0, 1.0]),
            Point::new([1.5, 1.5, -1.9]),
        ];
        TetMesh::from_tetrahedra(points, &[[0, 1, 2, 3], [1, 2, 3, 4]]).unwrap()
    }

    #[test]
    fn config_presets() {
        assert_eq!(
            ReshapeConfig::default().consistency_checks,
            cfg!(debug_assertions)
        );
        assert!(!ReshapeConfig::default().degenerate_faces_are_blind);
        assert!(!ReshapeConfig::fast().consistency_checks);
        let built = ReshapeConfigBuilder::default()
            .degenerate_faces_are_blind(true)
            .consistency_checks(true)
            .build()
            .unwrap();
        assert_eq!(built, ReshapeConfig::strict());
    }

    #[test]
    fn star_shaped_cavity_is_untouched() {
        let mut mesh = two_tets();
        let vertex = mesh.add_vertex(Point::new([0.3, 0.3, 0.2])).unwrap();
        let mut cavity = CavityWorkingSet::new();
        let checkpoint = cavity.carve(&mut mesh, &[0]).unwrap();
        let stats = reshape_cavity_if_needed_with_config(
            &mut cavity,
            &mut mesh,
            vertex,
            checkpoint,
            &ReshapeConfig::strict(),
        )
        .unwrap();
        assert!(stats.was_star_shaped());
        assert_eq!(stats.validation_passes, 1);
        assert_eq!(cavity.ball().len(), 4);
    }

    #[test]
    fn result_is_star_shaped() {
        let mut mesh = two_tets();
        let vertex = mesh.add_vertex(Point::new([0.2, 0.2, 0.2])).unwrap();
        let mut cavity = CavityWorkingSet::new();
        let checkpoint = cavity.carve(&mut mesh, &[0, 1]).unwrap();
        let stats = reshape_cavity_if_needed_with_config(
            &mut cavity,
            &mut mesh,
            vertex,
            checkpoint,
            &ReshapeConfig::strict(),
        )
        .unwrap();
        assert_eq!(stats.restored, 1);
        assert_eq!(stats.validation_passes, 2);

        let p = *mesh.point(vertex).unwrap();
        for face in cavity.ball().iter().filter(|f| !f.is_ghost()) {
            let [a, b, c] = face.nodes().map(|v| mesh.point(v).unwrap());
            assert!(orient3d(&p, a, b, c) < 0.0);
        }
        cavity.validate_boundary(&mesh, checkpoint).unwrap();
    }

    #[test]
    fn rejects_unknown_vertex_and_checkpoint() {
        let mut mesh = two_tets();
        let mut cavity = CavityWorkingSet::new();
        cavity.carve(&mut mesh, &[0]).unwrap();
        assert_eq!(
            reshape_cavity_if_needed(&mut cavity, &mut mesh, 42, 0),
            Err(CavityError::UnknownVertex { vertex: 42 })
        );
        assert_eq!(
            reshape_cavity_if_needed(&mut cavity, &mut mesh, 0, 5),
            Err(CavityError::InvalidCheckpoint {
                checkpoint: 5,
                deleted: 1
            })
        );
    }

    #[test]
    fn restores_everything_when_nothing_is_visible() {
        let mut mesh = two_tets();
        let vertex = mesh.add_vertex(Point::new([5.0, 5.0, 5.0])).unwrap();
        let mut cavity = CavityWorkingSet::new();
        let checkpoint = cavity.carve(&mut mesh, &[0, 1]).unwrap();
        let stats = reshape_cavity_if_needed(&mut cavity, &mut mesh, vertex, checkpoint).unwrap();
        assert_eq!(stats.restored, 2);
        assert!(cavity.deleted().is_empty());
        assert!(cavity.ball().is_empty());
        assert!(!mesh.is_deleted(0) && !mesh.is_deleted(1));
    }
}
