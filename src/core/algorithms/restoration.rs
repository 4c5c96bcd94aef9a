//! Tetrahedron restoration: undeleting one tetrahedron of a cavity.
//!
//! Restoring `t` removes it from the deleted list, clears its deleted flag and
//! patches the ball:
//!
//! - every ball face pointing into `t` is removed (at most 4, since `t` has 4
//!   facets);
//! - every facet of `t` whose twin was not among the removed faces becomes a
//!   new ball face seen from `t`, with its constraint bits remapped into
//!   face-local numbering.
//!
//! A restored tetrahedron therefore exposes between 0 and 4 new boundary
//! faces, one per facet shared with a tetrahedron that is still deleted.

use crate::core::algorithms::reshape::ReshapeConfig;
use crate::core::cavity::{BallFace, CavityError, CavityWorkingSet};
use crate::core::collections::{
    FACETS_PER_TETRAHEDRON, RemovedFaceBuffer, SmallBuffer, swap_remove_value,
};
use crate::core::facet::HalfFace;
use crate::core::tet_mesh::TetMesh;

/// Undeletes `tet` and updates the ball of `working_set`.
///
/// # Errors
///
/// - [`CavityError::UnknownTetrahedron`] if `tet` is out of range.
/// - [`CavityError::NotDeleted`] if `tet` is not flagged deleted; restoring
///   the same tetrahedron twice is rejected this way.
/// - [`CavityError::MissingFromDeletedSet`] if it is flagged but not listed.
/// - With consistency checks, [`CavityError::BoundaryMismatch`] when the
///   number of ball faces pointing into `tet` disagrees with the facets of
///   `tet` that border surviving or constrained neighbors.
///
/// The mesh and working set are unchanged on error.
///
/// # Examples
///
/// ```rust
/// use tetra_cavity::core::algorithms::reshape::ReshapeConfig;
/// use tetra_cavity::core::algorithms::restoration::restore_tetrahedron;
/// use tetra_cavity::core::cavity::CavityWorkingSet;
/// use tetra_cavity::core::tet_mesh::TetMesh;
/// use tetra_cavity::geometry::point::Point;
///
/// let points = vec![
///     Point::new([0.0, 0.0, 0.0]),
///     Point::new([1.0, 0.0, 0.0]),
///     Point::new([0.0, 1.0, 0.0]),
///     Point::new([0.0, 0.0, 1.0]),
///     Point::new([1.0, 1.0, 1.0]),
/// ];
/// let mut mesh = TetMesh::from_tetrahedra(points, &[[0, 1, 2, 3], [1, 2, 3, 4]]).unwrap();
/// let mut cavity = CavityWorkingSet::new();
/// cavity.carve(&mut mesh, &[0, 1]).unwrap();
/// assert_eq!(cavity.ball().len(), 6);
///
/// restore_tetrahedron(&mut cavity, &mut mesh, 1, &ReshapeConfig::strict()).unwrap();
/// assert_eq!(cavity.deleted(), &[0]);
/// assert_eq!(cavity.ball().len(), 4);
/// assert!(!mesh.is_deleted(1));
/// ```
pub fn restore_tetrahedron(
    working_set: &mut CavityWorkingSet,
    mesh: &mut TetMesh,
    tet: usize,
    config: &ReshapeConfig,
) -> Result<(), CavityError> {
    let count = mesh.number_of_tetrahedra();
    if tet >= count {
        return Err(CavityError::UnknownTetrahedron { tet, count });
    }
    if !mesh.is_deleted(tet) {
        return Err(CavityError::NotDeleted { tet });
    }
    if !working_set.deleted().contains(&tet) {
        return Err(CavityError::MissingFromDeletedSet { tet });
    }

    // Descending ball positions of the faces pointing into `tet`.
    let mut pointing_in = SmallBuffer::<usize, FACETS_PER_TETRAHEDRON>::new();
    for (index, face) in working_set.ball().iter().enumerate().rev() {
        if pointing_in.len() == FACETS_PER_TETRAHEDRON {
            break;
        }
        if mesh.neighbor(face.neigh()).tet() == tet {
            pointing_in.push(index);
        }
    }

    if config.consistency_checks {
        let expected = (0..4)
            .filter(|&facet| {
                let outer = mesh.neighbor(HalfFace::new(tet, facet));
                !mesh.is_deleted(outer.tet()) || mesh.facet_constraint(tet, facet)
            })
            .count();
        if expected != pointing_in.len() {
            return Err(CavityError::BoundaryMismatch {
                tet,
                removed: pointing_in.len(),
                expected,
            });
        }
    }

    swap_remove_value(working_set.deleted_mut(), &tet);
    mesh.unset_deleted(tet);
    let ball = working_set.ball_mut();
    let removed: RemovedFaceBuffer = pointing_in
        .iter()
        .map(|&index| ball.swap_remove(index).neigh())
        .collect();

    for facet in 0..4 {
        let inner = HalfFace::new(tet, facet);
        if !removed.contains(&mesh.neighbor(inner)) {
            working_set
                .ball_mut()
                .push(BallFace::from_half_face(mesh, inner));
        }
    }

    tracing::debug!(
        tet,
        removed = removed.len(),
        exposed = FACETS_PER_TETRAHEDRON - removed.len(),
        deleted = working_set.deleted().len(),
        "restored tetrahedron"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::facet::FaceConstraints;
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
    fn restoring_keeps_the_boundary_consistent() {
        let mut mesh = two_tets();
        let mut cavity = CavityWorkingSet::new();
        cavity.carve(&mut mesh, &[0, 1]).unwrap();
        restore_tetrahedron(&mut cavity, &mut mesh, 0, &ReshapeConfig::strict()).unwrap();
        assert_eq!(cavity.deleted(), &[1]);
        assert_eq!(cavity.ball().len(), 4);
        cavity.validate_boundary(&mesh, 0).unwrap();

        // The new face is seen from tetrahedron 0 and points back into 1.
        let exposed: Vec<&BallFace> = cavity
            .ball()
            .iter()
            .filter(|f| f.neigh().tet() == 0)
            .collect();
        assert_eq!(exposed.len(), 1);
        assert_eq!(mesh.neighbor(exposed[0].neigh()).tet(), 1);

        restore_tetrahedron(&mut cavity, &mut mesh, 1, &ReshapeConfig::strict()).unwrap();
        assert!(cavity.deleted().is_empty());
        assert!(cavity.ball().is_empty());
    }

    #[test]
    fn restoring_twice_is_rejected() {
        let mut mesh = two_tets();
        let mut cavity = CavityWorkingSet::new();
        cavity.carve(&mut mesh, &[0, 1]).unwrap();
        let config = ReshapeConfig::strict();
        restore_tetrahedron(&mut cavity, &mut mesh, 1, &config).unwrap();
        let snapshot = cavity.clone();
        assert_eq!(
            restore_tetrahedron(&mut cavity, &mut mesh, 1, &config),
            Err(CavityError::NotDeleted { tet: 1 })
        );
        assert_eq!(cavity, snapshot);
    }

    #[test]
    fn flagged_but_unlisted_is_reported() {
        let mut mesh = two_tets();
        let mut cavity = CavityWorkingSet::new();
        mesh.set_deleted(0);
        assert_eq!(
            restore_tetrahedron(&mut cavity, &mut mesh, 0, &ReshapeConfig::strict()),
            Err(CavityError::MissingFromDeletedSet { tet: 0 })
        );
        assert_eq!(
            restore_tetrahedron(&mut cavity, &mut mesh, 500, &ReshapeConfig::strict()),
            Err(CavityError::UnknownTetrahedron {
                tet: 500,
                count: mesh.number_of_tetrahedra()
            })
        );
    }

    #[test]
    fn missing_ball_face_is_a_mismatch() {
        let mut mesh = two_tets();
        let mut cavity = CavityWorkingSet::new();
        cavity.carve(&mut mesh, &[0]).unwrap();
        let lost = cavity.ball_mut().pop().unwrap();
        let owner = mesh.neighbor(lost.neigh()).tet();
        assert_eq!(owner, 0);

        let mut unchecked = cavity.clone();
        let mut unchecked_mesh = mesh.clone();
        assert_eq!(
            restore_tetrahedron(&mut cavity, &mut mesh, 0, &ReshapeConfig::strict()),
            Err(CavityError::BoundaryMismatch {
                tet: 0,
                removed: 3,
                expected: 4
            })
        );
        // A rejected restoration leaves everything as it was.
        assert_eq!(cavity, unchecked);
        assert_eq!(mesh, unchecked_mesh);
        assert!(mesh.is_deleted(0));
        // Without checks the restoration goes through and re-exposes the lost facet.
        restore_tetrahedron(
            &mut unchecked,
            &mut unchecked_mesh,
            0,
            &ReshapeConfig::fast(),
        )
        .unwrap();
        assert_eq!(unchecked.ball().len(), 1);
    }

    #[test]
    fn constraint_bits_are_remapped_onto_new_faces() {
        let mut mesh = two_tets();
        // Edge (1, 2) lies on the shared triangle (1, 2, 3).
        mesh.constrain_edge(1, 2).unwrap();
        let mut cavity = CavityWorkingSet::new();
        cavity.carve(&mut mesh, &[0, 1]).unwrap();
        restore_tetrahedron(&mut cavity, &mut mesh, 0, &ReshapeConfig::strict()).unwrap();

        let face = cavity
            .ball()
            .iter()
            .find(|f| f.neigh().tet() == 0)
            .copied()
            .unwrap();
        let nodes = face.nodes();
        let constrained: Vec<usize> = (0..3)
            .filter(|&local| face.constraints().contains(FaceConstraints::edge(local)))
            .collect();
        assert_eq!(constrained.len(), 1);
        // Local edge i is opposite face node i.
        let opposite = nodes[constrained[0]];
        assert_eq!(opposite, 3);
        assert!(!face.constraints().contains(FaceConstraints::FACET));
    }
}
