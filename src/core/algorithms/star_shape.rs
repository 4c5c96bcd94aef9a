//! Star-shape test of a cavity boundary.
//!
//! A cavity can be filled by joining the inserted point to every ball face
//! only if the point sees each face from the cavity side, that is
//! `orient3d(point, a, b, c) < 0` for every non-ghost face `(a, b, c)`. A face
//! failing the test is *blind*; finding one is the normal trigger for
//! restoration, not an error.

use crate::core::algorithms::reshape::ReshapeConfig;
use crate::core::cavity::BallFace;
use crate::core::tet_mesh::TetMesh;
use crate::geometry::point::Point;
use crate::geometry::predicates::{Orientation, orientation};

/// Outcome of [`find_blind_face`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StarShape {
    /// Every non-ghost ball face is visible from the point.
    Star,
    /// Index into the ball of the first face that is not visible.
    BlindFace(usize),
}

impl StarShape {
    /// Returns true for [`StarShape::Star`].
    #[must_use]
    pub const fn is_star(self) -> bool {
        matches!(self, Self::Star)
    }
}

/// Scans `ball` for the first face that `point` does not see.
///
/// Ghost faces are never blind. A face coplanar with `point` is blind only
/// under [`ReshapeConfig::degenerate_faces_are_blind`]; by default it counts as
/// visible so that repair always terminates.
///
/// A face naming a vertex the mesh does not know can only come from a corrupt
/// ball; it is reported with a `warn` event and skipped.
///
/// # Examples
///
/// ```rust
/// use tetra_cavity::core::algorithms::reshape::ReshapeConfig;
/// use tetra_cavity::core::algorithms::star_shape::{StarShape, find_blind_face};
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
/// cavity.carve(&mut mesh, &[0]).unwrap();
///
/// let config = ReshapeConfig::default();
/// let inside = Point::new([0.2, 0.2, 0.2]);
/// assert_eq!(find_blind_face(cavity.ball(), &mesh, &inside, &config), StarShape::Star);
///
/// let outside = Point::new([1.0, 1.0, 1.0]);
/// assert!(!find_blind_face(cavity.ball(), &mesh, &outside, &config).is_star());
/// ```
#[must_use]
pub fn find_blind_face(
    ball: &[BallFace],
    mesh: &TetMesh,
    point: &Point,
    config: &ReshapeConfig,
) -> StarShape {
    for (index, face) in ball.iter().enumerate() {
        if face.is_ghost() {
            continue;
        }
        let nodes = face.nodes();
        let [Some(a), Some(b), Some(c)] = nodes.map(|v| mesh.point(v)) else {
            tracing::warn!(index, face = %face.neigh(), ?nodes, "ball face with unknown vertex");
            continue;
        };
        let side = orientation(point, a, b, c);
        let blind = match side {
            Orientation::POSITIVE => true,
            Orientation::DEGENERATE => config.degenerate_faces_are_blind,
            Orientation::NEGATIVE => false,
        };
        if blind {
            tracing::trace!(index, face = %face.neigh(), %side, "blind face");
            return StarShape::BlindFace(index);
        }
    }
    StarShape::Star
}
