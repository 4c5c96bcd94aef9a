//! Mesh generation helpers.
//!
//! [`generate_cube_lattice`] builds a regular block of cubes, each split into
//! the six Kuhn tetrahedra that share its main diagonal. Neighboring cubes
//! agree on how their common squares are split, so the result is conforming.
//! Tests and benchmarks grow cavities inside these meshes.

use crate::core::tet_mesh::{MeshError, TetMesh, VertexIndex};
use crate::geometry::point::Point;

/// The six axis orders of the Kuhn subdivision. Each order walks from the
/// cube corner `(0, 0, 0)` to `(1, 1, 1)` one axis at a time.
const KUHN_PATHS: [[usize; 3]; 6] = [
    [0, 1, 2],
    [0, 2, 1],
    [1, 0, 2],
    [1, 2, 0],
    [2, 0, 1],
    [2, 1, 0],
];

/// Number of tetrahedra in each lattice cube.
pub const TETRAHEDRA_PER_CUBE: usize = KUHN_PATHS.len();

/// Index of lattice corner `(x, y, z)` in a lattice with `side` corners per
/// axis.
#[inline]
#[must_use]
pub const fn lattice_vertex(side: usize, [x, y, z]: [usize; 3]) -> usize {
    x + side * (y + side * z)
}

/// Builds a `cells × cells × cells` block of cubes with edge length `spacing`,
/// each cube split into [`TETRAHEDRA_PER_CUBE`] tetrahedra.
///
/// The block's minimum corner sits at the origin. Real tetrahedra come first
/// in cube order (x fastest), followed by the ghost tetrahedra closing the
/// hull.
///
/// # Errors
///
/// - [`MeshError::TooManyVertices`] if the corner count does not fit a
///   [`VertexIndex`].
/// - [`MeshError::InvalidPoint`] for a non-finite `spacing`.
/// - [`MeshError::DegenerateTetrahedron`] for a zero `spacing`.
///
/// # Examples
///
/// ```rust
/// use tetra_cavity::geometry::util::generate_cube_lattice;
///
/// let mesh = generate_cube_lattice(2, 1.0).unwrap();
/// assert_eq!(mesh.number_of_vertices(), 27);
/// assert_eq!(mesh.real_tetrahedra().count(), 48);
/// mesh.validate().unwrap();
/// ```
pub fn generate_cube_lattice(cells: usize, spacing: f64) -> Result<TetMesh, MeshError> {
    if cells == 0 {
        return TetMesh::from_tetrahedra(Vec::new(), &[]);
    }
    let side = cells + 1;
    let count = side
        .checked_pow(3)
        .ok_or(MeshError::TooManyVertices { count: usize::MAX })?;
    VertexIndex::try_from(count).map_err(|_| MeshError::TooManyVertices { count })?;

    let mut points = Vec::with_capacity(count);
    for z in 0..side {
        for y in 0..side {
            for x in 0..side {
                points.push(Point::new([x, y, z].map(|c| to_coordinate(c, spacing))));
            }
        }
    }

    let mut tetrahedra = Vec::with_capacity(cells.pow(3) * TETRAHEDRA_PER_CUBE);
    for z in 0..cells {
        for y in 0..cells {
            for x in 0..cells {
                for path in &KUHN_PATHS {
                    tetrahedra.push(kuhn_tetrahedron(side, [x, y, z], path));
                }
            }
        }
    }

    let mesh = TetMesh::from_tetrahedra(points, &tetrahedra)?;
    tracing::debug!(
        cells,
        spacing,
        tetrahedra = tetrahedra.len(),
        "generated cube lattice"
    );
    Ok(mesh)
}

#[expect(
    clippy::cast_precision_loss,
    reason = "lattice coordinates are small integers"
)]
fn to_coordinate(index: usize, spacing: f64) -> f64 {
    index as f64 * spacing
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "the corner count was checked against VertexIndex"
)]
fn kuhn_tetrahedron(side: usize, origin: [usize; 3], path: &[usize; 3]) -> [VertexIndex; 4] {
    let mut corner = origin;
    let mut nodes = [0; 4];
    nodes[0] = lattice_vertex(side, corner) as VertexIndex;
    for (slot, &axis) in path.iter().enumerate() {
        corner[axis] += 1;
        nodes[slot + 1] = lattice_vertex(side, corner) as VertexIndex;
    }
    nodes
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn single_cube_is_six_tetrahedra_around_the_diagonal() {
        let mesh = generate_cube_lattice(1, 2.0).unwrap();
        assert_eq!(mesh.number_of_vertices(), 8);
        assert_eq!(mesh.real_tetrahedra().count(), TETRAHEDRA_PER_CUBE);
        // 6 cube faces, 2 triangles each.
        assert_eq!(mesh.number_of_tetrahedra(), TETRAHEDRA_PER_CUBE + 12);
        let far = lattice_vertex(2, [1, 1, 1]);
        for tet in mesh.real_tetrahedra() {
            let nodes = mesh.nodes(tet);
            assert!(nodes.contains(&0));
            assert!(nodes.contains(&(far as VertexIndex)));
        }
        assert_relative_eq!(mesh.points()[far].coords()[2], 2.0);
        mesh.validate().unwrap();
    }

    #[test]
    fn larger_blocks_are_conforming() {
        let mesh = generate_cube_lattice(3, 0.5).unwrap();
        assert_eq!(mesh.number_of_vertices(), 64);
        assert_eq!(mesh.real_tetrahedra().count(), 27 * TETRAHEDRA_PER_CUBE);
        // 6 sides of 9 squares, 2 triangles each.
        assert_eq!(
            mesh.number_of_tetrahedra() - mesh.real_tetrahedra().count(),
            108
        );
        mesh.validate().unwrap();
    }

    #[test]
    fn empty_and_flat_lattices() {
        let empty = generate_cube_lattice(0, 1.0).unwrap();
        assert_eq!(empty.number_of_tetrahedra(), 0);
        assert!(matches!(
            generate_cube_lattice(1, 0.0),
            Err(MeshError::DegenerateTetrahedron { .. })
        ));
        assert!(matches!(
            generate_cube_lattice(1, f64::NAN),
            Err(MeshError::InvalidPoint { .. })
        ));
    }
}
