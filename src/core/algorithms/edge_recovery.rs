//! Constrained-edge recovery.
//!
//! Deleting every tetrahedron around a constrained edge would remove that edge
//! from the mesh: the cavity filling only creates edges incident to the new
//! point. [`respect_edge_constraint`] walks the ring of every constrained edge
//! of the tetrahedra deleted for the current insertion, and when a ring lies
//! entirely inside the cavity it restores one ring member so the edge survives.
//!
//! The member restored is the one whose opposite edge (the edge joining its
//! two nodes off the ring's edge) has its midpoint farthest from the inserted
//! point; ties go to the lowest tetrahedron index. The tetrahedron containing
//! the point and ghost tetrahedra are never chosen.
//!
//! Restoring for constraint reasons can expose new blind faces, so the reshape
//! driver runs afterwards.

use crate::core::algorithms::reshape::ReshapeConfig;
use crate::core::algorithms::restoration::restore_tetrahedron;
use crate::core::cavity::{CavityError, CavityWorkingSet};
use crate::core::collections::FastHashMap;
use crate::core::edge::{RingStep, edge_ring};
use crate::core::tet_mesh::{TetFlags, TetMesh, VertexIndex};
use crate::geometry::point::Point;

/// Work done by one call to [`respect_edge_constraint`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgeRecoveryStatistics {
    /// Distinct constrained edges whose ring was walked.
    pub rings_walked: usize,
    /// Tetrahedra restored to keep a constrained edge.
    pub rescued: usize,
}

/// Per-call visited marks: one bit per local edge of each tetrahedron.
#[derive(Debug, Default)]
struct VisitedEdges(FastHashMap<usize, u8>);

impl VisitedEdges {
    fn contains(&self, tet: usize, edge: usize) -> bool {
        self.0.get(&tet).is_some_and(|bits| bits & (1 << edge) != 0)
    }

    /// Marks the edge, returning false if it was already marked.
    fn insert(&mut self, tet: usize, edge: usize) -> bool {
        let bits = self.0.entry(tet).or_default();
        let fresh = *bits & (1 << edge) == 0;
        *bits |= 1 << edge;
        fresh
    }
}

/// Rescues constrained edges swallowed by the cavity, using
/// [`ReshapeConfig::default`].
///
/// # Errors
///
/// See [`respect_edge_constraint_with_config`].
pub fn respect_edge_constraint(
    working_set: &mut CavityWorkingSet,
    mesh: &mut TetMesh,
    vertex: VertexIndex,
    color: u16,
    checkpoint: usize,
) -> Result<EdgeRecoveryStatistics, CavityError> {
    respect_edge_constraint_with_config(
        working_set,
        mesh,
        vertex,
        color,
        checkpoint,
        &ReshapeConfig::default(),
    )
}

/// Rescues constrained edges swallowed by the cavity.
///
/// Only tetrahedra deleted since `checkpoint` are examined, and
/// `working_set.deleted()[checkpoint]` is taken to be the tetrahedron
/// containing `vertex`. Restored tetrahedra, and the tetrahedra deleted since
/// `checkpoint` that are still deleted on return, get color `color`.
///
/// # Errors
///
/// - [`CavityError::UnknownVertex`] or [`CavityError::InvalidCheckpoint`] for
///   bad input.
/// - [`CavityError::NoRescueCandidate`] if a swallowed ring has no member that
///   may be restored.
/// - Ring walk errors ([`CavityError::RingNotClosed`],
///   [`CavityError::BrokenRing`]) and restoration errors.
/// - With consistency checks, [`CavityError::PointOutsideStartTetrahedron`] and
///   [`CavityError::RingRevisited`].
///
/// # Examples
///
/// ```rust
/// use tetra_cavity::core::algorithms::edge_recovery::respect_edge_constraint;
/// use tetra_cavity::core::cavity::CavityWorkingSet;
/// use tetra_cavity::core::tet_mesh::TetMesh;
/// use tetra_cavity::geometry::point::Point;
///
/// // Three tetrahedra around the edge (0, 1).
/// let points = vec![
///     Point::new([0.0, 0.0, -1.0]),
///     Point::new([0.0, 0.0, 1.0]),
///     Point::new([1.0, 0.0, 0.0]),
///     Point::new([-0.5, 0.8, 0.0]),
///     Point::new([-0.5, -0.8, 0.0]),
/// ];
/// let tets = [[0, 1, 2, 3], [0, 1, 3, 4], [0, 1, 4, 2]];
/// let mut mesh = TetMesh::from_tetrahedra(points, &tets).unwrap();
/// mesh.constrain_edge(0, 1).unwrap();
/// let vertex = mesh.add_vertex(Point::new([0.3, 0.2, 0.1])).unwrap();
///
/// let mut cavity = CavityWorkingSet::new();
/// let checkpoint = cavity.carve(&mut mesh, &[0, 1, 2]).unwrap();
/// let stats = respect_edge_constraint(&mut cavity, &mut mesh, vertex, 7, checkpoint).unwrap();
///
/// assert_eq!(stats.rescued, 1);
/// assert_eq!(cavity.deleted().len(), 2);
/// assert!(cavity.deleted().iter().all(|&t| mesh.color(t) == 7));
/// ```
pub fn respect_edge_constraint_with_config(
    working_set: &mut CavityWorkingSet,
    mesh: &mut TetMesh,
    vertex: VertexIndex,
    color: u16,
    checkpoint: usize,
    config: &ReshapeConfig,
) -> Result<EdgeRecoveryStatistics, CavityError> {
    let point = *mesh
        .point(vertex)
        .ok_or(CavityError::UnknownVertex { vertex })?;
    let deleted = working_set.deleted().len();
    if checkpoint > deleted {
        return Err(CavityError::InvalidCheckpoint {
            checkpoint,
            deleted,
        });
    }

    let mut stats = EdgeRecoveryStatistics::default();
    let fresh: Vec<usize> = working_set.deleted()[checkpoint..].to_vec();
    let Some(&start) = fresh.first() else {
        return Ok(stats);
    };
    if config.consistency_checks && !mesh.is_ghost(start) && !mesh.contains(start, &point) {
        return Err(CavityError::PointOutsideStartTetrahedron { tet: start, vertex });
    }

    let mut visited = VisitedEdges::default();
    for &tet in &fresh {
        if !mesh.flags(tet).intersects(TetFlags::EDGES) {
            continue;
        }
        for edge in 0..6 {
            if !mesh.is_deleted(tet) {
                break;
            }
            if !mesh.edge_constraint(tet, edge) || visited.contains(tet, edge) {
                continue;
            }

            let ring = edge_ring(mesh, tet, edge)?;
            stats.rings_walked += 1;
            let mut swallowed = true;
            for step in &ring {
                if !visited.insert(step.tet(), step.edge()) && config.consistency_checks {
                    return Err(CavityError::RingRevisited {
                        tet: step.tet(),
                        edge: step.edge(),
                    });
                }
                swallowed &= mesh.is_deleted(step.tet());
            }
            if !swallowed {
                continue;
            }

            let rescued = farthest_member(mesh, &ring, start, &point)
                .ok_or(CavityError::NoRescueCandidate { tet, edge })?;
            mesh.set_color(rescued, color);
            restore_tetrahedron(working_set, mesh, rescued, config)?;
            stats.rescued += 1;
            tracing::debug!(
                tet,
                edge,
                rescued,
                ring = ring.len(),
                "restored tetrahedron to keep constrained edge"
            );
        }
    }

    // Restoring moves list entries across the checkpoint, so color from the snapshot.
    for &tet in &fresh {
        if mesh.is_deleted(tet) {
            mesh.set_color(tet, color);
        }
    }
    Ok(stats)
}

/// Ring member, other than `start` and ghosts, whose opposite edge midpoint is
/// farthest from `point`. Ties go to the lowest tetrahedron index.
fn farthest_member(mesh: &TetMesh, ring: &[RingStep], start: usize, point: &Point) -> Option<usize> {
    let mut best: Option<(f64, usize)> = None;
    for step in ring.iter().filter(|s| s.tet() != start) {
        let Some(midpoint) = step.opposite_midpoint(mesh) else {
            continue;
        };
        let distance = midpoint.squared_distance(point);
        let better = match best {
            None => true,
            Some((d, t)) => distance > d || (distance == d && step.tet() < t),
        };
        if better {
            best = Some((distance, step.tet()));
        }
    }
    best.map(|(_, tet)| tet)
}
