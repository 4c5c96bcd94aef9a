use crate::core::edge::RingStep;
use crate::core::facet::HalfFace;

use super::SmallBuffer;

// =============================================================================
// ALGORITHM-SPECIFIC BUFFER TYPES
// =============================================================================

/// Number of facets of a tetrahedron.
pub const FACETS_PER_TETRAHEDRON: usize = 4;

/// Inline capacity for edge rings.
///
/// Rings in well-shaped meshes hold 4-7 tetrahedra; slivers and high-valence
/// edges spill to the heap.
pub const RING_BUFFER_SIZE: usize = 16;

/// Half-faces of ball entries removed by a single restoration.
///
/// # Optimization Rationale
///
/// - **Stack Allocation**: A restored tetrahedron owns at most 4 ball entries
/// - **Use Case**: Deciding which facets of the restored tetrahedron become boundary
pub type RemovedFaceBuffer = SmallBuffer<HalfFace, FACETS_PER_TETRAHEDRON>;

/// Ordered tetrahedra around one edge, as produced by
/// [`edge_ring`](crate::core::edge::edge_ring).
///
/// # Examples
///
/// ```rust
/// use tetra_cavity::core::collections::EdgeRingBuffer;
///
/// let ring: EdgeRingBuffer = EdgeRingBuffer::new();
/// assert!(ring.is_empty());
/// ```
pub type EdgeRingBuffer = SmallBuffer<RingStep, RING_BUFFER_SIZE>;
