//! # tetra-cavity
//!
//! Cavity repair for constrained 3D Delaunay insertion.
//!
//! Inserting a point into a tetrahedral mesh carves a *cavity*: the set of
//! tetrahedra whose circumspheres contain the point. Before the cavity can be
//! re-filled by joining the point to its boundary, two conditions must hold:
//!
//! - the boundary (the *ball*) must be star-shaped with respect to the point,
//!   so that every new tetrahedron has positive volume;
//! - no constrained edge may be swallowed by the cavity, otherwise it would
//!   vanish from the mesh.
//!
//! This crate repairs cavities that violate either condition by *restoring*
//! (un-deleting) tetrahedra until both hold again.
//!
//! # Features
//!
//! - Array-based tetrahedral mesh ([`TetMesh`](core::tet_mesh::TetMesh)) with
//!   ghost tetrahedra closing the hull and packed half-face adjacency
//! - Cavity bookkeeping ([`CavityWorkingSet`](core::cavity::CavityWorkingSet))
//!   with boundary consistency checks
//! - Exact orientation tests through the [`robust`] crate
//! - Constrained-edge recovery by walking edge rings
//! - Serialization/Deserialization with [serde](https://serde.rs)
//!
//! # Basic Usage
//!
//! ```rust
//! use tetra_cavity::prelude::*;
//!
//! // Two tetrahedra glued along triangle (1, 2, 3). Seen from the new point,
//! // the far side of the second one faces away.
//! let points = vec![
//!     Point::new([0.0, 0.0, 0.0]),
//!     Point::new([1.0, 0.0, 0.0]),
//!     Point::new([0.0, 1.0, 0.0]),
//!     Point::new([0.0, 0.0, 1.0]),
//!     Point::new([1.5, 1.5, -1.9]),
//! ];
//! let mut mesh = TetMesh::from_tetrahedra(points, &[[0, 1, 2, 3], [1, 2, 3, 4]]).unwrap();
//! let vertex = mesh.add_vertex(Point::new([0.2, 0.2, 0.2])).unwrap();
//!
//! let mut cavity = CavityWorkingSet::new();
//! let checkpoint = cavity.carve(&mut mesh, &[0, 1]).unwrap();
//!
//! let recovery = respect_edge_constraint(&mut cavity, &mut mesh, vertex, 1, checkpoint).unwrap();
//! assert_eq!(recovery.rescued, 0);
//!
//! let stats = reshape_cavity_if_needed(&mut cavity, &mut mesh, vertex, checkpoint).unwrap();
//! assert_eq!(stats.restored, 1);
//! assert_eq!(cavity.deleted(), &[0]);
//! ```
//!
//! # Conventions
//!
//! - Real tetrahedra are negatively oriented: `orient3d(n0, n1, n2, n3) < 0`.
//! - Facet `i` of a tetrahedron is the triangle opposite node `i`.
//! - Hull triangles are closed by ghost tetrahedra carrying
//!   [`GHOST_VERTEX`](core::tet_mesh::GHOST_VERTEX) in their last slot.
//! - A ball face is stored as seen from the surviving tetrahedron outside
//!   the cavity, so an inserted point sees it when
//!   `orient3d(point, a, b, c) < 0`.
//!
//! Logging goes through [`tracing`]: `debug` events summarize each operation
//! and `trace` events report individual blind faces and ring walks.

// Allow multiple crate versions due to transitive dependencies
#![expect(clippy::multiple_crate_versions)]
// Forbid unsafe code throughout the entire crate
#![forbid(unsafe_code)]

#[macro_use]
extern crate derive_builder;

/// The `core` module contains the mesh store, the cavity working set and the
/// repair algorithms that operate on them.
pub mod core {
    /// Cavity repair algorithms
    pub mod algorithms {
        /// Constrained-edge recovery by edge-ring walks
        pub mod edge_recovery;
        /// Star-shape driver
        pub mod reshape;
        /// Single tetrahedron restoration
        pub mod restoration;
        /// Blind face detection
        pub mod star_shape;

        pub use edge_recovery::*;
        pub use reshape::*;
        pub use restoration::*;
        pub use star_shape::*;
    }
    pub mod cavity;
    /// High-performance collection aliases and small buffers
    pub mod collections;
    pub mod edge;
    pub mod facet;
    pub mod tet_mesh;

    pub use cavity::*;
    pub use edge::*;
    pub use facet::*;
    pub use tet_mesh::*;
}

/// Contains geometric types and predicates.
pub mod geometry {
    pub mod point;
    pub mod predicates;
    pub mod util;

    pub use point::*;
    pub use predicates::*;
    pub use util::*;
}

/// A prelude module that re-exports commonly used types.
/// This makes it easier to import the most commonly used items from the crate.
pub mod prelude {
    // Re-export from core
    pub use crate::core::{
        algorithms::{edge_recovery::*, reshape::*, restoration::*, star_shape::*},
        cavity::*,
        edge::*,
        facet::*,
        tet_mesh::*,
    };

    // Re-export commonly used collection types from core::collections
    pub use crate::core::collections::{FastHashMap, FastHashSet, SmallBuffer};

    // Re-export from geometry
    pub use crate::geometry::{point::*, predicates::*, util::*};
}

/// The function `is_normal` checks that structs implement `auto` traits.
/// Traits are checked at compile time, so this function is only used for
/// testing.
#[must_use]
pub const fn is_normal<T: Sized + Send + Sync + Unpin>() -> bool {
    true
}

// =============================================================================
// TESTS
// =============================================================================
