use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

/// Compact index type for facet and edge positions within a tetrahedron.
///
/// A tetrahedron has 4 facets and 6 edges, so `u8` is plenty.
///
/// # Examples
///
/// ```rust
/// use tetra_cavity::core::collections::FacetIndex;
///
/// let facet: FacetIndex = 2;
/// assert_eq!(usize::from(facet), 2);
/// ```
pub type FacetIndex = u8;

// =============================================================================
// CORE OPTIMIZED TYPES
// =============================================================================

/// Optimized `HashMap` type for performance-critical operations.
/// Uses `rustc_hash::FxHasher` for faster hashing in non-cryptographic contexts.
///
/// # Security Warning
///
/// ⚠️ **Not DoS-resistant**: Do not use with attacker-controlled keys.
///
/// # Examples
///
/// ```rust
/// use tetra_cavity::core::collections::FastHashMap;
///
/// let mut map: FastHashMap<usize, u8> = FastHashMap::default();
/// *map.entry(7).or_default() |= 0b10;
/// assert_eq!(map[&7], 0b10);
/// ```
pub type FastHashMap<K, V> = FxHashMap<K, V>;

/// Re-export the Entry enum for `FastHashMap`.
pub use std::collections::hash_map::Entry;

/// Optimized `HashSet` type for membership tests on trusted internal data.
///
/// # Examples
///
/// ```rust
/// use tetra_cavity::core::collections::FastHashSet;
///
/// let mut set: FastHashSet<usize> = FastHashSet::default();
/// assert!(set.insert(3));
/// assert!(!set.insert(3));
/// ```
pub type FastHashSet<T> = FxHashSet<T>;

/// Small-optimized Vec that uses stack allocation for small collections.
///
/// # Size Guidelines
///
/// - **N=4**: Facets of one tetrahedron, ball faces removed by one restoration
/// - **N=16**: Edge rings (typical rings hold 4-7 tetrahedra)
///
/// # Examples
///
/// ```rust
/// use tetra_cavity::core::collections::SmallBuffer;
///
/// let mut buffer: SmallBuffer<i32, 4> = SmallBuffer::new();
/// buffer.extend([1, 2, 3]);
/// assert!(!buffer.spilled());
/// ```
pub type SmallBuffer<T, const N: usize> = SmallVec<[T; N]>;
