//! Collection aliases and helpers used throughout the crate.
//!
//! Hash-based containers use `rustc_hash` (fast, not DoS resistant) and small
//! temporary buffers use `smallvec`, so the hot paths of cavity repair do not
//! allocate for typical inputs.

mod aliases;
mod buffers;

pub use aliases::*;
pub use buffers::*;

/// Removes the last occurrence of `value` from `items` by swapping in the
/// last element, returning whether anything was removed.
///
/// Order is not preserved. The scan runs from the back because values pushed
/// recently are the ones most often removed again.
///
/// # Examples
///
/// ```rust
/// use tetra_cavity::core::collections::swap_remove_value;
///
/// let mut deleted = vec![4, 9, 2, 7];
/// assert!(swap_remove_value(&mut deleted, &9));
/// assert_eq!(deleted, vec![4, 7, 2]);
/// assert!(!swap_remove_value(&mut deleted, &9));
/// ```
pub fn swap_remove_value<T: PartialEq>(items: &mut Vec<T>, value: &T) -> bool {
    match items.iter().rposition(|item| item == value) {
        Some(index) => {
            items.swap_remove(index);
            true
        }
        None => false,
    }
}
