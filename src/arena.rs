//! The bump arena that backs every AST node, type and object allocated
//! during a single compilation.
//!
//! Per spec (`SPEC_FULL.md` §2/§5), all nodes/types/objects live in one
//! arena that is freed as a single unit at the end of compilation; no
//! individual node is ever destroyed earlier. We realize this with
//! `bumpalo`, the same crate `mmcc` depends on for its AST/MIR arenas.

use bumpalo::Bump;
use std::cell::Cell;

/// Owns the bump allocator for one compilation unit.
///
/// `Arena` does not implement `Drop` logic beyond what `Bump` already
/// does: dropping the `Arena` (or calling [`Arena::free_all`], which
/// resets the underlying `Bump`) releases every allocation made through
/// it in one shot. Lists and maps built with [`Arena::alloc`] never need
/// individual frees.
pub struct Arena {
  bump: Bump,
  // Monotonic counters used by handle-producing subsystems (tuple dedup,
  // lambda hoisting, `for`-range scratch locals) that need a unique
  // per-arena id but not an allocation.
  next_id: Cell<u32>,
}

impl Default for Arena {
  fn default() -> Self { Self::new() }
}

impl Arena {
  #[must_use] pub fn new() -> Self {
    Arena { bump: Bump::new(), next_id: Cell::new(0) }
  }

  /// Allocate `value` in the arena and return a reference whose lifetime
  /// is tied to the arena. This is the Rust equivalent of the spec's
  /// `Arena::alloc(size)` — bumpalo computes the size from `T`.
  pub fn alloc<T>(&self, value: T) -> &mut T {
    self.bump.alloc(value)
  }

  /// Allocate a growable vector backed by this arena. Stands in for the
  /// spec's `register_list`: the list's storage is carved out of (and
  /// released together with) the arena, rather than tracked separately.
  #[must_use] pub fn alloc_vec<T>(&self) -> bumpalo::collections::Vec<'_, T> {
    bumpalo::collections::Vec::new_in(&self.bump)
  }

  /// A process-unique small integer, used for `__csp_tuple_<N>__`,
  /// `__csp_lambda_lit_<N>__` and `for`-range scratch-local naming.
  pub fn next_counter(&self) -> u32 {
    let id = self.next_id.get();
    self.next_id.set(id + 1);
    id
  }

  /// Release every allocation made through this arena. Equivalent to
  /// constructing a fresh `Arena`, but keeps the counters so that
  /// re-running a phase on the same arena (as tests sometimes do to
  /// check idempotence) still gets unique ids. Prefer just dropping the
  /// `Arena` in non-test code.
  pub fn free_all(&mut self) {
    self.bump.reset();
  }

  #[must_use] pub fn allocated_bytes(&self) -> usize {
    self.bump.allocated_bytes()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn alloc_roundtrips_value() {
    let arena = Arena::new();
    let x = arena.alloc(42i32);
    assert_eq!(*x, 42);
  }

  #[test]
  fn counters_are_monotonic_and_unique() {
    let arena = Arena::new();
    let a = arena.next_counter();
    let b = arena.next_counter();
    assert_ne!(a, b);
    assert_eq!(b, a + 1);
  }

  #[test]
  fn free_all_releases_bytes() {
    let mut arena = Arena::new();
    arena.alloc([0u8; 4096]);
    assert!(arena.allocated_bytes() > 0);
    arena.free_all();
    assert_eq!(arena.allocated_bytes(), 0);
  }
}
