//! String interning for identifiers and literals.
//!
//! Every [`Symbol`] is a small `Copy` index into a process-wide string
//! table. This mirrors the dense-symbol-map pattern used for keyword
//! lookup in `mmcc`'s `types::entity` module, generalized to arbitrary
//! user identifiers rather than just a fixed primop keyword set.

use std::cell::RefCell;
use std::fmt;
use hashbrown::HashMap;

/// An interned string. Cheap to copy and compare.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(u32);

impl fmt::Debug for Symbol {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:?}", self.as_str())
  }
}

impl fmt::Display for Symbol {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.as_str())
  }
}

impl Symbol {
  /// Look up the underlying string. Panics if the symbol did not come
  /// from [`intern`] (can't happen in safe usage since `Symbol` has no
  /// public constructor).
  #[must_use] pub fn as_str(self) -> std::rc::Rc<str> {
    INTERNER.with(|i| i.borrow().strings[self.0 as usize].clone())
  }

  #[must_use] pub fn into_usize(self) -> usize { self.0 as usize }
}

#[derive(Default)]
struct Interner {
  map: HashMap<std::rc::Rc<str>, u32>,
  strings: Vec<std::rc::Rc<str>>,
}

impl Interner {
  fn intern(&mut self, s: &str) -> Symbol {
    if let Some(&id) = self.map.get(s) {
      return Symbol(id);
    }
    let id = u32::try_from(self.strings.len()).expect("too many interned symbols");
    let rc: std::rc::Rc<str> = std::rc::Rc::from(s);
    self.strings.push(rc.clone());
    self.map.insert(rc, id);
    Symbol(id)
  }
}

thread_local! {
  static INTERNER: RefCell<Interner> = RefCell::new(Interner::default());
}

/// Intern a string, returning a cheap-to-copy [`Symbol`] handle.
pub fn intern(s: &str) -> Symbol {
  INTERNER.with(|i| i.borrow_mut().intern(s))
}

/// Build a dense `Symbol -> T` lookup table out of `(Symbol, T)` pairs,
/// sized to the interner's current high-water mark. Used for mapping
/// interned keyword/builtin-name symbols to their tag without a hash
/// lookup on the hot path, the same trick `entity.rs`'s `from_symbol`
/// uses via its `SYMBOL_MAP`.
#[must_use]
pub fn init_dense_symbol_map<T: Copy>(pairs: &[(Symbol, T)]) -> Box<[Option<T>]> {
  let max = pairs.iter().map(|(s, _)| s.into_usize()).max().unwrap_or(0);
  let mut map = vec![None; max + 1].into_boxed_slice();
  for &(s, t) in pairs {
    map[s.into_usize()] = Some(t);
  }
  map
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn interning_is_deduplicated() {
    let a = intern("foo");
    let b = intern("foo");
    let c = intern("bar");
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(&*a.as_str(), "foo");
  }
}
