//! Identifiers (spec.md §3: "A name with optional outer identifier
//! (namespace chain), a `global_scope` flag (leading `::`), and a kind
//! tag... Identifiers compare by full chain equality.").

use crate::symbol::Symbol;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentKind {
  Regular,
  Namespace,
}

/// A (possibly namespaced) name, e.g. `foo`, `ns::foo`, `::foo`.
#[derive(Debug, Clone)]
pub struct Identifier {
  pub name: Symbol,
  pub outer: Option<Box<Identifier>>,
  pub global_scope: bool,
  pub kind: IdentKind,
  /// True for a synthesized name (tuple dedup, lambda hoisting) whose
  /// symbol text is already the final `__csp_...` spelling (spec.md §3,
  /// §4.1.2/§4.1.3 invariants) — [`Identifier::mangled`] returns it
  /// verbatim instead of adding a second `__csp_` prefix.
  literal: bool,
}

// Identifiers compare by full chain equality (spec.md §3); `global_scope`
// and `kind` are parse-time annotations, not part of identity.
impl PartialEq for Identifier {
  fn eq(&self, other: &Self) -> bool { self.chain() == other.chain() }
}
impl Eq for Identifier {}

impl Identifier {
  #[must_use] pub fn new(name: Symbol) -> Self {
    Identifier { name, outer: None, global_scope: false, kind: IdentKind::Regular, literal: false }
  }

  /// A single-segment identifier whose symbol text is already the final
  /// mangled spelling (`__csp_tuple_0__`, `__csp_lambda_lit_0__`, ...) —
  /// used for the parser's own synthesized names, which must not be
  /// mangled a second time.
  #[must_use] pub fn mangled_literal(name: Symbol) -> Self {
    Identifier { name, outer: None, global_scope: false, kind: IdentKind::Regular, literal: true }
  }

  #[must_use] pub fn with_outer(mut self, outer: Identifier) -> Self {
    self.outer = Some(Box::new(outer));
    self
  }

  #[must_use] pub fn global(mut self) -> Self {
    self.global_scope = true;
    self
  }

  #[must_use] pub fn namespace(mut self) -> Self {
    self.kind = IdentKind::Namespace;
    self
  }

  /// Full dotted/`::`-joined chain, outer-most first. Used for C
  /// identifier mangling (spec.md §4.4.1) and for equality/display.
  #[must_use] pub fn chain(&self) -> Vec<Symbol> {
    let mut out = self.outer.as_ref().map(|o| o.chain()).unwrap_or_default();
    out.push(self.name);
    out
  }

  #[must_use] pub fn mangled(&self) -> String {
    if self.literal { return self.name.to_string(); }
    let chain = self.chain();
    let joined = chain.iter().map(ToString::to_string).collect::<Vec<_>>().join("_");
    format!("__csp_{joined}")
  }
}

impl std::fmt::Display for Identifier {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    if self.global_scope { write!(f, "::")?; }
    let chain = self.chain();
    for (i, s) in chain.iter().enumerate() {
      if i > 0 { write!(f, "::")?; }
      write!(f, "{s}")?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::symbol::intern;

  #[test]
  fn chain_equality_ignores_unrelated_fields() {
    let a = Identifier::new(intern("foo")).with_outer(Identifier::new(intern("ns")));
    let b = Identifier::new(intern("foo")).with_outer(Identifier::new(intern("ns")));
    assert_eq!(a, b);
    assert_eq!(a.chain(), vec![intern("ns"), intern("foo")]);
  }

  #[test]
  fn mangled_flattens_namespace_chain_with_underscore_and_prefix() {
    let id = Identifier::new(intern("bar")).with_outer(Identifier::new(intern("foo")));
    assert_eq!(id.mangled(), "__csp_foo_bar");
  }

  #[test]
  fn mangled_literal_is_not_prefixed_a_second_time() {
    let id = Identifier::mangled_literal(intern("__csp_tuple_0__"));
    assert_eq!(id.mangled(), "__csp_tuple_0__");
  }

  #[test]
  fn global_scope_flag_does_not_affect_chain_equality() {
    let a = Identifier::new(intern("x"));
    let b = Identifier::new(intern("x")).global();
    assert_eq!(a, b, "global_scope is a parse-time flag, not part of structural chain identity");
  }
}
