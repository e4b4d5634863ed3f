//! The `Program` root (spec.md §3): "Root object list plus `imports`,
//! `linker_flags`, `type_exit_fns`, and a `main_function_kind`
//! discriminator."
//!
//! `Program` also owns the three arena-backed tables (`nodes`, `types`,
//! `objects`) that every [`crate::types::NodeId`]/[`crate::types::TypeId`]/
//! [`crate::types::ObjId`] handle indexes into. Nothing outside `Program`
//! owns a node/type/object directly — this is the "single arena, handles
//! everywhere" discipline from `SPEC_FULL.md` §3.

use std::collections::HashMap;
use crate::symbol::Symbol;
use crate::types::ast::{MainFunctionKind, Node, NodeKind};
use crate::types::object::{Object, ObjKind};
use crate::types::ty::{Type, TypeKind};
use crate::types::{IdxVec, NodeId, ObjId, TypeId};

/// The callee prefix every synthesized tuple typedef uses (spec.md §3
/// invariant, §4.1.3): `__csp_tuple_<N>__`.
pub const TUPLE_CALLEE_PREFIX: &str = "__csp_tuple_";
/// The callee prefix every hoisted lambda literal uses (spec.md §3
/// invariant, §4.1.2): `__csp_lambda_lit_<N>__`.
pub const LAMBDA_CALLEE_PREFIX: &str = "__csp_lambda_lit_";

#[derive(Debug, Default)]
pub struct Program {
  pub nodes: IdxVec<NodeId, Node>,
  pub types: IdxVec<TypeId, Type>,
  pub objects: IdxVec<ObjId, Object>,

  /// Program-scope declarations, in source order (functions, globals,
  /// typedefs, namespaces, hoisted lambdas and tuple typedefs appended as
  /// they're synthesized).
  pub root: Vec<ObjId>,

  /// `import "<string>";` paths, collected verbatim (spec.md §4.1.1: "the
  /// external loader fetches them").
  pub imports: Vec<String>,

  /// Accumulated via `[link(...)]`/`[link_dir(...)]`/`[link_obj(...)]`
  /// directives (spec.md §4.1.5).
  pub linker_flags: Vec<String>,

  /// `[exit_fn("T")]` registrations: named type -> the function object
  /// that handles it (spec.md §4.1.5).
  pub type_exit_fns: HashMap<Symbol, ObjId>,

  /// Set once a `main` function is parsed; selects the `_start` stub
  /// (spec.md §4.4 item 7).
  pub main_function_kind: Option<MainFunctionKind>,

  next_tuple_id: u32,
  next_lambda_id: u32,
  next_scratch_id: u32,
}

impl Program {
  #[must_use] pub fn new() -> Self { Self::default() }

  pub fn alloc_node(&mut self, node: Node) -> NodeId { self.nodes.push(node) }
  pub fn alloc_type(&mut self, ty: Type) -> TypeId { self.types.push(ty) }
  pub fn alloc_object(&mut self, obj: Object) -> ObjId { self.objects.push(obj) }

  /// The next free `__csp_tuple_<N>__` counter, for synthesizing a new
  /// tuple typedef (spec.md §4.1.3).
  pub fn next_tuple_name(&mut self) -> String {
    let n = self.next_tuple_id;
    self.next_tuple_id += 1;
    format!("{TUPLE_CALLEE_PREFIX}{n}__")
  }

  /// The next free `__csp_lambda_lit_<N>__` counter (spec.md §3
  /// invariant: "Lambda literals are hoisted to program-scope functions
  /// named `__csp_lambda_lit_<N>__`").
  pub fn next_lambda_name(&mut self) -> String {
    let n = self.next_lambda_id;
    self.next_lambda_id += 1;
    format!("{LAMBDA_CALLEE_PREFIX}{n}__")
  }

  /// A monotonically increasing counter for `for`-range scratch locals
  /// (spec.md §4.4.4: "synthesises two fresh `__csp_` local names from a
  /// monotonically increasing counter").
  pub fn next_scratch_name(&mut self, prefix: &str) -> String {
    let n = self.next_scratch_id;
    self.next_scratch_id += 1;
    format!("__csp_{prefix}_{n}__")
  }

  /// Structural equality over two already-allocated types, recursing
  /// through `kind`/`is_primitive`/base/members (spec.md §4.1.3: "walks
  /// the program objects for any typedef... with the same length and
  /// element-wise structurally equal types (recursively on `kind`,
  /// `is_primitive`, base)"). Used both by tuple deduplication and by the
  /// type checker's `types_equal`.
  #[must_use] pub fn types_structurally_equal(&self, a: TypeId, b: TypeId) -> bool {
    if a == b { return true; }
    let ta = &self.types[a];
    let tb = &self.types[b];
    if ta.is_constant != tb.is_constant { return false; }
    match (&ta.kind, &tb.kind) {
      (TypeKind::Primitive(pa), TypeKind::Primitive(pb)) => pa == pb,
      (TypeKind::Pointer { base: ba }, TypeKind::Pointer { base: bb })
        | (TypeKind::Vla { base: ba }, TypeKind::Vla { base: bb }) =>
        self.types_structurally_equal(*ba, *bb),
      (TypeKind::CArray { base: ba, num_indices: na }, TypeKind::CArray { base: bb, num_indices: nb })
        | (TypeKind::SizedArray { base: ba, num_indices: na }, TypeKind::SizedArray { base: bb, num_indices: nb }) =>
        na == nb && self.types_structurally_equal(*ba, *bb),
      (TypeKind::Function { base: ba, arg_types: aa, is_variadic: va },
       TypeKind::Function { base: bb, arg_types: ab, is_variadic: vb }) =>
        va == vb && aa.len() == ab.len()
          && self.types_structurally_equal(*ba, *bb)
          && aa.iter().zip(ab).all(|(x, y)| self.types_structurally_equal(*x, *y)),
      (TypeKind::Struct { members: ma, is_union: ua }, TypeKind::Struct { members: mb, is_union: ub }) =>
        ua == ub && ma.len() == mb.len()
          && ma.iter().zip(mb).all(|(x, y)| x.name == y.name && self.types_structurally_equal(x.ty, y.ty)),
      (TypeKind::Enum { members: ma }, TypeKind::Enum { members: mb }) =>
        ma.len() == mb.len() && ma.iter().zip(mb).all(|(x, y)| x.name == y.name),
      (TypeKind::Named { id: ia, .. }, TypeKind::Named { id: ib, .. }) => ia == ib,
      _ => false,
    }
  }

  /// Find an existing `__csp_tuple_<N>__` typedef whose member list is
  /// structurally equal to `members` (spec.md §4.1.3). Returns the
  /// typedef's `ObjId` on a hit.
  #[must_use] pub fn find_dedup_tuple(&self, member_types: &[TypeId]) -> Option<ObjId> {
    'outer: for (obj_id, obj) in self.objects.iter() {
      if obj.kind != ObjKind::Typedef { continue; }
      let name = obj.id.name.to_string();
      if !name.starts_with(TUPLE_CALLEE_PREFIX) { continue; }
      let TypeKind::Struct { members, is_union: false } = &self.types[obj.ty].kind else { continue };
      if members.len() != member_types.len() { continue; }
      for (m, want) in members.iter().zip(member_types) {
        if !self.types_structurally_equal(m.ty, *want) { continue 'outer; }
      }
      return Some(obj_id);
    }
    None
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::symbol::intern;
  use crate::token::Span;
  use crate::types::ty::{Member, Primitive};
  use crate::types::ident::Identifier;

  #[test]
  fn structurally_equal_primitives() {
    let mut p = Program::new();
    let a = p.alloc_type(Type::primitive(Primitive::I32, Span::default()));
    let b = p.alloc_type(Type::primitive(Primitive::I32, Span::default()));
    let c = p.alloc_type(Type::primitive(Primitive::Bool, Span::default()));
    assert!(p.types_structurally_equal(a, b));
    assert!(!p.types_structurally_equal(a, c));
  }

  #[test]
  fn tuple_dedup_finds_structurally_equal_typedef() {
    let mut p = Program::new();
    let i32_ty = p.alloc_type(Type::primitive(Primitive::I32, Span::default()));
    let bool_ty = p.alloc_type(Type::primitive(Primitive::Bool, Span::default()));
    let struct_ty = p.alloc_type(Type {
      kind: TypeKind::Struct {
        members: vec![
          Member { name: intern("_0"), ty: i32_ty },
          Member { name: intern("_1"), ty: bool_ty },
        ],
        is_union: false,
      },
      is_constant: false, span: Span::default(), size: None, align: None, semantic_id: None,
    });
    let name = p.next_tuple_name();
    let obj = Object::new(ObjKind::Typedef, Identifier::new(intern(&name)), struct_ty, Span::default());
    p.alloc_object(obj);

    assert!(p.find_dedup_tuple(&[i32_ty, bool_ty]).is_some());
    assert!(p.find_dedup_tuple(&[bool_ty, i32_ty]).is_none());
  }
}
