//! The type checker (spec.md §4.3): "walks the built AST, resolves named
//! types against the object table, infers the data type of every
//! expression node, and inserts implicit-cast nodes wherever an operand's
//! type doesn't match its context but is implicitly convertible."
//!
//! Structured the way `typechecker.c`'s `ast_iterate` dispatch table is:
//! a single depth-first pass, bottom-up so a parent only ever consults
//! an already-processed child's `data_type`, that both infers a node's
//! `data_type` and runs the node-kind-specific rule that C file keys off
//! `ND_CALL`/`ND_CAST`/`ND_ASSIGN`/`ND_ARRAY`. `infer` walks its own
//! recursion (rather than the generic [`crate::visitor::walk`]) because
//! block/`with`/`for`-range scoping needs to register a local strictly
//! between processing its initializer and its users, which a
//! context-free enter/leave pair can't express; the emitter has the same
//! shape for the same reason (see `codegen`).

mod infer;
mod layout;
mod resolve;

pub use resolve::resolve_program;

use crate::error::{err, ErrorKind, Result};
use crate::token::SourceFile;
use crate::types::object::ObjKind;
use crate::types::program::Program;
use crate::types::ty::{Primitive, TypeKind};
use crate::types::TypeId;

/// Runs name resolution, layout computation, and the full
/// inference/rule-checking pass over every root function/global
/// initializer (spec.md §4.3).
pub fn check_program(program: &mut Program, source: &SourceFile, diags: &mut crate::error::Diagnostics) -> Result<()> {
  resolve::resolve_program(program, source)?;
  layout::compute_layouts(program);
  infer::check_all(program, source, diags)?;
  layout::compute_layouts(program); // locals/with/for-range vars may have just gained a concrete type
  Ok(())
}

/// Follows a `Named` type to the type its typedef object actually holds,
/// recursing through typedef chains (`type A: B; type B: i32;`). Mirrors
/// `unpack()` in `typechecker.c`, which dereferences `TY_UNDEF` to the
/// referenced object's type before every structural question.
#[must_use]
pub fn unpack(program: &Program, mut ty: TypeId) -> TypeId {
  let mut guard = 0;
  loop {
    guard += 1;
    if guard > 64 { return ty; } // defends against a typedef cycle slipping past resolution
    match &program.types[ty].kind {
      TypeKind::Named { referenced_obj, .. } => {
        let Some(obj_id) = referenced_obj.get() else { return ty };
        let obj = &program.objects[obj_id];
        if obj.kind != ObjKind::Typedef { return ty; }
        ty = obj.ty;
      }
      TypeKind::Typeof { expr } => {
        let Some(inner) = program.nodes[*expr].data_type else { return ty };
        if inner == ty { return ty; }
        ty = inner;
      }
      _ => return ty,
    }
  }
}

/// Structural type equality used by the checker itself (spec.md §4.3,
/// `typechecker.c`'s `types_equal`). Differs from
/// [`Program::types_structurally_equal`] in exactly the way the original
/// does: a C array and a pointer to the same base compare equal here
/// (array-to-pointer decay), and array lengths are not part of identity —
/// that stricter, length-sensitive comparison is reserved for tuple
/// deduplication.
#[must_use]
pub fn types_equal(program: &Program, a: TypeId, b: TypeId) -> bool {
  let a = unpack(program, a);
  let b = unpack(program, b);
  if a == b { return true; }
  let ta = &program.types[a];
  let tb = &program.types[b];
  if ta.is_constant != tb.is_constant { return false; }
  match (&ta.kind, &tb.kind) {
    (TypeKind::Primitive(pa), TypeKind::Primitive(pb)) => pa == pb,
    (TypeKind::Pointer { base: ba } | TypeKind::CArray { base: ba, .. },
     TypeKind::Pointer { base: bb } | TypeKind::CArray { base: bb, .. }) => types_equal(program, *ba, *bb),
    (TypeKind::SizedArray { base: ba, num_indices: na }, TypeKind::SizedArray { base: bb, num_indices: nb }) =>
      na == nb && types_equal(program, *ba, *bb),
    (TypeKind::Vla { base: ba }, TypeKind::Vla { base: bb }) => types_equal(program, *ba, *bb),
    (TypeKind::Struct { members: ma, is_union: ua }, TypeKind::Struct { members: mb, is_union: ub }) =>
      ua == ub && ma.len() == mb.len()
        && ma.iter().zip(mb).all(|(x, y)| x.name == y.name && types_equal(program, x.ty, y.ty)),
    (TypeKind::Enum { members: ma }, TypeKind::Enum { members: mb }) =>
      ma.len() == mb.len() && ma.iter().zip(mb).all(|(x, y)| x.name == y.name),
    (TypeKind::Function { base: ba, arg_types: aa, is_variadic: va },
     TypeKind::Function { base: bb, arg_types: ab, is_variadic: vb }) =>
      va == vb && aa.len() == ab.len() && types_equal(program, *ba, *bb)
        && aa.iter().zip(ab).all(|(x, y)| types_equal(program, *x, *y)),
    (TypeKind::Named { id: ia, .. }, TypeKind::Named { id: ib, .. }) => ia == ib,
    _ => false,
  }
}

fn as_primitive(program: &Program, ty: TypeId) -> Option<Primitive> {
  match &program.types[unpack(program, ty)].kind {
    TypeKind::Primitive(p) => Some(*p),
    _ => None,
  }
}

/// Is `from` implicitly convertible to `to` (spec.md §4.3,
/// `typechecker.c`'s `implicitly_castable`)? A float-to-int conversion is
/// allowed but files a [`crate::error::Diagnostics::warn_cast`] warning,
/// never a hard error — narrowing int-to-int is silently allowed, exactly
/// as the original (its own narrowing warning is commented out).
pub fn implicitly_castable(
  program: &Program, diags: &mut crate::error::Diagnostics, source: &SourceFile,
  span: crate::token::Span, from: TypeId, to: TypeId,
) -> bool {
  let from_p = as_primitive(program, from);
  let to_p = as_primitive(program, to);
  if let (Some(fp), Some(tp)) = (from_p, to_p) {
    if fp.is_integer() && tp.is_integer() { return true; }
    if fp.is_float() && tp.is_float() { return true; }
    if fp.is_integer() && tp.is_float() { return true; }
    if fp.is_float() && tp.is_integer() {
      diags.warn_cast(source, span, format!("implicitly casting from `{fp:?}` to `{tp:?}`"));
      return true;
    }
  }
  let from_u = unpack(program, from);
  let to_u = unpack(program, to);
  match (&program.types[from_u].kind, &program.types[to_u].kind) {
    (TypeKind::Pointer { .. } | TypeKind::CArray { .. }, TypeKind::Pointer { .. }) => true,
    (TypeKind::SizedArray { .. }, TypeKind::Vla { .. }) => true,
    (TypeKind::Pointer { base }, TypeKind::Vla { base: to_base }) => {
      matches!(program.types[unpack(program, *base)].kind, TypeKind::SizedArray { base: inner, .. }
        if types_equal(program, inner, *to_base))
    }
    _ => false,
  }
}

/// Produces the node that performs the conversion (spec.md §4.3,
/// `typechecker.c`'s `implicit_cast`): an explicit `&expr` for the
/// sized-array -> VLA rule (since a VLA is represented as a pointer to a
/// length-prefixed struct), an implicit [`crate::types::ast::NodeKind::Cast`]
/// otherwise.
pub fn implicit_cast(
  program: &mut Program, expr: crate::types::NodeId, to: TypeId,
) -> crate::types::NodeId {
  use crate::types::ast::{Node, NodeKind};
  let span = program.nodes[expr].span;
  let from_ty = program.nodes[expr].data_type.unwrap_or(to);
  if matches!(program.types[unpack(program, from_ty)].kind, TypeKind::SizedArray { .. })
    && matches!(program.types[unpack(program, to)].kind, TypeKind::Vla { .. })
  {
    let mut node = Node::new(NodeKind::AddrOf { operand: expr }, span);
    node.data_type = Some(to);
    return program.alloc_node(node);
  }
  let mut node = Node::new(NodeKind::Cast { operand: expr, target: to, is_implicit: true }, span);
  node.data_type = Some(to);
  program.alloc_node(node)
}

pub(crate) fn type_error(source: &SourceFile, span: crate::token::Span, message: impl Into<String>) -> crate::error::CspError {
  err(ErrorKind::TypeUncorrectable, source, span, message)
}
