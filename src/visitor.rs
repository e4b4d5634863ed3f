//! Generic AST iteration (spec.md §4.2): "A generic visitor accepts a
//! dispatch table keyed by node kind, each with optional `enter`/`leave`
//! callbacks and `va`-style context. The type checker, validator, and
//! emitter use it to traverse the program uniformly without
//! re-implementing tree walks."
//!
//! [`children`] is the exhaustive per-`NodeKind` dispatch table (every
//! arm names its direct child [`NodeId`]s); [`walk`] drives a depth-first
//! pre/post-order traversal over it, calling a [`Visitor`]'s `enter` on
//! the way down and `leave` on the way back up (bottom-up, so `leave`
//! callbacks — like the type checker's — see already-processed
//! children). `Ctx` is the `va`-style context the spec describes: any
//! type the caller needs threaded through the walk (a typeck scope, a
//! validator's diagnostic list).

use smallvec::SmallVec;
use crate::error::Result;
use crate::types::ast::NodeKind;
use crate::types::program::Program;
use crate::types::NodeId;

/// The direct children of a node, exhaustively matched over every
/// [`NodeKind`] variant (REDESIGN FLAGS: "exhaustiveness over the
/// node-kind enumeration is required").
#[must_use]
pub fn children(kind: &NodeKind) -> SmallVec<[NodeId; 4]> {
  let mut out = SmallVec::new();
  match kind {
    NodeKind::IntLit(_) | NodeKind::FloatLit(_) | NodeKind::CharLit(_) | NodeKind::StrLit(_)
      | NodeKind::BoolLit(_) | NodeKind::NilLit | NodeKind::Id(_) | NodeKind::PipeHole
      | NodeKind::SizeOf(_) | NodeKind::AlignOf(_) | NodeKind::TypeTag(_)
      | NodeKind::Break | NodeKind::Continue | NodeKind::Noop => {}

    NodeKind::StructLit { fields, .. } => out.extend(fields.iter().map(|(_, n)| *n)),
    NodeKind::ArrayLit { elements } => out.extend(elements.iter().copied()),

    NodeKind::Call { callee, args } => { out.push(*callee); out.extend(args.iter().copied()); }
    NodeKind::Member { left, .. } => out.push(*left),
    NodeKind::Index { left, index } => { out.push(*left); out.push(*index); }

    NodeKind::Binary { left, right, .. } => { out.push(*left); out.push(*right); }
    NodeKind::Unary { operand, .. } | NodeKind::IncDec { operand, .. }
      | NodeKind::Cast { operand, .. } | NodeKind::AddrOf { operand }
      | NodeKind::Closure { inner: operand } => out.push(*operand),
    NodeKind::Assign { left, right } => { out.push(*left); out.push(*right); }
    NodeKind::IfExpr { cond, if_branch, else_branch } => {
      out.push(*cond); out.push(*if_branch); out.push(*else_branch);
    }
    NodeKind::Pipe { left, right } => { out.push(*left); out.push(*right); }
    NodeKind::TypePredicate { .. } => {}
    NodeKind::Len(n) => out.push(*n),
    NodeKind::VaArg { list, .. } => out.push(*list),
    // Asm arguments are `AsmArg::{Str,Int,Ident}`, none of which carry a
    // `NodeId` — identifier arguments resolve through the object table,
    // not the node tree (see `typeck::infer`).
    NodeKind::Asm { .. } => {}

    NodeKind::Block { stmts, .. } => out.extend(stmts.iter().copied()),
    NodeKind::LocalDecl(_) => {}
    NodeKind::ExprStmt(n) | NodeKind::Return(Some(n)) => out.push(*n),
    NodeKind::Return(None) => {}
    NodeKind::If { cond, if_branch, else_branch } => {
      out.push(*cond); out.push(*if_branch);
      if let Some(e) = else_branch { out.push(*e); }
    }
    NodeKind::Loop { body } => out.push(*body),
    NodeKind::While { cond, body } => { out.push(*cond); out.push(*body); }
    NodeKind::For { init, cond, step, body } => {
      if let Some(n) = init { out.push(*n); }
      if let Some(n) = cond { out.push(*n); }
      if let Some(n) = step { out.push(*n); }
      out.push(*body);
    }
    NodeKind::ForRange { lo, hi, body, .. } => { out.push(*lo); out.push(*hi); out.push(*body); }
    NodeKind::Match { subject, cases, .. } => {
      out.push(*subject);
      for c in cases {
        if let Some(p) = c.pattern { out.push(p); }
        out.push(c.body);
      }
    }
    NodeKind::With { init, body, else_body, .. } => {
      out.push(*init); out.push(*body);
      if let Some(e) = else_body { out.push(*e); }
    }
  }
  out
}

/// A traversal visitor. Both hooks default to no-ops so a caller only
/// overrides the one(s) it needs (spec.md §4.2: "optional `enter`/`leave`
/// callbacks").
pub trait Visitor<Ctx> {
  fn enter(&mut self, _program: &mut Program, _id: NodeId, _ctx: &mut Ctx) -> Result<()> { Ok(()) }
  fn leave(&mut self, _program: &mut Program, _id: NodeId, _ctx: &mut Ctx) -> Result<()> { Ok(()) }
}

/// Depth-first walk of `id` and its descendants, in source order.
/// `leave` runs after every child has been fully walked (bottom-up),
/// which is what lets a [`Visitor`] like the type checker assume
/// children already carry a `data_type` by the time it processes the
/// parent.
pub fn walk<Ctx, V: Visitor<Ctx>>(
  program: &mut Program, id: NodeId, visitor: &mut V, ctx: &mut Ctx,
) -> Result<()> {
  visitor.enter(program, id, ctx)?;
  let kids = children(&program.nodes[id].kind);
  for kid in kids {
    walk(program, kid, visitor, ctx)?;
  }
  visitor.leave(program, id, ctx)?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::token::Span;
  use crate::types::ast::{BinOp, Node};

  struct CountVisitor { count: u32 }
  impl Visitor<()> for CountVisitor {
    fn enter(&mut self, _p: &mut Program, _id: NodeId, _ctx: &mut ()) -> Result<()> {
      self.count += 1;
      Ok(())
    }
  }

  #[test]
  fn walk_visits_every_node_including_children() {
    let mut p = Program::new();
    let one = p.alloc_node(Node::new(NodeKind::IntLit(1), Span::default()));
    let two = p.alloc_node(Node::new(NodeKind::IntLit(2), Span::default()));
    let add = p.alloc_node(Node::new(
      NodeKind::Binary { op: BinOp::Add, left: one, right: two }, Span::default(),
    ));
    let mut v = CountVisitor { count: 0 };
    walk(&mut p, add, &mut v, &mut ()).unwrap();
    assert_eq!(v.count, 3);
  }

  #[test]
  fn children_of_binary_returns_both_operands_in_order() {
    let mut p = Program::new();
    let one = p.alloc_node(Node::new(NodeKind::IntLit(1), Span::default()));
    let two = p.alloc_node(Node::new(NodeKind::IntLit(2), Span::default()));
    let kids = children(&NodeKind::Binary { op: BinOp::Add, left: one, right: two });
    assert_eq!(&kids[..], &[one, two]);
  }
}
