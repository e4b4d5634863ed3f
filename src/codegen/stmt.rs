//! Statement lowering (spec.md §4.4.4), grounded in `c_codegen.c`'s
//! `c_gen_stmt`/`c_gen_local`/`c_init_zero`, generalized where this
//! front-end's AST differs from the original's:
//!
//! - A `Block`'s `locals` list is parser bookkeeping only (every local
//!   also appears as a [`NodeKind::LocalDecl`] statement at its actual
//!   source position, see `parser::parse_local`); the original instead
//!   hoisted every local to the top of its enclosing block because its
//!   target C dialect required declarations before statements. We
//!   target `-std=c2x` (mixed declarations are legal) and declare each
//!   local inline where its `LocalDecl` statement occurs, which also
//!   sidesteps double-declaring it.
//! - `do-while`/`do-unless`/`using` have no surviving `NodeKind`
//!   variant in this front-end's AST (dropped along with the statements
//!   spec.md §1 doesn't carry forward), so there is no emitter case for
//!   them.

use crate::error::{err, ErrorKind, Result};
use crate::typeck::types_equal;
use crate::types::ast::NodeKind;
use crate::types::ty::{Primitive, TypeKind};
use crate::types::{NodeId, ObjId, TypeId};

use super::types::unpack_for_codegen;
use super::Emitter;

impl<'p> Emitter<'p> {
  pub(super) fn gen_stmt(&mut self, id: NodeId) -> Result<()> {
    match self.program.nodes[id].kind.clone() {
      NodeKind::Block { stmts, .. } => {
        self.out.push('{');
        for s in stmts { self.gen_stmt(s)?; }
        self.out.push('}');
      }
      NodeKind::LocalDecl(obj_id) => self.gen_local(obj_id)?,
      NodeKind::ExprStmt(expr) => {
        self.gen_expr(expr)?;
        self.out.push(';');
      }
      NodeKind::Return(value) => {
        self.out.push_str("return");
        if let Some(v) = value {
          self.out.push(' ');
          self.gen_expr(v)?;
        }
        self.out.push(';');
      }
      NodeKind::If { cond, if_branch, else_branch } => {
        self.out.push_str("if(");
        self.gen_expr(cond)?;
        self.out.push_str("){");
        self.gen_stmt(if_branch)?;
        self.out.push('}');
        if let Some(e) = else_branch {
          self.out.push_str("else{");
          self.gen_stmt(e)?;
          self.out.push('}');
        }
      }
      NodeKind::Loop { body } => {
        self.out.push_str("for(;;){");
        self.gen_stmt(body)?;
        self.out.push('}');
      }
      NodeKind::While { cond, body } => {
        self.out.push_str("while(");
        self.gen_expr(cond)?;
        self.out.push_str("){");
        self.gen_stmt(body)?;
        self.out.push('}');
      }
      NodeKind::For { init, cond, step, body } => {
        self.out.push_str("for(");
        if let Some(i) = init { self.gen_stmt(i)?; } else { self.out.push(';'); }
        if let Some(c) = cond { self.gen_expr(c)?; }
        self.out.push(';');
        if let Some(s) = step { self.gen_expr(s)?; }
        self.out.push_str("){");
        self.gen_stmt(body)?;
        self.out.push('}');
      }
      NodeKind::ForRange { var, lo, hi, body } => self.gen_for_range(var, lo, hi, body)?,
      NodeKind::Match { subject, cases, is_type_match } => {
        if is_type_match {
          self.gen_type_match(subject, &cases)?;
        } else {
          self.gen_value_match(subject, &cases)?;
        }
      }
      NodeKind::With { var, init, body, else_body } => self.gen_with(var, init, body, else_body)?,
      NodeKind::Break => self.out.push_str("break;"),
      NodeKind::Continue => self.out.push_str("continue;"),
      NodeKind::Noop => {}
      // A lambda body or match-case arm written without braces is a bare
      // expression in statement position.
      _ => {
        self.gen_expr(id)?;
        self.out.push(';');
      }
    }
    Ok(())
  }

  /// `c_gen_local`: `<type> <name> = <init-or-zero>;`.
  pub(super) fn gen_local(&mut self, obj_id: ObjId) -> Result<()> {
    let ty = self.program.objects[obj_id].ty;
    let ident = self.program.objects[obj_id].id.clone();
    self.gen_typed_name(&ident, ty);
    self.out.push('=');
    match self.program.objects[obj_id].body {
      Some(init) => self.gen_expr(init)?,
      None => self.gen_zero(ty)?,
    }
    self.out.push(';');
    Ok(())
  }

  /// `c_init_zero`.
  fn gen_zero(&mut self, ty: TypeId) -> Result<()> {
    let unpacked = unpack_for_codegen(self.program, ty);
    match self.program.types[unpacked].kind.clone() {
      TypeKind::Primitive(p) => match p {
        Primitive::F32 => self.out.push_str("0.0f"),
        Primitive::F64 | Primitive::F80 => self.out.push_str("0.0"),
        _ => self.out.push('0'),
      },
      TypeKind::Pointer { .. } | TypeKind::Vla { .. } | TypeKind::Function { .. } => self.out.push_str("(void*) 0"),
      TypeKind::SizedArray { .. } | TypeKind::CArray { .. } | TypeKind::Struct { .. } => self.out.push_str("{0}"),
      TypeKind::Enum { .. } => self.out.push('0'),
      TypeKind::Named { .. } | TypeKind::Typeof { .. } => {
        let span = self.program.types[ty].span;
        return Err(err(ErrorKind::Codegen, self.source, span, "could not resolve a type to zero-initialize"));
      }
    }
    Ok(())
  }

  /// `ND_FOR_RANGE` (spec.md §4.4.4): two fresh `u64` scratch locals
  /// carry the loop bound; `var` itself is redeclared every iteration at
  /// its own (possibly non-`u64`) inferred type so the body sees the
  /// name it was written with.
  fn gen_for_range(&mut self, var: ObjId, lo: NodeId, hi: NodeId, body: NodeId) -> Result<()> {
    let lo_name = self.program.next_scratch_name("for_lo");
    let hi_name = self.program.next_scratch_name("for_hi");
    self.out.push_str(&format!("for(unsigned long {lo_name}="));
    self.gen_expr(lo)?;
    self.out.push_str(&format!(",{hi_name}=(unsigned long)("));
    self.gen_expr(hi)?;
    self.out.push_str(&format!(");{lo_name}<{hi_name};{lo_name}++){{"));
    let var_ty = self.program.objects[var].ty;
    let var_ident = self.program.objects[var].id.clone();
    self.gen_typed_name(&var_ident, var_ty);
    self.out.push_str(&format!("={lo_name};"));
    self.gen_stmt(body)?;
    self.out.push('}');
    Ok(())
  }

  /// `ND_WITH`: declare `var`, then branch on its own truthiness —
  /// mirrors `c_codegen.c`'s `ND_WITH` testing the assignment target's
  /// value rather than the initializer expression directly.
  fn gen_with(&mut self, var: ObjId, init: NodeId, body: NodeId, else_body: Option<NodeId>) -> Result<()> {
    self.out.push('{');
    let ty = self.program.objects[var].ty;
    let ident = self.program.objects[var].id.clone();
    self.gen_typed_name(&ident, ty);
    self.out.push('=');
    self.gen_expr(init)?;
    self.out.push_str(";if((");
    self.out.push_str(&self.mangled(&ident));
    self.out.push_str(")!=0){");
    self.gen_stmt(body)?;
    self.out.push('}');
    if let Some(e) = else_body {
      self.out.push_str("else{");
      self.gen_stmt(e)?;
      self.out.push('}');
    }
    self.out.push('}');
    Ok(())
  }

  /// `ND_MATCH` over values: a block-scoped scratch holding the subject,
  /// compared against each case's pattern with a chained `if`/`else if`.
  fn gen_value_match(&mut self, subject: NodeId, cases: &[crate::types::ast::MatchCase]) -> Result<()> {
    let uid = self.program.next_scratch_name("match");
    let subj_ty = self.program.nodes[subject].data_type.expect("match subject is typed");
    self.out.push('{');
    self.gen_typed_name_raw(&uid, subj_ty);
    self.out.push('=');
    self.gen_expr(subject)?;
    self.out.push(';');
    let mut wrote_if = false;
    let mut default_body: Option<NodeId> = None;
    for case in cases {
      match case.pattern {
        Some(pat) => {
          self.out.push_str(if wrote_if { "else if((" } else { "if((" });
          self.out.push_str(&uid);
          self.out.push_str(")==(");
          self.gen_expr(pat)?;
          self.out.push_str(")){");
          self.gen_stmt(case.body)?;
          self.out.push('}');
          wrote_if = true;
        }
        None => default_body = Some(case.body),
      }
    }
    if let Some(d) = default_body {
      self.out.push_str(if wrote_if { "else{" } else { "{" });
      self.gen_stmt(d)?;
      self.out.push('}');
    }
    self.out.push('}');
    Ok(())
  }

  /// `match (type) { ... }`: resolved at emission time to exactly the
  /// one matching case (or the default), since C has no runtime
  /// representation of a source-level type to switch on. Not present in
  /// the retrieved `c_codegen.c` excerpt; this lowering is this front
  /// end's own design decision (recorded in DESIGN.md).
  fn gen_type_match(&mut self, subject: NodeId, cases: &[crate::types::ast::MatchCase]) -> Result<()> {
    let NodeKind::TypeTag(subject_ty) = self.program.nodes[subject].kind else {
      let span = self.program.nodes[subject].span;
      return Err(err(ErrorKind::Codegen, self.source, span, "type-match subject is not a type tag"));
    };
    let mut chosen: Option<NodeId> = None;
    let mut default_body: Option<NodeId> = None;
    for case in cases {
      match case.pattern {
        Some(pat) => {
          let NodeKind::TypeTag(case_ty) = self.program.nodes[pat].kind else { continue };
          if chosen.is_none() && types_equal(self.program, subject_ty, case_ty) {
            chosen = Some(case.body);
          }
        }
        None => default_body = Some(case.body),
      }
    }
    self.out.push('{');
    if let Some(body) = chosen.or(default_body) {
      self.gen_stmt(body)?;
    }
    self.out.push('}');
    Ok(())
  }
}
