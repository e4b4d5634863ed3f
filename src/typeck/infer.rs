//! Expression/statement type inference (spec.md §4.3): walks the parsed
//! AST bottom-up, assigns every expression node a `data_type`, and
//! rewrites the tree wherever an implicit cast is needed. Hand-recurses
//! instead of routing through `visitor::walk` (see the `typeck` module
//! doc comment) so a block/`with`/`for`-range local becomes visible to
//! later statements exactly when the original scopes it — strictly
//! between checking its initializer and checking its users, which a
//! context-free `enter`/`leave` pair can't express.

use std::collections::HashMap;

use crate::error::{err, Diagnostics, ErrorKind, Result};
use crate::symbol::Symbol;
use crate::token::{SourceFile, Span};
use crate::types::ast::{AsmArg, BinOp, MatchCase, NodeKind, TypePredicate, UnOp};
use crate::types::ident::Identifier;
use crate::types::object::{ObjFlags, ObjKind};
use crate::types::program::Program;
use crate::types::ty::{Member, Primitive, Type, TypeKind};
use crate::types::{NodeId, ObjId, TypeId};

use super::resolve::{build_global_scope, GlobalScope, INFER_PLACEHOLDER};
use super::{implicit_cast, implicitly_castable, type_error, types_equal, unpack};

pub(super) fn check_all(program: &mut Program, source: &SourceFile, diags: &mut Diagnostics) -> Result<()> {
  let global = build_global_scope(program);
  let mut ck = Checker { source, global, scopes: Vec::new(), resolved: HashMap::new(), prim_cache: HashMap::new() };
  let roots: Vec<ObjId> = program.root.clone();
  for obj_id in roots {
    ck.check_root_object(program, diags, obj_id)?;
  }
  Ok(())
}

struct Checker<'s> {
  source: &'s SourceFile,
  global: GlobalScope,
  scopes: Vec<HashMap<Symbol, ObjId>>,
  /// `Id` node -> the object it resolved to, so `Call`/`Assign` can ask
  /// "is the callee a function?"/"is the target constant?" without
  /// re-resolving the identifier chain.
  resolved: HashMap<NodeId, ObjId>,
  prim_cache: HashMap<Primitive, TypeId>,
}

impl<'s> Checker<'s> {
  fn push_scope(&mut self) { self.scopes.push(HashMap::new()); }
  fn pop_scope(&mut self) { self.scopes.pop(); }

  fn declare(&mut self, name: Symbol, obj: ObjId) {
    self.scopes.last_mut().expect("declare called outside any scope").insert(name, obj);
  }

  fn resolve_name(&self, name: Symbol) -> Option<ObjId> {
    for scope in self.scopes.iter().rev() {
      if let Some(&o) = scope.get(&name) { return Some(o); }
    }
    self.global.get(&name).copied()
  }

  fn is_infer_placeholder(&self, program: &Program, ty: TypeId) -> bool {
    matches!(&program.types[ty].kind, TypeKind::Named { id, .. }
      if id.outer.is_none() && &*id.name.as_str() == INFER_PLACEHOLDER)
  }

  fn prim_ty(&mut self, program: &mut Program, p: Primitive) -> TypeId {
    if let Some(&id) = self.prim_cache.get(&p) { return id; }
    let id = program.alloc_type(Type::primitive(p, Span::default()));
    self.prim_cache.insert(p, id);
    id
  }

  fn ptr_to(&mut self, program: &mut Program, base: TypeId, span: Span) -> TypeId {
    program.alloc_type(Type {
      kind: TypeKind::Pointer { base }, is_constant: false, span, size: Some(8), align: Some(8), semantic_id: None,
    })
  }

  /// If `actual` already equals `target`, returns `expr` unchanged; if
  /// it's implicitly convertible, returns a new cast node; otherwise a
  /// type error (spec.md §4.3, the general "rewrite RHS" rule shared by
  /// calls, initializers, array-literal elements and `return`).
  fn coerce(&mut self, program: &mut Program, diags: &mut Diagnostics, expr: NodeId, target: TypeId) -> Result<NodeId> {
    let actual = program.nodes[expr].data_type.expect("checked expression must carry a data_type");
    if types_equal(program, actual, target) { return Ok(expr); }
    let span = program.nodes[expr].span;
    if implicitly_castable(program, diags, self.source, span, actual, target) {
      Ok(implicit_cast(program, expr, target))
    } else {
      Err(type_error(self.source, span, "value is not implicitly convertible to the expected type"))
    }
  }

  fn check_root_object(&mut self, program: &mut Program, diags: &mut Diagnostics, obj_id: ObjId) -> Result<()> {
    let (kind, is_extern, body, args, ret_ty) = {
      let obj = &program.objects[obj_id];
      let ret_ty = match &program.types[obj.ty].kind {
        TypeKind::Function { base, .. } => Some(*base),
        _ => None,
      };
      (obj.kind, obj.flags.contains(ObjFlags::EXTERN), obj.body, obj.args.clone(), ret_ty)
    };
    match kind {
      ObjKind::Function => {
        if is_extern { return Ok(()); }
        let Some(body) = body else { return Ok(()) };
        self.push_scope();
        for arg in &args {
          let name = program.objects[*arg].id.name;
          self.declare(name, *arg);
        }
        self.check_stmt(program, diags, body, ret_ty)?;
        self.pop_scope();
        Ok(())
      }
      ObjKind::Global => {
        if let Some(init) = body {
          self.check_expr(program, diags, init)?;
          let declared = program.objects[obj_id].ty;
          let casted = self.coerce(program, diags, init, declared)?;
          program.objects[obj_id].body = Some(casted);
        }
        Ok(())
      }
      ObjKind::EnumMember => {
        if let Some(v) = body { self.check_expr(program, diags, v)?; }
        Ok(())
      }
      ObjKind::Typedef | ObjKind::Namespace | ObjKind::FunctionArg | ObjKind::Local => Ok(()),
    }
  }

  // --- expressions ---

  fn check_expr(&mut self, program: &mut Program, diags: &mut Diagnostics, id: NodeId) -> Result<()> {
    match program.nodes[id].kind.clone() {
      NodeKind::IntLit(_) | NodeKind::FloatLit(_) | NodeKind::CharLit(_) | NodeKind::StrLit(_)
        | NodeKind::BoolLit(_) | NodeKind::NilLit => Ok(()), // typed during parsing already

      NodeKind::Id(ident) => self.check_id(program, id, &ident),

      NodeKind::StructLit { name, fields } => self.check_struct_lit(program, diags, id, name, &fields),
      NodeKind::ArrayLit { elements } => self.check_array_lit(program, diags, id, &elements),

      NodeKind::Call { callee, args } => self.check_call(program, diags, id, callee, &args),
      NodeKind::Member { left, field } => self.check_member(program, diags, id, left, field),
      NodeKind::Index { left, index } => self.check_index(program, diags, id, left, index),

      NodeKind::Binary { op, left, right } => self.check_binary(program, diags, id, op, left, right),
      NodeKind::Unary { op, operand } => self.check_unary(program, diags, id, op, operand),
      NodeKind::IncDec { operand, .. } => {
        self.check_expr(program, diags, operand)?;
        program.nodes[id].data_type = program.nodes[operand].data_type;
        Ok(())
      }
      NodeKind::Assign { left, right } => self.check_assign(program, diags, id, left, right),
      NodeKind::Cast { operand, target, is_implicit } => self.check_cast(program, diags, id, operand, target, is_implicit),
      NodeKind::AddrOf { operand } => self.check_addr_of(program, diags, id, operand),
      NodeKind::Closure { inner } => {
        self.check_expr(program, diags, inner)?;
        program.nodes[id].data_type = program.nodes[inner].data_type;
        Ok(())
      }
      NodeKind::IfExpr { cond, if_branch, else_branch } => self.check_if_expr(program, diags, id, cond, if_branch, else_branch),
      NodeKind::PipeHole => {
        // Never reaches here in practice (substituted away during
        // parsing); defensively give it a harmless type.
        let v = self.prim_ty(program, Primitive::Void);
        program.nodes[id].data_type = Some(v);
        Ok(())
      }
      NodeKind::Pipe { left, right } => {
        self.check_expr(program, diags, left)?;
        self.check_expr(program, diags, right)?;
        program.nodes[id].data_type = program.nodes[right].data_type;
        Ok(())
      }
      NodeKind::TypePredicate { pred, .. } => {
        let ty = self.type_predicate_ty(program, pred);
        program.nodes[id].data_type = Some(ty);
        Ok(())
      }
      NodeKind::SizeOf(_) | NodeKind::AlignOf(_) => {
        let ty = self.prim_ty(program, Primitive::U64);
        program.nodes[id].data_type = Some(ty);
        Ok(())
      }
      NodeKind::Len(inner) => {
        self.check_expr(program, diags, inner)?;
        let ty = self.prim_ty(program, Primitive::U64);
        program.nodes[id].data_type = Some(ty);
        Ok(())
      }
      NodeKind::VaArg { list, ty } => {
        self.check_expr(program, diags, list)?;
        program.nodes[id].data_type = Some(ty);
        Ok(())
      }
      NodeKind::Asm { .. } => self.check_asm(program, id),
      NodeKind::TypeTag(_) | NodeKind::Noop => Ok(()),

      // Reachable only defensively (a statement-shaped node asked for an
      // expression type); every real expression form is listed above.
      _ => Ok(()),
    }
  }

  fn check_id(&mut self, program: &mut Program, id: NodeId, ident: &Identifier) -> Result<()> {
    let span = program.nodes[id].span;
    // Scopes (and the global table) are keyed by an object's last
    // segment only (see `resolve::GlobalScope`'s doc comment); an
    // explicit namespace qualifier on the reference itself is not
    // re-verified against that chain.
    let Some(obj_id) = self.resolve_name(ident.name) else {
      return Err(err(ErrorKind::Undefined, self.source, span, format!("undefined identifier `{ident}`")));
    };
    program.nodes[id].data_type = Some(program.objects[obj_id].ty);
    program.nodes[id].is_constant = program.objects[obj_id].is_const();
    self.resolved.insert(id, obj_id);
    Ok(())
  }

  fn check_call(&mut self, program: &mut Program, diags: &mut Diagnostics, id: NodeId, callee: NodeId, args: &[NodeId]) -> Result<()> {
    self.check_expr(program, diags, callee)?;
    for &a in args { self.check_expr(program, diags, a)?; }
    let callee_ty = program.nodes[callee].data_type.expect("callee checked");
    let unpacked = unpack(program, callee_ty);
    let (ret_ty, param_types, is_variadic) = match &program.types[unpacked].kind {
      TypeKind::Function { base, arg_types, is_variadic } => (*base, arg_types.clone(), *is_variadic),
      _ => {
        let span = program.nodes[callee].span;
        return Err(type_error(self.source, span, "called expression is not a function"));
      }
    };
    if args.len() < param_types.len() || (!is_variadic && args.len() > param_types.len()) {
      let span = program.nodes[id].span;
      return Err(type_error(self.source, span, format!(
        "expected {} argument(s), found {}", param_types.len(), args.len(),
      )));
    }
    let mut new_args = args.to_vec();
    for (i, &want) in param_types.iter().enumerate() {
      new_args[i] = self.coerce(program, diags, new_args[i], want)?;
    }
    if let NodeKind::Call { args: slot, .. } = &mut program.nodes[id].kind { *slot = new_args; }
    program.nodes[id].data_type = Some(ret_ty);
    Ok(())
  }

  fn check_member(&mut self, program: &mut Program, diags: &mut Diagnostics, id: NodeId, left: NodeId, field: Symbol) -> Result<()> {
    self.check_expr(program, diags, left)?;
    let left_ty = program.nodes[left].data_type.expect("left checked");
    let unpacked = unpack(program, left_ty);
    let members = match &program.types[unpacked].kind {
      TypeKind::Struct { members, .. } => members.clone(),
      _ => {
        let span = program.nodes[left].span;
        return Err(type_error(self.source, span, "member access on a non-struct type"));
      }
    };
    let Some(m) = members.iter().find(|m| m.name == field) else {
      let span = program.nodes[id].span;
      return Err(err(ErrorKind::Undefined, self.source, span, format!("no member `{field}` on this type")));
    };
    program.nodes[id].data_type = Some(m.ty);
    Ok(())
  }

  fn check_index(&mut self, program: &mut Program, diags: &mut Diagnostics, id: NodeId, left: NodeId, index: NodeId) -> Result<()> {
    self.check_expr(program, diags, left)?;
    self.check_expr(program, diags, index)?;
    let left_ty = program.nodes[left].data_type.expect("left checked");
    let unpacked = unpack(program, left_ty);
    let elem = match &program.types[unpacked].kind {
      TypeKind::Pointer { base } | TypeKind::CArray { base, .. }
        | TypeKind::SizedArray { base, .. } | TypeKind::Vla { base } => *base,
      _ => {
        let span = program.nodes[left].span;
        return Err(type_error(self.source, span, "indexing a non-indexable type"));
      }
    };
    program.nodes[id].data_type = Some(elem);
    Ok(())
  }

  fn check_binary(&mut self, program: &mut Program, diags: &mut Diagnostics, id: NodeId, op: BinOp, left: NodeId, right: NodeId) -> Result<()> {
    self.check_expr(program, diags, left)?;
    self.check_expr(program, diags, right)?;
    if op.is_comparison() {
      let b = self.prim_ty(program, Primitive::Bool);
      program.nodes[id].data_type = Some(b);
      return Ok(());
    }
    let lt = program.nodes[left].data_type.expect("left checked");
    let rt = program.nodes[right].data_type.expect("right checked");
    let result_ty = if types_equal(program, lt, rt) {
      lt
    } else {
      let span = program.nodes[right].span;
      if implicitly_castable(program, diags, self.source, span, rt, lt) {
        let casted = implicit_cast(program, right, lt);
        if let NodeKind::Binary { right: slot, .. } = &mut program.nodes[id].kind { *slot = casted; }
        lt
      } else if implicitly_castable(program, diags, self.source, span, lt, rt) {
        let casted = implicit_cast(program, left, rt);
        if let NodeKind::Binary { left: slot, .. } = &mut program.nodes[id].kind { *slot = casted; }
        rt
      } else {
        return Err(type_error(self.source, span, "mismatched operand types in binary expression"));
      }
    };
    program.nodes[id].data_type = Some(result_ty);
    Ok(())
  }

  fn check_unary(&mut self, program: &mut Program, diags: &mut Diagnostics, id: NodeId, op: UnOp, operand: NodeId) -> Result<()> {
    self.check_expr(program, diags, operand)?;
    let operand_ty = program.nodes[operand].data_type.expect("operand checked");
    let span = program.nodes[id].span;
    let result_ty = match op {
      UnOp::Not => self.prim_ty(program, Primitive::Bool),
      UnOp::Neg | UnOp::BitNot => operand_ty,
      UnOp::Borrow => self.ptr_to(program, operand_ty, span),
      UnOp::Deref => {
        let unpacked = unpack(program, operand_ty);
        match &program.types[unpacked].kind {
          TypeKind::Pointer { base } | TypeKind::CArray { base, .. } | TypeKind::Vla { base } => *base,
          _ => {
            let span = program.nodes[operand].span;
            return Err(type_error(self.source, span, "cannot dereference a non-pointer type"));
          }
        }
      }
    };
    program.nodes[id].data_type = Some(result_ty);
    Ok(())
  }

  fn check_assign(&mut self, program: &mut Program, diags: &mut Diagnostics, id: NodeId, left: NodeId, right: NodeId) -> Result<()> {
    self.check_expr(program, diags, left)?;
    self.check_expr(program, diags, right)?;
    if let Some(&obj_id) = self.resolved.get(&left) {
      if program.objects[obj_id].is_const() {
        let span = program.nodes[id].span;
        return Err(type_error(self.source, span, format!(
          "cannot assign to constant `{}`", program.objects[obj_id].id,
        )));
      }
    }
    let lhs_ty = program.nodes[left].data_type.expect("left checked");
    let rhs_ty = program.nodes[right].data_type.expect("right checked");
    if !types_equal(program, lhs_ty, rhs_ty) {
      let span = program.nodes[right].span;
      let lhs_u = unpack(program, lhs_ty);
      let rhs_u = unpack(program, rhs_ty);
      // "Sized-array -> VLA is allowed without a rewrite" (spec.md §4.3) —
      // unlike every other implicitly-castable mismatch, this one leaves
      // the right-hand side exactly as parsed.
      let sized_to_vla = matches!(program.types[rhs_u].kind, TypeKind::SizedArray { .. })
        && matches!(program.types[lhs_u].kind, TypeKind::Vla { .. });
      if sized_to_vla {
        // no rewrite
      } else if implicitly_castable(program, diags, self.source, span, rhs_ty, lhs_ty) {
        let casted = implicit_cast(program, right, lhs_ty);
        if let NodeKind::Assign { right: slot, .. } = &mut program.nodes[id].kind { *slot = casted; }
      } else {
        return Err(type_error(self.source, span, "cannot assign value of incompatible type"));
      }
    }
    program.nodes[id].data_type = Some(lhs_ty);
    Ok(())
  }

  fn check_cast(&mut self, program: &mut Program, diags: &mut Diagnostics, id: NodeId, operand: NodeId, target: TypeId, is_implicit: bool) -> Result<()> {
    self.check_expr(program, diags, operand)?;
    if is_implicit {
      // Built by `implicit_cast`, which already stamped `data_type`.
      if program.nodes[id].data_type.is_none() { program.nodes[id].data_type = Some(target); }
      return Ok(());
    }
    let operand_ty = program.nodes[operand].data_type.expect("operand checked");
    let span = program.nodes[id].span;
    let from_void = matches!(program.types[unpack(program, operand_ty)].kind, TypeKind::Primitive(Primitive::Void));
    let to_void = matches!(program.types[unpack(program, target)].kind, TypeKind::Primitive(Primitive::Void));
    if from_void != to_void {
      return Err(type_error(self.source, span, "cannot cast between `void` and a non-void type"));
    }
    if types_equal(program, operand_ty, target) {
      diags.warn_cast(self.source, span, "identity cast has no effect");
    }
    program.nodes[id].data_type = Some(target);
    Ok(())
  }

  fn check_addr_of(&mut self, program: &mut Program, diags: &mut Diagnostics, id: NodeId, operand: NodeId) -> Result<()> {
    self.check_expr(program, diags, operand)?;
    if program.nodes[id].data_type.is_some() { return Ok(()); } // set by implicit_cast already
    let operand_ty = program.nodes[operand].data_type.expect("operand checked");
    let span = program.nodes[id].span;
    let ptr = self.ptr_to(program, operand_ty, span);
    program.nodes[id].data_type = Some(ptr);
    Ok(())
  }

  fn check_if_expr(&mut self, program: &mut Program, diags: &mut Diagnostics, id: NodeId, cond: NodeId, if_branch: NodeId, else_branch: NodeId) -> Result<()> {
    self.check_expr(program, diags, cond)?;
    self.check_expr(program, diags, if_branch)?;
    self.check_expr(program, diags, else_branch)?;
    let it = program.nodes[if_branch].data_type.expect("if_branch checked");
    let et = program.nodes[else_branch].data_type.expect("else_branch checked");
    let result_ty = if types_equal(program, it, et) {
      it
    } else {
      let span = program.nodes[else_branch].span;
      if implicitly_castable(program, diags, self.source, span, et, it) {
        let casted = implicit_cast(program, else_branch, it);
        if let NodeKind::IfExpr { else_branch: slot, .. } = &mut program.nodes[id].kind { *slot = casted; }
        it
      } else if implicitly_castable(program, diags, self.source, span, it, et) {
        let casted = implicit_cast(program, if_branch, et);
        if let NodeKind::IfExpr { if_branch: slot, .. } = &mut program.nodes[id].kind { *slot = casted; }
        et
      } else {
        return Err(type_error(self.source, span, "if-expression branches have incompatible types"));
      }
    };
    program.nodes[id].data_type = Some(result_ty);
    Ok(())
  }

  fn check_struct_lit(
    &mut self, program: &mut Program, diags: &mut Diagnostics, id: NodeId,
    name: Option<Identifier>, fields: &[(Symbol, NodeId)],
  ) -> Result<()> {
    for &(_, v) in fields { self.check_expr(program, diags, v)?; }
    let span = program.nodes[id].span;
    if let Some(ident) = name {
      let Some(obj_id) = self.resolve_name(ident.name) else {
        return Err(err(ErrorKind::Undefined, self.source, span, format!("undefined type `{ident}`")));
      };
      if program.objects[obj_id].kind != ObjKind::Typedef {
        return Err(type_error(self.source, span, format!("`{ident}` does not name a type")));
      }
      let ty = program.objects[obj_id].ty;
      self.coerce_struct_lit_fields(program, diags, id, ty, fields)?;
      program.nodes[id].data_type = Some(ty);
    } else {
      // Anonymous literal: synthesize an ad hoc struct type from the
      // field names/types in literal order. Unlike tuple types, an
      // anonymous struct literal has no spec-mandated dedup — each
      // occurrence gets its own type.
      let members: Vec<Member> = fields.iter()
        .map(|(fname, v)| Member { name: *fname, ty: program.nodes[*v].data_type.expect("field checked") })
        .collect();
      let ty = program.alloc_type(Type {
        kind: TypeKind::Struct { members, is_union: false },
        is_constant: false, span, size: None, align: None, semantic_id: None,
      });
      program.nodes[id].data_type = Some(ty);
    }
    Ok(())
  }

  fn coerce_struct_lit_fields(
    &mut self, program: &mut Program, diags: &mut Diagnostics, id: NodeId,
    struct_ty: TypeId, fields: &[(Symbol, NodeId)],
  ) -> Result<()> {
    let unpacked = unpack(program, struct_ty);
    let members = match &program.types[unpacked].kind {
      TypeKind::Struct { members, .. } => members.clone(),
      _ => {
        let span = program.nodes[id].span;
        return Err(type_error(self.source, span, "struct literal names a non-struct type"));
      }
    };
    let mut new_fields = fields.to_vec();
    for (i, (fname, fval)) in fields.iter().enumerate() {
      let Some(m) = members.iter().find(|m| m.name == *fname) else {
        let span = program.nodes[*fval].span;
        return Err(err(ErrorKind::Undefined, self.source, span, format!("no member `{fname}` on this struct type")));
      };
      new_fields[i].1 = self.coerce(program, diags, *fval, m.ty)?;
    }
    if let NodeKind::StructLit { fields: slot, .. } = &mut program.nodes[id].kind { *slot = new_fields; }
    Ok(())
  }

  fn check_array_lit(&mut self, program: &mut Program, diags: &mut Diagnostics, id: NodeId, elements: &[NodeId]) -> Result<()> {
    for &e in elements { self.check_expr(program, diags, e)?; }
    let span = program.nodes[id].span;
    if elements.is_empty() {
      return Ok(()); // untyped; a target-typed context must coerce it
    }
    let base_ty = program.nodes[elements[0]].data_type.expect("element checked");
    let mut new_elements = elements.to_vec();
    for (i, &e) in elements.iter().enumerate() {
      new_elements[i] = self.coerce(program, diags, e, base_ty)?;
    }
    if let NodeKind::ArrayLit { elements: slot } = &mut program.nodes[id].kind { *slot = new_elements; }
    let arr_ty = program.alloc_type(Type {
      kind: TypeKind::SizedArray { base: base_ty, num_indices: elements.len() as u64 },
      is_constant: false, span, size: None, align: None, semantic_id: None,
    });
    program.nodes[id].data_type = Some(arr_ty);
    Ok(())
  }

  fn type_predicate_ty(&mut self, program: &mut Program, pred: TypePredicate) -> TypeId {
    match pred {
      TypePredicate::RegClass => self.prim_ty(program, Primitive::I32),
      TypePredicate::ToStr => {
        let c = self.prim_ty(program, Primitive::Char);
        let span = Span::default();
        let ptr = self.ptr_to(program, c, span);
        program.types[ptr].is_constant = true;
        ptr
      }
      TypePredicate::IsInt | TypePredicate::IsUint | TypePredicate::IsFloat | TypePredicate::IsPointer
        | TypePredicate::IsArray | TypePredicate::IsStruct | TypePredicate::IsUnion =>
        self.prim_ty(program, Primitive::Bool),
    }
  }

  /// Resolves every identifier operand of an inline `asm` block against
  /// the current scope (spec.md §4.5 item 3); the emitter later reads
  /// `AsmArg::Ident`'s resolved cell to build the input-operand list.
  fn check_asm(&mut self, program: &mut Program, id: NodeId) -> Result<()> {
    let span = program.nodes[id].span;
    let mut missing: Option<Identifier> = None;
    if let NodeKind::Asm { args } = &program.nodes[id].kind {
      for a in args {
        if let AsmArg::Ident(ident, resolved) = a {
          match self.resolve_name(ident.name) {
            Some(obj_id) => resolved.set(Some(obj_id)),
            None => { missing = Some(ident.clone()); break; }
          }
        }
      }
    }
    if let Some(ident) = missing {
      return Err(err(ErrorKind::Undefined, self.source, span, format!("undefined identifier `{ident}` in asm block")));
    }
    let v = self.prim_ty(program, Primitive::Void);
    program.nodes[id].data_type = Some(v);
    Ok(())
  }

  // --- statements ---

  fn check_stmt(&mut self, program: &mut Program, diags: &mut Diagnostics, id: NodeId, ret_ty: Option<TypeId>) -> Result<()> {
    match program.nodes[id].kind.clone() {
      NodeKind::Block { stmts, .. } => {
        self.push_scope();
        for s in stmts { self.check_stmt(program, diags, s, ret_ty)?; }
        self.pop_scope();
        Ok(())
      }
      NodeKind::LocalDecl(obj_id) => self.check_local_decl(program, diags, obj_id),
      NodeKind::ExprStmt(expr) => self.check_expr(program, diags, expr),
      NodeKind::Return(value) => self.check_return(program, diags, id, value, ret_ty),
      NodeKind::If { cond, if_branch, else_branch } => {
        self.check_expr(program, diags, cond)?;
        self.check_stmt(program, diags, if_branch, ret_ty)?;
        if let Some(e) = else_branch { self.check_stmt(program, diags, e, ret_ty)?; }
        Ok(())
      }
      NodeKind::Loop { body } => self.check_stmt(program, diags, body, ret_ty),
      NodeKind::While { cond, body } => {
        self.check_expr(program, diags, cond)?;
        self.check_stmt(program, diags, body, ret_ty)
      }
      NodeKind::For { init, cond, step, body } => {
        self.push_scope();
        if let Some(i) = init { self.check_stmt(program, diags, i, ret_ty)?; }
        if let Some(c) = cond { self.check_expr(program, diags, c)?; }
        if let Some(s) = step { self.check_expr(program, diags, s)?; }
        self.check_stmt(program, diags, body, ret_ty)?;
        self.pop_scope();
        Ok(())
      }
      NodeKind::ForRange { var, lo, hi, body } => self.check_for_range(program, diags, var, lo, hi, body, ret_ty),
      NodeKind::Match { subject, cases, is_type_match } => self.check_match(program, diags, subject, &cases, is_type_match, ret_ty),
      NodeKind::With { var, init, body, else_body } => self.check_with(program, diags, id, var, init, body, else_body, ret_ty),
      NodeKind::Break | NodeKind::Continue | NodeKind::Noop => Ok(()),
      // An expression used directly as a case/lambda statement body
      // (e.g. a single-statement lambda); expression rules apply as-is.
      _ => self.check_expr(program, diags, id),
    }
  }

  fn check_local_decl(&mut self, program: &mut Program, diags: &mut Diagnostics, obj_id: ObjId) -> Result<()> {
    let (declared_ty, body, name, span) = {
      let obj = &program.objects[obj_id];
      (obj.ty, obj.body, obj.id.name, obj.span)
    };
    let is_placeholder = self.is_infer_placeholder(program, declared_ty);
    if let Some(init) = body {
      self.check_expr(program, diags, init)?;
      if is_placeholder {
        let init_ty = program.nodes[init].data_type.expect("init checked");
        program.objects[obj_id].ty = init_ty;
      } else {
        let casted = self.coerce(program, diags, init, declared_ty)?;
        program.objects[obj_id].body = Some(casted);
      }
    } else if is_placeholder {
      return Err(type_error(self.source, span, format!("cannot infer the type of `{name}` without an initializer")));
    }
    self.declare(name, obj_id);
    Ok(())
  }

  fn check_return(&mut self, program: &mut Program, diags: &mut Diagnostics, id: NodeId, value: Option<NodeId>, ret_ty: Option<TypeId>) -> Result<()> {
    let span = program.nodes[id].span;
    let Some(ret_ty) = ret_ty else {
      if let Some(v) = value { self.check_expr(program, diags, v)?; }
      return Ok(());
    };
    let is_void = matches!(program.types[unpack(program, ret_ty)].kind, TypeKind::Primitive(Primitive::Void));
    match (value, is_void) {
      (None, true) => Ok(()),
      (None, false) => Err(type_error(self.source, span, "missing return value in a non-void function")),
      (Some(v), true) => {
        self.check_expr(program, diags, v)?;
        Err(type_error(self.source, span, "returning a value from a void function"))
      }
      (Some(v), false) => {
        self.check_expr(program, diags, v)?;
        let casted = self.coerce(program, diags, v, ret_ty)?;
        if let NodeKind::Return(slot) = &mut program.nodes[id].kind { *slot = Some(casted); }
        Ok(())
      }
    }
  }

  fn check_for_range(
    &mut self, program: &mut Program, diags: &mut Diagnostics,
    var: ObjId, lo: NodeId, hi: NodeId, body: NodeId, ret_ty: Option<TypeId>,
  ) -> Result<()> {
    self.check_expr(program, diags, lo)?;
    self.check_expr(program, diags, hi)?;
    let lo_ty = program.nodes[lo].data_type.expect("lo checked");
    if self.is_infer_placeholder(program, program.objects[var].ty) {
      program.objects[var].ty = lo_ty;
    }
    let name = program.objects[var].id.name;
    self.push_scope();
    self.declare(name, var);
    self.check_stmt(program, diags, body, ret_ty)?;
    self.pop_scope();
    Ok(())
  }

  fn check_match(
    &mut self, program: &mut Program, diags: &mut Diagnostics,
    subject: NodeId, cases: &[MatchCase], is_type_match: bool, ret_ty: Option<TypeId>,
  ) -> Result<()> {
    if !is_type_match {
      self.check_expr(program, diags, subject)?;
    }
    for case in cases {
      if !is_type_match {
        if let Some(p) = case.pattern { self.check_expr(program, diags, p)?; }
      }
      self.check_stmt(program, diags, case.body, ret_ty)?;
    }
    Ok(())
  }

  fn check_with(
    &mut self, program: &mut Program, diags: &mut Diagnostics, with_id: NodeId,
    var: ObjId, init: NodeId, body: NodeId, else_body: Option<NodeId>, ret_ty: Option<TypeId>,
  ) -> Result<()> {
    self.check_expr(program, diags, init)?;
    let init_ty = program.nodes[init].data_type.expect("init checked");
    let declared = program.objects[var].ty;
    let final_init = if self.is_infer_placeholder(program, declared) {
      program.objects[var].ty = init_ty;
      init
    } else {
      let casted = self.coerce(program, diags, init, declared)?;
      program.objects[var].body = Some(casted);
      casted
    };
    if let NodeKind::With { init: slot, .. } = &mut program.nodes[with_id].kind { *slot = final_init; }

    let name = program.objects[var].id.name;
    self.push_scope();
    self.declare(name, var);
    self.check_stmt(program, diags, body, ret_ty)?;
    self.pop_scope();
    if let Some(e) = else_body { self.check_stmt(program, diags, e, ret_ty)?; }
    Ok(())
  }
}
