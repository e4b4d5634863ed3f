//! Name resolution (spec.md §4.3: "Every named type reference resolves
//! to exactly one object before emission") and enum-member
//! materialization, run once before expression-level inference.

use std::collections::HashMap;

use crate::error::{err, ErrorKind, Result};
use crate::symbol::Symbol;
use crate::token::SourceFile;
use crate::types::ident::Identifier;
use crate::types::object::{Object, ObjFlags, ObjKind};
use crate::types::program::Program;
use crate::types::ty::{Primitive, Type, TypeKind};
use crate::types::{ObjId, TypeId};

/// A name -> declaration table keyed by each object's *last* identifier
/// segment, not its full namespace-qualified chain. `parse_namespace`
/// flattens every nested declaration directly into `program.root`
/// without stamping the namespace onto the declaration's own
/// `Identifier` (only explicit `ns::foo` references carry an outer
/// chain), so there is nothing to key a per-namespace scope against on
/// the declaration side. Two sibling namespaces declaring the same leaf
/// name will shadow each other here; accepted as a pragmatic limit
/// rather than a modeled namespace stack.
pub(super) type GlobalScope = HashMap<Symbol, ObjId>;

/// The placeholder type name the parser gives a `let`/`with`/`for`-range
/// local that carries no explicit type annotation (see
/// `parser::parse_local`). It is never a real typedef, so
/// [`resolve_named_types`] must not try to resolve it — `infer` replaces
/// the object's whole `ty` field once the initializer's type is known.
pub(super) const INFER_PLACEHOLDER: &str = "__infer";

pub fn resolve_program(program: &mut Program, source: &SourceFile) -> Result<()> {
  materialize_enum_members(program);
  let scope = build_global_scope(program);
  resolve_named_types(program, &scope, source)
}

pub(super) fn build_global_scope(program: &Program) -> GlobalScope {
  let mut scope = GlobalScope::new();
  for &id in &program.root {
    scope.insert(program.objects[id].id.name, id);
  }
  scope
}

/// Promotes every `TypeKind::Enum` member from a value living only
/// inside `members: Vec<EnumMember>` into a real top-level constant
/// `Object` (spec.md §4.4 item 4: "enum members always emitted as plain
/// `int` globals"). `ObjKind::EnumMember`/`Object::enum_member_index`
/// exist in the object model specifically for this and were otherwise
/// dead.
fn materialize_enum_members(program: &mut Program) {
  let mut to_add = Vec::new();
  for (_, ty) in program.types.iter() {
    if let TypeKind::Enum { members } = &ty.kind {
      for (idx, member) in members.iter().enumerate() {
        to_add.push((member.name, member.value, idx as u32, ty.span));
      }
    }
  }
  if to_add.is_empty() { return; }
  let i32_ty = program.alloc_type(Type::primitive(Primitive::I32, to_add[0].3));
  for (name, value, idx, span) in to_add {
    let mut obj = Object::new(ObjKind::EnumMember, Identifier::new(name), i32_ty, span);
    obj.flags |= ObjFlags::CONSTANT;
    obj.body = Some(value);
    obj.enum_member_index = Some(idx);
    let obj_id = program.alloc_object(obj);
    program.root.push(obj_id);
  }
}

fn resolve_named_types(program: &mut Program, scope: &GlobalScope, source: &SourceFile) -> Result<()> {
  let ids: Vec<TypeId> = program.types.iter().map(|(id, _)| id).collect();
  for id in ids {
    let pending = {
      let TypeKind::Named { id: ident, referenced_obj } = &program.types[id].kind else { continue };
      if referenced_obj.get().is_some() { continue; }
      if ident.outer.is_none() && &*ident.name.as_str() == INFER_PLACEHOLDER { continue; }
      (ident.name, program.types[id].span, ident.to_string())
    };
    let (name_sym, span, display) = pending;
    let obj_id = scope.get(&name_sym).copied()
      .ok_or_else(|| err(ErrorKind::Undefined, source, span, format!("undefined type `{display}`")))?;
    if program.objects[obj_id].kind != ObjKind::Typedef {
      return Err(err(ErrorKind::Type, source, span, format!("`{display}` does not name a type")));
    }
    let TypeKind::Named { referenced_obj, .. } = &program.types[id].kind else { unreachable!() };
    referenced_obj.set(Some(obj_id));
  }
  Ok(())
}
