//! Type lowering to C (spec.md §4.4.2), grounded verbatim in
//! `c_codegen.c`'s `c_gen_type`/`c_gen_typed_name`/`c_primitive_types`:
//! primitives map to their fixed-width C spelling, a sized array lowers
//! to the anonymous `struct { unsigned long __s; T __v[N]; }`, a VLA to
//! a pointer at the same struct shape with no length in the array
//! declarator, and a named type prints the referencing object's mangled
//! identifier (the typedef itself is predeclared separately, see
//! `predefine`).

use crate::types::ident::Identifier;
use crate::types::program::Program;
use crate::types::ty::{Primitive, TypeKind};
use crate::types::TypeId;

use super::Emitter;

/// `c_primitive_types` in `c_codegen.c`.
pub(super) fn primitive_spelling(p: Primitive) -> &'static str {
  match p {
    Primitive::U8 => "unsigned char",
    Primitive::U16 => "unsigned short",
    Primitive::U32 => "unsigned int",
    Primitive::U64 => "unsigned long",
    Primitive::I8 => "signed char",
    Primitive::I16 => "signed short",
    Primitive::I32 => "signed int",
    Primitive::I64 => "signed long",
    Primitive::F32 => "float",
    Primitive::F64 => "double",
    Primitive::F80 => "long double",
    Primitive::Char => "char",
    Primitive::Bool => "_Bool",
    Primitive::Void => "void",
    // A bare `TY_FN` primitive never reaches here (spec.md §3: function
    // types are always `TypeKind::Function`); kept only so the match is
    // exhaustive the same way `c_primitive_types` indexes every `TY_KIND`.
    Primitive::Fn => "void",
  }
}

impl<'p> Emitter<'p> {
  /// `c_gen_identifier` — the mangled spelling of a declared name.
  pub(super) fn mangled(&self, id: &Identifier) -> String {
    id.mangled()
  }

  /// `c_gen_type`: prints a bare type with no following declarator name.
  pub(super) fn gen_type(&mut self, ty: TypeId) {
    let is_constant = self.program.types[ty].is_constant;
    if is_constant {
      self.out.push_str("const ");
    }
    if let TypeKind::Primitive(p) = &self.program.types[ty].kind {
      self.out.push_str(primitive_spelling(*p));
      return;
    }
    match self.program.types[ty].kind.clone() {
      TypeKind::Pointer { base } => {
        self.gen_type(base);
        self.out.push('*');
      }
      // `{u64 __s; T __v[N];}` — spec.md §4.4.2.
      TypeKind::SizedArray { base, num_indices } => {
        self.out.push_str("struct { unsigned long __s; ");
        self.gen_type(base);
        self.out.push_str(&format!(" __v[{num_indices}]; }}"));
      }
      TypeKind::CArray { base, num_indices } => {
        self.gen_type(base);
        self.out.push_str(&format!("[{num_indices}]"));
      }
      // A VLA is a pointer to the same length-prefixed shape, but with a
      // flexible array member rather than a fixed bound.
      TypeKind::Vla { base } => {
        self.out.push_str("struct { unsigned long __s; ");
        self.gen_type(base);
        self.out.push_str(" __v[]; }*");
      }
      TypeKind::Function { base, arg_types, is_variadic } => {
        self.gen_type(base);
        self.out.push_str("(*)(");
        self.gen_arg_type_list(&arg_types, is_variadic);
        self.out.push(')');
      }
      TypeKind::Named { id, .. } => {
        self.out.push_str(&self.mangled(&id));
      }
      TypeKind::Struct { .. } => self.gen_struct_body(ty, None),
      TypeKind::Enum { .. } => self.out.push_str("int"),
      TypeKind::Typeof { expr } => {
        let inner = self.program.nodes[expr].data_type.expect("typeof resolved during checking");
        self.gen_type(inner);
      }
    }
  }

  fn gen_arg_type_list(&mut self, arg_types: &[TypeId], is_variadic: bool) {
    for (i, &a) in arg_types.iter().enumerate() {
      self.gen_type(a);
      if i + 1 < arg_types.len() || is_variadic { self.out.push(','); }
    }
    if is_variadic { self.out.push_str("..."); }
  }

  /// `c_gen_struct`: `struct|union <name>? { <members>; }`. `name` is
  /// `None` for an anonymous struct-literal type; the typedef/dedup
  /// passes always pass the typedef's own mangled name.
  pub(super) fn gen_struct_body(&mut self, ty: TypeId, name: Option<&str>) {
    let TypeKind::Struct { members, is_union } = self.program.types[ty].kind.clone() else {
      unreachable!("gen_struct_body called on a non-struct type");
    };
    self.out.push_str(if is_union { "union " } else { "struct " });
    if let Some(n) = name { self.out.push_str(n); }
    self.out.push('{');
    for m in &members {
      self.gen_typed_name_raw(&m.name.to_string(), m.ty);
      self.out.push(';');
    }
    self.out.push('}');
  }

  /// `c_gen_typed_name`: a declaration's type-and-name pair, handling
  /// the two C declarator forms that don't read left-to-right (a fixed
  /// array's `T name[N]` and a function pointer's `T (*name)(...)`).
  pub(super) fn gen_typed_name(&mut self, id: &Identifier, ty: TypeId) {
    let mangled = self.mangled(id);
    self.gen_typed_name_raw(&mangled, ty);
  }

  pub(super) fn gen_typed_name_raw(&mut self, mangled: &str, ty: TypeId) {
    match self.program.types[ty].kind.clone() {
      TypeKind::CArray { base, num_indices } => {
        self.gen_type(base);
        self.out.push(' ');
        self.out.push_str(mangled);
        self.out.push_str(&format!("[{num_indices}]"));
      }
      TypeKind::Function { base, arg_types, is_variadic } => {
        self.gen_type(base);
        self.out.push_str(&format!("(*{mangled})("));
        self.gen_arg_type_list(&arg_types, is_variadic);
        self.out.push(')');
      }
      _ => {
        self.gen_type(ty);
        self.out.push(' ');
        self.out.push_str(mangled);
      }
    }
  }

  /// `c_predefine_dependant_types`: a `TY_UNDEF`-equivalent (our
  /// `TypeKind::Named`) referencing a typedef that hasn't been emitted
  /// yet must be predeclared first, so a struct member naming a later
  /// typedef doesn't forward-reference it.
  pub(super) fn predefine_dependant_types(&mut self, ty: TypeId) {
    if let TypeKind::Named { referenced_obj, .. } = &self.program.types[ty].kind {
      if let Some(obj_id) = referenced_obj.get() {
        if !self.program.objects[obj_id].flags.contains(crate::types::object::ObjFlags::GENERATED) {
          self.gen_typedef(obj_id);
        }
      }
    }
  }
}

pub(super) fn unpack_for_codegen(program: &Program, ty: TypeId) -> TypeId {
  crate::typeck::unpack(program, ty)
}
