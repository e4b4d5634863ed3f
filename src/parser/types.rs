//! Type-expression parsing (spec.md §4.1, type positions used throughout
//! typedefs/globals/args/casts). Grounded in
//! `original_source/src/compiler/parser/parser.c`'s `parse_type`,
//! `parse_struct_type`, `parse_enum_type`, `parse_lambda_type` and
//! `parser_generate_tuple_type`.

use crate::error::Result;
use crate::symbol::intern;
use crate::token::{Keyword, Span, TokenKind};
use crate::types::ast::{Node, NodeKind};
use crate::types::ident::Identifier;
use crate::types::object::{Object, ObjKind};
use crate::types::ty::{EnumMember, Member, Primitive, Type, TypeKind};
use crate::types::TypeId;

use super::precedence::Precedence;
use super::Parser;

/// Recognises a primitive type by its textual spelling (the original
/// looks these up with `get_primitive_type(p->tok->value)` against plain
/// identifier text, not a reserved keyword set — `u8`/`i32`/etc. are
/// ordinary identifiers that happen to name a builtin type).
fn primitive_of(text: &str) -> Option<Primitive> {
  Some(match text {
    "u8" => Primitive::U8, "u16" => Primitive::U16, "u32" => Primitive::U32, "u64" => Primitive::U64,
    "i8" => Primitive::I8, "i16" => Primitive::I16, "i32" => Primitive::I32, "i64" => Primitive::I64,
    "f32" => Primitive::F32, "f64" => Primitive::F64, "f80" => Primitive::F80,
    "char" => Primitive::Char, "bool" => Primitive::Bool, "void" => Primitive::Void,
    _ => return None,
  })
}

impl<'a> Parser<'a> {
  /// Parses one type expression, including any trailing `[N]`/`[]` array
  /// suffixes (spec.md §4.1: "array-vs-pointer-vs-VLA distinctions").
  pub(super) fn parse_type(&mut self) -> Result<TypeId> {
    let mut ty = self.parse_type_head()?;
    loop {
      if !self.check(&TokenKind::LBracket) { break; }
      let span = self.current.span;
      self.bump();
      let num_indices = if self.check(&TokenKind::RBracket) {
        None
      } else {
        let n = self.parse_expr(Precedence::None, TokenKind::RBracket)?;
        Some(self.const_u64_of(n)?)
      };
      self.expect(TokenKind::RBracket)?;
      let kind = match num_indices {
        None => TypeKind::Vla { base: ty },
        Some(n) if self.in_extern => TypeKind::CArray { base: ty, num_indices: n },
        Some(n) => TypeKind::SizedArray { base: ty, num_indices: n },
      };
      ty = self.program.alloc_type(Type {
        kind, is_constant: false, span, size: None, align: None, semantic_id: None,
      });
    }
    Ok(ty)
  }

  /// A type expression's integer-literal-only size, for the `[N]` suffix.
  /// Non-goals (spec.md §1): "non-primitive `const` evaluation beyond
  /// integer enum members" is not supported, so only a literal integer
  /// constant is accepted here.
  fn const_u64_of(&self, n: crate::types::NodeId) -> Result<u64> {
    match self.program.nodes[n].kind {
      NodeKind::IntLit(v) => Ok(v as u64),
      _ => Err(self.err_type(self.program.nodes[n].span, "array size must be a constant integer")),
    }
  }

  fn parse_type_head(&mut self) -> Result<TypeId> {
    let span = self.current.span;
    if matches!(self.current.kind, TokenKind::Id) {
      if let Some(prim) = primitive_of(&self.current.value) {
        self.bump();
        return Ok(self.program.alloc_type(Type::primitive(prim, span)));
      }
    }
    match self.current.kind.clone() {
      TokenKind::Kw(Keyword::Const) => {
        self.bump();
        let inner = self.parse_type()?;
        self.program.types[inner].is_constant = true;
        Ok(inner)
      }
      TokenKind::LParen => {
        self.bump();
        let inner = self.parse_type()?;
        self.expect(TokenKind::RParen)?;
        Ok(inner)
      }
      TokenKind::Kw(Keyword::Fn) => self.parse_lambda_type(span),
      TokenKind::Kw(Keyword::Struct) => self.parse_struct_or_union_type(span, false),
      TokenKind::Kw(Keyword::Union) => self.parse_struct_or_union_type(span, true),
      TokenKind::Kw(Keyword::Enum) => self.parse_enum_type(span),
      // `&&T` = `T**`, `&T` = `T*` (original: TOKEN_AND / TOKEN_REF).
      TokenKind::LogicAnd => {
        self.bump();
        let inner = self.parse_type()?;
        let ptr1 = self.program.alloc_type(Type {
          kind: TypeKind::Pointer { base: inner },
          is_constant: false, span, size: Some(8), align: Some(8), semantic_id: None,
        });
        Ok(self.program.alloc_type(Type {
          kind: TypeKind::Pointer { base: ptr1 },
          is_constant: false, span, size: Some(8), align: Some(8), semantic_id: None,
        }))
      }
      TokenKind::BitAnd => {
        self.bump();
        let inner = self.parse_type()?;
        Ok(self.program.alloc_type(Type {
          kind: TypeKind::Pointer { base: inner },
          is_constant: false, span, size: Some(8), align: Some(8), semantic_id: None,
        }))
      }
      TokenKind::LBrace => self.parse_tuple_type(span),
      TokenKind::Kw(Keyword::TypeOf) => {
        self.bump();
        let expr = self.parse_expr(Precedence::XOf, TokenKind::Semicolon)?;
        Ok(self.program.alloc_type(Type {
          kind: TypeKind::Typeof { expr },
          is_constant: false, span, size: None, align: None, semantic_id: None,
        }))
      }
      TokenKind::Id | TokenKind::ColonColon => {
        let id = self.parse_identifier()?;
        Ok(self.program.alloc_type(Type {
          kind: TypeKind::Named { id, referenced_obj: Default::default() },
          is_constant: false, span, size: None, align: None, semantic_id: None,
        }))
      }
      other => Err(self.err_syntax_at(span, format!("expected a type, found {other:?}"))),
    }
  }

  fn parse_struct_or_union_type(&mut self, span: Span, is_union: bool) -> Result<TypeId> {
    self.bump();
    self.expect(TokenKind::LBrace)?;
    let mut members = Vec::new();
    while !self.check(&TokenKind::RBrace) {
      let name = self.expect_id()?;
      self.expect(TokenKind::Colon)?;
      let ty = self.parse_type()?;
      members.push(Member { name, ty });
      if !self.eat(&TokenKind::Comma) { break; }
    }
    self.expect(TokenKind::RBrace)?;
    Ok(self.program.alloc_type(Type {
      kind: TypeKind::Struct { members, is_union },
      is_constant: false, span, size: None, align: None, semantic_id: None,
    }))
  }

  fn parse_enum_type(&mut self, span: Span) -> Result<TypeId> {
    self.bump();
    self.expect(TokenKind::LBrace)?;
    let mut members = Vec::new();
    while !self.check(&TokenKind::RBrace) {
      let name = self.expect_id()?;
      let value = if self.eat(&TokenKind::Assign) {
        self.parse_expr(Precedence::None, TokenKind::Comma)?
      } else {
        self.program.alloc_node(Node::new(NodeKind::Noop, span))
      };
      members.push(EnumMember { name, value });
      if !self.eat(&TokenKind::Comma) { break; }
    }
    self.expect(TokenKind::RBrace)?;
    Ok(self.program.alloc_type(Type {
      kind: TypeKind::Enum { members },
      is_constant: false, span, size: Some(4), align: Some(4), semantic_id: None,
    }))
  }

  /// `fn [<Ret>](Arg, ...)` function-pointer/lambda type.
  fn parse_lambda_type(&mut self, span: Span) -> Result<TypeId> {
    self.bump();
    let ret_ty = if self.eat(&TokenKind::Lt) {
      let t = self.parse_type()?;
      self.expect(TokenKind::Gt)?;
      t
    } else {
      self.program.alloc_type(Type::primitive(Primitive::Void, span))
    };
    self.expect(TokenKind::LParen)?;
    let mut arg_types = Vec::new();
    while !self.check(&TokenKind::RParen) {
      arg_types.push(self.parse_type()?);
      if !self.eat(&TokenKind::Comma) { break; }
    }
    self.expect(TokenKind::RParen)?;
    Ok(self.program.alloc_type(Type {
      kind: TypeKind::Function { base: ret_ty, arg_types, is_variadic: false },
      is_constant: false, span, size: Some(8), align: Some(8), semantic_id: None,
    }))
  }

  /// `{T1, T2, ...}` tuple type, deduplicated against any existing
  /// `__csp_tuple_<N>__` typedef with a structurally-equal member list
  /// (spec.md §4.1.3, §3 invariant). Named members `_0`, `_1`, ...
  /// (spec.md's authoritative resolution of the Open Question on tuple
  /// member naming).
  fn parse_tuple_type(&mut self, span: Span) -> Result<TypeId> {
    self.bump();
    let mut member_types = Vec::new();
    let mut i = 0usize;
    let mut members = Vec::new();
    while !self.check(&TokenKind::RBrace) {
      let ty = self.parse_type()?;
      member_types.push(ty);
      members.push(Member { name: intern(&format!("_{i}")), ty });
      i += 1;
      if !self.eat(&TokenKind::Comma) { break; }
    }
    self.expect(TokenKind::RBrace)?;

    if let Some(existing) = self.program.find_dedup_tuple(&member_types) {
      let name = self.program.objects[existing].id.clone();
      return Ok(self.program.alloc_type(Type {
        kind: TypeKind::Named { id: name, referenced_obj: std::cell::Cell::new(Some(existing)) },
        is_constant: false, span, size: None, align: None, semantic_id: None,
      }));
    }

    let struct_ty = self.program.alloc_type(Type {
      kind: TypeKind::Struct { members, is_union: false },
      is_constant: false, span, size: None, align: None, semantic_id: None,
    });
    let name = self.program.next_tuple_name();
    let id = Identifier::mangled_literal(intern(&name));
    let obj = Object::new(ObjKind::Typedef, id.clone(), struct_ty, span);
    let obj_id = self.program.alloc_object(obj);
    self.program.root.push(obj_id);
    Ok(self.program.alloc_type(Type {
      kind: TypeKind::Named { id, referenced_obj: std::cell::Cell::new(Some(obj_id)) },
      is_constant: false, span, size: None, align: None, semantic_id: None,
    }))
  }
}
