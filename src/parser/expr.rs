//! The Pratt expression parser (spec.md §4.1.2).
//!
//! `parse_expr(min_prec, end_tok)`: run the current token's prefix
//! function, then while the next token isn't `end_tok` and its
//! precedence strictly exceeds `min_prec`, consume it via its infix
//! function (which typically recurses with that operator's own
//! precedence, giving left-associativity for same-precedence chains).

use std::rc::Rc;
use crate::error::{err, ErrorKind, Result};
use crate::symbol::intern;
use crate::token::{Keyword, TokenKind};
use crate::types::ast::{AsmArg, BinOp, IncDecOp, Node, NodeKind, TypePredicate, UnOp};
use crate::types::ident::Identifier;
use crate::types::object::{Object, ObjKind};
use crate::types::ty::{Primitive, Type};
use crate::types::NodeId;
use crate::visitor;

use super::precedence::{infix_precedence, Precedence};
use super::Parser;

impl<'a> Parser<'a> {
  pub(super) fn parse_expr(&mut self, min_prec: Precedence, end_tok: TokenKind) -> Result<NodeId> {
    let mut left = self.parse_prefix(end_tok.clone())?;
    loop {
      if self.check(&end_tok) { break; }
      let prec = infix_precedence(&self.current.kind);
      if prec.level() <= min_prec.level() { break; }
      left = self.parse_infix(left, prec, end_tok.clone())?;
    }
    Ok(left)
  }

  fn parse_prefix(&mut self, end_tok: TokenKind) -> Result<NodeId> {
    let span = self.current.span;
    match self.current.kind.clone() {
      TokenKind::IntLit => {
        let tok = self.bump();
        let value: i128 = tok.value.trim_end_matches(['u', 'l', 'U', 'L']).parse()
          .map_err(|_| self.err_syntax_at(span, format!("invalid integer literal `{}`", tok.value)))?;
        let prim = classify_int_literal(value);
        let ty = self.program.alloc_type(Type::primitive(prim, span));
        let mut node = Node::new(NodeKind::IntLit(value), span);
        node.data_type = Some(ty);
        node.is_constant = true;
        Ok(self.program.alloc_node(node))
      }
      TokenKind::FloatLit => {
        let tok = self.bump();
        let value: f64 = tok.value.trim_end_matches(['f', 'F']).parse()
          .map_err(|_| self.err_syntax_at(span, format!("invalid float literal `{}`", tok.value)))?;
        let prim = classify_float_literal(value);
        let ty = self.program.alloc_type(Type::primitive(prim, span));
        let mut node = Node::new(NodeKind::FloatLit(value), span);
        node.data_type = Some(ty);
        node.is_constant = true;
        Ok(self.program.alloc_node(node))
      }
      TokenKind::CharLit => {
        let tok = self.bump();
        let c = tok.value.chars().next().unwrap_or('\0');
        let ty = self.program.alloc_type(Type::primitive(Primitive::Char, span));
        let mut node = Node::new(NodeKind::CharLit(c), span);
        node.data_type = Some(ty);
        node.is_constant = true;
        Ok(self.program.alloc_node(node))
      }
      TokenKind::StrLit => {
        let tok = self.bump();
        let sym = intern(&tok.value);
        let char_ty = self.program.alloc_type(Type::primitive(Primitive::Char, span));
        let ptr_ty = self.program.alloc_type(Type {
          kind: crate::types::ty::TypeKind::Pointer { base: char_ty },
          is_constant: true, span, size: Some(8), align: Some(8), semantic_id: None,
        });
        let mut node = Node::new(NodeKind::StrLit(sym), span);
        node.data_type = Some(ptr_ty);
        node.is_constant = true;
        Ok(self.program.alloc_node(node))
      }
      TokenKind::BoolLit | TokenKind::Kw(Keyword::True) | TokenKind::Kw(Keyword::False) => {
        let tok = self.bump();
        let value = matches!(tok.kind, TokenKind::Kw(Keyword::True)) || &*tok.value == "true";
        let ty = self.program.alloc_type(Type::primitive(Primitive::Bool, span));
        let mut node = Node::new(NodeKind::BoolLit(value), span);
        node.data_type = Some(ty);
        node.is_constant = true;
        Ok(self.program.alloc_node(node))
      }
      TokenKind::Kw(Keyword::Nil) => {
        self.bump();
        let void_ty = self.program.alloc_type(Type::primitive(Primitive::Void, span));
        let ptr_ty = self.program.alloc_type(Type {
          kind: crate::types::ty::TypeKind::Pointer { base: void_ty },
          is_constant: false, span, size: Some(8), align: Some(8), semantic_id: None,
        });
        let mut node = Node::new(NodeKind::NilLit, span);
        node.data_type = Some(ptr_ty);
        Ok(self.program.alloc_node(node))
      }
      TokenKind::Dollar => {
        if self.pipe_depth == 0 {
          return Err(self.err_syntax("`$` is only valid inside a pipe's right-hand side"));
        }
        self.bump();
        Ok(self.program.alloc_node(Node::new(NodeKind::PipeHole, span)))
      }
      TokenKind::Minus => { self.bump(); self.parse_unary(UnOp::Neg, span) }
      TokenKind::LogicNot => { self.bump(); self.parse_unary(UnOp::Not, span) }
      TokenKind::BitNot => { self.bump(); self.parse_unary(UnOp::BitNot, span) }
      TokenKind::BitAnd => { self.bump(); self.parse_unary(UnOp::Borrow, span) }
      TokenKind::Star => { self.bump(); self.parse_unary(UnOp::Deref, span) }
      TokenKind::Inc => { self.bump(); self.parse_pre_incdec(IncDecOp::Inc, span) }
      TokenKind::Dec => { self.bump(); self.parse_pre_incdec(IncDecOp::Dec, span) }
      TokenKind::LParen => {
        self.bump();
        let inner = self.parse_expr(Precedence::None, TokenKind::RParen)?;
        self.expect(TokenKind::RParen)?;
        Ok(inner)
      }
      TokenKind::LBracket => self.parse_array_lit(span),
      TokenKind::LBrace => self.parse_struct_lit(span, None),
      TokenKind::BitOr => self.parse_lambda_lit(span),
      TokenKind::Kw(Keyword::If) => self.parse_if_expr(span),
      TokenKind::Kw(Keyword::SizeOf) => {
        self.bump();
        self.expect(TokenKind::LParen)?;
        let ty = self.parse_type()?;
        self.expect(TokenKind::RParen)?;
        Ok(self.program.alloc_node(Node::new(NodeKind::SizeOf(ty), span)))
      }
      TokenKind::Kw(Keyword::AlignOf) => {
        self.bump();
        self.expect(TokenKind::LParen)?;
        let ty = self.parse_type()?;
        self.expect(TokenKind::RParen)?;
        Ok(self.program.alloc_node(Node::new(NodeKind::AlignOf(ty), span)))
      }
      TokenKind::Kw(Keyword::Len) => {
        self.bump();
        self.expect(TokenKind::LParen)?;
        let inner = self.parse_expr(Precedence::None, TokenKind::RParen)?;
        self.expect(TokenKind::RParen)?;
        Ok(self.program.alloc_node(Node::new(NodeKind::Len(inner), span)))
      }
      TokenKind::Kw(Keyword::VaArg) => {
        self.bump();
        self.expect(TokenKind::LParen)?;
        let list = self.parse_expr(Precedence::None, TokenKind::Comma)?;
        self.expect(TokenKind::Comma)?;
        let ty = self.parse_type()?;
        self.expect(TokenKind::RParen)?;
        Ok(self.program.alloc_node(Node::new(NodeKind::VaArg { list, ty }, span)))
      }
      TokenKind::Kw(Keyword::Asm) => self.parse_asm(span),
      TokenKind::Kw(kw @ (Keyword::RegClass | Keyword::IsInt | Keyword::IsUint | Keyword::IsFloat
        | Keyword::IsPointer | Keyword::IsArray | Keyword::IsStruct | Keyword::IsUnion | Keyword::ToStr)) => {
        self.bump();
        let pred = match kw {
          Keyword::RegClass => TypePredicate::RegClass,
          Keyword::IsInt => TypePredicate::IsInt,
          Keyword::IsUint => TypePredicate::IsUint,
          Keyword::IsFloat => TypePredicate::IsFloat,
          Keyword::IsPointer => TypePredicate::IsPointer,
          Keyword::IsArray => TypePredicate::IsArray,
          Keyword::IsStruct => TypePredicate::IsStruct,
          Keyword::IsUnion => TypePredicate::IsUnion,
          _ => TypePredicate::ToStr,
        };
        self.expect(TokenKind::LParen)?;
        let mut args = vec![self.parse_type()?];
        while self.eat(&TokenKind::Comma) { args.push(self.parse_type()?); }
        self.expect(TokenKind::RParen)?;
        Ok(self.program.alloc_node(Node::new(NodeKind::TypePredicate { pred, args }, span)))
      }
      TokenKind::Id | TokenKind::ColonColon => {
        let id = self.parse_identifier()?;
        if self.check(&TokenKind::ColonColon) {
          // shouldn't happen: parse_identifier already consumes the full
          // chain, but `Name::{...}` (struct literal) needs one more `::`.
        }
        if self.check(&TokenKind::LBrace) && self.preceding_double_colon() {
          return self.parse_struct_lit(span, Some(id));
        }
        let mut node = Node::new(NodeKind::Id(id), span);
        node.data_type = None;
        Ok(self.program.alloc_node(node))
      }
      other => Err(self.err_syntax_at(span, format!("unexpected token in expression position: {other:?}; end={end_tok:?}"))),
    }
  }

  /// `Name::{...}` vs a bare `{...}`: by the time we see `{`, the
  /// identifier chain has already been fully consumed by
  /// [`Parser::parse_identifier`], which also eats the separating `::`.
  /// This always holds once we've reached a `{` right after an
  /// identifier chain, so the named form is simply "identifier then `{`".
  fn preceding_double_colon(&self) -> bool { true }

  fn parse_unary(&mut self, op: UnOp, span: crate::token::Span) -> Result<NodeId> {
    let operand = self.parse_expr(Precedence::Cast, TokenKind::Semicolon.clone())?;
    Ok(self.program.alloc_node(Node::new(NodeKind::Unary { op, operand }, span)))
  }

  fn parse_pre_incdec(&mut self, op: IncDecOp, span: crate::token::Span) -> Result<NodeId> {
    let operand = self.parse_expr(Precedence::Cast, TokenKind::Semicolon.clone())?;
    Ok(self.program.alloc_node(Node::new(NodeKind::IncDec { op, operand, is_prefix: true }, span)))
  }

  fn parse_array_lit(&mut self, span: crate::token::Span) -> Result<NodeId> {
    self.bump();
    let mut elements = Vec::new();
    while !self.check(&TokenKind::RBracket) {
      elements.push(self.parse_expr(Precedence::None, TokenKind::Comma)?);
      if !self.eat(&TokenKind::Comma) { break; }
    }
    self.expect(TokenKind::RBracket)?;
    Ok(self.program.alloc_node(Node::new(NodeKind::ArrayLit { elements }, span)))
  }

  fn parse_struct_lit(&mut self, span: crate::token::Span, name: Option<Identifier>) -> Result<NodeId> {
    self.expect(TokenKind::LBrace)?;
    let mut fields = Vec::new();
    while !self.check(&TokenKind::RBrace) {
      let field_name = self.expect_id()?;
      self.expect(TokenKind::Colon)?;
      let value = self.parse_expr(Precedence::None, TokenKind::Comma)?;
      fields.push((field_name, value));
      if !self.eat(&TokenKind::Comma) { break; }
    }
    self.expect(TokenKind::RBrace)?;
    Ok(self.program.alloc_node(Node::new(NodeKind::StructLit { name, fields }, span)))
  }

  /// `|args| [: Ret] => stmt`, hoisted to a new program-scope function
  /// (spec.md §4.1.2); the expression site yields an identifier
  /// reference to it (spec.md §3 invariant).
  fn parse_lambda_lit(&mut self, span: crate::token::Span) -> Result<NodeId> {
    self.bump(); // opening `|`
    let mut args = Vec::new();
    let mut arg_types = Vec::new();
    while !self.check(&TokenKind::BitOr) {
      let arg_span = self.current.span;
      let arg_name = self.expect_id()?;
      self.expect(TokenKind::Colon)?;
      let arg_ty = self.parse_type()?;
      arg_types.push(arg_ty);
      let obj = Object::new(ObjKind::FunctionArg, Identifier::new(arg_name), arg_ty, arg_span);
      args.push(self.program.alloc_object(obj));
      if !self.eat(&TokenKind::Comma) { break; }
    }
    self.expect(TokenKind::BitOr)?; // closing `|`
    let ret_ty = if self.eat(&TokenKind::Colon) { self.parse_type()? } else {
      self.program.alloc_type(Type::primitive(Primitive::Void, span))
    };
    self.expect(TokenKind::FatArrow)?;
    let mut locals = Vec::new();
    let body_stmt = self.parse_stmt(&mut locals)?;
    let body = self.program.alloc_node(Node::new(
      NodeKind::Block { stmts: vec![body_stmt], locals }, span,
    ));
    let fn_ty = self.program.alloc_type(Type {
      kind: crate::types::ty::TypeKind::Function { base: ret_ty, arg_types, is_variadic: false },
      is_constant: false, span, size: Some(8), align: Some(8), semantic_id: None,
    });
    let name = self.program.next_lambda_name();
    let mut fn_obj = Object::new(ObjKind::Function, Identifier::mangled_literal(intern(&name)), fn_ty, span);
    fn_obj.args = args;
    fn_obj.body = Some(body);
    let fn_id = self.program.alloc_object(fn_obj);
    self.program.root.push(fn_id);
    let id_node = Node::new(NodeKind::Id(Identifier::mangled_literal(intern(&name))), span);
    Ok(self.program.alloc_node(id_node))
  }

  /// `if expr => a else b` as an expression (spec.md §4.1.2).
  fn parse_if_expr(&mut self, span: crate::token::Span) -> Result<NodeId> {
    self.bump();
    let cond = self.parse_expr(Precedence::None, TokenKind::FatArrow)?;
    self.expect(TokenKind::FatArrow)?;
    let if_branch = self.parse_expr(Precedence::None, TokenKind::Kw(Keyword::Else))?;
    self.expect(TokenKind::Kw(Keyword::Else))?;
    let else_branch = self.parse_expr(Precedence::None, TokenKind::Semicolon)?;
    Ok(self.program.alloc_node(Node::new(NodeKind::IfExpr { cond, if_branch, else_branch }, span)))
  }

  /// Inline `asm "str", args...;` (spec.md §4.1.2, §4.5).
  fn parse_asm(&mut self, span: crate::token::Span) -> Result<NodeId> {
    self.bump();
    let mut args = Vec::new();
    loop {
      match self.current.kind.clone() {
        TokenKind::StrLit => { let t = self.bump(); args.push(AsmArg::Str(t.value.to_string())); }
        TokenKind::IntLit => {
          let t = self.bump();
          let v: i64 = t.value.parse().map_err(|_| self.err_syntax_at(span, "invalid asm integer arg"))?;
          args.push(AsmArg::Int(v));
        }
        TokenKind::Id | TokenKind::ColonColon => {
          args.push(AsmArg::Ident(self.parse_identifier()?, std::cell::Cell::new(None)));
        }
        _ => break,
      }
      if !self.eat(&TokenKind::Comma) { break; }
    }
    Ok(self.program.alloc_node(Node::new(NodeKind::Asm { args }, span)))
  }

  fn parse_infix(&mut self, left: NodeId, prec: Precedence, end_tok: TokenKind) -> Result<NodeId> {
    let span = self.program.nodes[left].span;
    match self.current.kind.clone() {
      TokenKind::Assign => {
        self.bump();
        let right = self.parse_expr(prec, end_tok)?;
        let mut node = Node::new(NodeKind::Assign { left, right }, span);
        node.is_assigning = true;
        Ok(self.program.alloc_node(node))
      }
      TokenKind::PlusAssign | TokenKind::MinusAssign | TokenKind::StarAssign | TokenKind::SlashAssign => {
        let op = match self.current.kind {
          TokenKind::PlusAssign => BinOp::Add,
          TokenKind::MinusAssign => BinOp::Sub,
          TokenKind::StarAssign => BinOp::Mul,
          _ => BinOp::Div,
        };
        self.bump();
        let rhs = self.parse_expr(prec, end_tok)?;
        let combined = self.program.alloc_node(Node::new(NodeKind::Binary { op, left, right: rhs }, span));
        let mut node = Node::new(NodeKind::Assign { left, right: combined }, span);
        node.is_assigning = true;
        Ok(self.program.alloc_node(node))
      }
      TokenKind::Pipe => {
        self.bump();
        self.pipe_depth += 1;
        let rhs = self.parse_expr(Precedence::Pipe, end_tok);
        self.pipe_depth -= 1;
        let rhs = rhs?;
        let had_hole = substitute_pipe_holes(&mut self.program, rhs, left);
        if had_hole {
          Ok(rhs)
        } else if matches!(self.program.nodes[rhs].kind, NodeKind::PipeHole) {
          Ok(left)
        } else {
          Ok(self.program.alloc_node(Node::new(NodeKind::Call { callee: rhs, args: vec![left] }, span)))
        }
      }
      TokenKind::Backtick => {
        self.bump();
        let name = self.expect_id()?;
        self.expect(TokenKind::Backtick)?;
        let callee = self.program.alloc_node(Node::new(NodeKind::Id(Identifier::new(name)), span));
        let right = self.parse_expr(prec, end_tok)?;
        Ok(self.program.alloc_node(Node::new(NodeKind::Call { callee, args: vec![left, right] }, span)))
      }
      TokenKind::LogicOr | TokenKind::LogicAnd | TokenKind::BitOr | TokenKind::BitXor | TokenKind::BitAnd
        | TokenKind::Eq | TokenKind::Ne | TokenKind::Lt | TokenKind::Gt | TokenKind::Le | TokenKind::Ge
        | TokenKind::Shl | TokenKind::Shr | TokenKind::Plus | TokenKind::Minus | TokenKind::Star
        | TokenKind::Slash | TokenKind::Percent => {
        let op = binop_of(&self.current.kind);
        self.bump();
        let right = self.parse_expr(prec, end_tok)?;
        Ok(self.program.alloc_node(Node::new(NodeKind::Binary { op, left, right }, span)))
      }
      TokenKind::Inc => {
        self.bump();
        Ok(self.program.alloc_node(Node::new(NodeKind::IncDec { op: IncDecOp::Inc, operand: left, is_prefix: false }, span)))
      }
      TokenKind::Dec => {
        self.bump();
        Ok(self.program.alloc_node(Node::new(NodeKind::IncDec { op: IncDecOp::Dec, operand: left, is_prefix: false }, span)))
      }
      TokenKind::Pow2 => {
        self.bump();
        let square = self.program.alloc_node(Node::new(NodeKind::Binary { op: BinOp::Mul, left, right: left }, span));
        Ok(self.program.alloc_node(Node::new(NodeKind::Closure { inner: square }, span)))
      }
      TokenKind::Pow3 => {
        self.bump();
        let square = self.program.alloc_node(Node::new(NodeKind::Binary { op: BinOp::Mul, left, right: left }, span));
        let cube = self.program.alloc_node(Node::new(NodeKind::Binary { op: BinOp::Mul, left: square, right: left }, span));
        Ok(self.program.alloc_node(Node::new(NodeKind::Closure { inner: cube }, span)))
      }
      TokenKind::Colon => {
        self.bump();
        let target = self.parse_type()?;
        Ok(self.program.alloc_node(Node::new(NodeKind::Cast { operand: left, target, is_implicit: false }, span)))
      }
      TokenKind::LParen => {
        self.bump();
        let mut args = Vec::new();
        while !self.check(&TokenKind::RParen) {
          args.push(self.parse_expr(Precedence::None, TokenKind::Comma)?);
          if !self.eat(&TokenKind::Comma) { break; }
        }
        self.expect(TokenKind::RParen)?;
        Ok(self.program.alloc_node(Node::new(NodeKind::Call { callee: left, args }, span)))
      }
      TokenKind::LBracket => {
        self.bump();
        let index = self.parse_expr(Precedence::None, TokenKind::RBracket)?;
        self.expect(TokenKind::RBracket)?;
        Ok(self.program.alloc_node(Node::new(NodeKind::Index { left, index }, span)))
      }
      TokenKind::Dot => {
        self.bump();
        let field = self.expect_id()?;
        Ok(self.program.alloc_node(Node::new(NodeKind::Member { left, field }, span)))
      }
      other => Err(self.err_syntax_at(span, format!("unexpected infix token: {other:?}"))),
    }
  }
}

fn binop_of(kind: &TokenKind) -> BinOp {
  match kind {
    TokenKind::LogicOr => BinOp::LogicOr,
    TokenKind::LogicAnd => BinOp::LogicAnd,
    TokenKind::BitOr => BinOp::BitOr,
    TokenKind::BitXor => BinOp::BitXor,
    TokenKind::BitAnd => BinOp::BitAnd,
    TokenKind::Eq => BinOp::Eq,
    TokenKind::Ne => BinOp::Ne,
    TokenKind::Lt => BinOp::Lt,
    TokenKind::Gt => BinOp::Gt,
    TokenKind::Le => BinOp::Le,
    TokenKind::Ge => BinOp::Ge,
    TokenKind::Shl => BinOp::Shl,
    TokenKind::Shr => BinOp::Shr,
    TokenKind::Plus => BinOp::Add,
    TokenKind::Minus => BinOp::Sub,
    TokenKind::Star => BinOp::Mul,
    TokenKind::Slash => BinOp::Div,
    TokenKind::Percent => BinOp::Mod,
    _ => unreachable!("binop_of called with non-operator token"),
  }
}

/// Integer literal boundary classification (spec.md §8): `INT_MAX` ->
/// `i32`, `INT_MAX+1` -> `i64`, above `LONG_MAX` -> `u64`.
#[must_use] pub fn classify_int_literal(v: i128) -> Primitive {
  if v >= i32::MIN as i128 && v <= i32::MAX as i128 { Primitive::I32 }
  else if v >= i64::MIN as i128 && v <= i64::MAX as i128 { Primitive::I64 }
  else if v >= 0 && v <= u64::MAX as i128 { Primitive::U64 }
  else { Primitive::I64 }
}

/// Float literal boundary classification (spec.md §8): above `FLT_MAX`
/// becomes `f64`.
#[must_use] pub fn classify_float_literal(v: f64) -> Primitive {
  if v.abs() <= f32::MAX as f64 { Primitive::F32 } else { Primitive::F64 }
}

/// Recursively replaces every [`NodeKind::PipeHole`] reachable from
/// `node` with a copy of `replacement` (spec.md §4.1.2, `Pipe` hole
/// desugaring). Returns whether any hole was found.
pub(super) fn substitute_pipe_holes(
  program: &mut crate::types::program::Program, node: NodeId, replacement: NodeId,
) -> bool {
  let mut found = false;
  for kid in visitor::children(&program.nodes[node].kind) {
    if matches!(program.nodes[kid].kind, NodeKind::PipeHole) {
      program.nodes[kid] = program.nodes[replacement].clone();
      found = true;
    } else {
      found |= substitute_pipe_holes(program, kid, replacement);
    }
  }
  found
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn int_literal_boundaries_classify_per_spec() {
    assert_eq!(classify_int_literal(i32::MAX as i128), Primitive::I32);
    assert_eq!(classify_int_literal(i32::MAX as i128 + 1), Primitive::I64);
    assert_eq!(classify_int_literal(i64::MAX as i128 + 1), Primitive::U64);
  }

  #[test]
  fn float_literal_above_flt_max_is_f64() {
    assert_eq!(classify_float_literal(1.0), Primitive::F32);
    assert_eq!(classify_float_literal(f32::MAX as f64 * 2.0), Primitive::F64);
  }
}
