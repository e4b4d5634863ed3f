//! The parser (spec.md §4.1): "tokens -> a fully built, untyped AST (data
//! types set where statically known; `undef` placeholders elsewhere)."
//!
//! Structured as a recursive-descent statement/declaration parser
//! ([`Parser::parse_program`] down through [`Parser::parse_stmt`]) fused
//! with the Pratt expression parser in `expr.rs`. `directives.rs` holds
//! compiler-directive evaluation (spec.md §4.1.5); `precedence.rs` holds
//! the precedence table.

mod directives;
mod expr;
mod precedence;
mod types;

use std::rc::Rc;
use crate::error::{err, ErrorKind, Result};
use crate::symbol::{intern, Symbol};
use crate::token::{Keyword, SourceFile, Span, Token, TokenKind, TokenStream};
use crate::types::ast::{MainFunctionKind, Node, NodeKind};
use crate::types::ident::{IdentKind, Identifier};
use crate::types::object::{Object, ObjFlags, ObjKind};
use crate::types::program::Program;
use crate::types::ty::{Primitive, Type, TypeKind};
use crate::types::{NodeId, ObjId};

pub use precedence::Precedence;

/// Builtin type-expression predicates and their recognised keyword
/// (spec.md §4.1.2 "Type-expression closures").
pub use crate::types::ast::TypePredicate;

pub struct Parser<'a> {
  stream: &'a mut dyn TokenStream,
  current: Token,
  source: Rc<SourceFile>,
  pub program: Program,
  pub diags: crate::error::Diagnostics,
  /// Depth of pipe right-hand-sides currently being parsed; `$` is only
  /// legal while this is nonzero (spec.md §4.1.2, §8 boundary behavior).
  pipe_depth: u32,
  /// True while parsing inside an `extern { ... }` block, which selects
  /// the C-array (name-bound) array-type reading instead of the
  /// Source-syntax sized-array reading for `T[N]` (Open Question,
  /// resolved in DESIGN.md: extern signatures describe the real C ABI).
  in_extern: bool,
}

impl<'a> Parser<'a> {
  pub fn new(stream: &'a mut dyn TokenStream, source: Rc<SourceFile>) -> Self {
    let current = stream.next_token();
    Parser {
      stream, current, source, program: Program::new(),
      diags: crate::error::Diagnostics::new(), pipe_depth: 0, in_extern: false,
    }
  }

  // --- token plumbing ---

  fn bump(&mut self) -> Token {
    let next = self.stream.next_token();
    std::mem::replace(&mut self.current, next)
  }

  fn check(&self, kind: &TokenKind) -> bool { &self.current.kind == kind }

  fn check_kw(&self, kw: Keyword) -> bool { self.current.kind == TokenKind::Kw(kw) }

  fn eat(&mut self, kind: &TokenKind) -> bool {
    if self.check(kind) { self.bump(); true } else { false }
  }

  fn expect(&mut self, kind: TokenKind) -> Result<Token> {
    if self.current.kind == kind { Ok(self.bump()) }
    else {
      Err(self.err_syntax(format!("expected {kind:?}, found {:?}", self.current.kind)))
    }
  }

  fn expect_id(&mut self) -> Result<Symbol> {
    if matches!(self.current.kind, TokenKind::Id) {
      Ok(self.bump().intern_value())
    } else {
      Err(self.err_syntax(format!("expected identifier, found {:?}", self.current.kind)))
    }
  }

  fn err_syntax(&self, message: impl Into<String>) -> crate::error::CspError {
    err(ErrorKind::Syntax, &self.source, self.current.span, message)
  }

  fn err_syntax_at(&self, span: Span, message: impl Into<String>) -> crate::error::CspError {
    err(ErrorKind::Syntax, &self.source, span, message)
  }

  fn err_type(&self, span: Span, message: impl Into<String>) -> crate::error::CspError {
    err(ErrorKind::Type, &self.source, span, message)
  }

  fn err_undefined(&self, span: Span, message: impl Into<String>) -> crate::error::CspError {
    err(ErrorKind::Undefined, &self.source, span, message)
  }

  // --- identifiers ---

  /// `[::]ident(::ident)*` (spec.md §3: "optional outer identifier
  /// (namespace chain), a `global_scope` flag (leading `::`)").
  fn parse_identifier(&mut self) -> Result<Identifier> {
    let global_scope = self.eat(&TokenKind::ColonColon);
    let first = self.expect_id()?;
    let mut id = Identifier::new(first);
    if global_scope { id = id.global(); }
    while self.check(&TokenKind::ColonColon) {
      self.bump();
      let next = self.expect_id()?;
      let outer = std::mem::replace(&mut id, Identifier::new(next));
      id = id.with_outer(outer);
    }
    Ok(id)
  }

  // --- top level (spec.md §4.1.1) ---

  pub fn parse_program(mut self) -> Result<(Program, crate::error::Diagnostics)> {
    while !self.current.is_eof() {
      self.parse_top_level_item()?;
    }
    Ok((self.program, self.diags))
  }

  fn parse_top_level_item(&mut self) -> Result<()> {
    match &self.current.kind {
      TokenKind::Kw(Keyword::Import) => self.parse_import(),
      TokenKind::Kw(Keyword::Type) => { self.parse_typedef()?; Ok(()) }
      TokenKind::Kw(Keyword::Let) | TokenKind::Kw(Keyword::Const) => { self.parse_global()?; Ok(()) }
      TokenKind::Kw(Keyword::Fn) => { self.parse_function()?; Ok(()) }
      TokenKind::Kw(Keyword::Extern) => self.parse_extern_block(),
      TokenKind::Kw(Keyword::Namespace) => self.parse_namespace(),
      TokenKind::LBracket => self.parse_directive(),
      other => Err(self.err_syntax(format!("unexpected top-level token {other:?}"))),
    }
  }

  fn parse_import(&mut self) -> Result<()> {
    self.bump();
    let path = self.expect(TokenKind::StrLit)?;
    self.expect(TokenKind::Semicolon)?;
    self.program.imports.push(path.value.to_string());
    Ok(())
  }

  fn parse_typedef(&mut self) -> Result<ObjId> {
    let span = self.current.span;
    self.bump();
    let name = self.expect_id()?;
    self.expect(TokenKind::Colon)?;
    let ty = self.parse_type()?;
    self.expect(TokenKind::Semicolon)?;
    let obj = Object::new(ObjKind::Typedef, Identifier::new(name), ty, span);
    let id = self.program.alloc_object(obj);
    self.program.root.push(id);
    Ok(id)
  }

  fn parse_global(&mut self) -> Result<ObjId> {
    let span = self.current.span;
    let is_const = self.check_kw(Keyword::Const);
    self.bump();
    let name = self.expect_id()?;
    self.expect(TokenKind::Colon)?;
    let ty = self.parse_type()?;
    let mut obj = Object::new(ObjKind::Global, Identifier::new(name), ty, span);
    if is_const { obj.flags |= ObjFlags::CONSTANT; }
    if self.eat(&TokenKind::Assign) {
      obj.body = Some(self.parse_expr(Precedence::None, TokenKind::Semicolon)?);
    }
    self.expect(TokenKind::Semicolon)?;
    let id = self.program.alloc_object(obj);
    self.program.root.push(id);
    Ok(id)
  }

  fn parse_function(&mut self) -> Result<ObjId> {
    let span = self.current.span;
    self.bump();
    let name = self.expect_id()?;
    self.expect(TokenKind::LParen)?;
    let mut args = Vec::new();
    let mut arg_types = Vec::new();
    let mut is_variadic = false;
    while !self.check(&TokenKind::RParen) {
      if self.check(&TokenKind::Dot) {
        // `...` variadic marker, lexed as three `Dot` tokens.
        self.bump(); self.bump(); self.bump();
        is_variadic = true;
        break;
      }
      let arg_span = self.current.span;
      let arg_name = self.expect_id()?;
      self.expect(TokenKind::Colon)?;
      let arg_ty = self.parse_type()?;
      arg_types.push(arg_ty);
      let arg_obj = Object::new(ObjKind::FunctionArg, Identifier::new(arg_name), arg_ty, arg_span);
      args.push(self.program.alloc_object(arg_obj));
      if !self.eat(&TokenKind::Comma) { break; }
    }
    self.expect(TokenKind::RParen)?;
    let ret_ty = if self.eat(&TokenKind::Colon) { self.parse_type()? } else {
      self.program.alloc_type(Type::primitive(Primitive::Void, span))
    };
    let fn_ty = self.program.alloc_type(Type {
      kind: TypeKind::Function { base: ret_ty, arg_types, is_variadic },
      is_constant: false, span, size: Some(8), align: Some(8), semantic_id: None,
    });
    let mut obj = Object::new(ObjKind::Function, Identifier::new(name), fn_ty, span);
    obj.args = args;
    let is_main = name.to_string() == "main" && !self.in_extern;
    if is_main {
      self.program.main_function_kind = Some(self.classify_main_kind(&obj));
    }
    if self.check(&TokenKind::LBrace) {
      let mut locals = Vec::new();
      obj.body = Some(self.parse_block(&mut locals)?);
    } else {
      self.expect(TokenKind::Semicolon)?;
      obj.flags |= ObjFlags::EXTERN;
    }
    let id = self.program.alloc_object(obj);
    self.program.root.push(id);
    Ok(id)
  }

  /// Selects the `_start` stub variant from the `main` signature
  /// (spec.md §3 `Program.main_function_kind`, §4.4 item 7): zero args,
  /// `(argc, argv)`, a single `argv`-shaped pointer, or a single
  /// Source-native `args: str[]` sized array.
  fn classify_main_kind(&self, obj: &Object) -> MainFunctionKind {
    match obj.args.len() {
      0 => MainFunctionKind::NoArgs,
      2 => MainFunctionKind::ArgcArgvPtr,
      1 => {
        let arg_ty = self.program.objects[obj.args[0]].ty;
        match self.program.types[arg_ty].kind {
          TypeKind::SizedArray { .. } => MainFunctionKind::ArgsArray,
          _ => MainFunctionKind::ArgvPtr,
        }
      }
      _ => MainFunctionKind::ArgvPtr,
    }
  }

  fn parse_extern_block(&mut self) -> Result<()> {
    self.bump();
    self.expect(TokenKind::LBrace)?;
    let was_extern = self.in_extern;
    self.in_extern = true;
    while !self.check(&TokenKind::RBrace) {
      match &self.current.kind {
        TokenKind::Kw(Keyword::Fn) => { self.parse_function()?; }
        TokenKind::Kw(Keyword::Let) | TokenKind::Kw(Keyword::Const) => { self.parse_global()?; }
        other => return Err(self.err_syntax(format!("unexpected token in extern block: {other:?}"))),
      }
    }
    self.in_extern = was_extern;
    self.expect(TokenKind::RBrace)?;
    Ok(())
  }

  fn parse_namespace(&mut self) -> Result<()> {
    let span = self.current.span;
    self.bump();
    let name = self.expect_id()?;
    // Namespace objects carry no real type; give them a `void` placeholder
    // so `Object::ty` is never a dangling handle.
    let void_ty = self.program.alloc_type(Type::primitive(Primitive::Void, span));
    let ns_obj = Object::new(ObjKind::Namespace, Identifier::new(name).namespace(), void_ty, span);
    let ns_id = self.program.alloc_object(ns_obj);
    self.program.root.push(ns_id);
    self.expect(TokenKind::LBrace)?;
    while !self.check(&TokenKind::RBrace) {
      self.parse_top_level_item()?;
    }
    self.expect(TokenKind::RBrace)?;
    Ok(())
  }

  fn parse_directive(&mut self) -> Result<()> {
    directives::parse_and_eval(self)
  }

  // --- statements (spec.md §4.1.4) ---

  /// Parses a `{ ... }` block, collecting its direct locals (spec.md
  /// §4.1.4: "Locals are collected into the nearest enclosing block via a
  /// parser-maintained pointer to the current block").
  fn parse_block(&mut self, _outer_locals: &mut Vec<ObjId>) -> Result<NodeId> {
    let span = self.current.span;
    self.expect(TokenKind::LBrace)?;
    let mut locals = Vec::new();
    let mut stmts = Vec::new();
    while !self.check(&TokenKind::RBrace) {
      stmts.push(self.parse_stmt(&mut locals)?);
    }
    self.expect(TokenKind::RBrace)?;
    Ok(self.program.alloc_node(Node::new(NodeKind::Block { stmts, locals }, span)))
  }

  fn parse_stmt(&mut self, locals: &mut Vec<ObjId>) -> Result<NodeId> {
    let span = self.current.span;
    match &self.current.kind {
      TokenKind::LBrace => self.parse_block(locals),
      TokenKind::Kw(Keyword::Return) => self.parse_return(),
      TokenKind::Kw(Keyword::If) => self.parse_if_stmt(),
      TokenKind::Kw(Keyword::Loop) => self.parse_loop(),
      TokenKind::Kw(Keyword::While) => self.parse_while(),
      TokenKind::Kw(Keyword::For) => self.parse_for(),
      TokenKind::Kw(Keyword::Match) => self.parse_match(),
      TokenKind::Kw(Keyword::With) => self.parse_with(),
      TokenKind::Kw(Keyword::Let) | TokenKind::Kw(Keyword::Const) => {
        let obj = self.parse_local(locals)?;
        Ok(self.program.alloc_node(Node::new(NodeKind::LocalDecl(obj), span)))
      }
      TokenKind::Kw(Keyword::Break) => {
        self.bump(); self.expect(TokenKind::Semicolon)?;
        Ok(self.program.alloc_node(Node::new(NodeKind::Break, span)))
      }
      TokenKind::Kw(Keyword::Continue) => {
        self.bump(); self.expect(TokenKind::Semicolon)?;
        Ok(self.program.alloc_node(Node::new(NodeKind::Continue, span)))
      }
      TokenKind::Kw(Keyword::Noop) => {
        self.bump(); self.expect(TokenKind::Semicolon)?;
        Ok(self.program.alloc_node(Node::new(NodeKind::Noop, span)))
      }
      _ => {
        let expr = self.parse_expr(Precedence::None, TokenKind::Semicolon)?;
        self.expect(TokenKind::Semicolon)?;
        // "allowed only when the expression is executable" (spec.md
        // §4.1.4); checked fully once types are known, but a node that is
        // never executable regardless of its operand types is rejected
        // here already.
        if !self.program.nodes[expr].is_executable(&self.program.nodes) {
          self.diags.warn_syntax(&self.source, span, "expression statement has no effect");
        }
        Ok(self.program.alloc_node(Node::new(NodeKind::ExprStmt(expr), span)))
      }
    }
  }

  fn parse_local(&mut self, locals: &mut Vec<ObjId>) -> Result<ObjId> {
    let span = self.current.span;
    let is_const = self.check_kw(Keyword::Const);
    self.bump();
    let name = self.expect_id()?;
    let ty = if self.eat(&TokenKind::Colon) {
      self.parse_type()?
    } else {
      self.program.alloc_type(Type {
        kind: TypeKind::Named { id: Identifier::new(intern("__infer")), referenced_obj: Default::default() },
        is_constant: false, span, size: None, align: None, semantic_id: None,
      })
    };
    let mut obj = Object::new(ObjKind::Local, Identifier::new(name), ty, span);
    if is_const { obj.flags |= ObjFlags::CONSTANT; }
    if self.eat(&TokenKind::Assign) {
      obj.body = Some(self.parse_expr(Precedence::None, TokenKind::Semicolon)?);
    }
    self.expect(TokenKind::Semicolon)?;
    let id = self.program.alloc_object(obj);
    locals.push(id);
    Ok(id)
  }

  fn parse_return(&mut self) -> Result<NodeId> {
    let span = self.current.span;
    self.bump();
    let value = if self.check(&TokenKind::Semicolon) {
      None
    } else {
      Some(self.parse_expr(Precedence::None, TokenKind::Semicolon)?)
    };
    self.expect(TokenKind::Semicolon)?;
    Ok(self.program.alloc_node(Node::new(NodeKind::Return(value), span)))
  }

  fn parse_if_stmt(&mut self) -> Result<NodeId> {
    let span = self.current.span;
    self.bump();
    let cond = self.parse_expr(Precedence::None, TokenKind::LBrace)?;
    let mut outer = Vec::new();
    let if_branch = self.parse_block(&mut outer)?;
    let else_branch = if self.eat(&TokenKind::Kw(Keyword::Else)) {
      if self.check_kw(Keyword::If) {
        Some(self.parse_if_stmt()?)
      } else {
        Some(self.parse_block(&mut outer)?)
      }
    } else {
      None
    };
    Ok(self.program.alloc_node(Node::new(NodeKind::If { cond, if_branch, else_branch }, span)))
  }

  fn parse_loop(&mut self) -> Result<NodeId> {
    let span = self.current.span;
    self.bump();
    let mut outer = Vec::new();
    let body = self.parse_block(&mut outer)?;
    Ok(self.program.alloc_node(Node::new(NodeKind::Loop { body }, span)))
  }

  fn parse_while(&mut self) -> Result<NodeId> {
    let span = self.current.span;
    self.bump();
    let cond = self.parse_expr(Precedence::None, TokenKind::LBrace)?;
    let mut outer = Vec::new();
    let body = self.parse_block(&mut outer)?;
    Ok(self.program.alloc_node(Node::new(NodeKind::While { cond, body }, span)))
  }

  /// C-style tripartite `for`, or `for name in lo..hi { }` (desugared to
  /// [`NodeKind::ForRange`], spec.md §4.4.4). `for` opens a scope whose
  /// first entry is the initializer's local (spec.md §4.1.4).
  ///
  /// Disambiguated with one token of lookahead: `for <ident> in ...` is
  /// the range form iff the token after the identifier is the bare word
  /// `in` (not a keyword in this grammar, matched by text like `_` in
  /// `match`). Otherwise we fall through to the tripartite `for (...)`.
  fn parse_for(&mut self) -> Result<NodeId> {
    let span = self.current.span;
    self.bump();
    if matches!(self.current.kind, TokenKind::Id) && self.stream.peek_token().value.as_ref() == "in" {
      return self.parse_for_range(span);
    }
    let mut scope = Vec::new();
    self.expect(TokenKind::LParen)?;
    let init = if self.check(&TokenKind::Semicolon) { None } else {
      Some(self.parse_local(&mut scope)?)
    };
    if init.is_none() { self.expect(TokenKind::Semicolon)?; }
    let cond = if self.check(&TokenKind::Semicolon) { None } else {
      Some(self.parse_expr(Precedence::None, TokenKind::Semicolon)?)
    };
    self.expect(TokenKind::Semicolon)?;
    let step = if self.check(&TokenKind::RParen) { None } else {
      Some(self.parse_expr(Precedence::None, TokenKind::RParen)?)
    };
    self.expect(TokenKind::RParen)?;
    let body = self.parse_block(&mut scope)?;
    let init = init.map(|obj| self.program.alloc_node(Node::new(NodeKind::LocalDecl(obj), span)));
    Ok(self.program.alloc_node(Node::new(NodeKind::For { init, cond, step, body }, span)))
  }

  fn parse_for_range(&mut self, span: Span) -> Result<NodeId> {
    let name = self.expect_id()?;
    self.bump(); // the bare `in` word
    // Stop lo/hi sub-expressions at the `..` separator. Using `.` as the
    // end token is a deliberate simplification (DESIGN.md): `lo`/`hi` in a
    // range-`for` are not expected to themselves contain a member access.
    let lo = self.parse_expr(Precedence::None, TokenKind::Dot)?;
    self.expect(TokenKind::Dot)?;
    self.expect(TokenKind::Dot)?;
    let hi = self.parse_expr(Precedence::None, TokenKind::LBrace)?;
    let ty = self.program.alloc_type(Type {
      kind: TypeKind::Named { id: Identifier::new(intern("__infer")), referenced_obj: Default::default() },
      is_constant: false, span, size: None, align: None, semantic_id: None,
    });
    let var = self.program.alloc_object(Object::new(ObjKind::Local, Identifier::new(name), ty, span));
    let mut scope = Vec::new();
    let body = self.parse_block(&mut scope)?;
    Ok(self.program.alloc_node(Node::new(NodeKind::ForRange { var, lo, hi, body }, span)))
  }

  /// `match expr { ... }` or `match (type) { T => ... _ => ... }`
  /// (spec.md §4.1.4); a duplicate `_ =>` default case is
  /// `ErrRedefinition`.
  fn parse_match(&mut self) -> Result<NodeId> {
    let span = self.current.span;
    self.bump();
    self.expect(TokenKind::LParen)?;
    let is_type_match = self.check_kw(Keyword::TypeOf) || self.check_id_text("type");
    if is_type_match { self.bump(); }
    let subject = if is_type_match {
      let ty = self.parse_type()?;
      self.program.alloc_node(Node::new(NodeKind::TypeTag(ty), span))
    } else {
      self.parse_expr(Precedence::None, TokenKind::RParen)?
    };
    self.expect(TokenKind::RParen)?;
    self.expect(TokenKind::LBrace)?;
    let mut cases = Vec::new();
    let mut seen_default = false;
    while !self.check(&TokenKind::RBrace) {
      let case_span = self.current.span;
      let pattern = if self.eat(&TokenKind::Kw(Keyword::TypeOf)) {
        None
      } else if matches!(self.current.kind, TokenKind::Id) && self.current.value.as_ref() == "_" {
        self.bump();
        if seen_default {
          return Err(err(ErrorKind::Redefinition, &self.source, case_span, "duplicate default case `_`"));
        }
        seen_default = true;
        None
      } else if is_type_match {
        Some(self.program.alloc_node(Node::new(NodeKind::TypeTag(self.parse_type()?), case_span)))
      } else {
        Some(self.parse_expr(Precedence::None, TokenKind::FatArrow)?)
      };
      self.expect(TokenKind::FatArrow)?;
      let mut scope = Vec::new();
      let body = if self.check(&TokenKind::LBrace) {
        self.parse_block(&mut scope)?
      } else {
        self.parse_stmt(&mut scope)?
      };
      cases.push(crate::types::ast::MatchCase { pattern, body });
    }
    self.expect(TokenKind::RBrace)?;
    Ok(self.program.alloc_node(Node::new(NodeKind::Match { subject, cases, is_type_match }, span)))
  }

  fn check_id_text(&self, s: &str) -> bool {
    matches!(self.current.kind, TokenKind::Id) && &*self.current.value == s
  }

  /// `with var [:T] = init body [else body]` (spec.md §4.1.4); registers
  /// one local owned by the statement.
  fn parse_with(&mut self) -> Result<NodeId> {
    let span = self.current.span;
    self.bump();
    let name = self.expect_id()?;
    let ty = if self.eat(&TokenKind::Colon) {
      self.parse_type()?
    } else {
      self.program.alloc_type(Type {
        kind: TypeKind::Named { id: Identifier::new(intern("__infer")), referenced_obj: Default::default() },
        is_constant: false, span, size: None, align: None, semantic_id: None,
      })
    };
    self.expect(TokenKind::Assign)?;
    let init = self.parse_expr(Precedence::None, TokenKind::LBrace)?;
    let mut obj = Object::new(ObjKind::Local, Identifier::new(name), ty, span);
    obj.body = Some(init);
    let var = self.program.alloc_object(obj);
    let mut scope = Vec::new();
    let body = self.parse_block(&mut scope)?;
    let else_body = if self.eat(&TokenKind::Kw(Keyword::Else)) {
      let mut scope2 = Vec::new();
      Some(self.parse_block(&mut scope2)?)
    } else {
      None
    };
    Ok(self.program.alloc_node(Node::new(NodeKind::With { var, init, body, else_body }, span)))
  }
}

#[cfg(test)]
mod tests;
