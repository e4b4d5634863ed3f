//! The token stream interface (`SPEC_FULL.md` §6 collaborator: "Token
//! stream"). The lexer that produces these tokens is explicitly out of
//! scope (spec.md §1); this module only fixes the shape every downstream
//! consumer (parser, diagnostics) agrees on.

use std::rc::Rc;
use crate::symbol::Symbol;

/// A source file, kept only for error messages (spec.md §6: "Source
/// files: `{path, short_path, content}`; used only for error messages").
#[derive(Debug, Clone)]
pub struct SourceFile {
  pub path: Rc<str>,
  pub short_path: Rc<str>,
  pub content: Rc<str>,
}

/// A position within a [`SourceFile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
  pub line: u32,
  pub col: u32,
}

/// The fixed set of lexical categories the parser dispatches on. The
/// *lexer* producing these is out of scope; this enumeration is the
/// contract between it and the parser (spec.md §6's `TokenStream`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum TokenKind {
  Id, IntLit, FloatLit, CharLit, StrLit, BoolLit,
  Plus, Minus, Star, Slash, Percent, Pow2, Pow3,
  Inc, Dec,
  Assign, PlusAssign, MinusAssign, StarAssign, SlashAssign,
  Eq, Ne, Lt, Gt, Le, Ge,
  LogicAnd, LogicOr, LogicNot,
  BitAnd, BitOr, BitXor, BitNot, Shl, Shr,
  Pipe, Dollar, Backtick,
  LParen, RParen, LBrace, RBrace, LBracket, RBracket,
  Colon, ColonColon, Semicolon, Comma, Dot, Arrow, FatArrow,
  At,
  Kw(Keyword),
  Eof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum Keyword {
  Import, Type, Let, Const, Fn, Extern, Namespace,
  Return, If, Else, Loop, While, For, Match, With,
  Break, Continue, Noop, Asm,
  SizeOf, AlignOf, TypeOf, Len, VaArg,
  Nil, True, False,
  Struct, Union, Enum,
  RegClass, IsInt, IsUint, IsFloat, IsPointer, IsArray, IsStruct, IsUnion, ToStr,
}

/// A single lexical token (spec.md §6: `{type, value: string, line, col,
/// source}` with a terminal EOF token).
#[derive(Debug, Clone)]
pub struct Token {
  pub kind: TokenKind,
  pub value: Rc<str>,
  pub span: Span,
  pub source: Rc<SourceFile>,
}

impl Token {
  #[must_use] pub fn is_eof(&self) -> bool { matches!(self.kind, TokenKind::Eof) }

  /// Intern the token's textual value, for use as an [`Symbol`]-keyed
  /// identifier.
  #[must_use] pub fn intern_value(&self) -> Symbol { crate::symbol::intern(&self.value) }
}

/// The out-of-scope token source: an iterator of [`Token`]s terminated by
/// an EOF sentinel (spec.md §6). Implementations wrap a real lexer; tests
/// use [`crate::testutil::VecTokenStream`].
pub trait TokenStream {
  fn next_token(&mut self) -> Token;
  fn peek_token(&mut self) -> &Token;
}
