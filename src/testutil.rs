//! A minimal hand-rolled lexer used only to build [`Token`] fixtures for
//! tests. The real lexer is explicitly out of scope (spec.md §1) and is
//! modeled only as the [`crate::token::TokenStream`] trait the parser
//! consumes; this module exists purely so unit and integration tests can
//! drive the parser from Source-language text instead of hand-built
//! token vectors.

use std::rc::Rc;
use crate::token::{Keyword, SourceFile, Span, Token, TokenKind, TokenStream};

/// A fixed, pre-lexed [`TokenStream`] that replays a `Vec<Token>` and
/// then an endless stream of EOF sentinels (spec.md §6: "an iterator of
/// tokens... with a terminal EOF token").
pub struct VecTokenStream {
  tokens: Vec<Token>,
  pos: usize,
  eof: Token,
}

impl VecTokenStream {
  #[must_use] pub fn new(tokens: Vec<Token>, eof: Token) -> Self {
    VecTokenStream { tokens, pos: 0, eof }
  }
}

impl TokenStream for VecTokenStream {
  fn next_token(&mut self) -> Token {
    let tok = self.tokens.get(self.pos).cloned().unwrap_or_else(|| self.eof.clone());
    if self.pos < self.tokens.len() { self.pos += 1; }
    tok
  }
  fn peek_token(&mut self) -> &Token {
    self.tokens.get(self.pos).unwrap_or(&self.eof)
  }
}

fn keyword_of(text: &str) -> Option<Keyword> {
  Some(match text {
    "import" => Keyword::Import, "type" => Keyword::Type, "let" => Keyword::Let,
    "const" => Keyword::Const, "fn" => Keyword::Fn, "extern" => Keyword::Extern,
    "namespace" => Keyword::Namespace, "return" | "ret" => Keyword::Return, "if" => Keyword::If,
    "else" => Keyword::Else, "loop" => Keyword::Loop, "while" => Keyword::While, "for" => Keyword::For,
    "match" => Keyword::Match, "with" => Keyword::With, "break" => Keyword::Break,
    "continue" => Keyword::Continue, "noop" => Keyword::Noop, "asm" => Keyword::Asm,
    "sizeof" => Keyword::SizeOf, "alignof" => Keyword::AlignOf, "typeof" => Keyword::TypeOf,
    "len" => Keyword::Len, "va_arg" => Keyword::VaArg, "nil" => Keyword::Nil,
    "true" => Keyword::True, "false" => Keyword::False,
    "struct" => Keyword::Struct, "union" => Keyword::Union, "enum" => Keyword::Enum,
    "__reg_class" => Keyword::RegClass, "__is_int" => Keyword::IsInt, "__is_uint" => Keyword::IsUint,
    "__is_float" => Keyword::IsFloat, "__is_pointer" => Keyword::IsPointer,
    "__is_array" => Keyword::IsArray, "__is_struct" => Keyword::IsStruct,
    "__is_union" => Keyword::IsUnion, "__to_str" => Keyword::ToStr,
    _ => return None,
  })
}

/// Tokenize `src` into a [`VecTokenStream`], under a synthetic
/// [`SourceFile`] named `name`. Panics on malformed input — fine for
/// test fixtures, never used by the real driver.
#[must_use]
pub fn lex(name: &str, src: &str) -> VecTokenStream {
  let source = Rc::new(SourceFile {
    path: Rc::from(name), short_path: Rc::from(name), content: Rc::from(src),
  });
  let mut tokens = Vec::new();
  let chars: Vec<char> = src.chars().collect();
  let mut i = 0usize;
  let mut line = 1u32;
  let mut col = 1u32;

  macro_rules! push {
    ($kind:expr, $value:expr, $span:expr) => {
      tokens.push(Token { kind: $kind, value: Rc::from($value), span: $span, source: source.clone() })
    };
  }

  while i < chars.len() {
    let c = chars[i];
    if c == '\n' { i += 1; line += 1; col = 1; continue; }
    if c.is_whitespace() { i += 1; col += 1; continue; }
    if c == '/' && chars.get(i + 1) == Some(&'/') {
      while i < chars.len() && chars[i] != '\n' { i += 1; }
      continue;
    }
    let span = Span { line, col };

    if c.is_ascii_digit() {
      let start = i;
      let mut is_float = false;
      while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.' && !is_float
        && chars.get(i + 1).is_some_and(char::is_ascii_digit)) {
        if chars[i] == '.' { is_float = true; }
        i += 1;
      }
      while i < chars.len() && chars[i].is_alphabetic() { i += 1; } // suffixes: u/l/f
      let text: String = chars[start..i].iter().collect();
      col += (i - start) as u32;
      if is_float { push!(TokenKind::FloatLit, text, span); } else { push!(TokenKind::IntLit, text, span); }
      continue;
    }
    if c.is_ascii_alphabetic() || c == '_' {
      let start = i;
      while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') { i += 1; }
      let text: String = chars[start..i].iter().collect();
      col += (i - start) as u32;
      match keyword_of(&text) {
        Some(kw) => push!(TokenKind::Kw(kw), text, span),
        None => push!(TokenKind::Id, text, span),
      }
      continue;
    }
    if c == '"' {
      let start = i + 1;
      i += 1;
      while i < chars.len() && chars[i] != '"' { i += 1; }
      let text: String = chars[start..i].iter().collect();
      col += (i - start + 2) as u32;
      i += 1;
      push!(TokenKind::StrLit, text, span);
      continue;
    }
    if c == '\'' {
      let start = i + 1;
      i += 1;
      while i < chars.len() && chars[i] != '\'' { i += 1; }
      let text: String = chars[start..i].iter().collect();
      col += (i - start + 2) as u32;
      i += 1;
      push!(TokenKind::CharLit, text, span);
      continue;
    }

    macro_rules! two {
      ($a:expr, $b:expr, $kind:expr) => {
        if chars.get(i + 1) == Some(&$b) {
          push!($kind, format!("{}{}", $a, $b), span);
          i += 2; col += 2;
          continue;
        }
      };
    }

    match c {
      '+' => { two!('+', '+', TokenKind::Inc); two!('+', '=', TokenKind::PlusAssign); push!(TokenKind::Plus, "+", span); }
      '-' => {
        two!('-', '-', TokenKind::Dec);
        two!('-', '=', TokenKind::MinusAssign);
        two!('-', '>', TokenKind::Arrow);
        push!(TokenKind::Minus, "-", span);
      }
      '*' => { two!('*', '=', TokenKind::StarAssign); push!(TokenKind::Star, "*", span); }
      '/' => { two!('/', '=', TokenKind::SlashAssign); push!(TokenKind::Slash, "/", span); }
      '%' => push!(TokenKind::Percent, "%", span),
      '\u{00B2}' => push!(TokenKind::Pow2, "\u{00B2}", span),
      '\u{00B3}' => push!(TokenKind::Pow3, "\u{00B3}", span),
      '=' => {
        two!('=', '=', TokenKind::Eq);
        two!('=', '>', TokenKind::FatArrow);
        push!(TokenKind::Assign, "=", span);
      }
      '!' => { two!('!', '=', TokenKind::Ne); push!(TokenKind::LogicNot, "!", span); }
      '<' => { two!('<', '=', TokenKind::Le); two!('<', '<', TokenKind::Shl); push!(TokenKind::Lt, "<", span); }
      '>' => { two!('>', '=', TokenKind::Ge); two!('>', '>', TokenKind::Shr); push!(TokenKind::Gt, ">", span); }
      '&' => { two!('&', '&', TokenKind::LogicAnd); push!(TokenKind::BitAnd, "&", span); }
      '|' => {
        two!('|', '|', TokenKind::LogicOr);
        two!('|', '>', TokenKind::Pipe);
        push!(TokenKind::BitOr, "|", span);
      }
      '^' => push!(TokenKind::BitXor, "^", span),
      '~' => push!(TokenKind::BitNot, "~", span),
      '$' => push!(TokenKind::Dollar, "$", span),
      '`' => push!(TokenKind::Backtick, "`", span),
      '(' => push!(TokenKind::LParen, "(", span),
      ')' => push!(TokenKind::RParen, ")", span),
      '{' => push!(TokenKind::LBrace, "{", span),
      '}' => push!(TokenKind::RBrace, "}", span),
      '[' => push!(TokenKind::LBracket, "[", span),
      ']' => push!(TokenKind::RBracket, "]", span),
      ':' => { two!(':', ':', TokenKind::ColonColon); push!(TokenKind::Colon, ":", span); }
      ';' => push!(TokenKind::Semicolon, ";", span),
      ',' => push!(TokenKind::Comma, ",", span),
      '.' => push!(TokenKind::Dot, ".", span),
      '@' => push!(TokenKind::At, "@", span),
      other => panic!("testutil lexer: unexpected character {other:?} at {name}:{line}:{col}"),
    }
    i += 1;
    col += 1;
  }

  let eof_span = Span { line, col };
  let eof = Token { kind: TokenKind::Eof, value: Rc::from(""), span: eof_span, source };
  VecTokenStream::new(tokens, eof)
}

/// Convenience: returns the stream's [`SourceFile`], for tests that need
/// to construct a [`crate::error::CspError`] display assertion.
#[must_use]
pub fn lex_source(name: &str, src: &str) -> Rc<SourceFile> {
  Rc::new(SourceFile { path: Rc::from(name), short_path: Rc::from(name), content: Rc::from(src) })
}
