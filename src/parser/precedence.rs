//! Pratt precedence levels (spec.md §4.1.2), lowest to highest:
//! `ASSIGN < PIPE < LOGIC_OR < LOGIC_AND < INFIX_CALL < BIT_OR < BIT_XOR <
//! BIT_AND < EQUALS < LT==GT < BIT_SHIFT < PLUS==MINUS < MULT==DIV < MOD <
//! POWER < INC==DEC < X_OF < CAST < CALL < ARRAY < MEMBER`.
//!
//! spec.md §9 DESIGN NOTES / Open Questions: "The precedence table
//! contains aliases (`GT=LT`, `MINUS=PLUS`, `DIV=MULT`, `DEC=INC`) —
//! preserve this exactly; implementers must not 'tidy' by separating
//! them, because the parser compares with `<` not `<=`." A fieldless
//! `#[repr(u8)]` enum cannot give two variants the same explicit
//! discriminant (rustc rejects it as a duplicate-discriminant error), so
//! each operator keeps its own variant with a distinct discriminant and
//! the aliasing lives in [`Precedence::level`] instead, which maps each
//! paired variant down to the same comparison value; every comparison in
//! the parser goes through `level()` and uses `<`/`>`, never `<=`/`>=`.

use crate::token::{Keyword, TokenKind};

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precedence {
  None = 0,
  Assign = 1,
  Pipe = 2,
  LogicOr = 3,
  LogicAnd = 4,
  InfixCall = 5,
  BitOr = 6,
  BitXor = 7,
  BitAnd = 8,
  Equals = 9,
  Lt = 10,
  Gt = 11,
  BitShift = 12,
  Plus = 13,
  Minus = 14,
  Mult = 15,
  Div = 16,
  Mod = 17,
  Power = 18,
  Inc = 19,
  Dec = 20,
  XOf = 21,
  Cast = 22,
  Call = 23,
  Array = 24,
  Member = 25,
}

impl Precedence {
  /// Collapses the spec's aliased pairs (`GT=LT`, `MINUS=PLUS`,
  /// `DIV=MULT`, `DEC=INC`) onto a single comparison value each, so two
  /// operators the spec says must compare equal do, even though they
  /// can't share a discriminant.
  #[must_use] pub fn level(self) -> u8 {
    match self {
      Precedence::Gt => Precedence::Lt as u8,
      Precedence::Minus => Precedence::Plus as u8,
      Precedence::Div => Precedence::Mult as u8,
      Precedence::Dec => Precedence::Inc as u8,
      other => other as u8,
    }
  }
}

/// The precedence of `tok` when it appears in infix/postfix position, or
/// `Precedence::None` if `tok` never acts as an infix operator. This is
/// the table `parse_expr`'s loop condition (`its precedence strictly
/// exceeds min_prec`) reads.
#[must_use]
pub fn infix_precedence(tok: &TokenKind) -> Precedence {
  match tok {
    TokenKind::Assign | TokenKind::PlusAssign | TokenKind::MinusAssign
      | TokenKind::StarAssign | TokenKind::SlashAssign => Precedence::Assign,
    TokenKind::Pipe => Precedence::Pipe,
    TokenKind::LogicOr => Precedence::LogicOr,
    TokenKind::LogicAnd => Precedence::LogicAnd,
    TokenKind::Backtick => Precedence::InfixCall,
    TokenKind::BitOr => Precedence::BitOr,
    TokenKind::BitXor => Precedence::BitXor,
    TokenKind::BitAnd => Precedence::BitAnd,
    TokenKind::Eq | TokenKind::Ne => Precedence::Equals,
    TokenKind::Lt => Precedence::Lt,
    TokenKind::Gt => Precedence::Gt,
    TokenKind::Le => Precedence::Lt,
    TokenKind::Ge => Precedence::Gt,
    TokenKind::Shl | TokenKind::Shr => Precedence::BitShift,
    TokenKind::Plus => Precedence::Plus,
    TokenKind::Minus => Precedence::Minus,
    TokenKind::Star => Precedence::Mult,
    TokenKind::Slash => Precedence::Div,
    TokenKind::Percent => Precedence::Mod,
    TokenKind::Pow2 | TokenKind::Pow3 => Precedence::Power,
    TokenKind::Inc => Precedence::Inc,
    TokenKind::Dec => Precedence::Dec,
    TokenKind::Kw(Keyword::SizeOf | Keyword::AlignOf | Keyword::TypeOf | Keyword::Len) => Precedence::XOf,
    TokenKind::Colon => Precedence::Cast,
    TokenKind::LParen => Precedence::Call,
    TokenKind::LBracket => Precedence::Array,
    TokenKind::Dot => Precedence::Member,
    _ => Precedence::None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn aliased_precedences_compare_equal() {
    assert_eq!(Precedence::Lt.level(), Precedence::Gt.level());
    assert_eq!(Precedence::Minus.level(), Precedence::Plus.level());
    assert_eq!(Precedence::Div.level(), Precedence::Mult.level());
    assert_eq!(Precedence::Dec.level(), Precedence::Inc.level());
  }

  #[test]
  fn member_binds_tighter_than_call_binds_tighter_than_cast() {
    assert!(Precedence::Member.level() > Precedence::Array.level());
    assert!(Precedence::Array.level() > Precedence::Call.level());
    assert!(Precedence::Call.level() > Precedence::Cast.level());
  }

  #[test]
  fn assign_is_the_loosest_binding_operator() {
    assert!(Precedence::Assign.level() < Precedence::Pipe.level());
  }
}
