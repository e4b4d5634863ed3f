//! The `Object` declaration model (spec.md §3): "A declaration: function,
//! function-argument, local variable, global, typedef, enum-member,
//! namespace."

use bitflags::bitflags;
use crate::token::Span;
use crate::types::{NodeId, ObjId, TypeId};
use crate::types::ident::Identifier;

bitflags! {
  /// Per-object flags (spec.md §3: `is_extern`, `is_constant`,
  /// `no_return`, `ignore_unused`, `generated`).
  #[derive(Debug, Clone, Copy, PartialEq, Eq)]
  pub struct ObjFlags: u8 {
    const EXTERN        = 1 << 0;
    const CONSTANT       = 1 << 1;
    const NO_RETURN       = 1 << 2;
    const IGNORE_UNUSED    = 1 << 3;
    /// Set by the emitter once a typedef has been written out, so
    /// dependency pre-declaration (spec.md §4.4 item 2) never emits the
    /// same typedef twice.
    const GENERATED        = 1 << 4;
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjKind {
  Function,
  FunctionArg,
  Local,
  Global,
  Typedef,
  EnumMember,
  Namespace,
}

#[derive(Debug, Clone)]
pub struct Object {
  pub kind: ObjKind,
  pub id: Identifier,
  pub ty: TypeId,
  pub span: Span,
  pub flags: ObjFlags,
  /// Function body (a `Block`), or a global/local initializer expression.
  pub body: Option<NodeId>,
  /// Function parameters, in source order (empty for non-functions).
  pub args: Vec<ObjId>,
  /// For `EnumMember`: the owning enum's member index, used by the
  /// emitter to pick the plain-`int` value (spec.md §4.4 item 4, and the
  /// Open Question that this "leaks identifiers... kept verbatim").
  pub enum_member_index: Option<u32>,
}

impl Object {
  #[must_use] pub fn new(kind: ObjKind, id: Identifier, ty: TypeId, span: Span) -> Self {
    Object {
      kind, id, ty, span, flags: ObjFlags::empty(), body: None, args: Vec::new(),
      enum_member_index: None,
    }
  }

  #[must_use] pub fn is_const(&self) -> bool { self.flags.contains(ObjFlags::CONSTANT) }
}
