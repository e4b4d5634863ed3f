//! Size/alignment computation for every type in the program (spec.md
//! §4.4.3: "`sizeof`/`alignof` fold to the precomputed size/align of the
//! referenced type"). Runs once, after name resolution, so every
//! `Type::size`/`Type::align` is `Some` before inference or emission
//! needs it.
//!
//! Layout mirrors the emitter's own lowering (spec.md §4.4.2): sized
//! arrays carry an 8-byte length prefix ahead of their data
//! (`{u64 __s; T __v[N]}`), VLAs/pointers/functions are machine words,
//! enums are plain `int`.

use crate::types::program::Program;
use crate::types::ty::TypeKind;
use crate::types::TypeId;

const WORD: u32 = 8;

pub fn compute_layouts(program: &mut Program) {
  let ids: Vec<TypeId> = program.types.iter().map(|(id, _)| id).collect();
  for id in ids {
    compute_one(program, id, &mut Vec::new());
  }
}

fn align_up(n: u32, align: u32) -> u32 {
  if align <= 1 { return n; }
  n.div_ceil(align) * align
}

/// Computes (and memoizes onto `program.types[id]`) the size/align of
/// one type, recursing into bases/members. `visiting` breaks cycles that
/// slip past resolution (a typedef referencing itself) by bottoming out
/// at a zero-sized placeholder rather than overflowing the stack.
fn compute_one(program: &mut Program, id: TypeId, visiting: &mut Vec<TypeId>) -> (u32, u32) {
  if let (Some(s), Some(a)) = (program.types[id].size, program.types[id].align) {
    return (s, a);
  }
  if visiting.contains(&id) {
    return (0, 1);
  }
  visiting.push(id);

  let (size, align) = match program.types[id].kind.clone() {
    TypeKind::Primitive(p) => (p.size(), p.size().max(1)),
    TypeKind::Pointer { .. } | TypeKind::Vla { .. } | TypeKind::Function { .. } => (WORD, WORD),
    TypeKind::CArray { base, num_indices } => {
      let (bs, ba) = compute_one(program, base, visiting);
      (bs * u32::try_from(num_indices).unwrap_or(u32::MAX), ba)
    }
    // `{u64 __s; T __v[N]}` — spec.md §4.4.2.
    TypeKind::SizedArray { base, num_indices } => {
      let (bs, ba) = compute_one(program, base, visiting);
      let align = ba.max(WORD);
      let raw = WORD + bs * u32::try_from(num_indices).unwrap_or(u32::MAX);
      (align_up(raw, align), align)
    }
    TypeKind::Struct { members, is_union } => {
      if is_union {
        let mut max_size = 0u32;
        let mut max_align = 1u32;
        for m in &members {
          let (s, a) = compute_one(program, m.ty, visiting);
          max_size = max_size.max(s);
          max_align = max_align.max(a);
        }
        (align_up(max_size, max_align), max_align)
      } else {
        let mut offset = 0u32;
        let mut max_align = 1u32;
        for m in &members {
          let (s, a) = compute_one(program, m.ty, visiting);
          offset = align_up(offset, a) + s;
          max_align = max_align.max(a);
        }
        (align_up(offset, max_align), max_align)
      }
    }
    TypeKind::Enum { .. } => (4, 4),
    TypeKind::Named { referenced_obj, .. } => match referenced_obj.get() {
      Some(obj_id) => {
        let target = program.objects[obj_id].ty;
        compute_one(program, target, visiting)
      }
      None => (0, 1),
    },
    TypeKind::Typeof { expr } => match program.nodes[expr].data_type {
      Some(target) if target != id => compute_one(program, target, visiting),
      _ => (0, 1),
    },
  };

  visiting.pop();
  program.types[id].size = Some(size);
  program.types[id].align = Some(align);
  (size, align)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::token::Span;
  use crate::types::ty::{Member, Primitive, Type};
  use crate::symbol::intern;

  #[test]
  fn sized_array_layout_includes_length_prefix() {
    let mut p = Program::new();
    let i32_ty = p.alloc_type(Type::primitive(Primitive::I32, Span::default()));
    let arr = p.alloc_type(Type {
      kind: TypeKind::SizedArray { base: i32_ty, num_indices: 3 },
      is_constant: false, span: Span::default(), size: None, align: None, semantic_id: None,
    });
    compute_layouts(&mut p);
    assert_eq!(p.types[arr].size, Some(8 + 4 * 3));
    assert_eq!(p.types[arr].align, Some(8));
  }

  #[test]
  fn struct_layout_packs_members_with_alignment() {
    let mut p = Program::new();
    let c = p.alloc_type(Type::primitive(Primitive::Char, Span::default()));
    let i64_ty = p.alloc_type(Type::primitive(Primitive::I64, Span::default()));
    let s = p.alloc_type(Type {
      kind: TypeKind::Struct {
        members: vec![
          Member { name: intern("a"), ty: c },
          Member { name: intern("b"), ty: i64_ty },
        ],
        is_union: false,
      },
      is_constant: false, span: Span::default(), size: None, align: None, semantic_id: None,
    });
    compute_layouts(&mut p);
    assert_eq!(p.types[s].size, Some(16));
    assert_eq!(p.types[s].align, Some(8));
  }
}
