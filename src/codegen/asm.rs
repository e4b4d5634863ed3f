//! Inline assembly lowering (spec.md §4.4.5), grounded in
//! `c_codegen.c`'s `c_detect_registers`/`c_gen_inline_asm`: a string
//! argument contributes literal assembly text, an integer argument
//! contributes its decimal spelling, and an identifier argument becomes
//! a positional `%N` placeholder backed by a GCC extended-`asm` input
//! operand. Every register name appearing anywhere in the literal text
//! is collected into the trailing clobber list.

use crate::error::Result;
use crate::types::ast::{AsmArg, NodeKind};
use crate::types::NodeId;

use super::Emitter;

/// `reg_names` in `c_codegen.c`, in detection order. Carries the leading
/// `%` verbatim: the original's clobber loop (`c_codegen.c:719`) writes
/// `"%s",` with these entries directly, so the emitted clobber list reads
/// `"%rax",` rather than `"rax",`.
const REGISTERS: &[&str] = &[
  "%rax", "%rbx", "%rcx", "%rdx", "%rdi", "%rsi", "%rbp", "%rsp",
  "%r8", "%r9", "%r10", "%r11", "%r12", "%r13", "%r14", "%r15", "%rip",
];

/// Finds every `%<register>` occurrence in `text`, in first-occurrence
/// order, returning the register spellings (with their leading `%`) for
/// the clobber list.
fn detect_registers(text: &str) -> Vec<&'static str> {
  let mut found = Vec::new();
  for &reg in REGISTERS {
    if text.contains(reg) && !found.contains(&reg) {
      found.push(reg);
    }
  }
  found
}

impl<'p> Emitter<'p> {
  pub(super) fn gen_inline_asm(&mut self, id: NodeId) -> Result<()> {
    let NodeKind::Asm { args } = self.program.nodes[id].kind.clone() else {
      unreachable!("gen_inline_asm called on a non-Asm node");
    };
    let mut raw_text = String::new();
    let mut escaped_text = String::new();
    let mut inputs = Vec::new();
    let mut next_operand = 0usize;
    for a in &args {
      match a {
        AsmArg::Str(s) => {
          raw_text.push_str(s);
          escaped_text.push_str(&s.replace('%', "%%"));
        }
        AsmArg::Int(v) => {
          let spelling = v.to_string();
          raw_text.push_str(&spelling);
          escaped_text.push_str(&spelling);
        }
        AsmArg::Ident(ident, resolved) => {
          resolved.get().expect("asm identifier operand resolved during type checking");
          // A bare `%N` placeholder, never escaped: this is the operand
          // reference GCC extended asm expects, not literal register text.
          escaped_text.push_str(&format!("%{next_operand}"));
          inputs.push(format!("\"r\"((unsigned long)({}))", self.mangled(ident)));
          next_operand += 1;
        }
      }
    }
    let clobbers = detect_registers(&raw_text);

    self.out.push_str("__asm__ volatile(\"");
    self.out.push_str(&escaped_text);
    self.out.push('"');
    self.out.push_str(" : : ");
    for (i, inp) in inputs.iter().enumerate() {
      if i > 0 { self.out.push(','); }
      self.out.push_str(inp);
    }
    self.out.push_str(" : ");
    for (i, c) in clobbers.iter().enumerate() {
      if i > 0 { self.out.push(','); }
      self.out.push_str(&format!("\"{c}\""));
    }
    self.out.push(')');
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn detects_every_register_once_in_order() {
    let text = "movq %rax, %rdi\nmovq %rdi, %rax";
    assert_eq!(detect_registers(text), vec!["%rax", "%rdi"]);
  }

  #[test]
  fn no_registers_found_in_plain_text() {
    assert!(detect_registers("nop").is_empty());
  }
}
