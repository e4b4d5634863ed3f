//! Compiler directive parsing and evaluation (spec.md §4.1.5):
//! `[field("val1"[, "val2"...])]`, evaluated immediately against the
//! surrounding object list. Grounded in
//! `original_source/src/compiler/parser/parser.c`'s
//! `parse_compiler_directives`/`eval_compiler_directive`.

use crate::error::Result;
use crate::symbol::intern;
use crate::token::TokenKind;
use crate::types::object::{ObjFlags, ObjKind};

use super::Parser;

pub(super) fn parse_and_eval(p: &mut Parser) -> Result<()> {
  p.bump(); // `[`
  let field_span = p.current.span;
  let field = p.expect_id()?.to_string();
  p.expect(TokenKind::LParen)?;

  let mut first = true;
  loop {
    if !first { if !p.eat(&TokenKind::Comma) { break; } }
    first = false;
    if p.check(&TokenKind::RParen) { break; }
    let value_span = p.current.span;
    let value_tok = p.expect(TokenKind::StrLit)?;
    eval_directive(p, &field, field_span, &value_tok.value, value_span)?;
  }
  p.expect(TokenKind::RParen)?;
  p.expect(TokenKind::RBracket)?;
  Ok(())
}

fn eval_directive(
  p: &mut Parser, field: &str, field_span: crate::token::Span, value: &str, value_span: crate::token::Span,
) -> Result<()> {
  match field {
    "link" => p.program.linker_flags.push(format!("-l{value}")),
    "link_dir" => p.program.linker_flags.push(format!("-L{value}")),
    "link_obj" => p.program.linker_flags.push(value.to_string()),
    "no_return" => {
      let all = value == "*";
      let mut found = false;
      for (_, obj) in p.program.objects.iter_mut() {
        if all {
          if obj.kind == ObjKind::Function { obj.flags |= ObjFlags::NO_RETURN; }
        } else if obj.id.name == intern(value) {
          if obj.kind != ObjKind::Function {
            return Err(p.err_type(value_span, format!("`{value}` is not a function, thus cannot have the `no_return` attribute")));
          }
          obj.flags |= ObjFlags::NO_RETURN;
          found = true;
          break;
        }
      }
      if !all && !found {
        return Err(p.err_syntax_at(value_span, format!("could not find function `{value}` in current scope")));
      }
    }
    "ignore_unused" => {
      let all = value == "*";
      let mut found = false;
      for (_, obj) in p.program.objects.iter_mut() {
        if all {
          obj.flags |= ObjFlags::IGNORE_UNUSED;
        } else if obj.id.name == intern(value) {
          obj.flags |= ObjFlags::IGNORE_UNUSED;
          found = true;
          break;
        }
      }
      if !all && !found {
        return Err(p.err_syntax_at(value_span, format!("could not find identifier `{value}` in current scope")));
      }
    }
    "exit_fn" => {
      p.expect(TokenKind::Colon)?;
      let ty = p.parse_type()?;
      let type_name = match &p.program.types[ty].kind {
        crate::types::ty::TypeKind::Named { id, .. } => id.name,
        _ => return Err(p.err_type(value_span, "`exit_fn` type argument must be a named type")),
      };
      let mut found = None;
      for (id, obj) in p.program.objects.iter() {
        if obj.kind == ObjKind::Function && obj.id.name == intern(value) {
          found = Some(id);
          break;
        }
      }
      match found {
        Some(id) => { p.program.type_exit_fns.insert(type_name, id); }
        None => return Err(p.err_syntax_at(value_span, format!("could not find function `{value}` in current scope"))),
      }
    }
    other => {
      p.diags.warn_syntax(&p.source, field_span, format!("undefined compiler directive `{other}`"));
    }
  }
  Ok(())
}
