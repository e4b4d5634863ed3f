//! Wires the collaborator interfaces (spec.md §6) into one compile
//! pipeline: parse, resolve and type-check, generate C, then hand the
//! result to the external `cc`/linker toolchain and optionally run it.
//! Mirrors the original compiler's own top-level driving order (lex,
//! parse, typecheck, codegen, invoke toolchain) — only the lexer and the
//! toolchain invocation itself are out of scope (spec.md §1); everything
//! in between is this crate's job.

use std::fs;
use std::rc::Rc;

use crate::codegen::Emitter;
use crate::collab::Subprocess;
use crate::config::{CompileType, Config};
use crate::error::{err, CspError, Diagnostics, ErrorKind, Result};
use crate::parser::Parser;
use crate::token::{SourceFile, Span, TokenStream};
use crate::typeck;

fn io_err(source: &SourceFile, message: impl Into<String>) -> CspError {
  err(ErrorKind::Io, source, Span::default(), message)
}

fn toolchain_err(source: &SourceFile, message: impl Into<String>) -> CspError {
  err(ErrorKind::Toolchain, source, Span::default(), message)
}

/// Parses, resolves, type-checks and emits C for `source`, using
/// `stream` as the already-lexed token source. Returns the generated C
/// translation unit plus every non-fatal diagnostic collected along the
/// way (spec.md §7: warnings never abort).
pub fn compile_to_c(stream: &mut dyn TokenStream, source: Rc<SourceFile>) -> Result<(String, Diagnostics)> {
  let parser = Parser::new(stream, source.clone());
  let (mut program, mut diags) = parser.parse_program()?;
  typeck::check_program(&mut program, &source, &mut diags)?;
  let c_source = Emitter::new(&mut program, &source).generate()?;
  Ok((c_source, diags))
}

/// The full `prog run|build|debug <file>` pipeline (spec.md §6):
/// transpile to C, write it under `config.cache_dir`, invoke `cc` via
/// `subprocess`, and — for [`CompileType::Run`] — execute the resulting
/// binary. Returns the final process exit code (spec.md §6: "exit code
/// 0/1, or the child process's own code").
pub fn compile_file(
  stream: &mut dyn TokenStream,
  source: Rc<SourceFile>,
  config: &Config,
  subprocess: &mut dyn Subprocess,
) -> Result<i32> {
  let (c_source, mut diags) = compile_to_c(stream, source.clone())?;
  if !config.silent {
    diags.flush();
  }
  if config.print_c {
    println!("{c_source}");
  }
  if config.transpile_only {
    return Ok(0);
  }

  fs::create_dir_all(&config.cache_dir).map_err(|e| io_err(&source, format!("creating cache dir: {e}")))?;
  let c_path = config.cache_dir.join("out.c");
  fs::write(&c_path, &c_source).map_err(|e| io_err(&source, format!("writing generated C: {e}")))?;

  let output_path = config.output_path.display().to_string();
  let mut cc_args: Vec<String> = vec!["-std=c2x".to_string(), "-nostdlib".to_string(), "-static".to_string()];
  if config.embed_debug_info { cc_args.push("-g".to_string()); }
  cc_args.push(c_path.display().to_string());
  cc_args.extend(config.linker_flags.iter().cloned());
  cc_args.push("-o".to_string());
  cc_args.push(output_path.clone());
  let cc_args_ref: Vec<&str> = cc_args.iter().map(String::as_str).collect();

  let cc_code = subprocess.run("cc", &cc_args_ref, !config.silent)
    .map_err(|e| toolchain_err(&source, format!("invoking cc: {e}")))?;
  if cc_code != 0 {
    return Ok(cc_code);
  }

  if matches!(config.compile_type, CompileType::Run) {
    return subprocess.run(&output_path, &[], !config.silent)
      .map_err(|e| toolchain_err(&source, format!("running {output_path}: {e}")));
  }
  Ok(0)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::collab::FakeSubprocess;
  use std::path::PathBuf;

  fn program(src: &str) -> (crate::testutil::VecTokenStream, Rc<SourceFile>) {
    let stream = crate::testutil::lex("t.csp", src);
    let source = crate::testutil::lex_source("t.csp", src);
    (stream, source)
  }

  #[test]
  fn compiles_empty_main_to_c_with_start_stub() {
    let (mut stream, source) = program("fn main(): i32 { ret 0; }");
    let (c, diags) = compile_to_c(&mut stream, source).unwrap();
    assert!(!diags.has_warnings());
    assert!(c.contains("__csp_main"));
    assert!(c.contains("call __csp_main"));
  }

  #[test]
  fn transpile_only_never_invokes_the_toolchain() {
    let (mut stream, source) = program("fn main(): i32 { ret 0; }");
    let mut config = Config::new(CompileType::Build, PathBuf::from("a.out"));
    config.transpile_only = true;
    let mut sub = FakeSubprocess::default();
    let code = compile_file(&mut stream, source, &config, &mut sub).unwrap();
    assert_eq!(code, 0);
    assert!(sub.invocations.is_empty());
  }

  #[test]
  fn build_invokes_cc_but_not_the_binary() {
    let (mut stream, source) = program("fn main(): i32 { ret 0; }");
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::new(CompileType::Build, dir.path().join("a.out"));
    config.cache_dir = dir.path().to_path_buf();
    let mut sub = FakeSubprocess::default();
    let code = compile_file(&mut stream, source, &config, &mut sub).unwrap();
    assert_eq!(code, 0);
    assert_eq!(sub.invocations.len(), 1);
    assert_eq!(sub.invocations[0].0, "cc");
  }

  #[test]
  fn run_also_invokes_the_produced_binary() {
    let (mut stream, source) = program("fn main(): i32 { ret 0; }");
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::new(CompileType::Run, dir.path().join("a.out"));
    config.cache_dir = dir.path().to_path_buf();
    let mut sub = FakeSubprocess::default();
    let code = compile_file(&mut stream, source, &config, &mut sub).unwrap();
    assert_eq!(code, 0);
    assert_eq!(sub.invocations.len(), 2);
    assert_eq!(sub.invocations[0].0, "cc");
  }
}
