//! Parser integration tests, driven through [`crate::testutil::lex`]
//! rather than hand-built token vectors, so each test reads as a small
//! Source-language program.

use crate::symbol::intern;
use crate::testutil::lex;
use crate::types::ast::{MainFunctionKind, NodeKind};
use crate::types::object::{ObjFlags, ObjKind};
use crate::types::ty::TypeKind;

use super::Parser;

fn parse(src: &str) -> (crate::types::program::Program, crate::error::Diagnostics) {
  let mut stream = lex("test.csp", src);
  let source = crate::testutil::lex_source("test.csp", src);
  Parser::new(&mut stream, source).parse_program().expect("parse failed")
}

fn find_fn<'p>(program: &'p crate::types::program::Program, name: &str) -> &'p crate::types::object::Object {
  let sym = intern(name);
  program.objects.iter().map(|(_, o)| o).find(|o| o.kind == ObjKind::Function && o.id.name == sym)
    .unwrap_or_else(|| panic!("no function named `{name}`"))
}

#[test]
fn classifies_no_arg_main() {
  let (program, _) = parse("fn main(): i32 { return 0; }");
  assert_eq!(program.main_function_kind, Some(MainFunctionKind::NoArgs));
}

#[test]
fn classifies_argc_argv_main() {
  let (program, _) = parse("fn main(argc: i32, argv: &&char): i32 { return 0; }");
  assert_eq!(program.main_function_kind, Some(MainFunctionKind::ArgcArgvPtr));
}

#[test]
fn classifies_args_array_main() {
  let (program, _) = parse("fn main(args: &char[4]): i32 { return 0; }");
  assert_eq!(program.main_function_kind, Some(MainFunctionKind::ArgsArray));
}

#[test]
fn tuple_types_dedupe_structurally() {
  let (program, _) = parse(
    "let a: {i32, i32}; let b: {i32, i32}; let c: {i32, bool};",
  );
  let tuple_typedefs = program.objects.iter()
    .filter(|(_, o)| o.kind == ObjKind::Typedef && o.id.name.to_string().starts_with("__csp_tuple_"))
    .count();
  // `a` and `b` share one structurally-equal tuple typedef; `c` is distinct.
  assert_eq!(tuple_typedefs, 2);
}

#[test]
fn pipe_expression_substitutes_hole_into_call() {
  let (program, _) = parse("fn main(): i32 { return 1 |> add($, 2); }");
  let main = find_fn(&program, "main");
  let body = main.body.expect("main has a body");
  let NodeKind::Block { stmts, .. } = &program.nodes[body].kind else { panic!("expected block") };
  let NodeKind::Return(Some(ret_val)) = &program.nodes[stmts[0]].kind else { panic!("expected return") };
  let NodeKind::Call { args, .. } = &program.nodes[*ret_val].kind else { panic!("expected call") };
  assert_eq!(args.len(), 2);
  assert!(matches!(program.nodes[args[0]].kind, NodeKind::IntLit(1)));
}

#[test]
fn bare_pipe_hole_rhs_collapses_to_identity() {
  let (program, _) = parse("fn main(): i32 { return 1 |> $; }");
  let main = find_fn(&program, "main");
  let body = main.body.unwrap();
  let NodeKind::Block { stmts, .. } = &program.nodes[body].kind else { panic!("expected block") };
  let NodeKind::Return(Some(ret_val)) = &program.nodes[stmts[0]].kind else { panic!("expected return") };
  assert!(matches!(program.nodes[*ret_val].kind, NodeKind::IntLit(1)));
}

#[test]
fn power_operator_lowers_to_closure_wrapped_multiplication() {
  let (program, _) = parse("fn main(): i32 { return a\u{00B2}; }");
  let main = find_fn(&program, "main");
  let body = main.body.unwrap();
  let NodeKind::Block { stmts, .. } = &program.nodes[body].kind else { panic!("expected block") };
  let NodeKind::Return(Some(ret_val)) = &program.nodes[stmts[0]].kind else { panic!("expected return") };
  let NodeKind::Closure { inner } = &program.nodes[*ret_val].kind else { panic!("expected closure") };
  let NodeKind::Binary { op, left, right } = &program.nodes[*inner].kind else { panic!("expected binary") };
  assert_eq!(*op, crate::types::ast::BinOp::Mul);
  assert_eq!(left, right);
}

#[test]
fn lambda_literal_hoists_to_a_program_scope_function() {
  let (program, _) = parse("fn main(): i32 { let f = |x: i32|: i32 => { noop; }; return 0; }");
  let lambda = program.objects.iter().map(|(_, o)| o)
    .find(|o| o.kind == ObjKind::Function && o.id.name.to_string().starts_with("__csp_lambda_lit_"))
    .expect("lambda was hoisted to a program-scope function");
  assert_eq!(lambda.args.len(), 1);
  assert!(program.root.iter().any(|id| program.objects[*id].id.name == lambda.id.name));
}

#[test]
fn link_directive_records_a_linker_flag() {
  let (program, _) = parse("[link(\"m\")]\nfn main(): i32 { return 0; }");
  assert!(program.linker_flags.contains(&"-lm".to_string()));
}

#[test]
fn no_return_directive_sets_the_object_flag() {
  let (program, _) = parse(
    "fn compute(): i32 { return 0; }\n[no_return(\"compute\")]\nfn main(): i32 { return compute(); }",
  );
  let compute = find_fn(&program, "compute");
  assert!(compute.flags.contains(ObjFlags::NO_RETURN));
}

#[test]
fn exit_fn_directive_binds_a_named_type_to_a_handler_function() {
  let (program, _) = parse(
    "type MyErr: i32;\n\
     fn handle_err(e: MyErr): void {}\n\
     [exit_fn(\"handle_err\": MyErr)]\n\
     fn main(): i32 { return 0; }",
  );
  let handler = find_fn(&program, "handle_err");
  let bound = program.type_exit_fns.get(&intern("MyErr")).copied();
  assert_eq!(bound, program.objects.iter().find(|(_, o)| o.id.name == handler.id.name).map(|(id, _)| id));
}

#[test]
fn struct_and_pointer_type_syntax_parses() {
  let (program, _) = parse("type Point: struct { x: i32, y: i32 }; type IntPtr: &i32; type IntPtrPtr: &&i32;");
  let point = program.objects.iter().map(|(_, o)| o)
    .find(|o| o.id.name == intern("Point")).expect("Point typedef exists");
  match &program.types[point.ty].kind {
    TypeKind::Struct { members, is_union } => { assert_eq!(members.len(), 2); assert!(!is_union); }
    other => panic!("expected a struct type, got {other:?}"),
  }
  let int_ptr = program.objects.iter().map(|(_, o)| o)
    .find(|o| o.id.name == intern("IntPtr")).expect("IntPtr typedef exists");
  assert!(matches!(program.types[int_ptr.ty].kind, TypeKind::Pointer { .. }));
  let int_ptr_ptr = program.objects.iter().map(|(_, o)| o)
    .find(|o| o.id.name == intern("IntPtrPtr")).expect("IntPtrPtr typedef exists");
  match &program.types[int_ptr_ptr.ty].kind {
    TypeKind::Pointer { base } => assert!(matches!(program.types[*base].kind, TypeKind::Pointer { .. })),
    other => panic!("expected a pointer-to-pointer type, got {other:?}"),
  }
}

#[test]
fn array_suffix_selects_sized_array_vla_or_c_array() {
  let (program, _) = parse(
    "let fixed: i32[4]; let dyn_sized: i32[]; extern { fn f(a: i32[4]): void; }",
  );
  let fixed = program.objects.iter().map(|(_, o)| o).find(|o| o.id.name == intern("fixed")).unwrap();
  assert!(matches!(program.types[fixed.ty].kind, TypeKind::SizedArray { num_indices: 4, .. }));
  let dyn_sized = program.objects.iter().map(|(_, o)| o).find(|o| o.id.name == intern("dyn_sized")).unwrap();
  assert!(matches!(program.types[dyn_sized.ty].kind, TypeKind::Vla { .. }));
  let f = find_fn(&program, "f");
  let arg_ty = program.objects[f.args[0]].ty;
  assert!(matches!(program.types[arg_ty].kind, TypeKind::CArray { num_indices: 4, .. }));
}

#[test]
fn for_range_desugars_distinctly_from_tripartite_for() {
  let (program, _) = parse(
    "fn main(): i32 { for i in 0..10 { noop; } for (let j: i32 = 0; j; j = j) { noop; } return 0; }",
  );
  let main = find_fn(&program, "main");
  let body = main.body.unwrap();
  let NodeKind::Block { stmts, .. } = &program.nodes[body].kind else { panic!("expected block") };
  assert!(matches!(program.nodes[stmts[0]].kind, NodeKind::ForRange { .. }));
  assert!(matches!(program.nodes[stmts[1]].kind, NodeKind::For { .. }));
}

#[test]
fn duplicate_default_match_case_is_rejected() {
  let src = "fn main(): i32 { match (1) { _ => 0; _ => 1; } return 0; }";
  let mut stream = lex("test.csp", src);
  let source = crate::testutil::lex_source("test.csp", src);
  let err = Parser::new(&mut stream, source).parse_program().unwrap_err();
  assert_eq!(err.kind, crate::error::ErrorKind::Redefinition);
}
