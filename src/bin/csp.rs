//! The `csp` command-line front end (spec.md §6, `SPEC_FULL.md` §4.9).
//! Flag parsing itself is explicitly out of scope as a "collaborator
//! interface" (spec.md §1) — this binary is the thin, concrete
//! `clap`-derived wiring the rest of the crate is written against, not
//! where any compiler logic lives.
//!
//! The real lexer is also out of scope (spec.md §1). Until a real one is
//! supplied by a collaborator, this binary drives [`cspc::driver`] with
//! [`cspc::testutil::lex`] — the same fixture tokenizer the test suite
//! uses — so the pipeline is runnable end to end on plain-ASCII source
//! text today, and swapping in a real lexer later is a one-line change
//! at the single call site below.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser as ClapParser, Subcommand};
use cspc::config::{CompileType, Config};
use cspc::driver;

#[derive(ClapParser)]
#[command(name = "csp", version, about = "Parser, typed AST and C backend for a curly-brace systems language")]
struct Cli {
  #[command(subcommand)]
  command: Command,

  /// Suppress warnings and toolchain exit-status messages.
  #[arg(short, long, global = true)]
  silent: bool,

  /// Print the generated C to stdout instead of (or in addition to)
  /// compiling it.
  #[arg(long, global = true)]
  print_c: bool,

  /// Stop after generating C; do not invoke the toolchain.
  #[arg(short = 't', long, global = true)]
  transpile: bool,

  /// Out of scope (spec.md §1: the LLVM backend is a Non-goal); accepted
  /// so existing invocations fail with a clear message instead of
  /// "unknown flag".
  #[arg(short = 'l', long, global = true)]
  llvm: bool,

  /// Out of scope alongside `--llvm`.
  #[arg(long, global = true)]
  print_llvm: bool,

  /// Extra linker flags, forwarded to `cc` verbatim.
  #[arg(long = "link", global = true)]
  link: Vec<String>,
}

#[derive(Subcommand)]
enum Command {
  /// Compile and immediately run the produced binary.
  Run { file: PathBuf, #[arg(short, long)] output: Option<PathBuf> },
  /// Compile to a binary without running it.
  Build { file: PathBuf, #[arg(short, long)] output: Option<PathBuf> },
  /// Like `build`, but embeds debug info.
  Debug { file: PathBuf, #[arg(short, long)] output: Option<PathBuf> },
  /// Print build/version info and exit (spec.md §6 `-i`/`--info`).
  Info,
}

fn main() -> ExitCode {
  env_logger::init();
  let cli = Cli::parse();

  if cli.llvm || cli.print_llvm {
    eprintln!("error: the LLVM backend is out of scope for this compiler");
    return ExitCode::FAILURE;
  }

  let (compile_type, file, output) = match cli.command {
    Command::Info => {
      println!("csp {}", env!("CARGO_PKG_VERSION"));
      return ExitCode::SUCCESS;
    }
    Command::Run { file, output } => (CompileType::Run, file, output),
    Command::Build { file, output } => (CompileType::Build, file, output),
    Command::Debug { file, output } => (CompileType::Debug, file, output),
  };

  let output_path = output.unwrap_or_else(|| PathBuf::from("a.out"));
  let mut config = Config::new(compile_type, output_path);
  config.silent = cli.silent;
  config.print_c = cli.print_c;
  config.transpile_only = cli.transpile;
  for flag in cli.link {
    config.add_linker_flag(flag);
  }

  let content = match std::fs::read_to_string(&file) {
    Ok(c) => c,
    Err(e) => {
      eprintln!("error: reading {}: {e}", file.display());
      return ExitCode::FAILURE;
    }
  };
  let name = file.display().to_string();
  let source = cspc::testutil::lex_source(&name, &content);
  let mut stream = cspc::testutil::lex(&name, &content);
  let mut subprocess = cspc::collab::RealSubprocess;

  match driver::compile_file(&mut stream, source, &config, &mut subprocess) {
    Ok(0) => ExitCode::SUCCESS,
    Ok(code) => ExitCode::from((code & 0xff) as u8),
    Err(e) => {
      eprintln!("{e}");
      ExitCode::FAILURE
    }
  }
}
