//! Process-wide, read-only-after-startup configuration (spec.md §5's
//! "process-wide `global`"). Built once by the CLI and threaded through
//! the driver by reference rather than stored in a global/thread-local,
//! per the Open Question resolution recorded in DESIGN.md.

use std::path::PathBuf;

/// The `prog [run|build|debug]` subcommand selector (spec.md §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileType {
  Run,
  Build,
  Debug,
}

#[derive(Debug, Clone)]
pub struct Config {
  pub compile_type: CompileType,
  pub silent: bool,
  pub linker_flags: Vec<String>,
  pub embed_debug_info: bool,
  pub output_path: PathBuf,
  pub cache_dir: PathBuf,
  pub transpile_only: bool,
  pub print_c: bool,
}

impl Config {
  #[must_use] pub fn new(compile_type: CompileType, output_path: PathBuf) -> Self {
    let cache_dir = std::env::var_os("HOME")
      .map(|home| PathBuf::from(home).join(".cache").join("csp"))
      .unwrap_or_else(|| PathBuf::from(".csp-cache"));
    Config {
      compile_type,
      silent: false,
      linker_flags: Vec::new(),
      embed_debug_info: matches!(compile_type, CompileType::Debug),
      output_path,
      cache_dir,
      transpile_only: false,
      print_c: false,
    }
  }

  pub fn add_linker_flag(&mut self, flag: impl Into<String>) {
    self.linker_flags.push(flag.into());
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn debug_compile_type_embeds_debug_info_by_default() {
    let cfg = Config::new(CompileType::Debug, PathBuf::from("a.out"));
    assert!(cfg.embed_debug_info);
    let cfg = Config::new(CompileType::Run, PathBuf::from("a.out"));
    assert!(!cfg.embed_debug_info);
  }
}
