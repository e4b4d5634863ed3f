//! Collaborator interfaces named but not fully specified by spec.md §6:
//! the external C toolchain invocation, and the error-sink contract the
//! parser/type checker/emitter are written against.
//!
//! Keeping these behind traits is what lets the core (parser, type
//! checker, emitter) stay decoupled from "subprocess invocation of
//! `cc`/`ld`" (explicitly out of scope per spec.md §1) while the driver
//! still produces a runnable binary.

/// Runs an external process and reports its exit code (spec.md §6:
/// "Subprocess: `run(name, argv, print_exit_msg) -> exit_code`").
pub trait Subprocess {
  fn run(&mut self, name: &str, argv: &[&str], print_exit_msg: bool) -> std::io::Result<i32>;
}

/// The real subprocess collaborator, backed by [`std::process::Command`].
#[derive(Default)]
pub struct RealSubprocess;

impl Subprocess for RealSubprocess {
  fn run(&mut self, name: &str, argv: &[&str], print_exit_msg: bool) -> std::io::Result<i32> {
    log::debug!("invoking {name} {}", argv.join(" "));
    let status = std::process::Command::new(name).args(argv).status()?;
    let code = status.code().unwrap_or(-1);
    if print_exit_msg && code != 0 {
      log::warn!("{name} exited with code {code}");
    }
    Ok(code)
  }
}

/// A fake subprocess used in tests: records every invocation and returns
/// a pre-programmed exit code without touching the filesystem.
#[derive(Default)]
pub struct FakeSubprocess {
  pub invocations: Vec<(String, Vec<String>)>,
  pub exit_code: i32,
}

impl Subprocess for FakeSubprocess {
  fn run(&mut self, name: &str, argv: &[&str], _print_exit_msg: bool) -> std::io::Result<i32> {
    self.invocations.push((name.to_string(), argv.iter().map(|s| s.to_string()).collect()));
    Ok(self.exit_code)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fake_subprocess_records_invocations() {
    let mut p = FakeSubprocess::default();
    let code = p.run("cc", &["-c", "a.c"], true).unwrap();
    assert_eq!(code, 0);
    assert_eq!(p.invocations.len(), 1);
    assert_eq!(p.invocations[0].0, "cc");
  }
}
