use std::io::Write;
use std::path::{Path, PathBuf};

use crate::ast::Builtin;
use crate::error::{Result, ShellError};
use crate::status::Termination;

#[derive(Debug, PartialEq, Eq)]
pub enum BuiltinAction {
    Continue,
    /// Leave the main loop; the session cleans up children before the process exits.
    Exit,
}

/// Execute a builtin command, writing output to the provided streams.
pub fn execute(
    builtin: Builtin,
    args: &[String],
    last_status: Termination,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
) -> BuiltinAction {
    match builtin {
        Builtin::Cd => {
            if let Err(e) = builtin_cd(args) {
                let _ = writeln!(stderr, "{e}");
            }
            BuiltinAction::Continue
        }
        Builtin::Status => {
            let _ = writeln!(stdout, "{last_status}");
            let _ = stdout.flush();
            BuiltinAction::Continue
        }
        Builtin::Exit => BuiltinAction::Exit,
    }
}

fn builtin_cd(args: &[String]) -> Result<()> {
    let home = std::env::var_os("HOME").map(PathBuf::from);
    let cwd = std::env::current_dir()?;
    let target = cd_target(args.first().map(String::as_str), &cwd, home.as_deref())?;

    std::env::set_current_dir(&target).map_err(|source| ShellError::ChangeDir {
        path: args.first().cloned().unwrap_or_else(|| target.display().to_string()),
        source,
    })?;
    tracing::debug!(cwd = %target.display(), "changed directory");
    Ok(())
}

/// Where `cd` should go: `HOME` with no argument, the argument itself if it
/// is absolute, otherwise `<cwd>/<argument>` as a plain string join.
fn cd_target(arg: Option<&str>, cwd: &Path, home: Option<&Path>) -> Result<PathBuf> {
    match arg {
        None => home.map(Path::to_path_buf).ok_or(ShellError::HomeNotSet),
        Some(dir) if Path::new(dir).is_absolute() => Ok(PathBuf::from(dir)),
        Some(dir) => Ok(PathBuf::from(format!("{}/{dir}", cwd.display()))),
    }
}
