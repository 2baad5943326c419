use std::io::Write;
use std::os::unix::process::CommandExt;
use std::process::{Child, Command, Stdio};

use crate::ast::ParsedCommand;
use crate::error::ShellError;
use crate::job_control::Dispositions;
use crate::jobs::JobTable;
use crate::redirect::BoundStreams;
use crate::status::Termination;

/// What happened to a dispatched external command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Ran in the foreground (or failed to start there) and ended like this.
    Foreground(Termination),
    /// Started in the background with this pid.
    Background(u32),
    /// A background dispatch that never started.
    NotStarted,
}

/// Launch an external command and, for foreground commands, wait for it.
///
/// Redirections are opened before anything is launched; a failure to open one
/// aborts the dispatch. Foreground commands that cannot be started end with
/// exit value 1, as if the child had failed to exec.
pub fn execute(
    cmd: &ParsedCommand,
    jobs: &mut JobTable,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
) -> Outcome {
    if cmd.background && jobs.is_full() {
        let err = ShellError::JobTableFull { capacity: jobs.capacity() };
        let _ = writeln!(stderr, "smallsh: {err}");
        return Outcome::NotStarted;
    }

    let streams = match BoundStreams::open(cmd.input.as_deref(), cmd.output.as_deref(), cmd.background) {
        Ok(streams) => streams,
        Err(e) => {
            tracing::debug!(error = ?e, "redirection failed, dispatch aborted");
            let _ = writeln!(stderr, "{e}");
            let _ = stderr.flush();
            return not_started(cmd);
        }
    };

    let _ = stdout.flush();
    let _ = stderr.flush();

    let mut command = build_command(cmd, streams);
    tracing::debug!(program = cmd.program(), background = cmd.background, "launching");
    let spawned = command.spawn();
    // Release the parent's copies of any redirected files.
    drop(command);

    let child = match spawned {
        Ok(child) => child,
        Err(source) => {
            let err = ShellError::Launch {
                program: cmd.program().to_string(),
                source,
            };
            tracing::debug!(error = ?err, "launch failed");
            let _ = writeln!(stdout, "{err}");
            let _ = stdout.flush();
            return not_started(cmd);
        }
    };

    if cmd.background {
        run_background(child, jobs, stdout, stderr)
    } else {
        run_foreground(child, stdout)
    }
}

fn build_command(cmd: &ParsedCommand, streams: BoundStreams) -> Command {
    let mut command = Command::new(cmd.program());
    command.args(cmd.args());

    if let Some(file) = streams.stdin {
        command.stdin(Stdio::from(file));
    }
    if let Some(file) = streams.stdout {
        command.stdout(Stdio::from(file));
    }

    let dispositions = Dispositions::for_child(cmd.background);
    // SAFETY: the hook only calls sigaction(2), which is async-signal-safe.
    unsafe {
        command.pre_exec(move || dispositions.apply());
    }

    command
}

fn run_foreground(mut child: Child, stdout: &mut dyn Write) -> Outcome {
    let pid = child.id();
    let termination = match child.wait() {
        Ok(status) => Termination::from(status),
        Err(e) => {
            tracing::warn!(pid, error = %e, "waiting for foreground child failed");
            Termination::Exited(1)
        }
    };
    tracing::debug!(pid, %termination, "foreground child finished");

    if let Termination::Signaled(_) = termination {
        let _ = writeln!(stdout, "{termination}");
        let _ = stdout.flush();
    }

    Outcome::Foreground(termination)
}

fn run_background(
    child: Child,
    jobs: &mut JobTable,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
) -> Outcome {
    match jobs.insert(child) {
        Ok(pid) => {
            let _ = writeln!(stdout, "background pid is {pid}");
            let _ = stdout.flush();
            Outcome::Background(pid)
        }
        Err(e) => {
            let _ = writeln!(stderr, "smallsh: {e}");
            Outcome::NotStarted
        }
    }
}

fn not_started(cmd: &ParsedCommand) -> Outcome {
    if cmd.background {
        Outcome::NotStarted
    } else {
        Outcome::Foreground(Termination::Exited(1))
    }
}
