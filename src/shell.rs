use std::io::Write;

use crate::ast::Dispatch;
use crate::builtins::{self, BuiltinAction};
use crate::config::Config;
use crate::executor::{self, Outcome};
use crate::job_control::ForegroundMode;
use crate::jobs::JobTable;
use crate::parser;
use crate::status::Termination;

/// Whether the main loop should keep reading lines.
#[derive(Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// All mutable state of one interactive session.
pub struct Shell {
    config: Config,
    pid: u32,
    jobs: JobTable,
    last_status: Termination,
    foreground_only: ForegroundMode,
}

impl Shell {
    pub fn new(config: Config, foreground_only: ForegroundMode) -> Self {
        let jobs = JobTable::new(config.max_background_jobs);
        Self {
            config,
            pid: std::process::id(),
            jobs,
            last_status: Termination::default(),
            foreground_only,
        }
    }

    pub fn prompt(&self) -> &str {
        self.config.prompt
    }

    /// Report and clear every background job that has finished.
    pub fn poll_background(&mut self, stdout: &mut dyn Write) {
        self.jobs.reap(stdout);
    }

    /// Classify and run one input line.
    pub fn execute_line(&mut self, line: &str, stdout: &mut dyn Write, stderr: &mut dyn Write) -> Flow {
        if parser::is_ignorable(line) {
            return Flow::Continue;
        }

        let tokens = parser::tokenize(line, self.pid);
        let dispatch = match parser::classify(tokens, self.foreground_only.is_active()) {
            Ok(dispatch) => dispatch,
            Err(e) => {
                let _ = writeln!(stderr, "smallsh: {e}");
                let _ = stderr.flush();
                return Flow::Continue;
            }
        };
        tracing::trace!(?dispatch, "classified line");

        match dispatch {
            Dispatch::Nothing => Flow::Continue,
            Dispatch::Builtin { builtin, args } => {
                match builtins::execute(builtin, &args, self.last_status, stdout, stderr) {
                    BuiltinAction::Continue => Flow::Continue,
                    BuiltinAction::Exit => Flow::Exit,
                }
            }
            Dispatch::External(cmd) => {
                let cmd = cmd.route_through_filter(self.config.multi_redirect_filter.as_deref());
                if let Outcome::Foreground(termination) =
                    executor::execute(&cmd, &mut self.jobs, stdout, stderr)
                {
                    self.last_status = termination;
                }
                Flow::Continue
            }
        }
    }

    /// Terminate outstanding background jobs before the process exits.
    pub fn shutdown(&mut self) {
        if !self.jobs.is_empty() {
            tracing::debug!(pids = ?self.jobs.pids(), "terminating background jobs");
        }
        self.jobs.terminate_all(self.config.exit_grace);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::{Duration, Instant};

    fn shell(foreground_only: bool) -> Shell {
        Shell::new(Config::default(), ForegroundMode::detached(foreground_only))
    }

    fn run(shell: &mut Shell, line: &str) -> (Flow, String, String) {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let flow = shell.execute_line(line, &mut out, &mut err);
        (flow, String::from_utf8(out).unwrap(), String::from_utf8(err).unwrap())
    }

    #[test]
    fn comment_and_blank_lines_do_nothing() {
        let mut shell = shell(false);
        for line in ["\n", "   \n", "# false\n"] {
            let (flow, out, err) = run(&mut shell, line);
            assert_eq!(flow, Flow::Continue);
            assert!(out.is_empty() && err.is_empty());
        }
        assert_eq!(shell.last_status, Termination::Exited(0));
    }

    #[test]
    fn foreground_command_sets_last_status() {
        let mut shell = shell(false);
        run(&mut shell, "false\n");
        assert_eq!(shell.last_status, Termination::Exited(1));

        let (_, out, _) = run(&mut shell, "status\n");
        assert_eq!(out, "exit value 1\n");
    }

    #[test]
    fn background_command_leaves_last_status_alone() {
        let mut shell = shell(false);
        let (_, out, _) = run(&mut shell, "false &\n");
        assert!(out.starts_with("background pid is "), "stdout was: {out}");
        assert_eq!(shell.last_status, Termination::Exited(0));

        let mut reported = String::new();
        let deadline = Instant::now() + Duration::from_secs(10);
        while !reported.contains("is done") && Instant::now() < deadline {
            let mut buf = Vec::new();
            shell.poll_background(&mut buf);
            reported.push_str(&String::from_utf8(buf).unwrap());
            thread::sleep(Duration::from_millis(20));
        }
        assert!(reported.contains("is done. exit value 1"), "poll output was: {reported}");
        assert_eq!(shell.last_status, Termination::Exited(0));
    }

    #[test]
    fn foreground_only_mode_runs_ampersand_synchronously() {
        let mut shell = shell(true);
        let (_, out, _) = run(&mut shell, "false &\n");
        assert!(!out.contains("background pid"), "stdout was: {out}");
        assert_eq!(shell.last_status, Termination::Exited(1));
    }

    #[test]
    fn exit_builtin_ends_the_loop() {
        let mut shell = shell(false);
        let (flow, _, _) = run(&mut shell, "exit\n");
        assert_eq!(flow, Flow::Exit);
    }

    #[test]
    fn shutdown_terminates_background_jobs() {
        let mut shell = shell(false);
        run(&mut shell, "sleep 30 &\n");
        let started = Instant::now();
        shell.shutdown();
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(shell.jobs.is_empty());
    }

    #[test]
    fn syntax_error_is_reported_without_dispatch() {
        let mut shell = shell(false);
        let (flow, out, err) = run(&mut shell, "cat <\n");
        assert_eq!(flow, Flow::Continue);
        assert!(out.is_empty());
        assert!(err.contains("expected filename after '<'"), "stderr was: {err}");
    }

    #[test]
    fn multi_redirect_filter_replaces_program() {
        let dir = std::env::temp_dir().join(format!("smallsh_shell_filter_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let input = dir.join("in.txt");
        let output = dir.join("out.txt");
        std::fs::write(&input, "one two\nthree\n").unwrap();

        let config = Config {
            multi_redirect_filter: Some("wc".into()),
            ..Config::default()
        };
        let mut shell = Shell::new(config, ForegroundMode::detached(false));
        let line = format!("cat < {} > {}\n", input.display(), output.display());
        run(&mut shell, &line);

        let counted = std::fs::read_to_string(&output).unwrap();
        let fields: Vec<&str> = counted.split_whitespace().collect();
        assert_eq!(fields, vec!["2", "3", "14"]);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
