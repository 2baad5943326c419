#[cfg(not(unix))]
compile_error!("smallsh relies on Unix process and signal semantics");

mod ast;
mod builtins;
mod config;
mod error;
mod executor;
mod expander;
mod job_control;
mod jobs;
mod parser;
mod redirect;
mod shell;
mod status;

use std::io::{self, BufRead, Write};

use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::job_control::ForegroundMode;
use crate::shell::{Flow, Shell};

fn init_logging() {
    let filter = EnvFilter::try_from_env("SMALLSH_LOG").unwrap_or_else(|_| EnvFilter::new("off"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn main() {
    init_logging();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("smallsh: {e}");
            std::process::exit(2);
        }
    };

    if let Err(e) = job_control::install_shell_dispositions() {
        eprintln!("smallsh: {e}");
        std::process::exit(1);
    }

    let mut shell = Shell::new(config, ForegroundMode::process());
    let mut stdin = io::stdin().lock();
    let mut stdout = io::stdout();
    let mut stderr = io::stderr();

    loop {
        shell.poll_background(&mut stdout);

        let _ = write!(stdout, "{}", shell.prompt());
        if stdout.flush().is_err() {
            break;
        }

        let mut raw = Vec::new();
        match stdin.read_until(b'\n', &mut raw) {
            // End of input behaves like `exit`.
            Ok(0) => break,
            Ok(_) => match parser::decode_line(raw) {
                Ok(input) => {
                    if shell.execute_line(&input, &mut stdout, &mut stderr) == Flow::Exit {
                        break;
                    }
                }
                Err(e) => {
                    let _ = writeln!(stderr, "smallsh: {e}");
                    let _ = stderr.flush();
                }
            },
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                eprintln!("smallsh: error reading input: {e}");
                break;
            }
        }
    }

    shell.shutdown();
    let _ = stdout.flush();
    std::process::exit(0);
}
