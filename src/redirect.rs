use std::fs::{File, OpenOptions};
use std::os::unix::fs::OpenOptionsExt;

use crate::error::{Result, ShellError};

/// Permission bits for files created by `>`.
const OUTPUT_MODE: u32 = 0o664;

const NULL_DEVICE: &str = "/dev/null";

/// What a standard stream should be connected to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectTarget {
    /// Write to file (create, truncate)
    File(String),
    /// Read from file
    FileRead(String),
}

/// Separate `<` and `>` clauses from regular arguments.
///
/// Only tokens exactly equal to an operator count; the following token is the
/// filename. Arguments after a clause are kept in order.
pub fn extract_redirections(tokens: &[String]) -> Result<(Vec<String>, Vec<RedirectTarget>)> {
    let mut args = Vec::new();
    let mut redirections = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        let token = &tokens[i];

        if token == ">" {
            i += 1;
            let path = expect_filename(i, tokens, ">")?;
            redirections.push(RedirectTarget::File(path));
        } else if token == "<" {
            i += 1;
            let path = expect_filename(i, tokens, "<")?;
            redirections.push(RedirectTarget::FileRead(path));
        } else {
            args.push(token.clone());
        }

        i += 1;
    }

    Ok((args, redirections))
}

fn expect_filename(i: usize, tokens: &[String], operator: &str) -> Result<String> {
    match tokens.get(i) {
        Some(path) => Ok(path.clone()),
        None => Err(ShellError::MissingFilename { operator: operator.to_string() }),
    }
}

pub fn open_input(path: &str) -> Result<File> {
    File::open(path).map_err(|source| ShellError::Redirect {
        path: path.to_string(),
        direction: "input",
        source,
    })
}

pub fn open_output(path: &str) -> Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(OUTPUT_MODE)
        .open(path)
        .map_err(|source| ShellError::Redirect {
            path: path.to_string(),
            direction: "output",
            source,
        })
}

/// Files a child's stdin/stdout get bound to. `None` means inherit the shell's stream.
#[derive(Debug, Default)]
pub struct BoundStreams {
    pub stdin: Option<File>,
    pub stdout: Option<File>,
}

impl BoundStreams {
    /// Open every requested redirection before anything is launched.
    ///
    /// Input is opened first so a missing input file never truncates the output.
    /// Background children get the null device for streams left unredirected.
    pub fn open(input: Option<&str>, output: Option<&str>, background: bool) -> Result<Self> {
        let stdin = match input {
            Some(path) => Some(open_input(path)?),
            None if background => Some(open_input(NULL_DEVICE)?),
            None => None,
        };
        let stdout = match output {
            Some(path) => Some(open_output(path)?),
            None if background => Some(open_output(NULL_DEVICE)?),
            None => None,
        };
        Ok(Self { stdin, stdout })
    }
}
