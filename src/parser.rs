use crate::ast::{Builtin, Dispatch, ParsedCommand};
use crate::error::{Result, ShellError};
use crate::expander;
use crate::redirect::{self, RedirectTarget};

/// Marker that requests background execution when it is the last word.
const BACKGROUND_MARKER: &str = "&";

/// Turn the raw bytes of one input line into text.
///
/// A line that is not UTF-8 is rejected as a whole; the caller reports it and
/// keeps reading.
pub fn decode_line(raw: Vec<u8>) -> Result<String> {
    String::from_utf8(raw).map_err(|_| ShellError::InvalidEncoding)
}

/// Blank lines and `#` comments are dropped before tokenizing.
pub fn is_ignorable(line: &str) -> bool {
    line.starts_with('#') || line.trim().is_empty()
}

/// Split a line on whitespace and expand `$$` in every word.
///
/// There is no quoting: each whitespace-separated run is one word.
pub fn tokenize(line: &str, pid: u32) -> Vec<String> {
    line.split_whitespace()
        .map(|word| expander::expand_pid(word, pid))
        .collect()
}

/// Decide what a tokenized line should do.
///
/// A trailing `&` is always stripped; it only marks the command as background
/// when `foreground_only` is off. Redirection clauses are pulled out of the
/// argument list, and if the first remaining word names a builtin the line is
/// routed there with redirections and placement ignored.
pub fn classify(mut tokens: Vec<String>, foreground_only: bool) -> Result<Dispatch> {
    let wants_background = tokens.last().is_some_and(|t| t == BACKGROUND_MARKER);
    if wants_background {
        tokens.pop();
    }
    if wants_background && foreground_only {
        tracing::debug!("foreground-only mode: ignoring trailing &");
    }

    let (program_args, redirections) = redirect::extract_redirections(&tokens)?;

    let Some(first) = program_args.first() else {
        tracing::debug!(redirections = redirections.len(), "no program on line");
        return Ok(Dispatch::Nothing);
    };

    if let Some(builtin) = Builtin::lookup(first) {
        return Ok(Dispatch::Builtin {
            builtin,
            args: program_args[1..].to_vec(),
        });
    }

    let mut input = None;
    let mut output = None;
    for redirection in redirections {
        match redirection {
            RedirectTarget::FileRead(path) => input = Some(path),
            RedirectTarget::File(path) => output = Some(path),
        }
    }

    Ok(Dispatch::External(ParsedCommand {
        program_args,
        input,
        output,
        background: wants_background && !foreground_only,
    }))
}
