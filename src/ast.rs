/// Commands the shell handles itself, without launching a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    /// `cd [dir]`: change the shell's working directory.
    Cd,
    /// `status`: report how the last foreground command ended.
    Status,
    /// `exit`: terminate tracked children, then the shell.
    Exit,
}

impl Builtin {
    pub fn lookup(name: &str) -> Option<Self> {
        match name {
            "cd" => Some(Builtin::Cd),
            "status" => Some(Builtin::Status),
            "exit" => Some(Builtin::Exit),
            _ => None,
        }
    }
}

/// An external program invocation with its redirections and placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    /// Argument vector; the first element is the program name. Never empty.
    pub program_args: Vec<String>,
    pub input: Option<String>,
    pub output: Option<String>,
    /// True only when `&` was given and foreground-only mode was off.
    pub background: bool,
}

impl ParsedCommand {
    pub fn program(&self) -> &str {
        &self.program_args[0]
    }

    pub fn args(&self) -> &[String] {
        &self.program_args[1..]
    }

    pub fn has_both_redirections(&self) -> bool {
        self.input.is_some() && self.output.is_some()
    }

    /// Swap the requested program for `filter` when both streams are redirected.
    pub fn route_through_filter(mut self, filter: Option<&str>) -> Self {
        if let Some(filter) = filter {
            if self.has_both_redirections() {
                self.program_args = vec![filter.to_string()];
            }
        }
        self
    }
}

/// What the classifier decided to do with one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Nothing runnable on the line, e.g. a lone `&`.
    Nothing,
    Builtin { builtin: Builtin, args: Vec<String> },
    External(ParsedCommand),
}
