use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ShellError>;

/// Everything that can go wrong while classifying or dispatching a line.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("input line is not valid UTF-8; line ignored")]
    InvalidEncoding,

    #[error("syntax error: expected filename after '{operator}'")]
    MissingFilename { operator: String },

    /// A redirection target could not be opened. `direction` is `input` or `output`.
    #[error("cannot open {path} for {direction}")]
    Redirect {
        path: String,
        direction: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("{}: {}", .program, launch_reason(.source))]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("background job table is full ({capacity} jobs)")]
    JobTableFull { capacity: usize },

    #[error("cd: {path}: {source}")]
    ChangeDir {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("cd: HOME not set")]
    HomeNotSet,

    #[error("invalid value for {key}: {value}")]
    Config { key: &'static str, value: String },

    #[error("cannot install {signal} disposition: {source}")]
    Signal {
        signal: &'static str,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// `io::Error`'s own Display appends "(os error N)", which the user never sees from a shell.
fn launch_reason(err: &io::Error) -> String {
    match err.kind() {
        io::ErrorKind::NotFound => "No such file or directory".to_string(),
        io::ErrorKind::PermissionDenied => "Permission denied".to_string(),
        _ => err.to_string(),
    }
}
