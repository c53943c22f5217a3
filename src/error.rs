use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum UschedError {
    #[error("no quantum given: pass -q/--quantum or set USPS_QUANTUM_MSEC")]
    MissingQuantum,

    #[error("invalid quantum {0:?}: expected a positive number of milliseconds")]
    InvalidQuantum(String),

    #[error("cannot open commands file {path}: {source}")]
    InputOpen {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("empty command line")]
    EmptyCommand,

    #[error("command `{0}` contains an interior NUL byte")]
    InvalidCommand(String),

    #[error("cannot launch `{command}`: {source}")]
    Launch {
        command: String,
        source: std::io::Error,
    },

    #[error("signal delivery to pid {pid} failed: {source}")]
    Signal { pid: i32, source: nix::Error },

    #[error("interrupted before all jobs completed")]
    Interrupted,

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, UschedError>;
