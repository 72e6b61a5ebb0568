use std::io;
use thiserror::Error;

/// Failures while driving the controlling terminal.
#[derive(Debug, Error)]
pub enum TermError {
    #[error("cannot open controlling terminal: {0}")]
    Open(#[source] io::Error),

    #[error("cannot change terminal attributes: {0}")]
    Attributes(#[from] nix::Error),

    #[error("terminal window size is unavailable")]
    NoGeometry,

    #[error("malformed cursor position report")]
    CursorReport,

    #[error("terminal too small: {rows} rows leave no room for entries")]
    TooSmall { rows: u16 },

    #[error(transparent)]
    Io(#[from] io::Error),
}
