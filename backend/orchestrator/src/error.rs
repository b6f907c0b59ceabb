use thiserror::Error;

use labelcheck_core::{CheckError, CheckState, ErrorKind};

/// Why a submission was not started.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SubmitError {
    /// A check is already uploading or analyzing.
    #[error("a check is already in progress ({state})")]
    Busy { state: CheckState },
}

/// Why a report export could not be produced.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExportError {
    /// Only completed sessions can be exported.
    #[error("no completed check to export (state: {state})")]
    NotReady { state: CheckState },

    /// The remote export call failed; `message` is user-facing.
    #[error("{message}")]
    Failed {
        kind: ErrorKind,
        message: String,
        #[source]
        source: CheckError,
    },
}
