//! Error taxonomy shared by the record store, the record types and the
//! relationship layer.
//!
//! Every variant except [`TrackerError::Interrupted`] is recoverable: the shell
//! prints it and returns to the menu.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::models::{Field, RecordKind};

/// What a [`TrackerError::NotFound`] failed to find
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Missing {
    /// The backing file of a store
    File(PathBuf),
    /// A record id
    Id(String),
    /// A record whose field contains the given value
    FieldValue { field: Field, value: String },
}

impl fmt::Display for Missing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Missing::File(path) => write!(f, "file {}", path.display()),
            Missing::Id(id) => write!(f, "id {}", id),
            Missing::FieldValue { field, value } => write!(f, "{} = {}", field, value),
        }
    }
}

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("No {kind} found for {missing}. Choose option 3 to add some")]
    NotFound { kind: RecordKind, missing: Missing },

    #[error("The file for your {kind}s is empty ({}). Choose option 3 to add some", path.display())]
    Empty { kind: RecordKind, path: PathBuf },

    #[error("There are no {kind}s to save")]
    NothingToSave { kind: RecordKind },

    #[error("Task(s) {incoming:?} already linked to this project. task list = {current:?}")]
    DuplicateLink {
        incoming: Vec<String>,
        current: Vec<String>,
    },

    #[error("Task {task_id} is already used in project {project_id}")]
    TaskAlreadyLinked { task_id: String, project_id: String },

    #[error("The update was cancelled")]
    UpdateCancelled,

    #[error("Invalid deadline '{value}': {reason}")]
    InvalidDeadline { value: String, reason: String },

    #[error("The property '{name}' does not exist in the {kind}")]
    UnknownField { kind: RecordKind, name: String },

    #[error("The property '{field}' cannot be updated directly: {hint}")]
    ReadOnlyField { field: Field, hint: String },

    #[error("Malformed {kind} record: {message}")]
    MalformedRecord { kind: RecordKind, message: String },

    /// End of the prompt stream
    #[error("Input closed")]
    Interrupted,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl TrackerError {
    /// True for the "nothing there yet" conditions creation flows start from
    pub fn is_absent(&self) -> bool {
        matches!(
            self,
            TrackerError::Empty { .. }
                | TrackerError::NotFound {
                    missing: Missing::File(_),
                    ..
                }
        )
    }
}

pub type Result<T> = std::result::Result<T, TrackerError>;
