use thiserror::Error;

/// Result type for reconciliation operations
pub type Result<T> = std::result::Result<T, ReconcileError>;

/// Kind of entity an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    KeyImage,
    Output,
    Transaction,
    Block,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::KeyImage => write!(f, "key image"),
            EntityKind::Output => write!(f, "output"),
            EntityKind::Transaction => write!(f, "transaction"),
            EntityKind::Block => write!(f, "block"),
        }
    }
}

fn handle_suffix(id: &Option<String>) -> String {
    id.as_ref().map(|id| format!(" ({})", id)).unwrap_or_default()
}

/// Error types for merging and loading entity fragments
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// Attempted to merge with an absent fragment (or a handle that addresses nothing)
    #[error("Cannot merge with an absent {kind}{}", handle_suffix(.id))]
    NullMerge { kind: EntityKind, id: Option<String> },

    /// An identity-bearing merge was attempted on an entity without identity
    #[error("Missing identity on {kind}: {detail}")]
    MissingIdentity { kind: EntityKind, detail: String },

    /// An output with no owning transaction was asked to merge into another output's owner
    #[error("Output {0} has no owning transaction to merge into")]
    MissingOwner(String),

    /// Two known observations disagree under a policy that does not tolerate it
    #[error("Conflicting observations for {field}: {left} != {right}")]
    ReconciliationConflict {
        field: &'static str,
        left: String,
        right: String,
    },

    /// JSON encoding/decoding error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Hex decoding error
    #[error("Hex decode error: {0}")]
    HexError(#[from] hex::FromHexError),

    /// I/O error while reading fragment documents
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ReconcileError {
    /// Shorthand for an absent entity behind a handle
    pub fn null_merge(kind: EntityKind, id: impl std::fmt::Display) -> Self {
        ReconcileError::NullMerge {
            kind,
            id: Some(id.to_string()),
        }
    }

    /// Whether this error classifies as a merge failure rather than a load failure
    pub fn is_merge_error(&self) -> bool {
        matches!(
            self,
            ReconcileError::NullMerge { .. }
                | ReconcileError::MissingIdentity { .. }
                | ReconcileError::MissingOwner(_)
                | ReconcileError::ReconciliationConflict { .. }
        )
    }
}
