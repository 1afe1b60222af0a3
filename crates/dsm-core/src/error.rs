use std::fmt;
use std::path::PathBuf;

/// Machine-readable error codes for scripted callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    InvalidSize,
    SizeTooLarge,
    IndexOutOfRange,
    AsymmetricMatrix,
    NonReflexive,
    LabelCountMismatch,
    InputReadFailed,
    InputParseError,
    MissingSize,
    ConfigParseError,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::InvalidSize => "E1001",
            Self::SizeTooLarge => "E1003",
            Self::IndexOutOfRange => "E1002",
            Self::AsymmetricMatrix => "E2001",
            Self::NonReflexive => "E2002",
            Self::LabelCountMismatch => "E2003",
            Self::InputReadFailed => "E3001",
            Self::InputParseError => "E3002",
            Self::MissingSize => "E3003",
            Self::ConfigParseError => "E4001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::InvalidSize => "Matrix size must be positive",
            Self::SizeTooLarge => "Matrix size exceeds the node limit",
            Self::IndexOutOfRange => "Node index out of range",
            Self::AsymmetricMatrix => "Matrix is not symmetric",
            Self::NonReflexive => "Matrix diagonal is incomplete",
            Self::LabelCountMismatch => "Label count does not match matrix size",
            Self::InputReadFailed => "Relation list could not be read",
            Self::InputParseError => "Relation list parse error",
            Self::MissingSize => "Matrix size not specified",
            Self::ConfigParseError => "Config file parse error",
        }
    }

    /// Optional remediation hint surfaced next to the error.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::InvalidSize => Some("Use a size of at least 1."),
            Self::SizeTooLarge => Some("Split the system into smaller matrices."),
            Self::IndexOutOfRange => {
                Some("Node indices are zero-based and must be smaller than the matrix size.")
            }
            Self::AsymmetricMatrix => {
                Some("Symmetrize the matrix before validating, or drop --no-symmetrize.")
            }
            Self::NonReflexive => Some("Every node must be related to itself."),
            Self::LabelCountMismatch => Some("Provide exactly one label per node."),
            Self::InputReadFailed => Some("Check the input path and read permissions."),
            Self::InputParseError => {
                Some("Write one relation per line as `<i> <j>`; `#` starts a comment.")
            }
            Self::MissingSize => Some("Add a `size N` line to the input or pass --size."),
            Self::ConfigParseError => Some("Fix syntax in dsm.toml and retry."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Invariant violations raised by [`crate::matrix::RelationMatrix`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatrixError {
    /// The requested matrix size is not positive.
    #[error("invalid matrix size {size}: size must be at least 1")]
    InvalidSize { size: i64 },

    /// The requested matrix has more nodes than [`crate::matrix::MAX_SIZE`].
    #[error("matrix size {size} exceeds the limit of {max} nodes")]
    SizeTooLarge { size: usize, max: usize },

    /// A declared or queried pair references a node outside `[0, size)`.
    #[error("relation ({i}, {j}) is out of range for a {size}x{size} matrix")]
    IndexOutOfRange { i: i64, j: i64, size: usize },

    /// `M[i][j] != M[j][i]` for the reported pair.
    #[error("matrix is not symmetric: M[{i}][{j}] != M[{j}][{i}]")]
    AsymmetricMatrix { i: usize, j: usize },

    /// Diagonal entry `M[index][index]` is false.
    #[error("matrix is not reflexive: M[{index}][{index}] is unset")]
    NonReflexive { index: usize },

    /// A label list does not have one entry per node.
    #[error("expected {expected} labels, got {actual}")]
    LabelCountMismatch { expected: usize, actual: usize },
}

impl MatrixError {
    /// The stable [`ErrorCode`] for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidSize { .. } => ErrorCode::InvalidSize,
            Self::SizeTooLarge { .. } => ErrorCode::SizeTooLarge,
            Self::IndexOutOfRange { .. } => ErrorCode::IndexOutOfRange,
            Self::AsymmetricMatrix { .. } => ErrorCode::AsymmetricMatrix,
            Self::NonReflexive { .. } => ErrorCode::NonReflexive,
            Self::LabelCountMismatch { .. } => ErrorCode::LabelCountMismatch,
        }
    }
}

/// Errors from loading a relation list.
#[derive(Debug, thiserror::Error)]
pub enum RelationsError {
    /// The input file or stream could not be read.
    #[error("failed to read relation list {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A plain-text line could not be parsed.
    #[error("line {line}: {reason}")]
    Parse { line: usize, reason: String },

    /// A TOML document did not match the relation list schema.
    #[error("invalid TOML relation list: {0}")]
    Toml(#[from] toml::de::Error),

    /// A JSON document did not match the relation list schema.
    #[error("invalid JSON relation list: {0}")]
    Json(#[from] serde_json::Error),

    /// Neither the input nor the caller supplied a matrix size.
    #[error("relation list does not declare a size and none was given")]
    MissingSize,

    /// Building the matrix from the loaded list failed.
    #[error(transparent)]
    Matrix(#[from] MatrixError),
}

impl RelationsError {
    /// The stable [`ErrorCode`] for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Read { .. } => ErrorCode::InputReadFailed,
            Self::Parse { .. } | Self::Toml(_) | Self::Json(_) => ErrorCode::InputParseError,
            Self::MissingSize => ErrorCode::MissingSize,
            Self::Matrix(inner) => inner.code(),
        }
    }
}
