/// Error types for STL loading
use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for stlmesh-core operations
pub type Result<T> = std::result::Result<T, StlError>;

/// Coarse failure category a caller can branch on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The bytes could not be obtained: missing file, short read, allocation failure
    Io,
    /// The ASCII grammar was violated
    Parse,
}

/// Section of a binary file that ended early
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Header,
    TriangleCount,
    Record { index: u32, declared: u32 },
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Section::Header => f.write_str("80-byte header"),
            Section::TriangleCount => f.write_str("triangle count"),
            Section::Record { index, declared } => {
                write!(f, "record {} of {} declared", index + 1, declared)
            }
        }
    }
}

/// What the ASCII parser expected and did not get
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseErrorKind {
    #[error("missing 'solid' header line")]
    MissingHeader,

    #[error("expected '{expected}', found '{found}'")]
    UnexpectedToken {
        expected: &'static str,
        found: String,
    },

    #[error("expected '{expected}', found end of input")]
    UnexpectedEof { expected: &'static str },

    #[error("invalid {field}: '{found}'")]
    InvalidNumber { field: &'static str, found: String },
}

/// Error types for STL operations
#[derive(Debug, Error)]
pub enum StlError {
    /// Opening or reading the file failed
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Reading from a caller-supplied byte source failed
    #[error("IO error: {0}")]
    Read(#[from] io::Error),

    /// Binary data ended before the declared content
    #[error("binary STL truncated in {section}")]
    Truncated { section: Section },

    /// Triangle storage could not be grown
    #[error("cannot allocate storage for {triangles} triangles")]
    Allocation { triangles: usize },

    /// ASCII grammar violation at a 1-based line
    #[error("ASCII STL parse error at line {line}: {kind}")]
    Parse { line: usize, kind: ParseErrorKind },
}

impl StlError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StlError::Parse { .. } => ErrorKind::Parse,
            StlError::Io { .. }
            | StlError::Read(_)
            | StlError::Truncated { .. }
            | StlError::Allocation { .. } => ErrorKind::Io,
        }
    }

    /// Attach the file path to a bare read error
    pub(crate) fn with_path(self, path: &std::path::Path) -> Self {
        match self {
            StlError::Read(source) => StlError::Io {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        }
    }
}
