//! Error and warning types shared by the parser (C1-C4) and the graph store (C5-C11).

use std::fmt;

/// Errors that can occur while tokenizing or assembling a GEDCOM record tree.
///
/// These are the "Fatal" and "Operation-level" categories from the error
/// handling design for the parsing subsystem; anything recoverable is
/// reported as a [`GedcomWarning`] instead.
#[derive(Debug)]
pub enum GedcomError {
    /// The physical line exceeded the 1 MiB maximum line length.
    LineTooLong {
        /// The line number where the error occurred.
        line: u32,
    },
    /// A line's level field was not a run of decimal digits.
    MalformedLine {
        /// The line number where the error occurred.
        line: u32,
        /// The raw text of the offending line.
        text: String,
    },
    /// An invalid or unrecognized GEDCOM tag was encountered in strict mode.
    InvalidTag {
        /// The line number where the error occurred.
        line: u32,
        /// The invalid tag that was encountered.
        tag: String,
    },
    /// An invalid token was encountered.
    InvalidToken {
        /// The line number where the error occurred.
        line: u32,
        /// The invalid token that was encountered.
        token: String,
    },
    /// An unexpected GEDCOM level number.
    UnexpectedLevel {
        /// The line number where the error occurred.
        line: u32,
        /// The level that was expected for the current line, based on its parent's level.
        expected: u8,
        /// The actual level found on the current line.
        found: String,
    },
    /// A required value for a GEDCOM tag is missing.
    ExpectedValue {
        /// The line number where the error occurred.
        line: u32,
        /// The tag for which the required value is missing.
        tag: String,
    },
    /// A value associated with a GEDCOM tag has an invalid format.
    InvalidValueFormat {
        /// The line number where the error occurred.
        line: u32,
        /// The tag whose value has an invalid format.
        tag: String,
        /// The value that was found with an invalid format.
        value: String,
    },
    /// An I/O error reading the source stream.
    Io(String),
    /// A duplicate xref was encountered in strict mode.
    DuplicateXref {
        /// The line number where the error occurred.
        line: u32,
        /// The xref that was already in use.
        xref: String,
    },
}

impl fmt::Display for GedcomError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            GedcomError::LineTooLong { line } => {
                write!(f, "line {line}: line exceeds maximum length of 1 MiB")
            }
            GedcomError::MalformedLine { line, text } => {
                write!(f, "line {line}: malformed line: {text:?}")
            }
            GedcomError::InvalidTag { line, tag } => {
                write!(f, "line {line}: invalid tag: {tag}")
            }
            GedcomError::InvalidToken { line, token } => {
                write!(f, "line {line}: invalid token: {token}")
            }
            GedcomError::UnexpectedLevel {
                line,
                expected,
                found,
            } => write!(
                f,
                "line {line}: unexpected level: expected {expected}, found {found}"
            ),
            GedcomError::ExpectedValue { line, tag } => {
                write!(f, "line {line}: expected a value for tag {tag}")
            }
            GedcomError::InvalidValueFormat { line, tag, value } => {
                write!(f, "line {line}: invalid value format for {tag}: {value}")
            }
            GedcomError::Io(msg) => write!(f, "I/O error: {msg}"),
            GedcomError::DuplicateXref { line, xref } => {
                write!(f, "line {line}: duplicate xref: {xref}")
            }
        }
    }
}

impl std::error::Error for GedcomError {}

impl From<std::io::Error> for GedcomError {
    fn from(err: std::io::Error) -> Self {
        GedcomError::Io(err.to_string())
    }
}

/// The non-fatal issues a parse can produce without aborting, per the error
/// handling design's "collected / warnings" category.
#[derive(Debug, Clone, PartialEq)]
pub enum WarningKind {
    /// A line nested more than one level below its parent; reattached to the
    /// deepest feasible ancestor.
    HierarchyGap {
        /// The level actually found.
        found: u8,
        /// The deepest level it could be legally attached under.
        attached_at: u8,
    },
    /// A tag this parser doesn't recognize.
    UnrecognizedTag {
        /// The unrecognized tag.
        tag: String,
    },
    /// Same as [`WarningKind::UnrecognizedTag`], raised from a strict-mode
    /// call site via `handle_invalid_tag`.
    InvalidTag {
        /// The invalid tag.
        tag: String,
    },
    /// A tag was present with no value where one was expected.
    ExpectedValue {
        /// The tag that was missing a value.
        tag: String,
    },
    /// An xref was reused; the later record wins.
    DuplicateXref {
        /// The reused xref.
        xref: String,
    },
    /// An edge's target xref does not resolve to any known node; the edge is
    /// dropped (see spec.md §9 open question: emit-and-drop, consistently).
    DanglingReference {
        /// The xref that failed to resolve.
        xref: String,
        /// The kind of edge that referenced it.
        edge_type: String,
    },
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            WarningKind::HierarchyGap {
                found,
                attached_at,
            } => write!(
                f,
                "hierarchy gap: level {found} reattached under level {attached_at}"
            ),
            WarningKind::UnrecognizedTag { tag } => write!(f, "unrecognized tag: {tag}"),
            WarningKind::InvalidTag { tag } => write!(f, "invalid tag: {tag}"),
            WarningKind::ExpectedValue { tag } => write!(f, "expected a value for tag {tag}"),
            WarningKind::DuplicateXref { xref } => write!(f, "duplicate xref: {xref}"),
            WarningKind::DanglingReference { xref, edge_type } => {
                write!(f, "dangling {edge_type} reference: {xref}")
            }
        }
    }
}

/// A single collected, non-fatal parse or build issue.
#[derive(Debug, Clone, PartialEq)]
pub struct GedcomWarning {
    /// The line number the warning originated from (0 if not line-based).
    pub line: u32,
    /// The specific kind of warning.
    pub kind: WarningKind,
}

impl GedcomWarning {
    /// Creates a new warning.
    #[must_use]
    pub fn new(line: u32, kind: WarningKind) -> Self {
        GedcomWarning { line, kind }
    }
}

impl fmt::Display for GedcomWarning {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.kind)
    }
}

/// An ordered collection of warnings accumulated during parsing or building.
///
/// The parser and builder never abort on these; they collect them here and
/// return them alongside the successful result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorList(pub Vec<GedcomWarning>);

impl ErrorList {
    /// Creates an empty error list.
    #[must_use]
    pub fn new() -> Self {
        ErrorList(Vec::new())
    }

    /// Appends a warning.
    pub fn push(&mut self, warning: GedcomWarning) {
        self.0.push(warning);
    }

    /// Merges another list's warnings into this one, preserving order.
    pub fn extend(&mut self, other: ErrorList) {
        self.0.extend(other.0);
    }

    /// True if no warnings were collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of warnings collected.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates the collected warnings.
    pub fn iter(&self) -> std::slice::Iter<'_, GedcomWarning> {
        self.0.iter()
    }
}

/// Wraps a parsed value together with any warnings accumulated while
/// producing it.
#[derive(Debug, Clone)]
pub struct ParseResult<T> {
    /// The parsed value.
    pub data: T,
    /// Warnings collected while parsing `data`.
    pub warnings: ErrorList,
}

impl<T> ParseResult<T> {
    /// Wraps a value with no warnings.
    #[must_use]
    pub fn new(data: T) -> Self {
        ParseResult {
            data,
            warnings: ErrorList::new(),
        }
    }

    /// Wraps a value together with a list of warnings collected for it.
    #[must_use]
    pub fn with_warnings(data: T, warnings: Vec<GedcomWarning>) -> Self {
        ParseResult {
            data,
            warnings: ErrorList(warnings),
        }
    }
}

/// Errors produced by the graph store and query engine (C5-C11).
///
/// Operation-level errors are returned directly to the caller rather than
/// collected, per the error handling design.
#[derive(Debug)]
pub enum GraphError {
    /// A requested node does not exist.
    NodeNotFound {
        /// The xref that was looked up.
        xref: String,
    },
    /// A requested edge does not exist.
    EdgeNotFound {
        /// The edge id that was looked up.
        id: String,
    },
    /// No path exists between the requested endpoints.
    NoPath {
        /// The starting xref.
        from: String,
        /// The target xref.
        to: String,
    },
    /// An `AddNode`/`AddEdge` call collided with an existing entity.
    AlreadyExists {
        /// A description of the colliding entity.
        what: String,
    },
    /// An incremental mutation would violate a graph invariant.
    InvariantViolation {
        /// A description of the violated invariant.
        what: String,
    },
    /// The relational or KV store could not be opened or initialized.
    StoreInitError(String),
    /// An I/O error against the relational or KV store.
    IoError(String),
    /// A KV record's version prefix didn't match what this build understands.
    StoreVersionMismatch {
        /// The version byte found on disk.
        found: u8,
        /// The version this build expects.
        expected: u8,
    },
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            GraphError::NodeNotFound { xref } => write!(f, "node not found: {xref}"),
            GraphError::EdgeNotFound { id } => write!(f, "edge not found: {id}"),
            GraphError::NoPath { from, to } => write!(f, "no path from {from} to {to}"),
            GraphError::AlreadyExists { what } => write!(f, "already exists: {what}"),
            GraphError::InvariantViolation { what } => write!(f, "invariant violation: {what}"),
            GraphError::StoreInitError(msg) => write!(f, "store init error: {msg}"),
            GraphError::IoError(msg) => write!(f, "store I/O error: {msg}"),
            GraphError::StoreVersionMismatch { found, expected } => write!(
                f,
                "store version mismatch: found {found}, expected {expected}"
            ),
        }
    }
}

impl std::error::Error for GraphError {}

impl From<std::io::Error> for GraphError {
    fn from(err: std::io::Error) -> Self {
        GraphError::IoError(err.to_string())
    }
}

#[cfg(feature = "hybrid")]
impl From<rusqlite::Error> for GraphError {
    fn from(err: rusqlite::Error) -> Self {
        GraphError::StoreInitError(err.to_string())
    }
}

#[cfg(feature = "hybrid")]
impl From<sled::Error> for GraphError {
    fn from(err: sled::Error) -> Self {
        GraphError::StoreInitError(err.to_string())
    }
}
