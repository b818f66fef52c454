use std::fmt;
use std::ops::Range;

use thiserror::Error;

/// A line/column pair. Lines start at 1; the column counts the characters
/// consumed on the current line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Parse failed at {pos}: {message}")]
pub struct ParseError {
    pub pos: Position,
    /// Byte range of the offending token in the source.
    pub span: Range<usize>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("parameter {callee} not found in {function}")]
    ParameterNotFound { function: String, callee: String },

    #[error("no statements put away in {function}")]
    EmptyStatementStack { function: String },
}
