//! Structural and compile errors.
//!
//! Lexical problems never surface here; the tokenizer tolerates them. Every
//! variant carries enough context (tag names, source position) to locate the
//! offending literal.
use crate::types::SourcePos;
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// An element was still open at end of input.
    UnclosedElement { name: String },
    /// A named close tag did not match the innermost open element.
    MismatchedClose { expected: String, found: String },
    /// A named close tag with nothing open.
    StrayClose { name: String },
    /// `...` not directly followed by a hole.
    SpreadWithoutHole,
    /// A token that cannot start or continue the current construct.
    UnexpectedToken { found: String },
    /// Input ended inside a tag.
    UnexpectedEof,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub at: SourcePos,
}

impl ParseError {
    pub(crate) fn new(kind: ParseErrorKind, at: SourcePos) -> Self {
        Self { kind, at }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ParseErrorKind::UnclosedElement { name } => {
                write!(f, "unclosed element <{name}> opened at {}", self.at)
            }
            ParseErrorKind::MismatchedClose { expected, found } => write!(
                f,
                "mismatched close tag at {}: expected </{expected}>, found </{found}>",
                self.at
            ),
            ParseErrorKind::StrayClose { name } => {
                write!(f, "close tag </{name}> at {} has no open element", self.at)
            }
            ParseErrorKind::SpreadWithoutHole => {
                write!(f, "spread marker at {} is not followed by an expression", self.at)
            }
            ParseErrorKind::UnexpectedToken { found } => {
                write!(f, "unexpected {found} at {}", self.at)
            }
            ParseErrorKind::UnexpectedEof => {
                write!(f, "unexpected end of input inside a tag at {}", self.at)
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Failure to turn a literal into a renderable template.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TemplateError {
    Parse(ParseError),
    /// Capitalized tag with no registered component under strict mode.
    UnknownComponent { name: String },
    /// The call supplied a different number of values than the literal has holes.
    HoleCount { expected: usize, found: usize },
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateError::Parse(err) => write!(f, "template parse error: {err}"),
            TemplateError::UnknownComponent { name } => {
                write!(f, "no component registered for <{name}>")
            }
            TemplateError::HoleCount { expected, found } => write!(
                f,
                "template has {expected} holes but {found} values were supplied"
            ),
        }
    }
}

impl std::error::Error for TemplateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TemplateError::Parse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ParseError> for TemplateError {
    fn from(err: ParseError) -> Self {
        TemplateError::Parse(err)
    }
}
