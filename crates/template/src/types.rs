//! Token and AST model shared by the tokenizer, parser and renderer.
//!
//! Invariants:
//! - Hole indices are zero-based positions into the call's values, in source order.
//! - Element props keep source order; anything after a `Spread` overrides it.
//! - The AST is DOM-agnostic. Materialized skeletons live in the cache entry and
//!   are referenced through `slot` indices.
use std::fmt;
use std::rc::Rc;

/// Slot of the root container inside a cache entry.
pub const ROOT_SLOT: usize = 0;

/// Attribute value quote character as written in the literal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Quote {
    Single,
    Double,
}

impl Quote {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            b'\'' => Some(Quote::Single),
            b'"' => Some(Quote::Double),
            _ => None,
        }
    }

    pub fn as_byte(self) -> u8 {
        match self {
            Quote::Single => b'\'',
            Quote::Double => b'"',
        }
    }

    pub fn as_char(self) -> char {
        self.as_byte() as char
    }
}

/// Position of a token inside the literal: which static segment, and the byte
/// offset inside that segment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SourcePos {
    pub segment: usize,
    pub offset: usize,
}

impl SourcePos {
    pub fn new(segment: usize, offset: usize) -> Self {
        Self { segment, offset }
    }
}

impl fmt::Display for SourcePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "segment {} offset {}", self.segment, self.offset)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenKind {
    OpenAngle,
    CloseAngle,
    Slash,
    Ident(String),
    Equals,
    /// Attribute value fragment, either inside quotes or an unquoted run.
    Fragment(String),
    Text(String),
    Hole(usize),
    /// A hole written inside `<!-- -->`. It keeps its index but binds nothing.
    CommentHole(usize),
    Quote(Quote),
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::OpenAngle => f.write_str("`<`"),
            TokenKind::CloseAngle => f.write_str("`>`"),
            TokenKind::Slash => f.write_str("`/`"),
            TokenKind::Ident(name) => write!(f, "identifier `{name}`"),
            TokenKind::Equals => f.write_str("`=`"),
            TokenKind::Fragment(value) => write!(f, "attribute value `{value}`"),
            TokenKind::Text(text) => write!(f, "text {text:?}"),
            TokenKind::Hole(index) => write!(f, "expression ${{{index}}}"),
            TokenKind::CommentHole(index) => write!(f, "commented expression ${{{index}}}"),
            TokenKind::Quote(quote) => write!(f, "quote `{}`", quote.as_char()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub at: SourcePos,
}

/// Parsed template.
#[derive(Debug, PartialEq)]
pub struct Root {
    pub children: Vec<Node>,
    /// Number of container slots: the root plus every capitalized element.
    pub slot_count: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Text(String),
    Expr(usize),
    Element(Rc<Element>),
}

#[derive(Debug, PartialEq)]
pub struct Element {
    /// Tag name as written.
    pub name: String,
    pub props: Vec<Prop>,
    pub children: Vec<Node>,
    pub svg: bool,
    /// Container slot, assigned to capitalized (component-like) tags only.
    pub slot: Option<usize>,
}

impl Element {
    pub fn is_capitalized(&self) -> bool {
        self.name
            .as_bytes()
            .first()
            .is_some_and(|b| b.is_ascii_uppercase())
    }

    /// Whether a spread appears before `index` in the prop list.
    pub fn spread_before(&self, index: usize) -> bool {
        self.props[..index]
            .iter()
            .any(|prop| matches!(prop, Prop::Spread { .. }))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Prop {
    Boolean {
        name: String,
    },
    Static {
        name: String,
        value: String,
        quote: Option<Quote>,
    },
    Expr {
        name: String,
        index: usize,
        quote: Option<Quote>,
    },
    Spread {
        index: usize,
    },
    Mixed {
        name: String,
        parts: Vec<AttrPart>,
        quote: Option<Quote>,
    },
}

impl Prop {
    pub fn name(&self) -> Option<&str> {
        match self {
            Prop::Boolean { name }
            | Prop::Static { name, .. }
            | Prop::Expr { name, .. }
            | Prop::Mixed { name, .. } => Some(name),
            Prop::Spread { .. } => None,
        }
    }

    /// Boolean and static props carry no hole and may be applied ahead of time.
    pub fn is_static(&self) -> bool {
        matches!(self, Prop::Boolean { .. } | Prop::Static { .. })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttrPart {
    Text(String),
    Hole(usize),
}
