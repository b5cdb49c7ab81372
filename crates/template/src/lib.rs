pub mod attrs;
pub mod cache;
pub mod component;
pub mod config;
pub mod context;
pub mod dom;
pub mod reactive;
pub mod render;
pub mod skeleton;
pub mod snapshot;
pub mod traverse;
pub mod value;

mod entities;
mod error;
mod parser;
mod tokenizer;
mod types;

pub use crate::attrs::{AttrRule, AttributePolicy, Matcher, Target};
pub use crate::cache::{CacheStats, Strings, Template, TemplateCache};
pub use crate::component::ComponentRegistry;
pub use crate::config::{NameSet, TemplateConfig};
pub use crate::context::Context;
pub use crate::dom::{Dom, Namespace, NodeKind};
pub use crate::error::{ParseError, ParseErrorKind, TemplateError};
pub use crate::parser::parse;
pub use crate::reactive::{Runtime, StaticRuntime};
pub use crate::render::{Html, HtmlBuilder};
pub use crate::snapshot::{AstSnapshot, token_lines};
pub use crate::tokenizer::tokenize;
pub use crate::types::{
    AttrPart, Element, Node, Prop, Quote, ROOT_SLOT, Root, SourcePos, Token, TokenKind,
};
pub use crate::value::{Event, MaybeReactive, Props, Value};

/// Tokenizes and parses the static segments of a literal with `config`'s
/// raw-text and void element sets.
pub fn parse_template(segments: &[&str], config: &TemplateConfig) -> Result<Root, ParseError> {
    let tokens = tokenize(segments, &config.raw_text_elements);
    parse(&tokens, &config.void_elements)
}
