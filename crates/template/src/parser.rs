//! Stack-based parser from tokens to the template AST.
//!
//! Contract:
//! - Single left-to-right pass; open elements live on an explicit stack, so
//!   nesting depth never touches the call stack.
//! - Fails on the first structural error and never returns a partial tree.
//!
//! Text policy:
//! - A whitespace-only text token is dropped when it touches a tag boundary:
//!   previous token absent or `>`, or next token absent or `<`. All other text,
//!   including whitespace between holes, is kept verbatim.
//! - Character references are decoded in text and static attribute values,
//!   except inside `script` and `style`.
//!
//! Tag policy:
//! - Void elements (lowercase names in the void set) are never pushed, and a
//!   close tag naming one is ignored.
//! - `<//>` closes the innermost element without checking its name.
//! - Close-tag names are compared exactly as written.
//! - `svg` and its descendants are flagged as SVG, except below `foreignObject`.
//! - Capitalized tags receive a container slot; the root owns `ROOT_SLOT`.
use crate::config::NameSet;
use crate::entities::decode_entities;
use crate::error::{ParseError, ParseErrorKind};
use crate::types::{AttrPart, Element, Node, Prop, Quote, ROOT_SLOT, Root, SourcePos, Token, TokenKind};
use std::rc::Rc;

const SPREAD_MARKER: &str = "...";
/// Name given to a bare hole written in attribute-name position with a value.
const DYNAMIC_NAME_FALLBACK: &str = "ref";

/// Parses a token stream into a `Root`.
///
/// `void` names the elements that never take children.
pub fn parse(tokens: &[Token], void: &NameSet) -> Result<Root, ParseError> {
    Parser::new(tokens, void).run()
}

#[derive(Debug)]
struct OpenElement {
    name: String,
    props: Vec<Prop>,
    children: Vec<Node>,
    svg: bool,
    slot: Option<usize>,
    at: SourcePos,
}

impl OpenElement {
    fn finish(self) -> Node {
        Node::Element(Rc::new(Element {
            name: self.name,
            props: self.props,
            children: self.children,
            svg: self.svg,
            slot: self.slot,
        }))
    }
}

enum TagEnd {
    Open,
    SelfClosing,
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    void: &'a NameSet,
    root: Vec<Node>,
    open: Vec<OpenElement>,
    next_slot: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token], void: &'a NameSet) -> Self {
        Self {
            tokens,
            pos: 0,
            void,
            root: Vec::new(),
            open: Vec::new(),
            next_slot: ROOT_SLOT + 1,
        }
    }

    fn run(mut self) -> Result<Root, ParseError> {
        while let Some(token) = self.tokens.get(self.pos) {
            match &token.kind {
                TokenKind::Text(text) => {
                    if self.keeps_text(self.pos, text) {
                        let text = if self.in_unescaped_text() {
                            text.clone()
                        } else {
                            decode_entities(text)
                        };
                        self.children_mut().push(Node::Text(text));
                    }
                    self.pos += 1;
                }
                TokenKind::Hole(index) => {
                    let index = *index;
                    self.children_mut().push(Node::Expr(index));
                    self.pos += 1;
                }
                TokenKind::CommentHole(index) => {
                    log::debug!(
                        target: "template.parser",
                        "expression ${{{index}}} inside a comment at {} is not bound",
                        token.at
                    );
                    self.pos += 1;
                }
                TokenKind::OpenAngle => self.tag()?,
                other => {
                    return Err(ParseError::new(
                        ParseErrorKind::UnexpectedToken {
                            found: other.to_string(),
                        },
                        token.at,
                    ));
                }
            }
        }

        if let Some(open) = self.open.pop() {
            return Err(ParseError::new(
                ParseErrorKind::UnclosedElement { name: open.name },
                open.at,
            ));
        }
        Ok(Root {
            children: self.root,
            slot_count: self.next_slot,
        })
    }

    fn keeps_text(&self, index: usize, text: &str) -> bool {
        if !text.trim().is_empty() {
            return true;
        }
        let prev = index
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|t| &t.kind);
        let next = self.tokens.get(index + 1).map(|t| &t.kind);
        let at_open_edge = matches!(prev, None | Some(TokenKind::CloseAngle));
        let at_close_edge = matches!(next, None | Some(TokenKind::OpenAngle));
        !(at_open_edge || at_close_edge)
    }

    fn in_unescaped_text(&self) -> bool {
        self.open.last().is_some_and(|open| {
            open.name.eq_ignore_ascii_case("script") || open.name.eq_ignore_ascii_case("style")
        })
    }

    fn children_mut(&mut self) -> &mut Vec<Node> {
        match self.open.last_mut() {
            Some(open) => &mut open.children,
            None => &mut self.root,
        }
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<&'a TokenKind> {
        self.peek().map(|t| &t.kind)
    }

    /// Position used for errors at end of input.
    fn eof_pos(&self) -> SourcePos {
        self.tokens.last().map(|t| t.at).unwrap_or_default()
    }

    fn bump(&mut self) -> Result<&'a Token, ParseError> {
        match self.tokens.get(self.pos) {
            Some(token) => {
                self.pos += 1;
                Ok(token)
            }
            None => Err(ParseError::new(ParseErrorKind::UnexpectedEof, self.eof_pos())),
        }
    }

    fn unexpected(token: &Token) -> ParseError {
        ParseError::new(
            ParseErrorKind::UnexpectedToken {
                found: token.kind.to_string(),
            },
            token.at,
        )
    }

    fn tag(&mut self) -> Result<(), ParseError> {
        let open_angle = self.bump()?;
        let next = self.bump()?;
        match &next.kind {
            TokenKind::Slash => self.close_tag(open_angle.at),
            TokenKind::Ident(name) => self.open_tag(name, open_angle.at),
            _ => Err(Self::unexpected(next)),
        }
    }

    fn close_tag(&mut self, at: SourcePos) -> Result<(), ParseError> {
        let token = self.bump()?;
        match &token.kind {
            TokenKind::Slash => {
                self.expect_close_angle()?;
                let Some(open) = self.open.pop() else {
                    return Err(ParseError::new(
                        ParseErrorKind::StrayClose {
                            name: "/".to_string(),
                        },
                        at,
                    ));
                };
                let node = open.finish();
                self.children_mut().push(node);
                Ok(())
            }
            TokenKind::Ident(name) => {
                self.expect_close_angle()?;
                if self.is_void(name) {
                    log::debug!(
                        target: "template.parser",
                        "ignoring close tag for void element </{name}> at {at}"
                    );
                    return Ok(());
                }
                let Some(open) = self.open.last() else {
                    return Err(ParseError::new(
                        ParseErrorKind::StrayClose { name: name.clone() },
                        at,
                    ));
                };
                if open.name != *name {
                    return Err(ParseError::new(
                        ParseErrorKind::MismatchedClose {
                            expected: open.name.clone(),
                            found: name.clone(),
                        },
                        at,
                    ));
                }
                if let Some(open) = self.open.pop() {
                    let node = open.finish();
                    self.children_mut().push(node);
                }
                Ok(())
            }
            _ => Err(Self::unexpected(token)),
        }
    }

    fn expect_close_angle(&mut self) -> Result<(), ParseError> {
        let token = self.bump()?;
        match token.kind {
            TokenKind::CloseAngle => Ok(()),
            _ => Err(Self::unexpected(token)),
        }
    }

    fn is_void(&self, name: &str) -> bool {
        // Capitalized names are components and may take children.
        !name.as_bytes().first().is_some_and(u8::is_ascii_uppercase) && self.void.contains(name)
    }

    fn open_tag(&mut self, name: &str, at: SourcePos) -> Result<(), ParseError> {
        let (props, end) = self.attributes()?;

        let svg = name == "svg"
            || self
                .open
                .last()
                .is_some_and(|parent| parent.svg && parent.name != "foreignObject");
        let slot = if name.as_bytes().first().is_some_and(u8::is_ascii_uppercase) {
            let slot = self.next_slot;
            self.next_slot += 1;
            Some(slot)
        } else {
            None
        };
        let element = OpenElement {
            name: name.to_string(),
            props,
            children: Vec::new(),
            svg,
            slot,
            at,
        };

        if matches!(end, TagEnd::SelfClosing) || self.is_void(name) {
            let node = element.finish();
            self.children_mut().push(node);
        } else {
            self.open.push(element);
        }
        Ok(())
    }

    fn attributes(&mut self) -> Result<(Vec<Prop>, TagEnd), ParseError> {
        let mut props = Vec::new();
        loop {
            let token = self.bump()?;
            match &token.kind {
                TokenKind::CloseAngle => return Ok((props, TagEnd::Open)),
                TokenKind::Slash => {
                    if matches!(self.peek_kind(), Some(TokenKind::CloseAngle)) {
                        self.pos += 1;
                        return Ok((props, TagEnd::SelfClosing));
                    }
                }
                TokenKind::Equals => {}
                TokenKind::Ident(name) if name == SPREAD_MARKER => match self.peek_kind() {
                    Some(TokenKind::Hole(index)) => {
                        self.pos += 1;
                        props.push(Prop::Spread { index: *index });
                    }
                    _ => {
                        return Err(ParseError::new(ParseErrorKind::SpreadWithoutHole, token.at));
                    }
                },
                TokenKind::Ident(name) => {
                    if matches!(self.peek_kind(), Some(TokenKind::Equals)) {
                        self.skip_equals();
                        props.push(self.attribute_value(name)?);
                    } else {
                        props.push(Prop::Boolean { name: name.clone() });
                    }
                }
                TokenKind::Hole(index) => {
                    if matches!(self.peek_kind(), Some(TokenKind::Equals)) {
                        self.skip_equals();
                        let discarded = self.attribute_value(DYNAMIC_NAME_FALLBACK)?;
                        log::warn!(
                            target: "template.parser",
                            "dynamic attribute name at {} is bound as `{DYNAMIC_NAME_FALLBACK}`; value {discarded:?} discarded",
                            token.at
                        );
                        props.push(Prop::Expr {
                            name: DYNAMIC_NAME_FALLBACK.to_string(),
                            index: *index,
                            quote: None,
                        });
                    } else {
                        props.push(Prop::Spread { index: *index });
                    }
                }
                TokenKind::Quote(quote) => {
                    let parts = self.quoted_parts(*quote)?;
                    log::warn!(
                        target: "template.parser",
                        "quoted value without a name at {} dropped: {parts:?}",
                        token.at
                    );
                }
                TokenKind::Fragment(_) => {}
                TokenKind::OpenAngle | TokenKind::Text(_) | TokenKind::CommentHole(_) => {
                    return Err(Self::unexpected(token));
                }
            }
        }
    }

    fn skip_equals(&mut self) {
        while matches!(self.peek_kind(), Some(TokenKind::Equals)) {
            self.pos += 1;
        }
    }

    /// Classifies the value following `name=`.
    fn attribute_value(&mut self, name: &str) -> Result<Prop, ParseError> {
        let name = name.to_string();
        let prop = match self.peek_kind() {
            Some(TokenKind::Quote(quote)) => {
                let quote = *quote;
                self.pos += 1;
                let parts = self.quoted_parts(quote)?;
                classify(name, parts, Some(quote))
            }
            Some(TokenKind::Ident(value)) => {
                let value = decode_entities(value);
                self.pos += 1;
                Prop::Static {
                    name,
                    value,
                    quote: None,
                }
            }
            Some(TokenKind::Hole(_) | TokenKind::Fragment(_)) => {
                let parts = self.unquoted_parts();
                classify(name, parts, None)
            }
            Some(_) => Prop::Static {
                name,
                value: String::new(),
                quote: None,
            },
            None => {
                return Err(ParseError::new(ParseErrorKind::UnexpectedEof, self.eof_pos()));
            }
        };
        Ok(prop)
    }

    /// Collects an unquoted value: a fragment or hole, then every fragment or
    /// hole that touches the previous piece with no gap in the source.
    fn unquoted_parts(&mut self) -> Vec<AttrPart> {
        let mut parts = Vec::new();
        let mut end: Option<SourcePos> = None;
        while let Some(token) = self.tokens.get(self.pos) {
            if end.is_some_and(|end| end != token.at) {
                break;
            }
            match &token.kind {
                TokenKind::Fragment(text) => {
                    parts.push(AttrPart::Text(text.clone()));
                    end = Some(SourcePos::new(token.at.segment, token.at.offset + text.len()));
                }
                // A hole at the end of segment `i` is followed by segment `i + 1`.
                TokenKind::Hole(index) => {
                    parts.push(AttrPart::Hole(*index));
                    end = Some(SourcePos::new(index + 1, 0));
                }
                _ => break,
            }
            self.pos += 1;
        }
        parts
    }

    /// Collects fragments and holes up to the closing `quote`.
    fn quoted_parts(&mut self, quote: Quote) -> Result<Vec<AttrPart>, ParseError> {
        let mut parts = Vec::new();
        loop {
            let token = self.bump()?;
            match &token.kind {
                TokenKind::Quote(q) if *q == quote => return Ok(parts),
                TokenKind::Fragment(text) => parts.push(AttrPart::Text(text.clone())),
                TokenKind::Hole(index) => parts.push(AttrPart::Hole(*index)),
                _ => return Err(Self::unexpected(token)),
            }
        }
    }
}

fn classify(name: String, parts: Vec<AttrPart>, quote: Option<Quote>) -> Prop {
    match parts.as_slice() {
        [] => Prop::Static {
            name,
            value: String::new(),
            quote,
        },
        [AttrPart::Text(text)] => Prop::Static {
            name,
            value: decode_entities(text),
            quote,
        },
        [AttrPart::Hole(index)] => Prop::Expr {
            name,
            index: *index,
            quote,
        },
        _ => Prop::Mixed {
            name,
            parts: parts
                .into_iter()
                .map(|part| match part {
                    AttrPart::Text(text) => AttrPart::Text(decode_entities(&text)),
                    hole => hole,
                })
                .collect(),
            quote,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::parse;
    use crate::config::{NameSet, RAW_TEXT_ELEMENTS, VOID_ELEMENTS};
    use crate::error::{ParseError, ParseErrorKind};
    use crate::tokenizer::tokenize;
    use crate::types::{AttrPart, Element, Node, Prop, Quote, Root};

    fn parse_segments(segments: &[&str]) -> Result<Root, ParseError> {
        let tokens = tokenize(segments, &NameSet::from_names(RAW_TEXT_ELEMENTS));
        parse(&tokens, &NameSet::from_names(VOID_ELEMENTS))
    }

    fn parse_ok(segments: &[&str]) -> Root {
        match parse_segments(segments) {
            Ok(root) => root,
            Err(err) => panic!("unexpected parse error for {segments:?}: {err}"),
        }
    }

    fn error_kind(segments: &[&str]) -> ParseErrorKind {
        match parse_segments(segments) {
            Ok(root) => panic!("expected an error for {segments:?}, got {root:?}"),
            Err(err) => err.kind,
        }
    }

    fn element(node: &Node) -> &Element {
        match node {
            Node::Element(element) => element,
            other => panic!("expected element, got {other:?}"),
        }
    }

    fn text(s: &str) -> Node {
        Node::Text(s.to_string())
    }

    #[test]
    fn keeps_interior_whitespace_and_drops_boundary_whitespace() {
        let root = parse_ok(&["  Hello <div>   Hello   World   </div> !   "]);
        assert_eq!(root.children.len(), 3);
        assert_eq!(root.children[0], text("  Hello "));
        let div = element(&root.children[1]);
        assert_eq!(div.name, "div");
        assert_eq!(div.children, vec![text("   Hello   World   ")]);
        assert_eq!(root.children[2], text(" !   "));
    }

    #[test]
    fn whitespace_between_holes_survives() {
        let root = parse_ok(&["<p> ", " ", " </p>"]);
        let p = element(&root.children[0]);
        assert_eq!(p.children, vec![Node::Expr(0), text(" "), Node::Expr(1)]);

        let root = parse_ok(&["  ", "  "]);
        assert_eq!(root.children, vec![Node::Expr(0)]);
    }

    #[test]
    fn void_elements_never_take_children() {
        let root = parse_ok(&["<img src=\"x.png\">Children should be dropped</img>"]);
        let img = element(&root.children[0]);
        assert!(img.children.is_empty());
        assert_eq!(root.children[1], text("Children should be dropped"));
        assert_eq!(root.children.len(), 2);

        let root = parse_ok(&["<div><br><input>x</div>"]);
        let div = element(&root.children[0]);
        assert_eq!(div.children.len(), 3);
    }

    #[test]
    fn raw_text_body_is_a_single_text_run_with_holes() {
        let root = parse_ok(&["<textarea><div class=\"fake\">", "</div></textarea>"]);
        let textarea = element(&root.children[0]);
        assert_eq!(
            textarea.children,
            vec![text("<div class=\"fake\">"), Node::Expr(0), text("</div>")]
        );
    }

    #[test]
    fn entities_decode_outside_script_and_style() {
        let root = parse_ok(&["<p title=\"a &amp; b\">x &lt; y</p><script>a &amp;&amp; b</script>"]);
        let p = element(&root.children[0]);
        assert_eq!(p.children, vec![text("x < y")]);
        assert_eq!(
            p.props,
            vec![Prop::Static {
                name: "title".to_string(),
                value: "a & b".to_string(),
                quote: Some(Quote::Double),
            }]
        );
        let script = element(&root.children[1]);
        assert_eq!(script.children, vec![text("a &amp;&amp; b")]);
    }

    #[test]
    fn classifies_attributes_by_shape() {
        let root = parse_ok(&[
            "<a bool on=",
            " empty=\"\" lit='x' one=\"",
            "\" mix=\"btn ",
            " lg\" bare=plain></a>",
        ]);
        let a = element(&root.children[0]);
        assert_eq!(
            a.props,
            vec![
                Prop::Boolean {
                    name: "bool".to_string()
                },
                Prop::Expr {
                    name: "on".to_string(),
                    index: 0,
                    quote: None
                },
                Prop::Static {
                    name: "empty".to_string(),
                    value: String::new(),
                    quote: Some(Quote::Double)
                },
                Prop::Static {
                    name: "lit".to_string(),
                    value: "x".to_string(),
                    quote: Some(Quote::Single)
                },
                Prop::Expr {
                    name: "one".to_string(),
                    index: 1,
                    quote: Some(Quote::Double)
                },
                Prop::Mixed {
                    name: "mix".to_string(),
                    parts: vec![
                        AttrPart::Text("btn ".to_string()),
                        AttrPart::Hole(2),
                        AttrPart::Text(" lg".to_string()),
                    ],
                    quote: Some(Quote::Double)
                },
                Prop::Static {
                    name: "bare".to_string(),
                    value: "plain".to_string(),
                    quote: None
                },
            ]
        );
    }

    #[test]
    fn spread_marker_and_bare_holes_become_spreads() {
        let root = parse_ok(&["<div ...", " id=\"a\" ", "></div>"]);
        let div = element(&root.children[0]);
        assert_eq!(div.props[0], Prop::Spread { index: 0 });
        assert_eq!(div.props[2], Prop::Spread { index: 1 });
        assert!(div.spread_before(1));
    }

    #[test]
    fn unquoted_values_join_touching_holes() {
        let root = parse_ok(&["<a class=btn-", " href=", "/page data-x=", "", " id=", " ", "></a>"]);
        let a = element(&root.children[0]);
        assert_eq!(
            a.props,
            vec![
                Prop::Mixed {
                    name: "class".to_string(),
                    parts: vec![AttrPart::Text("btn-".to_string()), AttrPart::Hole(0)],
                    quote: None
                },
                Prop::Mixed {
                    name: "href".to_string(),
                    parts: vec![AttrPart::Hole(1), AttrPart::Text("/page".to_string())],
                    quote: None
                },
                Prop::Mixed {
                    name: "data-x".to_string(),
                    parts: vec![AttrPart::Hole(2), AttrPart::Hole(3)],
                    quote: None
                },
                Prop::Expr {
                    name: "id".to_string(),
                    index: 4,
                    quote: None
                },
                Prop::Spread { index: 5 },
            ]
        );
    }

    #[test]
    fn holes_inside_comments_bind_nothing() {
        let root = parse_ok(&["<div><!-- ", " -->", "</div>"]);
        let div = element(&root.children[0]);
        assert_eq!(div.children, vec![Node::Expr(1)]);
    }

    #[test]
    fn bare_hole_with_value_degrades_to_ref() {
        let root = parse_ok(&["<input ", "=\"x\">"]);
        let input = element(&root.children[0]);
        assert_eq!(
            input.props,
            vec![Prop::Expr {
                name: "ref".to_string(),
                index: 0,
                quote: None
            }]
        );
    }

    #[test]
    fn stray_equals_are_skipped() {
        let root = parse_ok(&["<a href=\"x\" =></a>"]);
        let a = element(&root.children[0]);
        assert_eq!(a.props.len(), 1);
        assert_eq!(a.props[0].name(), Some("href"));
    }

    #[test]
    fn rejects_unclosed_element() {
        assert_eq!(
            error_kind(&["<div>"]),
            ParseErrorKind::UnclosedElement {
                name: "div".to_string()
            }
        );
    }

    #[test]
    fn rejects_mismatched_close() {
        assert_eq!(
            error_kind(&["<div></span>"]),
            ParseErrorKind::MismatchedClose {
                expected: "div".to_string(),
                found: "span".to_string()
            }
        );
    }

    #[test]
    fn rejects_stray_close() {
        assert_eq!(
            error_kind(&["</div>"]),
            ParseErrorKind::StrayClose {
                name: "div".to_string()
            }
        );
    }

    #[test]
    fn rejects_spread_without_hole() {
        assert_eq!(error_kind(&["<div ... bool></div>"]), ParseErrorKind::SpreadWithoutHole);
    }

    #[test]
    fn rejects_input_ending_inside_a_tag() {
        assert_eq!(error_kind(&["<div class="]), ParseErrorKind::UnexpectedEof);
        assert_eq!(error_kind(&["<div title=\"open"]), ParseErrorKind::UnexpectedEof);
    }

    #[test]
    fn close_tag_names_compare_exactly() {
        assert!(matches!(
            error_kind(&["<div></DIV>"]),
            ParseErrorKind::MismatchedClose { .. }
        ));
    }

    #[test]
    fn shorthand_close_skips_name_check() {
        let root = parse_ok(&["<div><span><//></div>"]);
        let outer = element(&root.children[0]);
        let inner = element(&outer.children[0]);
        assert_eq!(inner.name, "span");
        assert!(inner.children.is_empty());

        assert!(matches!(
            error_kind(&["<//>"]),
            ParseErrorKind::StrayClose { .. }
        ));
    }

    #[test]
    fn self_closing_tags_do_not_push() {
        let root = parse_ok(&["<div/><p>x</p>"]);
        assert_eq!(root.children.len(), 2);
        assert!(element(&root.children[0]).children.is_empty());
    }

    #[test]
    fn flags_svg_subtree_until_foreign_object() {
        let root = parse_ok(&["<svg><g></g><foreignObject><div></div></foreignObject></svg>"]);
        let svg = element(&root.children[0]);
        assert!(svg.svg);
        assert!(element(&svg.children[0]).svg);
        let foreign = element(&svg.children[1]);
        assert!(foreign.svg);
        assert!(!element(&foreign.children[0]).svg);
    }

    #[test]
    fn capitalized_tags_get_slots_in_open_order() {
        let root = parse_ok(&["<div><Card><Item/></Card><Input>x</Input></div>"]);
        assert_eq!(root.slot_count, 4);
        let div = element(&root.children[0]);
        assert_eq!(div.slot, None);
        let card = element(&div.children[0]);
        assert_eq!(card.slot, Some(1));
        assert_eq!(element(&card.children[0]).slot, Some(2));
        let input = element(&div.children[1]);
        assert_eq!(input.slot, Some(3));
        assert_eq!(input.children, vec![text("x")]);
    }

    #[test]
    fn deep_nesting_does_not_recurse() {
        const DEPTH: usize = 2_000;
        let source = format!("{}{}", "<div>".repeat(DEPTH), "</div>".repeat(DEPTH));
        let root = parse_ok(&[&source]);
        let mut depth = 0;
        let mut node = &root.children[0];
        loop {
            depth += 1;
            let el = element(node);
            match el.children.first() {
                Some(child) => node = child,
                None => break,
            }
        }
        assert_eq!(depth, DEPTH);
    }
}
