//! Tokenizer for HTML embedded in template literals.
//!
//! Input is the list of static segments of a literal; a hole sits between
//! every pair of adjacent segments and is emitted as `TokenKind::Hole(i)`
//! regardless of the current state, or as `TokenKind::CommentHole(i)` inside a
//! comment.
//!
//! States: text, tag, quoted attribute value, raw text, comment. State carries
//! across segment boundaries, so a hole inside a quoted value lands between two
//! value fragments.
//!
//! An unquoted value continues across a hole when nothing separates them:
//! `class=btn-${x}` and `href=${base}/page` emit fragments that touch the hole,
//! and the parser joins touching pieces into one value. A continuation never
//! starts with whitespace, `>`, a quote or `/>`.
//!
//! Lexical tolerances (never errors):
//! - `<` not followed by an ASCII letter or `/` is text.
//! - An unterminated quoted value flushes the rest of the segment as a fragment.
//! - Unknown characters inside a tag are skipped.
//! - `<!-- ... -->` is dropped; holes inside it are emitted as comment holes.
//!
//! Identifier characters (ASCII only): `[A-Za-z0-9.:_@?-]`. The `@`/`?` prefixes
//! and the `...` spread marker therefore lex as identifiers.
use crate::config::NameSet;
use crate::types::{Quote, SourcePos, Token, TokenKind};
use memchr::{memchr, memmem};

const COMMENT_START: &str = "<!--";
const COMMENT_END: &[u8] = b"-->";

pub(crate) fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'.' | b':' | b'_' | b'-' | b'@' | b'?')
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Text,
    Tag,
    AttrValue(Quote),
    RawText,
    Comment,
}

/// Bookkeeping for the tag currently being scanned.
#[derive(Debug, Default)]
struct TagState {
    name: Option<String>,
    expect_name: bool,
    closing: bool,
    self_closing: bool,
    after_equals: bool,
    /// The unquoted value being scanned touches the segment end or a hole and
    /// may continue at the start of the next segment.
    unquoted: bool,
}

/// Tokenizes the static segments of a template literal.
///
/// `raw_text` names the elements whose body is scanned verbatim up to the exact
/// `</name` sequence.
pub fn tokenize(segments: &[&str], raw_text: &NameSet) -> Vec<Token> {
    let mut tokenizer = Tokenizer::new(raw_text);
    for (index, segment) in segments.iter().enumerate() {
        if index > 0 {
            tokenizer.hole(index - 1, segments[index - 1].len());
        }
        tokenizer.segment(index, segment);
    }
    tokenizer.out
}

struct Tokenizer<'a> {
    raw_text: &'a NameSet,
    state: State,
    segment: usize,
    tag: TagState,
    raw_close: Option<String>,
    out: Vec<Token>,
}

impl<'a> Tokenizer<'a> {
    fn new(raw_text: &'a NameSet) -> Self {
        Self {
            raw_text,
            state: State::Text,
            segment: 0,
            tag: TagState::default(),
            raw_close: None,
            out: Vec::new(),
        }
    }

    fn emit(&mut self, kind: TokenKind, offset: usize) {
        if let TokenKind::Text(text) = &kind {
            if let Some(Token {
                kind: TokenKind::Text(prev),
                ..
            }) = self.out.last_mut()
            {
                // Only reachable across a dropped comment.
                prev.push_str(text);
                return;
            }
        }
        let token = Token {
            kind,
            at: SourcePos::new(self.segment, offset),
        };
        #[cfg(any(test, feature = "debug-stats"))]
        log::trace!(target: "template.tokenizer", "emit token: {token:?}");
        self.out.push(token);
    }

    fn hole(&mut self, index: usize, offset: usize) {
        if self.state == State::Comment {
            self.emit(TokenKind::CommentHole(index), offset);
            return;
        }
        self.emit(TokenKind::Hole(index), offset);
        if self.state == State::Tag {
            self.tag.unquoted = self.tag.after_equals || self.tag.unquoted;
            self.tag.expect_name = false;
            self.tag.after_equals = false;
            self.tag.self_closing = false;
        }
    }

    fn segment(&mut self, segment: usize, s: &str) {
        self.segment = segment;
        let mut i = 0;
        // Invariant: `i` only ever lands on UTF-8 boundaries. Every cut is made at an
        // ASCII structural byte or after a full char.
        while i < s.len() {
            i = match self.state {
                State::Text => self.scan_text(s, i),
                State::Tag => self.scan_tag(s, i),
                State::AttrValue(quote) => self.scan_attr_value(s, i, quote),
                State::RawText => self.scan_raw_text(s, i),
                State::Comment => self.scan_comment(s, i),
            };
        }
    }

    fn flush_text(&mut self, s: &str, start: usize, end: usize) {
        if start < end {
            debug_assert!(s.is_char_boundary(start) && s.is_char_boundary(end));
            self.emit(TokenKind::Text(s[start..end].to_string()), start);
        }
    }

    fn scan_text(&mut self, s: &str, start: usize) -> usize {
        let bytes = s.as_bytes();
        let mut i = start;
        while let Some(rel) = memchr(b'<', &bytes[i..]) {
            let lt = i + rel;
            if s[lt..].starts_with(COMMENT_START) {
                self.flush_text(s, start, lt);
                self.state = State::Comment;
                return lt + COMMENT_START.len();
            }
            if bytes
                .get(lt + 1)
                .is_some_and(|b| b.is_ascii_alphabetic() || *b == b'/')
            {
                self.flush_text(s, start, lt);
                self.emit(TokenKind::OpenAngle, lt);
                self.tag = TagState {
                    expect_name: true,
                    ..TagState::default()
                };
                self.state = State::Tag;
                return lt + 1;
            }
            i = lt + 1;
        }
        self.flush_text(s, start, s.len());
        s.len()
    }

    fn scan_tag(&mut self, s: &str, i: usize) -> usize {
        let bytes = s.as_bytes();
        let b = bytes[i];
        if std::mem::take(&mut self.tag.unquoted)
            && i == 0
            && !b.is_ascii_whitespace()
            && !matches!(b, b'"' | b'\'' | b'>')
            && !s.starts_with("/>")
        {
            return self.scan_unquoted(s, i);
        }
        if b.is_ascii_whitespace() {
            return i + 1;
        }
        if self.tag.after_equals && !matches!(b, b'"' | b'\'' | b'>') {
            self.tag.after_equals = false;
            return self.scan_unquoted(s, i);
        }
        self.tag.after_equals = false;
        match b {
            b'>' => {
                self.emit(TokenKind::CloseAngle, i);
                self.close_tag();
                i + 1
            }
            b'=' => {
                self.emit(TokenKind::Equals, i);
                self.tag.after_equals = true;
                self.tag.expect_name = false;
                self.tag.self_closing = false;
                i + 1
            }
            b'/' => {
                self.emit(TokenKind::Slash, i);
                if self.tag.expect_name && self.tag.name.is_none() && !self.tag.closing {
                    self.tag.closing = true;
                } else {
                    self.tag.self_closing = true;
                }
                i + 1
            }
            b'"' | b'\'' => {
                let quote = Quote::from_byte(b).unwrap_or(Quote::Double);
                self.emit(TokenKind::Quote(quote), i);
                self.tag.expect_name = false;
                self.tag.self_closing = false;
                self.state = State::AttrValue(quote);
                i + 1
            }
            b if is_ident_byte(b) => {
                let mut end = i;
                while end < bytes.len() && is_ident_byte(bytes[end]) {
                    end += 1;
                }
                let ident = s[i..end].to_string();
                if self.tag.expect_name {
                    self.tag.name = Some(ident.clone());
                    self.tag.expect_name = false;
                }
                self.tag.self_closing = false;
                self.emit(TokenKind::Ident(ident), i);
                end
            }
            _ => {
                let len = s[i..].chars().next().map_or(1, char::len_utf8);
                log::trace!(
                    target: "template.tokenizer",
                    "skipping {:?} inside tag at segment {} offset {i}",
                    &s[i..i + len],
                    self.segment
                );
                self.tag.self_closing = false;
                i + len
            }
        }
    }

    /// Emits an unquoted value run, which ends at whitespace, `>` or the
    /// segment end.
    fn scan_unquoted(&mut self, s: &str, i: usize) -> usize {
        let bytes = s.as_bytes();
        let mut end = i;
        while end < bytes.len() && !bytes[end].is_ascii_whitespace() && bytes[end] != b'>' {
            end += 1;
        }
        self.emit(TokenKind::Fragment(s[i..end].to_string()), i);
        self.tag.unquoted = end == bytes.len();
        end
    }

    fn close_tag(&mut self) {
        let tag = std::mem::take(&mut self.tag);
        self.state = State::Text;
        if tag.closing || tag.self_closing {
            return;
        }
        if let Some(name) = tag.name {
            if self.raw_text.contains(&name) {
                self.raw_close = Some(format!("</{name}"));
                self.state = State::RawText;
            }
        }
    }

    fn scan_attr_value(&mut self, s: &str, i: usize, quote: Quote) -> usize {
        match memchr(quote.as_byte(), &s.as_bytes()[i..]) {
            Some(rel) => {
                let end = i + rel;
                if end > i {
                    self.emit(TokenKind::Fragment(s[i..end].to_string()), i);
                }
                self.emit(TokenKind::Quote(quote), end);
                self.state = State::Tag;
                end + 1
            }
            None => {
                self.emit(TokenKind::Fragment(s[i..].to_string()), i);
                s.len()
            }
        }
    }

    fn scan_raw_text(&mut self, s: &str, i: usize) -> usize {
        let Some(close) = self.raw_close.clone() else {
            self.state = State::Text;
            return i;
        };
        let bytes = s.as_bytes();
        let mut from = i;
        while let Some(rel) = memmem::find(&bytes[from..], close.as_bytes()) {
            let at = from + rel;
            if bytes
                .get(at + close.len())
                .is_some_and(|b| is_ident_byte(*b))
            {
                from = at + 1;
                continue;
            }
            self.flush_text(s, i, at);
            self.raw_close = None;
            self.state = State::Text;
            return at;
        }
        self.flush_text(s, i, s.len());
        s.len()
    }

    fn scan_comment(&mut self, s: &str, i: usize) -> usize {
        match memmem::find(&s.as_bytes()[i..], COMMENT_END) {
            Some(rel) => {
                self.state = State::Text;
                i + rel + COMMENT_END.len()
            }
            None => s.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::tokenize;
    use crate::config::{NameSet, RAW_TEXT_ELEMENTS};
    use crate::types::{SourcePos, TokenKind};
    use TokenKind::*;

    fn kinds(segments: &[&str]) -> Vec<TokenKind> {
        tokenize(segments, &NameSet::from_names(RAW_TEXT_ELEMENTS))
            .into_iter()
            .map(|token| token.kind)
            .collect()
    }

    fn ident(s: &str) -> TokenKind {
        Ident(s.to_string())
    }

    fn frag(s: &str) -> TokenKind {
        Fragment(s.to_string())
    }

    fn text(s: &str) -> TokenKind {
        Text(s.to_string())
    }

    #[test]
    fn tokenizes_element_with_quoted_attribute() {
        assert_eq!(
            kinds(&["<div class=\"a\">hi</div>"]),
            vec![
                OpenAngle,
                ident("div"),
                ident("class"),
                Equals,
                Quote(crate::types::Quote::Double),
                frag("a"),
                Quote(crate::types::Quote::Double),
                CloseAngle,
                text("hi"),
                OpenAngle,
                Slash,
                ident("div"),
                CloseAngle,
            ]
        );
    }

    #[test]
    fn holes_inside_quoted_values_split_fragments() {
        assert_eq!(
            kinds(&["<a title='x ", " y'>", "</a>"]),
            vec![
                OpenAngle,
                ident("a"),
                ident("title"),
                Equals,
                Quote(crate::types::Quote::Single),
                frag("x "),
                Hole(0),
                frag(" y"),
                Quote(crate::types::Quote::Single),
                CloseAngle,
                Hole(1),
                OpenAngle,
                Slash,
                ident("a"),
                CloseAngle,
            ]
        );
    }

    #[test]
    fn lone_angle_brackets_stay_text() {
        assert_eq!(kinds(&["a < b <3 <"]), vec![text("a < b <3 <")]);
    }

    #[test]
    fn raw_text_body_is_not_tokenized_as_markup() {
        assert_eq!(
            kinds(&["<textarea><div class=\"fake\">", "</div></textarea>"]),
            vec![
                OpenAngle,
                ident("textarea"),
                CloseAngle,
                text("<div class=\"fake\">"),
                Hole(0),
                text("</div>"),
                OpenAngle,
                Slash,
                ident("textarea"),
                CloseAngle,
            ]
        );
    }

    #[test]
    fn raw_text_close_requires_exact_name() {
        assert_eq!(
            kinds(&["<script>a</scripts></script>"]),
            vec![
                OpenAngle,
                ident("script"),
                CloseAngle,
                text("a</scripts>"),
                OpenAngle,
                Slash,
                ident("script"),
                CloseAngle,
            ]
        );
    }

    #[test]
    fn self_closed_raw_text_tag_does_not_enter_raw_mode() {
        assert_eq!(
            kinds(&["<script/><b>"]),
            vec![
                OpenAngle,
                ident("script"),
                Slash,
                CloseAngle,
                OpenAngle,
                ident("b"),
                CloseAngle,
            ]
        );
    }

    #[test]
    fn comments_are_dropped_but_holes_survive() {
        assert_eq!(kinds(&["a<!-- <b> -->c"]), vec![text("ac")]);
        assert_eq!(
            kinds(&["<!-- ", " -->x"]),
            vec![CommentHole(0), text("x")]
        );
    }

    #[test]
    fn unquoted_values_touch_adjacent_holes() {
        assert_eq!(
            kinds(&["<a class=btn-", " href=", "/page title=", ">"]),
            vec![
                OpenAngle,
                ident("a"),
                ident("class"),
                Equals,
                frag("btn-"),
                Hole(0),
                ident("href"),
                Equals,
                Hole(1),
                frag("/page"),
                ident("title"),
                Equals,
                Hole(2),
                CloseAngle,
            ]
        );
    }

    #[test]
    fn self_closing_after_unquoted_hole_is_not_a_value() {
        assert_eq!(
            kinds(&["<img src=", "/>"]),
            vec![OpenAngle, ident("img"), ident("src"), Equals, Hole(0), Slash, CloseAngle]
        );
    }

    #[test]
    fn unterminated_quote_flushes_fragment() {
        assert_eq!(
            kinds(&["<a title=\"oops>"]),
            vec![
                OpenAngle,
                ident("a"),
                ident("title"),
                Equals,
                Quote(crate::types::Quote::Double),
                frag("oops>"),
            ]
        );
    }

    #[test]
    fn prefixed_names_and_spread_marker_are_identifiers() {
        assert_eq!(
            kinds(&["<input @click=", " .value=", " ?disabled=", " ...", ">"]),
            vec![
                OpenAngle,
                ident("input"),
                ident("@click"),
                Equals,
                Hole(0),
                ident(".value"),
                Equals,
                Hole(1),
                ident("?disabled"),
                Equals,
                Hole(2),
                ident("..."),
                Hole(3),
                CloseAngle,
            ]
        );
    }

    #[test]
    fn unquoted_values_become_fragments() {
        assert_eq!(
            kinds(&["<img src=x.png width=10>"]),
            vec![
                OpenAngle,
                ident("img"),
                ident("src"),
                Equals,
                frag("x.png"),
                ident("width"),
                Equals,
                frag("10"),
                CloseAngle,
            ]
        );
    }

    #[test]
    fn shorthand_close_lexes_two_slashes() {
        assert_eq!(kinds(&["<//>"]), vec![OpenAngle, Slash, Slash, CloseAngle]);
    }

    #[test]
    fn holes_record_their_segment_position() {
        let tokens = tokenize(&["ab", "cde"], &NameSet::new());
        assert_eq!(tokens[1].kind, Hole(0));
        assert_eq!(tokens[1].at, SourcePos::new(0, 2));
        assert_eq!(tokens[2].at, SourcePos::new(1, 0));
    }

    #[test]
    fn preserves_non_ascii_text_and_skips_unknown_tag_chars() {
        assert_eq!(
            kinds(&["¡Hola <b é>café</b>"]),
            vec![
                text("¡Hola "),
                OpenAngle,
                ident("b"),
                CloseAngle,
                text("café"),
                OpenAngle,
                Slash,
                ident("b"),
                CloseAngle,
            ]
        );
    }
}
