use crate::types::{AttrPart, Node, Prop, Quote, Root, Token};
use std::fmt::{self, Write};

/// Deterministic outline of a parsed template for golden tests and tooling.
/// Not a stable format.
///
/// Line grammar:
/// - `#root slots=N` first, then one line per node, two spaces per depth level.
/// - Elements: `<name props...>` with ` [svg]` and ` [slot N]` markers.
/// - Text: escaped in double quotes. Holes: `${i}`.
/// - Props: `name`, `name="v"`, `name=v` (unquoted), `name=${i}`,
///   `name="${i}"`, `...${i}`, `name="a${i}b"`.
#[derive(Debug)]
pub struct AstSnapshot {
    lines: Vec<String>,
}

impl AstSnapshot {
    pub fn new(root: &Root) -> Self {
        let mut lines = vec![format!("#root slots={}", root.slot_count)];
        // Explicit stack: templates can nest deeper than the call stack allows.
        let mut stack: Vec<(&Node, usize)> = root.children.iter().rev().map(|n| (n, 1)).collect();
        while let Some((node, depth)) = stack.pop() {
            let mut line = " ".repeat(depth * 2);
            write_node_line(&mut line, node);
            lines.push(line);
            if let Node::Element(element) = node {
                stack.extend(element.children.iter().rev().map(|child| (child, depth + 1)));
            }
        }
        Self { lines }
    }

    pub fn as_lines(&self) -> &[String] {
        &self.lines
    }

    pub fn render(&self) -> String {
        self.lines.join("\n")
    }
}

impl fmt::Display for AstSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// One line per token: `segment:offset kind`.
pub fn token_lines(tokens: &[Token]) -> Vec<String> {
    tokens
        .iter()
        .map(|token| format!("{}:{} {}", token.at.segment, token.at.offset, token.kind))
        .collect()
}

fn write_node_line(out: &mut String, node: &Node) {
    match node {
        Node::Text(text) => {
            out.push('"');
            write_escaped(out, text);
            out.push('"');
        }
        Node::Expr(index) => {
            write!(out, "${{{index}}}").ok();
        }
        Node::Element(element) => {
            out.push('<');
            out.push_str(&element.name);
            for prop in &element.props {
                out.push(' ');
                write_prop(out, prop);
            }
            out.push('>');
            if element.svg {
                out.push_str(" [svg]");
            }
            if let Some(slot) = element.slot {
                write!(out, " [slot {slot}]").ok();
            }
        }
    }
}

fn write_prop(out: &mut String, prop: &Prop) {
    match prop {
        Prop::Boolean { name } => out.push_str(name),
        Prop::Static { name, value, quote } => {
            out.push_str(name);
            out.push('=');
            write_quoted(out, *quote, |out| write_escaped(out, value));
        }
        Prop::Expr { name, index, quote } => {
            out.push_str(name);
            out.push('=');
            write_quoted(out, *quote, |out| {
                write!(out, "${{{index}}}").ok();
            });
        }
        Prop::Spread { index } => {
            write!(out, "...${{{index}}}").ok();
        }
        Prop::Mixed { name, parts, quote } => {
            out.push_str(name);
            out.push('=');
            write_quoted(out, *quote, |out| {
                for part in parts {
                    match part {
                        AttrPart::Text(text) => write_escaped(out, text),
                        AttrPart::Hole(index) => {
                            write!(out, "${{{index}}}").ok();
                        }
                    }
                }
            });
        }
    }
}

/// Quoted values are always printed with `"` so snapshots do not depend on
/// the author's quote style.
fn write_quoted(out: &mut String, quote: Option<Quote>, body: impl FnOnce(&mut String)) {
    if quote.is_some() {
        out.push('"');
        body(out);
        out.push('"');
    } else {
        body(out);
    }
}

fn write_escaped(out: &mut String, value: &str) {
    for ch in value.chars() {
        match ch {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            _ if ch.is_ascii() => out.push(ch),
            _ => {
                let _ = write!(out, "\\u{{{:X}}}", ch as u32);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AstSnapshot, token_lines};
    use crate::config::TemplateConfig;
    use crate::config::{NameSet, RAW_TEXT_ELEMENTS};
    use crate::parse_template;
    use crate::tokenizer::tokenize;

    #[test]
    fn outlines_elements_props_and_holes() {
        let root = match parse_template(
            &["<svg ...", " class=\"a ", "\"><Icon on=", "/>\n</svg>"],
            &TemplateConfig::default(),
        ) {
            Ok(root) => root,
            Err(err) => panic!("{err}"),
        };
        assert_eq!(
            AstSnapshot::new(&root).as_lines(),
            [
                "#root slots=2",
                "  <svg ...${0} class=\"a ${1}\"> [svg]",
                "    <Icon on=${2}> [svg] [slot 1]",
            ]
        );
    }

    #[test]
    fn token_lines_carry_positions() {
        let tokens = tokenize(&["a<b>", "é"], &NameSet::from_names(RAW_TEXT_ELEMENTS));
        assert_eq!(
            token_lines(&tokens),
            [
                "0:0 text \"a\"",
                "0:1 `<`",
                "0:2 identifier `b`",
                "0:3 `>`",
                "0:4 expression ${0}",
                "1:0 text \"é\"",
            ]
        );
    }
}
