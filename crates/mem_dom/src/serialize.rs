use crate::{Arena, Data, Document, NodeId};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Escapes `&`, `<` and `>` for text content.
pub fn escape_text(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}

fn escape_attribute(out: &mut String, value: &str) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}

enum Step {
    Open(NodeId),
    Close(NodeId),
}

impl Document {
    /// Serializes `node` and its subtree. Fragments serialize as their children.
    pub fn to_html(&self, node: NodeId) -> String {
        let arena = self.arena();
        let mut out = String::new();
        write_subtree(&arena, node, &mut out);
        out
    }

    /// Serializes the children of `node`.
    pub fn inner_html(&self, node: NodeId) -> String {
        let arena = self.arena();
        let mut out = String::new();
        for child in &arena.node(node).children {
            write_subtree(&arena, *child, &mut out);
        }
        out
    }
}

fn write_subtree(arena: &Arena, root: NodeId, out: &mut String) {
    let mut stack = vec![Step::Open(root)];
    while let Some(step) = stack.pop() {
        match step {
            Step::Open(id) => {
                let node = arena.node(id);
                match &node.data {
                    Data::Text(text) => {
                        let raw = node.parent.is_some_and(|parent| {
                            arena
                                .element(parent)
                                .is_some_and(|el| RAW_TEXT_ELEMENTS.contains(&el.name.as_str()))
                        });
                        if raw {
                            out.push_str(text);
                        } else {
                            escape_text(out, text);
                        }
                    }
                    Data::Comment(text) => {
                        out.push_str("<!--");
                        out.push_str(text);
                        out.push_str("-->");
                    }
                    Data::Fragment => {
                        stack.extend(node.children.iter().rev().map(|c| Step::Open(*c)));
                    }
                    Data::Element(element) => {
                        out.push('<');
                        out.push_str(&element.name);
                        for attr in &element.attributes {
                            out.push(' ');
                            out.push_str(&attr.name);
                            out.push_str("=\"");
                            escape_attribute(out, &attr.value);
                            out.push('"');
                        }
                        out.push('>');
                        if VOID_ELEMENTS.contains(&element.name.as_str()) {
                            continue;
                        }
                        stack.push(Step::Close(id));
                        stack.extend(node.children.iter().rev().map(|c| Step::Open(*c)));
                    }
                }
            }
            Step::Close(id) => {
                if let Some(element) = arena.element(id) {
                    out.push_str("</");
                    out.push_str(&element.name);
                    out.push('>');
                }
            }
        }
    }
}
