use mem_dom::{Document, NodeId};
use std::rc::Rc;
use template::{Html, Strings, Value};

pub mod fixtures;
pub mod signal;

pub use crate::signal::{Signal, SignalRuntime};

pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            ch if ch < ' ' => {
                use std::fmt::Write;
                let _ = write!(&mut out, "\\u{{{:02X}}}", ch as u32);
            }
            _ => out.push(ch),
        }
    }
    out
}

fn line(lines: &[String], i: usize) -> &str {
    lines.get(i).map(String::as_str).unwrap_or("<missing>")
}

pub fn diff_lines(expected: &[String], actual: &[String]) -> String {
    use std::fmt::Write;
    let max = expected.len().max(actual.len());
    let mismatch = (0..max).find(|&i| line(expected, i) != line(actual, i));

    let mut out = String::new();
    if let Some(i) = mismatch {
        let start = i.saturating_sub(2);
        let end = (i + 3).min(max);
        let _ = writeln!(
            &mut out,
            "first mismatch at line {} (showing {}..={}):",
            i + 1,
            start + 1,
            end
        );
        for idx in start..end {
            let marker = if idx == i { ">" } else { " " };
            let _ = writeln!(&mut out, "{marker} {:>4}  expected: {}", idx + 1, line(expected, idx));
            let _ = writeln!(&mut out, "{marker} {:>4}    actual: {}", idx + 1, line(actual, idx));
        }
    }
    let _ = writeln!(
        &mut out,
        "expected {} lines, actual {} lines",
        expected.len(),
        actual.len()
    );
    out
}

/// Panics with a line diff when `actual` differs from `expected`.
pub fn assert_lines(name: &str, expected: &[String], actual: &[String]) {
    if expected != actual {
        panic!("snapshot mismatch in '{name}':\n{}", diff_lines(expected, actual));
    }
}

/// Factory over a fresh in-memory document and the given runtime.
pub fn html_with(runtime: Rc<dyn template::Runtime>) -> Html<Document> {
    Html::new(Document::new(), runtime)
}

/// Mounts `value` into a detached `<div>` and returns the container.
pub fn mount(html: &Html<Document>, value: Value<NodeId>) -> NodeId {
    use template::Dom;
    let container = html.dom().create_element("div", template::Namespace::Html);
    html.mount(&container, value);
    container
}

/// Renders and mounts a template, returning the container's inner HTML.
/// Placeholder markers left by dynamic inserts serialize as `<!---->`.
pub fn render_html(html: &Html<Document>, strings: Strings, values: Vec<Value<NodeId>>) -> String {
    let value = html
        .render(strings, values)
        .unwrap_or_else(|err| panic!("render failed: {err}"));
    let container = mount(html, value);
    html.dom().inner_html(container)
}
