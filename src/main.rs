//! `litdom`: inspect how a template literal tokenizes, parses and renders.
//!
//! Usage: `litdom [--tokens] [--ast] [--html] <file>`
//!
//! The file holds the literal's body; every `${...}` is a hole. With no
//! section flags all three sections are printed. Holes render with their own
//! source text as placeholder values; unregistered components render as plain
//! elements.
use mem_dom::Document;
use mimalloc::MiMalloc;
use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::process::ExitCode;
use std::rc::Rc;
use template::traverse::for_each_element;
use template::{
    AstSnapshot, Dom, Html, Namespace, Prop, StaticRuntime, Strings, TemplateConfig, Value,
    parse_template, token_lines, tokenize,
};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Debug, Default)]
struct Options {
    tokens: bool,
    ast: bool,
    html: bool,
    path: Option<String>,
}

fn parse_args(args: impl Iterator<Item = String>) -> Result<Options, String> {
    let mut options = Options::default();
    for arg in args {
        match arg.as_str() {
            "--tokens" => options.tokens = true,
            "--ast" => options.ast = true,
            "--html" => options.html = true,
            "-h" | "--help" => return Err(usage()),
            flag if flag.starts_with("--") => return Err(format!("unknown flag {flag}\n{}", usage())),
            _ if options.path.is_some() => return Err(format!("unexpected argument {arg}")),
            _ => options.path = Some(arg),
        }
    }
    if !(options.tokens || options.ast || options.html) {
        options.tokens = true;
        options.ast = true;
        options.html = true;
    }
    Ok(options)
}

fn usage() -> String {
    "usage: litdom [--tokens] [--ast] [--html] <file>".to_string()
}

/// Splits a literal body into static segments and hole expressions.
/// Braces nest inside a hole, so `${ {a: 1} }` is one hole.
fn split_holes(source: &str) -> Result<(Vec<String>, Vec<String>), String> {
    let mut segments = Vec::new();
    let mut holes = Vec::new();
    let mut rest = source;
    while let Some(start) = rest.find("${") {
        segments.push(rest[..start].to_string());
        let body = &rest[start + 2..];
        let mut depth = 0usize;
        let mut end = None;
        for (i, ch) in body.char_indices() {
            match ch {
                '{' => depth += 1,
                '}' if depth == 0 => {
                    end = Some(i);
                    break;
                }
                '}' => depth -= 1,
                _ => {}
            }
        }
        let Some(end) = end else {
            return Err(format!("unterminated hole starting at byte {}", source.len() - rest.len() + start));
        };
        holes.push(body[..end].trim().to_string());
        rest = &body[end + 1..];
    }
    segments.push(rest.to_string());
    Ok((segments, holes))
}

/// Placeholder values: each hole shows its expression, except where text would
/// be meaningless (spreads, handlers, refs).
fn placeholder_values(segments: &[&str], holes: &[String], config: &TemplateConfig) -> Vec<Value<mem_dom::NodeId>> {
    let mut silent = BTreeSet::new();
    if let Ok(root) = parse_template(segments, config) {
        for_each_element(&root, |element| {
            for prop in &element.props {
                match prop {
                    Prop::Spread { index } => {
                        silent.insert(*index);
                    }
                    Prop::Expr { name, index, .. }
                        if name == "ref" || name.starts_with('@') || name.starts_with("on:") =>
                    {
                        silent.insert(*index);
                    }
                    _ => {}
                }
            }
        });
    }
    holes
        .iter()
        .enumerate()
        .map(|(i, expr)| {
            if silent.contains(&i) {
                Value::Empty
            } else {
                Value::text(format!("${{{expr}}}"))
            }
        })
        .collect()
}

fn run(options: &Options) -> Result<(), String> {
    let path = options.path.as_deref().ok_or_else(usage)?;
    let source = fs::read_to_string(path).map_err(|err| format!("cannot read {path}: {err}"))?;
    let (segments, holes) = split_holes(&source)?;
    let config = TemplateConfig {
        strict_components: false,
        ..TemplateConfig::default()
    };
    let refs: Vec<&str> = segments.iter().map(String::as_str).collect();

    if options.tokens {
        println!("# tokens");
        for line in token_lines(&tokenize(&refs, &config.raw_text_elements)) {
            println!("{line}");
        }
    }

    if options.ast {
        println!("# ast");
        match parse_template(&refs, &config) {
            Ok(root) => println!("{}", AstSnapshot::new(&root)),
            Err(err) => return Err(format!("{path}: {err}")),
        }
    }

    if options.html {
        println!("# html");
        let values = placeholder_values(&refs, &holes, &config);
        let html = Html::builder()
            .config(config)
            .build(Document::new(), Rc::new(StaticRuntime));
        let value = html
            .render(Strings::leak(segments), values)
            .map_err(|err| format!("{path}: {err}"))?;
        let container = html.dom().create_element("body", Namespace::Html);
        html.mount(&container, value);
        println!("{}", html.dom().inner_html(container));
    }
    Ok(())
}

fn main() -> ExitCode {
    let options = match parse_args(env::args().skip(1)) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::from(2);
        }
    };
    match run(&options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("litdom: {message}");
            ExitCode::FAILURE
        }
    }
}
