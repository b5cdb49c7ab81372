#![no_main]

use libfuzzer_sys::fuzz_target;
use template::traverse::holes;
use template::{AstSnapshot, TemplateConfig, parse_template, token_lines, tokenize};

// Input bytes are split on 0x00 into static segments; a hole sits between
// each pair. Tokenizing and parsing must never panic, and a successful parse
// references holes in strictly increasing order. Holes inside comments and
// values a tolerated input discards (a dynamic attribute name's value) leave
// gaps.
fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let segments: Vec<&str> = text.split('\0').take(64).collect();
    let config = TemplateConfig::default();

    let tokens = tokenize(&segments, &config.raw_text_elements);
    for token in &tokens {
        assert!(token.at.segment < segments.len());
        assert!(token.at.offset <= segments[token.at.segment].len());
    }
    let _ = token_lines(&tokens);

    let Ok(root) = parse_template(&segments, &config) else {
        return;
    };
    let found = holes(&root);
    assert!(found.windows(2).all(|pair| pair[0] < pair[1]));
    assert!(found.iter().all(|&index| index + 1 < segments.len()));
    let _ = AstSnapshot::new(&root).render();
});
