/// Decodes the character references a hand-written template realistically uses.
///
/// Contract:
/// - Named: `&amp;`, `&lt;`, `&gt;`, `&quot;`, `&apos;`, `&nbsp;`.
/// - Numeric: `&#123;` and `&#x1F4A9;`, semicolon-terminated, valid scalars only.
/// - Anything else is copied through unchanged.
pub(crate) fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    const NAMED: &[(&str, char)] = &[
        ("amp;", '&'),
        ("lt;", '<'),
        ("gt;", '>'),
        ("quot;", '"'),
        ("apos;", '\''),
        ("nbsp;", '\u{00A0}'),
    ];
    // 0x10FFFF needs 6 hex or 7 decimal digits.
    const MAX_DIGITS: usize = 7;

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp + 1..];

        if let Some((name, ch)) = NAMED.iter().find(|(name, _)| tail.starts_with(name)) {
            out.push(*ch);
            rest = &tail[name.len()..];
            continue;
        }

        let numeric = tail.strip_prefix('#').and_then(|num| {
            let (digits, radix, prefix) = match num.strip_prefix(['x', 'X']) {
                Some(hex) => (hex, 16, 2),
                None => (num, 10, 1),
            };
            let end = digits.find(';')?;
            if end == 0 || end > MAX_DIGITS {
                return None;
            }
            let ch = u32::from_str_radix(&digits[..end], radix)
                .ok()
                .and_then(char::from_u32)?;
            Some((ch, prefix + end + 1))
        });
        match numeric {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &tail[consumed..];
            }
            None => {
                out.push('&');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}
