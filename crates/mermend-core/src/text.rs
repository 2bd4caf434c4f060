//! Small string helpers shared by the repair passes and the validator.

pub(crate) fn is_quoted(s: &str) -> bool {
    s.len() >= 2 && s.starts_with('"') && s.ends_with('"')
}

/// Wraps `s` in double quotes, encoding embedded quotes as Mermaid's `#quot;` entity.
pub(crate) fn quote_label(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "#quot;"))
}

pub(crate) fn is_bare_identifier(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == '_')
}

/// Blanks out quoted strings and bracketed/piped label segments so that structural checks only
/// see identifiers and operators.
///
/// `braces` controls whether `{...}` counts as a label; ER cardinalities use `{` as an operator.
pub(crate) fn strip_labels(line: &str, braces: bool) -> String {
    let mut out = String::with_capacity(line.len());
    let mut closers: Vec<char> = Vec::new();
    let mut in_quotes = false;
    for ch in line.chars() {
        if in_quotes {
            if ch == '"' {
                in_quotes = false;
            }
            continue;
        }
        if let Some(&expected) = closers.last() {
            if ch == expected {
                closers.pop();
            } else if let Some(closer) = opener_for(ch, braces) {
                closers.push(closer);
            } else if ch == '"' {
                in_quotes = true;
            }
            continue;
        }
        if ch == '"' {
            in_quotes = true;
            out.push(' ');
            continue;
        }
        if let Some(closer) = opener_for(ch, braces) {
            closers.push(closer);
            out.push(' ');
            continue;
        }
        out.push(ch);
    }
    out
}

fn opener_for(ch: char, braces: bool) -> Option<char> {
    match ch {
        '[' => Some(']'),
        '(' => Some(')'),
        '|' => Some('|'),
        '{' if braces => Some('}'),
        _ => None,
    }
}

/// Case-sensitive search for `token` as a standalone word.
///
/// Tokens that are not plain words (e.g. `[object Object]`) are matched as substrings.
pub(crate) fn contains_token(haystack: &str, token: &str) -> bool {
    let is_word = token.chars().all(|c| c.is_alphanumeric() || c == '_');
    if !is_word {
        return haystack.contains(token);
    }
    let is_word_char = |c: char| c.is_alphanumeric() || c == '_';
    haystack.match_indices(token).any(|(idx, _)| {
        let before_ok = haystack[..idx]
            .chars()
            .next_back()
            .is_none_or(|c| !is_word_char(c));
        let after_ok = haystack[idx + token.len()..]
            .chars()
            .next()
            .is_none_or(|c| !is_word_char(c));
        before_ok && after_ok
    })
}

/// Removes double-quoted segments, keeping everything else.
pub(crate) fn strip_quoted(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut in_quotes = false;
    for ch in line.chars() {
        if ch == '"' {
            in_quotes = !in_quotes;
            out.push(' ');
            continue;
        }
        if !in_quotes {
            out.push(ch);
        }
    }
    out
}
