use super::split_header;
use crate::grammar::class_relation_re;
use crate::text::{is_quoted, quote_label};

fn quote_relation_label(t: &str) -> Option<String> {
    let caps = class_relation_re().captures(t)?;
    let label = caps.name("label")?;
    let text = label.as_str();
    if text.is_empty() || is_quoted(text) || !text.chars().any(char::is_whitespace) {
        return None;
    }
    Some(format!("{}{}", &t[..label.start()], quote_label(text)))
}

/// Class pass: quotes multi-word relationship labels and closes a class body left open at the
/// end of the text. Member lines inside a body are left alone.
pub(super) fn repair_class(text: &str) -> String {
    let (preamble, body) = split_header(text);
    let mut out: Vec<String> = preamble.iter().map(|l| l.to_string()).collect();
    let mut in_body = false;

    for line in body {
        let t = line.trim();
        if in_body {
            if t == "}" {
                in_body = false;
            }
            out.push(t.to_string());
            continue;
        }
        if t.ends_with('{') {
            in_body = true;
            out.push(t.to_string());
            continue;
        }
        out.push(quote_relation_label(t).unwrap_or_else(|| t.to_string()));
    }

    if in_body {
        out.push("}".to_string());
    }
    out.join("\n")
}
