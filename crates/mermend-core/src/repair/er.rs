use super::split_header;
use crate::grammar::{er_relation_re, er_unlabeled_relation_re};
use crate::text::{is_quoted, quote_label};

const KEY_MARKERS: &[&str] = &["PK", "FK", "UK"];

fn repair_relation(t: &str) -> Option<String> {
    if let Some(caps) = er_relation_re().captures(t) {
        let label = caps.name("label")?;
        if is_quoted(label.as_str()) {
            return None;
        }
        return Some(format!(
            "{} {} {} : {}",
            &caps["a"],
            &caps["card"],
            &caps["b"],
            quote_label(label.as_str())
        ));
    }
    // The label is mandatory in Mermaid's ER grammar.
    let caps = er_unlabeled_relation_re().captures(t)?;
    Some(format!(
        "{} {} {} : \"\"",
        &caps["a"], &caps["card"], &caps["b"]
    ))
}

/// Normalizes `type name [keys] ["comment"]`, re-attaching key markers as `PK, FK`.
fn normalize_attribute(t: &str) -> String {
    let (head, comment) = match t.find('"') {
        Some(idx) if t.ends_with('"') && idx + 1 < t.len() => (t[..idx].trim(), Some(&t[idx..])),
        _ => (t, None),
    };
    let tokens: Vec<&str> = head.split_whitespace().collect();
    if tokens.len() < 2 {
        return t.to_string();
    }

    let mut parts: Vec<String> = vec![tokens[0].to_string(), tokens[1].to_string()];
    if tokens.len() > 2 {
        let rest = tokens[2..].join(" ");
        let keys: Vec<String> = rest
            .split(|c: char| c == ',' || c.is_whitespace())
            .map(|k| k.trim().to_ascii_uppercase())
            .filter(|k| !k.is_empty())
            .collect();
        if !keys.is_empty() && keys.iter().all(|k| KEY_MARKERS.contains(&k.as_str())) {
            parts.push(keys.join(", "));
        } else {
            parts.push(rest);
        }
    }
    if let Some(comment) = comment {
        parts.push(comment.to_string());
    }
    parts.join(" ")
}

/// ER pass: quotes relationship labels and re-indents entity attribute blocks.
pub(super) fn repair_er(text: &str) -> String {
    let (preamble, body) = split_header(text);
    let mut out: Vec<String> = preamble.iter().map(|l| l.to_string()).collect();
    let mut in_block = false;

    for line in body {
        let t = line.trim();
        if in_block {
            if t == "}" {
                in_block = false;
                out.push("}".to_string());
            } else if t.is_empty() {
                out.push(String::new());
            } else {
                out.push(format!("  {}", normalize_attribute(t)));
            }
            continue;
        }
        if t.ends_with('{') {
            in_block = true;
            out.push(t.to_string());
            continue;
        }
        out.push(repair_relation(t).unwrap_or_else(|| t.to_string()));
    }

    if in_block {
        out.push("}".to_string());
    }
    out.join("\n")
}
