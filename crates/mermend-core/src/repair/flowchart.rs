use super::split_header;
use crate::detect::is_comment;
use crate::grammar::{flowchart_arrow_re, flowchart_node_re, is_flowchart_statement};
use crate::text::{is_bare_identifier, strip_labels};

/// Appends the closers missing from a node definition such as `A[Start` or `B(Wait`.
///
/// Lines with mismatched (rather than missing) closers are left alone.
fn close_brackets(line: &str) -> Option<String> {
    let mut stack: Vec<char> = Vec::new();
    let mut in_quotes = false;
    for ch in line.chars() {
        if ch == '"' {
            in_quotes = !in_quotes;
            continue;
        }
        if in_quotes {
            continue;
        }
        match ch {
            '[' => stack.push(']'),
            '(' => stack.push(')'),
            '{' => stack.push('}'),
            ']' | ')' | '}' => {
                if stack.pop() != Some(ch) {
                    return None;
                }
            }
            _ => {}
        }
    }
    if in_quotes || stack.is_empty() {
        return None;
    }
    let mut out = line.to_string();
    out.extend(stack.iter().rev());
    Some(out)
}

fn repair_line(t: &str) -> String {
    if is_flowchart_statement(t) {
        return t.to_string();
    }
    if flowchart_arrow_re().is_match(&strip_labels(t, true)) {
        return t.to_string();
    }
    if flowchart_node_re().is_match(t) {
        // `A[Start --> B` is ambiguous; only plain node definitions get closed.
        if flowchart_arrow_re().is_match(t) {
            return t.to_string();
        }
        return close_brackets(t).unwrap_or_else(|| t.to_string());
    }

    let tokens: Vec<&str> = t.split_whitespace().collect();
    if tokens.len() >= 2 && tokens.iter().all(|tok| is_bare_identifier(tok)) {
        return tokens.join(" --> ");
    }
    t.to_string()
}

/// Flowchart pass: turns whitespace-separated identifier runs into arrow chains and closes
/// dangling node brackets.
pub(super) fn repair_flowchart(text: &str) -> String {
    let (preamble, body) = split_header(text);
    let mut out: Vec<String> = preamble.iter().map(|l| l.to_string()).collect();
    for line in body {
        let t = line.trim();
        if t.is_empty() || is_comment(t) {
            out.push(t.to_string());
            continue;
        }
        out.push(repair_line(t));
    }
    out.join("\n")
}
