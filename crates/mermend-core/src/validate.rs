use crate::detect::{detect_kind, first_content_index, is_comment};
use crate::grammar::{
    class_declaration_re, er_attribute_re, er_bare_entity_re, er_block_open_re, er_relation_re,
    flowchart_arrow_re, flowchart_bare_node_re, flowchart_node_re, is_er_statement,
    is_flowchart_statement, is_sequence_control, sequence_declaration_re, sequence_message_re,
};
use crate::text::{contains_token, strip_labels, strip_quoted};
use crate::{DiagramKind, RepairOptions};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// 1 ⇒ Low, 2–3 ⇒ Medium, more ⇒ High; no errors has no severity.
    pub fn from_error_count(count: usize) -> Option<Self> {
        match count {
            0 => None,
            1 => Some(Self::Low),
            2..=3 => Some(Self::Medium),
            _ => Some(Self::High),
        }
    }
}

/// Result of validating a diagram text. `valid` holds exactly when `errors` is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationOutcome {
    valid: bool,
    errors: Vec<String>,
    severity: Option<Severity>,
}

impl ValidationOutcome {
    pub fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            severity: Severity::from_error_count(errors.len()),
            errors,
        }
    }

    /// A single defect severe enough that no further checks are meaningful.
    pub fn fatal(error: impl Into<String>) -> Self {
        Self {
            valid: false,
            errors: vec![error.into()],
            severity: Some(Severity::High),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn severity(&self) -> Option<Severity> {
        self.severity
    }
}

/// Validates `text` with default options.
pub fn validate(text: &str, kind: DiagramKind) -> ValidationOutcome {
    validate_with(text, kind, &RepairOptions::default())
}

/// Runs the approximate-grammar checks. Failing checks accumulate; only an empty text or an
/// undetectable kind short-circuits.
pub fn validate_with(text: &str, kind: DiagramKind, options: &RepairOptions) -> ValidationOutcome {
    if text.trim().is_empty() {
        return ValidationOutcome::fatal("Diagram text is empty");
    }

    let lines: Vec<&str> = text.lines().collect();
    let header_idx = first_content_index(text);
    let header_kind = header_idx.map_or(DiagramKind::Unknown, |idx| detect_kind(lines[idx]));

    let effective = if header_kind.is_known() {
        header_kind
    } else {
        kind
    };
    if !effective.is_known() {
        return ValidationOutcome::fatal("No diagram type detected: the text does not start with a known diagram keyword");
    }

    let mut errors = Vec::new();
    if !header_kind.is_known() {
        let line = header_idx.map_or("", |idx| lines[idx].trim());
        errors.push(format!(
            "Line {}: expected a `{}` header, found `{line}`",
            header_idx.map_or(1, |idx| idx + 1),
            effective.header_keyword()
        ));
    }

    let body_start = match header_idx {
        Some(idx) if header_kind.is_known() => idx + 1,
        Some(idx) => idx,
        None => lines.len(),
    };
    let body: Vec<(usize, &str)> = lines
        .iter()
        .enumerate()
        .skip(body_start)
        .map(|(idx, l)| (idx + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty() && !is_comment(l))
        .collect();

    match effective {
        DiagramKind::Sequence => check_sequence(&body, &mut errors),
        DiagramKind::Flowchart => check_flowchart(&body, &mut errors),
        DiagramKind::Class => check_class(&body, &mut errors),
        DiagramKind::EntityRelationship => check_er(&body, &mut errors),
        _ => {}
    }
    check_error_tokens(&body, effective, options, &mut errors);

    tracing::debug!(kind = %effective, errors = errors.len(), "validated diagram");
    ValidationOutcome::from_errors(errors)
}

fn check_sequence(body: &[(usize, &str)], errors: &mut Vec<String>) {
    for &(line_no, t) in body {
        if sequence_declaration_re().is_match(t)
            || is_sequence_control(t)
            || sequence_message_re().is_match(t)
        {
            continue;
        }
        errors.push(format!(
            "Line {line_no}: expected `sender->>receiver: message` or a sequence statement, found `{t}`"
        ));
    }
}

fn check_flowchart(body: &[(usize, &str)], errors: &mut Vec<String>) {
    for &(line_no, t) in body {
        if is_flowchart_statement(t)
            || flowchart_arrow_re().is_match(&strip_labels(t, true))
            || flowchart_node_re().is_match(t)
            || flowchart_bare_node_re().is_match(t)
        {
            continue;
        }
        errors.push(format!(
            "Line {line_no}: expected an edge or a node definition, found `{t}`"
        ));
    }
}

fn check_class(body: &[(usize, &str)], errors: &mut Vec<String>) {
    for &(line_no, t) in body {
        let is_declaration = t
            .strip_prefix("class")
            .is_some_and(|rest| rest.starts_with(char::is_whitespace));
        if is_declaration && !class_declaration_re().is_match(t) {
            errors.push(format!("Line {line_no}: malformed class declaration `{t}`"));
        }
    }
}

fn check_er(body: &[(usize, &str)], errors: &mut Vec<String>) {
    let mut in_block = false;
    for &(line_no, t) in body {
        if in_block {
            if t == "}" {
                in_block = false;
            } else if !er_attribute_re().is_match(t) {
                errors.push(format!("Line {line_no}: malformed entity attribute `{t}`"));
            }
            continue;
        }
        if er_block_open_re().is_match(t) {
            in_block = true;
            continue;
        }
        if er_relation_re().is_match(t) || er_bare_entity_re().is_match(t) || is_er_statement(t) {
            continue;
        }
        errors.push(format!(
            "Line {line_no}: expected `ENTITY ||--o{{ ENTITY : label`, found `{t}`"
        ));
    }
    if in_block {
        errors.push("Entity attribute block is not closed with `}`".to_string());
    }
}

/// Flags error-indicator tokens left outside quoted/bracketed labels and message text.
fn check_error_tokens(
    body: &[(usize, &str)],
    kind: DiagramKind,
    options: &RepairOptions,
    errors: &mut Vec<String>,
) {
    for &(line_no, t) in body {
        let structural = match kind {
            // Message text after `:` is free-form in these grammars.
            DiagramKind::Sequence | DiagramKind::EntityRelationship | DiagramKind::Class => {
                t.split(':').next().unwrap_or(t)
            }
            _ => t,
        };
        let unquoted = strip_quoted(structural);
        let stripped = strip_labels(structural, kind != DiagramKind::EntityRelationship);
        let found = options.error_tokens.iter().find(|token| {
            let is_word = token.chars().all(|c| c.is_alphanumeric() || c == '_');
            if is_word {
                contains_token(&stripped, token)
            } else {
                contains_token(&unquoted, token)
            }
        });
        if let Some(token) = found {
            errors.push(format!(
                "Line {line_no}: residual error token `{token}` in `{t}`"
            ));
        }
    }
}
