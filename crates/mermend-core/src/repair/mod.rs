//! Structural repair passes.
//!
//! Every pass is a total `&str -> String` function: constructs it does not recognize are passed
//! through unchanged. Passes run in a fixed order (generic cleanup, header insertion, the
//! kind-specific pass, whitespace normalization) and each one records whether it changed the
//! text in a [`RepairTrace`].

mod class;
mod er;
mod flowchart;
mod sequence;

use crate::detect::{detect_kind, first_content_index};
use crate::{DiagramKind, RepairOptions};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RepairStep {
    pub stage: &'static str,
    pub changed: bool,
}

/// Ordered record of which stages touched the text. Informational only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RepairTrace {
    steps: Vec<RepairStep>,
}

impl RepairTrace {
    pub fn push(&mut self, stage: &'static str, changed: bool) {
        self.steps.push(RepairStep { stage, changed });
    }

    pub fn extend(&mut self, other: RepairTrace) {
        self.steps.extend(other.steps);
    }

    pub fn steps(&self) -> &[RepairStep] {
        &self.steps
    }

    /// Whether any stage changed the text.
    pub fn changed(&self) -> bool {
        self.steps.iter().any(|s| s.changed)
    }

    pub fn stage_changed(&self, stage: &str) -> bool {
        self.steps.iter().any(|s| s.stage == stage && s.changed)
    }
}

/// Repairs `text` as a diagram of `kind` with default options.
pub fn repair(text: &str, kind: DiagramKind) -> (String, RepairTrace) {
    repair_with(text, kind, &RepairOptions::default())
}

pub fn repair_with(text: &str, kind: DiagramKind, options: &RepairOptions) -> (String, RepairTrace) {
    let mut trace = RepairTrace::default();
    let mut current = text.to_string();

    let mut run = |stage: &'static str, current: &mut String, pass: &dyn Fn(&str) -> String| {
        let next = pass(current);
        let changed = next != *current;
        tracing::debug!(stage, kind = %kind, changed, "repair stage");
        trace.push(stage, changed);
        *current = next;
    };

    run("cleanup", &mut current, &|t: &str| generic_cleanup(t, kind, options));
    if options.insert_missing_header {
        run("header", &mut current, &|t: &str| insert_header(t, kind, options));
    }
    match kind {
        DiagramKind::Sequence => run("sequence", &mut current, &|t: &str| {
            sequence::repair_sequence(t, options)
        }),
        DiagramKind::Flowchart => run("flowchart", &mut current, &flowchart::repair_flowchart),
        DiagramKind::Class => run("class", &mut current, &class::repair_class),
        DiagramKind::EntityRelationship => run("er", &mut current, &er::repair_er),
        _ => {}
    }
    run("whitespace", &mut current, &normalize_whitespace);

    (current, trace)
}

fn is_fence_marker(line: &str) -> bool {
    line.starts_with("```") || line.starts_with("~~~")
}

/// Line-ending normalization, fence stripping, error-token removal and per-line trimming.
///
/// Mindmaps keep their leading indentation: it encodes the tree structure.
fn generic_cleanup(text: &str, kind: DiagramKind, options: &RepairOptions) -> String {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let keep_indent = kind == DiagramKind::Mindmap;

    let mut out: Vec<&str> = Vec::new();
    for line in text.lines() {
        let t = line.trim();
        if is_fence_marker(t) || options.is_error_line(t) {
            continue;
        }
        out.push(if keep_indent { line.trim_end() } else { t });
    }
    collapse_blank_runs(&out).join("\n")
}

/// Collapses runs of three or more blank lines into a single blank line.
fn collapse_blank_runs<'a>(lines: &[&'a str]) -> Vec<&'a str> {
    let mut out = Vec::with_capacity(lines.len());
    let mut idx = 0;
    while idx < lines.len() {
        if !lines[idx].is_empty() {
            out.push(lines[idx]);
            idx += 1;
            continue;
        }
        let run = lines[idx..].iter().take_while(|l| l.is_empty()).count();
        let keep = if run >= 3 { 1 } else { run };
        out.extend(std::iter::repeat_n("", keep));
        idx += run;
    }
    out
}

/// Prepends the canonical header when the kind is known but the text does not start with a
/// keyword line.
fn insert_header(text: &str, kind: DiagramKind, options: &RepairOptions) -> String {
    if !kind.is_known() {
        return text.to_string();
    }
    let Some(idx) = first_content_index(text) else {
        return text.to_string();
    };
    let mut lines: Vec<&str> = text.lines().collect();
    if detect_kind(lines[idx]).is_known() {
        return text.to_string();
    }
    let header = match kind {
        DiagramKind::Flowchart => options.flowchart_header(),
        other => other.header_keyword().to_string(),
    };
    lines.insert(idx, &header);
    lines.join("\n")
}

fn normalize_whitespace(text: &str) -> String {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim_end)
        .skip_while(|l| l.is_empty())
        .collect();
    let mut lines = collapse_blank_runs(&lines);
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}

/// Splits pass input into the preamble (everything up to and including the header line) and the
/// body lines that follow it.
fn split_header(text: &str) -> (Vec<&str>, Vec<&str>) {
    let lines: Vec<&str> = text.lines().collect();
    match crate::detect::header_index(text) {
        Some(idx) => (lines[..=idx].to_vec(), lines[idx + 1..].to_vec()),
        None => (Vec::new(), lines),
    }
}
