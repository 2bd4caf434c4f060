//! Translation of the flowchart.js box-and-arrow dialect (`st=>start: Begin`, `st->op`) into
//! Mermaid flowchart syntax.

use crate::text::quote_label;

const SECTION_KEYWORDS: &[&str] = &["start:", "operation:", "condition:", "end:"];
const DIRECTIONS: &[&str] = &["left", "right", "top", "bottom"];

/// Syntactic sniff for the legacy dialect: a `=>` node definition together with at least one
/// section keyword.
pub fn is_legacy(text: &str) -> bool {
    text.contains("=>") && SECTION_KEYWORDS.iter().any(|k| text.contains(k))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeType {
    Terminal,
    Condition,
    InputOutput,
    Subroutine,
    Process,
}

impl NodeType {
    fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "start" | "end" => Self::Terminal,
            "condition" => Self::Condition,
            "inputoutput" => Self::InputOutput,
            "subroutine" => Self::Subroutine,
            _ => Self::Process,
        }
    }

    fn wrap(self, label: &str) -> String {
        match self {
            Self::Terminal => format!("([{label}])"),
            Self::Condition => format!("{{{label}}}"),
            Self::InputOutput => format!("[/{label}/]"),
            Self::Subroutine => format!("[[{label}]]"),
            Self::Process => format!("[{label}]"),
        }
    }
}

#[derive(Debug)]
struct Node {
    id: String,
    ty: NodeType,
    label: String,
}

#[derive(Debug)]
struct Edge {
    from: String,
    to: String,
    label: Option<String>,
}

fn node_label(raw: &str) -> &str {
    // flowchart.js appends links (`:>http://...`) and state flags (`|past`) to labels.
    let raw = raw.split(":>").next().unwrap_or(raw);
    let label = match raw.rsplit_once('|') {
        Some((head, flag)) if !flag.is_empty() && flag.chars().all(|c| c.is_ascii_alphabetic()) => {
            head
        }
        _ => raw,
    };
    label.trim()
}

fn parse_node(line: &str) -> Option<Node> {
    let (id, rest) = line.split_once("=>")?;
    let id = id.trim();
    if id.is_empty() {
        return None;
    }
    let (ty, label) = match rest.split_once(':') {
        Some((ty, label)) => (ty, node_label(label)),
        None => (rest, ""),
    };
    let label = if label.is_empty() { id } else { label };
    Some(Node {
        id: id.to_string(),
        ty: NodeType::parse(ty),
        label: label.to_string(),
    })
}

/// Splits `cond(yes, right)` into the node id and an optional edge label. Layout hints
/// (`left`, `right`, ...) are not labels.
fn parse_segment(segment: &str) -> (&str, Option<String>) {
    let segment = segment.trim();
    let Some(open) = segment.find('(') else {
        return (segment, None);
    };
    let id = segment[..open].trim();
    let inner = segment[open + 1..].trim_end_matches(')');
    let label = inner
        .split(',')
        .map(str::trim)
        .find(|part| !part.is_empty() && !DIRECTIONS.contains(&part.to_ascii_lowercase().as_str()))
        .map(str::to_string);
    (id, label)
}

fn format_label(label: &str) -> String {
    if label
        .chars()
        .any(|c| matches!(c, '[' | ']' | '(' | ')' | '{' | '}' | '"' | '|' | '<' | '>'))
    {
        quote_label(label)
    } else {
        label.to_string()
    }
}

/// Converts legacy-dialect text into a Mermaid flowchart: a header, every node in first-seen
/// order, then every edge in first-seen order.
pub fn convert_legacy(text: &str) -> String {
    let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();

    let mut nodes: Vec<Node> = Vec::new();
    for line in lines.iter().filter(|l| l.contains("=>")) {
        let Some(node) = parse_node(line) else {
            continue;
        };
        if nodes.iter().any(|n| n.id == node.id) {
            continue;
        }
        nodes.push(node);
    }

    let mut edges: Vec<Edge> = Vec::new();
    for line in lines
        .iter()
        .filter(|l| l.contains("->") && !l.contains("=>"))
    {
        let segments: Vec<&str> = line
            .split("->")
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        for pair in segments.windows(2) {
            let (from, label) = parse_segment(pair[0]);
            let (to, _) = parse_segment(pair[1]);
            if from.is_empty() || to.is_empty() {
                continue;
            }
            edges.push(Edge {
                from: from.to_string(),
                to: to.to_string(),
                label,
            });
        }
    }

    tracing::debug!(
        nodes = nodes.len(),
        edges = edges.len(),
        "converted legacy flowchart"
    );

    let mut out = vec!["flowchart TD".to_string()];
    for node in &nodes {
        out.push(format!(
            "    {}{}",
            node.id,
            node.ty.wrap(&format_label(&node.label))
        ));
    }
    for edge in &edges {
        match &edge.label {
            Some(label) => out.push(format!(
                "    {} -- {} --> {}",
                edge.from,
                format_label(label),
                edge.to
            )),
            None => out.push(format!("    {} --> {}", edge.from, edge.to)),
        }
    }
    out.join("\n")
}
