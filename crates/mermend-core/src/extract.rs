use crate::detect::{detect_kind, detect_text_kind, first_content_line};
use crate::{DiagramKind, legacy};
use regex::RegexSet;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Which extraction strategy produced a [`CandidateDiagram`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExtractSource {
    /// A fence tagged with the diagram language (```` ```mermaid ````).
    TaggedFence,
    /// An untagged (or differently tagged) fence whose content looks like a diagram.
    Fence,
    /// The whole message starts with a diagram keyword.
    Message,
    /// Lines accumulated after a keyword line found inside prose.
    LineSweep,
    /// Nothing diagram-shaped was found; the trimmed message is passed through.
    Raw,
}

/// Best-candidate diagram text pulled out of a free-form message. `text` may still be
/// malformed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateDiagram {
    pub text: String,
    pub kind: DiagramKind,
    pub source: ExtractSource,
}

impl CandidateDiagram {
    fn new(text: String, source: ExtractSource) -> Self {
        let kind = detect_text_kind(&text);
        Self { text, kind, source }
    }
}

const TAGS: &[&str] = &["mermaid", "mmd"];

#[derive(Debug)]
struct Fence<'a> {
    info: &'a str,
    lines: Vec<&'a str>,
}

impl Fence<'_> {
    fn is_tagged(&self) -> bool {
        let tag = self.info.split_whitespace().next().unwrap_or("");
        TAGS.iter().any(|t| tag.eq_ignore_ascii_case(t))
    }

    fn body(&self) -> String {
        let start = self.lines.iter().position(|l| !l.trim().is_empty());
        let end = self.lines.iter().rposition(|l| !l.trim().is_empty());
        match (start, end) {
            (Some(start), Some(end)) => self.lines[start..=end].join("\n"),
            _ => String::new(),
        }
    }
}

fn fence_marker(line: &str) -> Option<(&'static str, &str)> {
    let t = line.trim_start();
    for marker in ["```", "~~~"] {
        if let Some(rest) = t.strip_prefix(marker) {
            return Some((marker, rest.trim_start_matches(marker.chars().next()?)));
        }
    }
    None
}

/// Splits a message into fenced blocks. A fence left open at the end of the message (a
/// truncated model reply) runs to the end of the text.
fn fences(message: &str) -> Vec<Fence<'_>> {
    let mut out = Vec::new();
    let mut open: Option<(&'static str, Fence<'_>)> = None;
    for line in message.lines() {
        match open.take() {
            Some((marker, mut fence)) => {
                let closes = line.trim_start().starts_with(marker)
                    && line.trim().trim_start_matches(marker.chars().next().unwrap_or('`')).is_empty();
                if closes {
                    out.push(fence);
                } else {
                    fence.lines.push(line);
                    open = Some((marker, fence));
                }
            }
            None => {
                if let Some((marker, info)) = fence_marker(line) {
                    open = Some((
                        marker,
                        Fence {
                            info: info.trim(),
                            lines: Vec::new(),
                        },
                    ));
                }
            }
        }
    }
    if let Some((_, fence)) = open {
        out.push(fence);
    }
    out
}

fn sweep_patterns() -> &'static RegexSet {
    static SET: OnceLock<RegexSet> = OnceLock::new();
    SET.get_or_init(|| {
        RegexSet::new([
            // node definitions: A[..], B(..), C{..}, D>..], E((..))
            r"^[\w\-.]+\s*(?:\[|\(|\{|>)",
            // arrows of any supported grammar
            r"(?:-{2,}>?|={2,}>?|-\.+->?|->>?|--[ox)]|-[x)]|<\|--|--\|>|\*--|--\*|o--|\.\.>|<\.\.)",
            // ER cardinalities
            r"(?:\|o|\|\||\}o|\}\|)(?:--|\.\.)(?:o\||\|\||o\{|\|\{)",
            // declarations and block statements
            r"(?i)^(?:participant|actor|class|state|note|loop|alt|else|opt|par|and|end|subgraph|rect|critical|break|activate|deactivate|autonumber|box|direction|style|classDef|linkStyle|click|commit|branch|checkout|merge|cherry-pick)\b",
            // section and title headers
            r"(?i)^(?:section|title|dateFormat|axisFormat|excludes|todayMarker|accTitle|accDescr)\b",
            // pie slices and journey/gantt/timeline task lines
            r#"^"[^"]*"\s*:\s*[\d.]+$"#,
            r"^[^:]+:\s*(?:\d+|done|active|crit|milestone|after\b|[\w-]+\s*,|\d{4}-)",
            // block delimiters
            r"^[{}]$|\{$",
            // indented body lines
            r"^\s+\S",
        ])
        .expect("valid regex set")
    })
}

fn line_sweep(message: &str) -> Option<String> {
    let mut accumulated: Vec<&str> = Vec::new();
    let mut depth = 0usize;
    for line in message.lines() {
        if accumulated.is_empty() {
            if detect_kind(line).is_known() {
                accumulated.push(line.trim_start());
            }
            continue;
        }
        let t = line.trim();
        if t.is_empty() {
            accumulated.push("");
            continue;
        }
        let plausible = depth > 0 || sweep_patterns().is_match(line);
        if !plausible {
            break;
        }
        if t.ends_with('{') {
            depth += 1;
        } else if t == "}" {
            depth = depth.saturating_sub(1);
        }
        accumulated.push(line.trim_end());
    }
    while accumulated.last().is_some_and(|l| l.is_empty()) {
        accumulated.pop();
    }
    (!accumulated.is_empty()).then(|| accumulated.join("\n"))
}

/// Pulls the best diagram candidate out of a free-form message. Never fails: a message with no
/// recognizable diagram yields its trimmed text with [`DiagramKind::Unknown`].
pub fn extract(message: &str) -> CandidateDiagram {
    let fences = fences(message);

    if let Some(fence) = fences.iter().find(|f| f.is_tagged()) {
        return CandidateDiagram::new(fence.body(), ExtractSource::TaggedFence);
    }

    for fence in fences.iter().filter(|f| !f.is_tagged()) {
        let body = fence.body();
        if detect_text_kind(&body).is_known() || legacy::is_legacy(&body) {
            return CandidateDiagram::new(body, ExtractSource::Fence);
        }
    }

    let trimmed = message.trim();
    if first_content_line(trimmed).is_some_and(|l| detect_kind(l).is_known()) {
        return CandidateDiagram::new(trimmed.to_string(), ExtractSource::Message);
    }

    if let Some(swept) = line_sweep(message) {
        return CandidateDiagram::new(swept, ExtractSource::LineSweep);
    }

    CandidateDiagram {
        text: trimmed.to_string(),
        kind: DiagramKind::Unknown,
        source: ExtractSource::Raw,
    }
}
