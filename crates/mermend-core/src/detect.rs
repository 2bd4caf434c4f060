use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The closed set of diagram grammars the pipeline knows how to repair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DiagramKind {
    Flowchart,
    Sequence,
    Class,
    Journey,
    Gantt,
    State,
    #[serde(rename = "er")]
    EntityRelationship,
    Pie,
    GitGraph,
    Mindmap,
    Timeline,
    C4,
    Unknown,
}

impl DiagramKind {
    /// Every known kind, in keyword-table order. `Unknown` is not included.
    pub const ALL: [DiagramKind; 12] = [
        DiagramKind::Flowchart,
        DiagramKind::Sequence,
        DiagramKind::Class,
        DiagramKind::Journey,
        DiagramKind::Gantt,
        DiagramKind::State,
        DiagramKind::EntityRelationship,
        DiagramKind::Pie,
        DiagramKind::GitGraph,
        DiagramKind::Mindmap,
        DiagramKind::Timeline,
        DiagramKind::C4,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Self::Flowchart => "flowchart",
            Self::Sequence => "sequence",
            Self::Class => "class",
            Self::Journey => "journey",
            Self::Gantt => "gantt",
            Self::State => "state",
            Self::EntityRelationship => "er",
            Self::Pie => "pie",
            Self::GitGraph => "gitGraph",
            Self::Mindmap => "mindmap",
            Self::Timeline => "timeline",
            Self::C4 => "c4",
            Self::Unknown => "unknown",
        }
    }

    /// Header keyword written when a diagram of this kind has to be (re)created from scratch.
    ///
    /// Flowchart headers carry a direction, which callers append themselves.
    pub fn header_keyword(self) -> &'static str {
        match self {
            Self::Flowchart | Self::Unknown => "flowchart",
            Self::Sequence => "sequenceDiagram",
            Self::Class => "classDiagram",
            Self::Journey => "journey",
            Self::Gantt => "gantt",
            Self::State => "stateDiagram-v2",
            Self::EntityRelationship => "erDiagram",
            Self::Pie => "pie",
            Self::GitGraph => "gitGraph",
            Self::Mindmap => "mindmap",
            Self::Timeline => "timeline",
            Self::C4 => "C4Context",
        }
    }

    pub fn is_known(self) -> bool {
        self != Self::Unknown
    }
}

impl fmt::Display for DiagramKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for DiagramKind {
    type Err = Error;

    /// Accepts canonical ids (`er`, `gitGraph`) as well as header keywords (`erDiagram`).
    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim();
        if name.eq_ignore_ascii_case("unknown") {
            return Ok(Self::Unknown);
        }
        for kind in Self::ALL {
            if name.eq_ignore_ascii_case(kind.id()) {
                return Ok(kind);
            }
        }
        match detect_kind(name) {
            Self::Unknown => Err(Error::UnknownDiagramKind {
                name: name.to_string(),
            }),
            kind => Ok(kind),
        }
    }
}

// The order is significant: the first matching keyword wins.
const KEYWORDS: &[(&str, DiagramKind)] = &[
    ("sequenceDiagram", DiagramKind::Sequence),
    ("classDiagram", DiagramKind::Class),
    ("stateDiagram", DiagramKind::State),
    ("erDiagram", DiagramKind::EntityRelationship),
    ("journey", DiagramKind::Journey),
    ("gantt", DiagramKind::Gantt),
    ("pie", DiagramKind::Pie),
    ("gitGraph", DiagramKind::GitGraph),
    ("mindmap", DiagramKind::Mindmap),
    ("timeline", DiagramKind::Timeline),
    ("C4Context", DiagramKind::C4),
    ("C4Container", DiagramKind::C4),
    ("C4Component", DiagramKind::C4),
    ("C4Dynamic", DiagramKind::C4),
    ("C4Deployment", DiagramKind::C4),
    ("flowchart", DiagramKind::Flowchart),
    ("graph", DiagramKind::Flowchart),
];

fn keyword_boundary_ok(rest: &str) -> bool {
    match rest.chars().next() {
        None => true,
        Some(c) => c.is_whitespace() || matches!(c, '-' | ':' | ';'),
    }
}

/// Classifies a single line by case-insensitive keyword prefix.
pub fn detect_kind(line: &str) -> DiagramKind {
    let line = line.trim_start();
    for (keyword, kind) in KEYWORDS {
        let Some(head) = line.get(..keyword.len()) else {
            continue;
        };
        if head.eq_ignore_ascii_case(keyword) && keyword_boundary_ok(&line[keyword.len()..]) {
            return *kind;
        }
    }
    DiagramKind::Unknown
}

pub(crate) fn is_comment(line: &str) -> bool {
    line.trim_start().starts_with("%%")
}

/// Index of the first line that carries diagram content, skipping blank lines, `%%` comments
/// and a leading `---` front-matter block.
pub fn first_content_index(text: &str) -> Option<usize> {
    let mut in_front_matter = false;
    let mut seen_content = false;
    for (idx, line) in text.lines().enumerate() {
        let t = line.trim();
        if in_front_matter {
            if t == "---" {
                in_front_matter = false;
            }
            continue;
        }
        if t.is_empty() || is_comment(t) {
            continue;
        }
        if t == "---" && !seen_content {
            in_front_matter = true;
            seen_content = true;
            continue;
        }
        return Some(idx);
    }
    None
}

pub fn first_content_line(text: &str) -> Option<&str> {
    let idx = first_content_index(text)?;
    text.lines().nth(idx).map(str::trim)
}

/// Index of the header line, if the first content line is a keyword line.
pub fn header_index(text: &str) -> Option<usize> {
    let idx = first_content_index(text)?;
    let line = text.lines().nth(idx)?;
    detect_kind(line).is_known().then_some(idx)
}

/// Classifies a whole text block by its first content line.
pub fn detect_text_kind(text: &str) -> DiagramKind {
    first_content_line(text).map_or(DiagramKind::Unknown, detect_kind)
}
