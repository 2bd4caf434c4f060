//! Approximate-grammar patterns shared by the repair passes and the validator.
//!
//! These cover the structural subset needed to recognize and fix common defects; they are not a
//! Mermaid parser.

use regex::Regex;
use std::sync::OnceLock;

const SEQ_PARTICIPANT: &str = r#""[^"\n]+"|[^\s"+<>:;,\-][^"+<>:;,\-\n]*?"#;
const SEQ_ARROWS: &str = r"<<-->>|<<->>|-->>|->>|-->|->|--x|-x|--\)|-\)";

fn sequence_message(arrows: &str) -> String {
    format!(
        r"^(?P<from>{p})\s*(?P<arrow>{arrows})\s*(?P<act>[+\-]?)\s*(?P<to>{p})\s*(?::(?P<msg>.*))?$",
        p = SEQ_PARTICIPANT,
    )
}

/// `sender ARROW receiver[: message]` with the arrows Mermaid accepts.
pub(crate) fn sequence_message_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(&sequence_message(SEQ_ARROWS)).expect("valid regex"))
}

/// Like [`sequence_message_re`], but also accepts the bare `-` / `--` arrows that need
/// normalizing.
pub(crate) fn sequence_message_loose_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&sequence_message(&format!("{SEQ_ARROWS}|--|-"))).expect("valid regex")
    })
}

pub(crate) fn sequence_leading_arrow_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(&format!(r"^(?:{SEQ_ARROWS}|--|-)")).expect("valid regex"))
}

/// A whole `a -> b -> c` chain inside message text.
pub(crate) fn sequence_nested_arrow_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(r"\S+(?:\s*(?:{SEQ_ARROWS})\s*\S+)+")).expect("valid regex")
    })
}

pub(crate) fn sequence_declaration_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"(?i)^(?P<create>create\s+)?(?P<keyword>participant|actor)\s+(?P<name>"[^"]+"|.+?)(?P<alias>\s+as\s+.+)?$"#,
        )
        .expect("valid regex")
    })
}

const SEQ_CONTROL: &[&str] = &[
    "note",
    "loop",
    "alt",
    "else",
    "opt",
    "par",
    "par_over",
    "and",
    "critical",
    "option",
    "break",
    "rect",
    "end",
    "activate",
    "deactivate",
    "autonumber",
    "title",
    "acctitle",
    "accdescr",
    "box",
    "create",
    "destroy",
    "link",
    "links",
    "properties",
    "details",
];

fn first_word(line: &str) -> &str {
    line.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .next()
        .unwrap_or("")
}

/// Sequence control constructs (`note`, `loop`, `activate`, ...).
pub(crate) fn is_sequence_control(line: &str) -> bool {
    let word = first_word(line).to_ascii_lowercase();
    SEQ_CONTROL.contains(&word.as_str())
}

pub(crate) fn flowchart_arrow_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<?(?:-{2,}|={2,}|-\.+-)[>ox]?|~~~").expect("valid regex"))
}

/// `id[...]`, `id(...)`, `id{...}`, `id>...]`, `id@{...}`.
pub(crate) fn flowchart_node_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[\w\-.]+(?::::[\w\-]+)?\s*(?:\[|\(|\{|>|@\{)").expect("valid regex")
    })
}

pub(crate) fn flowchart_bare_node_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[\w\-.]+(?::::[\w\-]+)?$").expect("valid regex"))
}

const FLOWCHART_STATEMENTS: &[&str] = &[
    "subgraph",
    "end",
    "style",
    "classDef",
    "class",
    "click",
    "linkStyle",
    "direction",
    "accTitle",
    "accDescr",
];

pub(crate) fn is_flowchart_statement(line: &str) -> bool {
    let word = first_word(line);
    FLOWCHART_STATEMENTS.contains(&word)
}

pub(crate) fn class_relation_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"^(?P<lhs>[\w.~]+(?:\s*"[^"]*")?)\s*(?P<arrow><\|--|--\|>|\*--|--\*|o--|--o|<--|-->|<\.\.|\.\.>|<\|\.\.|\.\.\|>|\.\.|--)\s*(?P<rhs>(?:"[^"]*"\s*)?[\w.~]+)\s*(?::\s*(?P<label>.*?))?\s*$"#,
        )
        .expect("valid regex")
    })
}

pub(crate) fn class_declaration_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"^class\s+[A-Za-z_][\w\-]*(?:~[^~]+~)?(?:\s*\["[^"]*"\])?(?:\s*:::\s*[\w\-]+)?\s*\{?\s*$"#,
        )
        .expect("valid regex")
    })
}

const ER_ENTITY: &str = r#""[^"]+"|[\w\-.]+"#;
const ER_CARDINALITY: &str = r"(?:\|o|\|\||\}o|\}\|)(?:--|\.\.)(?:o\||\|\||o\{|\|\{)";

/// `ENTITY CARDINALITY ENTITY : label`.
pub(crate) fn er_relation_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            r"^(?P<a>{ER_ENTITY})\s*(?P<card>{ER_CARDINALITY})\s*(?P<b>{ER_ENTITY})\s*:\s*(?P<label>.*?)\s*$"
        ))
        .expect("valid regex")
    })
}

/// A relationship with the mandatory `: label` missing.
pub(crate) fn er_unlabeled_relation_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            r"^(?P<a>{ER_ENTITY})\s*(?P<card>{ER_CARDINALITY})\s*(?P<b>{ER_ENTITY})\s*$"
        ))
        .expect("valid regex")
    })
}

pub(crate) fn er_block_open_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(r"^(?:{ER_ENTITY})\s*(?:\[[^\]]*\])?\s*\{{$")).expect("valid regex")
    })
}

pub(crate) fn er_attribute_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"^[\w\-\[\]()]+\s+[\w\-*]+(?:\s+(?:PK|FK|UK)(?:,\s*(?:PK|FK|UK))*)?(?:\s+"[^"]*")?$"#,
        )
        .expect("valid regex")
    })
}

pub(crate) fn er_bare_entity_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[\w\-.]+$").expect("valid regex"))
}

const ER_STATEMENTS: &[&str] = &[
    "title",
    "direction",
    "accTitle",
    "accDescr",
    "style",
    "classDef",
    "class",
];

pub(crate) fn is_er_statement(line: &str) -> bool {
    ER_STATEMENTS.contains(&first_word(line))
}
