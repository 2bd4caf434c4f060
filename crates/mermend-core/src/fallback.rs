use crate::DiagramKind;

/// A minimal diagram of `kind` that always passes validation. Depends only on `kind`; the text
/// that failed to repair is never consulted.
pub fn fallback(kind: DiagramKind) -> &'static str {
    match kind {
        DiagramKind::Flowchart | DiagramKind::Unknown => {
            "flowchart TD\n    A[Start] --> B[End]"
        }
        DiagramKind::Sequence => {
            "sequenceDiagram\n    participant A\n    participant B\n    A->>B: Request\n    B-->>A: Response"
        }
        DiagramKind::Class => "classDiagram\n    class A\n    class B\n    A --> B",
        DiagramKind::Journey => {
            "journey\n    title User Journey\n    section Start\n      Begin: 5: User"
        }
        DiagramKind::Gantt => {
            "gantt\n    title Plan\n    dateFormat YYYY-MM-DD\n    section Tasks\n    Task: t1, 2024-01-01, 1d"
        }
        DiagramKind::State => "stateDiagram-v2\n    [*] --> Idle\n    Idle --> [*]",
        DiagramKind::EntityRelationship => {
            "erDiagram\n    ENTITY_A ||--o{ ENTITY_B : \"relates to\""
        }
        DiagramKind::Pie => "pie title Distribution\n    \"A\" : 50\n    \"B\" : 50",
        DiagramKind::GitGraph => "gitGraph\n    commit\n    commit",
        DiagramKind::Mindmap => "mindmap\n  root((Topic))\n    Idea",
        DiagramKind::Timeline => "timeline\n    title Timeline\n    2024 : Event",
        DiagramKind::C4 => {
            "C4Context\n    title System Context\n    Person(user, \"User\")\n    System(system, \"System\")\n    Rel(user, system, \"Uses\")"
        }
    }
}
