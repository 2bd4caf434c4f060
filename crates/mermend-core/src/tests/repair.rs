use crate::*;

fn repaired(text: &str, kind: DiagramKind) -> String {
    repair(text, kind).0
}

#[test]
fn cleanup_strips_fences_error_lines_and_blank_runs() {
    let text = "```mermaid\r\ngraph TD\r\nA-->B\r\nundefined\r\n\r\n\r\n\r\n\r\nB-->C\r\n```";
    assert_eq!(
        repaired(text, DiagramKind::Flowchart),
        "graph TD\nA-->B\n\nB-->C"
    );
}

#[test]
fn cleanup_error_tokens_are_case_insensitive_whole_lines() {
    let text = "graph TD\nA-->B\nNULL\n[object Object]\nB-->error_handler";
    assert_eq!(
        repaired(text, DiagramKind::Flowchart),
        "graph TD\nA-->B\nB-->error_handler"
    );
}

#[test]
fn cleanup_keeps_mindmap_indentation() {
    let text = "mindmap\n  root\n    child   \n      leaf";
    assert_eq!(
        repaired(text, DiagramKind::Mindmap),
        "mindmap\n  root\n    child\n      leaf"
    );
}

#[test]
fn header_is_inserted_for_known_kinds_only() {
    assert_eq!(repaired("A-->B", DiagramKind::Flowchart), "flowchart TD\nA-->B");
    assert_eq!(repaired("A-->B", DiagramKind::Unknown), "A-->B");
    assert_eq!(repaired("", DiagramKind::Flowchart), "");

    let options = RepairOptions {
        flowchart_direction: "LR".to_string(),
        ..RepairOptions::default()
    };
    assert_eq!(
        repair_with("A-->B", DiagramKind::Flowchart, &options).0,
        "flowchart LR\nA-->B"
    );

    let options = RepairOptions {
        insert_missing_header: false,
        ..RepairOptions::default()
    };
    let (text, trace) = repair_with("A-->B", DiagramKind::Flowchart, &options);
    assert_eq!(text, "A-->B");
    assert!(trace.steps().iter().all(|s| s.stage != "header"));
}

#[test]
fn header_is_inserted_after_front_matter() {
    let text = "---\ntitle: Demo\n---\nA-->B";
    assert_eq!(
        repaired(text, DiagramKind::Flowchart),
        "---\ntitle: Demo\n---\nflowchart TD\nA-->B"
    );
}

#[test]
fn trace_records_stages_in_order() {
    let (_, trace) = repair("A-->B", DiagramKind::Flowchart);
    let stages: Vec<&str> = trace.steps().iter().map(|s| s.stage).collect();
    assert_eq!(stages, ["cleanup", "header", "flowchart", "whitespace"]);
    assert!(trace.stage_changed("header"));
    assert!(!trace.stage_changed("flowchart"));
    assert!(trace.changed());

    let (_, trace) = repair("pie title Pets\n\"Dogs\" : 3", DiagramKind::Pie);
    let stages: Vec<&str> = trace.steps().iter().map(|s| s.stage).collect();
    assert_eq!(stages, ["cleanup", "header", "whitespace"]);
    assert!(!trace.changed());
}

#[test]
fn sequence_missing_sender_uses_default_participant() {
    assert_eq!(
        repaired("sequenceDiagram\n->>B: hi", DiagramKind::Sequence),
        "sequenceDiagram\nparticipant Actor1\nparticipant B\nActor1->>B: hi"
    );

    let options = RepairOptions {
        default_participant: "User".to_string(),
        ..RepairOptions::default()
    };
    assert_eq!(
        repair_with("sequenceDiagram\n->>B: hi", DiagramKind::Sequence, &options).0,
        "sequenceDiagram\nparticipant User\nparticipant B\nUser->>B: hi"
    );
}

#[test]
fn sequence_missing_sender_prefers_last_sender() {
    let text = "sequenceDiagram\nAlice->>Bob: Hello\n-->>Carol: Relay";
    assert_eq!(
        repaired(text, DiagramKind::Sequence),
        "sequenceDiagram
participant Alice
participant Bob
participant Carol
Alice->>Bob: Hello
Alice-->>Carol: Relay"
    );
}

#[test]
fn sequence_missing_sender_falls_back_to_first_declared() {
    let text = "sequenceDiagram\nparticipant Zed\n->>Amy: hi";
    assert_eq!(
        repaired(text, DiagramKind::Sequence),
        "sequenceDiagram\nparticipant Zed\nparticipant Amy\nZed->>Amy: hi"
    );
}

#[test]
fn sequence_bare_dash_arrows_are_normalized() {
    let text = "sequenceDiagram\nA-B: x\nB--A: y";
    assert_eq!(
        repaired(text, DiagramKind::Sequence),
        "sequenceDiagram\nparticipant A\nparticipant B\nA->B: x\nB-->A: y"
    );
}

#[test]
fn sequence_declarations_are_hoisted_and_deduplicated() {
    let text = "\
sequenceDiagram
Alice->>Bob: Hi
actor Bob as Robert
participant John Doe
participant Alice
Bob-->>Alice: Hey";
    assert_eq!(
        repaired(text, DiagramKind::Sequence),
        "sequenceDiagram
participant Alice
actor Bob as Robert
participant \"John Doe\"
Alice->>Bob: Hi
Bob-->>Alice: Hey"
    );
}

#[test]
fn sequence_nested_arrows_in_message_text_are_replaced() {
    let text = "sequenceDiagram\nA->>B: forward C->>D now";
    assert_eq!(
        repaired(text, DiagramKind::Sequence),
        "sequenceDiagram\nparticipant A\nparticipant B\nA->>B: forward (nested message) now"
    );
}

#[test]
fn sequence_arrow_chains_in_message_text_are_replaced_whole() {
    let text = "sequenceDiagram\nA->>B: go -> C -> D";
    let expected = "sequenceDiagram\nparticipant A\nparticipant B\nA->>B: (nested message)";
    assert_eq!(repaired(text, DiagramKind::Sequence), expected);
    assert!(validate(expected, DiagramKind::Sequence).is_valid());
}

#[test]
fn sequence_synthesized_sender_keeps_quoted_name() {
    let text = "sequenceDiagram\n\"Web Server\"->>B: hi\n->>C: x";
    assert_eq!(
        repaired(text, DiagramKind::Sequence),
        "sequenceDiagram
participant \"Web Server\"
participant B
participant C
\"Web Server\"->>B: hi
\"Web Server\"->>C: x"
    );
}

#[test]
fn sequence_control_lines_and_create_stay_in_place() {
    let text = "\
sequenceDiagram
loop Every minute
A->>B: ping
end
create participant C
B->>C: spawn";
    assert_eq!(
        repaired(text, DiagramKind::Sequence),
        "sequenceDiagram
participant A
participant B
loop Every minute
A->>B: ping
end
create participant C
B->>C: spawn"
    );
}

#[test]
fn flowchart_identifier_runs_become_chains() {
    let text = "graph TD\nA B C\nD[Start\nE[Go --> F\nsubgraph one two";
    assert_eq!(
        repaired(text, DiagramKind::Flowchart),
        "graph TD\nA --> B --> C\nD[Start]\nE[Go --> F\nsubgraph one two"
    );
}

#[test]
fn flowchart_labels_with_arrows_are_left_alone() {
    let text = "flowchart LR\nA[\"a --> b\"] --> B(Done)\nC{Ok?}";
    assert_eq!(repaired(text, DiagramKind::Flowchart), text);
}

#[test]
fn class_multi_word_labels_are_quoted_and_body_closed() {
    let text = "classDiagram\nAnimal <|-- Dog : is a\nOwner --> Dog : owns\nclass Dog {\n+bark()";
    assert_eq!(
        repaired(text, DiagramKind::Class),
        "classDiagram\nAnimal <|-- Dog : \"is a\"\nOwner --> Dog : owns\nclass Dog {\n+bark()\n}"
    );
}

#[test]
fn er_relationships_and_attributes_are_canonicalized() {
    let text = "\
erDiagram
CUSTOMER ||--o{ ORDER : places
CUSTOMER {
string   name
int id pk,fk
string email \"contact address\"
}
A ||--|{ B
A }o--|| C : says \"hi\"";
    assert_eq!(
        repaired(text, DiagramKind::EntityRelationship),
        "erDiagram
CUSTOMER ||--o{ ORDER : \"places\"
CUSTOMER {
  string name
  int id PK, FK
  string email \"contact address\"
}
A ||--|{ B : \"\"
A }o--|| C : \"says #quot;hi#quot;\""
    );
}

#[test]
fn er_open_block_is_closed() {
    let text = "erDiagram\nCUSTOMER {\nstring name";
    assert_eq!(
        repaired(text, DiagramKind::EntityRelationship),
        "erDiagram\nCUSTOMER {\n  string name\n}"
    );
}

#[test]
fn repair_is_idempotent() {
    let cases = [
        ("sequenceDiagram\n->>B: hi\nB-A: back", DiagramKind::Sequence),
        ("A B C\nD[Start", DiagramKind::Flowchart),
        ("classDiagram\nA <|-- B : is a\nclass B {\n+x", DiagramKind::Class),
        (
            "erDiagram\nA ||--o{ B : has\nA {\nint id pk\n",
            DiagramKind::EntityRelationship,
        ),
        ("mindmap\n  root\n    leaf", DiagramKind::Mindmap),
        ("sequenceDiagram\nA->>B: go -> C -> D", DiagramKind::Sequence),
        ("sequenceDiagram\n\"Web Server\"->>B: hi\n->>C: x", DiagramKind::Sequence),
        ("erDiagram\nORDER {\nint id PK FK", DiagramKind::EntityRelationship),
    ];
    for (text, kind) in cases {
        let once = repaired(text, kind);
        let twice = repaired(&once, kind);
        assert_eq!(once, twice, "repair not idempotent for {kind}");
    }
}

#[test]
fn er_space_separated_key_markers_are_joined() {
    let text = "erDiagram\nORDER {\nint id PK FK\nint customer_id fk uk\nstring note \"free text\"\n}";
    let expected = "erDiagram
ORDER {
  int id PK, FK
  int customer_id FK, UK
  string note \"free text\"
}";
    assert_eq!(repaired(text, DiagramKind::EntityRelationship), expected);
    assert!(validate(expected, DiagramKind::EntityRelationship).is_valid());
}
