use super::split_header;
use crate::RepairOptions;
use crate::detect::is_comment;
use crate::grammar::{
    is_sequence_control, sequence_declaration_re, sequence_leading_arrow_re,
    sequence_message_loose_re, sequence_nested_arrow_re,
};
use crate::text::is_quoted;
use regex::NoExpand;

#[derive(Debug)]
struct Declaration {
    key: String,
    line: String,
    explicit: bool,
}

/// Participants in first-declaration order, deduplicated by unquoted name.
#[derive(Debug, Default)]
struct Participants {
    declared: Vec<Declaration>,
    /// Introduced mid-diagram by `create`; never hoisted.
    created: Vec<String>,
}

impl Participants {
    fn position(&self, key: &str) -> Option<usize> {
        self.declared.iter().position(|d| d.key == key)
    }

    fn declare_explicit(&mut self, key: String, line: String) {
        match self.position(&key) {
            // An explicit declaration (alias, actor) replaces an implicit one in place.
            Some(idx) if !self.declared[idx].explicit => {
                self.declared[idx].line = line;
                self.declared[idx].explicit = true;
            }
            Some(_) => {}
            None => self.declared.push(Declaration {
                key,
                line,
                explicit: true,
            }),
        }
    }

    fn declare_implicit(&mut self, name: &str) {
        let key = participant_key(name);
        if self.position(&key).is_some() || self.created.contains(&key) {
            return;
        }
        let line = format!("participant {}", display_name(&key));
        self.declared.push(Declaration {
            key,
            line,
            explicit: false,
        });
    }

    fn first(&self) -> Option<&str> {
        self.declared.first().map(|d| d.key.as_str())
    }
}

fn participant_key(name: &str) -> String {
    name.trim().trim_matches('"').to_string()
}

fn display_name(name: &str) -> String {
    if name.chars().any(char::is_whitespace) && !is_quoted(name) && !name.contains("@{") {
        format!("\"{name}\"")
    } else {
        name.to_string()
    }
}

fn normalize_arrow(arrow: &str) -> &str {
    match arrow {
        "-" => "->",
        "--" => "-->",
        other => other,
    }
}

fn sanitize_message(msg: &str, options: &RepairOptions) -> String {
    sequence_nested_arrow_re()
        .replace_all(msg, NoExpand(&options.nested_message_placeholder))
        .trim()
        .to_string()
}

/// Sequence pass: hoists participant declarations to the top, supplies missing senders and
/// normalizes arrows.
pub(super) fn repair_sequence(text: &str, options: &RepairOptions) -> String {
    let (preamble, body) = split_header(text);

    let mut participants = Participants::default();
    let mut last_sender: Option<String> = None;
    let mut interactions: Vec<String> = Vec::new();

    for line in body {
        let t = line.trim();
        if t.is_empty() || is_comment(t) {
            interactions.push(t.to_string());
            continue;
        }

        if let Some(caps) = sequence_declaration_re().captures(t) {
            let keyword = caps["keyword"].to_ascii_lowercase();
            let name = caps["name"].trim();
            let alias = caps.name("alias").map_or("", |m| m.as_str());
            let line = format!("{keyword} {}{alias}", display_name(name));
            if caps.name("create").is_some() {
                // `create participant` must stay where the participant comes into being.
                interactions.push(format!("create {line}"));
                participants.created.push(participant_key(name));
            } else {
                participants.declare_explicit(participant_key(name), line);
            }
            continue;
        }

        if is_sequence_control(t) {
            interactions.push(t.to_string());
            continue;
        }

        let mut candidate = t.to_string();
        if sequence_leading_arrow_re().is_match(t) {
            let sender = match last_sender
                .clone()
                .or_else(|| participants.first().map(display_name))
            {
                Some(sender) => sender,
                None => {
                    let name = options.default_participant.clone();
                    tracing::debug!(participant = %name, "synthesized default sender");
                    participants.declared.insert(
                        0,
                        Declaration {
                            key: name.clone(),
                            line: format!("participant {name}"),
                            explicit: false,
                        },
                    );
                    name
                }
            };
            candidate = format!("{sender}{t}");
        }

        let Some(caps) = sequence_message_loose_re().captures(&candidate) else {
            interactions.push(candidate);
            continue;
        };

        let from = caps["from"].trim();
        let to = caps["to"].trim();
        let arrow = normalize_arrow(&caps["arrow"]);
        let act = &caps["act"];
        participants.declare_implicit(from);
        participants.declare_implicit(to);
        last_sender = Some(display_name(&participant_key(from)));

        let mut out = format!("{from}{arrow}{act}{to}");
        if let Some(msg) = caps.name("msg") {
            let msg = sanitize_message(msg.as_str(), options);
            if msg.is_empty() {
                out.push(':');
            } else {
                out.push_str(": ");
                out.push_str(&msg);
            }
        }
        interactions.push(out);
    }

    let mut out: Vec<String> = preamble.iter().map(|l| l.trim().to_string()).collect();
    out.extend(participants.declared.into_iter().map(|d| d.line));
    out.extend(interactions);
    out.join("\n")
}
