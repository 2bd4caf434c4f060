use crate::{Error, Result};
use serde::{Deserialize, Serialize};

const FLOWCHART_DIRECTIONS: &[&str] = &["TB", "TD", "BT", "RL", "LR"];

/// Tunables for the repair pipeline.
///
/// Missing JSON fields fall back to [`RepairOptions::default`], so partial overrides such as
/// `{"defaultParticipant": "User"}` are valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RepairOptions {
    /// Literal tokens that indicate a serialization accident upstream (`undefined`, `null`, ...).
    pub error_tokens: Vec<String>,
    /// Participant synthesized when a sequence message has no sender and none is known.
    pub default_participant: String,
    /// Replaces arrow expressions nested inside sequence message text.
    pub nested_message_placeholder: String,
    /// Direction used when a flowchart header has to be created.
    pub flowchart_direction: String,
    pub convert_legacy: bool,
    pub insert_missing_header: bool,
}

impl Default for RepairOptions {
    fn default() -> Self {
        Self {
            error_tokens: ["error", "undefined", "null", "NaN", "[object Object]"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            default_participant: "Actor1".to_string(),
            nested_message_placeholder: "(nested message)".to_string(),
            flowchart_direction: "TD".to_string(),
            convert_legacy: true,
            insert_missing_header: true,
        }
    }
}

impl RepairOptions {
    pub fn from_json(text: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(text).map_err(|e| Error::InvalidOptionsJson {
            message: e.to_string(),
        })?;
        options.check()?;
        Ok(options)
    }

    pub fn check(&self) -> Result<()> {
        let participant = self.default_participant.as_str();
        if participant.is_empty()
            || !participant
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(Error::InvalidOption {
                field: "defaultParticipant",
                message: format!("must be a non-empty identifier, got {participant:?}"),
            });
        }
        if !FLOWCHART_DIRECTIONS.contains(&self.flowchart_direction.as_str()) {
            return Err(Error::InvalidOption {
                field: "flowchartDirection",
                message: format!(
                    "expected one of {}, got {:?}",
                    FLOWCHART_DIRECTIONS.join("/"),
                    self.flowchart_direction
                ),
            });
        }
        if self.error_tokens.iter().any(|t| t.trim().is_empty()) {
            return Err(Error::InvalidOption {
                field: "errorTokens",
                message: "tokens must not be blank".to_string(),
            });
        }
        Ok(())
    }

    /// Whether `line` consists solely of an error-indicator token (case-insensitive).
    pub(crate) fn is_error_line(&self, line: &str) -> bool {
        let line = line.trim();
        self.error_tokens
            .iter()
            .any(|token| line.eq_ignore_ascii_case(token))
    }

    pub(crate) fn flowchart_header(&self) -> String {
        format!("flowchart {}", self.flowchart_direction)
    }
}
