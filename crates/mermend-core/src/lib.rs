#![forbid(unsafe_code)]

//! Repair pipeline for Mermaid text produced by language models (headless, synchronous).
//!
//! Stages, in order:
//! - extraction of the best diagram candidate from a free-form message ([`extract`])
//! - translation of the flowchart.js dialect ([`convert_legacy`])
//! - structural repair per diagram kind ([`repair`])
//! - approximate-grammar validation ([`validate`])
//! - a fixed, always-valid skeleton when repair is not enough ([`fallback`])
//!
//! Every stage is a pure function of its input. [`Engine`] bundles them with a set of
//! [`RepairOptions`].

pub mod detect;
pub mod error;
pub mod extract;
pub mod fallback;
mod grammar;
pub mod legacy;
pub mod options;
pub mod repair;
mod text;
pub mod validate;

pub use detect::{DiagramKind, detect_kind, detect_text_kind};
pub use error::{Error, Result};
pub use extract::{CandidateDiagram, ExtractSource, extract};
pub use fallback::fallback;
pub use legacy::{convert_legacy, is_legacy};
pub use options::RepairOptions;
pub use repair::{RepairStep, RepairTrace, repair, repair_with};
pub use validate::{Severity, ValidationOutcome, validate, validate_with};

use serde::Serialize;

/// Output of [`Engine::process`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Processed {
    /// Text to hand to the renderer: the repaired diagram, or the fallback skeleton.
    pub text: String,
    pub kind: DiagramKind,
    /// Validation of the repaired text (before any fallback substitution).
    pub outcome: ValidationOutcome,
    pub trace: RepairTrace,
    pub used_fallback: bool,
    pub source: ExtractSource,
    /// The repaired text, kept for diagnostics even when the fallback replaced it.
    pub repaired: String,
}

#[derive(Debug, Clone, Default)]
pub struct Engine {
    options: RepairOptions,
}

impl Engine {
    fn stage_timing_enabled() -> bool {
        static ENABLED: std::sync::OnceLock<bool> = std::sync::OnceLock::new();
        *ENABLED.get_or_init(|| {
            matches!(
                std::env::var("MERMEND_TRACE_STAGES").as_deref(),
                Ok("1") | Ok("true")
            )
        })
    }

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(mut self, options: RepairOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &RepairOptions {
        &self.options
    }

    pub fn repair(&self, text: &str, kind: DiagramKind) -> (String, RepairTrace) {
        repair_with(text, kind, &self.options)
    }

    pub fn validate(&self, text: &str, kind: DiagramKind) -> ValidationOutcome {
        validate_with(text, kind, &self.options)
    }

    /// Synchronous variant of [`Engine::process`].
    ///
    /// `hint` only applies when extraction finds no diagram keyword; it never overrides one.
    pub fn process_sync(&self, raw: &str, hint: Option<DiagramKind>) -> Processed {
        let timing_enabled = Self::stage_timing_enabled();
        let total_start = timing_enabled.then(std::time::Instant::now);

        let candidate = extract(raw);
        let mut trace = RepairTrace::default();
        trace.push("extract", candidate.text != raw.trim());

        let mut kind = candidate.kind;
        if !kind.is_known() {
            if let Some(hint) = hint.filter(|k| k.is_known()) {
                tracing::debug!(hint = %hint, "using caller-supplied diagram kind");
                kind = hint;
            }
        }

        let mut text = candidate.text;
        let legacy = self.options.convert_legacy && is_legacy(&text);
        if legacy {
            text = convert_legacy(&text);
            kind = DiagramKind::Flowchart;
        }
        trace.push("legacy", legacy);

        let repair_start = timing_enabled.then(std::time::Instant::now);
        let (repaired, repair_trace) = self.repair(&text, kind);
        trace.extend(repair_trace);
        let repair_elapsed = repair_start.map(|s| s.elapsed());

        let outcome = self.validate(&repaired, kind);
        let used_fallback = !outcome.is_valid();
        trace.push("fallback", used_fallback);
        if used_fallback {
            tracing::debug!(
                kind = %kind,
                errors = outcome.errors().len(),
                "repair insufficient; substituting fallback diagram"
            );
        }

        if let Some(start) = total_start {
            tracing::debug!(
                total = ?start.elapsed(),
                repair = ?repair_elapsed.unwrap_or_default(),
                input_bytes = raw.len(),
                "process timing"
            );
        }

        let final_text = if used_fallback {
            fallback(kind).to_string()
        } else {
            repaired.clone()
        };
        Processed {
            text: final_text,
            kind,
            outcome,
            trace,
            used_fallback,
            source: candidate.source,
            repaired,
        }
    }

    pub async fn process(&self, raw: &str, hint: Option<DiagramKind>) -> Processed {
        self.process_sync(raw, hint)
    }
}

#[cfg(test)]
mod tests;
