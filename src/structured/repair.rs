//! Text repair for loosely structured model output.
//!
//! Models asked for a JSON array of riddles tend to wrap it in a markdown
//! fence, double up quotes, or get cut off mid-object. Each fix is a named
//! [`RepairStep`] that only fires when its precondition matches, and a
//! [`RepairPipeline`] runs them in a fixed order. New rules are appended as new
//! steps so existing ones keep their behavior.

use super::error::RepairError;
use crate::types::{Riddle, RiddlesPayload};
use once_cell::sync::Lazy;
use regex::Regex;

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\A\s*```[A-Za-z0-9_+\-]*[ \t]*\r?\n?(.*?)\s*```\s*\z")
        .expect("static regex is valid")
});
static DOUBLE_QUOTE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""{2,}"#).expect("static regex is valid"));
static SINGLE_QUOTE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"'{2,}").expect("static regex is valid"));
static COMPLETE_ARRAY_TAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\}\s*\]\s*\z").expect("static regex is valid"));

/// One conditional rewrite of the model output.
pub trait RepairStep: Send + Sync {
    fn name(&self) -> &'static str;

    /// The rewritten text, or `None` when the precondition does not hold.
    fn apply(&self, text: &str) -> Option<String>;
}

/// Removes a leading ```` ```lang ```` marker and the closing ```` ``` ````,
/// only when both are present.
#[derive(Debug, Clone, Copy, Default)]
pub struct StripCodeFence;

impl RepairStep for StripCodeFence {
    fn name(&self) -> &'static str {
        "strip_code_fence"
    }

    fn apply(&self, text: &str) -> Option<String> {
        CODE_FENCE
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|inner| inner.as_str().to_string())
    }
}

/// Collapses runs of two or more `"` into one.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollapseDoubleQuotes;

impl RepairStep for CollapseDoubleQuotes {
    fn name(&self) -> &'static str {
        "collapse_double_quotes"
    }

    fn apply(&self, text: &str) -> Option<String> {
        collapse(&DOUBLE_QUOTE_RUN, text, "\"")
    }
}

/// Collapses runs of two or more `'` into one.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollapseSingleQuotes;

impl RepairStep for CollapseSingleQuotes {
    fn name(&self) -> &'static str {
        "collapse_single_quotes"
    }

    fn apply(&self, text: &str) -> Option<String> {
        collapse(&SINGLE_QUOTE_RUN, text, "'")
    }
}

fn collapse(run: &Regex, text: &str, with: &str) -> Option<String> {
    if run.is_match(text) {
        Some(run.replace_all(text, with).into_owned())
    } else {
        None
    }
}

/// Recovers an array cut off mid-object: when the text does not end in `}]`,
/// everything after the last `},` is dropped and the array is closed.
#[derive(Debug, Clone, Copy, Default)]
pub struct TruncateIncompleteTail;

impl RepairStep for TruncateIncompleteTail {
    fn name(&self) -> &'static str {
        "truncate_incomplete_tail"
    }

    fn apply(&self, text: &str) -> Option<String> {
        if COMPLETE_ARRAY_TAIL.is_match(text) {
            return None;
        }
        text.rfind("},").map(|boundary| format!("{}}}]", &text[..boundary]))
    }
}

/// Text after repair plus the names of the steps that fired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repaired {
    pub text: String,
    pub applied: Vec<&'static str>,
}

/// Ordered list of repair steps.
pub struct RepairPipeline {
    steps: Vec<Box<dyn RepairStep>>,
}

impl RepairPipeline {
    /// A pipeline with no steps.
    pub fn empty() -> Self {
        Self { steps: Vec::new() }
    }

    /// Fence stripping, quote collapsing, then tail truncation.
    pub fn standard() -> Self {
        Self::empty()
            .with_step(StripCodeFence)
            .with_step(CollapseDoubleQuotes)
            .with_step(CollapseSingleQuotes)
            .with_step(TruncateIncompleteTail)
    }

    pub fn with_step(mut self, step: impl RepairStep + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    pub fn repair(&self, raw: &str) -> Repaired {
        let mut text = raw.trim().to_string();
        let mut applied = Vec::new();
        for step in &self.steps {
            if let Some(rewritten) = step.apply(&text) {
                tracing::trace!(step = step.name(), "repair step applied");
                text = rewritten;
                applied.push(step.name());
            }
        }
        Repaired { text, applied }
    }

    /// Repairs `raw` and parses it as the fixed `{"riddles": [...]}` schema.
    pub fn parse(&self, raw: &str) -> Result<Vec<Riddle>, RepairError> {
        if raw.trim().is_empty() {
            return Err(RepairError::Empty);
        }
        let repaired = self.repair(raw);
        let wrapped = format!("{{\"riddles\": {}}}", repaired.text.trim());
        serde_json::from_str::<RiddlesPayload>(&wrapped)
            .map(|payload| payload.riddles)
            .map_err(|source| RepairError::Schema {
                applied: if repaired.applied.is_empty() {
                    "none".to_string()
                } else {
                    repaired.applied.join(", ")
                },
                source,
            })
    }
}

impl Default for RepairPipeline {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for RepairPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepairPipeline")
            .field("steps", &self.step_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fence_requires_both_markers() {
        let fenced = "```json\n[{\"a\":1}]\n```";
        assert_eq!(StripCodeFence.apply(fenced).as_deref(), Some("[{\"a\":1}]"));
        assert_eq!(
            StripCodeFence.apply("```\n[1]\n```  ").as_deref(),
            Some("[1]")
        );
        assert_eq!(StripCodeFence.apply("```json\n[{\"a\":1}]"), None);
        assert_eq!(StripCodeFence.apply("[{\"a\":1}]\n```"), None);
    }

    #[test]
    fn test_quote_collapsing() {
        assert_eq!(
            CollapseDoubleQuotes.apply(r#"{""question"": """Q"""}"#).as_deref(),
            Some(r#"{"question": "Q"}"#)
        );
        assert_eq!(CollapseDoubleQuotes.apply(r#"{"q": "Q"}"#), None);
        assert_eq!(
            CollapseSingleQuotes.apply("It''s").as_deref(),
            Some("It's")
        );
        assert_eq!(CollapseSingleQuotes.apply("It's"), None);
    }

    #[test]
    fn test_truncate_incomplete_tail() {
        let cut = r#"[{"q":"1"},{"q":"2"},{"q":"3"#;
        assert_eq!(
            TruncateIncompleteTail.apply(cut).as_deref(),
            Some(r#"[{"q":"1"},{"q":"2"}]"#)
        );
        assert_eq!(TruncateIncompleteTail.apply(r#"[{"q":"1"}]"#), None);
        assert_eq!(TruncateIncompleteTail.apply("[{\"q\":\"1\"}\n]\n"), None);
        // No complete object boundary to fall back to.
        assert_eq!(TruncateIncompleteTail.apply(r#"[{"q":"1"#), None);
    }

    #[test]
    fn test_fenced_output_yields_one_riddle() {
        let raw = "```json\n[{\"question\":\"Q1\",\"correctAnswer\":\"A1\",\"incorrectAnswers\":[\"B\"]}]\n```";
        let pipeline = RepairPipeline::standard();
        assert_eq!(pipeline.repair(raw).applied, vec!["strip_code_fence"]);
        let riddles = pipeline.parse(raw).unwrap();
        assert_eq!(riddles.len(), 1);
        assert_eq!(riddles[0].question, "Q1");
        assert_eq!(riddles[0].incorrect_answers, vec!["B"]);
    }

    #[test]
    fn test_truncated_output_keeps_complete_objects() {
        let raw = r#"[{"question":"Q1","correctAnswer":"A1","incorrectAnswers":[]},{"question":"Q2","correctAnswer"#;
        let riddles = RepairPipeline::standard().parse(raw).unwrap();
        assert_eq!(riddles.len(), 1);
        assert_eq!(riddles[0].question, "Q1");
    }

    #[test]
    fn test_numeric_answers_parse_alongside_text_answers() {
        let raw = "```json\n[{\"question\":\"Apollo 11 year?\",\"correctAnswer\":1969,\"incorrectAnswers\":[1968,null]},{\"question\":\"Q2\",\"correctAnswer\":\"A2\",\"incorrectAnswers\":null}]\n```";
        let riddles = RepairPipeline::standard().parse(raw).unwrap();
        assert_eq!(riddles.len(), 2);
        assert_eq!(riddles[0].correct_answer, "1969");
        assert_eq!(riddles[0].incorrect_answers, vec!["1968", ""]);
        assert!(riddles[1].incorrect_answers.is_empty());
    }

    #[test]
    fn test_unrepairable_output_reports_steps() {
        let pipeline = RepairPipeline::standard();
        assert!(matches!(pipeline.parse("  \n"), Err(RepairError::Empty)));
        match pipeline.parse("Sorry, I cannot help with that.") {
            Err(RepairError::Schema { applied, .. }) => assert_eq!(applied, "none"),
            other => panic!("expected schema error, got {:?}", other),
        }
    }

    #[test]
    fn test_custom_steps_run_after_standard_ones() {
        struct Uppercase;
        impl RepairStep for Uppercase {
            fn name(&self) -> &'static str {
                "uppercase"
            }
            fn apply(&self, text: &str) -> Option<String> {
                Some(text.to_uppercase())
            }
        }
        let pipeline = RepairPipeline::standard().with_step(Uppercase);
        assert_eq!(
            pipeline.step_names(),
            vec![
                "strip_code_fence",
                "collapse_double_quotes",
                "collapse_single_quotes",
                "truncate_incomplete_tail",
                "uppercase"
            ]
        );
        assert_eq!(pipeline.repair("[{}]").text, "[{}]");
    }
}
