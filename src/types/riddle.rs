//! Riddle data model shared by the repair engine, the store and the public result.

use serde::{Deserialize, Serialize};

/// A single multiple-choice trivia item.
///
/// `question` and `correct_answer` default to empty strings when the model
/// omits them, so one sloppy item does not spoil the whole response; such
/// items are dropped later by validation. Text fields also accept bare
/// numbers and booleans (a year, a count) and treat `null` as absent.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Riddle {
    #[serde(default, deserialize_with = "lenient::string")]
    pub question: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub correct_answer: String,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub incorrect_answers: Vec<String>,
    #[serde(
        default,
        deserialize_with = "lenient::optional_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub explanation: Option<String>,
    #[serde(
        rename = "citationURL",
        alias = "citationUrl",
        default,
        deserialize_with = "lenient::optional_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub citation_url: Option<String>,
}

/// Scalar-to-string coercion for model-written text fields.
mod lenient {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn scalar<E: serde::de::Error>(value: Value) -> Result<Option<String>, E> {
        match value {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s)),
            Value::Number(n) => Ok(Some(n.to_string())),
            Value::Bool(b) => Ok(Some(b.to_string())),
            other => Err(E::custom(format!(
                "expected a string, number or boolean, found {}",
                other
            ))),
        }
    }

    pub fn string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(scalar(Value::deserialize(deserializer)?)?.unwrap_or_default())
    }

    pub fn optional_string<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        scalar(Value::deserialize(deserializer)?)
    }

    /// `null` reads as an empty list and `null` items as empty strings.
    pub fn string_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(Vec::new()),
            Value::Array(items) => items
                .into_iter()
                .map(|item| scalar(item).map(Option::unwrap_or_default))
                .collect(),
            other => Err(D::Error::custom(format!("expected a list, found {}", other))),
        }
    }
}

impl Riddle {
    pub fn new(question: impl Into<String>, correct_answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            correct_answer: correct_answer.into(),
            ..Default::default()
        }
    }

    pub fn with_incorrect_answers<I, S>(mut self, answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.incorrect_answers = answers.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }

    pub fn with_citation_url(mut self, url: impl Into<String>) -> Self {
        self.citation_url = Some(url.into());
        self
    }
}

/// The fixed schema riddles are parsed into and persisted as.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RiddlesPayload {
    #[serde(default)]
    pub riddles: Vec<Riddle>,
}

impl RiddlesPayload {
    pub fn new(riddles: Vec<Riddle>) -> Self {
        Self { riddles }
    }
}

/// Public result of a "get riddles for topic" call.
///
/// The default value (empty id, no riddles) is what callers receive when no
/// riddles could be produced.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RiddlesForTopic {
    pub id: String,
    #[serde(default)]
    pub riddles: Vec<Riddle>,
}

impl RiddlesForTopic {
    pub fn is_empty(&self) -> bool {
        self.riddles.is_empty()
    }
}
