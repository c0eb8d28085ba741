//! Output repair and deduplication.
//!
//! Provides the path from raw generation text to riddles:
//! - [`RepairPipeline`]: ordered, named [`RepairStep`]s plus schema parsing
//! - [`RiddleValidator`]: per-riddle cleanup and rejection
//! - [`dedup_riddles`]: first-wins deduplication on question and answer
//! - [`RiddleExtractor`]: all of the above across several candidates
//!
//! # Examples
//!
//! ```
//! use riddlr::structured::RiddleExtractor;
//!
//! let raw = "```json\n[{\"question\":\"Q1\",\"correctAnswer\":\"A1\",\"incorrectAnswers\":[\"B\"]}]\n```";
//! let riddles = RiddleExtractor::new().extract(&[raw]);
//!
//! assert_eq!(riddles.len(), 1);
//! assert_eq!(riddles[0].question, "Q1");
//! ```

pub mod dedup;
pub mod error;
pub mod extractor;
pub mod repair;
pub mod validator;

pub use dedup::dedup_riddles;
pub use error::RepairError;
pub use extractor::{CandidatePolicy, RiddleExtractor};
pub use repair::{
    CollapseDoubleQuotes, CollapseSingleQuotes, RepairPipeline, RepairStep, Repaired,
    StripCodeFence, TruncateIncompleteTail,
};
pub use validator::RiddleValidator;
