//! Core riddle types.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Riddle`] | One question with its correct and incorrect answers |
//! | [`RiddlesPayload`] | The fixed `{ "riddles": [...] }` schema used for parsing and storage |
//! | [`RiddlesForTopic`] | Public result: record id plus riddles |

pub mod riddle;

pub use riddle::{Riddle, RiddlesForTopic, RiddlesPayload};
