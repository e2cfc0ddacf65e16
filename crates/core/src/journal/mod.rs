//! Journal entry processing.
//!
//! This module implements double-entry posting:
//! - Journal entries and their transaction lines
//! - Balanced-entry validation
//! - The processor that persists entries and propagates balance deltas
//! - Auto-entry templates

pub mod processor;
pub mod template;
pub mod types;
pub mod validation;

#[cfg(test)]
mod validation_props;

pub use processor::{JournalProcessor, Posting};
pub use template::{AutoEntryTemplate, TemplateDataType, TemplateOperation};
pub use types::{EntryHeader, EntryLine, JournalEntry, JournalEntryView, Transaction};
pub use validation::{EntryTotals, validate_lines};
