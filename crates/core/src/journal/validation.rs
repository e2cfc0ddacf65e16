//! Journal entry line validation.
//!
//! Runs before any read or write: an entry that fails here leaves no trace.

use rust_decimal::Decimal;
use tally_shared::types::round_money;

use super::types::EntryLine;
use crate::error::LedgerError;

/// Debit and credit sums of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryTotals {
    /// Sum of debits.
    pub debit: Decimal,
    /// Sum of credits.
    pub credit: Decimal,
    /// Whether debits equal credits.
    pub is_balanced: bool,
}

impl EntryTotals {
    /// Sums the lines.
    #[must_use]
    pub fn of(lines: &[EntryLine]) -> Self {
        let debit: Decimal = lines.iter().map(|l| l.debit).sum();
        let credit: Decimal = lines.iter().map(|l| l.credit).sum();
        Self {
            debit,
            credit,
            is_balanced: debit == credit,
        }
    }

    /// Returns the difference between debits and credits.
    #[must_use]
    pub fn difference(&self) -> Decimal {
        self.debit - self.credit
    }

    fn ensure_balanced(self) -> Result<Self, LedgerError> {
        if self.is_balanced {
            Ok(self)
        } else {
            Err(LedgerError::UnbalancedEntry {
                debit: self.debit,
                credit: self.credit,
            })
        }
    }
}

/// Checks the lines and returns them rounded to money precision.
///
/// Rejects an empty entry and negative amounts. Debits must equal credits
/// exactly, both as submitted and after rounding, so the stored lines
/// balance too.
pub fn validate_lines(lines: &[EntryLine]) -> Result<Vec<EntryLine>, LedgerError> {
    if lines.is_empty() {
        return Err(LedgerError::NoLines);
    }
    for line in lines {
        if line.debit < Decimal::ZERO || line.credit < Decimal::ZERO {
            return Err(LedgerError::NegativeAmount(line.account_id));
        }
    }

    EntryTotals::of(lines).ensure_balanced()?;

    let rounded: Vec<EntryLine> = lines
        .iter()
        .map(|line| EntryLine {
            debit: round_money(line.debit),
            credit: round_money(line.credit),
            ..line.clone()
        })
        .collect();
    EntryTotals::of(&rounded).ensure_balanced()?;

    Ok(rounded)
}
