//! Account code rules.
//!
//! Codes are strings of ASCII digits whose length fixes the level:
//! 4 digits for level 1, 8 for level 2, 11 for level 3 and 14 for level 4.
//! A child code always starts with its parent's code.

use crate::error::LedgerError;

/// Code length per level, index 0 is level 1.
pub const CODE_LENGTHS: [usize; 4] = [4, 8, 11, 14];

/// Deepest level of the chart.
pub const MAX_LEVEL: u8 = 4;

/// Returns the code length for a level, if the level exists.
#[must_use]
pub fn code_length(level: u8) -> Option<usize> {
    CODE_LENGTHS.get(usize::from(level).checked_sub(1)?).copied()
}

/// Returns the level a code length maps to.
#[must_use]
pub fn level_for_length(length: usize) -> Option<u8> {
    CODE_LENGTHS
        .iter()
        .position(|&l| l == length)
        .and_then(|i| u8::try_from(i + 1).ok())
}

/// Derives the level from the code and checks it against an explicit level.
pub fn resolve_level_and_validate(code: &str, explicit_level: Option<u8>) -> Result<u8, LedgerError> {
    if code.is_empty() || !code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(LedgerError::InvalidCode(code.to_string()));
    }

    let level = level_for_length(code.len()).ok_or_else(|| LedgerError::InvalidCodeLength {
        code: code.to_string(),
        length: code.len(),
    })?;

    match explicit_level {
        Some(requested) if code_length(requested).is_none() => {
            Err(LedgerError::InvalidLevel(requested))
        }
        Some(requested) if requested != level => Err(LedgerError::LevelMismatch {
            code: code.to_string(),
            level: requested,
        }),
        _ => Ok(level),
    }
}

/// Returns the parent's code for a validated code, `None` at level 1.
#[must_use]
pub fn parent_code(code: &str) -> Option<&str> {
    let level = level_for_length(code.len())?;
    let parent_len = code_length(level.checked_sub(1)?)?;
    code.get(..parent_len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1001", 1)]
    #[case("10010001", 2)]
    #[case("10010001001", 3)]
    #[case("10010001001001", 4)]
    fn test_level_from_code(#[case] code: &str, #[case] level: u8) {
        assert_eq!(resolve_level_and_validate(code, None).unwrap(), level);
        assert_eq!(resolve_level_and_validate(code, Some(level)).unwrap(), level);
    }

    #[rstest]
    #[case("100")]
    #[case("10010")]
    #[case("100100010010010")]
    fn test_unsupported_length(#[case] code: &str) {
        assert!(matches!(
            resolve_level_and_validate(code, None),
            Err(LedgerError::InvalidCodeLength { .. })
        ));
    }

    #[test]
    fn test_non_digit_code() {
        assert!(matches!(
            resolve_level_and_validate("10a1", None),
            Err(LedgerError::InvalidCode(_))
        ));
        assert!(matches!(
            resolve_level_and_validate("", None),
            Err(LedgerError::InvalidCode(_))
        ));
    }

    #[test]
    fn test_explicit_level_must_match() {
        assert!(matches!(
            resolve_level_and_validate("1001", Some(2)),
            Err(LedgerError::LevelMismatch { level: 2, .. })
        ));
        assert!(matches!(
            resolve_level_and_validate("1001", Some(0)),
            Err(LedgerError::InvalidLevel(0))
        ));
        assert!(matches!(
            resolve_level_and_validate("1001", Some(5)),
            Err(LedgerError::InvalidLevel(5))
        ));
    }

    #[test]
    fn test_parent_code() {
        assert_eq!(parent_code("1001"), None);
        assert_eq!(parent_code("10010002"), Some("1001"));
        assert_eq!(parent_code("10010002003"), Some("10010002"));
        assert_eq!(parent_code("10010002003004"), Some("10010002003"));
        assert_eq!(parent_code("123"), None);
    }
}
