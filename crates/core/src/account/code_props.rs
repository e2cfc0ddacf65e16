//! Property-based tests for account code rules.
//!
//! - Level always equals the table lookup of the code length
//! - A child's parent code is the level-1-length prefix

use proptest::prelude::*;

use super::code::{CODE_LENGTHS, code_length, parent_code, resolve_level_and_validate};

/// Strategy to generate a valid code at a random level.
fn valid_code() -> impl Strategy<Value = (u8, String)> {
    (1u8..=4).prop_flat_map(|level| {
        let len = CODE_LENGTHS[usize::from(level) - 1];
        proptest::collection::vec(0u8..10, len).prop_map(move |digits| {
            let code: String = digits.iter().map(|d| char::from(b'0' + d)).collect();
            (level, code)
        })
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_level_matches_length_table((level, code) in valid_code()) {
        let resolved = resolve_level_and_validate(&code, None).unwrap();
        prop_assert_eq!(resolved, level);
        prop_assert_eq!(code_length(resolved), Some(code.len()));
    }

    #[test]
    fn prop_parent_code_is_prefix((level, code) in valid_code()) {
        match parent_code(&code) {
            None => prop_assert_eq!(level, 1),
            Some(parent) => {
                prop_assert!(code.starts_with(parent));
                let parent_level = resolve_level_and_validate(parent, None).unwrap();
                prop_assert_eq!(parent_level + 1, level);
            }
        }
    }

    #[test]
    fn prop_other_lengths_rejected(len in 1usize..20) {
        prop_assume!(!CODE_LENGTHS.contains(&len));
        let code = "1".repeat(len);
        prop_assert!(resolve_level_and_validate(&code, None).is_err());
    }
}
