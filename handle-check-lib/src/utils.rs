//! Utility functions for seed validation and candidate ordering.

use crate::error::HandleCheckError;
use crate::generate::MAX_SEED_LENGTH;

/// Names shorter than this many characters are never sent to the oracle.
pub const MIN_NAME_LENGTH: usize = 4;

/// Validate a seed before expanding it.
///
/// # Errors
///
/// Returns `HandleCheckError::InvalidSeed` if the seed is empty, only
/// whitespace, contains whitespace, or exceeds [`MAX_SEED_LENGTH`]
/// characters.
pub fn validate_seed(seed: &str) -> Result<(), HandleCheckError> {
    if seed.trim().is_empty() {
        return Err(HandleCheckError::invalid_seed(seed, "seed cannot be empty"));
    }

    if seed.chars().any(char::is_whitespace) {
        return Err(HandleCheckError::invalid_seed(
            seed,
            "seed cannot contain whitespace",
        ));
    }

    let length = seed.chars().count();
    if length > MAX_SEED_LENGTH {
        return Err(HandleCheckError::invalid_seed(
            seed,
            format!(
                "seed has {} characters, the maximum is {}",
                length, MAX_SEED_LENGTH
            ),
        ));
    }

    Ok(())
}

/// Length of a name in characters.
pub fn name_length(name: &str) -> usize {
    name.chars().count()
}

/// Whether a name is too short to be worth a lookup.
pub fn is_too_short(name: &str) -> bool {
    name_length(name) < MIN_NAME_LENGTH
}

/// Stable sort by descending character length.
///
/// Names of equal length keep their relative order.
pub fn sort_longest_first(names: &mut [String]) {
    names.sort_by_key(|name| std::cmp::Reverse(name_length(name)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_seed() {
        assert!(validate_seed("alice").is_ok());
        assert!(validate_seed("").is_err());
        assert!(validate_seed("al ice").is_err());
        assert!(validate_seed("   ").is_err());
        assert!(validate_seed("al\tice").is_err());
        assert!(validate_seed(&"z".repeat(MAX_SEED_LENGTH)).is_ok());
        assert!(validate_seed(&"z".repeat(MAX_SEED_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_is_too_short_counts_characters() {
        assert!(is_too_short(""));
        assert!(is_too_short("abc"));
        assert!(!is_too_short("abcd"));
        // four characters, eight bytes
        assert!(!is_too_short("ñéíó"));
    }

    #[test]
    fn test_sort_longest_first_is_stable() {
        let mut names: Vec<String> = ["", "a", "b", "ab", "c", "ac", "bc", "abc"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        sort_longest_first(&mut names);
        assert_eq!(names, vec!["abc", "ab", "ac", "bc", "a", "b", "c", ""]);
    }
}
