//! Candidate name generation.
//!
//! Expands a seed name into every subset of its characters, keeping the
//! seed's character order inside each subset.
//!
//! # Examples
//!
//! ```
//! use handle_check_lib::generate::generate_powerset;
//!
//! let names = generate_powerset("abc").unwrap();
//! assert_eq!(names, ["", "a", "b", "ab", "c", "ac", "bc", "abc"]);
//! ```

use crate::error::HandleCheckError;
use crate::utils::validate_seed;

/// Longest seed accepted, in characters. The candidate count doubles with
/// every character.
pub const MAX_SEED_LENGTH: usize = 20;

/// Number of candidates a seed expands to (`2^chars`, saturating).
pub fn powerset_size(seed: &str) -> usize {
    let chars = seed.chars().count();
    u32::try_from(chars)
        .ok()
        .and_then(|n| 1usize.checked_shl(n))
        .unwrap_or(usize::MAX)
}

/// Expand a seed into its powerset of character subsets.
///
/// Starting from the empty string, each seed character in turn is appended
/// to a copy of every entry produced so far. The order is deterministic and
/// the empty string comes first. Repeated seed characters yield repeated
/// candidates; they are not deduplicated.
///
/// # Errors
///
/// Returns `HandleCheckError::InvalidSeed` if the seed is blank or longer
/// than [`MAX_SEED_LENGTH`] characters.
pub fn generate_powerset(seed: &str) -> Result<Vec<String>, HandleCheckError> {
    validate_seed(seed)?;

    let mut names = Vec::with_capacity(powerset_size(seed));
    names.push(String::new());

    for letter in seed.chars() {
        let extended: Vec<String> = names
            .iter()
            .map(|prefix| {
                let mut name = String::with_capacity(prefix.len() + letter.len_utf8());
                name.push_str(prefix);
                name.push(letter);
                name
            })
            .collect();
        names.extend(extended);
    }

    Ok(names)
}
