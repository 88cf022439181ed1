//! Cache key normalization

/// Normalize a question into a consistent cache key
///
/// Lowercases and trims surrounding whitespace, nothing more; distinct
/// phrasings of the same intent miss deliberately. Normalization is
/// idempotent, so keys read back from the store can be reused directly.
pub fn normalize_question(question: &str) -> String {
    question.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalization_collides_equivalent_phrasings() {
        assert_eq!(
            normalize_question("  Hello World  "),
            normalize_question("hello world")
        );
    }

    #[test]
    fn test_normalization_idempotent() {
        for s in ["  Hello World  ", "HELLO", "déjà vu\t", ""] {
            let once = normalize_question(s);
            assert_eq!(normalize_question(&once), once);
        }
    }

    #[test]
    fn test_interior_whitespace_preserved() {
        assert_ne!(
            normalize_question("hello  world"),
            normalize_question("hello world")
        );
    }
}
