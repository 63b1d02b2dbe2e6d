//! Display-name normalization
//!
//! Path elements are compared case-insensitively with diacritics stripped, so
//! "Entrevista Él" and "entrevista el" address the same node.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Canonical matching key for a display name
pub fn normalize_name(name: &str) -> String {
    name.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Whether two display names address the same node
pub fn names_match(a: &str, b: &str) -> bool {
    a == b || normalize_name(a) == normalize_name(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_is_ignored() {
        assert_eq!(normalize_name("Project A"), "project a");
        assert!(names_match("INTERVIEW 1", "interview 1"));
    }

    #[test]
    fn test_diacritics_are_stripped() {
        assert_eq!(normalize_name("Café Crème"), "cafe creme");
        assert!(names_match("Entrevista Él", "entrevista el"));
        assert!(names_match("Ünïcödé", "unicode"));
    }

    #[test]
    fn test_distinct_names_stay_distinct() {
        assert!(!names_match("Clip 1", "Clip 10"));
        assert!(!names_match("Draft", "Draft "));
    }
}
