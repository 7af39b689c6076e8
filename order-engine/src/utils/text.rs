//! Text helpers for search

/// Lowercase and strip accents from Spanish/Latin-1 letters so that
/// `"García"` and `"garcia"` compare equal.
pub fn fold(input: &str) -> String {
    input
        .chars()
        .flat_map(char::to_lowercase)
        .map(strip_accent)
        .collect()
}

fn strip_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'ö' | 'õ' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        'ý' | 'ÿ' => 'y',
        other => other,
    }
}

/// Case and accent insensitive substring test. Empty needles match.
pub fn contains_folded(haystack: &str, folded_needle: &str) -> bool {
    folded_needle.is_empty() || fold(haystack).contains(folded_needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold() {
        assert_eq!(fold("María GARCÍA"), "maria garcia");
        assert_eq!(fold("Peña Ñandú"), "pena nandu");
        assert_eq!(fold("300-123"), "300-123");
    }

    #[test]
    fn test_contains_folded() {
        assert!(contains_folded("María García", "garcia"));
        assert!(!contains_folded("Pérez López", "garcia"));
        assert!(contains_folded("anything", ""));
    }
}
