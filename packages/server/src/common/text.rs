use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Fold a place name into a comparison key.
///
/// Trims, collapses inner whitespace, lower-cases and strips diacritics, so
/// "Kraków", " KRAKOW " and "krakow" share a key. `ł` has no decomposition
/// and is mapped to `l` explicitly.
pub fn fold_key(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| match c {
            'ł' | 'Ł' => 'l',
            other => other,
        })
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_key_ignores_case_space_and_diacritics() {
        assert_eq!(fold_key("Kraków"), "krakow");
        assert_eq!(fold_key("  KRAKOW "), "krakow");
        assert_eq!(fold_key("Łódź"), "lodz");
        assert_eq!(fold_key("Białystok"), "bialystok");
        assert_eq!(fold_key("Zielona   Góra"), "zielona gora");
    }

    #[test]
    fn test_fold_key_blank() {
        assert_eq!(fold_key("   "), "");
    }
}
