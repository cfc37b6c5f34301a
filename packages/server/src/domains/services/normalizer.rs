//! Free-text service requests to canonical categories.

use super::models::ServiceCategory;

/// Keyword table, checked in order. The first keyword found as a substring
/// of the lower-cased request wins.
pub const SERVICE_KEYWORDS: [(&str, ServiceCategory); 5] = [
    ("ambulance", ServiceCategory::Hospital),
    ("medical", ServiceCategory::Hospital),
    ("hospital", ServiceCategory::Hospital),
    ("fire", ServiceCategory::Firestation),
    ("police", ServiceCategory::Policestation),
];

/// Maps what the caller (or the model) asked for onto a directory category.
#[derive(Debug, Clone)]
pub struct CategoryNormalizer {
    keywords: Vec<(String, ServiceCategory)>,
}

impl Default for CategoryNormalizer {
    fn default() -> Self {
        Self {
            keywords: SERVICE_KEYWORDS
                .iter()
                .map(|(keyword, category)| (keyword.to_string(), *category))
                .collect(),
        }
    }
}

impl CategoryNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a keyword after the built-in ones.
    pub fn with_keyword(mut self, keyword: &str, category: ServiceCategory) -> Self {
        self.keywords.push((keyword.to_lowercase(), category));
        self
    }

    /// `None` when no keyword matches; callers treat that as "no contact".
    pub fn normalize(&self, raw: &str) -> Option<ServiceCategory> {
        let lowered = raw.to_lowercase();
        self.keywords
            .iter()
            .find(|(keyword, _)| lowered.contains(keyword.as_str()))
            .map(|(_, category)| *category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_map_to_categories() {
        let normalizer = CategoryNormalizer::new();
        assert_eq!(normalizer.normalize("Ambulance"), Some(ServiceCategory::Hospital));
        assert_eq!(normalizer.normalize("medical team"), Some(ServiceCategory::Hospital));
        assert_eq!(normalizer.normalize("HOSPITAL"), Some(ServiceCategory::Hospital));
        assert_eq!(normalizer.normalize("fire brigade"), Some(ServiceCategory::Firestation));
        assert_eq!(normalizer.normalize("Police"), Some(ServiceCategory::Policestation));
    }

    #[test]
    fn test_declared_order_breaks_ties() {
        let normalizer = CategoryNormalizer::default();
        assert_eq!(
            normalizer.normalize("police and fire"),
            Some(ServiceCategory::Firestation)
        );
        assert_eq!(
            normalizer.normalize("fire, then an ambulance"),
            Some(ServiceCategory::Hospital)
        );
    }

    #[test]
    fn test_canonical_names_normalize_to_themselves() {
        let normalizer = CategoryNormalizer::default();
        for category in ServiceCategory::ALL {
            assert_eq!(normalizer.normalize(category.as_str()), Some(category));
        }
    }

    #[test]
    fn test_unknown_request() {
        let normalizer = CategoryNormalizer::default();
        assert_eq!(normalizer.normalize("coast guard"), None);
        assert_eq!(normalizer.normalize(""), None);
    }

    #[test]
    fn test_custom_keyword_is_checked_last() {
        let normalizer = CategoryNormalizer::new().with_keyword("Straż", ServiceCategory::Firestation);
        assert_eq!(normalizer.normalize("straż pożarna"), Some(ServiceCategory::Firestation));
        assert_eq!(normalizer.normalize("straż medical"), Some(ServiceCategory::Hospital));
    }
}
