// ABOUTME: Pure helpers deriving ordered questions, term translations, and requirement buckets
// ABOUTME: Single source of truth for clarification question order

use std::collections::HashMap;

use specwright_core::{ExtractionResult, MissingInfo, RequirementCategory, RequirementsByCategory};

/// Terms below this confidence are left untranslated by default.
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.7;

/// Missing-info items sorted by priority, highest first.
///
/// The sort is stable: items with equal priority keep their original relative
/// order, so replaying the same extraction result always yields the same
/// question queue.
pub fn prioritize(result: &ExtractionResult) -> Vec<MissingInfo> {
    let mut items = result.missing_info.clone();
    items.sort_by(|a, b| b.priority.cmp(&a.priority));
    items
}

/// Map of layman terms to technical equivalents at or above `min_confidence`.
/// A later duplicate layman term overwrites an earlier one.
pub fn technical_translations(
    result: &ExtractionResult,
    min_confidence: f64,
) -> HashMap<String, String> {
    result
        .technical_terms
        .iter()
        .filter(|term| term.confidence >= min_confidence)
        .map(|term| (term.layman_term.clone(), term.technical_equivalent.clone()))
        .collect()
}

/// Re-bucket the free-form category labels into the canonical categories.
/// Unrecognized labels fold into the unknown bucket with their label kept.
pub fn requirements_by_category(result: &ExtractionResult) -> RequirementsByCategory {
    let mut buckets = RequirementsByCategory::default();

    for (label, requirements) in &result.requirements {
        match RequirementCategory::parse(label) {
            RequirementCategory::Functional => {
                buckets.functional.extend(requirements.iter().cloned())
            }
            RequirementCategory::NonFunctional => {
                buckets.non_functional.extend(requirements.iter().cloned())
            }
            RequirementCategory::Constraint => {
                buckets.constraints.extend(requirements.iter().cloned())
            }
            RequirementCategory::Unknown(original) => {
                for requirement in requirements {
                    buckets.unknown.push((original.clone(), requirement.clone()));
                }
            }
        }
    }

    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use specwright_core::TechnicalTerm;

    fn item(question: &str, priority: i32) -> MissingInfo {
        MissingInfo {
            question: question.to_string(),
            context: String::new(),
            priority,
            related_entities: vec![],
        }
    }

    fn term(layman: &str, technical: &str, confidence: f64) -> TechnicalTerm {
        TechnicalTerm {
            layman_term: layman.to_string(),
            technical_equivalent: technical.to_string(),
            explanation: String::new(),
            confidence,
        }
    }

    fn result_with(missing_info: Vec<MissingInfo>) -> ExtractionResult {
        ExtractionResult {
            entities: vec![],
            missing_info,
            technical_terms: vec![],
            requirements: HashMap::new(),
            intent: String::new(),
            confidence: 0.9,
        }
    }

    #[test]
    fn test_prioritize_sorts_descending() {
        let result = result_with(vec![item("low", 1), item("high", 5), item("mid", 3)]);
        let ordered = prioritize(&result);
        let questions: Vec<&str> = ordered.iter().map(|i| i.question.as_str()).collect();
        assert_eq!(questions, vec!["high", "mid", "low"]);
    }

    #[test]
    fn test_prioritize_is_stable_on_ties() {
        let result = result_with(vec![
            item("first", 3),
            item("second", 3),
            item("third", 5),
            item("fourth", 3),
        ]);
        let ordered = prioritize(&result);
        let questions: Vec<&str> = ordered.iter().map(|i| i.question.as_str()).collect();
        assert_eq!(questions, vec!["third", "first", "second", "fourth"]);
    }

    #[test]
    fn test_translations_threshold_is_inclusive() {
        let mut result = result_with(vec![]);
        result.technical_terms = vec![
            term("share", "access control list", 0.7),
            term("login", "authentication", 0.69),
        ];

        let translations = technical_translations(&result, DEFAULT_MIN_CONFIDENCE);

        assert_eq!(
            translations.get("share").map(String::as_str),
            Some("access control list")
        );
        assert!(!translations.contains_key("login"));
    }

    #[test]
    fn test_translations_later_duplicate_wins() {
        let mut result = result_with(vec![]);
        result.technical_terms = vec![
            term("share", "public link", 0.8),
            term("share", "access control list", 0.9),
        ];

        let translations = technical_translations(&result, DEFAULT_MIN_CONFIDENCE);
        assert_eq!(
            translations.get("share").map(String::as_str),
            Some("access control list")
        );
    }

    #[test]
    fn test_requirements_bucket_unknown_labels_preserved() {
        let mut result = result_with(vec![]);
        result.requirements.insert(
            "functional".to_string(),
            vec!["upload photos".to_string()],
        );
        result.requirements.insert(
            "performance".to_string(),
            vec!["sub-second search".to_string()],
        );

        let buckets = requirements_by_category(&result);

        assert_eq!(buckets.functional, vec!["upload photos".to_string()]);
        assert_eq!(
            buckets.unknown,
            vec![("performance".to_string(), "sub-second search".to_string())]
        );
    }

    #[test]
    fn test_requirements_bucket_merges_label_spellings() {
        let mut result = result_with(vec![]);
        result
            .requirements
            .insert("constraint".to_string(), vec!["GDPR".to_string()]);
        result
            .requirements
            .insert("constraints".to_string(), vec!["EU hosting".to_string()]);

        let buckets = requirements_by_category(&result);
        assert_eq!(buckets.constraints.len(), 2);
    }
}
