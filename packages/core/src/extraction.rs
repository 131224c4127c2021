// ABOUTME: Structured extraction result types produced by analyzing a project description
// ABOUTME: Defines entities, missing-info items, technical terms, and requirement categories

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Violation of the extraction schema found after a structurally valid parse.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SchemaViolation {
    #[error("confidence {value} for {field} is outside [0.0, 1.0]")]
    ConfidenceOutOfRange { field: String, value: f64 },

    #[error("priority {value} for question {question:?} is outside 1..=5")]
    PriorityOutOfRange { question: String, value: i32 },
}

/// An entity extracted from the user's project description.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Entity {
    pub name: String,
    #[serde(rename = "type")]
    pub entity_type: String,
    pub description: String,
    pub confidence: f64,
}

/// Information the analysis found missing, phrased as a question to the user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MissingInfo {
    pub question: String,
    /// Why this information is needed.
    pub context: String,
    /// 1-5, 5 being highest.
    pub priority: i32,
    #[serde(default)]
    pub related_entities: Vec<String>,
}

/// A layman term paired with its technical equivalent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TechnicalTerm {
    pub layman_term: String,
    pub technical_equivalent: String,
    pub explanation: String,
    pub confidence: f64,
}

/// Complete structured output of one analysis call. Immutable once produced;
/// a conversation references the most recent one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractionResult {
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub missing_info: Vec<MissingInfo>,
    #[serde(default)]
    pub technical_terms: Vec<TechnicalTerm>,
    /// Raw requirement categories as labelled by the backend. Use
    /// `RequirementCategory::parse` / `RequirementsByCategory` for the
    /// canonical bucketing.
    #[serde(default)]
    pub requirements: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub intent: String,
    pub confidence: f64,
}

impl ExtractionResult {
    /// Enforce the numeric bounds serde cannot express: confidences in
    /// [0, 1] and priorities in 1..=5.
    pub fn validate(&self) -> Result<(), SchemaViolation> {
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(SchemaViolation::ConfidenceOutOfRange {
                field: "overall".to_string(),
                value: self.confidence,
            });
        }
        for entity in &self.entities {
            if !(0.0..=1.0).contains(&entity.confidence) {
                return Err(SchemaViolation::ConfidenceOutOfRange {
                    field: format!("entity {}", entity.name),
                    value: entity.confidence,
                });
            }
        }
        for term in &self.technical_terms {
            if !(0.0..=1.0).contains(&term.confidence) {
                return Err(SchemaViolation::ConfidenceOutOfRange {
                    field: format!("term {}", term.layman_term),
                    value: term.confidence,
                });
            }
        }
        for item in &self.missing_info {
            if !(1..=5).contains(&item.priority) {
                return Err(SchemaViolation::PriorityOutOfRange {
                    question: item.question.clone(),
                    value: item.priority,
                });
            }
        }
        Ok(())
    }
}

/// Canonical requirement category. Parsing is total: labels that do not match
/// a known category are preserved in `Unknown` rather than discarded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum RequirementCategory {
    Functional,
    NonFunctional,
    Constraint,
    Unknown(String),
}

impl RequirementCategory {
    pub fn parse(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "functional" => RequirementCategory::Functional,
            "non-functional" | "non_functional" => RequirementCategory::NonFunctional,
            "constraint" | "constraints" => RequirementCategory::Constraint,
            _ => RequirementCategory::Unknown(label.to_string()),
        }
    }
}

/// Requirements re-bucketed into the canonical categories. Unrecognized
/// labels are concatenated into `unknown`, keeping their original label.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RequirementsByCategory {
    pub functional: Vec<String>,
    pub non_functional: Vec<String>,
    pub constraints: Vec<String>,
    /// (original label, requirement) pairs for anything outside the three
    /// canonical categories.
    pub unknown: Vec<(String, String)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_result() -> ExtractionResult {
        ExtractionResult {
            entities: vec![],
            missing_info: vec![],
            technical_terms: vec![],
            requirements: HashMap::new(),
            intent: String::new(),
            confidence: 0.9,
        }
    }

    #[test]
    fn test_validate_accepts_boundary_confidences() {
        let mut result = minimal_result();
        result.confidence = 1.0;
        result.entities.push(Entity {
            name: "photos".to_string(),
            entity_type: "data".to_string(),
            description: "uploaded images".to_string(),
            confidence: 0.0,
        });
        assert!(result.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range_confidence() {
        let mut result = minimal_result();
        result.confidence = 1.2;
        assert!(matches!(
            result.validate(),
            Err(SchemaViolation::ConfidenceOutOfRange { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_priority_zero() {
        let mut result = minimal_result();
        result.missing_info.push(MissingInfo {
            question: "which database?".to_string(),
            context: "storage choice".to_string(),
            priority: 0,
            related_entities: vec![],
        });
        assert!(matches!(
            result.validate(),
            Err(SchemaViolation::PriorityOutOfRange { .. })
        ));
    }

    #[test]
    fn test_requirement_category_parse_is_total() {
        assert_eq!(
            RequirementCategory::parse("functional"),
            RequirementCategory::Functional
        );
        assert_eq!(
            RequirementCategory::parse("Non-Functional"),
            RequirementCategory::NonFunctional
        );
        assert_eq!(
            RequirementCategory::parse("constraints"),
            RequirementCategory::Constraint
        );
        assert_eq!(
            RequirementCategory::parse("performance"),
            RequirementCategory::Unknown("performance".to_string())
        );
    }

    #[test]
    fn test_extraction_result_deserializes_with_defaults() {
        let result: ExtractionResult =
            serde_json::from_str(r#"{"confidence": 0.8}"#).unwrap();
        assert!(result.entities.is_empty());
        assert!(result.missing_info.is_empty());
        assert!(result.requirements.is_empty());
        assert_eq!(result.confidence, 0.8);
    }
}
