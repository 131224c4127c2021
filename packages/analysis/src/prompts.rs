// ABOUTME: AI prompts for project description analysis and schema repair
// ABOUTME: Fixed extraction contract requesting entities, gaps, terminology, and requirements

use specwright_core::SkillLevel;

/// System prompt for all extraction calls
pub const EXTRACTION_SYSTEM_PROMPT: &str = r#"You are an expert software requirements analyst with deep knowledge of software engineering, project management, and technical architecture.

Your role is to:
- Extract entities (features, users, systems, data types) from project descriptions
- Identify missing information that would be critical for implementation
- Translate non-technical terms into proper technical equivalents
- Categorize requirements as functional, non-functional, or constraints

Always respond in valid JSON format matching the requested structure."#;

/// Build the fixed extraction prompt for a project description.
pub fn extraction_prompt(description: &str, skill_level: Option<SkillLevel>) -> String {
    let framing = match skill_level {
        Some(SkillLevel::Beginner) => {
            "\nThe author is a beginner: expect informal wording and translate generously.\n"
        }
        Some(SkillLevel::Expert) => {
            "\nThe author is technically expert: take their terminology at face value.\n"
        }
        _ => "",
    };

    format!(
        r#"Analyze the following project description and extract key information:

USER PROJECT DESCRIPTION:
{description}
{framing}
INSTRUCTIONS:
1. Identify all entities (features, users, systems, data types)
2. List any missing information that would be critical for implementation, phrased as questions
3. Translate any non-technical terms into proper technical equivalents
4. Categorize requirements as functional, non-functional, or constraint
5. Determine the overall user intent

Respond with JSON in exactly this format:

{{
  "entities": [
    {{"name": "...", "type": "feature|user|system|data", "description": "...", "confidence": 0.9}}
  ],
  "missing_info": [
    {{"question": "...", "context": "why this is needed", "priority": 3, "related_entities": ["..."]}}
  ],
  "technical_terms": [
    {{"layman_term": "...", "technical_equivalent": "...", "explanation": "...", "confidence": 0.8}}
  ],
  "requirements": {{
    "functional": ["..."],
    "non-functional": ["..."],
    "constraint": ["..."]
  }},
  "intent": "one sentence summary of what the user wants",
  "confidence": 0.85
}}

Confidence scores are between 0.0 and 1.0. Priorities are integers from 1 to 5, 5 being highest."#
    )
}

/// Ask the backend to reformat its own prior output into the schema.
pub fn repair_prompt(raw_output: &str, parse_error: &str) -> String {
    format!(
        r#"Your previous response could not be parsed as the required JSON structure.

PARSE ERROR:
{parse_error}

PREVIOUS RESPONSE:
{raw_output}

Reformat the previous response into valid JSON with exactly these top-level keys: "entities", "missing_info", "technical_terms", "requirements", "intent", "confidence".
Do not add commentary. Do not change the meaning of the content. Respond with the JSON object only."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_prompt_includes_description_and_keys() {
        let desc = "I want a site where users upload and share photos.";
        let prompt = extraction_prompt(desc, None);
        assert!(prompt.contains(desc));
        assert!(prompt.contains("missing_info"));
        assert!(prompt.contains("technical_terms"));
        assert!(prompt.contains("requirements"));
        assert!(prompt.contains("confidence"));
    }

    #[test]
    fn test_extraction_prompt_frames_for_skill_level() {
        let beginner = extraction_prompt("a shop", Some(SkillLevel::Beginner));
        assert!(beginner.contains("beginner"));

        let expert = extraction_prompt("a shop", Some(SkillLevel::Expert));
        assert!(expert.contains("expert"));

        let neutral = extraction_prompt("a shop", Some(SkillLevel::Intermediate));
        assert!(!neutral.contains("beginner"));
    }

    #[test]
    fn test_repair_prompt_carries_prior_output_and_error() {
        let prompt = repair_prompt("not json at all", "expected value at line 1");
        assert!(prompt.contains("not json at all"));
        assert!(prompt.contains("expected value at line 1"));
        assert!(prompt.contains("entities"));
    }
}
