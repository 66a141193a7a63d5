pub const SCHEMA_NAME: &str = "mcqs_schema";

pub const MCQ_INSTRUCTIONS: &str =
    "You are an expert MCQ generator. Provide the MCQs in the exact JSON format as instructed.";

pub fn mcq_prompt(transcript: &str, module: &str) -> String {
    format!(
        r#"You are an expert question generator. You will receive the transcript of a lecture.
Write multiple-choice questions (MCQs) that test a viewer's understanding of the key topics
in the transcript. Every question must stay on topic and target the main ideas and important
details, not anecdotes or side remarks.

RULES:
1. Identify the key topics or concepts covered in the transcript.
2. Write one MCQ per topic.
3. Every MCQ has exactly four answer options: one correct answer and three plausible distractors.
4. Only cover material that appears in the transcript.
5. Never mention personal names; refer to the subject matter generically.
6. Output only JSON of the form {{"mcqs": [{{"q": "...", "options": ["...", "...", "...", "..."]}}]}}
   with no extra keys and no commentary.

Module: {module}
Transcript: {transcript}

Based on the transcript above, generate the MCQs."#,
        module = module,
        transcript = transcript
    )
}

/// `{mcqs: [{q: string, options: string[4]}]}`, closed to extra properties
pub fn mcq_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "mcqs": {
                "description": "List of generated MCQs",
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "q": {
                            "description": "The generated question",
                            "type": "string"
                        },
                        "options": {
                            "description": "The four multiple-choice options",
                            "type": "array",
                            "minItems": 4,
                            "maxItems": 4,
                            "items": { "type": "string" }
                        }
                    },
                    "required": ["q", "options"],
                    "additionalProperties": false
                }
            }
        },
        "required": ["mcqs"],
        "additionalProperties": false
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_inputs() {
        let prompt = mcq_prompt("Entropy always increases.", "Thermodynamics");
        assert!(prompt.contains("Module: Thermodynamics"));
        assert!(prompt.contains("Transcript: Entropy always increases."));
        assert!(prompt.contains("exactly four answer options"));
        assert!(prompt.contains(r#"{"mcqs": [{"q""#));
    }

    #[test]
    fn test_schema_requires_four_options() {
        let schema = mcq_schema();
        let options = &schema["properties"]["mcqs"]["items"]["properties"]["options"];
        assert_eq!(options["minItems"], 4);
        assert_eq!(options["maxItems"], 4);
        assert_eq!(schema["required"][0], "mcqs");
        assert_eq!(schema["additionalProperties"], false);
    }
}
