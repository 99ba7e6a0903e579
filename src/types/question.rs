//! Client Questions
//!
//! Open points the generation tiers could not settle from the evidence.
//! Questions are only ever appended.

use serde::{Deserialize, Serialize};

use super::utils::json_string;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    fn parse_lenient(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "high" | "critical" => Priority::High,
            "low" => Priority::Low,
            _ => Priority::Medium,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientQuestion {
    /// Dotted path into the document schema, e.g. `strategic.personas`
    pub field_path: String,
    pub question: String,
    pub rationale: String,
    pub priority: Priority,
    /// Stage that raised the question (`tier2`, `tier3:goals`, ...)
    pub origin: String,
}

impl ClientQuestion {
    /// Parse a `clientQuestions` array from a tier response.
    ///
    /// Entries without a question text are skipped rather than rejected.
    pub fn parse_list(value: Option<&serde_json::Value>, origin: &str) -> Vec<ClientQuestion> {
        value
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|q| {
                        let question = json_string(q, "question")?;
                        if question.trim().is_empty() {
                            return None;
                        }
                        Some(ClientQuestion {
                            field_path: json_string(q, "fieldPath")
                                .or_else(|| json_string(q, "field_path"))
                                .unwrap_or_default(),
                            question,
                            rationale: json_string(q, "rationale").unwrap_or_default(),
                            priority: json_string(q, "priority")
                                .map(|p| Priority::parse_lenient(&p))
                                .unwrap_or_default(),
                            origin: origin.to_string(),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Append-only question list shared across tiers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionLog(Vec<ClientQuestion>);

impl QuestionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, questions: impl IntoIterator<Item = ClientQuestion>) {
        self.0.extend(questions);
    }

    pub fn as_slice(&self) -> &[ClientQuestion] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<ClientQuestion> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_list_accepts_both_key_styles() {
        let raw = json!([
            {"fieldPath": "strategic.personas", "question": "Who pays?", "priority": "HIGH"},
            {"field_path": "detailed.scope", "question": "Is billing in scope?", "rationale": "No docs"},
            {"fieldPath": "x", "question": "   "},
            {"priority": "low"}
        ]);

        let questions = ClientQuestion::parse_list(Some(&raw), "tier2");
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].priority, Priority::High);
        assert_eq!(questions[1].field_path, "detailed.scope");
        assert_eq!(questions[1].priority, Priority::Medium);
        assert!(questions.iter().all(|q| q.origin == "tier2"));
    }

    #[test]
    fn test_log_preserves_earlier_entries() {
        let mut log = QuestionLog::new();
        let first = ClientQuestion::parse_list(Some(&json!([{"question": "a"}])), "tier2");
        log.append(first.clone());
        log.append(ClientQuestion::parse_list(
            Some(&json!([{"question": "b"}])),
            "tier3:goals",
        ));

        assert_eq!(log.len(), 2);
        assert_eq!(log.as_slice()[0], first[0]);
    }
}
