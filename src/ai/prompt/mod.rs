//! Prompt Builder
//!
//! Standardized prompt construction for completion calls. Every tier prompt
//! has the same layout:
//!
//! 1. **Role**: who the model is acting as
//! 2. **Objectives**: numbered goals
//! 3. **Context**: ordered key/value facts
//! 4. **Sections**: headed free text (facts, evidence, prior output)
//! 5. **Focus / anti-patterns**: drift prevention
//! 6. **Output schema**: the JSON shape the response must follow

#[derive(Debug, Clone)]
enum PromptSection {
    Role { expertise: String, task: String },
    Objectives(Vec<String>),
    Context(Vec<(String, String)>),
    Text { header: Option<String>, content: String },
    Focus { target: String, restrictions: Vec<String> },
    AntiPatterns { bad: Vec<String>, good: Vec<String> },
    Schema(String),
}

#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    sections: Vec<PromptSection>,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn role(mut self, expertise: &str, task: &str) -> Self {
        self.sections.push(PromptSection::Role {
            expertise: expertise.to_string(),
            task: task.to_string(),
        });
        self
    }

    pub fn objectives(mut self, objectives: &[&str]) -> Self {
        self.sections.push(PromptSection::Objectives(
            objectives.iter().map(|o| o.to_string()).collect(),
        ));
        self
    }

    /// Add a context item; items render in insertion order
    pub fn context_item(mut self, key: &str, value: &str) -> Self {
        let item = (key.to_string(), value.to_string());
        match self.sections.iter_mut().find_map(|s| match s {
            PromptSection::Context(items) => Some(items),
            _ => None,
        }) {
            Some(items) => items.push(item),
            None => self.sections.push(PromptSection::Context(vec![item])),
        }
        self
    }

    pub fn text(mut self, content: &str) -> Self {
        self.sections.push(PromptSection::Text {
            header: None,
            content: content.to_string(),
        });
        self
    }

    pub fn section(mut self, header: &str, content: &str) -> Self {
        self.sections.push(PromptSection::Text {
            header: Some(header.to_string()),
            content: content.to_string(),
        });
        self
    }

    pub fn focus(mut self, target: &str, restrictions: &[&str]) -> Self {
        self.sections.push(PromptSection::Focus {
            target: target.to_string(),
            restrictions: restrictions.iter().map(|r| r.to_string()).collect(),
        });
        self
    }

    pub fn anti_patterns(mut self, bad: &[&str], good: &[&str]) -> Self {
        self.sections.push(PromptSection::AntiPatterns {
            bad: bad.iter().map(|b| b.to_string()).collect(),
            good: good.iter().map(|g| g.to_string()).collect(),
        });
        self
    }

    /// JSON shape the response must follow
    pub fn output_schema(mut self, schema: &str) -> Self {
        self.sections.push(PromptSection::Schema(schema.to_string()));
        self
    }

    pub fn build(self) -> String {
        let mut prompt = String::new();

        for section in self.sections {
            match section {
                PromptSection::Role { expertise, task } => {
                    prompt.push_str("<ROLE>\n");
                    prompt.push_str(&format!(
                        "You are an expert {} specializing in {}.\n",
                        expertise, task
                    ));
                    prompt.push_str("</ROLE>\n\n");
                }
                PromptSection::Objectives(objectives) => {
                    prompt.push_str("<OBJECTIVES>\n");
                    for (i, obj) in objectives.iter().enumerate() {
                        prompt.push_str(&format!("{}. {}\n", i + 1, obj));
                    }
                    prompt.push_str("</OBJECTIVES>\n\n");
                }
                PromptSection::Context(items) => {
                    prompt.push_str("# Context\n\n");
                    for (key, value) in items {
                        prompt.push_str(&format!("**{}**: {}\n", key, value));
                    }
                    prompt.push('\n');
                }
                PromptSection::Text { header, content } => {
                    if let Some(h) = header {
                        prompt.push_str(&format!("# {}\n\n", h));
                    }
                    prompt.push_str(&content);
                    prompt.push_str("\n\n");
                }
                PromptSection::Focus {
                    target,
                    restrictions,
                } => {
                    prompt.push_str("<FOCUS>\n");
                    prompt.push_str(&format!("IMPORTANT: Focus EXCLUSIVELY on: {}\n", target));
                    for restriction in restrictions {
                        prompt.push_str(&format!("- {}\n", restriction));
                    }
                    prompt.push_str("</FOCUS>\n\n");
                }
                PromptSection::AntiPatterns { bad, good } => {
                    prompt.push_str("## ANTI-PATTERNS\n\n");
                    prompt.push_str("<what_not_to_do>\n");
                    for example in bad {
                        prompt.push_str(&format!("WRONG: {}\n", example));
                    }
                    prompt.push_str("</what_not_to_do>\n\n");
                    prompt.push_str("<what_to_do>\n");
                    for example in good {
                        prompt.push_str(&format!("CORRECT: {}\n", example));
                    }
                    prompt.push_str("</what_to_do>\n\n");
                }
                PromptSection::Schema(schema) => {
                    prompt.push_str("<OUTPUT_FORMAT>\n");
                    prompt.push_str("Respond with a single JSON object and nothing else:\n");
                    prompt.push_str("```json\n");
                    prompt.push_str(&schema);
                    prompt.push_str("\n```\n");
                    prompt.push_str("</OUTPUT_FORMAT>\n\n");
                }
            }
        }

        prompt.trim_end().to_string()
    }
}
