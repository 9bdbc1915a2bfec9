//! Prompt templates for lecture enrichment.
//!
//! Prompts can be customized by placing a `lecture.toml` file in the custom prompts directory.
//! Templates receive the lecture text as `{{transcription}}`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// A system instruction paired with a user prompt template.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PromptTemplate {
    pub system: String,
    pub user: String,
}

impl PromptTemplate {
    fn new(system: &str, user: &str) -> Self {
        Self {
            system: system.to_string(),
            user: user.to_string(),
        }
    }
}

/// Templates for the four derived lecture fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LecturePrompts {
    pub breakdown: PromptTemplate,
    pub steps: PromptTemplate,
    pub mind_map: PromptTemplate,
    pub summary: PromptTemplate,
}

impl Default for LecturePrompts {
    fn default() -> Self {
        Self {
            breakdown: PromptTemplate::new(
                "You are an expert in breaking words into syllables.",
                "Break down this text by splitting EVERY word into syllables using hyphens. Keep punctuation and flow.\n\nText: {{transcription}}\n\nSyllable breakdown:",
            ),
            steps: PromptTemplate::new(
                "You are an expert educator.",
                "Break down this lecture into numbered steps (1, 2, 3, etc). Each step should be clear and actionable.\n\nLecture: {{transcription}}\n\nSteps:",
            ),
            mind_map: PromptTemplate::new(
                "You are an expert in creating concise mind maps.",
                "Create a brief mind map of the key points. Use max 5-7 points.\n\nContent: {{transcription}}\n\nMind map:",
            ),
            summary: PromptTemplate::new(
                "You are an expert summarizer.",
                "Provide a 3-4 sentence summary of this content.\n\nContent: {{transcription}}\n\nSummary:",
            ),
        }
    }
}

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub lecture: LecturePrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let lecture_path = custom_path.join("lecture.toml");
            if lecture_path.exists() {
                let content = std::fs::read_to_string(&lecture_path)?;
                prompts.lecture = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}
