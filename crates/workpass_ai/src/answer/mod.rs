use serde::{Deserialize, Serialize};
use workpass_core::categorize::{GENERAL_CATEGORY, GENERAL_PASS_TYPE};
use workpass_core::domain::UserContext;
use workpass_core::error::AppError;
use workpass_core::metadata::get_str;

use crate::llm::{GenerateRequest, Llm};
use crate::retrieve::{RetrievalResult, Retriever};

mod prompts;

pub use prompts::answer_prompt;

/// Sources shown next to an answer.
pub const DISPLAYED_SOURCES: usize = 3;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Source {
    pub title: String,
    pub url: String,
    pub pass_type: String,
    pub category: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Answer {
    pub answer: String,
    pub sources: Vec<Source>,
    pub question: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnswerSettings {
    pub model: String,
    pub temperature: f32,
    pub top_k: u32,
}

impl Default for AnswerSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.3,
            top_k: 5,
        }
    }
}

/// Retrieval + prompt + generation, packaged with the sources that fed it.
pub struct AnswerComposer<'a> {
    retriever: Retriever<'a>,
    llm: &'a dyn Llm,
    settings: &'a AnswerSettings,
}

impl<'a> AnswerComposer<'a> {
    pub fn new(retriever: Retriever<'a>, llm: &'a dyn Llm, settings: &'a AnswerSettings) -> Self {
        Self {
            retriever,
            llm,
            settings,
        }
    }

    /// Never fails: any retrieval or generation error becomes an answer text
    /// describing the error, with no sources.
    pub fn answer(&self, question: &str, user_context: Option<&UserContext>) -> Answer {
        match self.try_answer(question, user_context) {
            Ok(answer) => answer,
            Err(e) => {
                log::error!("Answering failed: {e}");
                Answer {
                    answer: format!("I encountered an error: {e}. Please try again."),
                    sources: Vec::new(),
                    question: question.to_string(),
                }
            }
        }
    }

    fn try_answer(
        &self,
        question: &str,
        user_context: Option<&UserContext>,
    ) -> Result<Answer, AppError> {
        let enriched = match user_context {
            Some(ctx) => ctx.enrich(question),
            None => question.to_string(),
        };
        let chunks = self.retriever.retrieve(&enriched, self.settings.top_k)?;
        let answer = self.compose(&enriched, &chunks)?;
        Ok(Answer {
            answer,
            sources: sources_from(&chunks),
            question: question.to_string(),
        })
    }

    /// Prompt the model with the given chunks as context.
    pub fn compose(&self, question: &str, chunks: &[RetrievalResult]) -> Result<String, AppError> {
        let context = build_context(chunks);
        let prompt = answer_prompt(&context, question);
        self.llm.generate(&GenerateRequest {
            model: &self.settings.model,
            prompt: &prompt,
            temperature: self.settings.temperature,
        })
    }
}

/// Chunk texts separated by blank lines, in retrieval order.
pub fn build_context(chunks: &[RetrievalResult]) -> String {
    chunks
        .iter()
        .map(|c| c.chunk_text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// One source per retrieved chunk, same order, no deduplication.
pub fn sources_from(chunks: &[RetrievalResult]) -> Vec<Source> {
    chunks
        .iter()
        .map(|c| Source {
            title: get_str(&c.metadata, "title", "Unknown").to_string(),
            url: get_str(&c.metadata, "source", "").to_string(),
            pass_type: get_str(&c.metadata, "pass_type", GENERAL_PASS_TYPE).to_string(),
            category: get_str(&c.metadata, "category", GENERAL_CATEGORY).to_string(),
        })
        .collect()
}

/// Text lines for the first [`DISPLAYED_SOURCES`] sources. The pass type line
/// is left out for "General".
pub fn render_sources(sources: &[Source]) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, s) in sources.iter().take(DISPLAYED_SOURCES).enumerate() {
        lines.push(format!("{}. {}", i + 1, s.title));
        if !s.url.is_empty() {
            lines.push(format!("   {}", s.url));
        }
        if s.pass_type != GENERAL_PASS_TYPE {
            lines.push(format!("   Pass Type: {}", s.pass_type));
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use workpass_core::domain::{FlatMetadata, MetadataValue};

    fn hit(text: &str, title: Option<&str>, pass_type: Option<&str>) -> RetrievalResult {
        let mut metadata = FlatMetadata::new();
        if let Some(t) = title {
            metadata.insert("title".to_string(), MetadataValue::from(t));
            metadata.insert(
                "source".to_string(),
                MetadataValue::from(format!("https://www.mom.gov.sg/{}", t.to_lowercase())),
            );
        }
        if let Some(p) = pass_type {
            metadata.insert("pass_type".to_string(), MetadataValue::from(p));
        }
        RetrievalResult {
            chunk_id: text.to_string(),
            chunk_text: text.to_string(),
            metadata,
            similarity_score: 0.5,
        }
    }

    #[test]
    fn context_joins_chunks_with_blank_lines() {
        let chunks = vec![hit("first", None, None), hit("second", None, None)];
        assert_eq!(build_context(&chunks), "first\n\nsecond");
    }

    #[test]
    fn sources_fall_back_to_defaults() {
        let sources = sources_from(&[hit("x", None, None)]);
        assert_eq!(
            sources,
            vec![Source {
                title: "Unknown".to_string(),
                url: String::new(),
                pass_type: "General".to_string(),
                category: "general".to_string(),
            }]
        );
    }

    #[test]
    fn rendering_keeps_three_and_hides_general() {
        let chunks = vec![
            hit("a", Some("EP"), Some("Employment Pass")),
            hit("b", Some("Fees"), Some("General")),
            hit("c", Some("SP"), Some("S Pass")),
            hit("d", Some("WP"), Some("Work Permit")),
        ];
        let lines = render_sources(&sources_from(&chunks));
        assert_eq!(
            lines,
            vec![
                "1. EP".to_string(),
                "   https://www.mom.gov.sg/ep".to_string(),
                "   Pass Type: Employment Pass".to_string(),
                "2. Fees".to_string(),
                "   https://www.mom.gov.sg/fees".to_string(),
                "3. SP".to_string(),
                "   https://www.mom.gov.sg/sp".to_string(),
                "   Pass Type: S Pass".to_string(),
            ]
        );
    }
}
