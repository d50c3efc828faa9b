#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::time::Duration;

use workpass_ai::embeddings::Embedder;
use workpass_ai::llm::{GenerateRequest, Llm};
use workpass_ai::retry::Sleeper;
use workpass_core::domain::{ChunkMetadata, Heading, ProcessedChunk};
use workpass_core::error::{codes, AppError};

const AXES: &[&str] = &["employment", "s pass", "work permit", "fee", "eligib"];

/// One dimension per topic word plus a small constant, so no vector is zero.
pub struct KeywordEmbedder;

impl Embedder for KeywordEmbedder {
    fn embed(&self, _model: &str, input: &str) -> Result<Vec<f32>, AppError> {
        let lower = input.to_lowercase();
        let mut v: Vec<f32> = AXES
            .iter()
            .map(|axis| lower.matches(axis).count() as f32)
            .collect();
        v.push(0.1);
        Ok(v)
    }
}

/// Wraps [`KeywordEmbedder`]; the first `rate_limited` batch calls fail with 429.
pub struct FlakyEmbedder {
    pub rate_limited: Cell<u32>,
    pub batch_sizes: RefCell<Vec<usize>>,
}

impl FlakyEmbedder {
    pub fn new(rate_limited: u32) -> Self {
        Self {
            rate_limited: Cell::new(rate_limited),
            batch_sizes: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.batch_sizes.borrow().len()
    }
}

impl Embedder for FlakyEmbedder {
    fn embed(&self, model: &str, input: &str) -> Result<Vec<f32>, AppError> {
        KeywordEmbedder.embed(model, input)
    }

    fn embed_batch(&self, model: &str, inputs: &[&str]) -> Result<Vec<Vec<f32>>, AppError> {
        self.batch_sizes.borrow_mut().push(inputs.len());
        if self.rate_limited.get() > 0 {
            self.rate_limited.set(self.rate_limited.get() - 1);
            return Err(AppError::new(codes::AI_RATE_LIMITED, "429 Too Many Requests")
                .with_retryable(true));
        }
        inputs.iter().map(|i| self.embed(model, i)).collect()
    }
}

pub struct BrokenEmbedder;

impl Embedder for BrokenEmbedder {
    fn embed(&self, _model: &str, _input: &str) -> Result<Vec<f32>, AppError> {
        Err(AppError::new(codes::AI_PROVIDER_UNREACHABLE, "connection refused"))
    }
}

#[derive(Default)]
pub struct RecordingSleeper {
    pub slept: RefCell<Vec<Duration>>,
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.slept.borrow_mut().push(duration);
    }
}

/// Returns a canned reply (or error) and keeps every prompt it saw.
pub struct FakeLlm {
    pub reply: Result<String, AppError>,
    pub prompts: RefCell<Vec<String>>,
}

impl FakeLlm {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            prompts: RefCell::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: Err(AppError::new(codes::AI_GENERATION_FAILED, "model overloaded")),
            prompts: RefCell::new(Vec::new()),
        }
    }
}

impl Llm for FakeLlm {
    fn generate(&self, req: &GenerateRequest<'_>) -> Result<String, AppError> {
        self.prompts.borrow_mut().push(req.prompt.to_string());
        self.reply.clone()
    }
}

pub fn chunk(text: &str, url: &str, title: &str, pass_type: &str, category: &str) -> ProcessedChunk {
    ProcessedChunk {
        text: text.to_string(),
        metadata: ChunkMetadata {
            source: url.to_string(),
            title: title.to_string(),
            category: category.to_string(),
            pass_type: pass_type.to_string(),
            chunk_index: 0,
            total_chunks: 1,
            headings: vec![Heading::new("h1", title)],
        },
    }
}

/// Small corpus with one clear topic per chunk.
pub fn corpus() -> Vec<ProcessedChunk> {
    vec![
        chunk(
            "Employment Pass holders are foreign professionals. Employment Pass eligibility depends on salary.",
            "https://www.mom.gov.sg/passes-and-permits/employment-pass",
            "Employment Pass",
            "Employment Pass",
            "employment_passes",
        ),
        chunk(
            "The S Pass lets mid-skilled staff work in Singapore. S Pass quotas apply.",
            "https://www.mom.gov.sg/passes-and-permits/s-pass",
            "S Pass",
            "S Pass",
            "work_permits",
        ),
        chunk(
            "A Work Permit is for semi-skilled foreign workers. Work Permit levies apply.",
            "https://www.mom.gov.sg/passes-and-permits/work-permit-for-foreign-worker",
            "Work Permit",
            "Work Permit",
            "work_permits",
        ),
        chunk(
            "The application fee is 105 per pass. The issuance fee is 225.",
            "https://www.mom.gov.sg/passes-and-permits/fees",
            "Fees",
            "General",
            "fees",
        ),
        chunk(
            "Check eligibility with the self-assessment tool before you apply.",
            "https://www.mom.gov.sg/eligibility",
            "Eligibility",
            "General",
            "eligibility_requirements",
        ),
    ]
}
