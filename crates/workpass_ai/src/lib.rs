pub mod answer;
pub mod conversation;
pub mod embeddings;
pub mod engine;
mod http;
pub mod index;
pub mod llm;
pub mod ollama;
pub mod openai;
pub mod pipeline;
pub mod providers;
pub mod retrieve;
pub mod retry;
pub mod store;
