//! Concrete provider adapters
//!
//! Each adapter owns its metadata, model list, capability flags, and
//! vendor-call logic, and exposes nothing beyond the `AiProvider` trait.

pub mod anthropic;
pub mod google;
pub mod ollama;
pub mod openai;

pub use anthropic::AnthropicProvider;
pub use google::GoogleProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;
