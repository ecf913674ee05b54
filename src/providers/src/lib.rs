//! LLM provider abstraction for the EasyPrompt Gateway
//!
//! Normalizes heterogeneous provider APIs (Anthropic, OpenAI, Google,
//! Ollama) behind one `AiProvider` contract, with a registry holding one
//! adapter instance per provider for the life of the process.

pub mod adapters;
pub mod error;
pub mod error_utils;
pub mod parse;
pub mod prompts;
pub mod provider;
pub mod registry;

pub use adapters::{AnthropicProvider, GoogleProvider, OllamaProvider, OpenAiProvider};
pub use error::{ProviderError, ProviderResult};
pub use provider::{api_key_available, AiProvider};
pub use registry::ProviderRegistry;
