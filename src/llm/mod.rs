//! LLM 层：消息/生成参数类型、后端抽象与实现（OpenAI 兼容 / Mock）、嵌入、模型管理

pub mod embedding;
pub mod manager;
pub mod mock;
pub mod openai;
pub mod traits;

pub use embedding::{create_embedder_from_config, EmbeddingProvider, OpenAiEmbedder};
pub use manager::LlmManager;
pub use mock::MockProvider;
pub use openai::OpenAiProvider;
pub use traits::{ChatMessage, Completion, GenerateOptions, LlmProvider, Role};
