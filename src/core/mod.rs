//! 核心编排层：错误类型与 Kernel（上下文组装 + 记忆增强生成）

pub mod error;
pub mod kernel;

pub use error::AgentError;
pub use kernel::Kernel;
