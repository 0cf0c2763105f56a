//! 记忆层：定维向量库（精确余弦检索）与嵌入驱动的高层门面

pub mod retrieval;
pub mod vector_db;

pub use retrieval::{Memory, MemoryError};
pub use vector_db::{MemoryHit, MemoryRecord, Metadata, VectorDb};
