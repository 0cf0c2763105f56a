//! 检索记忆门面：嵌入 + 向量库
//!
//! store 直接存向量；store_text / retrieve 经嵌入提供方编码，未配置嵌入时返回 NotConfigured。
//! 向量库由 RwLock 保护，跨轮共享；写入只追加、删除只整删，无需事务。

use std::sync::{Arc, RwLock};

use thiserror::Error;

use crate::llm::EmbeddingProvider;
use crate::memory::{MemoryHit, Metadata, VectorDb};

/// 记忆层错误
#[derive(Error, Debug)]
pub enum MemoryError {
    /// 向量维度与配置不符：拒绝写入/检索，不改动已存状态
    #[error("Embedding dim {actual} != expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// 未配置嵌入提供方（store_text / retrieve 需要）
    #[error("Embeddings provider not configured")]
    NotConfigured,

    #[error("Embedding failed: {0}")]
    Embedding(String),
}

/// 嵌入 + 向量库组合的高层记忆
pub struct Memory {
    db: RwLock<VectorDb>,
    embedder: RwLock<Option<Arc<dyn EmbeddingProvider>>>,
    dim: usize,
}

impl Memory {
    pub fn new(dim: usize) -> Self {
        Self {
            db: RwLock::new(VectorDb::new(dim)),
            embedder: RwLock::new(None),
            dim,
        }
    }

    pub fn with_embedder(self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        *self.embedder.write().unwrap() = Some(provider);
        self
    }

    pub fn set_embeddings_provider(&self, provider: Arc<dyn EmbeddingProvider>) {
        *self.embedder.write().unwrap() = Some(provider);
    }

    pub fn has_embedder(&self) -> bool {
        self.embedder.read().unwrap().is_some()
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// 存一条已编码的记忆；text 作为可检索原文保留
    pub fn store(
        &self,
        text: &str,
        embedding: Vec<f32>,
        metadata: Option<Metadata>,
    ) -> Result<u64, MemoryError> {
        self.db
            .write()
            .unwrap()
            .add(embedding, metadata.unwrap_or_default(), text)
    }

    /// 便捷写入：先嵌入再存
    pub async fn store_text(
        &self,
        text: &str,
        metadata: Option<Metadata>,
    ) -> Result<u64, MemoryError> {
        let vector = self.embed_one(text).await?;
        self.store(text, vector, metadata)
    }

    /// 嵌入查询并返回 top_k 最相似记录
    pub async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<MemoryHit>, MemoryError> {
        let vector = self.embed_one(query).await?;
        self.db.read().unwrap().search(&vector, top_k)
    }

    pub fn delete(&self, id: u64) -> bool {
        self.db.write().unwrap().delete(id)
    }

    pub fn len(&self) -> usize {
        self.db.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.db.read().unwrap().is_empty()
    }

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>, MemoryError> {
        let embedder = self
            .embedder
            .read()
            .unwrap()
            .clone()
            .ok_or(MemoryError::NotConfigured)?;
        let mut vectors = embedder
            .embed(&[text.to_string()])
            .await
            .map_err(MemoryError::Embedding)?;
        if vectors.is_empty() {
            return Err(MemoryError::Embedding("empty embedding response".to_string()));
        }
        Ok(vectors.swap_remove(0))
    }
}
