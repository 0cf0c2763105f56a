//! 内存向量库：精确余弦检索
//!
//! 记录集很小（进程内智能体记忆），全量扫描即可，不引入近似索引。
//! id 由计数器单调分配，删除后不复用；检索按相似度降序稳定排序，平分保持插入序。

use std::collections::HashMap;

use crate::memory::MemoryError;

/// 记录元数据：不透明键值对
pub type Metadata = HashMap<String, serde_json::Value>;

/// 一条记忆记录：向量 + 原文 + 元数据，存入后除删除外不可变
#[derive(Debug, Clone)]
pub struct MemoryRecord {
    pub id: u64,
    pub vector: Vec<f32>,
    pub metadata: Metadata,
    pub text: String,
}

/// 检索命中
#[derive(Debug, Clone)]
pub struct MemoryHit {
    pub id: u64,
    pub similarity: f32,
    pub metadata: Metadata,
    pub text: String,
}

/// 定维向量库
#[derive(Debug)]
pub struct VectorDb {
    dim: usize,
    records: Vec<MemoryRecord>,
    next_id: u64,
}

impl VectorDb {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            records: Vec::new(),
            next_id: 1,
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// 追加一条记录；维度不符时拒绝且不改动已存状态
    pub fn add(
        &mut self,
        vector: Vec<f32>,
        metadata: Metadata,
        text: impl Into<String>,
    ) -> Result<u64, MemoryError> {
        if vector.len() != self.dim {
            return Err(MemoryError::DimensionMismatch {
                expected: self.dim,
                actual: vector.len(),
            });
        }
        let id = self.next_id;
        self.next_id += 1;
        self.records.push(MemoryRecord {
            id,
            vector,
            metadata,
            text: text.into(),
        });
        Ok(id)
    }

    /// 对每条记录算余弦相似度，降序取前 top_k；零范数向量记 0 分
    pub fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<MemoryHit>, MemoryError> {
        if query.len() != self.dim {
            return Err(MemoryError::DimensionMismatch {
                expected: self.dim,
                actual: query.len(),
            });
        }
        let mut scored: Vec<(f32, &MemoryRecord)> = self
            .records
            .iter()
            .map(|record| (cosine_similarity(query, &record.vector), record))
            .collect();
        // 稳定排序：相同分值保持插入序
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        Ok(scored
            .into_iter()
            .take(top_k)
            .map(|(similarity, record)| MemoryHit {
                id: record.id,
                similarity,
                metadata: record.metadata.clone(),
                text: record.text.clone(),
            })
            .collect())
    }

    pub fn get(&self, id: u64) -> Option<&MemoryRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn delete(&mut self, id: u64) -> bool {
        let before = self.records.len();
        self.records.retain(|r| r.id != id);
        self.records.len() < before
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// 余弦相似度；任一向量范数为零时返回 0.0
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db3() -> VectorDb {
        VectorDb::new(3)
    }

    #[test]
    fn add_rejects_wrong_dimension_without_mutation() {
        let mut db = db3();
        let err = db.add(vec![1.0, 0.0], Metadata::new(), "short").unwrap_err();
        assert!(matches!(
            err,
            MemoryError::DimensionMismatch { expected: 3, actual: 2 }
        ));
        assert!(db.is_empty());
    }

    #[test]
    fn ids_stay_monotonic_after_delete() {
        let mut db = db3();
        let a = db.add(vec![1.0, 0.0, 0.0], Metadata::new(), "a").unwrap();
        let b = db.add(vec![0.0, 1.0, 0.0], Metadata::new(), "b").unwrap();
        assert_eq!((a, b), (1, 2));
        assert!(db.delete(a));
        assert!(!db.delete(a));
        let c = db.add(vec![0.0, 0.0, 1.0], Metadata::new(), "c").unwrap();
        assert_eq!(c, 3);
        assert!(db.get(a).is_none());
        assert_eq!(db.get(c).unwrap().text, "c");
    }

    #[test]
    fn search_ranks_descending_and_caps_at_top_k() {
        let mut db = db3();
        db.add(vec![0.0, 1.0, 0.0], Metadata::new(), "orthogonal").unwrap();
        db.add(vec![1.0, 0.0, 0.0], Metadata::new(), "aligned").unwrap();
        db.add(vec![1.0, 1.0, 0.0], Metadata::new(), "diagonal").unwrap();
        let hits = db.search(&[1.0, 0.0, 0.0], 2).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].text, "aligned");
        assert_eq!(hits[1].text, "diagonal");
        assert!(hits[0].similarity >= hits[1].similarity);
    }

    #[test]
    fn ties_preserve_insertion_order() {
        let mut db = db3();
        let first = db.add(vec![1.0, 0.0, 0.0], Metadata::new(), "first").unwrap();
        let second = db.add(vec![1.0, 0.0, 0.0], Metadata::new(), "second").unwrap();
        let hits = db.search(&[1.0, 0.0, 0.0], 5).unwrap();
        assert_eq!(hits[0].id, first);
        assert_eq!(hits[1].id, second);
    }

    #[test]
    fn zero_norm_vectors_score_zero() {
        let mut db = db3();
        db.add(vec![0.0, 0.0, 0.0], Metadata::new(), "zero").unwrap();
        db.add(vec![1.0, 0.0, 0.0], Metadata::new(), "aligned").unwrap();
        let hits = db.search(&[1.0, 0.0, 0.0], 5).unwrap();
        assert_eq!(hits[0].text, "aligned");
        assert_eq!(hits[1].similarity, 0.0);
    }

    #[test]
    fn search_rejects_wrong_query_dimension() {
        let db = db3();
        assert!(db.search(&[1.0], 3).is_err());
    }
}
