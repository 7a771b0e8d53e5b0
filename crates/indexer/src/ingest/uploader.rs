use anyhow::Result;
use async_trait::async_trait;
use podgrep_segment::Document;
use std::sync::{Arc, Mutex};

/// Граница с внешним backend'ом: принимает готовый батч целиком.
///
/// Доставка at-least-once: повтор того же батча обязан быть идемпотентным
/// (перезапись по `id`). Ошибка: конец прогона, ретраев здесь нет.
#[async_trait]
pub trait BatchUploader: Send + Sync {
    async fn upload(&self, index: &str, docs: &[Document]) -> Result<()>;
}

#[async_trait]
impl<T: BatchUploader + ?Sized> BatchUploader for Arc<T> {
    async fn upload(&self, index: &str, docs: &[Document]) -> Result<()> {
        (**self).upload(index, docs).await
    }
}

#[derive(Debug, Clone)]
pub struct UploadedBatch {
    pub index: String,
    pub docs: Vec<Document>,
}

/// In-process uploader: просто копит батчи (для тестов и dry-run).
#[derive(Default, Clone)]
pub struct MemoryUploader {
    inner: Arc<Mutex<Vec<UploadedBatch>>>,
}

impl MemoryUploader {
    pub fn new() -> Self { Self::default() }

    pub fn batches(&self) -> Vec<UploadedBatch> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn doc_count(&self) -> usize {
        self.batches().iter().map(|b| b.docs.len()).sum()
    }
}

#[async_trait]
impl BatchUploader for MemoryUploader {
    async fn upload(&self, index: &str, docs: &[Document]) -> Result<()> {
        let mut g = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        g.push(UploadedBatch {
            index: index.to_string(),
            docs: docs.to_vec(),
        });
        Ok(())
    }
}
