use crate::modules::generation::domain::{
    ImageData, ProcessingStatus, ProductImageFile, ProductJob,
};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Uploaded products, updated in place by id as pipelines progress
#[derive(Clone, Default)]
pub struct ProductCatalog {
    products: Arc<RwLock<Vec<ProductImageFile>>>,
}

impl ProductCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add(&self, images: Vec<ImageData>) -> Vec<ProductImageFile> {
        let created: Vec<ProductImageFile> =
            images.into_iter().map(ProductImageFile::new).collect();
        self.products.write().await.extend(created.iter().cloned());
        created
    }

    pub async fn get(&self, id: &str) -> Option<ProductImageFile> {
        self.products
            .read()
            .await
            .iter()
            .find(|product| product.id == id)
            .cloned()
    }

    pub async fn list(&self) -> Vec<ProductImageFile> {
        self.products.read().await.clone()
    }

    pub async fn jobs(&self) -> Vec<ProductJob> {
        self.products
            .read()
            .await
            .iter()
            .map(ProductImageFile::to_job)
            .collect()
    }

    /// Apply `change` to the product with `id`; false when it no longer exists
    pub async fn update<F>(&self, id: &str, change: F) -> bool
    where
        F: FnOnce(&mut ProductImageFile),
    {
        let mut products = self.products.write().await;
        match products.iter_mut().find(|product| product.id == id) {
            Some(product) => {
                change(product);
                true
            }
            None => false,
        }
    }

    pub async fn set_status(&self, id: &str, status: ProcessingStatus) -> bool {
        self.update(id, |product| product.status = status).await
    }

    pub async fn mark_error(&self, id: &str, message: &str) -> bool {
        let message = message.to_string();
        self.update(id, move |product| {
            product.status = ProcessingStatus::Error;
            product.error_message = Some(message);
        })
        .await
    }

    pub async fn remove(&self, id: &str) -> Option<ProductImageFile> {
        let mut products = self.products.write().await;
        let index = products.iter().position(|product| product.id == id)?;
        Some(products.remove(index))
    }

    pub async fn clear(&self) {
        self.products.write().await.clear();
    }

    /// Replace the catalog with the background-removed images as new
    /// originals, newest first. Returns how many products were promoted.
    pub async fn promote_transparent(&self) -> usize {
        let mut products = self.products.write().await;
        let promoted: Vec<ProductImageFile> = products
            .iter()
            .rev()
            .filter_map(|product| {
                product.transparent.as_ref().map(|transparent| ProductImageFile {
                    id: product.id.clone(),
                    original: transparent.clone(),
                    status: ProcessingStatus::Pending,
                    transparent: Some(transparent.clone()),
                    generated_preview: None,
                    error_message: None,
                })
            })
            .collect();
        if promoted.is_empty() {
            return 0;
        }
        let count = promoted.len();
        *products = promoted;
        count
    }
}
