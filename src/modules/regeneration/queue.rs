use super::domain::RegenerationQueueItem;
use crate::modules::generation::domain::{GeneratedImage, ProcessingStatus};
use crate::modules::studio::domain::Gallery;
use crate::shared::errors::{AppError, AppResult};
use crate::log_debug;
use std::sync::Arc;
use tokio::sync::{Mutex, Notify};

/// Pending and finished regeneration requests, oldest first
///
/// Producers wake the single consumer through `Notify`; a wake-up sent while
/// the consumer is busy is kept as a permit, so none is lost.
#[derive(Clone)]
pub struct RegenerationQueue {
    items: Arc<Mutex<Vec<RegenerationQueueItem>>>,
    notify: Arc<Notify>,
    gallery: Gallery,
}

impl RegenerationQueue {
    pub fn new(gallery: Gallery) -> Self {
        Self {
            items: Arc::new(Mutex::new(Vec::new())),
            notify: Arc::new(Notify::new()),
            gallery,
        }
    }

    /// Move a gallery image into the queue
    pub async fn enqueue(&self, image_id: &str) -> AppResult<RegenerationQueueItem> {
        let image = self.gallery.remove(image_id).await.ok_or_else(|| {
            AppError::NotFound(format!("Image {} is not in the gallery", image_id))
        })?;
        Ok(self.enqueue_image(image).await)
    }

    pub async fn enqueue_image(&self, image: GeneratedImage) -> RegenerationQueueItem {
        let item = RegenerationQueueItem::new(image);
        self.items.lock().await.push(item.clone());
        log_debug!("Regeneration {} queued", item.id);
        self.notify.notify_one();
        item
    }

    pub async fn remove(&self, id: &str) -> Option<RegenerationQueueItem> {
        let mut items = self.items.lock().await;
        let index = items.iter().position(|item| item.id == id)?;
        Some(items.remove(index))
    }

    pub async fn get(&self, id: &str) -> Option<RegenerationQueueItem> {
        self.items
            .lock()
            .await
            .iter()
            .find(|item| item.id == id)
            .cloned()
    }

    pub async fn list(&self) -> Vec<RegenerationQueueItem> {
        self.items.lock().await.clone()
    }

    /// Oldest item still waiting
    pub async fn next_pending(&self) -> Option<RegenerationQueueItem> {
        self.items
            .lock()
            .await
            .iter()
            .find(|item| item.status == ProcessingStatus::Pending)
            .cloned()
    }

    pub async fn update<F>(&self, id: &str, change: F) -> bool
    where
        F: FnOnce(&mut RegenerationQueueItem),
    {
        let mut items = self.items.lock().await;
        match items.iter_mut().find(|item| item.id == id) {
            Some(item) => {
                change(item);
                true
            }
            None => false,
        }
    }

    pub async fn set_status(&self, id: &str, status: ProcessingStatus) -> bool {
        self.update(id, |item| item.status = status).await
    }

    /// Resolves after the next `enqueue`, or at once if one happened since
    /// the last wait
    pub async fn wait_for_work(&self) {
        self.notify.notified().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::generation::domain::{GenerationType, ImageData};

    fn image() -> GeneratedImage {
        GeneratedImage::new(ImageData::blank_pixel(), GenerationType::Edit, "p")
    }

    #[tokio::test]
    async fn test_enqueue_moves_image_out_of_gallery() {
        let gallery = Gallery::new();
        let source = image();
        gallery.prepend(source.clone()).await;
        let queue = RegenerationQueue::new(gallery.clone());

        let item = queue.enqueue(&source.id).await.unwrap();

        assert!(gallery.is_empty().await);
        assert_eq!(item.status, ProcessingStatus::Pending);
        assert_eq!(item.source_image, source);
        assert_eq!(queue.next_pending().await.map(|i| i.id), Some(item.id));
    }

    #[tokio::test]
    async fn test_enqueue_unknown_image_fails() {
        let queue = RegenerationQueue::new(Gallery::new());
        assert!(matches!(
            queue.enqueue("missing").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_next_pending_is_oldest_waiting() {
        let queue = RegenerationQueue::new(Gallery::new());
        let first = queue.enqueue_image(image()).await;
        let second = queue.enqueue_image(image()).await;

        queue.set_status(&first.id, ProcessingStatus::Done).await;
        assert_eq!(queue.next_pending().await.map(|i| i.id), Some(second.id.clone()));

        assert!(queue.remove(&second.id).await.is_some());
        assert!(queue.next_pending().await.is_none());
        assert_eq!(queue.list().await.len(), 1);
    }

    #[tokio::test]
    async fn test_wake_up_sent_before_waiting_is_kept() {
        let queue = RegenerationQueue::new(Gallery::new());
        queue.enqueue_image(image()).await;
        tokio::time::timeout(std::time::Duration::from_secs(1), queue.wait_for_work())
            .await
            .unwrap();
    }
}
