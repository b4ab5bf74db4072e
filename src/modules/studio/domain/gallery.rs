use crate::modules::generation::domain::GeneratedImage;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct GalleryState {
    images: Vec<GeneratedImage>,
    selected: HashSet<String>,
}

/// Results collection, newest first, with a selection set keyed by image id
#[derive(Clone, Default)]
pub struct Gallery {
    state: Arc<RwLock<GalleryState>>,
}

impl Gallery {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn prepend(&self, image: GeneratedImage) {
        self.state.write().await.images.insert(0, image);
    }

    pub async fn remove(&self, id: &str) -> Option<GeneratedImage> {
        let mut state = self.state.write().await;
        state.selected.remove(id);
        let index = state.images.iter().position(|image| image.id == id)?;
        Some(state.images.remove(index))
    }

    pub async fn get(&self, id: &str) -> Option<GeneratedImage> {
        self.state
            .read()
            .await
            .images
            .iter()
            .find(|image| image.id == id)
            .cloned()
    }

    pub async fn list(&self) -> Vec<GeneratedImage> {
        self.state.read().await.images.clone()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.images.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn toggle_selection(&self, id: &str) {
        let mut state = self.state.write().await;
        if !state.selected.remove(id) {
            state.selected.insert(id.to_string());
        }
    }

    /// Selects everything, or clears the selection when all are selected already
    pub async fn toggle_select_all(&self) {
        let mut state = self.state.write().await;
        if state.selected.len() == state.images.len() {
            state.selected.clear();
        } else {
            state.selected = state.images.iter().map(|image| image.id.clone()).collect();
        }
    }

    pub async fn selected(&self) -> Vec<GeneratedImage> {
        let state = self.state.read().await;
        state
            .images
            .iter()
            .filter(|image| state.selected.contains(&image.id))
            .cloned()
            .collect()
    }

    pub async fn delete_selected(&self) -> usize {
        let mut state = self.state.write().await;
        let selected = std::mem::take(&mut state.selected);
        let before = state.images.len();
        state.images.retain(|image| !selected.contains(&image.id));
        before - state.images.len()
    }

    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.images.clear();
        state.selected.clear();
    }
}

/// The artifact currently on display
#[derive(Clone, Default)]
pub struct Viewer {
    current: Arc<RwLock<Option<GeneratedImage>>>,
}

impl Viewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn show(&self, image: GeneratedImage) {
        *self.current.write().await = Some(image);
    }

    pub async fn clear(&self) {
        *self.current.write().await = None;
    }

    pub async fn current(&self) -> Option<GeneratedImage> {
        self.current.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::generation::domain::{GenerationType, ImageData};

    fn image(prompt: &str) -> GeneratedImage {
        GeneratedImage::new(ImageData::blank_pixel(), GenerationType::Tti, prompt)
    }

    #[tokio::test]
    async fn test_prepend_keeps_newest_first() {
        let gallery = Gallery::new();
        gallery.prepend(image("a")).await;
        gallery.prepend(image("b")).await;

        let prompts: Vec<String> = gallery.list().await.into_iter().map(|i| i.prompt).collect();
        assert_eq!(prompts, vec!["b", "a"]);
    }

    #[tokio::test]
    async fn test_delete_selected() {
        let gallery = Gallery::new();
        let keep = image("keep");
        let drop = image("drop");
        gallery.prepend(keep.clone()).await;
        gallery.prepend(drop.clone()).await;

        gallery.toggle_selection(&drop.id).await;
        assert_eq!(gallery.selected().await, vec![drop]);
        assert_eq!(gallery.delete_selected().await, 1);
        assert_eq!(gallery.list().await, vec![keep]);
        assert!(gallery.selected().await.is_empty());
    }

    #[tokio::test]
    async fn test_remove_clears_selection() {
        let gallery = Gallery::new();
        let item = image("x");
        gallery.prepend(item.clone()).await;
        gallery.toggle_select_all().await;

        assert_eq!(gallery.remove(&item.id).await, Some(item));
        assert!(gallery.is_empty().await);
        assert!(gallery.selected().await.is_empty());
    }
}
