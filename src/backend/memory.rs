//! In-memory [`DocumentBackend`] used by the test suite and the CLI's
//! demonstration runs.
//!
//! Documents are synthetic: a source name plus a list of page labels. Saving
//! writes small plain-text placeholder files so resource tracking and
//! cleanup behave exactly as they would with a real backend.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;

use super::{DocumentBackend, DocumentHandle, ImageSet};

#[derive(Debug, Clone)]
struct MemoryDoc {
    source: String,
    pages: Vec<String>,
}

#[derive(Debug, Clone)]
struct PageImage {
    label: String,
    resolution: u32,
}

#[derive(Default)]
struct State {
    next_id: u64,
    docs: HashMap<u64, MemoryDoc>,
    images: HashMap<u64, Vec<PageImage>>,
}

impl State {
    fn mint(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn doc(&self, handle: &DocumentHandle) -> Result<&MemoryDoc> {
        self.docs
            .get(&handle.id())
            .ok_or_else(|| anyhow!("unknown document handle {}", handle.id()))
    }

    fn image_set(&self, handle: &ImageSet) -> Result<&Vec<PageImage>> {
        self.images
            .get(&handle.id())
            .ok_or_else(|| anyhow!("unknown image set {}", handle.id()))
    }
}

/// Synthetic document store keyed by source name.
pub struct MemoryBackend {
    sources: HashMap<String, usize>,
    default_page_count: Option<usize>,
    state: Mutex<State>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            sources: HashMap::new(),
            default_page_count: None,
            state: Mutex::new(State::default()),
        }
    }

    /// Registers a source so `load` can resolve it.
    pub fn with_document(mut self, source: &str, page_count: usize) -> Self {
        self.sources.insert(source.to_string(), page_count);
        self
    }

    /// Makes `load` succeed for any source with the given page count.
    pub fn with_default_page_count(mut self, page_count: usize) -> Self {
        self.default_page_count = Some(page_count);
        self
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| anyhow!("backend state poisoned"))
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentBackend for MemoryBackend {
    async fn load(&self, source: &str) -> Result<DocumentHandle> {
        let page_count = self
            .sources
            .get(source)
            .copied()
            .or(self.default_page_count)
            .ok_or_else(|| anyhow!("source not found: {source}"))?;

        let mut state = self.lock()?;
        let id = state.mint();
        let pages = (1..=page_count).map(|n| format!("{source}#p{n}")).collect();
        state.docs.insert(
            id,
            MemoryDoc {
                source: source.to_string(),
                pages,
            },
        );
        Ok(DocumentHandle::new(id))
    }

    async fn page_count(&self, doc: &DocumentHandle) -> Result<usize> {
        let state = self.lock()?;
        Ok(state.doc(doc)?.pages.len())
    }

    async fn extract_page(&self, doc: &DocumentHandle, index: usize) -> Result<DocumentHandle> {
        let mut state = self.lock()?;
        let source = state.doc(doc)?.source.clone();
        let page = state
            .doc(doc)?
            .pages
            .get(index)
            .cloned()
            .ok_or_else(|| anyhow!("page index {index} out of bounds"))?;
        let id = state.mint();
        state.docs.insert(
            id,
            MemoryDoc {
                source,
                pages: vec![page],
            },
        );
        Ok(DocumentHandle::new(id))
    }

    async fn merge(&self, docs: &[DocumentHandle]) -> Result<DocumentHandle> {
        if docs.is_empty() {
            bail!("nothing to merge");
        }
        let mut state = self.lock()?;
        let mut pages = Vec::new();
        let mut sources = Vec::new();
        for handle in docs {
            let doc = state.doc(handle)?;
            pages.extend(doc.pages.iter().cloned());
            sources.push(doc.source.clone());
        }
        let id = state.mint();
        state.docs.insert(
            id,
            MemoryDoc {
                source: format!("merge({})", sources.join("+")),
                pages,
            },
        );
        Ok(DocumentHandle::new(id))
    }

    async fn rasterize(&self, doc: &DocumentHandle, resolution: u32) -> Result<ImageSet> {
        let mut state = self.lock()?;
        let images: Vec<PageImage> = state
            .doc(doc)?
            .pages
            .iter()
            .map(|page| PageImage {
                label: format!("{page}@{resolution}dpi"),
                resolution,
            })
            .collect();
        let id = state.mint();
        state.images.insert(id, images);
        Ok(ImageSet::new(id))
    }

    async fn composite(&self, images: &[ImageSet]) -> Result<ImageSet> {
        if images.is_empty() {
            bail!("nothing to composite");
        }
        let mut state = self.lock()?;
        let mut labels = Vec::new();
        let mut resolution = 0;
        for handle in images {
            for image in state.image_set(handle)? {
                labels.push(image.label.clone());
                resolution = resolution.max(image.resolution);
            }
        }
        // A composite is a single stacked image, the way raster merging
        // stitches pages vertically.
        let merged = PageImage {
            label: format!("composite({})", labels.join("+")),
            resolution,
        };
        let id = state.mint();
        state.images.insert(id, vec![merged]);
        Ok(ImageSet::new(id))
    }

    async fn save(&self, doc: &DocumentHandle, dir: &Path, name: &str) -> Result<PathBuf> {
        let content = {
            let state = self.lock()?;
            let doc = state.doc(doc)?;
            format!("source: {}\npages: {}\n", doc.source, doc.pages.join(", "))
        };
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
        let path = dir.join(format!("{name}.doc"));
        std::fs::write(&path, content)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(path)
    }

    async fn save_images(
        &self,
        images: &ImageSet,
        dir: &Path,
        prefix: &str,
    ) -> Result<Vec<PathBuf>> {
        let labels: Vec<String> = {
            let state = self.lock()?;
            state
                .image_set(images)?
                .iter()
                .map(|image| image.label.clone())
                .collect()
        };
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
        let mut paths = Vec::new();
        for (i, label) in labels.iter().enumerate() {
            let path = dir.join(format!("{prefix}_page_{}.png", i + 1));
            std::fs::write(&path, label)
                .with_context(|| format!("failed to write {}", path.display()))?;
            paths.push(path);
        }
        Ok(paths)
    }
}
