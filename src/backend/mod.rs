//! The Document capability: the narrow interface through which stages
//! manipulate documents and rasterized images.
//!
//! The core never inspects document binary content. Everything format
//! specific (PDF parsing, page extraction, merging, rasterization) lives
//! behind [`DocumentBackend`]; handles are opaque tokens minted by the
//! backend. Handles carry their full capability surface from construction —
//! nothing is attached to them after the fact.

use std::path::{Path, PathBuf};

use anyhow::Result;
use async_trait::async_trait;

pub mod memory;

pub use memory::MemoryBackend;

/// Opaque reference to one loaded document (or a page slice of one).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentHandle(u64);

impl DocumentHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Opaque reference to a set of rasterized page images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageSet(u64);

impl ImageSet {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// External document operations consumed by the built-in stages.
///
/// Implementations may block on network or disk I/O; the engine never holds
/// a lock across these calls. Fetch timeouts are the backend's own concern.
#[async_trait]
pub trait DocumentBackend: Send + Sync {
    /// Loads a document from a source (file path, URL, whatever the backend
    /// supports) and returns a handle to it.
    async fn load(&self, source: &str) -> Result<DocumentHandle>;

    /// Number of pages in the document.
    async fn page_count(&self, doc: &DocumentHandle) -> Result<usize>;

    /// Extracts a single 0-based page as a new document.
    async fn extract_page(&self, doc: &DocumentHandle, index: usize) -> Result<DocumentHandle>;

    /// Merges documents into one, in order.
    async fn merge(&self, docs: &[DocumentHandle]) -> Result<DocumentHandle>;

    /// Rasterizes every page of the document at the given resolution (DPI).
    async fn rasterize(&self, doc: &DocumentHandle, resolution: u32) -> Result<ImageSet>;

    /// Composites image sets into a single merged image set, in order.
    async fn composite(&self, images: &[ImageSet]) -> Result<ImageSet>;

    /// Writes the document into `dir` under `name`, returning the path.
    async fn save(&self, doc: &DocumentHandle, dir: &Path, name: &str) -> Result<PathBuf>;

    /// Writes each image in the set into `dir` as `{prefix}_page_{n}`,
    /// returning the paths.
    async fn save_images(&self, images: &ImageSet, dir: &Path, prefix: &str)
        -> Result<Vec<PathBuf>>;
}
