//! Asset sources - where parameter-set documents and manifests come from
//!
//! The director never knows whether assets live on disk, behind a URL the
//! host already fetched, or in memory. It only asks an [`AssetSource`] for
//! the bytes behind a reference taken from the model manifest.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{MarionetteError, MarionetteResult};

/// Source of model assets, keyed by the references found in the manifest
pub trait AssetSource: Send + Sync {
    /// Fetch the raw bytes behind `source_ref`
    fn fetch(&self, source_ref: &str) -> MarionetteResult<Vec<u8>>;
}

/// Assets resolved relative to a model directory
#[derive(Debug, Clone)]
pub struct DirAssetSource {
    base_dir: PathBuf,
}

impl DirAssetSource {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Use the directory containing a `model3.json` as the base
    pub fn for_manifest(manifest_path: impl AsRef<Path>) -> Self {
        let base = manifest_path
            .as_ref()
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Self::new(base)
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Resolve a manifest reference to a path under the base directory
    pub fn resolve(&self, source_ref: &str) -> PathBuf {
        self.base_dir.join(source_ref)
    }
}

impl AssetSource for DirAssetSource {
    fn fetch(&self, source_ref: &str) -> MarionetteResult<Vec<u8>> {
        let path = self.resolve(source_ref);
        debug!(path = %path.display(), "fetching asset");
        std::fs::read(&path).map_err(|e| MarionetteError::asset_fetch(source_ref, e))
    }
}

/// Preloaded assets held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryAssetSource {
    assets: HashMap<String, Vec<u8>>,
}

impl MemoryAssetSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, source_ref: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.assets.insert(source_ref.into(), bytes.into());
    }

    pub fn with_asset(mut self, source_ref: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(source_ref, bytes);
        self
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

impl AssetSource for MemoryAssetSource {
    fn fetch(&self, source_ref: &str) -> MarionetteResult<Vec<u8>> {
        self.assets
            .get(source_ref)
            .cloned()
            .ok_or_else(|| MarionetteError::asset_fetch(source_ref, "not found"))
    }
}
