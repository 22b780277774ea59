//! Static monitor pages and scripts served from a directory on disk.

use shard_topology::TopologyError;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Asset file backing `GET /`.
pub const MAIN_PAGE: &str = "monitor.html";
/// Asset file backing `GET /monitor2`.
pub const SECOND_PAGE: &str = "monitor2.html";
/// Asset file backing `GET /monitor3`.
pub const THIRD_PAGE: &str = "monitor3.html";
/// Subdirectory holding the visualization scripts.
pub const SCRIPT_DIR: &str = "d3";

/// A loaded asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    /// Content-Type header value
    pub content_type: &'static str,
    /// File bytes
    pub body: Vec<u8>,
}

/// Reads assets relative to a root directory on every request.
#[derive(Debug, Clone)]
pub struct AssetStore {
    root: PathBuf,
}

impl AssetStore {
    /// Create a store rooted at `root`. The directory need not exist yet.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load one of the monitor pages.
    pub async fn page(&self, file: &str) -> Result<Asset, TopologyError> {
        self.load(Path::new(file)).await
    }

    /// Load a script from the script directory.
    pub async fn script(&self, file: &str) -> Result<Asset, TopologyError> {
        self.load(&Path::new(SCRIPT_DIR).join(file)).await
    }

    async fn load(&self, relative: &Path) -> Result<Asset, TopologyError> {
        if !is_plain_relative(relative) {
            return Err(TopologyError::AssetUnavailable(format!(
                "{} escapes the asset directory",
                relative.display()
            )));
        }

        let path = self.root.join(relative);
        let body = tokio::fs::read(&path).await.map_err(|e| {
            TopologyError::AssetUnavailable(format!("{}: {e}", relative.display()))
        })?;
        debug!(path = %path.display(), bytes = body.len(), "Asset loaded");

        Ok(Asset {
            content_type: content_type(relative),
            body,
        })
    }
}

fn is_plain_relative(path: &Path) -> bool {
    path.components().all(|c| matches!(c, Component::Normal(_)))
}

fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html") => "text/html; charset=utf-8",
        Some("js") => "application/javascript",
        Some("css") => "text/css",
        Some("json") => "application/json",
        _ => "application/octet-stream",
    }
}
