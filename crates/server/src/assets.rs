//! Static asset delivery for the companion UI.
//!
//! Files under the public directory are read through an in-memory cache
//! keyed by modification time. A filesystem watcher evicts a path as soon
//! as it changes, so the next request re-reads it.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use axum::{
    extract::State,
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use dashmap::DashMap;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::state::AppState;

/// Top-level directories the UI is allowed to load from
const ASSET_PREFIXES: [&str; 3] = ["assets/", "js/", "models/"];

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Clone)]
struct CachedAsset {
    modified: SystemTime,
    bytes: Bytes,
}

pub struct AssetCache {
    root: PathBuf,
    entries: Arc<DashMap<PathBuf, CachedAsset>>,
}

impl AssetCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let root = std::fs::canonicalize(&root).unwrap_or(root);
        Self {
            root,
            entries: Arc::new(DashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a request path onto a file under the public directory.
    pub fn resolve(&self, request_path: &str) -> Option<PathBuf> {
        let rel = request_path.trim_start_matches('/');
        let rel = match rel {
            "" | "index.html" => "index.html",
            other if ASSET_PREFIXES.iter().any(|p| other.starts_with(p)) => other,
            _ => return None,
        };
        let rel = Path::new(rel);
        if !rel.components().all(|c| matches!(c, Component::Normal(_))) {
            return None;
        }
        Some(self.root.join(rel))
    }

    /// Read-through lookup. `Ok(None)` when the file does not exist.
    pub async fn get(&self, path: &Path) -> Result<Option<Bytes>, AssetError> {
        let modified = match tokio::fs::metadata(path).await {
            Ok(meta) if meta.is_file() => meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            Ok(_) => return Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.invalidate(path);
                return Ok(None);
            }
            Err(source) => {
                return Err(AssetError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        if let Some(cached) = self.entries.get(path) {
            if cached.modified == modified {
                return Ok(Some(cached.bytes.clone()));
            }
        }

        let bytes = match tokio::fs::read(path).await {
            Ok(data) => Bytes::from(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(AssetError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        self.entries.insert(
            path.to_path_buf(),
            CachedAsset {
                modified,
                bytes: bytes.clone(),
            },
        );
        Ok(Some(bytes))
    }

    pub fn invalidate(&self, path: &Path) {
        if self.entries.remove(path).is_some() {
            debug!(component = "assets", path = %path.display(), "Evicted cached asset");
        }
    }

    pub fn cached_len(&self) -> usize {
        self.entries.len()
    }

    /// Watch the public directory and evict each path that changes.
    /// The returned watcher must be kept alive for invalidation to continue.
    pub fn spawn_watcher(&self) -> notify::Result<RecommendedWatcher> {
        let entries = Arc::clone(&self.entries);
        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| match res {
                Ok(event) => {
                    if matches!(event.kind, EventKind::Access(_)) {
                        return;
                    }
                    for path in event.paths {
                        entries.remove(&path);
                    }
                }
                Err(err) => {
                    warn!(
                        component = "assets",
                        event = "assets.watch_error",
                        error = %err,
                        "Asset watcher event error"
                    );
                }
            },
            notify::Config::default(),
        )?;
        watcher.watch(&self.root, RecursiveMode::Recursive)?;
        Ok(watcher)
    }
}

pub fn content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "html" => "text/html",
        "js" => "application/javascript",
        "css" => "text/css",
        // Also covers the Live2D *.model3.json / *.motion3.json family.
        "json" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "flac" => "audio/flac",
        _ => "application/octet-stream",
    }
}

/// HTML must never be cached so UI updates show up; everything else may be.
pub fn cache_control(content_type: &str) -> &'static str {
    if content_type == "text/html" {
        "no-cache, must-revalidate"
    } else {
        "public, max-age=3600"
    }
}

/// Fallback handler serving the UI from the asset cache.
pub async fn static_handler(
    State(state): State<Arc<AppState>>,
    uri: Uri,
) -> Result<Response, ApiError> {
    let assets = state.assets();
    let path = assets.resolve(uri.path()).ok_or(ApiError::NotFound)?;
    let bytes = assets
        .get(&path)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .ok_or(ApiError::NotFound)?;

    let content_type = content_type(&path);
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, cache_control(content_type)),
        ],
        bytes,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_only_known_locations() {
        let cache = AssetCache::new("/srv/public");
        let root = cache.root().to_path_buf();
        assert_eq!(cache.resolve("/"), Some(root.join("index.html")));
        assert_eq!(cache.resolve("/index.html"), Some(root.join("index.html")));
        assert_eq!(cache.resolve("/js/app.js"), Some(root.join("js/app.js")));
        assert_eq!(cache.resolve("/secret.txt"), None);
        assert_eq!(cache.resolve("/assets/../../etc/passwd"), None);
    }

    #[test]
    fn content_types_follow_extension() {
        assert_eq!(content_type(Path::new("a/index.HTML")), "text/html");
        assert_eq!(content_type(Path::new("cat.model3.json")), "application/json");
        assert_eq!(content_type(Path::new("cat.moc3")), "application/octet-stream");
        assert_eq!(cache_control("text/html"), "no-cache, must-revalidate");
        assert_eq!(cache_control("image/png"), "public, max-age=3600");
    }

    #[tokio::test]
    async fn rereads_when_modification_time_changes() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("index.html");
        std::fs::write(&file, "v1").unwrap();

        let cache = AssetCache::new(dir.path());
        let path = cache.resolve("/").unwrap();
        assert_eq!(cache.get(&path).await.unwrap().unwrap(), Bytes::from("v1"));
        assert_eq!(cache.cached_len(), 1);

        std::fs::write(&file, "v2").unwrap();
        let later = SystemTime::now() + std::time::Duration::from_secs(5);
        std::fs::File::options()
            .write(true)
            .open(&file)
            .unwrap()
            .set_modified(later)
            .unwrap();

        assert_eq!(cache.get(&path).await.unwrap().unwrap(), Bytes::from("v2"));
    }

    #[tokio::test]
    async fn missing_file_is_none_and_evicted() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("index.html");
        std::fs::write(&file, "v1").unwrap();

        let cache = AssetCache::new(dir.path());
        let path = cache.resolve("/").unwrap();
        cache.get(&path).await.unwrap();

        std::fs::remove_file(&file).unwrap();
        assert!(cache.get(&path).await.unwrap().is_none());
        assert_eq!(cache.cached_len(), 0);
    }

    #[test]
    fn invalidate_drops_single_entry() {
        let cache = AssetCache::new("/srv/public");
        let a = cache.root().join("js/a.js");
        let b = cache.root().join("js/b.js");
        for p in [&a, &b] {
            cache.entries.insert(
                p.clone(),
                CachedAsset {
                    modified: SystemTime::UNIX_EPOCH,
                    bytes: Bytes::from_static(b"x"),
                },
            );
        }
        cache.invalidate(&a);
        assert_eq!(cache.cached_len(), 1);
        assert!(cache.entries.contains_key(&b));
    }
}
