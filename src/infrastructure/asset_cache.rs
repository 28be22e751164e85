// Asset cache - versioned offline copies of the client shell
//
// One directory per cache generation under `cache_dir`, named after the cache
// version (e.g. `safetrack-v1`), holding one file per cached URL.
use bytes::Bytes;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tokio::fs;

/// Tag registered by clients for deferred location uploads.
pub const SYNC_LOCATION_TAG: &str = "sync-location";

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to cache {url}: {source}")]
    Install {
        url: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid asset path '{0}'")]
    InvalidPath(String),
    #[error("asset cache I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CachedAsset {
    pub body: Bytes,
    pub content_type: &'static str,
    /// False when the origin answered because the cache had no entry.
    pub from_cache: bool,
}

#[derive(Debug, Clone)]
pub struct AssetCache {
    origin: PathBuf,
    cache_dir: PathBuf,
    name: String,
    urls: Vec<String>,
}

impl AssetCache {
    pub fn new(origin: PathBuf, cache_dir: PathBuf, name: &str, urls: Vec<String>) -> Self {
        Self {
            origin,
            cache_dir,
            name: name.to_string(),
            urls,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Caches every configured URL. All or nothing: on any failure the current
    /// generation is left as it was.
    pub async fn install(&self) -> Result<usize, AssetError> {
        let staging = self.cache_dir.join(format!("{}.partial", self.name));
        if fs::try_exists(&staging).await? {
            fs::remove_dir_all(&staging).await?;
        }
        fs::create_dir_all(&staging).await?;

        for url in &self.urls {
            let source = origin_path(&self.origin, url)?;
            let target = staging.join(entry_file_name(url));
            if let Err(source_err) = fs::copy(&source, &target).await {
                let _ = fs::remove_dir_all(&staging).await;
                return Err(AssetError::Install {
                    url: url.clone(),
                    source: source_err,
                });
            }
        }

        let generation = self.generation_dir();
        if fs::try_exists(&generation).await? {
            fs::remove_dir_all(&generation).await?;
        }
        fs::rename(&staging, &generation).await?;

        tracing::info!("Opened cache {} ({} assets)", self.name, self.urls.len());
        Ok(self.urls.len())
    }

    /// Cache first, then origin. Origin hits are not written back.
    pub async fn fetch(&self, path: &str) -> Result<Option<CachedAsset>, AssetError> {
        let content_type = content_type_for(path);

        let entry = self.generation_dir().join(entry_file_name(path));
        match fs::read(&entry).await {
            Ok(body) => {
                return Ok(Some(CachedAsset {
                    body: Bytes::from(body),
                    content_type,
                    from_cache: true,
                }));
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let source = origin_path(&self.origin, path)?;
        match fs::read(&source).await {
            Ok(body) => Ok(Some(CachedAsset {
                body: Bytes::from(body),
                content_type,
                from_cache: false,
            })),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Deletes every cache generation other than the current one. Returns the deleted names.
    pub async fn activate(&self) -> Result<Vec<String>, AssetError> {
        let mut removed = Vec::new();
        let mut entries = match fs::read_dir(&self.cache_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(removed),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name == self.name || !entry.file_type().await?.is_dir() {
                continue;
            }
            fs::remove_dir_all(entry.path()).await?;
            tracing::info!("Deleted stale cache {}", name);
            removed.push(name);
        }

        Ok(removed)
    }

    fn generation_dir(&self) -> PathBuf {
        self.cache_dir.join(&self.name)
    }
}

/// Runs the deferred work registered under `tag`. Returns false for unknown tags.
pub async fn background_sync(tag: &str) -> bool {
    if tag != SYNC_LOCATION_TAG {
        tracing::debug!("Ignoring sync tag {}", tag);
        return false;
    }

    // Samples are persisted as they arrive, so there is nothing queued to upload.
    tracing::info!("Syncing locations...");
    true
}

fn entry_file_name(url: &str) -> String {
    urlencoding::encode(url).into_owned()
}

/// Maps a URL path onto the origin directory. `/` is `index.html`; `..` is refused.
fn origin_path(origin: &Path, url: &str) -> Result<PathBuf, AssetError> {
    let relative = Path::new(url.trim_start_matches('/'));
    if relative.components().any(|c| !matches!(c, Component::Normal(_))) {
        return Err(AssetError::InvalidPath(url.to_string()));
    }

    if relative.as_os_str().is_empty() {
        Ok(origin.join("index.html"))
    } else {
        Ok(origin.join(relative))
    }
}

fn content_type_for(path: &str) -> &'static str {
    let extension = if path.ends_with('/') {
        "html"
    } else {
        path.rsplit('.').next().unwrap_or("")
    };

    match extension {
        "html" => "text/html; charset=utf-8",
        "css" => "text/css",
        "js" => "application/javascript",
        "json" | "webmanifest" => "application/manifest+json",
        "png" => "image/png",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        _ => "application/octet-stream",
    }
}
