use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("failed to create cache directory {path}: {source}")]
    CacheDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("download failed for {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to write model to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("detector model not found at {0}")]
    Missing(PathBuf),
    #[error("could not determine cache directory")]
    NoCacheDir,
}

/// Progress callback: `(bytes_downloaded, total_bytes)`.
/// `total_bytes` is 0 if the server didn't provide Content-Length.
pub type ProgressFn = Box<dyn Fn(u64, u64) + Send>;

/// Locates detector model files, downloading them into a cache on first use.
pub struct ModelResolver {
    cache_dir: PathBuf,
    progress: Option<ProgressFn>,
}

impl ModelResolver {
    /// Resolver rooted at the platform cache directory.
    pub fn new() -> Result<Self, ModelResolveError> {
        Ok(Self::with_cache_dir(model_cache_dir()?))
    }

    pub fn with_cache_dir(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Resolve a model file by name.
    ///
    /// Resolution order:
    /// 1. Explicit path (must exist; never falls through to a download)
    /// 2. Cache directory
    /// 3. Download from `url` into the cache
    pub fn resolve(
        &self,
        name: &str,
        url: &str,
        explicit: Option<&Path>,
    ) -> Result<PathBuf, ModelResolveError> {
        if let Some(path) = explicit {
            return if path.exists() {
                Ok(path.to_path_buf())
            } else {
                Err(ModelResolveError::Missing(path.to_path_buf()))
            };
        }

        let cached_path = self.cache_dir.join(name);
        if cached_path.exists() {
            log::debug!("Using cached model {}", cached_path.display());
            return Ok(cached_path);
        }

        fs::create_dir_all(&self.cache_dir).map_err(|e| ModelResolveError::CacheDir {
            path: self.cache_dir.clone(),
            source: e,
        })?;
        log::info!("Downloading {name} from {url}");
        download(url, &cached_path, self.progress.as_ref())?;
        Ok(cached_path)
    }
}

/// Platform-specific model cache directory.
///
/// - macOS: `~/Library/Application Support/castwatch/models/`
/// - Linux: `$XDG_CACHE_HOME/castwatch/models/` or `~/.cache/castwatch/models/`
/// - Windows: `%LOCALAPPDATA%/castwatch/models/`
pub fn model_cache_dir() -> Result<PathBuf, ModelResolveError> {
    #[cfg(target_os = "macos")]
    {
        dirs::data_dir()
            .map(|d| d.join("castwatch").join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
    #[cfg(not(target_os = "macos"))]
    {
        dirs::cache_dir()
            .map(|d| d.join("castwatch").join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
}

fn download(url: &str, dest: &Path, progress: Option<&ProgressFn>) -> Result<(), ModelResolveError> {
    let temp_path = dest.with_extension("part");

    let result = download_inner(url, dest, &temp_path, progress);
    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

fn download_inner(
    url: &str,
    dest: &Path,
    temp_path: &Path,
    progress: Option<&ProgressFn>,
) -> Result<(), ModelResolveError> {
    let mut response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(|e| ModelResolveError::Download {
            url: url.to_string(),
            source: e,
        })?;

    let total = response.content_length().unwrap_or(0);
    let mut downloaded: u64 = 0;

    let write_err = |e: std::io::Error| ModelResolveError::Write {
        path: temp_path.to_path_buf(),
        source: e,
    };

    let mut file = fs::File::create(temp_path).map_err(write_err)?;
    let mut buf = vec![0u8; 256 * 1024];
    loop {
        let n = response.read(&mut buf).map_err(write_err)?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n]).map_err(write_err)?;
        downloaded += n as u64;
        if let Some(cb) = progress {
            cb(downloaded, total);
        }
    }
    file.flush().map_err(write_err)?;
    drop(file);

    fs::rename(temp_path, dest).map_err(|e| ModelResolveError::Write {
        path: dest.to_path_buf(),
        source: e,
    })
}
