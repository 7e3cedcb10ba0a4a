//! Source and logo loading.
//!
//! Fetches media bytes from local files, HTTP(S) URLs, `data:` URIs or
//! in-memory buffers, and keeps decoded logos in a TTL cache.
//!
//! # Supported Sources
//!
//! - `/path/to/file.jpg` or `file:///path/to/file.jpg` - local file
//! - `https://cdn.example.com/capture.mp4` - remote file
//! - `http://...` - remote file, only when insecure HTTP is allowed
//! - `data:image/png;base64,...` - inline asset
//!
//! # Remote pixel access
//!
//! Reading pixels of a remote asset is a capability of the loader, not a
//! per-call decision. [`SourceCapabilities`] is checked before any fetch.
//!
//! # Example
//!
//! ```ignore
//! use sourceable::watermark::asset_loader::{AssetLoader, AssetLoaderConfig, MediaSource};
//!
//! let loader = AssetLoader::new(AssetLoaderConfig::default())?;
//! let logo = loader.load_logo(&MediaSource::parse("assets/logo.png")?).await?;
//! ```

use super::WatermarkError;
use crate::config::SourcesConfig;
use base64::Engine as _;
use bytes::Bytes;
use image::{DynamicImage, ImageFormat, RgbaImage};
use moka::future::Cache;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Errors raised while fetching bytes. Callers map them onto
/// [`WatermarkError::SourceLoad`] or [`WatermarkError::LogoLoad`].
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("remote sources are not permitted: {0}")]
    RemoteNotAllowed(String),

    #[error("insecure http sources are not permitted: {0}")]
    InsecureNotAllowed(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP fetch failed: {0}")]
    Http(String),

    #[error("HTTP request failed with status: {0}")]
    Status(u16),

    #[error("asset is {size} bytes, limit is {limit}")]
    TooLarge { size: u64, limit: u64 },

    #[error("invalid data URI: {0}")]
    InvalidDataUri(String),

    #[error("failed to decode image: {0}")]
    Decode(String),
}

/// Where a piece of media comes from.
///
/// Equality and hashing cover the full payload of inline sources, so the
/// value itself is the logo cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MediaSource {
    File(PathBuf),
    Https(String),
    Http(String),
    DataUri(String),
    Bytes { data: Bytes, name: Option<String> },
}

impl MediaSource {
    /// Parse a source string.
    ///
    /// Anything that is not a URL or `data:` URI is treated as a file path.
    pub fn parse(source: &str) -> Result<Self, WatermarkError> {
        let source = source.trim();
        if source.is_empty() {
            return Err(WatermarkError::Config("Media source cannot be empty".to_string()));
        }

        if source.starts_with("https://") {
            Ok(Self::Https(source.to_string()))
        } else if source.starts_with("http://") {
            Ok(Self::Http(source.to_string()))
        } else if source.starts_with("data:") {
            Ok(Self::DataUri(source.to_string()))
        } else if let Some(path) = source.strip_prefix("file://") {
            Ok(Self::File(PathBuf::from(path)))
        } else if source.contains("://") {
            Err(WatermarkError::Config(format!(
                "Unsupported source protocol: {source}. Use a file path, https://, http:// or data:"
            )))
        } else {
            Ok(Self::File(PathBuf::from(source)))
        }
    }

    pub fn from_bytes(data: Bytes) -> Self {
        Self::Bytes { data, name: None }
    }

    pub fn from_named_bytes(data: Bytes, name: impl Into<String>) -> Self {
        Self::Bytes {
            data,
            name: Some(name.into()),
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Https(_) | Self::Http(_))
    }

    /// Log label. Inline payloads are abbreviated.
    pub fn describe(&self) -> String {
        match self {
            Self::File(path) => path.display().to_string(),
            Self::Https(url) | Self::Http(url) => url.clone(),
            Self::DataUri(uri) => {
                let header = uri.split(',').next().unwrap_or("data:");
                format!("{},<{} bytes>", header, uri.len())
            }
            Self::Bytes { data, name } => match name {
                Some(name) => format!("{} <{} bytes>", name, data.len()),
                None => format!("<{} bytes>", data.len()),
            },
        }
    }

    /// Lowercase file extension, if the source name carries one.
    pub fn extension(&self) -> Option<String> {
        let name = match self {
            Self::File(path) => return path.extension().map(|e| e.to_string_lossy().to_lowercase()),
            Self::Https(url) | Self::Http(url) => url.split(['?', '#']).next().unwrap_or(url),
            Self::Bytes { name: Some(name), .. } => name.as_str(),
            Self::DataUri(_) | Self::Bytes { name: None, .. } => return None,
        };
        let file = name.rsplit('/').next().unwrap_or(name);
        file.rsplit_once('.').map(|(_, ext)| ext.to_lowercase())
    }

    /// Media kind implied by the name or `data:` MIME type alone.
    pub fn kind_hint(&self) -> Option<MediaKind> {
        if let Self::DataUri(uri) = self {
            let mime = uri.strip_prefix("data:")?.split([';', ',']).next()?;
            return MediaKind::from_mime(mime);
        }
        self.extension().and_then(|ext| MediaKind::from_extension(&ext))
    }
}

/// Image or video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" | "png" | "gif" | "webp" => Some(Self::Image),
            "mp4" | "m4v" | "mov" | "webm" | "mkv" | "avi" => Some(Self::Video),
            _ => None,
        }
    }

    pub fn from_mime(mime: &str) -> Option<Self> {
        let mime = mime.to_ascii_lowercase();
        if mime.starts_with("image/") {
            Some(Self::Image)
        } else if mime.starts_with("video/") {
            Some(Self::Video)
        } else {
            None
        }
    }

    /// Classify by magic bytes, falling back to an extension hint.
    pub fn detect(data: &[u8], extension: Option<&str>) -> Option<Self> {
        if image::guess_format(data).is_ok() {
            return Some(Self::Image);
        }
        let is_iso_bmff = data.len() >= 12 && &data[4..8] == b"ftyp";
        let is_matroska = data.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]);
        let is_avi = data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"AVI ";
        if is_iso_bmff || is_matroska || is_avi {
            return Some(Self::Video);
        }
        extension.and_then(Self::from_extension)
    }
}

/// What the loader is allowed to reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceCapabilities {
    /// Read pixels from assets not on the local machine.
    pub allow_remote: bool,
    /// Permit plain `http://` in addition to `https://`.
    pub allow_insecure_http: bool,
}

impl Default for SourceCapabilities {
    fn default() -> Self {
        Self {
            allow_remote: true,
            allow_insecure_http: false,
        }
    }
}

impl SourceCapabilities {
    pub fn check(&self, source: &MediaSource) -> Result<(), AssetError> {
        match source {
            MediaSource::Https(url) | MediaSource::Http(url) if !self.allow_remote => {
                Err(AssetError::RemoteNotAllowed(url.clone()))
            }
            MediaSource::Http(url) if !self.allow_insecure_http => {
                Err(AssetError::InsecureNotAllowed(url.clone()))
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AssetLoaderConfig {
    pub capabilities: SourceCapabilities,
    pub max_source_bytes: u64,
    pub request_timeout: Duration,
    /// Maximum number of cached logos.
    pub max_cache_entries: u64,
    pub cache_ttl: Duration,
}

impl Default for AssetLoaderConfig {
    fn default() -> Self {
        Self {
            capabilities: SourceCapabilities::default(),
            max_source_bytes: 512 * 1024 * 1024,
            request_timeout: Duration::from_secs(30),
            max_cache_entries: 16,
            cache_ttl: Duration::from_secs(3600), // 1 hour
        }
    }
}

impl From<&SourcesConfig> for AssetLoaderConfig {
    fn from(config: &SourcesConfig) -> Self {
        Self {
            capabilities: SourceCapabilities {
                allow_remote: config.allow_remote,
                allow_insecure_http: config.allow_insecure_http,
            },
            max_source_bytes: config.max_source_bytes,
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            max_cache_entries: config.logo_cache_entries,
            cache_ttl: Duration::from_secs(config.logo_cache_ttl_secs),
        }
    }
}

/// Loader for source media and logos with a decoded-logo cache.
#[derive(Clone)]
pub struct AssetLoader {
    config: AssetLoaderConfig,
    http_client: reqwest::Client,
    logo_cache: Cache<MediaSource, Arc<RgbaImage>>,
}

impl AssetLoader {
    /// # Errors
    ///
    /// Returns `WatermarkError::Config` if the HTTP client cannot be created.
    pub fn new(config: AssetLoaderConfig) -> Result<Self, WatermarkError> {
        let logo_cache = Cache::builder()
            .max_capacity(config.max_cache_entries)
            .time_to_live(config.cache_ttl)
            .build();

        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| WatermarkError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
            logo_cache,
        })
    }

    pub fn capabilities(&self) -> SourceCapabilities {
        self.config.capabilities
    }

    /// Fetch the raw bytes of `source`.
    pub async fn load_bytes(&self, source: &MediaSource) -> Result<Bytes, AssetError> {
        self.config.capabilities.check(source)?;
        let limit = self.config.max_source_bytes;

        let data = match source {
            MediaSource::File(path) => self.read_file(path).await?,
            MediaSource::Https(url) | MediaSource::Http(url) => self.fetch_http(url).await?,
            MediaSource::DataUri(uri) => decode_data_uri(uri)?,
            MediaSource::Bytes { data, .. } => data.clone(),
        };

        if data.len() as u64 > limit {
            return Err(AssetError::TooLarge {
                size: data.len() as u64,
                limit,
            });
        }
        Ok(data)
    }

    async fn read_file(&self, path: &Path) -> Result<Bytes, AssetError> {
        let io_err = |source| AssetError::Io {
            path: path.display().to_string(),
            source,
        };
        let metadata = tokio::fs::metadata(path).await.map_err(io_err)?;
        if metadata.len() > self.config.max_source_bytes {
            return Err(AssetError::TooLarge {
                size: metadata.len(),
                limit: self.config.max_source_bytes,
            });
        }
        let data = tokio::fs::read(path).await.map_err(|source| AssetError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Bytes::from(data))
    }

    async fn fetch_http(&self, url: &str) -> Result<Bytes, AssetError> {
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| AssetError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AssetError::Status(response.status().as_u16()));
        }

        if let Some(size) = response.content_length() {
            if size > self.config.max_source_bytes {
                return Err(AssetError::TooLarge {
                    size,
                    limit: self.config.max_source_bytes,
                });
            }
        }

        response
            .bytes()
            .await
            .map_err(|e| AssetError::Http(format!("Failed to read HTTP body: {e}")))
    }

    /// Load and decode the brand logo. Cached by source, inline payloads
    /// by their content.
    pub async fn load_logo(&self, source: &MediaSource) -> Result<Arc<RgbaImage>, WatermarkError> {
        if let Some(cached) = self.logo_cache.get(source).await {
            return Ok(cached);
        }

        let data = self
            .load_bytes(source)
            .await
            .map_err(|e| WatermarkError::LogoLoad(e.to_string()))?;
        let hint = source.extension();
        let logo = decode_image(&data, hint.as_deref())
            .map_err(|e| WatermarkError::LogoLoad(e.to_string()))?
            .to_rgba8();
        if logo.width() == 0 || logo.height() == 0 {
            return Err(WatermarkError::LogoLoad("logo has no pixels".to_string()));
        }

        let logo = Arc::new(logo);
        self.logo_cache.insert(source.clone(), logo.clone()).await;
        Ok(logo)
    }

    /// Number of cached logos.
    pub fn cache_size(&self) -> u64 {
        self.logo_cache.entry_count()
    }

    pub async fn is_cached(&self, source: &MediaSource) -> bool {
        self.logo_cache.get(source).await.is_some()
    }

    pub async fn clear_cache(&self) {
        self.logo_cache.invalidate_all();
        self.logo_cache.run_pending_tasks().await;
    }
}

/// Decode `data:[<mime>][;base64],<payload>`. Only base64 payloads are accepted.
pub fn decode_data_uri(uri: &str) -> Result<Bytes, AssetError> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| AssetError::InvalidDataUri("missing data: prefix".to_string()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| AssetError::InvalidDataUri("missing ',' separator".to_string()))?;
    if !header.ends_with(";base64") {
        return Err(AssetError::InvalidDataUri(
            "only base64 payloads are supported".to_string(),
        ));
    }
    base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map(Bytes::from)
        .map_err(|e| AssetError::InvalidDataUri(e.to_string()))
}

/// Decode image bytes, sniffing the format and falling back to `extension`.
pub fn decode_image(data: &[u8], extension: Option<&str>) -> Result<DynamicImage, AssetError> {
    let format = detect_image_format(data, extension)?;
    image::load(Cursor::new(data), format).map_err(|e| AssetError::Decode(e.to_string()))
}

/// Detect image format from bytes or filename extension.
fn detect_image_format(data: &[u8], extension: Option<&str>) -> Result<ImageFormat, AssetError> {
    if let Ok(format) = image::guess_format(data) {
        return Ok(format);
    }

    let ext = extension.map(|s| s.to_lowercase()).unwrap_or_default();
    match ext.as_str() {
        "png" => Ok(ImageFormat::Png),
        "jpg" | "jpeg" => Ok(ImageFormat::Jpeg),
        "gif" => Ok(ImageFormat::Gif),
        "webp" => Ok(ImageFormat::WebP),
        _ => Err(AssetError::Decode(format!("Unsupported image format: '{ext}'"))),
    }
}
