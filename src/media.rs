//! Media references and the local media cache
//!
//! Images and videos are passed around as URI strings. Uploads become
//! `data:` URLs; anything the generation service produces is written into
//! the media cache and referenced with a `file://` URI.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::Engine;
use thiserror::Error;

const FILE_SCHEME: &str = "file://";
const DATA_SCHEME: &str = "data:";

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Malformed data URL")]
    MalformedDataUrl,

    #[error("Unsupported media reference: {0}")]
    UnsupportedUri(String),

    #[error("{0} is not a supported image")]
    NotAnImage(String),
}

/// Bytes of a resolved media reference
#[derive(Debug, Clone)]
pub struct MediaBlob {
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// Opaque URI pointing at an image (data URL or cached file)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef(String);

/// Where the bytes of a reference live
pub enum MediaSource<'a> {
    Inline { mime_type: &'a str, payload: &'a str },
    File(PathBuf),
}

impl ImageRef {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    /// Build a `data:` URL holding `data`
    pub fn from_bytes(mime_type: &str, data: &[u8]) -> Self {
        let payload = base64::engine::general_purpose::STANDARD.encode(data);
        Self(format!("{DATA_SCHEME}{mime_type};base64,{payload}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn source(&self) -> Result<MediaSource<'_>, MediaError> {
        if let Some(rest) = self.0.strip_prefix(DATA_SCHEME) {
            let (header, payload) = rest.split_once(',').ok_or(MediaError::MalformedDataUrl)?;
            let mime_type = header
                .strip_suffix(";base64")
                .ok_or(MediaError::MalformedDataUrl)?;
            return Ok(MediaSource::Inline { mime_type, payload });
        }

        if let Some(path) = self.0.strip_prefix(FILE_SCHEME) {
            return Ok(MediaSource::File(PathBuf::from(path)));
        }

        Err(MediaError::UnsupportedUri(self.0.clone()))
    }

    /// Resolve the reference to raw bytes and a MIME type
    pub async fn load(&self) -> Result<MediaBlob, MediaError> {
        match self.source()? {
            MediaSource::Inline { mime_type, payload } => Ok(MediaBlob {
                mime_type: mime_type.to_string(),
                data: base64::engine::general_purpose::STANDARD.decode(payload)?,
            }),
            MediaSource::File(path) => {
                let data = tokio::fs::read(&path).await?;
                let mime_type = sniff_mime(&data, &path)
                    .unwrap_or("application/octet-stream")
                    .to_string();
                Ok(MediaBlob { mime_type, data })
            }
        }
    }
}

/// An image the user picked from disk
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub name: String,
    pub mime_type: String,
    pub data: Arc<Vec<u8>>,
}

impl UploadedImage {
    /// Read and validate an image file picked by the user
    pub async fn load(path: PathBuf) -> Result<Self, MediaError> {
        let data = tokio::fs::read(&path).await?;
        let name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();

        let mime_type = sniff_mime(&data, &path)
            .filter(|mime| mime.starts_with("image/"))
            .ok_or_else(|| MediaError::NotAnImage(name.clone()))?
            .to_string();

        tracing::debug!("Loaded upload {} ({}, {} bytes)", name, mime_type, data.len());

        Ok(Self {
            name,
            mime_type,
            data: Arc::new(data),
        })
    }

    pub fn to_image_ref(&self) -> ImageRef {
        ImageRef::from_bytes(&self.mime_type, &self.data)
    }
}

/// Directory where generated media is written
#[derive(Debug, Clone, PartialEq)]
pub struct MediaStore {
    dir: PathBuf,
}

impl MediaStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// `~/.cache/character-studio/media` on Linux
    pub fn default_dir() -> Option<PathBuf> {
        let mut path = dirs::cache_dir().or_else(dirs::home_dir)?;
        path.push("character-studio");
        path.push("media");
        Some(path)
    }

    /// Write generated media under a fresh name and return its `file://` URI
    pub async fn save(&self, data: &[u8], mime_type: &str) -> Result<String, MediaError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let file_name = format!("{}.{}", uuid::Uuid::new_v4(), extension_for(mime_type));
        let path = self.dir.join(file_name);
        tokio::fs::write(&path, data).await?;

        tracing::info!("💾 Saved generated media: {}", path.display());
        Ok(file_uri(&path))
    }
}

/// Local path of a `file://` URI, if it is one
pub fn path_from_uri(uri: &str) -> Option<PathBuf> {
    uri.strip_prefix(FILE_SCHEME).map(PathBuf::from)
}

fn file_uri(path: &Path) -> String {
    format!("{FILE_SCHEME}{}", path.display())
}

fn sniff_mime(data: &[u8], path: &Path) -> Option<&'static str> {
    image::guess_format(data)
        .or_else(|_| image::ImageFormat::from_path(path))
        .map(|format| format.to_mime_type())
        .ok()
        .or_else(|| {
            let ext = path.extension()?.to_string_lossy().to_lowercase();
            (ext == "mp4").then_some("video/mp4")
        })
}

fn extension_for(mime_type: &str) -> &'static str {
    match mime_type {
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        "image/gif" => "gif",
        "video/mp4" => "mp4",
        _ => "bin",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    #[tokio::test]
    async fn test_data_url_round_trip() {
        let image = ImageRef::from_bytes("image/png", &PNG_MAGIC);
        assert!(image.as_str().starts_with("data:image/png;base64,"));

        let blob = image.load().await.unwrap();
        assert_eq!(blob.mime_type, "image/png");
        assert_eq!(blob.data, PNG_MAGIC);
    }

    #[test]
    fn test_malformed_references() {
        assert!(matches!(
            ImageRef::new("data:image/png,abc").source(),
            Err(MediaError::MalformedDataUrl)
        ));
        assert!(matches!(
            ImageRef::new("https://example.com/a.png").source(),
            Err(MediaError::UnsupportedUri(_))
        ));
    }

    #[tokio::test]
    async fn test_upload_sniffs_content_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("portrait.dat");
        std::fs::write(&path, PNG_MAGIC).unwrap();

        let upload = UploadedImage::load(path).await.unwrap();
        assert_eq!(upload.name, "portrait.dat");
        assert_eq!(upload.mime_type, "image/png");
    }

    #[tokio::test]
    async fn test_upload_rejects_non_images() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"just text").unwrap();

        let err = UploadedImage::load(path).await.unwrap_err();
        assert!(matches!(err, MediaError::NotAnImage(name) if name == "notes.txt"));
    }

    #[tokio::test]
    async fn test_store_writes_file_uri() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path().join("media"));

        let uri = store.save(&PNG_MAGIC, "image/png").await.unwrap();
        let path = path_from_uri(&uri).unwrap();

        assert_eq!(path.extension().unwrap(), "png");
        assert_eq!(std::fs::read(&path).unwrap(), PNG_MAGIC);

        let blob = ImageRef::new(uri).load().await.unwrap();
        assert_eq!(blob.mime_type, "image/png");
    }
}
