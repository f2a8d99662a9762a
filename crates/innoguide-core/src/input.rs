//! Problem text and the optional attached image.

use std::path::Path;

use base64::{engine::general_purpose, Engine as _};

use crate::error::InputError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageMime {
    Png,
    Jpeg,
    Webp,
}

impl ImageMime {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageMime::Png => "image/png",
            ImageMime::Jpeg => "image/jpeg",
            ImageMime::Webp => "image/webp",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(ImageMime::Png),
            "jpg" | "jpeg" => Some(ImageMime::Jpeg),
            "webp" => Some(ImageMime::Webp),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    pub name: String,
    pub mime: ImageMime,
    pub bytes: Vec<u8>,
}

impl UploadedImage {
    pub fn new(name: impl Into<String>, mime: ImageMime, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime,
            bytes,
        }
    }

    /// Load a png, jpeg or webp file. The type is decided by extension.
    pub async fn from_path(path: &Path) -> Result<Self, InputError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        let mime = ImageMime::from_extension(ext)
            .ok_or_else(|| InputError::UnsupportedImageType(ext.to_string()))?;

        let bytes = tokio::fs::read(path).await.map_err(|source| InputError::Read {
            path: path.display().to_string(),
            source,
        })?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self::new(name, mime, bytes))
    }

    pub fn to_base64(&self) -> String {
        general_purpose::STANDARD.encode(&self.bytes)
    }
}

/// Handle to the preview of the image that was attached when it was taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewRef {
    pub token: u64,
    pub name: String,
    pub size: usize,
}

#[derive(Debug, Default)]
pub struct InputCollector {
    problem_text: String,
    image: Option<UploadedImage>,
    preview_token: u64,
}

impl InputCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_problem_text(&mut self, text: impl Into<String>) {
        self.problem_text = text.into();
    }

    /// Replacing or clearing the image invalidates earlier previews.
    pub fn set_image(&mut self, image: Option<UploadedImage>) {
        self.image = image;
        self.preview_token += 1;
    }

    pub fn problem_text(&self) -> &str {
        &self.problem_text
    }

    pub fn problem_text_mut(&mut self) -> &mut String {
        &mut self.problem_text
    }

    pub fn image(&self) -> Option<&UploadedImage> {
        self.image.as_ref()
    }

    pub fn preview(&self) -> Option<PreviewRef> {
        self.image.as_ref().map(|image| PreviewRef {
            token: self.preview_token,
            name: image.name.clone(),
            size: image.bytes.len(),
        })
    }

    pub fn is_preview_current(&self, preview: &PreviewRef) -> bool {
        self.image.is_some() && preview.token == self.preview_token
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample(name: &str) -> UploadedImage {
        UploadedImage::new(name, ImageMime::Png, vec![0x89, b'P', b'N', b'G'])
    }

    #[test]
    fn test_replacing_image_invalidates_preview() {
        let mut input = InputCollector::new();
        input.set_image(Some(sample("a.png")));
        let first = input.preview().unwrap();
        assert!(input.is_preview_current(&first));

        input.set_image(Some(sample("b.png")));
        assert!(!input.is_preview_current(&first));
        let second = input.preview().unwrap();
        assert_eq!(second.name, "b.png");
        assert!(input.is_preview_current(&second));
    }

    #[test]
    fn test_clearing_image_invalidates_preview() {
        let mut input = InputCollector::new();
        input.set_image(Some(sample("a.png")));
        let preview = input.preview().unwrap();

        input.set_image(None);
        assert!(input.preview().is_none());
        assert!(!input.is_preview_current(&preview));
    }

    #[test]
    fn test_problem_text_is_stored_verbatim() {
        let mut input = InputCollector::new();
        input.set_problem_text("  keep spaces  ");
        assert_eq!(input.problem_text(), "  keep spaces  ");
    }

    #[test]
    fn test_mime_from_extension() {
        assert_eq!(ImageMime::from_extension("PNG"), Some(ImageMime::Png));
        assert_eq!(ImageMime::from_extension("jpg"), Some(ImageMime::Jpeg));
        assert_eq!(ImageMime::from_extension("webp"), Some(ImageMime::Webp));
        assert_eq!(ImageMime::from_extension("gif"), None);
    }

    #[test]
    fn test_to_base64() {
        let image = UploadedImage::new("x.png", ImageMime::Png, b"hello".to_vec());
        assert_eq!(image.to_base64(), "aGVsbG8=");
    }

    #[tokio::test]
    async fn test_from_path_reads_supported_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sketch.jpeg");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"jpegdata").unwrap();

        let image = UploadedImage::from_path(&path).await.unwrap();
        assert_eq!(image.name, "sketch.jpeg");
        assert_eq!(image.mime, ImageMime::Jpeg);
        assert_eq!(image.bytes, b"jpegdata");
    }

    #[tokio::test]
    async fn test_from_path_rejects_unsupported_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("anim.gif");
        std::fs::write(&path, b"GIF89a").unwrap();

        let err = UploadedImage::from_path(&path).await.unwrap_err();
        assert!(matches!(err, InputError::UnsupportedImageType(ext) if ext == "gif"));
    }
}
