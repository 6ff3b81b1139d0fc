use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Extensions the forensics service accepts.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "tif", "tiff", "bmp", "gif"];

/// MIME type sent for files whose extension is not recognised.
const FALLBACK_MIME: &str = "application/octet-stream";

/// An image to upload: raw bytes plus the filename reported in the multipart part.
///
/// The client never inspects `bytes`; decoding and analysis happen on the server.
///
/// # Example
///
/// ```rust
/// use image_forensics::image::ImageInput;
///
/// let input = ImageInput::new("holiday.png", vec![0x89, b'P', b'N', b'G']);
/// assert_eq!(input.mime_type, "image/png");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInput {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl ImageInput {
    /// Wrap in-memory bytes, guessing the MIME type from `filename`.
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        let filename = filename.into();
        let mime_type = mime_type_for(Path::new(&filename)).to_string();
        Self {
            filename,
            bytes,
            mime_type,
        }
    }

    /// Override the guessed MIME type.
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    /// Read an image from disk. The filename is the final path component.
    pub async fn from_path(path: &Path) -> Result<Self> {
        let is_file = tokio::fs::metadata(path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if !is_file {
            anyhow::bail!("File not found: {}", path.display());
        }
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(filename, bytes))
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// MIME type for an image path, by extension.
pub fn mime_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "tif" | "tiff" => "image/tiff",
        "bmp" => "image/bmp",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => FALLBACK_MIME,
    }
}

/// Collect uploadable image files from the given paths.
///
/// Accepts a mix of file paths and directory paths. Directories are walked
/// recursively (following symlinks) and yield only files with an extension the
/// service accepts. Explicit file paths with another extension, and paths that
/// do not exist, are skipped with a warning.
///
/// # Example
///
/// ```rust,no_run
/// use image_forensics::image::collect_images;
/// use std::path::PathBuf;
///
/// let images = collect_images(&[
///     PathBuf::from("evidence.jpg"),  // single file
///     PathBuf::from("./case-042/"),   // entire directory
/// ]);
/// println!("Found {} images", images.len());
/// ```
pub fn collect_images(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut images = Vec::new();

    for path in paths {
        if path.is_file() {
            if is_supported_image(path) {
                images.push(path.clone());
            } else {
                log::warn!("Skipping unsupported file: {}", path.display());
            }
        } else if path.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(path)
                .follow_links(true)
                .into_iter()
                .filter_map(|e| e.ok())
                .map(|e| e.into_path())
                .filter(|p| p.is_file() && is_supported_image(p))
                .collect();
            // walkdir order depends on the filesystem; keep batches reproducible
            found.sort();
            images.extend(found);
        } else {
            log::warn!("Path does not exist: {}", path.display());
        }
    }

    images
}

/// Check if a file has an extension the service accepts.
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    // ── mime_type_for ────────────────────────────────────────────────

    #[test]
    fn mime_type_known_extensions() {
        assert_eq!(mime_type_for(Path::new("a.jpg")), "image/jpeg");
        assert_eq!(mime_type_for(Path::new("a.JPEG")), "image/jpeg");
        assert_eq!(mime_type_for(Path::new("a.png")), "image/png");
        assert_eq!(mime_type_for(Path::new("a.tif")), "image/tiff");
        assert_eq!(mime_type_for(Path::new("a.tiff")), "image/tiff");
        assert_eq!(mime_type_for(Path::new("a.bmp")), "image/bmp");
        assert_eq!(mime_type_for(Path::new("a.gif")), "image/gif");
    }

    #[test]
    fn mime_type_fallback() {
        assert_eq!(mime_type_for(Path::new("noext")), FALLBACK_MIME);
        assert_eq!(mime_type_for(Path::new("scan.pdf")), FALLBACK_MIME);
    }

    // ── ImageInput ───────────────────────────────────────────────────

    #[test]
    fn new_guesses_mime() {
        let input = ImageInput::new("x.gif", vec![1, 2, 3]);
        assert_eq!(input.filename, "x.gif");
        assert_eq!(input.mime_type, "image/gif");
        assert_eq!(input.len(), 3);
        assert!(!input.is_empty());
    }

    #[test]
    fn with_mime_type_overrides() {
        let input = ImageInput::new("blob", Vec::new()).with_mime_type("image/jpeg");
        assert_eq!(input.mime_type, "image/jpeg");
        assert!(input.is_empty());
    }

    #[tokio::test]
    async fn from_path_reads_bytes_and_name() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("photo.jpg");
        fs::write(&path, b"\xff\xd8\xff").unwrap();

        let input = ImageInput::from_path(&path).await.unwrap();
        assert_eq!(input.filename, "photo.jpg");
        assert_eq!(input.bytes, b"\xff\xd8\xff");
        assert_eq!(input.mime_type, "image/jpeg");
    }

    #[tokio::test]
    async fn from_path_missing_file() {
        let err = ImageInput::from_path(Path::new("/nonexistent/x.jpg"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "File not found: /nonexistent/x.jpg");
    }

    // ── is_supported_image ───────────────────────────────────────────

    #[test]
    fn supported_extensions() {
        for name in ["a.jpg", "a.JPG", "a.jpeg", "a.png", "a.tif", "a.tiff", "a.bmp", "a.gif"] {
            assert!(is_supported_image(Path::new(name)), "{name} should be supported");
        }
    }

    #[test]
    fn unsupported_extensions() {
        assert!(!is_supported_image(Path::new("doc.pdf")));
        assert!(!is_supported_image(Path::new("photo.heic")));
        assert!(!is_supported_image(Path::new("noext")));
    }

    // ── collect_images ───────────────────────────────────────────────

    #[test]
    fn collect_images_single_file() {
        let dir = TempDir::new().unwrap();
        let jpg = dir.path().join("test.jpg");
        fs::write(&jpg, b"fake").unwrap();

        let images = collect_images(&[jpg.clone()]);
        assert_eq!(images, vec![jpg]);
    }

    #[test]
    fn collect_images_skips_unsupported() {
        let dir = TempDir::new().unwrap();
        let txt = dir.path().join("readme.txt");
        fs::write(&txt, b"hello").unwrap();

        assert!(collect_images(&[txt]).is_empty());
    }

    #[test]
    fn collect_images_directory_recursive_and_sorted() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();

        fs::write(dir.path().join("b.jpg"), b"fake").unwrap();
        fs::write(dir.path().join("a.png"), b"fake").unwrap();
        fs::write(sub.join("c.gif"), b"fake").unwrap();
        fs::write(sub.join("d.txt"), b"fake").unwrap();

        let images = collect_images(&[dir.path().to_path_buf()]);
        assert_eq!(images.len(), 3);
        let mut sorted = images.clone();
        sorted.sort();
        assert_eq!(images, sorted);
    }

    #[test]
    fn collect_images_nonexistent_path() {
        assert!(collect_images(&[PathBuf::from("/nonexistent/path")]).is_empty());
    }

    #[test]
    fn collect_images_keeps_argument_order() {
        let dir = TempDir::new().unwrap();
        let first = dir.path().join("z.jpg");
        let second = dir.path().join("a.jpg");
        fs::write(&first, b"fake").unwrap();
        fs::write(&second, b"fake").unwrap();

        let images = collect_images(&[first.clone(), second.clone()]);
        assert_eq!(images, vec![first, second]);
    }
}
