use std::fmt;
use std::path::Path;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Largest artifact accepted for checking (10 MiB).
pub const MAX_ARTIFACT_BYTES: u64 = 10 * 1024 * 1024;

/// Media types the extraction service understands.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Jpeg,
    Png,
    Pdf,
}

impl MediaType {
    pub const ALL: [MediaType; 3] = [MediaType::Jpeg, MediaType::Png, MediaType::Pdf];

    /// Parse a declared MIME type. Parameters (`; charset=...`) and case are ignored.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        match essence.as_str() {
            "image/jpeg" => Some(MediaType::Jpeg),
            "image/png" => Some(MediaType::Png),
            "application/pdf" => Some(MediaType::Pdf),
            _ => None,
        }
    }

    /// Detect by file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "jpg" | "jpeg" => Some(MediaType::Jpeg),
            "png" => Some(MediaType::Png),
            "pdf" => Some(MediaType::Pdf),
            _ => None,
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            MediaType::Jpeg => "image/jpeg",
            MediaType::Png => "image/png",
            MediaType::Pdf => "application/pdf",
        }
    }

    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            MediaType::Jpeg => &[".jpg", ".jpeg"],
            MediaType::Png => &[".png"],
            MediaType::Pdf => &[".pdf"],
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, MediaType::Jpeg | MediaType::Png)
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

/// A file candidate selected by the user.
///
/// `media_type` is whatever the selection source declared; it is only
/// trusted after intake validation.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub name: String,
    pub media_type: String,
    pub data: Bytes,
}

impl Artifact {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            data: data.into(),
        }
    }

    /// Build from a local path, declaring the media type from its extension.
    /// Unknown extensions are declared as `application/octet-stream`.
    pub fn from_file(path: &Path, data: impl Into<Bytes>) -> Self {
        let media_type = declared_media_type(path);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Self::new(name, media_type, data)
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// The media type a local file declares through its extension.
pub fn declared_media_type(path: &Path) -> &'static str {
    MediaType::from_path(path)
        .map(|m| m.mime())
        .unwrap_or("application/octet-stream")
}

/// Human-readable byte size (`2.5 MB`).
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_from_mime() {
        assert_eq!(MediaType::from_mime("image/jpeg"), Some(MediaType::Jpeg));
        assert_eq!(MediaType::from_mime("Application/PDF"), Some(MediaType::Pdf));
        assert_eq!(MediaType::from_mime("image/png; q=1"), Some(MediaType::Png));
        assert_eq!(MediaType::from_mime("image/webp"), None);
        assert_eq!(MediaType::from_mime(""), None);
    }

    #[test]
    fn test_from_path() {
        assert_eq!(MediaType::from_path(&PathBuf::from("label.JPG")), Some(MediaType::Jpeg));
        assert_eq!(MediaType::from_path(&PathBuf::from("scan.pdf")), Some(MediaType::Pdf));
        assert_eq!(MediaType::from_path(&PathBuf::from("label.gif")), None);
        assert_eq!(MediaType::from_path(&PathBuf::from("README")), None);
    }

    #[test]
    fn test_artifact_from_file() {
        let artifact = Artifact::from_file(&PathBuf::from("/tmp/front.png"), vec![0u8; 16]);
        assert_eq!(artifact.name, "front.png");
        assert_eq!(artifact.media_type, "image/png");
        assert_eq!(artifact.size(), 16);

        let unknown = Artifact::from_file(&PathBuf::from("notes.txt"), Vec::new());
        assert_eq!(unknown.media_type, "application/octet-stream");
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(2 * 1024 * 1024), "2 MB");
        assert_eq!(format_file_size(1536), "1.5 KB");
    }
}
