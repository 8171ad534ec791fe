//! Binary, image and large-file classification.
//!
//! Pure functions over paths and content samples; the only I/O here is the
//! metadata stat in [`check_large`], which never reads file bodies.

use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Files larger than this are delivered partially by default (1 MiB)
pub const LARGE_FILE_THRESHOLD: u64 = 1_048_576;

/// How much of a large file consumers should request by default (10 KiB).
/// Truncation itself happens at the content-resolution layer, not here.
pub const PARTIAL_CONTENT_LIMIT: u64 = 10_240;

/// Content detection looks at no more than this many leading bytes (8 KiB)
pub const BINARY_SAMPLE_LEN: usize = 8_192;

/// Extensions treated as binary without looking at content.
///
/// Images, archives, fonts, audio/video and executables. Anything not
/// listed here falls back to content sampling.
const BINARY_EXTENSIONS: &[&str] = &[
    // images
    "png", "jpg", "jpeg", "gif", "svg", "webp", "ico", "bmp", "tiff", "avif",
    // archives
    "zip", "tar", "gz", "tgz", "bz2", "xz", "7z", "rar", "jar",
    // fonts
    "ttf", "otf", "woff", "woff2", "eot",
    // audio / video
    "mp3", "wav", "ogg", "flac", "m4a", "mp4", "mov", "avi", "mkv", "webm",
    // executables and compiled artifacts
    "exe", "dll", "so", "dylib", "a", "o", "bin", "wasm", "class", "pyc",
    // opaque documents and databases
    "pdf", "sqlite", "db",
];

/// Strict subset of [`BINARY_EXTENSIONS`] that can be previewed as an image
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "svg", "webp", "ico", "bmp"];

/// Combined classification of a path (and optionally its content)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub is_binary: bool,
    pub is_image: bool,
    pub extension: Option<String>,
    pub mime_type: Option<&'static str>,
}

/// Large-file check result; `threshold` is always [`LARGE_FILE_THRESHOLD`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LargeFileInfo {
    pub is_large: bool,
    pub size: u64,
    pub threshold: u64,
}

fn extension_of(path: &str) -> Option<String> {
    Path::new(path)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
}

/// Whether the path's extension marks it as binary
pub fn is_binary_extension(path: &str) -> bool {
    extension_of(path).is_some_and(|ext| BINARY_EXTENSIONS.contains(&ext.as_str()))
}

/// Whether the path's extension marks it as a previewable image
pub fn is_image_extension(path: &str) -> bool {
    extension_of(path).is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

/// Scan a content sample for binary markers.
///
/// A NUL byte, or more than 10% non-printable control bytes (tab, LF and
/// CR excluded), means binary. Only the first [`BINARY_SAMPLE_LEN`] bytes
/// are considered.
pub fn detect_binary_content(sample: &[u8]) -> bool {
    let sample = &sample[..sample.len().min(BINARY_SAMPLE_LEN)];
    if sample.is_empty() {
        return false;
    }
    if sample.contains(&0) {
        return true;
    }

    let control = sample
        .iter()
        .filter(|&&b| b < 0x20 && b != b'\t' && b != b'\n' && b != b'\r')
        .count();
    control * 10 > sample.len()
}

fn mime_type_for(ext: &str) -> Option<&'static str> {
    Some(match ext {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        "bmp" => "image/bmp",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        _ => return None,
    })
}

/// Classify a path, optionally refined by a content sample.
///
/// An extension match decides binary on its own; without a match the
/// content sample (when supplied) has the final word.
pub fn classify(path: &str, content: Option<&[u8]>) -> Classification {
    let extension = extension_of(path);
    let by_extension = is_binary_extension(path);
    let is_binary = by_extension || content.is_some_and(detect_binary_content);

    Classification {
        is_binary,
        is_image: is_image_extension(path),
        mime_type: extension.as_deref().and_then(mime_type_for),
        extension,
    }
}

/// Stat `path` (relative to `project_root`) against the large-file threshold
pub fn check_large(path: &str, project_root: &Path) -> io::Result<LargeFileInfo> {
    let size = std::fs::metadata(project_root.join(path))?.len();
    Ok(LargeFileInfo {
        is_large: size > LARGE_FILE_THRESHOLD,
        size,
        threshold: LARGE_FILE_THRESHOLD,
    })
}
