// SPDX-License-Identifier: MPL-2.0
//! Supported media extensions and their mime types.

use std::path::Path;

/// Image file extensions
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "tiff", "tif", "webp", "bmp", "ico", "svg", "heic", "heif", "avif",
];

/// Video file extensions
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "m4v", "avi", "mov", "mkv", "webm"];

/// Audio file extensions
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "ogg", "oga", "wav", "flac", "m4a", "opus"];

/// Mime type reported for anything the table does not know.
pub const FALLBACK_MIME: &str = "application/octet-stream";

const MIME_TABLE: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("tiff", "image/tiff"),
    ("tif", "image/tiff"),
    ("webp", "image/webp"),
    ("bmp", "image/bmp"),
    ("ico", "image/x-icon"),
    ("svg", "image/svg+xml"),
    ("heic", "image/heic"),
    ("heif", "image/heif"),
    ("avif", "image/avif"),
    ("mp4", "video/mp4"),
    ("m4v", "video/mp4"),
    ("avi", "video/x-msvideo"),
    ("mov", "video/quicktime"),
    ("mkv", "video/x-matroska"),
    ("webm", "video/webm"),
    ("mp3", "audio/mpeg"),
    ("ogg", "audio/ogg"),
    ("oga", "audio/ogg"),
    ("wav", "audio/x-wav"),
    ("flac", "audio/x-flac"),
    ("m4a", "audio/mp4"),
    ("opus", "audio/opus"),
    ("pdf", "application/pdf"),
    ("txt", "text/plain"),
    ("md", "text/markdown"),
];

/// Mime type for a file extension (case-insensitive, without the dot).
#[must_use]
pub fn mime_for_extension(ext: &str) -> Option<&'static str> {
    let ext = ext.to_ascii_lowercase();
    MIME_TABLE
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, mime)| *mime)
}

/// Mime type for a path, falling back to [`FALLBACK_MIME`].
#[must_use]
pub fn mime_for_path<P: AsRef<Path>>(path: P) -> &'static str {
    path.as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .and_then(mime_for_extension)
        .unwrap_or(FALLBACK_MIME)
}

/// All supported media extensions (images + videos + audio)
#[must_use]
pub fn all_supported_extensions() -> Vec<&'static str> {
    IMAGE_EXTENSIONS
        .iter()
        .chain(VIDEO_EXTENSIONS.iter())
        .chain(AUDIO_EXTENSIONS.iter())
        .copied()
        .collect()
}
