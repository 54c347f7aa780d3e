// SPDX-License-Identifier: MPL-2.0
//! Stock handlers shipped with the viewer.
//!
//! Hosts that mount their own renderers can skip these entirely; the ids
//! below are what [`register_builtin`] adds.

use crate::application::registry::{HandlerRegistry, Registration};
use crate::domain::handler::{Handler, WILDCARD_MIME};
use crate::error::ValidationError;

pub const IMAGES_ID: &str = "images";
pub const VIDEOS_ID: &str = "videos";
pub const AUDIOS_ID: &str = "audios";
pub const GENERIC_ID: &str = "generic";

/// Group shared by the image, video and audio handlers.
pub const MEDIA_GROUP: &str = "media";

const IMAGE_MIMES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/bmp",
    "image/tiff",
    "image/svg+xml",
    "image/x-icon",
    "image/heic",
    "image/heif",
    "image/avif",
];

const VIDEO_MIMES: &[&str] = &[
    "video/mp4",
    "video/webm",
    "video/ogg",
    "video/quicktime",
    "video/x-msvideo",
];

const AUDIO_MIMES: &[&str] = &[
    "audio/mpeg",
    "audio/ogg",
    "audio/wav",
    "audio/flac",
    "audio/mp4",
    "audio/opus",
    "audio/webm",
];

#[must_use]
pub fn images() -> Handler {
    Handler::new(IMAGES_ID, "Images", "viewer-images")
        .with_group(MEDIA_GROUP)
        .with_mimes(IMAGE_MIMES.iter().copied())
        .with_alias("image/pjpeg", "image/jpeg")
}

#[must_use]
pub fn videos() -> Handler {
    Handler::new(VIDEOS_ID, "Videos", "viewer-videos")
        .with_group(MEDIA_GROUP)
        .with_mimes(VIDEO_MIMES.iter().copied())
        .with_alias("video/x-m4v", "video/mp4")
}

#[must_use]
pub fn audios() -> Handler {
    Handler::new(AUDIOS_ID, "Audio", "viewer-audios")
        .with_group(MEDIA_GROUP)
        .with_mimes(AUDIO_MIMES.iter().copied())
        .with_alias("audio/mp3", "audio/mpeg")
}

/// Fallback for anything the specific handlers cannot show.
#[must_use]
pub fn generic() -> Handler {
    Handler::new(GENERIC_ID, "File", "viewer-generic").with_mimes([WILDCARD_MIME])
}

/// Registers the stock handlers, the generic fallback last.
///
/// # Errors
///
/// Only fails if a stock descriptor is malformed.
pub fn register_builtin(registry: &HandlerRegistry) -> Result<Vec<Registration>, ValidationError> {
    [images(), videos(), audios(), generic()]
        .into_iter()
        .map(|handler| registry.register(handler))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::mime::MimeResolver;
    use crate::domain::file::FileRecord;

    #[test]
    fn stock_handlers_are_valid() {
        for handler in [images(), videos(), audios(), generic()] {
            assert!(handler.validate().is_ok(), "{} should validate", handler.id);
        }
    }

    #[test]
    fn registering_twice_is_a_no_op() {
        let registry = HandlerRegistry::new();
        let first = register_builtin(&registry).expect("register");
        assert!(first.iter().all(|r| *r == Registration::Added));
        let second = register_builtin(&registry).expect("register");
        assert!(second.iter().all(|r| *r == Registration::AlreadyRegistered));
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn stock_mimes_resolve_to_expected_handlers() {
        let registry = HandlerRegistry::new();
        register_builtin(&registry).expect("register");
        let aliases = registry.alias_table();
        let handlers = registry.handlers();

        let cases = [
            ("image/jpeg", Some(IMAGES_ID)),
            ("image/jpg", Some(IMAGES_ID)),
            ("video/x-matroska", Some(VIDEOS_ID)),
            ("video/x-m4v", Some(VIDEOS_ID)),
            ("audio/x-flac", Some(AUDIOS_ID)),
            ("audio/mp3", Some(AUDIOS_ID)),
            ("application/pdf", None),
        ];
        for (mime, expected) in cases {
            assert_eq!(
                MimeResolver::resolve(mime, &aliases, &handlers).as_deref(),
                expected,
                "{mime}"
            );
        }
    }

    #[test]
    fn generic_enables_any_file() {
        let files = [FileRecord::new(1, "/notes.txt", "text/plain")];
        assert!(generic().is_enabled(&files));
        assert!(!images().is_enabled(&files));
    }
}
