// SPDX-License-Identifier: MPL-2.0
//! Viewable file records.
//!
//! A [`FileRecord`] is produced by a file-info source (folder listing or
//! single-file stat) and is treated as immutable once it sits in an open
//! list, except for its `source` which is filled in lazily by the media
//! source resolver.

mod list;

pub use list::FileList;

use crate::media::MediaType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable numeric identity of a file on the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(u64);

impl FileId {
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for FileId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Entry type reported by a folder listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    #[default]
    File,
    Directory,
}

/// Key used to locate a record inside a list.
///
/// Ad-hoc lists built by the host may lack ids, so lookups by full path
/// are accepted as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRef<'a> {
    Id(FileId),
    Name(&'a str),
}

impl fmt::Display for FileRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileRef::Id(id) => write!(f, "#{id}"),
            FileRef::Name(name) => f.write_str(name),
        }
    }
}

/// One permission hint attached to a share.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareAttribute {
    pub scope: String,
    pub key: String,
    /// Older servers send `enabled` instead of `value`.
    #[serde(alias = "enabled")]
    pub value: serde_json::Value,
}

/// Share permission hints, parsed once when the record is ingested.
///
/// Servers deliver the attributes either as a JSON string or as an already
/// decoded array. `RawJson` only survives ingestion when the string could not
/// be parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ShareAttributes {
    Parsed(Vec<ShareAttribute>),
    RawJson(String),
}

impl Default for ShareAttributes {
    fn default() -> Self {
        ShareAttributes::Parsed(Vec::new())
    }
}

impl ShareAttributes {
    /// Parses a raw attribute string, keeping it verbatim if it is not valid JSON.
    #[must_use]
    pub fn from_raw(raw: &str) -> Self {
        ShareAttributes::RawJson(raw.to_string()).resolved()
    }

    /// Turns a `RawJson` value into `Parsed` when possible.
    #[must_use]
    pub fn resolved(self) -> Self {
        match self {
            ShareAttributes::RawJson(raw) if raw.trim().is_empty() => {
                ShareAttributes::Parsed(Vec::new())
            }
            ShareAttributes::RawJson(raw) => {
                match serde_json::from_str::<Vec<ShareAttribute>>(&raw) {
                    Ok(parsed) => ShareAttributes::Parsed(parsed),
                    Err(err) => {
                        tracing::warn!("Unparseable share attributes kept raw: {err}");
                        ShareAttributes::RawJson(raw)
                    }
                }
            }
            parsed @ ShareAttributes::Parsed(_) => parsed,
        }
    }

    /// Whether the share allows downloading the file bytes.
    ///
    /// Attributes that could not be parsed are treated as restrictive.
    #[must_use]
    pub fn allows_download(&self) -> bool {
        match self {
            ShareAttributes::Parsed(attributes) => !attributes.iter().any(|attr| {
                attr.scope == "permissions"
                    && attr.key == "download"
                    && attr.value == serde_json::Value::Bool(false)
            }),
            ShareAttributes::RawJson(_) => false,
        }
    }
}

/// Metadata describing one viewable item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub fileid: FileId,
    /// Full path, unique within a list.
    pub filename: String,
    pub basename: String,
    pub mime: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub etag: Option<String>,
    #[serde(default)]
    pub has_preview: bool,
    /// Resolved byte-fetch URL, filled in lazily.
    #[serde(default)]
    pub source: Option<String>,
    /// Explicit override that always wins over computed sources.
    #[serde(default)]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default)]
    pub hide_download: bool,
    #[serde(default)]
    pub share_attributes: ShareAttributes,
    /// Id of the paired live-photo video, if any.
    #[serde(default)]
    pub metadata_files_live_photo: Option<FileId>,
    #[serde(default, rename = "type")]
    pub kind: FileKind,
}

impl FileRecord {
    /// Creates a plain file record; the basename is derived from `filename`.
    pub fn new(fileid: impl Into<FileId>, filename: impl Into<String>, mime: impl Into<String>) -> Self {
        let filename = filename.into();
        let basename = filename
            .rsplit('/')
            .find(|segment| !segment.is_empty())
            .unwrap_or_default()
            .to_string();
        Self {
            fileid: fileid.into(),
            filename,
            basename,
            mime: mime.into(),
            size: 0,
            etag: None,
            has_preview: false,
            source: None,
            preview_url: None,
            is_favorite: false,
            hide_download: false,
            share_attributes: ShareAttributes::default(),
            metadata_files_live_photo: None,
            kind: FileKind::File,
        }
    }

    #[must_use]
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    #[must_use]
    pub fn with_etag(mut self, etag: impl Into<String>) -> Self {
        self.etag = Some(etag.into());
        self
    }

    #[must_use]
    pub fn with_preview(mut self, has_preview: bool) -> Self {
        self.has_preview = has_preview;
        self
    }

    #[must_use]
    pub fn with_preview_url(mut self, url: impl Into<String>) -> Self {
        self.preview_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn with_share_attributes(mut self, attributes: ShareAttributes) -> Self {
        self.share_attributes = attributes.resolved();
        self
    }

    #[must_use]
    pub fn with_live_photo(mut self, video: FileId) -> Self {
        self.metadata_files_live_photo = Some(video);
        self
    }

    #[must_use]
    pub fn with_kind(mut self, kind: FileKind) -> Self {
        self.kind = kind;
        self
    }

    /// Finishes ingestion of a record decoded from a collaborator.
    #[must_use]
    pub fn ingested(mut self) -> Self {
        self.share_attributes = self.share_attributes.resolved();
        self
    }

    #[must_use]
    pub fn is_file(&self) -> bool {
        self.kind == FileKind::File
    }

    #[must_use]
    pub fn media_type(&self) -> MediaType {
        MediaType::from_mime(&self.mime)
    }

    #[must_use]
    pub fn can_download(&self) -> bool {
        self.share_attributes.allows_download()
    }

    #[must_use]
    pub fn matches(&self, key: FileRef<'_>) -> bool {
        match key {
            FileRef::Id(id) => self.fileid == id,
            FileRef::Name(name) => self.filename == name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_derives_basename_from_path() {
        let record = FileRecord::new(7, "/photos/2024/beach.jpg", "image/jpeg");
        assert_eq!(record.basename, "beach.jpg");
        assert_eq!(record.fileid, FileId::new(7));
        assert!(record.is_file());
    }

    #[test]
    fn basename_ignores_trailing_slash() {
        let record = FileRecord::new(1, "/photos/", "httpd/unix-directory");
        assert_eq!(record.basename, "photos");
    }

    #[test]
    fn raw_share_attributes_are_parsed_once() {
        let raw = r#"[{"scope":"permissions","key":"download","value":false}]"#;
        let attributes = ShareAttributes::from_raw(raw);
        assert!(matches!(attributes, ShareAttributes::Parsed(ref list) if list.len() == 1));
        assert!(!attributes.allows_download());
    }

    #[test]
    fn legacy_enabled_field_is_accepted() {
        let raw = r#"[{"scope":"permissions","key":"download","enabled":false}]"#;
        assert!(!ShareAttributes::from_raw(raw).allows_download());
    }

    #[test]
    fn unrelated_attributes_allow_download() {
        let raw = r#"[{"scope":"permissions","key":"download","value":true},{"scope":"other","key":"x","value":false}]"#;
        assert!(ShareAttributes::from_raw(raw).allows_download());
        assert!(ShareAttributes::default().allows_download());
    }

    #[test]
    fn invalid_raw_attributes_stay_raw_and_restrict() {
        let attributes = ShareAttributes::from_raw("{not json");
        assert!(matches!(attributes, ShareAttributes::RawJson(_)));
        assert!(!attributes.allows_download());
    }

    #[test]
    fn record_deserializes_from_camel_case_json() {
        let json = r#"{
            "fileid": 42,
            "filename": "/a/clip.mkv",
            "basename": "clip.mkv",
            "mime": "video/x-matroska",
            "size": 1024,
            "hasPreview": true,
            "shareAttributes": "[{\"scope\":\"permissions\",\"key\":\"download\",\"value\":false}]",
            "metadataFilesLivePhoto": 43
        }"#;
        let record: FileRecord = serde_json::from_str(json).expect("valid record");
        let record = record.ingested();
        assert_eq!(record.fileid, FileId::new(42));
        assert!(record.has_preview);
        assert_eq!(record.media_type(), MediaType::Video);
        assert!(record.media_type().is_streamed());
        assert!(!record.can_download());
        assert_eq!(record.metadata_files_live_photo, Some(FileId::new(43)));
        assert_eq!(record.kind, FileKind::File);
    }

    #[test]
    fn matches_by_id_or_name() {
        let record = FileRecord::new(3, "/x/y.png", "image/png");
        assert!(record.matches(FileRef::Id(FileId::new(3))));
        assert!(record.matches(FileRef::Name("/x/y.png")));
        assert!(!record.matches(FileRef::Name("y.png")));
    }
}
