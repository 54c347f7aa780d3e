// SPDX-License-Identifier: MPL-2.0
//! File-info source over a local directory tree.
//!
//! Viewer paths are absolute inside the tree (`/Photos/a.jpg` maps to
//! `<root>/Photos/a.jpg`). Ids are derived from the relative path so they
//! stay stable across listings.

use crate::application::port::FileInfoSource;
use crate::config::SortOrder;
use crate::domain::file::{FileId, FileKind, FileRecord};
use crate::error::{Error, Result};
use crate::media::{mime_for_path, MediaType};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

/// Mime type folder listings report for directories.
pub const DIRECTORY_MIME: &str = "httpd/unix-directory";

#[derive(Debug, Clone)]
pub struct LocalFileInfoSource {
    root: PathBuf,
    sort_order: SortOrder,
}

impl LocalFileInfoSource {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            sort_order: SortOrder::default(),
        }
    }

    #[must_use]
    pub fn with_sort_order(mut self, sort_order: SortOrder) -> Self {
        self.sort_order = sort_order;
        self
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn blocking<T, F>(&self, job: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(LocalFileInfoSource) -> Result<T> + Send + 'static,
    {
        let source = self.clone();
        tokio::task::spawn_blocking(move || job(source))
            .await
            .map_err(|e| Error::Io(format!("file-info worker failed: {e}")))?
    }

    /// Maps a viewer path onto the tree, refusing anything that escapes it.
    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path.trim_start_matches('/'));
        if relative
            .components()
            .any(|component| !matches!(component, Component::Normal(_) | Component::CurDir))
        {
            return Err(Error::FileInfo(format!("{path} is outside the library")));
        }
        Ok(self.root.join(relative))
    }

    fn viewer_path(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        let segments: Vec<String> = relative
            .components()
            .filter_map(|component| match component {
                Component::Normal(segment) => Some(segment.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        format!("/{}", segments.join("/"))
    }

    fn entry(&self, path: &Path) -> Result<Entry> {
        let metadata = fs::metadata(path)
            .map_err(|e| Error::FileInfo(format!("{}: {e}", path.display())))?;
        let filename = self.viewer_path(path);
        let fileid = file_id(&filename);

        let record = if metadata.is_dir() {
            FileRecord::new(fileid, filename, DIRECTORY_MIME).with_kind(FileKind::Directory)
        } else {
            let mime = mime_for_path(path);
            let modified = metadata
                .modified()
                .ok()
                .and_then(|time| time.duration_since(SystemTime::UNIX_EPOCH).ok())
                .map_or(0, |elapsed| elapsed.as_secs());
            FileRecord::new(fileid, filename, mime)
                .with_size(metadata.len())
                .with_etag(format!("{modified:x}-{:x}", metadata.len()))
                .with_preview(MediaType::from_mime(mime) == MediaType::Image)
        };

        Ok(Entry {
            record,
            modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            created: metadata.created().unwrap_or(SystemTime::UNIX_EPOCH),
        })
    }

    fn list(&self, folder: &str) -> Result<Vec<FileRecord>> {
        let dir = self.resolve(folder)?;
        let read = fs::read_dir(&dir)
            .map_err(|e| Error::FileInfo(format!("{}: {e}", dir.display())))?;

        let mut entries = Vec::new();
        for item in read {
            let item = item?;
            if item.file_name().to_string_lossy().starts_with('.') {
                continue;
            }
            match self.entry(&item.path()) {
                Ok(entry) => entries.push(entry),
                Err(err) => tracing::warn!("Skipping unreadable entry: {err}"),
            }
        }

        sort_entries(&mut entries, self.sort_order);
        let mut records: Vec<FileRecord> = entries.into_iter().map(|entry| entry.record).collect();
        pair_live_photos(&mut records);
        tracing::debug!("Listed {} entries in {}", records.len(), dir.display());
        Ok(records)
    }
}

#[async_trait]
impl FileInfoSource for LocalFileInfoSource {
    async fn stat(&self, path: &str) -> Result<FileRecord> {
        let path = path.to_string();
        self.blocking(move |source| {
            let resolved = source.resolve(&path)?;
            Ok(source.entry(&resolved)?.record)
        })
        .await
    }

    async fn list_folder(&self, folder: &str) -> Result<Vec<FileRecord>> {
        let folder = folder.to_string();
        self.blocking(move |source| source.list(&folder)).await
    }
}

struct Entry {
    record: FileRecord,
    modified: SystemTime,
    created: SystemTime,
}

fn file_id(path: &str) -> FileId {
    let hash = blake3::hash(path.as_bytes());
    let mut id = [0u8; 8];
    id.copy_from_slice(&hash.as_bytes()[..8]);
    FileId::new(u64::from_le_bytes(id))
}

fn sort_entries(entries: &mut [Entry], sort_order: SortOrder) {
    match sort_order {
        SortOrder::Alphabetical => {
            entries.sort_by(|a, b| a.record.basename.cmp(&b.record.basename));
        }
        SortOrder::ModifiedDate => {
            entries.sort_by(|a, b| a.modified.cmp(&b.modified));
        }
        SortOrder::CreatedDate => {
            entries.sort_by(|a, b| a.created.cmp(&b.created));
        }
    }
}

/// Still-image extensions a camera writes next to a live-photo clip.
const LIVE_PHOTO_STILLS: &[&str] = &["heic", "heif", "jpg", "jpeg"];

/// Extension of the motion half of a live photo.
const LIVE_PHOTO_MOTION: &str = "mov";

/// Links `IMG_1.heic` to `IMG_1.mov` when both sit in the same folder.
///
/// Only still/QuickTime pairs qualify, so `trip.jpg` next to `trip.mp4`
/// stays two separate files.
fn pair_live_photos(records: &mut [FileRecord]) {
    let videos: HashMap<String, FileId> = records
        .iter()
        .filter(|record| record.is_file() && has_extension(&record.basename, &[LIVE_PHOTO_MOTION]))
        .map(|record| (stem(&record.basename).to_string(), record.fileid))
        .collect();

    for record in records.iter_mut() {
        if record.is_file() && has_extension(&record.basename, LIVE_PHOTO_STILLS) {
            if let Some(video) = videos.get(stem(&record.basename)) {
                record.metadata_files_live_photo = Some(*video);
            }
        }
    }
}

fn stem(basename: &str) -> &str {
    basename.rsplit_once('.').map_or(basename, |(stem, _)| stem)
}

fn has_extension(basename: &str, extensions: &[&str]) -> bool {
    basename.rsplit_once('.').is_some_and(|(_, ext)| {
        extensions
            .iter()
            .any(|candidate| ext.eq_ignore_ascii_case(candidate))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn create_file(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = fs::File::create(&path).expect("failed to create test file");
        file.write_all(b"fake media data")
            .expect("failed to write test file");
        path
    }

    #[tokio::test]
    async fn lists_folder_alphabetically() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        fs::create_dir(temp_dir.path().join("Photos")).expect("mkdir");
        create_file(&temp_dir.path().join("Photos"), "c.png");
        create_file(&temp_dir.path().join("Photos"), "a.jpg");
        create_file(&temp_dir.path().join("Photos"), "b.mp4");

        let source = LocalFileInfoSource::new(temp_dir.path());
        let records = source.list_folder("/Photos").await.expect("list");
        let names: Vec<&str> = records.iter().map(|r| r.filename.as_str()).collect();
        assert_eq!(names, vec!["/Photos/a.jpg", "/Photos/b.mp4", "/Photos/c.png"]);
        assert_eq!(records[0].mime, "image/jpeg");
        assert_eq!(records[1].mime, "video/mp4");
        assert!(records[0].has_preview);
        assert!(!records[1].has_preview);
        assert_eq!(records[0].size, 15);
    }

    #[tokio::test]
    async fn directories_are_listed_but_hidden_files_are_not() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        fs::create_dir(temp_dir.path().join("nested")).expect("mkdir");
        create_file(temp_dir.path(), ".hidden.jpg");
        create_file(temp_dir.path(), "photo.jpg");

        let source = LocalFileInfoSource::new(temp_dir.path());
        let records = source.list_folder("/").await.expect("list");
        assert_eq!(records.len(), 2);
        let dir = records.iter().find(|r| r.basename == "nested").expect("dir");
        assert_eq!(dir.kind, FileKind::Directory);
        assert_eq!(dir.mime, DIRECTORY_MIME);
    }

    #[tokio::test]
    async fn ids_are_stable_across_calls() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        create_file(temp_dir.path(), "photo.jpg");

        let source = LocalFileInfoSource::new(temp_dir.path());
        let listed = source.list_folder("/").await.expect("list");
        let stat = source.stat("/photo.jpg").await.expect("stat");
        assert_eq!(listed[0].fileid, stat.fileid);
        assert_eq!(stat.basename, "photo.jpg");
    }

    #[tokio::test]
    async fn live_photo_halves_are_paired() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        create_file(temp_dir.path(), "IMG_1.heic");
        create_file(temp_dir.path(), "IMG_1.mov");
        create_file(temp_dir.path(), "IMG_2.jpg");

        let source = LocalFileInfoSource::new(temp_dir.path());
        let records = source.list_folder("/").await.expect("list");
        let still = records.iter().find(|r| r.basename == "IMG_1.heic").expect("still");
        let video = records.iter().find(|r| r.basename == "IMG_1.mov").expect("video");
        assert_eq!(still.metadata_files_live_photo, Some(video.fileid));
        let lone = records.iter().find(|r| r.basename == "IMG_2.jpg").expect("lone");
        assert_eq!(lone.metadata_files_live_photo, None);
    }

    #[tokio::test]
    async fn same_stem_outside_live_photo_formats_is_not_paired() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        create_file(temp_dir.path(), "trip.jpg");
        create_file(temp_dir.path(), "trip.mp4");
        create_file(temp_dir.path(), "IMG_3.JPG");
        create_file(temp_dir.path(), "IMG_3.MOV");

        let source = LocalFileInfoSource::new(temp_dir.path());
        let records = source.list_folder("/").await.expect("list");
        let trip = records.iter().find(|r| r.basename == "trip.jpg").expect("trip");
        assert_eq!(trip.metadata_files_live_photo, None);

        let still = records.iter().find(|r| r.basename == "IMG_3.JPG").expect("still");
        let video = records.iter().find(|r| r.basename == "IMG_3.MOV").expect("video");
        assert_eq!(still.metadata_files_live_photo, Some(video.fileid));
    }

    #[tokio::test]
    async fn escaping_paths_are_rejected() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let source = LocalFileInfoSource::new(temp_dir.path());
        let err = source.stat("/../etc/passwd").await.unwrap_err();
        assert!(matches!(err, Error::FileInfo(_)));
    }

    #[tokio::test]
    async fn missing_file_is_a_file_info_error() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let source = LocalFileInfoSource::new(temp_dir.path());
        assert!(matches!(
            source.stat("/missing.jpg").await,
            Err(Error::FileInfo(_))
        ));
        assert!(matches!(
            source.list_folder("/missing").await,
            Err(Error::FileInfo(_))
        ));
    }

    #[test]
    fn modified_date_order_uses_timestamps() {
        let older = Entry {
            record: FileRecord::new(1, "/z.jpg", "image/jpeg"),
            modified: SystemTime::UNIX_EPOCH,
            created: SystemTime::UNIX_EPOCH,
        };
        let newer = Entry {
            record: FileRecord::new(2, "/a.jpg", "image/jpeg"),
            modified: SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(60),
            created: SystemTime::UNIX_EPOCH,
        };
        let mut entries = vec![newer, older];
        sort_entries(&mut entries, SortOrder::ModifiedDate);
        assert_eq!(entries[0].record.basename, "z.jpg");

        sort_entries(&mut entries, SortOrder::Alphabetical);
        assert_eq!(entries[0].record.basename, "a.jpg");
    }
}
