// SPDX-License-Identifier: MPL-2.0
use super::{FileId, FileRecord, FileRef};
use crate::media::MediaType;
use std::collections::HashSet;

/// Ordered sequence of records; insertion order drives prev/next order.
///
/// The list never reorders or deduplicates on its own. Only the navigation
/// controller appends to it (pagination).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileList {
    files: Vec<FileRecord>,
}

impl FileList {
    /// Creates a new empty `FileList`.
    #[must_use]
    pub fn new() -> Self {
        Self { files: Vec::new() }
    }

    /// Returns the record at the specified index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&FileRecord> {
        self.files.get(index)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut FileRecord> {
        self.files.get_mut(index)
    }

    /// Returns the first record in the list, if any.
    #[must_use]
    pub fn first(&self) -> Option<&FileRecord> {
        self.files.first()
    }

    /// Position of the record matching `key`, by id or by full path.
    #[must_use]
    pub fn position_of(&self, key: FileRef<'_>) -> Option<usize> {
        self.files.iter().position(|file| file.matches(key))
    }

    /// Locates `record`: an entry with the same id and path wins, then an id
    /// carried by exactly one entry, then the path alone.
    ///
    /// Ad-hoc lists may repeat a placeholder id, so a shared id is never
    /// trusted on its own.
    #[must_use]
    pub fn locate(&self, record: &FileRecord) -> Option<usize> {
        if let Some(index) = self
            .files
            .iter()
            .position(|file| file.fileid == record.fileid && file.filename == record.filename)
        {
            return Some(index);
        }

        let mut by_id = self
            .files
            .iter()
            .enumerate()
            .filter(|(_, file)| file.fileid == record.fileid)
            .map(|(index, _)| index);
        match (by_id.next(), by_id.next()) {
            (Some(index), None) => Some(index),
            _ => self.position_of(FileRef::Name(&record.filename)),
        }
    }

    #[must_use]
    pub fn find(&self, key: FileRef<'_>) -> Option<&FileRecord> {
        self.position_of(key).and_then(|index| self.files.get(index))
    }

    #[must_use]
    pub fn contains_id(&self, id: FileId) -> bool {
        self.files.iter().any(|file| file.fileid == id)
    }

    /// Appends records at the end, returning how many were added.
    pub fn append(&mut self, records: Vec<FileRecord>) -> usize {
        let added = records.len();
        self.files.extend(records);
        added
    }

    /// Drops the video half of live photos whose still image is also listed.
    #[must_use]
    pub fn without_live_photo_companions(self) -> Self {
        let companions: HashSet<FileId> = self
            .files
            .iter()
            .filter(|file| !file.media_type().is_streamed())
            .filter_map(|file| file.metadata_files_live_photo)
            .collect();

        let files = self
            .files
            .into_iter()
            .filter(|file| {
                !(file.media_type() == MediaType::Video && companions.contains(&file.fileid))
            })
            .collect();
        Self { files }
    }

    /// Returns the total number of records in the list.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Checks if the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FileRecord> {
        self.files.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[FileRecord] {
        &self.files
    }
}

impl From<Vec<FileRecord>> for FileList {
    fn from(files: Vec<FileRecord>) -> Self {
        Self { files }
    }
}

impl FromIterator<FileRecord> for FileList {
    fn from_iter<I: IntoIterator<Item = FileRecord>>(iter: I) -> Self {
        Self {
            files: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a FileList {
    type Item = &'a FileRecord;
    type IntoIter = std::slice::Iter<'a, FileRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.iter()
    }
}
