//! Photo binary content storage.
//!
//! # Responsibility
//! - Keep image bytes outside the primary record store, addressed by photo id.
//! - Provide the read-only collaborator the JSON exporter uses for inlining.
//!
//! # Invariants
//! - Content files are named `<photo id>.jpg` under one root directory.
//! - Removing an entry must remove its photos' backing content too; the
//!   service layer drives that through [`PhotoContentStore::remove_photo`].

use crate::model::photo::PhotoId;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub type PhotoResult<T> = Result<T, PhotoStoreError>;

#[derive(Debug)]
pub enum PhotoStoreError {
    NotFound(PhotoId),
    Io(std::io::Error),
}

impl Display for PhotoStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "photo content not found: {id}"),
            Self::Io(err) => write!(f, "photo content io error: {err}"),
        }
    }
}

impl Error for PhotoStoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NotFound(_) => None,
            Self::Io(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for PhotoStoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Read side: load photo bytes by id. The JSON exporter depends only on this.
pub trait PhotoContentSource {
    fn load_photo(&self, id: PhotoId) -> PhotoResult<Vec<u8>>;
}

/// Full content store contract used by the entry service.
pub trait PhotoContentStore: PhotoContentSource {
    fn save_photo(&self, id: PhotoId, bytes: &[u8]) -> PhotoResult<()>;
    /// Removing absent content is not an error; cascade delete may race a
    /// content file that never finished writing.
    fn remove_photo(&self, id: PhotoId) -> PhotoResult<()>;
}

/// File-system content store: one `<uuid>.jpg` file per photo under `root`.
pub struct FsPhotoStore {
    root: PathBuf,
}

impl FsPhotoStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn content_path(&self, id: PhotoId) -> PathBuf {
        self.root.join(format!("{id}.jpg"))
    }
}

impl PhotoContentSource for FsPhotoStore {
    fn load_photo(&self, id: PhotoId) -> PhotoResult<Vec<u8>> {
        match fs::read(self.content_path(id)) {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == ErrorKind::NotFound => Err(PhotoStoreError::NotFound(id)),
            Err(err) => Err(err.into()),
        }
    }
}

impl PhotoContentStore for FsPhotoStore {
    fn save_photo(&self, id: PhotoId, bytes: &[u8]) -> PhotoResult<()> {
        fs::create_dir_all(&self.root)?;
        fs::write(self.content_path(id), bytes)?;
        Ok(())
    }

    fn remove_photo(&self, id: PhotoId) -> PhotoResult<()> {
        match fs::remove_file(self.content_path(id)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{FsPhotoStore, PhotoContentSource, PhotoContentStore, PhotoStoreError};
    use uuid::Uuid;

    #[test]
    fn save_load_remove_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsPhotoStore::new(dir.path().join("photos"));
        let id = Uuid::new_v4();

        store.save_photo(id, b"jpeg bytes").unwrap();
        assert_eq!(store.load_photo(id).unwrap(), b"jpeg bytes");

        store.remove_photo(id).unwrap();
        assert!(matches!(
            store.load_photo(id),
            Err(PhotoStoreError::NotFound(missing)) if missing == id
        ));

        // Second remove is a no-op.
        store.remove_photo(id).unwrap();
    }
}
