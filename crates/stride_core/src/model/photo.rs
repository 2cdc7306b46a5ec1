//! Photo attachment model.
//!
//! Binary content is not embedded in the record: it lives in an external
//! content store addressed by photo id (see [`crate::photos`]). The record
//! only carries identity and caption.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a photo attachment.
pub type PhotoId = Uuid;

/// Photo attachment owned by exactly one journal entry.
///
/// Deleting the entry deletes both this record and its backing content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalPhoto {
    pub id: PhotoId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

impl JournalPhoto {
    pub fn new(caption: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            caption,
        }
    }

    pub fn with_id(id: PhotoId, caption: Option<String>) -> Self {
        Self { id, caption }
    }

    /// Name of the backing content file, derived from the id.
    pub fn file_name(&self) -> String {
        format!("{}.jpg", self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::JournalPhoto;
    use uuid::Uuid;

    #[test]
    fn file_name_is_derived_from_id() {
        let id = Uuid::parse_str("11111111-2222-4333-8444-555555555555").unwrap();
        let photo = JournalPhoto::with_id(id, None);
        assert_eq!(photo.file_name(), format!("{id}.jpg"));
    }
}
