use std::fmt;
use std::sync::Arc;

/// In-memory file attachment (BOL documents, import spreadsheets).
///
/// File references only ever live in the ephemeral store; they have no serde
/// implementation so they cannot leak into the durable medium.
#[derive(Clone, PartialEq, Eq)]
pub struct FileRef {
    pub name: String,
    pub content_type: String,
    pub bytes: Arc<[u8]>,
}

impl FileRef {
    pub fn new(
        name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn pdf(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self::new(name, "application/pdf", bytes)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for FileRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileRef")
            .field("name", &self.name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}
