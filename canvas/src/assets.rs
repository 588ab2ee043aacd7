//! Image asset cache.
//!
//! Placed objects reference uploaded images by asset id. The cache is a
//! lazy, single-flight memo: a miss queues one listing request (never more
//! than one in flight) and returns `None`; once the runtime delivers the
//! listing, later lookups hit synchronously. Entries are never evicted.

#[cfg(test)]
#[path = "assets_test.rs"]
mod assets_test;

use std::collections::HashMap;
use std::rc::Rc;

/// Which asset listing to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetScope {
    /// Assets uploaded by the local user (the session host).
    Owned,
    /// Assets uploaded by the given account and shared with the session.
    SharedBy(i64),
}

/// A decoded listing entry with its downloaded bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub bytes: Vec<u8>,
    /// Natural size read from the image header, when recognisable.
    pub size: Option<(u32, u32)>,
}

impl Image {
    /// Build an image, reading its natural size from `bytes`.
    #[must_use]
    pub fn new(id: i64, name: impl Into<String>, url: impl Into<String>, bytes: Vec<u8>) -> Self {
        let size = image_size(&bytes);
        Self { id, name: name.into(), url: url.into(), bytes, size }
    }
}

/// Shared handle to a cached image.
pub type ImageHandle = Rc<Image>;

/// Single-flight image cache keyed by asset id.
#[derive(Debug, Default)]
pub struct AssetCache {
    images: HashMap<i64, ImageHandle>,
    loading: bool,
    pending: Option<AssetScope>,
}

impl AssetCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, id: i64) -> Option<ImageHandle> {
        self.images.get(&id).cloned()
    }

    /// Queue a listing fetch for `scope` unless one is already in flight.
    /// Returns whether a new fetch was queued.
    pub fn begin_load(&mut self, scope: AssetScope) -> bool {
        if self.loading {
            return false;
        }
        self.loading = true;
        self.pending = Some(scope);
        true
    }

    /// The queued fetch, if the runtime has not picked it up yet.
    pub fn take_pending(&mut self) -> Option<AssetScope> {
        self.pending.take()
    }

    /// Store a fetched listing and clear the in-flight marker.
    pub fn complete(&mut self, images: Vec<Image>) {
        for image in images {
            self.images.insert(image.id, Rc::new(image));
        }
        self.loading = false;
    }

    /// Clear the in-flight marker after a failed fetch so a later miss retries.
    pub fn fail(&mut self) {
        self.loading = false;
        self.pending = None;
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.images.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

// =============================================================================
// NATURAL SIZE
// =============================================================================

/// Natural `(width, height)` read from an image header, for any format
/// `imagesize` recognises. Zero or oversized dimensions count as unknown.
#[must_use]
pub fn image_size(bytes: &[u8]) -> Option<(u32, u32)> {
    let size = match imagesize::blob_size(bytes) {
        Ok(size) => size,
        Err(error) => {
            if !bytes.is_empty() {
                tracing::debug!(%error, len = bytes.len(), "image header not recognised");
            }
            return None;
        }
    };
    let (Ok(width), Ok(height)) = (u32::try_from(size.width), u32::try_from(size.height)) else {
        return None;
    };
    (width > 0 && height > 0).then_some((width, height))
}
