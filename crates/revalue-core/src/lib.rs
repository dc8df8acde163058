#![warn(missing_docs)]
//! # revalue-core
//!
//! ## Purpose
//! Defines the pure data model used across the `revalue` workspace.
//!
//! ## Responsibilities
//! - Represent a validated upload selection (image bytes plus metadata).
//! - Issue revocable preview handles through a tracking registry.
//! - Enforce release-exactly-once discipline for preview handles.
//!
//! ## Data flow
//! UI file pick/drop -> [`UploadSelection::new`] acquires a [`PreviewHandle`]
//! from [`PreviewRegistry`] -> selection feeds payload encoding and, on
//! success, history snapshots.
//!
//! ## Ownership and lifetimes
//! Selections own their backing byte buffers (`Vec<u8>`) so payload encoding
//! and controller state never borrow from transient UI event data.
//!
//! ## Error model
//! Validation failures (empty image, non-image content type, handle misuse)
//! return [`CoreError`] variants with caller-actionable categorization.
//!
//! ## Security and privacy notes
//! This crate never logs image bytes. Preview handle ids embed only a content
//! digest prefix and a serial number.
//!
//! ## Example
//! ```rust
//! use revalue_core::{PreviewRegistry, UploadSelection};
//!
//! let mut registry = PreviewRegistry::new();
//! let selection =
//!     UploadSelection::new("phone.jpg", "image/jpeg", vec![1, 2, 3], &mut registry).unwrap();
//! assert_eq!(registry.live_count(), 1);
//! registry.release(&selection.preview).unwrap();
//! assert_eq!(registry.live_count(), 0);
//! ```

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Number of digest hex characters embedded in preview handle ids.
pub const PREVIEW_DIGEST_PREFIX_LEN: usize = 16;

/// Revocable reference to a locally rendered image preview.
///
/// Handles are opaque to consumers; only [`PreviewRegistry`] interprets them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PreviewHandle {
    /// Registry-assigned handle identity.
    pub id: String,
}

/// Registry that issues preview handles and tracks their release.
///
/// # Semantics
/// Every acquired handle must be released exactly once. Releasing an unknown
/// or already-released handle is an error so leaks and double-frees are both
/// observable in tests.
#[derive(Debug, Default)]
pub struct PreviewRegistry {
    next_serial: u64,
    live: BTreeSet<String>,
    released: BTreeSet<String>,
}

impl PreviewRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a new live handle for the given image content.
    pub fn acquire(&mut self, image_bytes: &[u8]) -> PreviewHandle {
        self.next_serial += 1;
        let digest = content_digest(image_bytes);
        let id = format!(
            "{}-{}",
            &digest[..PREVIEW_DIGEST_PREFIX_LEN],
            self.next_serial
        );
        self.live.insert(id.clone());
        PreviewHandle { id }
    }

    /// Releases a previously acquired handle.
    ///
    /// # Errors
    /// Returns [`CoreError::PreviewAlreadyReleased`] on a second release and
    /// [`CoreError::UnknownPreviewHandle`] for handles this registry never
    /// issued.
    pub fn release(&mut self, handle: &PreviewHandle) -> Result<(), CoreError> {
        if self.live.remove(&handle.id) {
            self.released.insert(handle.id.clone());
            return Ok(());
        }

        if self.released.contains(&handle.id) {
            return Err(CoreError::PreviewAlreadyReleased(handle.id.clone()));
        }

        Err(CoreError::UnknownPreviewHandle(handle.id.clone()))
    }

    /// Returns the number of currently live handles.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Returns the number of handles released so far.
    pub fn released_count(&self) -> usize {
        self.released.len()
    }

    /// Returns `true` when the handle is live (acquired and not released).
    pub fn is_live(&self, handle: &PreviewHandle) -> bool {
        self.live.contains(&handle.id)
    }
}

/// The image currently chosen for prediction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSelection {
    /// Original file name reported by the picker.
    pub file_name: String,
    /// MIME content type of the image.
    pub content_type: String,
    /// Raw image bytes.
    pub bytes: Vec<u8>,
    /// Preview handle derived from this selection.
    pub preview: PreviewHandle,
}

impl UploadSelection {
    /// Constructs a validated selection and acquires its preview handle.
    ///
    /// # Errors
    /// Returns [`CoreError::EmptyImage`] for zero-byte content,
    /// [`CoreError::InvalidFileName`] for blank names, and
    /// [`CoreError::UnsupportedContentType`] for non-`image/*` types.
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
        registry: &mut PreviewRegistry,
    ) -> Result<Self, CoreError> {
        let file_name = file_name.into();
        let content_type = content_type.into();

        if bytes.is_empty() {
            return Err(CoreError::EmptyImage);
        }

        if file_name.trim().is_empty() {
            return Err(CoreError::InvalidFileName);
        }

        if !content_type.starts_with("image/") {
            return Err(CoreError::UnsupportedContentType(content_type));
        }

        let preview = registry.acquire(&bytes);

        Ok(Self {
            file_name,
            content_type,
            bytes,
            preview,
        })
    }
}

/// Computes the hex SHA-256 digest of image content.
pub fn content_digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Error type for core model validation and handle discipline.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Selected image content is empty.
    #[error("selected image is empty")]
    EmptyImage,
    /// File name is blank.
    #[error("file name is blank")]
    InvalidFileName,
    /// Content type is not an image type.
    #[error("unsupported content type: {0}")]
    UnsupportedContentType(String),
    /// Handle was never issued by this registry.
    #[error("unknown preview handle: {0}")]
    UnknownPreviewHandle(String),
    /// Handle was already released once.
    #[error("preview handle already released: {0}")]
    PreviewAlreadyReleased(String),
}
