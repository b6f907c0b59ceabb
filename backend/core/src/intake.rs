//! File intake: the accept/reject gate in front of the check pipeline.
//!
//! Drag-and-drop and file-picker selections both go through [`validate`];
//! [`UploadSlot`] keeps the single accepted candidate and its preview.

use std::sync::{Arc, Weak};

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::types::{Artifact, MediaType, MAX_ARTIFACT_BYTES};

/// Why an artifact was refused. The `code` is part of the user-facing vocabulary.
#[derive(Debug, Clone, Copy, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum IntakeRejection {
    #[error("unsupported-format")]
    UnsupportedFormat,
    #[error("too-large")]
    TooLarge,
}

impl IntakeRejection {
    pub fn code(&self) -> &'static str {
        match self {
            IntakeRejection::UnsupportedFormat => "unsupported-format",
            IntakeRejection::TooLarge => "too-large",
        }
    }
}

/// Where a selection came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IntakeSource {
    DragDrop,
    FilePicker,
}

impl std::fmt::Display for IntakeSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntakeSource::DragDrop => write!(f, "drag_drop"),
            IntakeSource::FilePicker => write!(f, "file_picker"),
        }
    }
}

/// Pure decision over a size and a declared media type.
///
/// Format is checked before size, so an oversized file of an unsupported
/// type reports `unsupported-format`.
pub fn check(size: u64, declared_type: &str) -> Result<MediaType, IntakeRejection> {
    let media_type = MediaType::from_mime(declared_type).ok_or(IntakeRejection::UnsupportedFormat)?;
    if size > MAX_ARTIFACT_BYTES {
        return Err(IntakeRejection::TooLarge);
    }
    Ok(media_type)
}

/// Validate an artifact, producing the only type the orchestrator accepts.
pub fn validate(artifact: Artifact) -> Result<AcceptedArtifact, IntakeRejection> {
    let media_type = check(artifact.size(), &artifact.media_type)?;
    Ok(AcceptedArtifact {
        artifact,
        media_type,
    })
}

/// An artifact that passed intake.
#[derive(Debug, Clone)]
pub struct AcceptedArtifact {
    artifact: Artifact,
    media_type: MediaType,
}

impl AcceptedArtifact {
    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    pub fn name(&self) -> &str {
        &self.artifact.name
    }

    pub fn data(&self) -> &Bytes {
        &self.artifact.data
    }

    pub fn size(&self) -> u64 {
        self.artifact.size()
    }

    pub fn into_inner(self) -> Artifact {
        self.artifact
    }
}

struct Selection {
    artifact: AcceptedArtifact,
    source: IntakeSource,
    preview: Option<Arc<Bytes>>,
}

/// Holds at most one accepted artifact awaiting submission.
///
/// The slot owns the preview handle; presenters only get [`Weak`]
/// references, which stop upgrading once the artifact is replaced,
/// removed, or handed off.
#[derive(Default)]
pub struct UploadSlot {
    selection: Option<Selection>,
    last_rejection: Option<IntakeRejection>,
}

impl UploadSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer a candidate from either entry point.
    ///
    /// A rejected candidate also clears any previous selection.
    pub fn offer(&mut self, source: IntakeSource, artifact: Artifact) -> Result<&AcceptedArtifact, IntakeRejection> {
        let name = artifact.name.clone();
        let size = artifact.size();
        // Drop the old preview before anything else.
        self.selection = None;

        match validate(artifact) {
            Ok(accepted) => {
                info!(source = %source, name = %name, size, media_type = %accepted.media_type(), "Artifact accepted");
                let preview = accepted
                    .media_type()
                    .is_image()
                    .then(|| Arc::new(accepted.data().clone()));
                self.last_rejection = None;
                let selection = self.selection.insert(Selection {
                    artifact: accepted,
                    source,
                    preview,
                });
                Ok(&selection.artifact)
            }
            Err(rejection) => {
                info!(source = %source, name = %name, size, reason = rejection.code(), "Artifact rejected");
                self.last_rejection = Some(rejection);
                Err(rejection)
            }
        }
    }

    pub fn selected(&self) -> Option<&AcceptedArtifact> {
        self.selection.as_ref().map(|s| &s.artifact)
    }

    pub fn source(&self) -> Option<IntakeSource> {
        self.selection.as_ref().map(|s| s.source)
    }

    /// A non-owning preview handle; `None` for PDFs and an empty slot.
    pub fn preview(&self) -> Option<Weak<Bytes>> {
        self.selection
            .as_ref()
            .and_then(|s| s.preview.as_ref())
            .map(Arc::downgrade)
    }

    pub fn last_rejection(&self) -> Option<IntakeRejection> {
        self.last_rejection
    }

    /// Discard the current selection and its preview.
    pub fn remove(&mut self) {
        if self.selection.take().is_some() {
            debug!("Selection removed");
        }
        self.last_rejection = None;
    }

    /// Hand the accepted artifact off for submission, releasing the preview.
    pub fn take(&mut self) -> Option<AcceptedArtifact> {
        self.selection.take().map(|s| s.artifact)
    }
}
