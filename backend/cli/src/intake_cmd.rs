//! `labelcheck intake`: the local accept/reject decision, no network.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};

use labelcheck_config::LabelCheckConfig;
use labelcheck_core::messages::intake_message;
use labelcheck_core::types::{declared_media_type, format_file_size};
use labelcheck_core::{intake, AcceptedArtifact, Artifact, IntakeRejection, IntakeSource, Locale, UploadSlot};

use crate::terminal_output::{note_error, note_success};

/// Decide on a local file from its metadata alone; the bytes are only read
/// once the size and declared format are acceptable.
pub async fn decide(path: &Path) -> Result<Result<u64, IntakeRejection>> {
    let metadata = tokio::fs::metadata(path)
        .await
        .with_context(|| format!("Failed to inspect {}", path.display()))?;
    Ok(intake::check(metadata.len(), declared_media_type(path)).map(|_| metadata.len()))
}

/// Offer a local file through the file-picker entry point.
///
/// On rejection the localized reason has already been printed.
pub async fn select(path: &Path, locale: Locale) -> Result<Option<AcceptedArtifact>> {
    if let Err(rejection) = decide(path).await? {
        reject(path, locale, rejection);
        return Ok(None);
    }

    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let artifact = Artifact::from_file(path, data);

    let mut slot = UploadSlot::new();
    if let Err(rejection) = slot.offer(IntakeSource::FilePicker, artifact) {
        reject(path, locale, rejection);
        return Ok(None);
    }
    Ok(slot.take())
}

fn reject(path: &Path, locale: Locale, rejection: IntakeRejection) {
    tracing::info!(file = %path.display(), reason = rejection.code(), "File rejected at intake");
    note_error(intake_message(locale, rejection));
}

pub async fn run(config: &LabelCheckConfig, path: &Path) -> Result<ExitCode> {
    match select(path, config.locale()).await? {
        Some(artifact) => {
            note_success(&format!(
                "{} ({}, {})",
                artifact.name(),
                artifact.media_type(),
                format_file_size(artifact.size())
            ));
            Ok(ExitCode::SUCCESS)
        }
        None => Ok(ExitCode::from(2)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejects_oversized_file_from_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("label.jpg");
        // Sparse: the length is set without writing any data.
        let file = std::fs::File::create(&path).unwrap();
        file.set_len(1024 * 1024 * 1024).unwrap();

        assert_eq!(decide(&path).await.unwrap(), Err(IntakeRejection::TooLarge));
        assert!(select(&path, Locale::En).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn rejects_unknown_extension_before_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("label.gif");
        std::fs::File::create(&path).unwrap().set_len(12 * 1024 * 1024).unwrap();

        assert_eq!(decide(&path).await.unwrap(), Err(IntakeRejection::UnsupportedFormat));
    }

    #[tokio::test]
    async fn accepts_supported_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("label.PNG");
        std::fs::write(&path, b"\x89PNG").unwrap();

        assert_eq!(decide(&path).await.unwrap(), Ok(4));
        let artifact = select(&path, Locale::Uk).await.unwrap().unwrap();
        assert_eq!(artifact.name(), "label.PNG");
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(decide(&dir.path().join("absent.pdf")).await.is_err());
    }
}
