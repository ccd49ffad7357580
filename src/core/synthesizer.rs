//! Audio synthesizer.
//!
//! Renders a narration script to audio and persists it under a
//! deterministic key. The audio is staged in a temporary local file between
//! the speech call and the upload; the file is removed when the guard drops,
//! whether or not the upload succeeded.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tempfile::NamedTempFile;
use tracing::info;

use super::fingerprint::AUDIO_SUFFIX;
use crate::adapters::{ObjectStore, SpeechSynthesizer, VoiceSettings};
use crate::domain::PipelineError;

/// Content type of stored audio artifacts
pub const AUDIO_CONTENT_TYPE: &str = "audio/mpeg";

pub struct AudioSynthesizer {
    speech: Arc<dyn SpeechSynthesizer>,
    store: Arc<dyn ObjectStore>,
    voice: VoiceSettings,
    /// Where staging files go; the OS temp dir when unset
    staging_dir: Option<PathBuf>,
}

impl AudioSynthesizer {
    pub fn new(
        speech: Arc<dyn SpeechSynthesizer>,
        store: Arc<dyn ObjectStore>,
        voice: VoiceSettings,
    ) -> Self {
        Self {
            speech,
            store,
            voice,
            staging_dir: None,
        }
    }

    /// Stage audio under `dir` instead of the OS temp dir
    pub fn with_staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = Some(dir.into());
        self
    }

    /// Synthesize `script` and store the audio under `key`
    pub async fn synthesize_and_store(
        &self,
        script: &str,
        key: &str,
    ) -> Result<(), PipelineError> {
        info!(
            key,
            engine = self.speech.name(),
            voice = %self.voice.voice,
            "Synthesizing narration"
        );

        let audio = self
            .speech
            .synthesize(script, &self.voice)
            .await
            .map_err(|e| PipelineError::SynthesisFailed(PipelineError::describe(&e)))?;

        if audio.is_empty() {
            return Err(PipelineError::SynthesisFailed(format!(
                "{} returned no audio stream",
                self.speech.name()
            )));
        }

        let size = audio.len();
        let staged = self
            .stage(audio)
            .await
            .map_err(|e| storage_error(key, &e))?;

        let bytes = tokio::fs::read(staged.path())
            .await
            .context("Failed to read staged audio")
            .map_err(|e| storage_error(key, &e))?;

        self.store
            .put(key, bytes, AUDIO_CONTENT_TYPE)
            .await
            .map_err(|e| storage_error(key, &e))?;

        info!(key, bytes = size, "Stored audio artifact");
        Ok(())
    }

    /// Write audio to a fresh staging file
    async fn stage(&self, audio: Vec<u8>) -> Result<NamedTempFile> {
        let dir = self.staging_dir.clone();

        tokio::task::spawn_blocking(move || -> Result<NamedTempFile> {
            let mut builder = tempfile::Builder::new();
            builder.prefix("newsvoice-").suffix(AUDIO_SUFFIX);

            let mut file = match &dir {
                Some(dir) => builder.tempfile_in(dir),
                None => builder.tempfile(),
            }
            .context("Failed to create staging file")?;

            file.write_all(&audio)
                .context("Failed to write staging file")?;
            file.flush().context("Failed to flush staging file")?;
            Ok(file)
        })
        .await
        .context("Staging task failed")?
    }
}

fn storage_error(key: &str, error: &anyhow::Error) -> PipelineError {
    PipelineError::StorageWriteFailed {
        key: key.to_string(),
        reason: PipelineError::describe(error),
    }
}
