//! Audio playback seam.
//!
//! The platform audio stack is an external collaborator; [`AudioPlayer`]
//! resolves when playback of one clip has completed.  [`FileAudioPlayer`]
//! is the headless implementation used by the command-line binary: it
//! "plays" a clip by writing it to a numbered file.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;

use crate::tts::synthesizer::{SynthesizedAudio, TtsError};

#[async_trait]
pub trait AudioPlayer: Send + Sync {
    /// Play `audio`, returning once playback has finished.
    async fn play(&self, audio: &SynthesizedAudio) -> Result<(), TtsError>;
}

/// Writes every clip to `<dir>/utterance-<n>.<ext>`.
pub struct FileAudioPlayer {
    dir: PathBuf,
    counter: AtomicU64,
}

impl FileAudioPlayer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            counter: AtomicU64::new(0),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the most recently written clip, if any.
    pub fn last_path(&self, audio: &SynthesizedAudio) -> Option<PathBuf> {
        match self.counter.load(Ordering::SeqCst) {
            0 => None,
            n => Some(self.clip_path(n, audio)),
        }
    }

    fn clip_path(&self, n: u64, audio: &SynthesizedAudio) -> PathBuf {
        self.dir
            .join(format!("utterance-{n}.{}", audio.extension()))
    }
}

#[async_trait]
impl AudioPlayer for FileAudioPlayer {
    async fn play(&self, audio: &SynthesizedAudio) -> Result<(), TtsError> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let path = self.clip_path(n, audio);

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| TtsError::Playback(e.to_string()))?;
        tokio::fs::write(&path, &audio.bytes)
            .await
            .map_err(|e| TtsError::Playback(format!("{}: {e}", path.display())))?;

        log::info!("tts: wrote {} bytes to {}", audio.bytes.len(), path.display());
        Ok(())
    }
}
