use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use thiserror::Error;
use tokio::time::sleep;
use tracing::debug;

use super::{AssistantTransport, ConversationSession, SubmitRejected};

/// Pause between filling the input with a transcript and sending it.
pub const AUTO_SUBMIT_DELAY: Duration = Duration::from_millis(300);

pub type RecognitionFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Option<String>, RecognitionError>> + Send + 'a>>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("speech recognition failed: {0}")]
pub struct RecognitionError(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Voice input not supported on this device.")]
pub struct VoiceUnavailable;

/// Platform speech-to-text facility.
pub trait SpeechRecognizer: Send + Sync {
    /// Listens for a single utterance. Resolves to `None` when recognition ends without text.
    fn recognize(&self) -> RecognitionFuture<'_>;
    /// Ends an in-progress recognition early.
    fn stop(&self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dictation {
    /// Recognition ended without usable text.
    NothingHeard,
    Submitted { transcript: String },
    Rejected {
        transcript: String,
        reason: SubmitRejected,
    },
}

/// Mic toggle for the assistant panel. Works without a recognizer; capture then reports
/// [`VoiceUnavailable`] instead of failing.
pub struct VoiceInput {
    recognizer: Option<Arc<dyn SpeechRecognizer>>,
    listening: AtomicBool,
    auto_submit_delay: Duration,
}

impl VoiceInput {
    pub fn new(recognizer: Option<Arc<dyn SpeechRecognizer>>) -> Self {
        Self {
            recognizer,
            listening: AtomicBool::new(false),
            auto_submit_delay: AUTO_SUBMIT_DELAY,
        }
    }

    pub fn with_auto_submit_delay(mut self, delay: Duration) -> Self {
        self.auto_submit_delay = delay;
        self
    }

    pub fn is_available(&self) -> bool {
        self.recognizer.is_some()
    }

    pub fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }

    /// Stops listening. Returns `false` when no capture was running.
    pub fn stop(&self) -> bool {
        if !self.listening.swap(false, Ordering::SeqCst) {
            return false;
        }
        if let Some(recognizer) = &self.recognizer {
            recognizer.stop();
        }
        true
    }

    /// Captures one utterance. Recognition errors end the capture quietly.
    pub async fn capture(&self) -> Result<Option<String>, VoiceUnavailable> {
        let recognizer = self.recognizer.as_ref().ok_or(VoiceUnavailable)?;

        self.listening.store(true, Ordering::SeqCst);
        let result = recognizer.recognize().await;
        self.listening.store(false, Ordering::SeqCst);

        match result {
            Ok(Some(transcript)) if !transcript.trim().is_empty() => {
                Ok(Some(transcript.trim().to_string()))
            }
            Ok(_) => Ok(None),
            Err(err) => {
                debug!("{err}");
                Ok(None)
            }
        }
    }

    /// Captures an utterance, shows it in the session input, then submits it after the
    /// auto-submit delay.
    pub async fn dictate(
        &self,
        session: &mut ConversationSession,
        transport: &dyn AssistantTransport,
    ) -> Result<Dictation, VoiceUnavailable> {
        let Some(transcript) = self.capture().await? else {
            return Ok(Dictation::NothingHeard);
        };

        session.set_input(transcript.clone());
        sleep(self.auto_submit_delay).await;

        Ok(match session.submit(transport, &transcript).await {
            Ok(_) => Dictation::Submitted { transcript },
            Err(reason) => Dictation::Rejected { transcript, reason },
        })
    }
}
