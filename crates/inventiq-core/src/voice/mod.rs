//! Voice assistant controller.
//!
//! Speech recognition and synthesis live outside this crate. A finished
//! transcript is handed to [`VoiceAssistant::respond`], which asks the
//! insights endpoint and passes the answer to a [`Speaker`].

use tokio::sync::watch;
use tracing::{debug, error};

use crate::api::ApiClient;

/// Spoken (and shown) when the insights call fails
pub const FALLBACK_RESPONSE: &str = "Sorry, I had trouble processing your request.";

/// Output side of the speech capability.
pub trait Speaker: Send {
    fn speak(&mut self, text: &str);
}

/// What the assistant is doing, as seen by subscribers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssistantState {
    response: String,
    processing: bool,
}

impl AssistantState {
    /// The last answer given, or an empty string before the first one
    pub fn response(&self) -> &str {
        &self.response
    }

    /// True while an insights request is in flight
    pub fn is_processing(&self) -> bool {
        self.processing
    }
}

pub struct VoiceAssistant {
    api: ApiClient,
    speaker: Box<dyn Speaker>,
    state: watch::Sender<AssistantState>,
}

impl VoiceAssistant {
    pub fn new(api: ApiClient, speaker: Box<dyn Speaker>) -> Self {
        let (state, _rx) = watch::channel(AssistantState::default());
        Self { api, speaker, state }
    }

    /// Receiver that observes processing and answer changes
    pub fn subscribe(&self) -> watch::Receiver<AssistantState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> AssistantState {
        self.state.borrow().clone()
    }

    /// Answer a transcript. Blank transcripts are ignored and return `None`.
    /// Backend failures are answered with [`FALLBACK_RESPONSE`] rather than
    /// returned to the caller.
    pub async fn respond(&mut self, transcript: &str, product_id: Option<&str>) -> Option<String> {
        let query = transcript.trim();
        if query.is_empty() {
            debug!("Empty transcript, nothing to ask");
            return None;
        }

        self.state.send_modify(|s| s.processing = true);
        let answer = match self.api.insights(query, product_id).await {
            Ok(insights) => insights,
            Err(e) => {
                error!(error = %e, "Error processing voice query");
                FALLBACK_RESPONSE.to_string()
            }
        };
        self.speaker.speak(&answer);
        self.state.send_modify(|s| {
            s.response = answer.clone();
            s.processing = false;
        });

        Some(answer)
    }
}
