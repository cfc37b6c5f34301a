//! Per-conversation state shared between the photo path and tool calls.

use tokio::sync::Mutex;
use tracing::debug;

use crate::common::Coordinates;

/// The most recent image the caller sent, and what the vision model saw in it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhotoContext {
    /// Never blank when present.
    pub scene_summary: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Default)]
struct ConversationState {
    photo: PhotoContext,
    location: Option<Coordinates>,
}

/// Mutable context for one conversation.
///
/// Writers (image events, location updates) and readers (incident filing)
/// go through one lock, so a reader sees either the old or the new analysis,
/// never a torn one.
#[derive(Debug)]
pub struct ConversationContext {
    id: String,
    state: Mutex<ConversationState>,
}

impl ConversationContext {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: Mutex::new(ConversationState::default()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Store a new image and its analysis.
    ///
    /// A blank analysis clears the stored summary rather than storing "".
    pub async fn record_image(&self, image_url: &str, analysis: &str) {
        let mut state = self.state.lock().await;
        state.photo = PhotoContext {
            scene_summary: non_blank(analysis),
            image_url: non_blank(image_url),
        };
        debug!(
            conversation_id = %self.id,
            has_analysis = state.photo.scene_summary.is_some(),
            "Stored image context"
        );
    }

    /// Remember the image URL only; an existing analysis is kept.
    pub async fn record_image_url(&self, image_url: &str) {
        let mut state = self.state.lock().await;
        state.photo.image_url = non_blank(image_url);
    }

    pub async fn set_location(&self, coordinates: Coordinates) {
        let mut state = self.state.lock().await;
        state.location = Some(coordinates);
        debug!(conversation_id = %self.id, %coordinates, "Stored caller location");
    }

    pub async fn photo(&self) -> PhotoContext {
        self.state.lock().await.photo.clone()
    }

    pub async fn location(&self) -> Option<Coordinates> {
        self.state.lock().await.location
    }

    /// Stored analysis and location, read together.
    pub async fn snapshot(&self) -> (Option<String>, Option<Coordinates>) {
        let state = self.state.lock().await;
        (state.photo.scene_summary.clone(), state.location)
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
