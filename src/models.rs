//! Data models and structures used throughout the application

use serde::{Deserialize, Serialize};

/// Lifecycle of a single game generation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationStatus {
    Idle,
    Loading,
    Consulting,
    Streaming,
    Success,
    Error,
}

/// Snapshot of the generation pipeline shown to the frontend.
///
/// Replaced wholesale on every transition, never field-patched.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationState {
    pub status: GenerationStatus,
    pub code: String,
    pub error: Option<String>,
}

impl GenerationState {
    pub fn idle() -> Self {
        Self {
            status: GenerationStatus::Idle,
            code: String::new(),
            error: None,
        }
    }
}

/// Form parameters held while the consultation answer is pending.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingGameRequest {
    pub idea: String,
    pub age_group: String,
    pub difficulty: String,
    #[serde(default)]
    pub document_text: Option<String>,
    #[serde(default)]
    pub custom_audio: CustomAudioAssets,
}

/// Optional user-supplied sounds, already encoded as base64 data URLs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomAudioAssets {
    pub bg_music: Option<String>,
    pub correct_sound: Option<String>,
    pub wrong_sound: Option<String>,
}

/// A single message in the in-memory chat log ("user" or "model").
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub id: String,
    pub role: String,
    pub text: String,
}

/// Reply from the edit chat: always text, optionally replacement code.
#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub text: String,
    pub new_code: Option<String>,
}
