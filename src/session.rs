//! Single owner of the per-session UI state: the generation state machine,
//! the pending request, and the chat log.
//!
//! Every transition builds a complete new [`GenerationState`] value; fields
//! are never patched in place. Nothing here touches the network — commands
//! in `main.rs` drive the transitions around the remote calls.

use crate::models::{
    ChatMessage, GenerationState, GenerationStatus, PendingGameRequest,
};
use crate::prompts::DEFAULT_CLARIFICATION;

/// Greeting seeded into the chat log at startup.
const WELCOME_MESSAGE: &str = "Xin chào thầy cô! Tôi là trợ lí của thầy Giới, sẽ giúp thầy cô \
     chỉnh sửa lại game cho phù hợp nhé! Bất kỳ yêu cầu nào tôi cũng có thể giúp thầy cô!";

/// Gate message while a request is already in flight.
const BUSY_MESSAGE: &str = "Hệ thống đang xử lý một yêu cầu khác, thầy cô đợi một chút nhé!";

const NO_PENDING_MESSAGE: &str = "Không có yêu cầu nào đang chờ trả lời.";

pub struct GenerationSession {
    state: GenerationState,
    pending: Option<PendingGameRequest>,
    chat_log: Vec<ChatMessage>,
    next_message_seq: u64,
}

impl GenerationSession {
    pub fn new() -> Self {
        let mut session = Self {
            state: GenerationState::idle(),
            pending: None,
            chat_log: Vec::new(),
            next_message_seq: 0,
        };
        session.push_model_message(WELCOME_MESSAGE);
        session
    }

    pub fn state(&self) -> GenerationState {
        self.state.clone()
    }

    pub fn chat_log(&self) -> Vec<ChatMessage> {
        self.chat_log.clone()
    }

    /// A request is in flight from submit until success or error; the UI
    /// gates resubmission on this.
    pub fn in_flight(&self) -> bool {
        matches!(
            self.state.status,
            GenerationStatus::Loading | GenerationStatus::Consulting | GenerationStatus::Streaming
        )
    }

    /// idle/success/error -> loading. Stores the request for the
    /// consultation round-trip.
    pub fn begin(&mut self, request: PendingGameRequest) -> Result<(), String> {
        if self.in_flight() {
            return Err(BUSY_MESSAGE.to_string());
        }
        self.pending = Some(request);
        self.state = GenerationState {
            status: GenerationStatus::Loading,
            code: String::new(),
            error: None,
        };
        Ok(())
    }

    /// loading -> consulting. The question joins the chat log and the flow
    /// suspends until the user replies; no timeout bounds this wait.
    pub fn await_consultation(&mut self, question: &str) -> ChatMessage {
        self.state = GenerationState {
            status: GenerationStatus::Consulting,
            code: String::new(),
            error: None,
        };
        self.push_model_message(question)
    }

    /// consulting -> loading once the user's reply arrives. Hands back the
    /// stored request to generate from.
    pub fn resume_with_clarification(&mut self) -> Result<PendingGameRequest, String> {
        let request = self
            .pending
            .take()
            .ok_or_else(|| NO_PENDING_MESSAGE.to_string())?;
        self.state = GenerationState {
            status: GenerationStatus::Loading,
            code: String::new(),
            error: None,
        };
        Ok(request)
    }

    /// Consultation is best-effort: when the call fails the flow proceeds
    /// straight to generation with a synthesized clarification.
    pub fn clarification_failed(&mut self) -> Result<(PendingGameRequest, String), String> {
        let request = self
            .pending
            .take()
            .ok_or_else(|| NO_PENDING_MESSAGE.to_string())?;
        self.state = GenerationState {
            status: GenerationStatus::Loading,
            code: String::new(),
            error: None,
        };
        Ok((request, DEFAULT_CLARIFICATION.to_string()))
    }

    /// loading/streaming -> streaming with the accumulated raw prefix.
    pub fn stream_progress(&mut self, partial: &str) {
        self.state = GenerationState {
            status: GenerationStatus::Streaming,
            code: partial.to_string(),
            error: None,
        };
    }

    /// streaming -> success with the cleaned, token-restored artifact.
    pub fn complete(&mut self, final_code: String) {
        self.state = GenerationState {
            status: GenerationStatus::Success,
            code: final_code,
            error: None,
        };
    }

    /// any phase -> error. Terminal for the request; the user resubmits
    /// manually.
    pub fn fail(&mut self, message: String) {
        self.pending = None;
        self.state = GenerationState {
            status: GenerationStatus::Error,
            code: String::new(),
            error: Some(message),
        };
    }

    /// Wholesale artifact replacement after an accepted chat edit.
    pub fn replace_code(&mut self, new_code: String) {
        self.state = GenerationState {
            status: GenerationStatus::Success,
            code: new_code,
            error: None,
        };
    }

    pub fn push_user_message(&mut self, text: &str) -> ChatMessage {
        self.push_message("user", text)
    }

    pub fn push_model_message(&mut self, text: &str) -> ChatMessage {
        self.push_message("model", text)
    }

    fn push_message(&mut self, role: &str, text: &str) -> ChatMessage {
        let message = ChatMessage {
            id: format!(
                "{}-{}",
                chrono::Utc::now().timestamp_millis(),
                self.next_message_seq
            ),
            role: role.to_string(),
            text: text.to_string(),
        };
        self.next_message_seq += 1;
        self.chat_log.push(message.clone());
        message
    }
}
