// Prevents additional console window on Windows in release
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

// Module declarations
mod assets;
mod extract;
mod gemini;
mod models;
mod paths;
mod pdf;
mod prompts;
mod session;
mod settings;

use log::{error, info, warn};
use serde_json::json;
use std::sync::Mutex;
use tauri::{command, AppHandle, Emitter};

use assets::{audio_sources, restore_audio_tokens};
use extract::clean_generated_code;
use models::{ChatMessage, ChatReply, GenerationState, GenerationStatus, PendingGameRequest};
use paths::DEFAULT_GAME_FILENAME;
use session::GenerationSession;

/// Canned reply when the chat is used before any game exists.
const NO_GAME_MESSAGE: &str =
    "Bạn hãy tạo một trò chơi trước, sau đó tôi sẽ giúp bạn chỉnh sửa nó nhé!";

/// Apologetic reply for failed edit turns; the current game is left as-is.
const CHAT_ERROR_MESSAGE: &str =
    "Xin lỗi, có lỗi xảy ra. Vui lòng kiểm tra lại kết nối mạng hoặc API Key.";

// ============ App State ============

pub struct AppState {
    pub session: Mutex<GenerationSession>,
}

// ============ Generation Commands ============

#[command]
async fn submit_game_request(
    app: AppHandle,
    state: tauri::State<'_, AppState>,
    request: PendingGameRequest,
) -> Result<GenerationState, String> {
    info!(
        "[submit_game_request] age_group={} difficulty={} idea_len={}",
        request.age_group,
        request.difficulty,
        request.idea.len()
    );

    // Credential gate: raised before any network call.
    if settings::load_api_keys()?.is_empty() {
        return Err(settings::MISSING_KEY_MESSAGE.to_string());
    }

    {
        let mut session = state.session.lock().unwrap();
        session.begin(request.clone())?;
    }

    match gemini::consult_game_logic(&request.idea, &request.age_group).await {
        Ok(question) => {
            let (message, current) = {
                let mut session = state.session.lock().unwrap();
                let message = session.await_consultation(&question);
                (message, session.state())
            };
            let _ = app.emit("generation-question", &message);
            Ok(current)
        }
        Err(e) => {
            // Consultation is best-effort: generate directly instead.
            warn!(
                "[submit_game_request] consultation failed, generating directly: {}",
                e
            );
            let (request, clarification) = {
                let mut session = state.session.lock().unwrap();
                session.clarification_failed()?
            };
            run_generation(&app, &state, request, &clarification).await
        }
    }
}

#[command]
async fn reply_consultation(
    app: AppHandle,
    state: tauri::State<'_, AppState>,
    reply: String,
) -> Result<GenerationState, String> {
    info!("[reply_consultation] reply_len={}", reply.len());
    let request = {
        let mut session = state.session.lock().unwrap();
        session.push_user_message(&reply);
        session.resume_with_clarification()?
    };
    run_generation(&app, &state, request, &reply).await
}

async fn run_generation(
    app: &AppHandle,
    state: &tauri::State<'_, AppState>,
    request: PendingGameRequest,
    clarification: &str,
) -> Result<GenerationState, String> {
    let sources = audio_sources(&request.custom_audio);
    let prompt = prompts::build_generation_prompt(
        &request.idea,
        &request.age_group,
        &request.difficulty,
        clarification,
        &sources,
        request.document_text.as_deref(),
    );

    let result = gemini::generate_game_code_stream(&prompt, |partial| {
        {
            let mut session = state.session.lock().unwrap();
            session.stream_progress(partial);
        }
        let _ = app.emit("generation-stream-chunk", json!({ "code": partial }));
    })
    .await;

    match result {
        Ok(raw) => {
            let final_code = restore_audio_tokens(&clean_generated_code(&raw), &request.custom_audio);
            let current = {
                let mut session = state.session.lock().unwrap();
                session.complete(final_code.clone());
                session.state()
            };
            info!("[run_generation] success, {} chars", final_code.len());
            let _ = app.emit("generation-done", json!({ "code": final_code }));
            Ok(current)
        }
        Err(e) => {
            error!("[run_generation] generation failed: {}", e);
            let current = {
                let mut session = state.session.lock().unwrap();
                session.fail(e);
                session.state()
            };
            let _ = app.emit("generation-error", json!({ "error": current.error }));
            Ok(current)
        }
    }
}

#[command]
fn get_generation_state(state: tauri::State<'_, AppState>) -> Result<GenerationState, String> {
    Ok(state.session.lock().unwrap().state())
}

// ============ Chat Commands ============

#[command]
async fn send_chat_message(
    state: tauri::State<'_, AppState>,
    message: String,
) -> Result<ChatReply, String> {
    let (current_code, has_game) = {
        let mut session = state.session.lock().unwrap();
        session.push_user_message(&message);
        let current = session.state();
        let has_game = matches!(
            current.status,
            GenerationStatus::Success | GenerationStatus::Streaming
        );
        (current.code, has_game)
    };

    if !has_game {
        let mut session = state.session.lock().unwrap();
        session.push_model_message(NO_GAME_MESSAGE);
        return Ok(ChatReply {
            text: NO_GAME_MESSAGE.to_string(),
            new_code: None,
        });
    }

    match gemini::send_chat_edit(&current_code, &message).await {
        Ok(reply) => {
            let mut session = state.session.lock().unwrap();
            session.push_model_message(&reply.text);
            if let Some(code) = &reply.new_code {
                session.replace_code(code.clone());
            }
            Ok(reply)
        }
        Err(e) => {
            // The previous artifact stays authoritative.
            warn!("[send_chat_message] edit failed: {}", e);
            let mut session = state.session.lock().unwrap();
            session.push_model_message(CHAT_ERROR_MESSAGE);
            Ok(ChatReply {
                text: CHAT_ERROR_MESSAGE.to_string(),
                new_code: None,
            })
        }
    }
}

#[command]
fn get_chat_history(state: tauri::State<'_, AppState>) -> Result<Vec<ChatMessage>, String> {
    Ok(state.session.lock().unwrap().chat_log())
}

// ============ API Key Commands ============

#[command]
async fn save_api_key(key: String) -> Result<(), String> {
    info!("[save_api_key] saving Gemini API key entry");
    settings::save_api_key_entry(&key)
}

#[command]
async fn get_api_key() -> Result<Option<String>, String> {
    let keys = settings::load_api_keys()?;
    if keys.is_empty() {
        Ok(None)
    } else {
        Ok(Some(settings::serialize_api_keys(&keys)))
    }
}

#[command]
async fn has_api_key() -> Result<bool, String> {
    Ok(!settings::load_api_keys()?.is_empty())
}

// ============ Document & File Commands ============

#[command]
async fn extract_document_text(path: String) -> Result<String, String> {
    info!("[extract_document_text] reading {}", path);
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| format!("Không thể đọc file: {}", e))?;
    pdf::extract_text_from_pdf(&bytes)
}

#[command]
async fn read_audio_as_data_url(path: String) -> Result<String, String> {
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| format!("Không thể đọc file âm thanh: {}", e))?;
    let mime = mime_guess::from_path(&path).first_or_octet_stream();
    let encoded = base64::Engine::encode(&base64::engine::general_purpose::STANDARD, &bytes);
    info!(
        "[read_audio_as_data_url] {} -> {} base64 chars",
        path,
        encoded.len()
    );
    Ok(format!("data:{};base64,{}", mime.essence_str(), encoded))
}

#[command]
async fn save_game_file(path: String, code: String) -> Result<String, String> {
    tokio::fs::write(&path, code)
        .await
        .map_err(|e| format!("Không thể lưu file game: {}", e))?;
    info!("[save_game_file] wrote {}", path);
    Ok(path)
}

#[command]
fn get_default_game_filename() -> String {
    DEFAULT_GAME_FILENAME.to_string()
}

// ============ Misc Commands ============

#[command]
fn log_from_frontend(level: String, message: String) {
    match level.as_str() {
        "error" => error!("[frontend] {}", message),
        "warn" => warn!("[frontend] {}", message),
        _ => info!("[frontend] {}", message),
    }
}

#[command]
fn quit_app() {
    std::process::exit(0);
}

fn main() {
    tauri::Builder::default()
        .manage(AppState {
            session: Mutex::new(GenerationSession::new()),
        })
        .plugin(tauri_plugin_dialog::init())
        .plugin(tauri_plugin_fs::init())
        .plugin(
            tauri_plugin_log::Builder::new()
                .target(tauri_plugin_log::Target::new(
                    tauri_plugin_log::TargetKind::LogDir {
                        file_name: Some("game-studio.log".into()),
                    },
                ))
                .level(log::LevelFilter::Info)
                .build(),
        )
        .invoke_handler(tauri::generate_handler![
            submit_game_request,
            reply_consultation,
            get_generation_state,
            send_chat_message,
            get_chat_history,
            save_api_key,
            get_api_key,
            has_api_key,
            extract_document_text,
            read_audio_as_data_url,
            save_game_file,
            get_default_game_filename,
            log_from_frontend,
            quit_app,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
