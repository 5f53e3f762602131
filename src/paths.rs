//! Path utilities and file system helpers

use std::path::PathBuf;

/// Default filename offered when the teacher downloads a finished game.
pub const DEFAULT_GAME_FILENAME: &str = "game-giao-duc.html";

/// Gets the application data directory
pub fn get_app_data_dir() -> Result<PathBuf, String> {
    dirs::data_dir()
        .map(|p| p.join("com.baldigitech.gamestudio"))
        .ok_or_else(|| "Could not find app data directory".to_string())
}

/// Gets the API key file path
pub fn get_api_key_path() -> Result<PathBuf, String> {
    get_app_data_dir().map(|p| p.join(".api_key"))
}
