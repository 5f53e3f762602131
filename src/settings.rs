//! API key persistence.
//!
//! One stored entry holds either a bare key or a JSON array string of keys
//! (the legacy multi-key encoding). Internally everything is a typed list;
//! the bare-string form is only written back when exactly one key exists,
//! keeping old saves readable.

use rand::Rng;

use crate::paths::get_api_key_path;

/// Blocking message pointing the user at the settings entry point. Raised
/// synchronously before any network call is attempted.
pub const MISSING_KEY_MESSAGE: &str = "Chưa có API Key! Vui lòng nhấn vào nút Cài đặt (⚙️) \
     ở góc trên màn hình để nhập Google Gemini API Key.";

/// Parse a stored credential entry. A JSON array string yields its non-blank
/// elements; anything else (including malformed JSON) is one bare key.
pub fn parse_api_keys(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if trimmed.starts_with('[') && trimmed.ends_with(']') {
        if let Ok(parsed) = serde_json::from_str::<Vec<String>>(trimmed) {
            let valid: Vec<String> = parsed
                .into_iter()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect();
            return valid;
        }
    }
    if trimmed.is_empty() {
        Vec::new()
    } else {
        vec![trimmed.to_string()]
    }
}

/// Serialize keys for persistence: bare string for a single key, JSON array
/// string otherwise.
pub fn serialize_api_keys(keys: &[String]) -> String {
    match keys {
        [single] => single.clone(),
        _ => serde_json::to_string(keys).unwrap_or_default(),
    }
}

/// Load the stored keys, falling back to the `GEMINI_API_KEY` environment
/// variable when nothing is saved (mirror of the hosted build).
pub fn load_api_keys() -> Result<Vec<String>, String> {
    let path = get_api_key_path()?;
    if path.exists() {
        let raw = std::fs::read_to_string(&path)
            .map_err(|e| format!("Failed to read API key file: {}", e))?;
        let keys = parse_api_keys(&raw);
        if !keys.is_empty() {
            return Ok(keys);
        }
    }
    match std::env::var("GEMINI_API_KEY") {
        Ok(key) if !key.trim().is_empty() => Ok(vec![key.trim().to_string()]),
        _ => Ok(Vec::new()),
    }
}

/// Normalize and persist a credential entry as entered in settings.
pub fn save_api_key_entry(raw: &str) -> Result<(), String> {
    let path = get_api_key_path()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| format!("Failed to create directory: {}", e))?;
    }
    let keys = parse_api_keys(raw);
    std::fs::write(&path, serialize_api_keys(&keys))
        .map_err(|e| format!("Failed to save API key: {}", e))
}

/// Uniform-random pick among the stored keys. Pure load distribution:
/// independent calls may land on different keys.
pub fn pick_api_key() -> Result<String, String> {
    let keys = load_api_keys()?;
    pick_from(&keys)
        .cloned()
        .ok_or_else(|| MISSING_KEY_MESSAGE.to_string())
}

fn pick_from(keys: &[String]) -> Option<&String> {
    if keys.is_empty() {
        return None;
    }
    let idx = rand::rng().random_range(0..keys.len());
    keys.get(idx)
}
