//! Sentinel-token substitution for audio assets.
//!
//! Base64 audio payloads are megabytes of text the model must never see:
//! prompts carry short sentinel tokens instead, and the real payloads are
//! spliced back into the artifact after generation or editing.

use crate::models::CustomAudioAssets;

/// Per-slot sentinel tokens the generation prompt asks the model to place
/// verbatim in the audio `src` positions.
pub const BG_MUSIC_TOKEN: &str = "__CUSTOM_BG_MUSIC_TOKEN__";
pub const CORRECT_TOKEN: &str = "__CUSTOM_CORRECT_TOKEN__";
pub const WRONG_TOKEN: &str = "__CUSTOM_WRONG_TOKEN__";

/// Fixed fallback sounds (Google Drive direct links) used when the teacher
/// did not upload their own.
pub const DEFAULT_BG_MUSIC: &str =
    "https://drive.google.com/uc?export=download&id=1j0NFTSkaWtntRRbrExcAkx3_we07ZusE";
pub const DEFAULT_CORRECT: &str =
    "https://drive.google.com/uc?export=download&id=1wxYH5-gSbJwFxBHy-oXfT2w64cJLa5Vl";
pub const DEFAULT_WRONG: &str =
    "https://drive.google.com/uc?export=download&id=18dwx0EDlzbYDds0PupqxmR03ux_QH4zn";

const DATA_URL_PREFIX: &str = "data:";
const BASE64_MARKER: &str = ";base64,";

/// Source strings handed to the model for the three audio slots: the
/// sentinel token when a custom payload exists, the default link otherwise.
#[derive(Debug, Clone, Copy)]
pub struct AudioSources {
    pub bg: &'static str,
    pub correct: &'static str,
    pub wrong: &'static str,
}

pub fn audio_sources(assets: &CustomAudioAssets) -> AudioSources {
    AudioSources {
        bg: if assets.bg_music.is_some() {
            BG_MUSIC_TOKEN
        } else {
            DEFAULT_BG_MUSIC
        },
        correct: if assets.correct_sound.is_some() {
            CORRECT_TOKEN
        } else {
            DEFAULT_CORRECT
        },
        wrong: if assets.wrong_sound.is_some() {
            WRONG_TOKEN
        } else {
            DEFAULT_WRONG
        },
    }
}

/// Replace every sentinel token in the final artifact with the real
/// payload. Slots without a payload resolve to an empty string, so a stray
/// token can never leak into the finished game.
pub fn restore_audio_tokens(code: &str, assets: &CustomAudioAssets) -> String {
    code.replace(BG_MUSIC_TOKEN, assets.bg_music.as_deref().unwrap_or(""))
        .replace(CORRECT_TOKEN, assets.correct_sound.as_deref().unwrap_or(""))
        .replace(WRONG_TOKEN, assets.wrong_sound.as_deref().unwrap_or(""))
}

/// Replace every `data:<mime>;base64,<payload>` substring with an indexed
/// token (`__AUDIO_DATA_0__`, `__AUDIO_DATA_1__`, ...) and return the
/// tokenized text plus the token -> original mapping.
///
/// This scans for the encoded-data pattern itself, not the known sentinels,
/// so edit round-trips stay payload-size-independent no matter how many
/// assets are already embedded in the artifact.
pub fn tokenize_data_payloads(code: &str) -> (String, Vec<(String, String)>) {
    let mut out = String::with_capacity(code.len());
    let mut map: Vec<(String, String)> = Vec::new();
    let mut pos = 0;

    while let Some(found) = code[pos..].find(DATA_URL_PREFIX) {
        let start = pos + found;
        out.push_str(&code[pos..start]);
        match data_url_len(&code[start..]) {
            Some(len) => {
                let token = format!("__AUDIO_DATA_{}__", map.len());
                out.push_str(&token);
                map.push((token, code[start..start + len].to_string()));
                pos = start + len;
            }
            None => {
                // "data:" in prose, not an encoded payload
                out.push_str(DATA_URL_PREFIX);
                pos = start + DATA_URL_PREFIX.len();
            }
        }
    }

    out.push_str(&code[pos..]);
    (out, map)
}

/// Apply the reverse mapping produced by [`tokenize_data_payloads`],
/// restoring each payload byte-for-byte.
pub fn restore_data_payloads(code: &str, map: &[(String, String)]) -> String {
    let mut out = code.to_string();
    for (token, payload) in map {
        out = out.replace(token, payload);
    }
    out
}

/// Length of a well-formed `data:<mime>;base64,<payload>` run at the start
/// of `text`, or `None` when it is not an encoded-data occurrence.
fn data_url_len(text: &str) -> Option<usize> {
    let mime = &text[DATA_URL_PREFIX.len()..];
    let marker = mime.find(BASE64_MARKER)?;
    if marker == 0 || !mime[..marker].bytes().all(is_mime_byte) {
        return None;
    }
    let payload_start = DATA_URL_PREFIX.len() + marker + BASE64_MARKER.len();
    let payload_len = text[payload_start..]
        .bytes()
        .take_while(|&b| is_base64_byte(b))
        .count();
    if payload_len == 0 {
        return None;
    }
    Some(payload_start + payload_len)
}

fn is_mime_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'/' | b'.' | b'+' | b'-')
}

fn is_base64_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'=')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assets_with_bg() -> CustomAudioAssets {
        CustomAudioAssets {
            bg_music: Some("data:audio/mpeg;base64,QkdNVVNJQw==".to_string()),
            correct_sound: None,
            wrong_sound: None,
        }
    }

    #[test]
    fn sources_use_token_only_for_supplied_slots() {
        let sources = audio_sources(&assets_with_bg());
        assert_eq!(sources.bg, BG_MUSIC_TOKEN);
        assert_eq!(sources.correct, DEFAULT_CORRECT);
        assert_eq!(sources.wrong, DEFAULT_WRONG);
    }

    #[test]
    fn restores_supplied_payload_and_blanks_missing_slots() {
        let assets = assets_with_bg();
        let code = format!(
            "<audio src=\"{}\"></audio><audio src=\"{}\"></audio>",
            BG_MUSIC_TOKEN, CORRECT_TOKEN
        );
        let restored = restore_audio_tokens(&code, &assets);
        assert!(restored.contains("data:audio/mpeg;base64,QkdNVVNJQw=="));
        assert!(!restored.contains(BG_MUSIC_TOKEN));
        assert!(restored.contains("src=\"\""));
        assert!(!restored.contains(CORRECT_TOKEN));
    }

    #[test]
    fn tokenizes_every_embedded_payload() {
        let code = "a data:audio/mpeg;base64,AAAA+/== b data:audio/wav;base64,QQQQ c";
        let (tokenized, map) = tokenize_data_payloads(code);
        assert_eq!(map.len(), 2);
        assert_eq!(tokenized, "a __AUDIO_DATA_0__ b __AUDIO_DATA_1__ c");
        assert_eq!(map[0].1, "data:audio/mpeg;base64,AAAA+/==");
        assert_eq!(map[1].1, "data:audio/wav;base64,QQQQ");
    }

    #[test]
    fn ignores_prose_data_colon() {
        let code = "meta data: none here, and data:text without marker";
        let (tokenized, map) = tokenize_data_payloads(code);
        assert!(map.is_empty());
        assert_eq!(tokenized, code);
    }

    #[test]
    fn noop_edit_round_trip_is_byte_identical() {
        let code = "<audio src=\"data:audio/mpeg;base64,Zm9vYmFy\"></audio>\
                    <audio src=\"data:audio/ogg;base64,YmF6cXV4\"></audio>";
        let (tokenized, map) = tokenize_data_payloads(code);
        assert!(!tokenized.contains(";base64,"));
        let restored = restore_data_payloads(&tokenized, &map);
        assert_eq!(restored, code);
    }
}
