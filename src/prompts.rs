//! Prompt templates for the Gemini-backed game pipeline.
//!
//! Pure templating: user inputs are rendered into literal instruction text,
//! nothing is validated here beyond the attached-document idea fallback.

use crate::assets::AudioSources;

/// Clarification substituted when the consultation call fails.
pub const DEFAULT_CLARIFICATION: &str = "Hãy tự quyết định logic game phù hợp nhất.";

/// Question used when the model answers the consultation with empty text.
pub const FALLBACK_QUESTION: &str = "Bạn muốn cách chơi cụ thể như thế nào?";

/// Idea used when the form is empty but an attached document supplies the
/// actual content.
pub const DEFAULT_IDEA: &str = "Tạo trò chơi ôn tập dựa trên nội dung tài liệu đính kèm.";

/// Progress comment prepended to the raw stream; stripped again during
/// extraction.
pub const GENERATION_BANNER: &str =
    "<!-- 🚀 Đang khởi tạo Engine Game HTML5 Canvas (Custom Audio Enabled)... -->\n";

/// Skeleton the generation prompt shows the model. The audio source
/// placeholders are filled per request via [`code_template`].
const CODE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head><style>body{margin:0;overflow:hidden;background:#333}</style></head>
<body>
  <script>window.onerror=function(m,u,l){document.body.innerHTML+='<div style="position:fixed;top:0;background:red;color:white;z-index:9999">⚠️ '+m+'</div>'}</script>
  <canvas id="gameCanvas"></canvas>
  <script>
      // Biến toàn cục
      const canvas = document.getElementById('gameCanvas');
      const ctx = canvas.getContext('2d');
      let gameState = 'START';
      let isMuted = false;

      // Âm thanh
      const sounds = {
          bg: new Audio('{BG_SRC}'),
          correct: new Audio('{CORRECT_SRC}'),
          wrong: new Audio('{WRONG_SRC}')
      };
      sounds.bg.loop = true; sounds.bg.volume = 0.6;

      function playSound(t) {
          if(isMuted) return;
          try {
              const s = t==='bg'?sounds.bg:(t==='correct'?sounds.correct:sounds.wrong);
              if(t!=='bg') s.currentTime=0;
              s.play().catch(e=>console.log(e));
          } catch(e){}
      }

      // Logic Game
      function init(){ canvas.width=innerWidth; canvas.height=innerHeight; }
      function loop(){
          requestAnimationFrame(loop);
          ctx.clearRect(0,0,canvas.width,canvas.height);
          // Vẽ UI, Game Logic...
          // VẼ NÚT MUTE, REPLAY, START...
      }

      window.addEventListener('mousedown', (e) => { /* Xử lý click */ });
      init(); loop();
  </script>
</body></html>"#;

fn code_template(sources: &AudioSources) -> String {
    CODE_TEMPLATE
        .replace("{BG_SRC}", sources.bg)
        .replace("{CORRECT_SRC}", sources.correct)
        .replace("{WRONG_SRC}", sources.wrong)
}

/// Prompt asking the model for exactly one clarifying question.
pub fn build_consultation_prompt(idea: &str, age_group: &str) -> String {
    format!(
        "Bạn là GAME DESIGNER chuyên nghiệp. Ý tưởng: \"{idea}\" (Tuổi: {age_group}). \
         Hãy đặt **MỘT CÂU HỎI DUY NHẤT** để làm rõ cơ chế game. Chỉ trả về câu hỏi."
    )
}

/// Full generation prompt: fail-safe protocols, visual style, game info,
/// audio sources (sentinel tokens or default links) and the code template.
pub fn build_generation_prompt(
    idea: &str,
    age_group: &str,
    difficulty: &str,
    clarification: &str,
    sources: &AudioSources,
    document_text: Option<&str>,
) -> String {
    let idea = if idea.trim().is_empty() { DEFAULT_IDEA } else { idea };

    let mut prompt = format!(
        "Bạn là MỘT ENGINE TẠO GAME TỰ ĐỘNG (AI Game Generator).\n\
         NHIỆM VỤ: Trả về code HTML5 Single-file CHẠY ĐƯỢC 100%.\n\n\
         🚨 **FAIL-SAFE PROTOCOLS:**\n\
         1. **Error Handling:** Chèn script `window.onerror` đầu thẻ body.\n\
         2. **Variable Safety:** Khai báo toàn bộ biến đầu script.\n\
         3. **Asset Priority:** Sử dụng link âm thanh được cung cấp dưới đây. Nếu là token __CUSTOM...__ thì cứ điền y nguyên vào src.\n\
         4. **Loop Protection:** Try-catch trong gameLoop.\n\
         5. **Autoplay Bypass:** Cần màn hình CLICK TO START.\n\
         6. **Mute Button:** Có nút bật/tắt âm thanh.\n\n\
         🎨 **VISUAL STYLE:** Hoạt hình 3D rực rỡ, EMOJI làm sprite, Nút bấm to. Canvas full màn hình.\n\n\
         🎮 **GAME INFO:**\n\
         - Ý tưởng: \"{idea}\"\n\
         - Chi tiết: \"{clarification}\"\n\
         - Tuổi: {age_group}. Độ khó: {difficulty}.\n\
         - Điều khiển: Chuột & Phím.\n"
    );

    if let Some(text) = document_text {
        if !text.trim().is_empty() {
            prompt.push_str(
                "\n📄 **NỘI DUNG TÀI LIỆU (dùng làm câu hỏi/đáp án trong game):**\n",
            );
            prompt.push_str(text);
            prompt.push('\n');
        }
    }

    prompt.push_str(&format!(
        "\n🔗 **ÂM THANH (Sử dụng chính xác các link này):**\n\
         - Nhạc nền: \"{}\"\n\
         - Đúng: \"{}\"\n\
         - Sai: \"{}\"\n\n\
         🛠️ **CẤU TRÚC CODE (TEMPLATE):**\n```html\n",
        sources.bg, sources.correct, sources.wrong
    ));
    prompt.push_str(&code_template(sources));
    prompt.push_str("\n```\n");
    prompt
}

/// Prompt for one edit-chat turn over the (tokenized) current artifact.
pub fn build_edit_prompt(current_code: &str, instruction: &str) -> String {
    format!(
        "CODE HTML: ```html\n{current_code}\n```\n\
         YÊU CẦU: \"{instruction}\". Hãy sửa code. Giữ nguyên các link âm thanh Base64 nếu có."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{audio_sources, BG_MUSIC_TOKEN, DEFAULT_CORRECT, DEFAULT_WRONG};
    use crate::models::CustomAudioAssets;

    #[test]
    fn consultation_prompt_carries_idea_and_age() {
        let prompt = build_consultation_prompt("game tính nhẩm với tên lửa", "Tiểu học (6-10 tuổi)");
        assert!(prompt.contains("game tính nhẩm với tên lửa"));
        assert!(prompt.contains("Tiểu học (6-10 tuổi)"));
        assert!(prompt.contains("MỘT CÂU HỎI DUY NHẤT"));
    }

    #[test]
    fn generation_prompt_embeds_all_parameters() {
        let sources = audio_sources(&CustomAudioAssets::default());
        let prompt = build_generation_prompt(
            "game ghép hình",
            "Mầm non (3-5 tuổi)",
            "Dễ",
            "kéo thả bằng chuột",
            &sources,
            None,
        );
        assert!(prompt.contains("game ghép hình"));
        assert!(prompt.contains("Mầm non (3-5 tuổi)"));
        assert!(prompt.contains("Độ khó: Dễ"));
        assert!(prompt.contains("kéo thả bằng chuột"));
        assert!(prompt.contains("<!DOCTYPE html>"));
        assert!(prompt.contains(DEFAULT_CORRECT));
        assert!(prompt.contains(DEFAULT_WRONG));
    }

    #[test]
    fn generation_prompt_uses_token_for_custom_audio() {
        let assets = CustomAudioAssets {
            bg_music: Some("data:audio/mpeg;base64,AAAA".to_string()),
            ..Default::default()
        };
        let prompt =
            build_generation_prompt("game", "Mọi lứa tuổi", "Vừa", "tùy", &audio_sources(&assets), None);
        assert!(prompt.contains(BG_MUSIC_TOKEN));
        // the payload itself must never reach the prompt
        assert!(!prompt.contains("base64,AAAA"));
    }

    #[test]
    fn blank_idea_falls_back_when_document_attached() {
        let sources = audio_sources(&CustomAudioAssets::default());
        let prompt = build_generation_prompt(
            "   ",
            "Tiểu học (6-10 tuổi)",
            "Vừa",
            "trắc nghiệm",
            &sources,
            Some("--- TRANG 1 ---\n1 + 1 = ?"),
        );
        assert!(prompt.contains(DEFAULT_IDEA));
        assert!(prompt.contains("NỘI DUNG TÀI LIỆU"));
        assert!(prompt.contains("1 + 1 = ?"));
    }

    #[test]
    fn edit_prompt_wraps_code_and_instruction() {
        let prompt = build_edit_prompt("<!DOCTYPE html><html></html>", "đổi màu nền sang xanh");
        assert!(prompt.starts_with("CODE HTML:"));
        assert!(prompt.contains("<!DOCTYPE html><html></html>"));
        assert!(prompt.contains("đổi màu nền sang xanh"));
    }
}
